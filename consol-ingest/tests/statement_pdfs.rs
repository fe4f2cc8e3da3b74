mod common;

use std::io::{Cursor, Seek, SeekFrom};

use chrono::NaiveDate;
use consol_ingest::parsers::{parse_pdf, parse_statement, parse_statement_with_year};
use consol_ingest::{Layout, PdfStatement, year};
use rust_decimal::Decimal;

#[test]
fn test_year_pass_then_parse_pass_matches_fresh_stream() {
    let bytes = common::money_market_pdf();

    let mut src = Cursor::new(bytes.clone());
    let resolved = year::statement_year(&mut src);
    assert_eq!(resolved, 2024);
    assert_eq!(src.position(), 0);

    let rewound = parse_statement(Layout::TdPremiumMoneyMarket, &mut src).unwrap();
    let fresh = parse_statement_with_year(
        Layout::TdPremiumMoneyMarket,
        &mut Cursor::new(bytes),
        2024,
    )
    .unwrap();

    assert_eq!(rewound, fresh);
    assert_eq!(rewound.len(), 3);
    assert_eq!(rewound[0].amount, Decimal::new(10000, 2));
    assert_eq!(rewound[1].amount, Decimal::new(-5000, 2));
    assert_eq!(rewound[2].amount, Decimal::new(-188000, 2));
    assert_eq!(rewound[2].date, NaiveDate::from_ymd_opt(2024, 5, 20).unwrap());
}

#[test]
fn test_source_left_at_end_is_still_read_from_start() {
    let mut src = Cursor::new(common::money_market_pdf());
    src.seek(SeekFrom::End(0)).unwrap();
    let txns = parse_statement(Layout::TdPremiumMoneyMarket, &mut src).unwrap();
    assert_eq!(txns.len(), 3);
}

#[test]
fn test_bank_of_america_sections_across_pages() {
    let mut src = Cursor::new(common::bank_of_america_pdf());
    let txns = parse_statement(Layout::BankOfAmerica, &mut src).unwrap();

    // Page one only carries deposits, which this layout does not import.
    assert_eq!(txns.len(), 3);
    assert_eq!(txns[0].description, "WIRE TYPE:WIRE OUT TRN:2024010500123");
    assert_eq!(txns[0].amount, Decimal::new(-250000, 2));
    assert_eq!(txns[1].amount, Decimal::new(-7500, 2));
    assert_eq!(txns[2].description, "Monthly Maintenance Fee");
    assert!(txns.iter().all(|t| t.amount.is_sign_negative()));
    assert!(txns.iter().all(|t| t.bank == Layout::BankOfAmerica));
}

#[test]
fn test_td_visa_table_on_page_three() {
    let bytes = common::td_visa_pdf();
    let pdf = PdfStatement::from_bytes(&bytes).unwrap();
    assert_eq!(pdf.page_count(), 3);

    let table = pdf.page_table(3);
    assert!(table.rows.iter().any(|r| r.iter().any(|c| c == "Reference Number")));

    let mut src = Cursor::new(bytes);
    let txns = parse_statement(Layout::TdVisa, &mut src).unwrap();
    assert_eq!(txns.len(), 2);
    assert_eq!(txns[0].iso_date(), "2024-01-02");
    assert_eq!(txns[0].reference, "74001234");
    assert_eq!(txns[0].amount, Decimal::new(-450, 2));
    assert_eq!(txns[1].description, "REFUND STORE");
    assert_eq!(txns[1].amount, Decimal::new(2000, 2));
}

#[test]
fn test_lines_inside_one_text_object_stay_separate() {
    let pdf = PdfStatement::from_bytes(&common::money_market_pdf()).unwrap();
    let text = pdf.first_page_text();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 10);
    assert_eq!(lines[1], "Statement Period: May 01 2024-May 31 2024");
    assert_eq!(lines[4], "05/12 Deposit 100.00");

    let page = common::build_pages(&[common::flowed(&[
        "Statement Period: May 01 2024-May 31 2024",
        "Other Credits",
        "05/12 Deposit 100.00",
        "Subtotal: 100.00",
        "Electronic Payments",
        "05/13 Payment 50.00",
        "Subtotal: 50.00",
    ])]);
    let txns = parse_statement(Layout::TdPremiumMoneyMarket, &mut Cursor::new(page)).unwrap();
    assert_eq!(txns.len(), 2);
    assert_eq!(txns[0].amount, Decimal::new(10000, 2));
    assert_eq!(txns[1].amount, Decimal::new(-5000, 2));
}

#[test]
fn test_td_visa_table_survives_wide_text_on_the_page() {
    let mut pages = common::td_visa_pages();
    pages[2].push((
        50,
        100,
        "Please see reverse side for important information about interest charges and payments"
            .to_string(),
    ));
    // Wide text that starts between two columns.
    pages[2].push((150, 80, "Balances are shown in Canadian dollars unless stated otherwise".to_string()));
    let bytes = common::build_pdf(&pages);

    let table = PdfStatement::from_bytes(&bytes).unwrap().page_table(3);
    let header = table
        .rows
        .iter()
        .find(|r| r.iter().any(|c| c == "Reference Number"))
        .unwrap();
    assert_eq!(header.len(), 5);
    assert_eq!(header[1], "Activity Date");

    let txns = parse_statement(Layout::TdVisa, &mut Cursor::new(bytes)).unwrap();
    assert_eq!(txns.len(), 2);
    assert_eq!(txns[0].reference, "74001234");
    assert_eq!(txns[0].description, "COFFEE SHOP");
    assert_eq!(txns[1].amount, Decimal::new(2000, 2));
}

#[test]
fn test_td_visa_layout_on_wrong_document_finds_nothing() {
    let mut src = Cursor::new(common::money_market_pdf());
    let txns = parse_statement(Layout::TdVisa, &mut src).unwrap();
    assert!(txns.is_empty());
}

#[test]
fn test_unreadable_document_is_an_error() {
    let mut src = Cursor::new(b"%PDF-1.5 truncated".to_vec());
    assert!(parse_statement(Layout::BankOfAmerica, &mut src).is_err());
}

#[test]
fn test_page_texts_and_out_of_range_pages() {
    let pdf = PdfStatement::from_bytes(&common::bank_of_america_pdf()).unwrap();
    let pages = pdf.page_texts();
    assert_eq!(pages.len(), 2);
    assert!(pages[1].contains("Withdrawals and other debits"));
    assert!(pdf.page_text(9).is_empty());
    assert!(pdf.page_table(9).is_empty());
}

#[test]
fn test_parse_pdf_without_a_known_year() {
    let boa = PdfStatement::from_bytes(&common::bank_of_america_pdf()).unwrap();
    let txns = parse_pdf(Layout::BankOfAmerica, &boa, None);
    assert_eq!(txns.len(), 3);
    assert_eq!(txns[0].iso_date(), "2024-01-05");

    // A layout with partial dates falls back to the year on its own first page.
    let money_market = PdfStatement::from_bytes(&common::money_market_pdf()).unwrap();
    let txns = parse_pdf(Layout::TdPremiumMoneyMarket, &money_market, None);
    assert_eq!(txns.len(), 3);
    assert_eq!(txns[0].iso_date(), "2024-05-12");
    assert_eq!(parse_pdf(Layout::TdPremiumMoneyMarket, &money_market, Some(2019))[0].iso_date(), "2019-05-12");
}
