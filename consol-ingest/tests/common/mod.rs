//! In-memory statement PDFs for integration tests.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

/// One positioned text fragment: (x, y, text).
pub type Cell = (i64, i64, String);

/// Every line becomes its own text object, top to bottom.
pub fn lines(text: &[&str]) -> Vec<Cell> {
    text.iter()
        .enumerate()
        .map(|(i, l)| (50, 750 - 14 * i as i64, l.to_string()))
        .collect()
}

/// How a page draws its text.
pub enum Page {
    /// One text object per fragment, each placed absolutely.
    Placed(Vec<Cell>),
    /// A single text object; lines after the first move down with `Td`.
    Flowed(Vec<String>),
    /// A single text object; lines after the first move down with `T*`.
    Leading(Vec<String>),
}

pub fn flowed(text: &[&str]) -> Page {
    Page::Flowed(text.iter().map(|l| l.to_string()).collect())
}

pub fn leading(text: &[&str]) -> Page {
    Page::Leading(text.iter().map(|l| l.to_string()).collect())
}

fn page_operations(page: &Page) -> Vec<Operation> {
    let font = || Operation::new("Tf", vec!["F1".into(), Object::Integer(10)]);
    let show = |text: &str| Operation::new("Tj", vec![Object::string_literal(text)]);
    let mut operations = Vec::new();
    match page {
        Page::Placed(cells) => {
            for (x, y, text) in cells {
                operations.push(Operation::new("BT", vec![]));
                operations.push(font());
                operations.push(Operation::new("Td", vec![Object::Integer(*x), Object::Integer(*y)]));
                operations.push(show(text.as_str()));
                operations.push(Operation::new("ET", vec![]));
            }
        }
        Page::Flowed(text) | Page::Leading(text) => {
            operations.push(Operation::new("BT", vec![]));
            operations.push(font());
            if matches!(page, Page::Leading(_)) {
                operations.push(Operation::new("TL", vec![Object::Integer(14)]));
            }
            operations.push(Operation::new("Td", vec![Object::Integer(50), Object::Integer(750)]));
            for (i, line) in text.iter().enumerate() {
                if i > 0 {
                    match page {
                        Page::Leading(_) => operations.push(Operation::new("T*", vec![])),
                        _ => operations.push(Operation::new(
                            "Td",
                            vec![Object::Integer(0), Object::Integer(-14)],
                        )),
                    }
                }
                operations.push(show(line.as_str()));
            }
            operations.push(Operation::new("ET", vec![]));
        }
    }
    operations
}

pub fn build_pdf(pages: &[Vec<Cell>]) -> Vec<u8> {
    let pages: Vec<Page> = pages.iter().cloned().map(Page::Placed).collect();
    build_pages(&pages)
}

pub fn build_pages(pages: &[Page]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for page in pages {
        let content = Content { operations: page_operations(page) };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// Statement text drawn as one flowing text object, the way most statement
/// generators write it.
pub fn money_market_pdf() -> Vec<u8> {
    build_pages(&[flowed(&[
        "TD Small Business Premium Money Market",
        "Statement Period: May 01 2024-May 31 2024",
        "Other Credits",
        "POSTING DATE DESCRIPTION AMOUNT",
        "05/12 Deposit 100.00",
        "Subtotal: 100.00",
        "Electronic Payments",
        "05/13 Payment 50.00",
        "05/20 CCD DEBIT, IRS USATAXPYMT 1,880.00",
        "Subtotal: 1,930.00",
    ])])
}

pub fn bank_of_america_pdf() -> Vec<u8> {
    build_pages(&[
        Page::Placed(lines(&[
            "Your Business Advantage Fundamentals Banking",
            "for January 1, 2024 to January 31, 2024",
            "Deposits and other additions 1,034.22",
            "Deposits and other additions",
            "01/02/24 STRIPE TRANSFER ST-A1B2 1,034.22",
            "Total deposits and other additions 1,034.22",
        ])),
        leading(&[
            "Withdrawals and other debits",
            "01/05/24 WIRE TYPE:WIRE OUT -2,500.00",
            "TRN:2024010500123",
            "01/09/24 ZELLE TO SMITH -75.00",
            "Total withdrawals and other debits -2,575.00",
            "Service fees - continued",
            "01/31/24 Monthly Maintenance Fee -16.00",
            "Total service fees -16.00",
        ]),
    ])
}

fn table_row(y: i64, cells: [&str; 5]) -> Vec<Cell> {
    let xs = [50, 120, 190, 280, 480];
    xs.iter()
        .zip(cells)
        .filter(|(_, c)| !c.is_empty())
        .map(|(x, c)| (*x, y, c.to_string()))
        .collect()
}

pub fn td_visa_pdf() -> Vec<u8> {
    build_pdf(&td_visa_pages())
}

pub fn td_visa_pages() -> Vec<Vec<Cell>> {
    let mut activity = vec![(280, 760, "Account Activity".to_string())];
    for (i, row) in [
        ["Posting Date", "Activity Date", "Reference Number", "Description", "Amount"],
        ["Jan 3", "Jan 2", "74001234", "COFFEE SHOP", "$4.50"],
        ["", "", "", "FX RATE 1.35", ""],
        ["Jan 5", "Jan 4", "74009876", "REFUND STORE", "$20.00CR"],
    ]
    .into_iter()
    .enumerate()
    {
        activity.extend(table_row(700 - 20 * i as i64, row));
    }

    vec![
        lines(&["TD BUSINESS SOLUTIONS VISA", "December 15, 2023 - January 14, 2024"]),
        lines(&["Payment information"]),
        activity,
    ]
}
