//! Layout-specific statement parsers.
//!
//! Each layout maps to exactly one parser through [`parse_statement`]. The
//! text/table-level functions never fail: a section that cannot be found or a
//! row that does not match simply contributes nothing. Only a document that
//! cannot be opened at all surfaces as an error.

pub mod bank_of_america;
pub mod td_sections;
pub mod td_visa;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::source::{PdfStatement, StatementSource};
use crate::types::{Layout, Transaction};
use crate::year;

/// Parse one statement. Layouts that print partial dates resolve the
/// statement year from the first page first; the source is rewound between
/// the two reads. Other layouts never look for a year.
pub fn parse_statement<S: StatementSource + ?Sized>(
    layout: Layout,
    src: &mut S,
) -> Result<Vec<Transaction>> {
    let statement_year = layout
        .needs_statement_year()
        .then(|| year::statement_year(src));
    let pdf = PdfStatement::load(src)?;
    Ok(parse_pdf(layout, &pdf, statement_year))
}

/// Parse one statement with an already known statement year.
pub fn parse_statement_with_year<S: StatementSource + ?Sized>(
    layout: Layout,
    src: &mut S,
    statement_year: i32,
) -> Result<Vec<Transaction>> {
    let pdf = PdfStatement::load(src)?;
    Ok(parse_pdf(layout, &pdf, Some(statement_year)))
}

/// Parse an already loaded statement. A layout that needs a year and was
/// given none resolves it from this document's first page.
pub fn parse_pdf(layout: Layout, pdf: &PdfStatement, statement_year: Option<i32>) -> Vec<Transaction> {
    let year_or_resolve =
        || statement_year.unwrap_or_else(|| year::resolve_statement_year(&pdf.first_page_text()));

    let txns = match layout {
        Layout::BankOfAmerica => bank_of_america::parse_text(&pdf.full_text()),
        Layout::TdVisa => {
            let parsed = td_visa::parse_table(&pdf.page_table(td_visa::TABLE_PAGE), year_or_resolve());
            if !parsed.header_found {
                warn!(
                    "{}: no 'Activity Date'/'Reference Number' header on page {}",
                    layout,
                    td_visa::TABLE_PAGE
                );
            }
            parsed.transactions
        }
        Layout::TdPremiumMoneyMarket | Layout::TdBusinessConvenience => {
            let headers = td_sections::SectionHeaders::for_layout(layout);
            td_sections::parse_text(&pdf.first_page_text(), layout, &headers, year_or_resolve())
        }
    };

    info!("{}: parsed {} transactions", layout, txns.len());
    txns
}

/// Build a transaction, refusing rows that end up with no description.
pub(crate) fn transaction(
    bank: Layout,
    date: NaiveDate,
    reference: &str,
    description: String,
    amount: Decimal,
) -> Option<Transaction> {
    if description.trim().is_empty() {
        debug!("{}: dropping {} row without description", bank, date);
        return None;
    }
    Some(Transaction {
        bank,
        date,
        reference: reference.trim().to_string(),
        description,
        amount,
    })
}
