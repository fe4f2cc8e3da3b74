//! TD Business Solutions VISA statement parser (positional table)
//!
//! Activity is laid out as a table on page 3:
//!   Posting Date  Activity Date  Reference Number  Description            Amount
//!   Jan 3         Jan 2          74001234          COFFEE SHOP TORONTO    $4.50
//!   Jan 5         Jan 4          74009876          REFUND STORE           $20.00CR
//!
//! Dates carry no year, so the resolved statement year is appended.

use chrono::NaiveDate;
use tracing::debug;

use super::transaction;
use crate::amount::card_amount;
use crate::table::Table;
use crate::types::{Layout, Transaction};

const BANK: Layout = Layout::TdVisa;

/// 1-based page holding the activity table.
pub const TABLE_PAGE: u32 = 3;

const DATE_COL: usize = 1;
const REF_COL: usize = 2;
const DESC_START_COL: usize = 3;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardParse {
    /// False when no header row was found, i.e. the page did not look like
    /// this layout at all.
    pub header_found: bool,
    pub transactions: Vec<Transaction>,
}

fn is_header(row: &[String]) -> bool {
    let joined = row
        .iter()
        .filter(|c| !c.trim().is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ");
    joined.contains("Activity Date") && joined.contains("Reference Number")
}

fn parse_mon_d_with_year(s: &str, year: i32) -> Option<NaiveDate> {
    // Example: "Jan 2"
    NaiveDate::parse_from_str(&format!("{} {}", s.trim(), year), "%b %d %Y").ok()
}

fn parse_row(row: &[String], year: i32) -> Option<Transaction> {
    let date_cell = row.get(DATE_COL)?.trim();
    let amount_cell = row.last()?.trim();
    if date_cell.is_empty() || amount_cell.is_empty() || row.len() <= DATE_COL + 1 {
        return None;
    }

    let Some(date) = parse_mon_d_with_year(date_cell, year) else {
        debug!("{}: skipping row with date {:?}", BANK, date_cell);
        return None;
    };

    let reference = row.get(REF_COL).map_or("", |s| s.as_str());
    let description = row
        .get(DESC_START_COL..row.len() - 1)
        .unwrap_or_default()
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    transaction(BANK, date, reference, description, card_amount(amount_cell))
}

/// Parse the activity table. Rows before the header and rows missing a date
/// or an amount are ignored.
pub fn parse_table(table: &Table, statement_year: i32) -> CardParse {
    let Some(header) = table.rows.iter().position(|row| is_header(row)) else {
        return CardParse::default();
    };

    let transactions = table.rows[header + 1..]
        .iter()
        .filter_map(|row| parse_row(row, statement_year))
        .collect();

    CardParse { header_found: true, transactions }
}
