//! Merge parsed transactions into one date-ordered ledger.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use consol_ingest::Transaction;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Export column order.
pub const COLUMNS: [&str; 5] = ["Bank", "Date", "Ref", "Description", "Amount"];

/// One exported row. Dates are already rendered as `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRow {
    #[serde(rename = "Bank")]
    pub bank: String,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Ref")]
    pub reference: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Amount")]
    pub amount: Decimal,
}

impl From<&Transaction> for LedgerRow {
    fn from(t: &Transaction) -> Self {
        Self {
            bank: t.bank.label().to_string(),
            date: t.iso_date(),
            reference: t.reference.clone(),
            description: t.description.clone(),
            amount: t.amount,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Ledger {
    rows: Vec<LedgerRow>,
}

/// Per-bank totals for reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BankSummary {
    pub bank: String,
    pub count: usize,
    pub credits: Decimal,
    pub debits: Decimal,
}

/// Outcome of consolidating a batch. An empty batch is reported as such
/// rather than as an empty ledger.
#[derive(Debug, Clone, PartialEq)]
pub enum Consolidation {
    Ledger(Ledger),
    NothingFound,
}

impl Consolidation {
    pub fn ledger(&self) -> Option<&Ledger> {
        match self {
            Consolidation::Ledger(l) => Some(l),
            Consolidation::NothingFound => None,
        }
    }
}

/// Parse a date column value. Accepts ISO dates, ISO date-times (the time is
/// dropped) and US `MM/DD/YYYY`.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| NaiveDate::parse_from_str(s, "%m/%d/%Y").ok())
}

/// Re-render a date value as `YYYY-MM-DD`. A no-op on values already in
/// that form.
pub fn normalize_iso_date(s: &str) -> Option<String> {
    parse_date(s).map(|d| d.format("%Y-%m-%d").to_string())
}

/// Concatenate, sort by date (stable, so same-day rows keep their parse
/// order) and render. Every input transaction becomes exactly one row.
pub fn consolidate<I>(transactions: I) -> Consolidation
where
    I: IntoIterator<Item = Transaction>,
{
    let mut txns: Vec<Transaction> = transactions.into_iter().collect();
    if txns.is_empty() {
        return Consolidation::NothingFound;
    }
    txns.sort_by_key(|t| t.date);
    Consolidation::Ledger(Ledger {
        rows: txns.iter().map(LedgerRow::from).collect(),
    })
}

impl Ledger {
    /// Rebuild a ledger from rendered rows, re-parsing and re-sorting dates.
    pub fn from_rows(rows: Vec<LedgerRow>) -> Result<Self> {
        let mut dated = rows
            .into_iter()
            .map(|mut row| {
                let date = parse_date(&row.date).ok_or_else(|| CoreError::BadDate {
                    value: row.date.clone(),
                })?;
                row.date = date.format("%Y-%m-%d").to_string();
                Ok((date, row))
            })
            .collect::<Result<Vec<_>>>()?;
        dated.sort_by_key(|(d, _)| *d);
        Ok(Self {
            rows: dated.into_iter().map(|(_, r)| r).collect(),
        })
    }

    pub fn rows(&self) -> &[LedgerRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<LedgerRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn summary(&self) -> Vec<BankSummary> {
        let mut by_bank: BTreeMap<&str, BankSummary> = BTreeMap::new();
        for row in &self.rows {
            let entry = by_bank.entry(row.bank.as_str()).or_insert_with(|| BankSummary {
                bank: row.bank.clone(),
                count: 0,
                credits: Decimal::ZERO,
                debits: Decimal::ZERO,
            });
            entry.count += 1;
            if row.amount.is_sign_negative() {
                entry.debits += row.amount;
            } else {
                entry.credits += row.amount;
            }
        }
        by_bank.into_values().collect()
    }
}
