//! TD business deposit account statement parser (text, first page)
//!
//! Expected extracted-text layout:
//!   Electronic Deposits
//!   POSTING DATE DESCRIPTION AMOUNT
//!   05/02 CCD DEPOSIT, SQUARE INC 1,204.50
//!   Subtotal: 1,204.50
//!   Electronic Payments
//!   05/03 CCD DEBIT, IRS USATAXPYMT 880.00
//!   Subtotal: 880.00
//!
//! Amounts are printed unsigned; the section they appear under decides the
//! sign. The same line machine serves every TD layout, only the section
//! header vocabulary differs.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use tracing::debug;

use super::transaction;
use crate::amount::magnitude;
use crate::types::{Layout, Transaction};

/// Section headers that open a credit or a debit block.
#[derive(Debug, Clone, Copy)]
pub struct SectionHeaders<'a> {
    pub credit: &'a [&'a str],
    pub debit: &'a [&'a str],
}

pub const MONEY_MARKET: SectionHeaders<'static> = SectionHeaders {
    credit: &["Other Credits"],
    debit: &["Electronic Payments", "Other Withdrawals"],
};

pub const CONVENIENCE_PLUS: SectionHeaders<'static> = SectionHeaders {
    credit: &["Electronic Deposits"],
    debit: &["Electronic Payments"],
};

impl SectionHeaders<'static> {
    pub fn for_layout(layout: Layout) -> Self {
        match layout {
            Layout::TdBusinessConvenience => CONVENIENCE_PLUS,
            _ => MONEY_MARKET,
        }
    }
}

impl SectionHeaders<'_> {
    /// Credit headers win over debit headers when both prefix the line.
    fn section_for(&self, line: &str) -> Option<SectionState> {
        if self.credit.iter().any(|h| line.starts_with(h)) {
            Some(SectionState::Credit)
        } else if self.debit.iter().any(|h| line.starts_with(h)) {
            Some(SectionState::Debit)
        } else {
            None
        }
    }
}

/// Where the line machine currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionState {
    Outside,
    Credit,
    Debit,
}

/// What a single trimmed line means to the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'l> {
    Header(SectionState),
    Subtotal,
    ColumnHeader,
    Row { date: &'l str, description: &'l str, amount: &'l str },
    Other,
}

fn row_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{2}/\d{2})\s+(.*?)\s+([\d,]+\.\d{2})$").expect("td row regex")
    })
}

pub fn classify<'l>(line: &'l str, headers: &SectionHeaders<'_>) -> LineKind<'l> {
    if let Some(section) = headers.section_for(line) {
        return LineKind::Header(section);
    }
    if line.starts_with("Subtotal:") {
        return LineKind::Subtotal;
    }
    if line.contains("POSTING DATE") {
        return LineKind::ColumnHeader;
    }
    match row_re().captures(line) {
        Some(caps) => LineKind::Row {
            date: caps.get(1).map_or("", |m| m.as_str()),
            description: caps.get(2).map_or("", |m| m.as_str()),
            amount: caps.get(3).map_or("", |m| m.as_str()),
        },
        None => LineKind::Other,
    }
}

impl SectionState {
    /// Next state after a line. Column-header artifacts and unrelated lines
    /// leave the state alone.
    pub fn next(self, kind: &LineKind<'_>) -> SectionState {
        match kind {
            LineKind::Header(section) => *section,
            LineKind::Subtotal => SectionState::Outside,
            _ => self,
        }
    }
}

fn parse_mm_dd_with_year(s: &str, year: i32) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{s}/{year}"), "%m/%d/%Y").ok()
}

/// Parse first-page text. Rows outside a credit/debit section are ignored.
pub fn parse_text(
    text: &str,
    bank: Layout,
    headers: &SectionHeaders<'_>,
    statement_year: i32,
) -> Vec<Transaction> {
    let mut state = SectionState::Outside;
    let mut out = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let kind = classify(line, headers);
        if let LineKind::Row { date, description, amount } = &kind {
            let sign = match state {
                SectionState::Outside => None,
                SectionState::Credit => Some(false),
                SectionState::Debit => Some(true),
            };
            if let Some(negate) = sign {
                let Some(d) = parse_mm_dd_with_year(date, statement_year) else {
                    debug!("{}: bad date {:?}", bank, date);
                    continue;
                };
                let Some(mut amt) = magnitude(amount) else {
                    continue;
                };
                if negate {
                    amt = -amt;
                }
                out.extend(transaction(bank, d, "", description.trim().to_string(), amt));
            }
        }
        state = state.next(&kind);
    }

    out
}
