//! Bank of America business checking statement parser (text)
//!
//! Expected extracted-text sections:
//!   Withdrawals and other debits
//!   Date        Description                                          Amount
//!   01/05/24    WIRE TYPE:WIRE OUT DATE:240105 TIME:0932 ET        -2,500.00
//!               TRN:2024010500123 SERVICE REF:004512
//!   Total withdrawals and other debits                              -2,500.00
//!
//! Transactions wrap onto continuation lines, so each start line opens a
//! pending transaction that later non-matching lines extend.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use tracing::debug;

use super::transaction;
use crate::amount::signed_amount;
use crate::types::{Layout, Transaction};

const BANK: Layout = Layout::BankOfAmerica;

/// Multi-line sections: (start marker, total marker). Deposits are not
/// imported from this layout.
pub const SECTIONS: [(&str, &str); 1] =
    [("Withdrawals and other debits", "Total withdrawals and other debits")];

pub const FEES_SECTION: (&str, &str) = ("Service fees - continued", "Total service fees");

fn start_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{2}/\d{2}/\d{2})\s+(.*?)\s+(-?[\d,]+\.\d{2})$").expect("start line regex")
    })
}

fn fee_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\d{2}/\d{2}/\d{2})\s+(.*?)\s+(-?[\d,]+\.\d{2})").expect("fee regex")
    })
}

fn parse_mm_dd_yy(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%m/%d/%y").ok()
}

/// Text between a start marker line and the next total marker line.
pub fn section_block<'t>(text: &'t str, start: &str, end: &str) -> Option<&'t str> {
    let open = format!("{start}\n");
    let close = format!("\n{end}");
    let from = text.find(&open)? + open.len();
    let len = text[from..].find(&close)?;
    Some(&text[from..from + len])
}

struct Pending<'l> {
    date: &'l str,
    parts: Vec<&'l str>,
    amount: &'l str,
}

impl Pending<'_> {
    fn finish(self) -> Option<Transaction> {
        let Some(date) = parse_mm_dd_yy(self.date) else {
            debug!("{}: bad date {:?}", BANK, self.date);
            return None;
        };
        let amount = signed_amount(self.amount)?;
        transaction(BANK, date, "", self.parts.join(" "), amount)
    }
}

/// Reassemble wrapped transactions inside one section block.
pub fn parse_multiline_block(block: &str) -> Vec<Transaction> {
    let mut out = Vec::new();
    let mut current: Option<Pending> = None;

    for line in block.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(caps) = start_line_re().captures(line) {
            if let Some(done) = current.take().and_then(Pending::finish) {
                out.push(done);
            }
            current = Some(Pending {
                date: caps.get(1).map_or("", |m| m.as_str()),
                parts: vec![caps.get(2).map_or("", |m| m.as_str().trim())],
                amount: caps.get(3).map_or("", |m| m.as_str()),
            });
        } else if let Some(p) = current.as_mut() {
            p.parts.push(line);
        }
    }

    // The last transaction has no successor to flush it.
    if let Some(done) = current.and_then(Pending::finish) {
        out.push(done);
    }

    out
}

/// Single-line fee rows; zero-amount fees are dropped.
pub fn parse_fee_block(block: &str) -> Vec<Transaction> {
    fee_re()
        .captures_iter(block)
        .filter_map(|caps| {
            let date = parse_mm_dd_yy(&caps[1])?;
            let amount = signed_amount(&caps[3])?;
            if amount.is_zero() {
                return None;
            }
            let desc = caps[2].split_whitespace().collect::<Vec<_>>().join(" ");
            transaction(BANK, date, "", desc, amount)
        })
        .collect()
}

/// Parse the full statement text (all pages joined).
pub fn parse_text(text: &str) -> Vec<Transaction> {
    let mut out = Vec::new();

    for (start, end) in SECTIONS {
        match section_block(text, start, end) {
            Some(block) => out.extend(parse_multiline_block(block)),
            None => debug!("{}: section {:?} not found", BANK, start),
        }
    }

    let (start, end) = FEES_SECTION;
    match section_block(text, start, end) {
        Some(block) => out.extend(parse_fee_block(block)),
        None => debug!("{}: section {:?} not found", BANK, start),
    }

    out
}
