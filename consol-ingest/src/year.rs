//! Statement year resolution.
//!
//! Several layouts print transaction dates as `MM/DD` or `Mon D`, so the year
//! has to come from the statement period printed on the first page.

use std::sync::OnceLock;

use chrono::{Datelike, Local};
use regex::Regex;
use tracing::debug;

use crate::source::{PdfStatement, StatementSource};

fn period_patterns() -> &'static [Regex; 3] {
    static RE: OnceLock<[Regex; 3]> = OnceLock::new();
    RE.get_or_init(|| {
        [
            // January 1, 2024 - January 31, 2024 (closing year)
            Regex::new(r"\w+\s+\d{1,2},\s+\d{4}\s+-\s+\w+\s+\d{1,2},\s+(\d{4})")
                .expect("range regex"),
            Regex::new(r"Statement Period:\s*\w+\s\d{1,2}\s(\d{4})").expect("period regex"),
            // Dec 15, 2023 to Jan 14, 2024 (opening year)
            Regex::new(r"\w+\s+\d{1,2},\s+(\d{4})\s+to\s+\w+\s+\d{1,2},\s+\d{4}")
                .expect("to-range regex"),
        ]
    })
}

pub fn current_year() -> i32 {
    Local::now().year()
}

/// First year captured by the period patterns, in priority order.
pub fn find_year(text: &str) -> Option<i32> {
    period_patterns()
        .iter()
        .find_map(|re| re.captures(text).and_then(|c| c[1].parse().ok()))
}

pub fn resolve_year_or(text: &str, fallback: i32) -> i32 {
    find_year(text).unwrap_or(fallback)
}

/// Resolve from first-page text, falling back to the current calendar year.
pub fn resolve_statement_year(text: &str) -> i32 {
    resolve_year_or(text, current_year())
}

/// Resolve the statement year straight from a source. The source is left at
/// offset 0, and any extraction failure degrades to the current year.
pub fn statement_year<S: StatementSource + ?Sized>(src: &mut S) -> i32 {
    match PdfStatement::load(src) {
        Ok(pdf) => resolve_statement_year(&pdf.first_page_text()),
        Err(e) => {
            debug!("statement year fallback: {}", e);
            current_year()
        }
    }
}
