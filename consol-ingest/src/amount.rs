//! Amount strings to signed decimals, one rule per layout family.

use std::str::FromStr;

use rust_decimal::Decimal;

fn keep(s: &str, allow_minus: bool) -> String {
    s.chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || (allow_minus && *c == '-'))
        .collect()
}

/// Card statements print credits with a `CR` marker and everything else is a
/// charge. Empty or unparseable input is zero.
pub fn card_amount(raw: &str) -> Decimal {
    let is_credit = raw.contains("CR");
    let cleaned = keep(raw, false);
    if cleaned.is_empty() {
        return Decimal::ZERO;
    }
    let amount = Decimal::from_str(&cleaned).unwrap_or(Decimal::ZERO);
    if is_credit { amount } else { -amount }
}

/// Unsigned magnitude; the caller applies the sign from the section it is in.
pub fn magnitude(raw: &str) -> Option<Decimal> {
    Decimal::from_str(&keep(raw, false)).ok()
}

/// Amount that already carries its own sign (`-1,234.56`).
pub fn signed_amount(raw: &str) -> Option<Decimal> {
    Decimal::from_str(&keep(raw, true)).ok()
}
