//! Numeric normalization for ERP extract cells.
//!
//! Extract reports format quantities for people, not machines: thousands are
//! grouped with commas and negatives carry a trailing minus (`"1,234-"`).
//! Every value pulled from an extract goes through [`parse_number`] before any
//! arithmetic happens.

use thiserror::Error;

/// A cell that could not be read as a number.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot parse {raw:?} as a number")]
pub struct ParseNumberError {
    pub raw: String,
}

/// Parse an extract cell into an integer.
///
/// - blank input is `0`
/// - `,` separators are removed
/// - a trailing `-` moves to the front
/// - decimals are truncated toward zero
pub fn parse_number(raw: &str) -> Result<i64, ParseNumberError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }

    let mut cleaned = trimmed.replace(',', "");
    if let Some(stripped) = cleaned.strip_suffix('-') {
        cleaned = format!("-{}", stripped);
    }

    if let Ok(n) = cleaned.parse::<i64>() {
        return Ok(n);
    }

    match cleaned.parse::<f64>() {
        Ok(f) if f.is_finite() && is_plain_float(&cleaned) => Ok(f.trunc() as i64),
        _ => Err(ParseNumberError {
            raw: raw.to_string(),
        }),
    }
}

// Rust accepts "inf", "nan" and "infinity" spellings; reports never contain them.
fn is_plain_float(s: &str) -> bool {
    s.chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
}
