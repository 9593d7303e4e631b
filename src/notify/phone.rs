use regex::Regex;
use std::sync::LazyLock;

use crate::error::ValidationError;

/// Country code prefixed to local numbers.
const COUNTRY_CODE: &str = "255";

static E164: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+[1-9][0-9]{8,14}$").expect("E.164 pattern is valid"));

/// Normalizes a stored phone number to E.164.
///
/// `07..` becomes `+2557..`, `255..` gains a `+`, and numbers already starting
/// with `+` are kept. Spaces, dashes and parentheses are ignored. Anything else
/// is rejected.
pub fn normalize_number(raw: &str) -> Result<String, ValidationError> {
    let compact: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();

    let normalized = if let Some(local) = compact.strip_prefix('0') {
        format!("+{COUNTRY_CODE}{local}")
    } else if compact.starts_with(COUNTRY_CODE) {
        format!("+{compact}")
    } else if compact.starts_with('+') {
        compact
    } else {
        return Err(ValidationError::InvalidPhoneNumber(raw.to_string()));
    };

    if E164.is_match(&normalized) {
        Ok(normalized)
    } else {
        Err(ValidationError::InvalidPhoneNumber(raw.to_string()))
    }
}
