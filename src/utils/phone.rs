//! # Phone Number Utilities
//!
//! Normalization and validation for the phone numbers that key the contact
//! store. Stored numbers are always E.164 (`+12128675309`); inputs arrive
//! in whatever shape the upstream channel produced, defaulting to the US
//! region for bare national numbers. Log output must never carry a full
//! number - use [`mask_phone_number`].

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PhoneNumberError {
    #[error("Invalid phone number format: {masked}")]
    Invalid { masked: String },
}

impl PhoneNumberError {
    fn invalid(raw: &str) -> Self {
        Self::Invalid {
            masked: mask_phone_number(raw),
        }
    }
}

fn separator_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[\s().\-]").expect("separator pattern is valid"))
}

/// Normalize a phone number to E.164 for storage and lookups.
///
/// Accepts E.164 input, 10-digit national numbers, and 11-digit numbers
/// with a leading country code 1. Anything else is a validation failure.
pub fn normalize_phone_number(phone_number: &str) -> Result<String, PhoneNumberError> {
    let stripped = separator_pattern().replace_all(phone_number.trim(), "");

    let (has_plus, digits) = match stripped.strip_prefix('+') {
        Some(rest) => (true, rest),
        None => (false, stripped.as_ref()),
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PhoneNumberError::invalid(phone_number));
    }

    if has_plus {
        // International form: country code must not start with 0, total
        // significant digits capped at 15 per E.164.
        if (8..=15).contains(&digits.len()) && !digits.starts_with('0') {
            return Ok(format!("+{digits}"));
        }
        return Err(PhoneNumberError::invalid(phone_number));
    }

    match digits.len() {
        // Bare national number, assume the default region (US)
        10 if is_nanp_number(digits) => Ok(format!("+1{digits}")),
        // National number with explicit country code 1
        11 if digits.starts_with('1') && is_nanp_number(&digits[1..]) => Ok(format!("+{digits}")),
        _ => Err(PhoneNumberError::invalid(phone_number)),
    }
}

/// Check whether a phone number normalizes cleanly.
pub fn validate_phone_number(phone_number: &str) -> bool {
    normalize_phone_number(phone_number).is_ok()
}

// NANP area and exchange codes start with 2-9.
fn is_nanp_number(digits: &str) -> bool {
    let bytes = digits.as_bytes();
    digits.len() == 10 && (b'2'..=b'9').contains(&bytes[0]) && (b'2'..=b'9').contains(&bytes[3])
}

/// Mask a phone number for log output, keeping only the last 4
/// characters. Char-based so arbitrary (invalid) input cannot split a
/// UTF-8 boundary.
pub fn mask_phone_number(phone_number: &str) -> String {
    let count = phone_number.chars().count();
    if count >= 4 {
        let tail: String = phone_number.chars().skip(count - 4).collect();
        format!("***-***-{tail}")
    } else {
        phone_number.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_national_number() {
        assert_eq!(
            normalize_phone_number("(212) 867-5309").unwrap(),
            "+12128675309"
        );
        assert_eq!(normalize_phone_number("212.867.5309").unwrap(), "+12128675309");
    }

    #[test]
    fn test_normalize_with_country_code() {
        assert_eq!(normalize_phone_number("1-212-867-5309").unwrap(), "+12128675309");
        assert_eq!(normalize_phone_number("+12128675309").unwrap(), "+12128675309");
    }

    #[test]
    fn test_normalize_international() {
        assert_eq!(normalize_phone_number("+44 20 7946 0958").unwrap(), "+442079460958");
    }

    #[test]
    fn test_invalid_numbers_rejected() {
        assert!(normalize_phone_number("").is_err());
        assert!(normalize_phone_number("not-a-number").is_err());
        assert!(normalize_phone_number("12345").is_err());
        // Area codes cannot start with 0 or 1
        assert!(normalize_phone_number("(012) 867-5309").is_err());
        assert!(normalize_phone_number("+0123456789").is_err());
        // Too long for E.164
        assert!(normalize_phone_number("+1234567890123456").is_err());
    }

    #[test]
    fn test_validate_matches_normalize() {
        assert!(validate_phone_number("+12128675309"));
        assert!(!validate_phone_number("867-5309"));
    }

    #[test]
    fn test_mask_phone_number() {
        assert_eq!(mask_phone_number("+12128675309"), "***-***-5309");
        assert_eq!(mask_phone_number("531"), "531");
    }

    #[test]
    fn test_error_carries_masked_number_only() {
        let err = normalize_phone_number("555-0100-totally-invalid").unwrap_err();
        let display = err.to_string();
        assert!(!display.contains("555-0100-totally"));
        assert!(display.contains("alid"));
    }
}
