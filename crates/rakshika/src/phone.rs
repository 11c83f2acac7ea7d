//! Phone number normalization.
//!
//! Free-form input ("98765 43210", "+91-98765-43210") is reduced to its
//! digits before any rule is applied. None of these functions attempt a full
//! E.164 conversion.

/// Country code assumed when a contact does not carry one.
pub const DEFAULT_COUNTRY_CODE: &str = "91";

/// Minimum number of digits for a number to be accepted.
pub const MIN_DIGITS: usize = 10;

/// A dialling code offered when adding a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountryCode {
    /// Digits without the leading `+`.
    pub code: &'static str,
    /// Region label.
    pub region: &'static str,
}

/// Dialling codes offered when adding a contact.
pub const COUNTRY_CODES: &[CountryCode] = &[
    CountryCode { code: "91", region: "India" },
    CountryCode { code: "1", region: "USA/Canada" },
    CountryCode { code: "44", region: "UK" },
    CountryCode { code: "971", region: "UAE" },
    CountryCode { code: "61", region: "Australia" },
    CountryCode { code: "65", region: "Singapore" },
];

/// Strip every non-digit character.
#[must_use]
pub fn digits(phone: &str) -> String {
    phone.chars().filter(char::is_ascii_digit).collect()
}

/// A number is valid when it carries at least [`MIN_DIGITS`] digits,
/// whatever punctuation surrounds them.
#[must_use]
pub fn validate(phone: &str) -> bool {
    phone.chars().filter(char::is_ascii_digit).count() >= MIN_DIGITS
}

/// Build the country-qualified digit string used in deep links.
///
/// Numbers whose digits already begin with `country_code` are returned
/// as-is. A national number that happens to start with the same digits as
/// the country code is therefore never prefixed.
#[must_use]
pub fn to_dial_string(phone: &str, country_code: &str) -> String {
    let cleaned = digits(phone);
    if cleaned.starts_with(country_code) {
        cleaned
    } else {
        format!("{country_code}{cleaned}")
    }
}

/// Format a 10-digit number as `"DDDDD DDDDD"`; anything else is returned
/// unchanged.
#[must_use]
pub fn to_display_string(phone: &str) -> String {
    let cleaned = digits(phone);
    if cleaned.len() == 10 {
        format!("{} {}", &cleaned[..5], &cleaned[5..])
    } else {
        phone.to_string()
    }
}

/// Normalize a user-entered country code (`"+91"`, `" 91 "`).
///
/// Returns `None` unless the result is one to three digits.
#[must_use]
pub fn normalize_country_code(code: &str) -> Option<String> {
    let trimmed = code.trim().trim_start_matches('+');
    if (1..=3).contains(&trimmed.len()) && trimmed.chars().all(|c| c.is_ascii_digit()) {
        Some(trimmed.to_string())
    } else {
        None
    }
}
