// ✅ Field Validators - pure predicates over raw form strings
//
// Every validator is total over &str and has no side effects.
// The workflow calls them independently and accumulates failures.

use chrono::{Datelike, Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

// ============================================================================
// PATTERNS
// ============================================================================

static FULL_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-zÀ-ÖØ-öø-ÿ\s]+$").expect("full name pattern compiles"));

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern compiles")
});

/// Day and month of one or two digits, year of exactly four
static BIRTH_DATE_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{1,2}/[0-9]{1,2}/[0-9]{4}$").expect("birth date pattern compiles")
});

/// Length of the personal identifier (taxpayer-style code)
pub const IDENTIFIER_LEN: usize = 11;

/// Length of the postal code
pub const POSTAL_CODE_LEN: usize = 8;

/// Oldest accepted birth year
pub const MIN_BIRTH_YEAR: i32 = 1900;

/// Newest accepted birth year
pub const MAX_BIRTH_YEAR: i32 = 2024;

/// Minimum age in whole years (year subtraction only)
pub const MIN_AGE_YEARS: i32 = 18;

/// Input format of birth dates
pub const BIRTH_DATE_FORMAT: &str = "%d/%m/%Y";

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BirthDateError {
    /// The string is not a `dd/mm/yyyy` calendar date
    #[error("birth date is not in dd/mm/yyyy format: {0:?}")]
    InvalidFormat(String),
}

// ============================================================================
// VALIDATORS
// ============================================================================

fn is_ascii_digits(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| b.is_ascii_digit())
}

/// Letters (accented Latin included) and whitespace only, with at least
/// one space left after trimming so first and last name are both present.
pub fn validate_full_name(s: &str) -> bool {
    !s.is_empty() && FULL_NAME.is_match(s) && s.trim().contains(' ')
}

/// Exactly 11 ASCII digits. No check-digit verification.
pub fn validate_identifier(s: &str) -> bool {
    is_ascii_digits(s, IDENTIFIER_LEN)
}

pub fn validate_email(s: &str) -> bool {
    EMAIL.is_match(s)
}

/// Exactly 8 ASCII digits.
pub fn validate_postal_code(s: &str) -> bool {
    is_ascii_digits(s, POSTAL_CODE_LEN)
}

/// Non-empty, ASCII digits only.
pub fn validate_house_number(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Parse a `dd/mm/yyyy` birth date. Signed or short years are a format
/// error, not an out-of-range year.
pub fn parse_birth_date(s: &str) -> Result<NaiveDate, BirthDateError> {
    if !BIRTH_DATE_SHAPE.is_match(s) {
        return Err(BirthDateError::InvalidFormat(s.to_string()));
    }
    NaiveDate::parse_from_str(s, BIRTH_DATE_FORMAT)
        .map_err(|_| BirthDateError::InvalidFormat(s.to_string()))
}

/// Birth date check against the current local year.
pub fn validate_birth_date(s: &str) -> Result<bool, BirthDateError> {
    validate_birth_date_at(s, Local::now().year())
}

/// Birth date check against an explicit current year.
///
/// Age is `current_year - birth_year`; month and day are ignored, so a
/// student can pass up to 364 days before their 18th birthday.
pub fn validate_birth_date_at(s: &str, current_year: i32) -> Result<bool, BirthDateError> {
    let year = parse_birth_date(s)?.year();
    let in_range = (MIN_BIRTH_YEAR..=MAX_BIRTH_YEAR).contains(&year);
    Ok(in_range && current_year - year >= MIN_AGE_YEARS)
}
