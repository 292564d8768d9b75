//! Form field predicates and user-facing validation messages.
//!
//! # Responsibility
//! - Provide stateless checks for postcode, house number and person names.
//! - Compose them into the ordered gates used by the lookup and
//!   attach-person actions.
//!
//! # Invariants
//! - Predicates never mutate state and never panic.
//! - `FormError` display strings are the exact messages shown to users.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const POSTCODE_MIN_CHARS: usize = 4;
pub const POSTCODE_MAX_CHARS: usize = 10;
pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 50;

static NAME_SHAPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\p{L}\p{M}][\p{L}\p{M}'’.\- ]*[\p{L}\p{M}]$").expect("valid name regex")
});

/// First failing check of a form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    MissingLookupFields,
    InvalidPostcodeLength,
    PostcodeNotNumeric,
    HouseNumberNotNumeric,
    MissingNames,
    NoAddressSelected,
    InvalidFirstName,
    InvalidLastName,
    SelectedAddressNotFound,
}

impl Display for FormError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let message = match self {
            Self::MissingLookupFields => "Postcode and street number fields mandatory!",
            Self::InvalidPostcodeLength => "Please Enter Valid Postcode!",
            Self::PostcodeNotNumeric => "Postcode must be all digits and non negative!",
            Self::HouseNumberNotNumeric => "Street Number must be all digits and non negative!",
            Self::MissingNames => "First name and last name fields mandatory!",
            Self::NoAddressSelected => {
                "No address selected, try to select an address or find one if you haven't"
            }
            Self::InvalidFirstName => "Enter a valid first name (letters only).",
            Self::InvalidLastName => "Enter a valid last name (letters only).",
            Self::SelectedAddressNotFound => "Selected address not found",
        };
        f.write_str(message)
    }
}

impl Error for FormError {}

/// Whether `value` is one or more ASCII digits and nothing else.
pub fn is_strictly_numeric(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|byte| byte.is_ascii_digit())
}

/// Whether the postcode length lies in the closed range [4, 10] characters.
pub fn is_valid_postcode_length(value: &str) -> bool {
    (POSTCODE_MIN_CHARS..=POSTCODE_MAX_CHARS).contains(&value.chars().count())
}

/// Whether `value` looks like a person name.
///
/// Trimmed length must be within [2, 50] characters, digits are rejected,
/// and the name must start and end with a letter. Interior characters may be
/// letters, combining marks, spaces, hyphens, apostrophes or periods.
pub fn is_valid_name(value: &str) -> bool {
    let trimmed = value.trim();
    let length = trimmed.chars().count();
    if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&length) {
        return false;
    }
    if trimmed.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }
    NAME_SHAPE_RE.is_match(trimmed)
}

/// Trims and collapses internal whitespace runs to one space.
pub fn normalize_space(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Gate for the find-address action.
///
/// Checks run in order: both fields present, postcode length, postcode
/// digits, house number digits.
///
/// Only the presence check ignores surrounding whitespace; padded input
/// such as `" 1234"` fails the digit checks.
pub fn validate_lookup_form(postcode: &str, house_number: &str) -> Result<(), FormError> {
    if postcode.trim().is_empty() || house_number.trim().is_empty() {
        return Err(FormError::MissingLookupFields);
    }
    if !is_valid_postcode_length(postcode) {
        return Err(FormError::InvalidPostcodeLength);
    }
    if !is_strictly_numeric(postcode) {
        return Err(FormError::PostcodeNotNumeric);
    }
    if !is_strictly_numeric(house_number) {
        return Err(FormError::HouseNumberNotNumeric);
    }
    Ok(())
}

/// Gate for the attach-person action.
///
/// `has_selection` is false when nothing is selected or no results are shown.
pub fn validate_person_form(
    first_name: &str,
    last_name: &str,
    has_selection: bool,
) -> Result<(), FormError> {
    if first_name.trim().is_empty() || last_name.trim().is_empty() {
        return Err(FormError::MissingNames);
    }
    if !has_selection {
        return Err(FormError::NoAddressSelected);
    }
    if !is_valid_name(first_name) {
        return Err(FormError::InvalidFirstName);
    }
    if !is_valid_name(last_name) {
        return Err(FormError::InvalidLastName);
    }
    Ok(())
}
