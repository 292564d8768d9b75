//! Postcode lookup collaborator boundary.
//!
//! # Responsibility
//! - Define the async contract for address lookups.
//! - Guarantee via `LookupRequest` that collaborators only ever see
//!   validated, digit-only inputs.
//!
//! # Invariants
//! - `Ok(None)` and `Ok(Some(empty))` both mean "no results".
//! - Returned entries are raw shapes; callers normalize them.

use crate::model::address::RawAddress;
use crate::validation::{validate_lookup_form, FormError};
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod mock;

pub use mock::MockAddressLookup;

/// Shown when a lookup fails without a usable message.
pub const LOOKUP_FAILED_MESSAGE: &str = "Something went wrong while fetching addresses.";
/// Shown when a lookup succeeds with no entries.
pub const NO_RESULTS_MESSAGE: &str = "No results found!";

/// Validated lookup input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupRequest {
    postcode: String,
    house_number: String,
}

impl LookupRequest {
    /// Validates raw form input.
    pub fn parse(postcode: &str, house_number: &str) -> Result<Self, FormError> {
        validate_lookup_form(postcode, house_number)?;
        Ok(Self {
            postcode: postcode.to_string(),
            house_number: house_number.to_string(),
        })
    }

    pub fn postcode(&self) -> &str {
        &self.postcode
    }

    pub fn house_number(&self) -> &str {
        &self.house_number
    }
}

/// Lookup failure: transport error, non-success response or collaborator
/// fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// The collaborator reported a failure, possibly with a message.
    Failed(String),
    /// The collaborator could not be reached.
    Unreachable(String),
}

impl LookupError {
    /// Single message suitable for the form's error field.
    pub fn user_message(&self) -> String {
        let message = match self {
            Self::Failed(message) | Self::Unreachable(message) => message.trim(),
        };
        if message.is_empty() {
            LOOKUP_FAILED_MESSAGE.to_string()
        } else {
            message.to_string()
        }
    }
}

impl Display for LookupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Failed(message) => write!(f, "lookup failed: {message}"),
            Self::Unreachable(message) => write!(f, "lookup unreachable: {message}"),
        }
    }
}

impl Error for LookupError {}

/// Async address lookup collaborator.
#[async_trait]
pub trait AddressLookup: Send + Sync {
    async fn lookup(&self, request: &LookupRequest) -> Result<Option<Vec<RawAddress>>, LookupError>;
}
