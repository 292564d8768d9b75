//! Canonical address record and raw-shape normalization.
//!
//! # Responsibility
//! - Define the canonical `Address` record held by the collection and store.
//! - Convert heterogeneous raw shapes (lookup results, persisted blobs) into
//!   canonical records through one total function.
//!
//! # Invariants
//! - `id` is derived from `(postcode, street, house_number)` and never
//!   supplied by callers.
//! - Canonical string fields are trimmed and never missing.
//! - `normalize(&normalize(x).to_raw()) == normalize(x)`.
//! - Raw shapes never leave this module boundary except as input.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque identity key derived from location fields.
///
/// Consumers compare and store it, but only [`address_id`] builds it.
pub type AddressId = String;

/// Card title shown when a record has neither a person nor a location.
pub const UNNAMED_TITLE: &str = "Unnamed";

/// Avatar text shown when a record has no names and no house number.
pub const FALLBACK_INITIALS: &str = "🏠";

/// Canonical address book entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    /// Derived identity key, see [`address_id`].
    pub id: AddressId,
    pub street: String,
    pub city: String,
    pub postcode: String,
    pub house_number: String,
    /// Present only once a person has been attached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

/// Lenient input shape accepted by [`normalize`].
///
/// Every field is an arbitrary JSON value so that malformed entries still
/// normalize instead of failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line1: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postcode: Option<Value>,
    #[serde(
        default,
        rename = "postCode",
        skip_serializing_if = "Option::is_none"
    )]
    pub post_code: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<Value>,
    #[serde(
        default,
        rename = "houseNumber",
        skip_serializing_if = "Option::is_none"
    )]
    pub house_number: Option<Value>,
    #[serde(
        default,
        rename = "firstName",
        skip_serializing_if = "Option::is_none"
    )]
    pub first_name: Option<Value>,
    #[serde(
        default,
        rename = "lastName",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_name: Option<Value>,
}

impl RawAddress {
    /// Reads one raw entry from an untyped JSON value.
    ///
    /// Non-object values yield an empty raw address, which normalizes to an
    /// address with empty fields.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(_) => serde_json::from_value(value.clone()).unwrap_or_default(),
            _ => Self::default(),
        }
    }
}

/// Builds the identity key for one location.
///
/// Each component is trimmed and internal whitespace runs collapse to a
/// single space. Case and component order are significant.
pub fn address_id(postcode: &str, street: &str, house_number: &str) -> AddressId {
    format!(
        "{}-{}-{}",
        collapse_whitespace(postcode),
        collapse_whitespace(street),
        collapse_whitespace(house_number)
    )
}

/// Converts a raw shape into a canonical address. Never fails.
///
/// `street` falls back to `line1` and `postcode` falls back to `postCode`
/// only when the preferred field is missing or null.
pub fn normalize(raw: &RawAddress) -> Address {
    let street = text_or_empty(present(&raw.street).or_else(|| present(&raw.line1)));
    let postcode = text_or_empty(present(&raw.postcode).or_else(|| present(&raw.post_code)));
    let city = text_or_empty(present(&raw.city));
    let house_number = text_or_empty(present(&raw.house_number));

    Address {
        id: address_id(&postcode, &street, &house_number),
        street,
        city,
        postcode,
        house_number,
        first_name: present(&raw.first_name).map(coerce_text),
        last_name: present(&raw.last_name).map(coerce_text),
    }
}

impl Address {
    /// Returns the raw shape this record would be persisted as.
    pub fn to_raw(&self) -> RawAddress {
        RawAddress {
            street: Some(Value::String(self.street.clone())),
            line1: None,
            postcode: Some(Value::String(self.postcode.clone())),
            post_code: None,
            city: Some(Value::String(self.city.clone())),
            house_number: Some(Value::String(self.house_number.clone())),
            first_name: self.first_name.clone().map(Value::String),
            last_name: self.last_name.clone().map(Value::String),
        }
    }

    /// Returns a replacement record with a person attached.
    ///
    /// Identity fields are copied unchanged, so the `id` stays the same.
    pub fn with_person(&self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: Some(first_name.into()),
            last_name: Some(last_name.into()),
            ..self.clone()
        }
    }

    /// Whether a non-blank first name is attached.
    pub fn has_first_name(&self) -> bool {
        self.first_name
            .as_deref()
            .is_some_and(|name| !name.trim().is_empty())
    }

    /// Card title: the person's full name, `house_number street` for bare
    /// addresses, or [`UNNAMED_TITLE`] when both are blank.
    pub fn display_title(&self) -> String {
        let name = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or("").trim(),
            self.last_name.as_deref().unwrap_or("").trim()
        );
        let name = name.trim();
        if !name.is_empty() {
            return name.to_string();
        }
        let location = format!("{} {}", self.house_number, self.street);
        let location = location.trim();
        if location.is_empty() {
            return UNNAMED_TITLE.to_string();
        }
        location.to_string()
    }

    /// Up to two uppercase initials, falling back to the house number and
    /// then to [`FALLBACK_INITIALS`].
    pub fn initials(&self) -> String {
        let first_initial = |value: &Option<String>| {
            value
                .as_deref()
                .and_then(|name| name.trim().chars().next())
        };
        let initials: String = [first_initial(&self.first_name), first_initial(&self.last_name)]
            .into_iter()
            .flatten()
            .flat_map(char::to_uppercase)
            .collect();
        if !initials.is_empty() {
            return initials;
        }
        let house_number = self.house_number.trim();
        let fallback = if house_number.is_empty() {
            FALLBACK_INITIALS
        } else {
            house_number
        };
        fallback
            .chars()
            .take(2)
            .flat_map(char::to_uppercase)
            .collect()
    }

    /// One-line location summary with empty parts skipped.
    pub fn summary(&self) -> String {
        let street_line = format!("{} {}", self.street, self.house_number);
        let locality = format!("{} {}", self.postcode, self.city);
        [street_line.trim(), locality.trim()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn present(value: &Option<Value>) -> Option<&Value> {
    value.as_ref().filter(|value| !value.is_null())
}

fn text_or_empty(value: Option<&Value>) -> String {
    value.map(coerce_text).unwrap_or_default()
}

fn coerce_text(value: &Value) -> String {
    let text = match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    };
    text.trim().to_string()
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
