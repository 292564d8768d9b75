//! Deterministic in-process lookup used by the CLI and tests.

use super::{AddressLookup, LookupError, LookupRequest};
use crate::model::address::RawAddress;
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

/// Generates a fixed set of Brisbane addresses for any valid request.
///
/// Entries mix the `line1`/`street` and `postcode`/`postCode`
/// shapes. A house number of all zeros yields no results.
#[derive(Debug, Clone, Default)]
pub struct MockAddressLookup {
    delay: Option<Duration>,
}

impl MockAddressLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an artificial response delay.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Builds the raw entries for one request without any delay.
    pub fn generate(postcode: &str, house_number: &str) -> Option<Vec<RawAddress>> {
        if house_number.bytes().all(|byte| byte == b'0') {
            return None;
        }

        let entries = [
            json!({
                "line1": format!("2 Edward Street {house_number}"),
                "city": "Brisbane",
                "postcode": postcode,
                "houseNumber": house_number,
            }),
            json!({
                "street": "Queen Street",
                "city": "Brisbane",
                "postCode": postcode,
                "houseNumber": house_number,
            }),
            json!({
                "line1": "Adelaide Street",
                "city": "Brisbane",
                "postCode": postcode,
                "houseNumber": house_number,
            }),
        ];
        Some(entries.iter().map(RawAddress::from_value).collect())
    }
}

#[async_trait]
impl AddressLookup for MockAddressLookup {
    async fn lookup(&self, request: &LookupRequest) -> Result<Option<Vec<RawAddress>>, LookupError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(Self::generate(request.postcode(), request.house_number()))
    }
}
