//! Address book form session.
//!
//! # Responsibility
//! - Drive the find-address and attach-person flows against the collection.
//! - Keep search results, selection, loading flags and the single
//!   user-facing message.
//! - Hydrate the collection from persisted storage at startup.
//!
//! # Invariants
//! - Only the most recently started search may publish results; older
//!   responses are dropped.
//! - Validation and lookup failures never change the collection.
//! - Personal names are never written to logs.

use crate::lookup::{AddressLookup, LookupError, LookupRequest, NO_RESULTS_MESSAGE};
use crate::model::address::{normalize, Address, AddressId, RawAddress};
use crate::store::collection::{dedupe_by_id, AddressCollection, CollectionChange};
use crate::store::ordering::order;
use crate::store::persistence::PersistenceBridge;
use crate::validation::{normalize_space, validate_person_form, FormError};
use log::{debug, info};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

/// Token identifying one started search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    sequence: u64,
    request: LookupRequest,
}

impl SearchTicket {
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn request(&self) -> &LookupRequest {
        &self.request
    }
}

/// Result of applying a lookup response to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Results replaced the previous list.
    Found(usize),
    /// Lookup returned nothing; the message is set.
    NoResults,
    /// Lookup failed; the message is set.
    Failed,
    /// Form input was rejected before any lookup; the message is set.
    Invalid,
    /// A newer search started meanwhile; the response was dropped.
    Stale,
}

/// One user's address book screen state.
pub struct AddressBookSession {
    collection: AddressCollection,
    lookup: Arc<dyn AddressLookup>,
    results: Vec<Address>,
    selected: Option<AddressId>,
    message: Option<String>,
    loading: bool,
    last_ticket: u64,
    active_ticket: Option<u64>,
}

impl AddressBookSession {
    pub fn new(lookup: Arc<dyn AddressLookup>) -> Self {
        Self {
            collection: AddressCollection::new(),
            lookup,
            results: Vec::new(),
            selected: None,
            message: None,
            loading: false,
            last_ticket: 0,
            active_ticket: None,
        }
    }

    /// Registers a listener for collection changes (used by persistence).
    pub fn subscribe(&mut self) -> UnboundedReceiver<CollectionChange> {
        self.collection.subscribe()
    }

    /// Replaces the collection with the records stored under `key`.
    ///
    /// Stored records that normalize to the same id collapse into one entry.
    /// Any load failure leaves the collection untouched. The loading flag is
    /// cleared whatever the outcome. Returns the number of hydrated records.
    pub async fn load_saved(&mut self, bridge: &PersistenceBridge, key: &str) -> usize {
        self.loading = true;
        let saved = bridge.load(key).await;
        let hydrated = match saved {
            Some(raw) => {
                let addresses = dedupe_by_id(raw.iter().map(normalize).collect());
                let count = addresses.len();
                self.collection.replace(addresses);
                count
            }
            None => 0,
        };
        self.loading = false;
        info!(
            "event=session_hydrate module=service status=ok count={}",
            hydrated
        );
        hydrated
    }

    /// Starts a search: resets results and selection, then validates input.
    ///
    /// On validation failure the message is set and no ticket is issued.
    pub fn begin_search(
        &mut self,
        postcode: &str,
        house_number: &str,
    ) -> Result<SearchTicket, FormError> {
        self.message = None;
        self.results.clear();
        self.selected = None;

        let request = match LookupRequest::parse(postcode, house_number) {
            Ok(request) => request,
            Err(err) => {
                debug!(
                    "event=search_rejected module=service status=error error={:?}",
                    err
                );
                self.active_ticket = None;
                self.message = Some(err.to_string());
                return Err(err);
            }
        };

        self.last_ticket += 1;
        self.active_ticket = Some(self.last_ticket);
        Ok(SearchTicket {
            sequence: self.last_ticket,
            request,
        })
    }

    /// Applies a lookup response for `ticket`.
    pub fn complete_search(
        &mut self,
        ticket: SearchTicket,
        response: Result<Option<Vec<RawAddress>>, LookupError>,
    ) -> SearchOutcome {
        if self.active_ticket != Some(ticket.sequence) {
            debug!(
                "event=search_complete module=service status=stale seq={} active={:?}",
                ticket.sequence, self.active_ticket
            );
            return SearchOutcome::Stale;
        }
        self.active_ticket = None;

        match response {
            Ok(Some(raw)) if !raw.is_empty() => {
                self.results = raw.iter().map(normalize).collect();
                info!(
                    "event=search_complete module=service status=ok seq={} count={}",
                    ticket.sequence,
                    self.results.len()
                );
                SearchOutcome::Found(self.results.len())
            }
            Ok(_) => {
                info!(
                    "event=search_complete module=service status=ok seq={} count=0",
                    ticket.sequence
                );
                self.message = Some(NO_RESULTS_MESSAGE.to_string());
                SearchOutcome::NoResults
            }
            Err(err) => {
                info!(
                    "event=search_complete module=service status=error seq={} error={}",
                    ticket.sequence, err
                );
                self.message = Some(err.user_message());
                SearchOutcome::Failed
            }
        }
    }

    /// Validates input, runs the lookup and applies its response.
    pub async fn find(&mut self, postcode: &str, house_number: &str) -> SearchOutcome {
        let ticket = match self.begin_search(postcode, house_number) {
            Ok(ticket) => ticket,
            Err(_) => return SearchOutcome::Invalid,
        };
        let lookup = Arc::clone(&self.lookup);
        let response = lookup.lookup(ticket.request()).await;
        self.complete_search(ticket, response)
    }

    /// Marks one search result as selected.
    pub fn select(&mut self, id: impl Into<AddressId>) {
        self.selected = Some(id.into());
    }

    /// Attaches a person to the selected result and upserts it.
    ///
    /// On success the selection is cleared and the stored record returned.
    pub fn add_person(&mut self, first_name: &str, last_name: &str) -> Result<Address, FormError> {
        self.message = None;
        match self.try_add_person(first_name, last_name) {
            Ok(address) => {
                self.selected = None;
                Ok(address)
            }
            Err(err) => {
                self.message = Some(err.to_string());
                Err(err)
            }
        }
    }

    fn try_add_person(&mut self, first_name: &str, last_name: &str) -> Result<Address, FormError> {
        let has_selection = self.selected.is_some() && !self.results.is_empty();
        validate_person_form(first_name, last_name, has_selection)?;

        let selected = self.selected.as_deref().unwrap_or_default();
        let found = self
            .results
            .iter()
            .find(|address| address.id == selected)
            .ok_or(FormError::SelectedAddressNotFound)?;

        let record = found.with_person(normalize_space(first_name), normalize_space(last_name));
        let outcome = self.collection.upsert(record.clone());
        info!(
            "event=person_attached module=service status=ok outcome={:?} len={}",
            outcome,
            self.collection.len()
        );
        Ok(record)
    }

    /// Removes a saved entry. Unknown ids are ignored.
    pub fn remove(&mut self, id: &str) -> bool {
        self.collection.remove(id)
    }

    /// Resets the form: results, selection, message and any pending search.
    pub fn clear_form(&mut self) {
        self.results.clear();
        self.selected = None;
        self.message = None;
        self.active_ticket = None;
    }

    /// Saved entries in display order.
    pub fn entries(&self) -> Vec<Address> {
        order(self.collection.select_all())
    }

    pub fn collection(&self) -> &AddressCollection {
        &self.collection
    }

    pub fn results(&self) -> &[Address] {
        &self.results
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Whether a started search has not been applied yet.
    pub fn is_searching(&self) -> bool {
        self.active_ticket.is_some()
    }
}
