//! In-memory address collection.
//!
//! # Responsibility
//! - Hold canonical addresses in storage order.
//! - Provide upsert/remove/replace keyed by the derived identity.
//! - Notify subscribers with a full snapshot after every effective change.
//!
//! # Invariants
//! - `id` is unique within the collection.
//! - Upsert of an existing id replaces the entry at the same index.
//! - Operations are synchronous and only touch in-memory state; persistence
//!   reacts to notifications.

use crate::model::address::{Address, AddressId};
use log::debug;
use std::collections::HashMap;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Snapshot emitted after a mutating operation changed the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionChange {
    /// Monotonic per-collection change counter, starting at 1.
    pub revision: u64,
    /// Full storage-order contents after the change.
    pub snapshot: Vec<Address>,
}

/// Outcome of [`AddressCollection::upsert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// A new entry was appended at `index`.
    Inserted { index: usize },
    /// The entry at `index` was replaced in place.
    Replaced { index: usize },
}

/// Collapses records sharing an id with upsert semantics: the first
/// occurrence keeps its position and the last one supplies the contents.
pub fn dedupe_by_id(addresses: Vec<Address>) -> Vec<Address> {
    let mut positions: HashMap<AddressId, usize> = HashMap::with_capacity(addresses.len());
    let mut unique: Vec<Address> = Vec::with_capacity(addresses.len());
    for address in addresses {
        match positions.get(&address.id) {
            Some(&index) => unique[index] = address,
            None => {
                positions.insert(address.id.clone(), unique.len());
                unique.push(address);
            }
        }
    }
    unique
}

/// Ordered collection of canonical addresses.
#[derive(Debug, Default)]
pub struct AddressCollection {
    addresses: Vec<Address>,
    revision: u64,
    subscribers: Vec<UnboundedSender<CollectionChange>>,
}

impl AddressCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record or replaces the one with the same id in place.
    pub fn upsert(&mut self, address: Address) -> UpsertOutcome {
        let outcome = match self.position(&address.id) {
            Some(index) => {
                self.addresses[index] = address;
                UpsertOutcome::Replaced { index }
            }
            None => {
                self.addresses.push(address);
                UpsertOutcome::Inserted {
                    index: self.addresses.len() - 1,
                }
            }
        };
        debug!(
            "event=collection_upsert module=store status=ok outcome={:?} len={}",
            outcome,
            self.addresses.len()
        );
        self.notify();
        outcome
    }

    /// Removes the record with `id`. Returns whether anything was removed.
    ///
    /// Unknown ids are a no-op and emit no notification.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.addresses.len();
        self.addresses.retain(|address| address.id != id);
        let removed = self.addresses.len() != before;
        debug!(
            "event=collection_remove module=store status=ok removed={} len={}",
            removed,
            self.addresses.len()
        );
        if removed {
            self.notify();
        }
        removed
    }

    /// Discards current contents and sets them to exactly `addresses`.
    ///
    /// Callers pass already-normalized records.
    pub fn replace(&mut self, addresses: Vec<Address>) {
        self.addresses = addresses;
        debug!(
            "event=collection_replace module=store status=ok len={}",
            self.addresses.len()
        );
        self.notify();
    }

    /// Read-only view in storage order.
    pub fn select_all(&self) -> &[Address] {
        &self.addresses
    }

    pub fn find(&self, id: &str) -> Option<&Address> {
        self.addresses.iter().find(|address| address.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// Current change counter; 0 before the first change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Registers a change listener.
    ///
    /// Listeners only see changes made after subscribing. Dropped receivers
    /// are pruned on the next notification.
    pub fn subscribe(&mut self) -> UnboundedReceiver<CollectionChange> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.addresses.iter().position(|address| address.id == id)
    }

    fn notify(&mut self) {
        self.revision += 1;
        if self.subscribers.is_empty() {
            return;
        }
        let change = CollectionChange {
            revision: self.revision,
            snapshot: self.addresses.clone(),
        };
        self.subscribers
            .retain(|subscriber| subscriber.send(change.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::{dedupe_by_id, AddressCollection, UpsertOutcome};
    use crate::model::address::{normalize, Address, RawAddress};
    use serde_json::json;

    fn address(street: &str, house_number: &str) -> Address {
        normalize(&RawAddress::from_value(&json!({
            "street": street,
            "postcode": "4000",
            "houseNumber": house_number,
        })))
    }

    #[test]
    fn upsert_appends_new_ids() {
        let mut collection = AddressCollection::new();

        assert_eq!(
            collection.upsert(address("Main", "1")),
            UpsertOutcome::Inserted { index: 0 }
        );
        assert_eq!(
            collection.upsert(address("Main", "2")),
            UpsertOutcome::Inserted { index: 1 }
        );
        assert_eq!(collection.len(), 2);
    }

    #[test]
    fn upsert_replaces_existing_id_in_place() {
        let mut collection = AddressCollection::new();
        collection.upsert(address("Main", "1"));
        collection.upsert(address("Main", "2"));
        collection.upsert(address("Main", "3"));

        let named = address("Main", "2").with_person("Ann", "Lee");
        assert_eq!(
            collection.upsert(named.clone()),
            UpsertOutcome::Replaced { index: 1 }
        );

        assert_eq!(collection.len(), 3);
        assert_eq!(collection.select_all()[1], named);
        assert_eq!(collection.select_all()[0].house_number, "1");
        assert_eq!(collection.select_all()[2].house_number, "3");
    }

    #[test]
    fn remove_unknown_id_is_a_noop() {
        let mut collection = AddressCollection::new();
        collection.upsert(address("Main", "1"));
        let before = collection.select_all().to_vec();
        let revision = collection.revision();

        assert!(!collection.remove("missing"));
        assert_eq!(collection.select_all(), before.as_slice());
        assert_eq!(collection.revision(), revision);
    }

    #[test]
    fn replace_sets_exact_contents() {
        let mut collection = AddressCollection::new();
        collection.upsert(address("Main", "1"));

        collection.replace(vec![address("High", "9"), address("Low", "3")]);

        let streets: Vec<_> = collection
            .select_all()
            .iter()
            .map(|address| address.street.as_str())
            .collect();
        assert_eq!(streets, vec!["High", "Low"]);
    }

    #[test]
    fn dedupe_keeps_first_position_and_last_contents() {
        let ann = address("Main", "1").with_person("Ann", "Lee");
        let bob = address("Main", "1").with_person("Bob", "Stone");

        let unique = dedupe_by_id(vec![ann, address("High", "2"), bob.clone()]);

        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0], bob);
        assert_eq!(unique[1].street, "High");
    }

    #[test]
    fn subscribers_receive_snapshots_for_effective_changes() {
        let mut collection = AddressCollection::new();
        let mut changes = collection.subscribe();

        collection.upsert(address("Main", "1"));
        collection.remove("missing");
        collection.remove(&address("Main", "1").id);

        let first = changes.try_recv().unwrap();
        assert_eq!(first.revision, 1);
        assert_eq!(first.snapshot.len(), 1);

        let second = changes.try_recv().unwrap();
        assert_eq!(second.revision, 2);
        assert!(second.snapshot.is_empty());

        assert!(changes.try_recv().is_err());
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let mut collection = AddressCollection::new();
        drop(collection.subscribe());
        let mut live = collection.subscribe();

        collection.upsert(address("Main", "1"));

        assert_eq!(collection.subscribers.len(), 1);
        assert!(live.try_recv().is_ok());
    }
}
