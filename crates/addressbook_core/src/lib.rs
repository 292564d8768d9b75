//! Core domain logic for the address book.
//! This crate is the single source of truth for address identity,
//! normalization, ordering and persistence rules.

pub mod config;
pub mod db;
pub mod logging;
pub mod lookup;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;
pub mod validation;

pub use config::AppConfig;
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use lookup::{
    AddressLookup, LookupError, LookupRequest, MockAddressLookup, LOOKUP_FAILED_MESSAGE,
    NO_RESULTS_MESSAGE,
};
pub use model::address::{address_id, normalize, Address, AddressId, RawAddress};
pub use repo::kv_repo::{
    KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore, StoreError, StoreResult,
};
pub use service::runtime::AddressBookRuntime;
pub use service::session::{AddressBookSession, SearchOutcome, SearchTicket};
pub use store::collection::{dedupe_by_id, AddressCollection, CollectionChange, UpsertOutcome};
pub use store::ordering::{collate, compare_addresses, order};
pub use store::persistence::{
    PersistStatus, PersistenceBridge, PersistenceHandle, PersistenceWorker, DEFAULT_STORAGE_KEY,
};
pub use validation::{
    is_strictly_numeric, is_valid_name, is_valid_postcode_length, normalize_space, FormError,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
