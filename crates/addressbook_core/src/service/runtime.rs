//! Composition root wiring session, store and persistence worker.
//!
//! # Responsibility
//! - Hydrate the session from storage before any save can run.
//! - Subscribe the persistence worker to collection changes.
//! - Offer settle/shutdown points so callers can wait for durable state.
//!
//! # Invariants
//! - Hydration itself is never written back to storage.
//! - Dropping the runtime detaches the worker; `shutdown` drains it first.

use crate::config::AppConfig;
use crate::lookup::AddressLookup;
use crate::repo::kv_repo::{KeyValueStore, SqliteKeyValueStore, StoreResult};
use crate::service::session::AddressBookSession;
use crate::store::persistence::{
    PersistStatus, PersistenceBridge, PersistenceHandle, PersistenceWorker,
};
use std::sync::Arc;

/// Running address book: one session plus its persistence worker.
pub struct AddressBookRuntime {
    session: AddressBookSession,
    persistence: PersistenceHandle,
    baseline_revision: u64,
}

impl AddressBookRuntime {
    /// Starts a runtime over any key-value store.
    ///
    /// Must be called within a tokio runtime.
    pub async fn start(
        store: Arc<dyn KeyValueStore>,
        lookup: Arc<dyn AddressLookup>,
        storage_key: impl Into<String>,
    ) -> Self {
        let storage_key = storage_key.into();
        let bridge = PersistenceBridge::new(store);
        let mut session = AddressBookSession::new(lookup);

        session.load_saved(&bridge, &storage_key).await;
        let baseline_revision = session.collection().revision();

        let changes = session.subscribe();
        let persistence = PersistenceWorker::spawn(bridge, storage_key, changes);

        Self {
            session,
            persistence,
            baseline_revision,
        }
    }

    /// Opens the SQLite store named by `config` and starts a runtime on it.
    pub async fn open(config: &AppConfig, lookup: Arc<dyn AddressLookup>) -> StoreResult<Self> {
        let store = SqliteKeyValueStore::open(&config.db_path)?;
        Ok(Self::start(Arc::new(store), lookup, config.storage_key.clone()).await)
    }

    pub fn session(&self) -> &AddressBookSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut AddressBookSession {
        &mut self.session
    }

    pub fn persist_status(&self) -> PersistStatus {
        self.persistence.status()
    }

    /// Waits until the current collection state has been saved (or failed to).
    pub async fn settle(&self) -> PersistStatus {
        let revision = self.session.collection().revision();
        if revision <= self.baseline_revision {
            return self.persistence.status();
        }
        self.persistence.wait_for_revision(revision).await
    }

    /// Waits until every save the worker has started is finished.
    pub async fn flush(&self) -> PersistStatus {
        self.persistence.flush().await
    }

    /// Drops the session and waits for the worker to finish pending saves.
    pub async fn shutdown(self) -> PersistStatus {
        let Self {
            session,
            persistence,
            ..
        } = self;
        drop(session);
        persistence.join().await
    }
}
