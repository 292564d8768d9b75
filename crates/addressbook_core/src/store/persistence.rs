//! Durable persistence for the address collection.
//!
//! # Responsibility
//! - Save collection snapshots as one JSON array under a storage key.
//! - Load persisted raw records at startup.
//! - Run a background worker that reacts to collection change
//!   notifications and sequences saves.
//!
//! # Invariants
//! - Persistence failures are logged and swallowed; they never surface to
//!   callers as errors.
//! - Load fails open: anything but a readable JSON array yields `None`.
//! - The worker runs one save at a time and always writes the newest queued
//!   snapshot, so the last save initiated is the last save completed.

use crate::model::address::{Address, RawAddress};
use crate::repo::kv_repo::KeyValueStore;
use crate::store::collection::CollectionChange;
use log::{debug, info, warn};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Storage key used when configuration does not override it.
pub const DEFAULT_STORAGE_KEY: &str = "addresses";

/// Async load/save adapter between the collection and a key-value store.
#[derive(Clone)]
pub struct PersistenceBridge {
    store: Arc<dyn KeyValueStore>,
}

impl PersistenceBridge {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Writes `snapshot` under `key`.
    ///
    /// Returns whether the write succeeded. Failures are logged only.
    pub async fn save(&self, key: &str, snapshot: &[Address]) -> bool {
        let started_at = Instant::now();
        let payload = match serde_json::to_string(snapshot) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(
                    "event=persist_save module=store status=error error_code=encode_failed count={} error={}",
                    snapshot.len(),
                    err
                );
                return false;
            }
        };

        match self.store.set_item(key, &payload).await {
            Ok(()) => {
                debug!(
                    "event=persist_save module=store status=ok count={} bytes={} duration_ms={}",
                    snapshot.len(),
                    payload.len(),
                    started_at.elapsed().as_millis()
                );
                true
            }
            Err(err) => {
                warn!(
                    "event=persist_save module=store status=error error_code=store_write_failed count={} duration_ms={} error={}",
                    snapshot.len(),
                    started_at.elapsed().as_millis(),
                    err
                );
                false
            }
        }
    }

    /// Reads the raw records stored under `key`.
    ///
    /// Returns `None` when the key is missing, the store fails, or the value
    /// is not a JSON array. Array entries are returned as-is for the
    /// normalizer, including malformed ones.
    pub async fn load(&self, key: &str) -> Option<Vec<RawAddress>> {
        let payload = match self.store.get_item(key).await {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                info!("event=persist_load module=store status=ok found=false");
                return None;
            }
            Err(err) => {
                warn!(
                    "event=persist_load module=store status=error error_code=store_read_failed error={}",
                    err
                );
                return None;
            }
        };

        match serde_json::from_str::<Value>(&payload) {
            Ok(Value::Array(items)) => {
                info!(
                    "event=persist_load module=store status=ok found=true count={}",
                    items.len()
                );
                Some(items.iter().map(RawAddress::from_value).collect())
            }
            Ok(_) => {
                warn!(
                    "event=persist_load module=store status=error error_code=not_an_array bytes={}",
                    payload.len()
                );
                None
            }
            Err(err) => {
                warn!(
                    "event=persist_load module=store status=error error_code=decode_failed error={}",
                    err
                );
                None
            }
        }
    }
}

/// Progress of the persistence worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistStatus {
    /// Sequence number of the most recently started save.
    pub last_initiated: u64,
    /// Sequence number of the most recently finished save.
    pub last_completed: u64,
    /// Sequence number of the most recent failed save, if any.
    pub last_failed: Option<u64>,
    /// Collection revision covered by the last finished save.
    pub settled_revision: u64,
}

impl PersistStatus {
    /// Whether every started save finished and the latest one succeeded.
    pub fn is_clean(&self) -> bool {
        self.last_completed == self.last_initiated && self.last_failed != Some(self.last_completed)
    }
}

/// Background task persisting collection snapshots.
pub struct PersistenceWorker;

impl PersistenceWorker {
    /// Spawns the worker on the current tokio runtime.
    ///
    /// The worker stops once every sender of `changes` is dropped.
    pub fn spawn(
        bridge: PersistenceBridge,
        key: impl Into<String>,
        changes: UnboundedReceiver<CollectionChange>,
    ) -> PersistenceHandle {
        let (status_tx, status_rx) = watch::channel(PersistStatus::default());
        let task = tokio::spawn(run_worker(bridge, key.into(), changes, status_tx));
        PersistenceHandle {
            status: status_rx,
            task,
        }
    }
}

/// Handle to a spawned [`PersistenceWorker`].
pub struct PersistenceHandle {
    status: watch::Receiver<PersistStatus>,
    task: JoinHandle<()>,
}

impl PersistenceHandle {
    pub fn status(&self) -> PersistStatus {
        *self.status.borrow()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<PersistStatus> {
        self.status.clone()
    }

    /// Waits until a save covering `revision` (or a later one) finished.
    ///
    /// Returns the last known status if the worker stopped first.
    pub async fn wait_for_revision(&self, revision: u64) -> PersistStatus {
        let mut status = self.status.clone();
        let settled = status
            .wait_for(|current| current.settled_revision >= revision)
            .await
            .map(|current| *current);
        match settled {
            Ok(current) => current,
            Err(_) => *self.status.borrow(),
        }
    }

    /// Waits until every save initiated so far has completed.
    ///
    /// Snapshots still queued but not yet picked up are not waited for; use
    /// [`Self::wait_for_revision`] to cover a specific collection state.
    pub async fn flush(&self) -> PersistStatus {
        let mut status = self.status.clone();
        let flushed = status
            .wait_for(|current| current.last_completed >= current.last_initiated)
            .await
            .map(|current| *current);
        match flushed {
            Ok(current) => current,
            Err(_) => *self.status.borrow(),
        }
    }

    /// Waits for the worker to drain and stop.
    ///
    /// Completes only after the collection feeding it has been dropped.
    pub async fn join(self) -> PersistStatus {
        if let Err(err) = self.task.await {
            warn!(
                "event=persist_worker_stop module=store status=error error={}",
                err
            );
        }
        *self.status.borrow()
    }
}

async fn run_worker(
    bridge: PersistenceBridge,
    key: String,
    mut changes: UnboundedReceiver<CollectionChange>,
    status: watch::Sender<PersistStatus>,
) {
    info!("event=persist_worker_start module=store status=ok");
    let mut sequence = 0_u64;

    while let Some(mut change) = changes.recv().await {
        let mut coalesced = 0_usize;
        while let Ok(newer) = changes.try_recv() {
            change = newer;
            coalesced += 1;
        }

        sequence += 1;
        status.send_modify(|current| current.last_initiated = sequence);
        debug!(
            "event=persist_flush module=store status=start seq={} revision={} coalesced={}",
            sequence, change.revision, coalesced
        );

        let ok = bridge.save(&key, &change.snapshot).await;

        status.send_modify(|current| {
            current.last_completed = sequence;
            current.settled_revision = change.revision;
            if !ok {
                current.last_failed = Some(sequence);
            }
        });
    }

    info!(
        "event=persist_worker_stop module=store status=ok saves={}",
        sequence
    );
}
