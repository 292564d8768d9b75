//! Repository layer for durable key-value storage.
//!
//! # Responsibility
//! - Define the async key-value contract the persistence bridge writes to.
//! - Keep SQLite details behind that contract.
//!
//! # Invariants
//! - Values are opaque UTF-8 strings; callers own their encoding.
//! - `set_item` is last-writer-wins per key.

pub mod kv_repo;
