//! Address collection state, display ordering and persistence.
//!
//! # Responsibility
//! - Hold the session's single source of truth for saved addresses.
//! - Derive display order without touching storage order.
//! - Mirror the collection into durable storage in the background.

pub mod collection;
pub mod ordering;
pub mod persistence;
