//! Address domain model.
//!
//! # Responsibility
//! - Define the canonical address record and its lenient raw input shape.
//! - Own the single normalization boundary between the two.
//!
//! # Invariants
//! - Every stored record is identified by a derived `AddressId`.
//! - Raw shapes are consumed only by `address::normalize`.

pub mod address;
