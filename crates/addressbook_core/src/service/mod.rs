//! Use-case layer over the address collection.
//!
//! # Responsibility
//! - Orchestrate validation, lookup, normalization and collection updates.
//! - Wire persistence so UI-facing callers never touch storage directly.

pub mod runtime;
pub mod session;
