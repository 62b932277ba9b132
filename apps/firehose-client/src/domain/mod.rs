//! Domain Layer - Core filter bookkeeping.
//!
//! This layer contains the pure in-memory filter state for the streaming
//! client with no external dependencies or I/O.

/// Refcounted filter-set tracking and parameter snapshots.
pub mod filter;
