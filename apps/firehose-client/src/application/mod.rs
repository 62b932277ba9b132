//! Application Layer - Port definitions.
//!
//! This layer defines the contracts through which the connection
//! supervisor reaches external systems.

/// Port interfaces for the authenticated streaming transport.
pub mod ports;
