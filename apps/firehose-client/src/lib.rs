#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::cast_possible_truncation,
        clippy::needless_pass_by_value,
        clippy::default_trait_access
    )
)]

//! Firehose Client - Filtered Streaming Feed Consumer
//!
//! A long-lived client for a server-sent, newline-delimited JSON
//! streaming feed whose filter parameters (keywords, geographic bounding
//! boxes, followed entity IDs) can change at runtime.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Pure filter bookkeeping
//!   - `filter`: Refcounted, insertion-ordered filter sets and the
//!     parameter snapshot a connection is opened with
//!
//! - **Application**: Port definitions
//!   - `ports`: The `StreamTransport` interface the supervisor opens
//!     connections through (the signed HTTP request lives behind it)
//!
//! - **Infrastructure**: Connection machinery
//!   - `firehose`: Incremental CRLF/JSON decoder, backoff policy, and the
//!     connection supervisor task
//!   - `config`: Credentials and stream settings
//!
//! # Data Flow
//!
//! ```text
//! subscribe/unsubscribe ──► FilterSet ──► debounced reconnect
//!                                              │
//!                        StreamTransport ◄─────┘
//!                              │
//!                        byte chunks ──► LineDecoder ──► StreamEvent
//!                                                        channel
//! ```
//!
//! Filter mutations return immediately. The supervisor task coalesces
//! bursts of mutations into a single reconnect, tears the stream down
//! without delay when the last filter is removed, and retries transport
//! failures with jittered exponential backoff, reporting each retry to
//! the consumer.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Pure filter bookkeeping with no I/O.
pub mod domain;

/// Application layer - Port definitions.
pub mod application;

/// Infrastructure layer - Decoder, reconnect machinery, configuration.
pub mod infrastructure;

mod client;

// =============================================================================
// Re-exports
// =============================================================================

// Client facade
pub use client::FirehoseClient;

// Domain types
pub use domain::filter::{FilterCategory, FilterParams, FilterSet};

// Transport port
pub use application::ports::{ByteStream, StreamTransport, TransportError};

// Connection machinery
pub use infrastructure::firehose::{
    DecodeError, LineDecoder, ReconnectConfig, ReconnectPolicy, StreamEvent,
};

// Configuration
pub use infrastructure::config::{ClientConfig, CredentialError, Credentials, StreamSettings};
