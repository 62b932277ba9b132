//! Firehose Connection Machinery
//!
//! Implements the streaming connection lifecycle:
//!
//! - **codec**: incremental CRLF-delimited JSON decoding
//! - **reconnect**: bounded exponential backoff with jitter
//! - **connection**: the supervisor task that owns the live stream

pub mod codec;
pub mod connection;
pub mod reconnect;

pub use codec::{DecodeError, LineDecoder};
pub use connection::StreamEvent;
pub use reconnect::{ReconnectConfig, ReconnectPolicy};
