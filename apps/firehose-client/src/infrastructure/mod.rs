//! Infrastructure Layer - Adapters and connection machinery.
//!
//! This layer contains the stream decoder, the reconnect policy, the
//! connection supervisor, and configuration loading.

/// Streaming connection machinery (decoder, reconnect policy, supervisor).
pub mod firehose;

/// Configuration and credential loading.
pub mod config;
