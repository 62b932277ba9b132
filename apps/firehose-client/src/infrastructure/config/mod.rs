//! Configuration Module
//!
//! Credential validation and client settings, loaded programmatically or
//! from environment variables.

mod settings;

pub use settings::{ClientConfig, CredentialError, Credentials, StreamSettings};
