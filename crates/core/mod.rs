//-----------------------------------------------------------------------------
// Core Module - Shared functionality across the client
//-----------------------------------------------------------------------------

//! Core abstractions shared across the registry, codec, signing and
//! transaction pipelines: error types, the dial-time configuration struct,
//! address derivation and proto type-url utilities.

pub mod address;
pub mod config;
pub mod error;
pub mod protoutil;

pub use config::ClientConfig;
pub use error::ClientError;
