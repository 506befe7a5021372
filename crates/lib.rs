//-----------------------------------------------------------------------------
// Dynamic Cosmos - Main Entry Point
//-----------------------------------------------------------------------------

//! A dynamic, reflection-driven RPC client for Cosmos-SDK chains.
//!
//! Instead of linking generated protobuf code for each chain, this client
//! discovers a chain's message and service schemas at connection time via
//! gRPC server reflection and the cosmos-sdk `ReflectionService`, then uses
//! those descriptors to marshal, sign and broadcast transactions for any
//! chain that exposes them - without a recompile when a chain upgrades its
//! module set.

pub mod app_descriptor;
pub mod client;
pub mod codec;
pub mod core;
pub mod pb;
pub mod registry;
pub mod signer_info;
pub mod signing;
pub mod tx;
pub mod watcher;

//-----------------------------------------------------------------------------
// Convenience Re-exports
//-----------------------------------------------------------------------------

pub use app_descriptor::AppDescriptor;
pub use client::Client;
pub use core::{ClientConfig, ClientError};
pub use registry::pool::Registry;
pub use signer_info::SignerInfoProvider;
pub use signing::Signer;
pub use tx::broadcast::BroadcastMode;
pub use tx::builder::TxBuilder;
pub use watcher::Watcher;
