//-----------------------------------------------------------------------------
// Client Configuration
//-----------------------------------------------------------------------------
//
// Explicit configuration struct for `Client::dial`, following this
// codebase's existing `CosmosClientConfig` convention rather than the
// functional-options pattern of the implementation this client was modeled
// on.

use std::sync::Arc;

use crate::app_descriptor::AppDescriptor;
use crate::registry::sources::ProtoFileRegistry;
use crate::signer_info::SignerInfoProvider;
use crate::signing::Signer;

use super::error::ClientError;

/// Configuration consumed by `ClientConfig::dial`.
#[derive(Clone)]
pub struct ClientConfig {
    /// Address of the chain's gRPC endpoint, e.g. `http://localhost:9090`.
    pub grpc_endpoint: String,

    /// Address of the chain's Tendermint RPC/WebSocket endpoint, e.g.
    /// `http://localhost:26657`. Required unless `read_only` is set.
    pub tendermint_endpoint: String,

    /// Source of proto descriptors. Defaults to gRPC server reflection
    /// against `grpc_endpoint` when not supplied.
    pub remote_registry: Option<Arc<dyn ProtoFileRegistry>>,

    /// Pre-fetched application descriptor. Skips the one-shot reflection
    /// fetch at dial time when supplied.
    pub app_descriptor: Option<AppDescriptor>,

    /// Transaction signer. Defaults to a null-object erroring signer when
    /// `read_only` is set and no signer is supplied.
    pub signer: Option<Arc<dyn Signer>>,

    /// Account number/sequence/public-key source. Defaults to querying
    /// `cosmos.auth.v1beta1.Query/Account` when not supplied.
    pub signer_info_provider: Option<Arc<dyn SignerInfoProvider>>,

    /// When set, the client never opens a Signer or a tx Watcher; queries
    /// remain fully functional.
    pub read_only: bool,
}

impl ClientConfig {
    /// Validates the fields that must be checked before any I/O is
    /// attempted (dial-time `Config` errors per the error taxonomy).
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.grpc_endpoint.trim().is_empty() {
            return Err(ClientError::ConfigError(
                "grpc_endpoint must not be empty".to_string(),
            ));
        }

        if !self.read_only && self.tendermint_endpoint.trim().is_empty() {
            return Err(ClientError::ConfigError(
                "tendermint_endpoint is required unless read_only is set".to_string(),
            ));
        }

        Ok(())
    }
}
