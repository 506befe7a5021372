//-----------------------------------------------------------------------------
// Error Types
//-----------------------------------------------------------------------------

/// Error type returned by every component of the dynamic client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("client error: {0}")]
    ClientError(String),

    #[error("query error: {0}")]
    QueryError(String),

    #[error("parse error: {0}")]
    ParseError(String),

    #[error("transaction error: {0}")]
    TransactionError(String),

    #[error("not implemented: {0}")]
    NotImplemented(String),

    #[error("timeout error: {0}")]
    TimeoutError(String),

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("resource not found: {0}")]
    NotFoundError(String),

    #[error("state mismatch: {0}")]
    StateMismatch(String),

    #[error("action failed: {0}")]
    ActionFailed(String),

    /// A descriptor was fetched but is malformed (cyclic or unresolvable
    /// import, invalid FileDescriptorProto). Never cached.
    #[error("malformed descriptor {name}: {reason}")]
    MalformedDescriptor { name: String, reason: String },

    /// `TxBuilder::add_msg` was called with a message whose full name is not
    /// in the chain's declared supported set.
    #[error("message type not supported by this chain: {0}")]
    UnsupportedMessage(String),

    /// `SignerInfoProvider` queried an account whose stored type it does not
    /// know how to extract a public key and sequence from.
    #[error("unsupported account type: {0}")]
    UnsupportedAccountType(String),

    /// `TxBuilder::sign` precondition failed (empty fee payer, zero gas,
    /// empty message list, malformed fee coin).
    #[error("validation error: {0}")]
    Validation(String),

    /// A broadcast was rejected by the chain. Carries the structured
    /// CheckTx/DeliverTx failure so the caller can inspect the raw log.
    #[error("broadcast failed (code {code}, tx {tx_hash}): {raw_log}")]
    BroadcastTx {
        code: u32,
        tx_hash: String,
        raw_log: String,
    },

    /// The external `Signer` refused to sign or could not provide a public
    /// key.
    #[error("signer refused: {0}")]
    SignerRefused(String),

    /// A bech32 address did not decode under the chain's configured
    /// account-address prefix.
    #[error("address prefix mismatch: expected {expected}, got {actual}")]
    AddressPrefixMismatch { expected: String, actual: String },

    /// `Watcher::watch` was called after the watcher's event loop stopped.
    #[error("watcher is closed")]
    WatcherClosed,
}

//-----------------------------------------------------------------------------
// Error Conversions
//-----------------------------------------------------------------------------

impl From<prost::EncodeError> for ClientError {
    fn from(err: prost::EncodeError) -> Self {
        ClientError::SerializationError(format!("protobuf encoding error: {err}"))
    }
}

impl From<prost::DecodeError> for ClientError {
    fn from(err: prost::DecodeError) -> Self {
        ClientError::SerializationError(format!("protobuf decoding error: {err}"))
    }
}

impl From<prost_reflect::DescriptorError> for ClientError {
    fn from(err: prost_reflect::DescriptorError) -> Self {
        ClientError::MalformedDescriptor {
            name: String::new(),
            reason: err.to_string(),
        }
    }
}

impl From<tonic::Status> for ClientError {
    fn from(status: tonic::Status) -> Self {
        use tonic::Code;
        match status.code() {
            Code::NotFound => ClientError::NotFoundError(status.message().to_string()),
            Code::DeadlineExceeded => ClientError::TimeoutError(status.message().to_string()),
            _ => ClientError::QueryError(status.message().to_string()),
        }
    }
}

impl From<tonic::transport::Error> for ClientError {
    fn from(err: tonic::transport::Error) -> Self {
        ClientError::ClientError(format!("transport error: {err}"))
    }
}

//-----------------------------------------------------------------------------
// Tests
//-----------------------------------------------------------------------------
