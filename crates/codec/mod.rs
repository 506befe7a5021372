//-----------------------------------------------------------------------------
// Codec Module - marshal/unmarshal against dynamically resolved descriptors
//-----------------------------------------------------------------------------

pub mod grpc;

use std::sync::Arc;

use cosmos_sdk_proto::Any as ProtoAny;
use prost::Message;
use prost_reflect::{DynamicMessage, MessageDescriptor};

use crate::core::error::ClientError;
use crate::core::protoutil::{full_name_from_url, type_url_from_full_name};
use crate::registry::Registry;

/// Marshals/unmarshals dynamic messages against a `Registry`, the way
/// `cosmos_sdk_proto`'s generated types marshal against their fixed,
/// compile-time schema.
pub struct Codec {
    registry: Arc<Registry>,
}

impl Codec {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Deterministic binary marshal, matching the Cosmos SDK's requirement
    /// that `body_bytes`/`auth_info_bytes` are reproducible for signing.
    pub fn marshal(&self, msg: &DynamicMessage) -> Result<Vec<u8>, ClientError> {
        let mut buf = Vec::with_capacity(msg.encoded_len());
        msg.encode(&mut buf)?;
        Ok(buf)
    }

    pub async fn unmarshal(&self, full_name: &str, bytes: &[u8]) -> Result<DynamicMessage, ClientError> {
        let descriptor = self.registry.find_message_by_name(full_name).await?;
        self.unmarshal_with(&descriptor, bytes)
    }

    pub fn unmarshal_with(
        &self,
        descriptor: &MessageDescriptor,
        bytes: &[u8],
    ) -> Result<DynamicMessage, ClientError> {
        DynamicMessage::decode(descriptor.clone(), bytes).map_err(ClientError::from)
    }

    /// Resolves and decodes the message packed in `any`.
    pub async fn unmarshal_any(&self, any: &ProtoAny) -> Result<DynamicMessage, ClientError> {
        let full_name = full_name_from_url(&any.type_url);
        self.unmarshal(&full_name, &any.value).await
    }

    /// Packs a dynamic message into `Any` using the normalized
    /// `/fully.qualified.Name` type-url convention.
    pub fn new_any(&self, msg: &DynamicMessage) -> Result<ProtoAny, ClientError> {
        let type_url = type_url_from_full_name(msg.descriptor().full_name());
        let value = self.marshal(msg)?;
        Ok(ProtoAny { type_url, value })
    }

    /// Emits protojson. Used for human-inspectable logs and for consumers
    /// that prefer a textual transcript over raw protobuf.
    pub fn marshal_json(&self, msg: &DynamicMessage) -> Result<String, ClientError> {
        serde_json::to_string(msg).map_err(|e| ClientError::SerializationError(e.to_string()))
    }

    pub fn unmarshal_json(
        &self,
        descriptor: &MessageDescriptor,
        json: &str,
    ) -> Result<DynamicMessage, ClientError> {
        let mut de = serde_json::Deserializer::from_str(json);
        DynamicMessage::deserialize(descriptor.clone(), &mut de)
            .map_err(|e| ClientError::SerializationError(e.to_string()))
    }
}
