//-----------------------------------------------------------------------------
// Dynamic gRPC Codec
//-----------------------------------------------------------------------------
//
// A `tonic::codec::Codec` whose wire types are `DynamicMessage`s rather than
// a fixed, generated-at-compile-time pair. This is what lets `Client::query`
// call an arbitrary `/pkg.Service/Method` the way `DynamicQuery` does in the
// reference implementation, without a generated client for that service.

use bytes::Buf;
use prost::Message;
use prost_reflect::{DynamicMessage, MessageDescriptor};
use tonic::codec::{Codec, DecodeBuf, Decoder, EncodeBuf, Encoder};
use tonic::Status;

/// Encodes/decodes a single unary call's request and response as dynamic
/// messages against their respective descriptors.
#[derive(Clone)]
pub struct DynamicCodec {
    response_descriptor: MessageDescriptor,
}

impl DynamicCodec {
    pub fn new(response_descriptor: MessageDescriptor) -> Self {
        Self { response_descriptor }
    }
}

impl Codec for DynamicCodec {
    type Encode = DynamicMessage;
    type Decode = DynamicMessage;
    type Encoder = DynamicEncoder;
    type Decoder = DynamicDecoder;

    fn encoder(&mut self) -> Self::Encoder {
        DynamicEncoder
    }

    fn decoder(&mut self) -> Self::Decoder {
        DynamicDecoder {
            descriptor: self.response_descriptor.clone(),
        }
    }
}

#[derive(Clone, Default)]
pub struct DynamicEncoder;

impl Encoder for DynamicEncoder {
    type Item = DynamicMessage;
    type Error = Status;

    fn encode(&mut self, item: Self::Item, dst: &mut EncodeBuf<'_>) -> Result<(), Self::Error> {
        item.encode(dst)
            .map_err(|e| Status::internal(format!("failed to encode dynamic message: {e}")))
    }
}

#[derive(Clone)]
pub struct DynamicDecoder {
    descriptor: MessageDescriptor,
}

impl Decoder for DynamicDecoder {
    type Item = DynamicMessage;
    type Error = Status;

    fn decode(&mut self, src: &mut DecodeBuf<'_>) -> Result<Option<Self::Item>, Self::Error> {
        if !src.has_remaining() {
            return Ok(None);
        }

        let msg = DynamicMessage::decode(self.descriptor.clone(), src)
            .map_err(|e| Status::internal(format!("failed to decode dynamic message: {e}")))?;
        Ok(Some(msg))
    }
}
