//-----------------------------------------------------------------------------
// Proto File Sources
//-----------------------------------------------------------------------------
//
// `ProtoFileRegistry` is the remote-lookup contract the descriptor pool
// resolves against: given a file path or a fully qualified symbol name,
// produce the `FileDescriptorProto` that declares it. `ReflectionSource`
// talks gRPC server reflection; `CacheSource` serves a previously saved
// `FileDescriptorSet` snapshot; `CompositeSource` tries several in order.

use std::sync::Arc;

use async_trait::async_trait;
use prost::Message;
use prost_types::{DescriptorProto, EnumDescriptorProto, FileDescriptorProto, FileDescriptorSet};
use tokio::sync::{mpsc, Mutex};
use tokio_stream::wrappers::ReceiverStream;
use tonic::transport::Channel;

use crate::core::error::ClientError;
use crate::pb::reflection_v1alpha::server_reflection_request::MessageRequest;
use crate::pb::reflection_v1alpha::server_reflection_response::MessageResponse;
use crate::pb::reflection_v1alpha::server_reflection_client::ServerReflectionClient;
use crate::pb::reflection_v1alpha::ServerReflectionRequest;

/// Resolves a proto file by path or by the symbol it declares.
#[async_trait]
pub trait ProtoFileRegistry: Send + Sync {
    async fn file_by_path(&self, path: &str) -> Result<FileDescriptorProto, ClientError>;
    async fn file_containing_symbol(&self, full_name: &str)
        -> Result<FileDescriptorProto, ClientError>;

    /// Releases whatever connection or resources this source holds.
    /// Stateless sources (e.g. `CacheSource`) have nothing to release and
    /// keep the default no-op.
    async fn close(&self) {}
}

#[async_trait]
impl<T: ProtoFileRegistry + ?Sized> ProtoFileRegistry for Arc<T> {
    async fn file_by_path(&self, path: &str) -> Result<FileDescriptorProto, ClientError> {
        (**self).file_by_path(path).await
    }

    async fn file_containing_symbol(
        &self,
        full_name: &str,
    ) -> Result<FileDescriptorProto, ClientError> {
        (**self).file_containing_symbol(full_name).await
    }

    async fn close(&self) {
        (**self).close().await
    }
}

//-----------------------------------------------------------------------------
// ReflectionSource
//-----------------------------------------------------------------------------

/// A `ProtoFileRegistry` backed by the standard gRPC server reflection
/// protocol. The protocol is a single bidirectional stream per connection;
/// this holds that stream open and serializes requests against it behind an
/// async mutex, matching the one-stream-per-remote discipline of the
/// reference client this is modeled on.
pub struct ReflectionSource {
    stream: Mutex<ReflectionStream>,
}

struct ReflectionStream {
    /// `None` once `close()` has dropped the sender, half-closing the
    /// outbound side of the stream.
    tx: Option<mpsc::Sender<ServerReflectionRequest>>,
    rx: tonic::Streaming<crate::pb::reflection_v1alpha::ServerReflectionResponse>,
}

impl ReflectionSource {
    pub async fn connect(channel: Channel) -> Result<Self, ClientError> {
        let mut client = ServerReflectionClient::new(channel);
        let (tx, rx) = mpsc::channel(8);
        let outbound = ReceiverStream::new(rx);
        let response = client.server_reflection_info(outbound).await?;
        let inbound = response.into_inner();
        Ok(Self {
            stream: Mutex::new(ReflectionStream { tx: Some(tx), rx: inbound }),
        })
    }

    async fn request(&self, message_request: MessageRequest) -> Result<FileDescriptorProto, ClientError> {
        let mut stream = self.stream.lock().await;
        stream
            .tx
            .as_ref()
            .ok_or_else(|| ClientError::ClientError("reflection stream closed".to_string()))?
            .send(ServerReflectionRequest {
                host: String::new(),
                message_request: Some(message_request),
            })
            .await
            .map_err(|_| ClientError::ClientError("reflection stream closed".to_string()))?;

        let response = stream
            .rx
            .message()
            .await?
            .ok_or_else(|| ClientError::ClientError("reflection stream closed".to_string()))?;

        match response.message_response {
            Some(MessageResponse::FileDescriptorResponse(resp)) => {
                let raw = resp
                    .file_descriptor_proto
                    .first()
                    .ok_or_else(|| ClientError::NotFoundError("empty reflection response".to_string()))?;
                FileDescriptorProto::decode(raw.as_slice()).map_err(ClientError::from)
            }
            Some(MessageResponse::ErrorResponse(err)) => Err(ClientError::NotFoundError(format!(
                "server reflection error {}: {}",
                err.error_code, err.error_message
            ))),
            _ => Err(ClientError::ClientError(
                "unexpected server reflection response".to_string(),
            )),
        }
    }
}

#[async_trait]
impl ProtoFileRegistry for ReflectionSource {
    async fn file_by_path(&self, path: &str) -> Result<FileDescriptorProto, ClientError> {
        self.request(MessageRequest::FileByFilename(path.to_string())).await
    }

    async fn file_containing_symbol(
        &self,
        full_name: &str,
    ) -> Result<FileDescriptorProto, ClientError> {
        self.request(MessageRequest::FileContainingSymbol(full_name.to_string()))
            .await
    }

    /// Half-closes the bidirectional reflection stream by dropping the
    /// outbound sender. The server observes EOF on its receiving half and
    /// closes the stream from its end; further calls on this source fail
    /// with `ClientError::ClientError` rather than reopening a connection.
    async fn close(&self) {
        let mut stream = self.stream.lock().await;
        stream.tx = None;
    }
}

//-----------------------------------------------------------------------------
// CacheSource
//-----------------------------------------------------------------------------

/// A `ProtoFileRegistry` backed by a previously saved `FileDescriptorSet`.
/// Immutable after construction; safe to share across many `Registry`s.
pub struct CacheSource {
    set: FileDescriptorSet,
}

impl CacheSource {
    pub fn new(set: FileDescriptorSet) -> Self {
        Self { set }
    }
}

#[async_trait]
impl ProtoFileRegistry for CacheSource {
    async fn file_by_path(&self, path: &str) -> Result<FileDescriptorProto, ClientError> {
        self.set
            .file
            .iter()
            .find(|fdp| fdp.name.as_deref() == Some(path))
            .cloned()
            .ok_or_else(|| ClientError::NotFoundError(format!("file {path}")))
    }

    async fn file_containing_symbol(
        &self,
        full_name: &str,
    ) -> Result<FileDescriptorProto, ClientError> {
        self.set
            .file
            .iter()
            .find(|fdp| file_contains_symbol(fdp, full_name))
            .cloned()
            .ok_or_else(|| ClientError::NotFoundError(format!("symbol {full_name}")))
    }
}

fn file_contains_symbol(fdp: &FileDescriptorProto, full_name: &str) -> bool {
    let package = fdp.package.clone().unwrap_or_default();
    if package == full_name {
        return true;
    }

    if fdp
        .message_type
        .iter()
        .any(|md| descriptor_contains_symbol(md, &package, full_name))
    {
        return true;
    }

    for sd in &fdp.service {
        let service_name = append(&package, sd.name.as_deref().unwrap_or_default());
        if service_name == full_name {
            return true;
        }
        for method in &sd.method {
            let method_name = append(&service_name, method.name.as_deref().unwrap_or_default());
            if method_name == full_name {
                return true;
            }
        }
    }

    if fdp
        .enum_type
        .iter()
        .any(|ed| enum_contains_symbol(ed, &package, full_name))
    {
        return true;
    }

    fdp.extension.iter().any(|xd| {
        append(&package, xd.name.as_deref().unwrap_or_default()) == full_name
    })
}

fn descriptor_contains_symbol(desc: &DescriptorProto, parent: &str, full_name: &str) -> bool {
    let own_name = append(parent, desc.name.as_deref().unwrap_or_default());
    if own_name == full_name {
        return true;
    }

    if desc
        .field
        .iter()
        .any(|fd| append(&own_name, fd.name.as_deref().unwrap_or_default()) == full_name)
    {
        return true;
    }

    if desc
        .oneof_decl
        .iter()
        .any(|od| append(&own_name, od.name.as_deref().unwrap_or_default()) == full_name)
    {
        return true;
    }

    if desc
        .enum_type
        .iter()
        .any(|ed| enum_contains_symbol(ed, &own_name, full_name))
    {
        return true;
    }

    if desc
        .extension
        .iter()
        .any(|xd| append(&own_name, xd.name.as_deref().unwrap_or_default()) == full_name)
    {
        return true;
    }

    desc.nested_type
        .iter()
        .any(|nt| descriptor_contains_symbol(nt, &own_name, full_name))
}

fn enum_contains_symbol(desc: &EnumDescriptorProto, parent: &str, full_name: &str) -> bool {
    let own_name = append(parent, desc.name.as_deref().unwrap_or_default());
    if own_name == full_name {
        return true;
    }

    desc.value
        .iter()
        .any(|v| append(&own_name, v.name.as_deref().unwrap_or_default()) == full_name)
}

fn append(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

//-----------------------------------------------------------------------------
// CompositeSource
//-----------------------------------------------------------------------------

/// Tries each source in order, logging and falling through on failure. The
/// first source to resolve a path/symbol wins; if every source fails the
/// last failure reported is a generic `NotFoundError`.
pub struct CompositeSource {
    sources: Vec<Arc<dyn ProtoFileRegistry>>,
}

impl CompositeSource {
    pub fn new(sources: Vec<Arc<dyn ProtoFileRegistry>>) -> Self {
        Self { sources }
    }
}

#[async_trait]
impl ProtoFileRegistry for CompositeSource {
    async fn file_by_path(&self, path: &str) -> Result<FileDescriptorProto, ClientError> {
        for source in &self.sources {
            match source.file_by_path(path).await {
                Ok(fdp) => return Ok(fdp),
                Err(err) => log::debug!("proto source did not find path {path}: {err}"),
            }
        }
        Err(ClientError::NotFoundError(format!("file {path}")))
    }

    async fn file_containing_symbol(
        &self,
        full_name: &str,
    ) -> Result<FileDescriptorProto, ClientError> {
        for source in &self.sources {
            match source.file_containing_symbol(full_name).await {
                Ok(fdp) => return Ok(fdp),
                Err(err) => log::debug!("proto source did not find symbol {full_name}: {err}"),
            }
        }
        Err(ClientError::NotFoundError(format!("symbol {full_name}")))
    }

    async fn close(&self) {
        for source in &self.sources {
            source.close().await;
        }
    }
}
