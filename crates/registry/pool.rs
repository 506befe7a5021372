//-----------------------------------------------------------------------------
// Registry - lazy descriptor pool
//-----------------------------------------------------------------------------
//
// Wraps a `prost_reflect::DescriptorPool`, resolving files from a
// `ProtoFileRegistry` source on demand and registering their full import
// closure. `prost-reflect` (unlike the reflect package this is modeled on)
// requires a file's dependencies to already be registered before the file
// itself can be added, so resolution walks the dependency graph and inserts
// files in dependency order rather than relying on a resolver callback.

use std::collections::HashMap;
use std::sync::Arc;

use prost_reflect::{
    DescriptorPool, EnumDescriptor, ExtensionDescriptor, FieldDescriptor, FileDescriptor,
    MessageDescriptor, MethodDescriptor, ServiceDescriptor,
};
use prost_types::{FileDescriptorProto, FileDescriptorSet};
use tokio::sync::Mutex;

use crate::core::error::ClientError;
use crate::core::protoutil::full_name_from_url;

use super::sources::ProtoFileRegistry;

pub struct Registry {
    remote: Arc<dyn ProtoFileRegistry>,
    pool: Mutex<DescriptorPool>,
}

/// A handle to a named element inside a registered file: a message, enum,
/// service, method, field or extension. `prost-reflect` exposes each kind
/// through its own descriptor type rather than one common one, so this wraps
/// them the way `FindDescriptorByName` on the reflect registry this is
/// modeled on returns a single polymorphic descriptor.
#[derive(Clone, Debug)]
pub enum Descriptor {
    Message(MessageDescriptor),
    Enum(EnumDescriptor),
    Service(ServiceDescriptor),
    Method(MethodDescriptor),
    Field(FieldDescriptor),
    Extension(ExtensionDescriptor),
}

impl Descriptor {
    pub fn full_name(&self) -> &str {
        match self {
            Descriptor::Message(d) => d.full_name(),
            Descriptor::Enum(d) => d.full_name(),
            Descriptor::Service(d) => d.full_name(),
            Descriptor::Method(d) => d.full_name(),
            Descriptor::Field(d) => d.full_name(),
            Descriptor::Extension(d) => d.full_name(),
        }
    }
}

impl Registry {
    pub fn new(remote: Arc<dyn ProtoFileRegistry>) -> Self {
        Self {
            remote,
            pool: Mutex::new(DescriptorPool::new()),
        }
    }

    /// Seeds the pool from a previously saved snapshot, still falling back
    /// to `remote` for anything the snapshot doesn't contain.
    pub fn with_snapshot(
        remote: Arc<dyn ProtoFileRegistry>,
        set: FileDescriptorSet,
    ) -> Result<Self, ClientError> {
        let mut pool = DescriptorPool::new();
        pool.add_file_descriptor_set(set)?;
        Ok(Self {
            remote,
            pool: Mutex::new(pool),
        })
    }

    pub async fn find_message_by_name(
        &self,
        full_name: &str,
    ) -> Result<MessageDescriptor, ClientError> {
        {
            let pool = self.pool.lock().await;
            if let Some(md) = pool.get_message_by_name(full_name) {
                return Ok(md);
            }
        }

        let root = self.remote.file_containing_symbol(full_name).await?;
        let mut pool = self.pool.lock().await;
        self.register_closure(&mut pool, root).await?;

        pool.get_message_by_name(full_name)
            .ok_or_else(|| ClientError::NotFoundError(format!("message {full_name}")))
    }

    pub async fn find_message_by_url(
        &self,
        type_url: &str,
    ) -> Result<MessageDescriptor, ClientError> {
        self.find_message_by_name(&full_name_from_url(type_url)).await
    }

    pub async fn find_service_by_name(
        &self,
        full_name: &str,
    ) -> Result<ServiceDescriptor, ClientError> {
        {
            let pool = self.pool.lock().await;
            if let Some(sd) = pool.get_service_by_name(full_name) {
                return Ok(sd);
            }
        }

        let root = self.remote.file_containing_symbol(full_name).await?;
        let mut pool = self.pool.lock().await;
        self.register_closure(&mut pool, root).await?;

        pool.get_service_by_name(full_name)
            .ok_or_else(|| ClientError::NotFoundError(format!("service {full_name}")))
    }

    pub async fn find_extension_by_name(
        &self,
        full_name: &str,
    ) -> Result<ExtensionDescriptor, ClientError> {
        {
            let pool = self.pool.lock().await;
            if let Some(xd) = pool.get_extension_by_name(full_name) {
                return Ok(xd);
            }
        }

        let root = self.remote.file_containing_symbol(full_name).await?;
        let mut pool = self.pool.lock().await;
        self.register_closure(&mut pool, root).await?;

        pool.get_extension_by_name(full_name)
            .ok_or_else(|| ClientError::NotFoundError(format!("extension {full_name}")))
    }

    /// Resolves `full_name` to whichever kind of element declares it -
    /// message, enum, service, extension, or a method/field one level below
    /// a service/message name - fetching the containing file through
    /// `remote` on a pool miss the same way the other finders do.
    pub async fn find_descriptor(&self, full_name: &str) -> Result<Descriptor, ClientError> {
        if let Some(descriptor) = self.lookup_descriptor(full_name).await {
            return Ok(descriptor);
        }

        let root = self.remote.file_containing_symbol(full_name).await?;
        {
            let mut pool = self.pool.lock().await;
            self.register_closure(&mut pool, root).await?;
        }

        self.lookup_descriptor(full_name)
            .await
            .ok_or_else(|| ClientError::NotFoundError(format!("descriptor {full_name}")))
    }

    async fn lookup_descriptor(&self, full_name: &str) -> Option<Descriptor> {
        let pool = self.pool.lock().await;

        if let Some(md) = pool.get_message_by_name(full_name) {
            return Some(Descriptor::Message(md));
        }
        if let Some(ed) = pool.get_enum_by_name(full_name) {
            return Some(Descriptor::Enum(ed));
        }
        if let Some(sd) = pool.get_service_by_name(full_name) {
            return Some(Descriptor::Service(sd));
        }
        if let Some(xd) = pool.get_extension_by_name(full_name) {
            return Some(Descriptor::Extension(xd));
        }

        // Methods and fields aren't addressable directly in the pool;
        // resolve their parent service/message first.
        let (parent, leaf) = full_name.rsplit_once('.')?;
        if let Some(md) = pool.get_message_by_name(parent) {
            if let Some(fd) = md.fields().find(|f| f.name() == leaf) {
                return Some(Descriptor::Field(fd));
            }
        }
        if let Some(sd) = pool.get_service_by_name(parent) {
            if let Some(method) = sd.methods().find(|m| m.name() == leaf) {
                return Some(Descriptor::Method(method));
            }
        }
        None
    }

    pub async fn find_file_by_path(&self, path: &str) -> Result<FileDescriptor, ClientError> {
        {
            let pool = self.pool.lock().await;
            if let Some(fd) = pool.get_file_by_name(path) {
                return Ok(fd);
            }
        }

        let root = self.remote.file_by_path(path).await?;
        let mut pool = self.pool.lock().await;
        self.register_closure(&mut pool, root).await
    }

    /// Returns a snapshot of every file currently registered in the pool,
    /// suitable for `Registry::with_snapshot` on a later run.
    pub async fn save(&self) -> FileDescriptorSet {
        let pool = self.pool.lock().await;
        FileDescriptorSet {
            file: pool.files().map(|f| f.file_descriptor_proto().clone()).collect(),
        }
    }

    /// Fetches every file transitively imported by `root` that isn't
    /// already in `pool`, then inserts them (root included) in an order
    /// that satisfies `prost-reflect`'s dependencies-first requirement.
    /// A cyclic or unresolvable import surfaces as `MalformedDescriptor`
    /// and nothing from this call is cached.
    async fn register_closure(
        &self,
        pool: &mut DescriptorPool,
        root: FileDescriptorProto,
    ) -> Result<FileDescriptor, ClientError> {
        let root_name = root.name.clone().unwrap_or_default();
        let mut fetched: HashMap<String, FileDescriptorProto> = HashMap::new();
        let mut frontier = vec![root];

        while let Some(fdp) = frontier.pop() {
            let name = fdp.name.clone().unwrap_or_default();
            if pool.get_file_by_name(&name).is_some() || fetched.contains_key(&name) {
                continue;
            }

            for dep in &fdp.dependency {
                if pool.get_file_by_name(dep).is_none() && !fetched.contains_key(dep) {
                    let dep_fdp = self.remote.file_by_path(dep).await?;
                    frontier.push(dep_fdp);
                }
            }

            fetched.insert(name, fdp);
        }

        while !fetched.is_empty() {
            let ready: Vec<String> = fetched
                .iter()
                .filter(|(_, fdp)| {
                    fdp.dependency
                        .iter()
                        .all(|dep| pool.get_file_by_name(dep).is_some())
                })
                .map(|(name, _)| name.clone())
                .collect();

            if ready.is_empty() {
                return Err(ClientError::MalformedDescriptor {
                    name: root_name,
                    reason: "unresolved or cyclic proto import".to_string(),
                });
            }

            for name in ready {
                let fdp = fetched.remove(&name).expect("key just observed present");
                pool.add_file_descriptor_proto(fdp).map_err(|e| {
                    ClientError::MalformedDescriptor {
                        name: name.clone(),
                        reason: e.to_string(),
                    }
                })?;
            }
        }

        pool.get_file_by_name(&root_name)
            .ok_or_else(|| ClientError::NotFoundError(format!("file {root_name}")))
    }
}
