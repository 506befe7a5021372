//-----------------------------------------------------------------------------
// Registry Module - dynamic proto descriptor resolution
//-----------------------------------------------------------------------------

//! Resolves protobuf file descriptors on demand, from gRPC server reflection
//! or a cached snapshot, and mints the message/service types this client
//! needs out of them.

pub mod pool;
pub mod sources;

pub use pool::{Descriptor, Registry};
pub use sources::{CacheSource, CompositeSource, ProtoFileRegistry, ReflectionSource};
