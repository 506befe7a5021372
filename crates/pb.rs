//-----------------------------------------------------------------------------
// Generated protobuf/gRPC stubs
//-----------------------------------------------------------------------------
//
// Thin wrappers around the two proto sources vendored under `proto/` and
// compiled by `build.rs`. Everything else this client talks to
// (`cosmos.auth.v1beta1`, `cosmos.tx.v1beta1`, ...) comes from
// `cosmos-sdk-proto` instead.

/// gRPC server reflection v1alpha (bidirectional-stream service used by
/// `registry::sources::ReflectionSource`).
pub mod reflection_v1alpha {
    tonic::include_proto!("grpc.reflection.v1alpha");
}

/// cosmos-sdk `ReflectionService` (AppDescriptor, six unary RPCs).
pub mod app_descriptor_v2alpha1 {
    tonic::include_proto!("cosmos.base.reflection.v2alpha1");
}
