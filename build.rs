//-----------------------------------------------------------------------------
// Main Build Script
//-----------------------------------------------------------------------------
//
// Compiles the two vendored proto sources this client needs that aren't
// already available pre-generated from `cosmos-sdk-proto`: the gRPC
// server-reflection protocol (what ReflectionSource dials) and the
// cosmos-sdk AppDescriptor reflection service.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=proto");

    tonic_build::configure()
        .build_server(false)
        .compile(
            &[
                "proto/grpc/reflection/v1alpha/reflection.proto",
                "proto/cosmos/base/reflection/v2alpha1/reflection.proto",
            ],
            &["proto"],
        )?;

    Ok(())
}
