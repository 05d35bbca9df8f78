//! Build script for the catalog API
//!
//! Compiles proto/catalog.proto into Rust when the `grpc` feature is on.
//! Without it nothing is generated and protoc is not required.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=proto/catalog.proto");

    #[cfg(feature = "grpc")]
    tonic_prost_build::configure()
        // Generate server code (we're implementing the service)
        .build_server(true)
        // Client stubs for downstream callers
        .build_client(true)
        .compile_protos(&["proto/catalog.proto"], &["proto"])?;

    Ok(())
}
