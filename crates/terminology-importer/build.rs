//! Compiles the import service protobuf definitions.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tonic_build::compile_protos("proto/importer.proto")?;
    Ok(())
}
