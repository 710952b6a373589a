//! Terminology importer gRPC server binary.

use std::net::SocketAddr;

use terminology_importer::proto::import_service_server::ImportServiceServer;
use terminology_importer::{Importer, ImporterConfig, ImporterServer};
use tonic::transport::Server;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = ImporterConfig::from_env();
    tracing::info!("Reading releases from: {}", config.base_folder.display());
    tracing::info!(
        "Chunk sizes: {} (SNOMED CT), {} (LOINC); processes kept for {} hours",
        config.snomed_chunk_size,
        config.loinc_chunk_size,
        config.retention.as_secs() / 3600
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    let server = ImporterServer::new(Importer::new(config));

    tracing::info!("Starting terminology importer gRPC server on {}", addr);

    Server::builder()
        .add_service(ImportServiceServer::new(server))
        .serve(addr)
        .await?;

    Ok(())
}
