use tracing_subscriber::EnvFilter;
use vitalog::{ServerConfig, VitalogError, VitalogServer};

#[tokio::main]
async fn main() -> Result<(), VitalogError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let server = VitalogServer::builder()
        .config(ServerConfig::from_env())
        .build()
        .await?;
    server.run().await
}
