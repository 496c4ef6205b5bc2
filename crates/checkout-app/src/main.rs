use checkout_hex::config::Config;
use checkout_hex::inbound::http::{HttpServer, HttpServerConfig};
use checkout_hex::outbound::notify::LogNotifier;
use checkout_repo::{build_store, Store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env for DATABASE_URL / SERVER_PORT / RUST_LOG when present.
    let _ = dotenvy::dotenv();
    let config = Config::from_env()?;
    tracing_subscriber::fmt()
        .with_env_filter(config.log_filter.as_str())
        .init();

    let store: Store = build_store(config.database_url.as_deref()).await?;

    let server_cfg = HttpServerConfig {
        port: config.server_port.clone(),
    };

    let http = HttpServer::new(store, LogNotifier, server_cfg).await?;
    http.run().await
}
