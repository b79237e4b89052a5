use inventory_service::{build_router, build_state, ServiceConfig};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServiceConfig::from_env()?;
    let state = build_state(&config).await?;
    let app = build_router(state, &config.allowed_origins);

    let addr = config.socket_addr();
    info!(%addr, origins = ?config.allowed_origins, "starting inventory-service");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
