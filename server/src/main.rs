use clap::Parser;
use nambola_server::{config::ServerConfig, serve, AppState};
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = ServerConfig::parse();
    let addr = format!("0.0.0.0:{}", config.port);
    let state = AppState::from_config(config)?;

    let listener = TcpListener::bind(&addr).await?;
    serve(listener, state).await
}
