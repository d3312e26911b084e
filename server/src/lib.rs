//! In-memory Nambola backend: ticket handout, name draws, the claim queue
//! and its game-wide lock, served over the JSON HTTP API the clients poll.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

pub mod config;
pub mod error;
pub mod game;
pub mod qr;
pub mod routes;
#[cfg(test)]
mod tests;

use config::ServerConfig;
use game::Game;
use routes::*;

#[derive(Clone)]
pub struct AppState {
    pub game: Arc<Mutex<Game>>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn from_config(config: ServerConfig) -> anyhow::Result<Self> {
        let names = config.load_names()?;
        let profiles = config.load_profiles()?;
        let game = Game::new(names, profiles, &mut rand::thread_rng())?;
        Ok(Self {
            game: Arc::new(Mutex::new(game)),
            config: Arc::new(config),
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/register", post(register_handler))
        .route("/api/names", get(names_handler))
        .route("/api/ticket/:ticket_id", get(ticket_handler))
        .route("/api/game-status", get(game_status_handler))
        .route("/api/claim", post(claim_handler))
        .route("/api/profile/:name", get(profile_handler))
        .route("/api/admin/login", post(admin_login_handler))
        .route("/api/admin/pick-name", post(pick_name_handler))
        .route("/api/admin/claims", get(claims_handler))
        .route("/api/admin/verify-claim", post(verify_claim_handler))
        .route("/api/admin/reset-game", post(reset_game_handler))
        .route("/api/admin/qr-code", get(qr_code_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves on an already bound listener until the process is stopped.
pub async fn serve(listener: TcpListener, state: AppState) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    info!("server listening on http://{addr}");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Received Ctrl+C, shutting down");
    }
}
