use axum::{
    extract::{Path, State},
    Json,
};
use nambola_protocol::*;
use tracing::{debug, warn};

use crate::{error::AppError, qr, AppState};

/* ------------------------------ player ------------------------------ */

pub async fn register_handler(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, AppError> {
    let mut game = state.game.lock();
    Ok(Json(game.register(&payload.player_name)?))
}

pub async fn names_handler(State(state): State<AppState>) -> Json<NamesResponse> {
    let game = state.game.lock();
    Json(NamesResponse { names: game.names() })
}

pub async fn ticket_handler(
    State(state): State<AppState>,
    Path(ticket_id): Path<String>,
) -> Result<Json<Ticket>, AppError> {
    let game = state.game.lock();
    Ok(Json(game.ticket(&ticket_id)?))
}

pub async fn game_status_handler(State(state): State<AppState>) -> Json<GameStatus> {
    let game = state.game.lock();
    Json(game.status())
}

pub async fn claim_handler(
    State(state): State<AppState>,
    Json(payload): Json<ClaimRequest>,
) -> Json<ClaimResponse> {
    let mut game = state.game.lock();
    let response = game.claim(&payload.ticket_id);
    if !response.success {
        debug!("claim for {} rejected", payload.ticket_id);
    }
    Json(response)
}

pub async fn profile_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Json<Profile> {
    let game = state.game.lock();
    Json(game.profile(&name))
}

/* ------------------------------- admin ------------------------------- */

pub async fn admin_login_handler(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    if payload.password != state.config.admin_password {
        warn!("[ADMIN] rejected login attempt");
        return Err(AppError::Unauthorized("Invalid password".into()));
    }
    Ok(Json(LoginResponse {
        success: true,
        token: Some("admin_authenticated".into()),
    }))
}

pub async fn pick_name_handler(State(state): State<AppState>) -> Result<Json<PickNameResponse>, AppError> {
    let mut game = state.game.lock();
    Ok(Json(game.pick_name(&mut rand::thread_rng())?))
}

pub async fn claims_handler(State(state): State<AppState>) -> Json<Vec<PendingClaim>> {
    let game = state.game.lock();
    Json(game.pending_claims())
}

pub async fn verify_claim_handler(
    State(state): State<AppState>,
    Json(payload): Json<VerifyClaimRequest>,
) -> Result<Json<VerifyClaimResponse>, AppError> {
    let mut game = state.game.lock();
    Ok(Json(game.verify_claim(payload.claim_id, payload.is_valid)?))
}

pub async fn reset_game_handler(State(state): State<AppState>) -> Json<Ack> {
    let mut game = state.game.lock();
    game.reset();
    Json(Ack { success: true })
}

pub async fn qr_code_handler(State(state): State<AppState>) -> Result<Json<QrCode>, AppError> {
    let url = state.config.join_url.clone();
    Ok(Json(QrCode {
        qr_code: Some(qr::png_data_url(&url)?),
        url,
    }))
}
