use std::{sync::Arc, time::Duration};

use nambola::api::{ApiClient, ApiError};
use nambola::messages::{AdminMsg, Msg, PlayMsg, RegisterMsg};
use nambola::states::play::CLAIM_SUBMITTED;
use nambola::states::Screen;
use nambola::storage::{self, KeyValueStore, MemoryStore};
use nambola::App;
use nambola_protocol::{TicketStatus, NAMES_PER_TICKET};
use nambola_server::{config::ServerConfig, AppState};

async fn spawn_server() -> String {
    let state = AppState::from_config(ServerConfig::default()).unwrap();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(nambola_server::serve(listener, state));
    format!("http://{}", addr)
}

/// Applies background results until `done` holds, collecting alerts on the way.
async fn pump_until<F>(app: &mut App, alerts: &mut Vec<String>, mut done: F)
where
    F: FnMut(&App, &[String]) -> bool,
{
    let waited = tokio::time::timeout(Duration::from_secs(15), async {
        loop {
            alerts.extend(app.take_alerts());
            if done(&*app, &alerts[..]) {
                return;
            }
            assert!(app.next_event().await, "event channel closed");
        }
    })
    .await;
    assert!(waited.is_ok(), "timed out on the {} screen", app.screen().title());
}

fn play_model(app: &App) -> &nambola::states::PlayModel {
    match app.screen() {
        Screen::Play(model) => model,
        other => panic!("expected play screen, got {}", other.title()),
    }
}

fn admin_model(app: &App) -> &nambola::states::AdminModel {
    match app.screen() {
        Screen::Admin(model) => model,
        other => panic!("expected admin screen, got {}", other.title()),
    }
}

#[tokio::test]
async fn api_client_speaks_the_backend_protocol() {
    let api = ApiClient::new(&spawn_server().await).unwrap();

    let names = api.names().await.unwrap();
    assert_eq!(names.len(), 30);

    let reg = api.register("Zoe").await.unwrap();
    let ticket = api.ticket(&reg.ticket_id).await.unwrap();
    assert_eq!(ticket.player_name.as_deref(), Some("Zoe"));
    assert_eq!(ticket.status, TicketStatus::Active);

    let err = api.register("   ").await.unwrap_err();
    assert_eq!(err.detail(), Some("Name required"));

    let err = api.admin_login("guess").await.unwrap_err();
    assert!(matches!(err, ApiError::Status { .. }));
    assert_eq!(err.status().map(|s| s.as_u16()), Some(401));
    api.admin_login("admin123").await.unwrap();

    let qr = api.qr_code().await.unwrap();
    assert_eq!(qr.url, "http://127.0.0.1:5173/");

    let pick = api.pick_name().await.unwrap();
    assert_eq!(pick.order, Some(1));
    assert_eq!(pick.remaining, Some(29));
    let status = api.game_status().await.unwrap();
    assert!(status.is_called(&pick.picked_name));

    let claim = api.claim(&reg.ticket_id).await.unwrap();
    assert!(claim.success);
    assert!(api.game_status().await.unwrap().is_locked);

    let pending = api.claims().await.unwrap();
    assert_eq!(pending.len(), 1);
    api.verify_claim(pending[0].claim_id, false).await.unwrap();
    assert!(!api.game_status().await.unwrap().is_locked);
    assert_eq!(api.ticket(&reg.ticket_id).await.unwrap().status, TicketStatus::Active);

    api.reset_game().await.unwrap();
    assert!(api.game_status().await.unwrap().picked_names.is_empty());
}

#[tokio::test]
async fn player_registers_marks_claims_and_wins() {
    let base = spawn_server().await;
    let store = Arc::new(MemoryStore::new());
    let mut app = App::start(ApiClient::new(&base).unwrap(), store.clone(), "/");
    let mut alerts = Vec::new();

    pump_until(&mut app, &mut alerts, |app, _| {
        matches!(app.screen(), Screen::Register(m) if !m.all_names.is_empty())
    })
    .await;

    app.dispatch(Msg::Register(RegisterMsg::NameChanged("  Zoe ".into())));
    app.dispatch(Msg::Register(RegisterMsg::Submit));
    pump_until(&mut app, &mut alerts, |app, _| {
        matches!(app.screen(), Screen::Play(m) if m.ticket.is_some() && m.status.is_some())
    })
    .await;

    let ticket_id = play_model(&app).ticket_id.clone();
    assert_eq!(storage::load_ticket_id(store.as_ref()).as_deref(), Some(ticket_id.as_str()));
    assert_eq!(app.location(), format!("/play?ticketId={}", ticket_id));
    assert_eq!(app.pollers().collect::<Vec<_>>(), vec!["play-status"]);

    let grid = play_model(&app).ticket.as_ref().unwrap().grid.clone();
    for (r, row) in grid.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            if cell.is_some() {
                app.dispatch(Msg::Play(PlayMsg::ToggleMark { row: r, col: c }));
            }
        }
    }
    let model = play_model(&app);
    assert_eq!(model.marked_cells(), NAMES_PER_TICKET);
    assert_eq!(model.claim_label(), "CLAIM WIN");
    assert!(store.get(&storage::marks_key(&ticket_id)).is_some());

    app.dispatch(Msg::Play(PlayMsg::Claim));
    pump_until(&mut app, &mut alerts, |app, alerts| {
        alerts.iter().any(|a| a == CLAIM_SUBMITTED) && play_model(app).is_claimed()
    })
    .await;
    assert_eq!(play_model(&app).claim_label(), "Waiting for Verification...");

    let admin = ApiClient::new(&base).unwrap();
    let pending = admin.claims().await.unwrap();
    assert_eq!(pending.len(), 1);
    admin.verify_claim(pending[0].claim_id, true).await.unwrap();

    pump_until(&mut app, &mut alerts, |app, _| play_model(app).is_winner()).await;
}

#[tokio::test]
async fn stored_ticket_resumes_with_marks() {
    let base = spawn_server().await;
    let api = ApiClient::new(&base).unwrap();
    let reg = api.register("Mia").await.unwrap();

    let store = Arc::new(MemoryStore::new());
    storage::save_ticket_id(store.as_ref(), &reg.ticket_id).unwrap();
    store
        .set(&storage::marks_key(&reg.ticket_id), r#"{"0-0":true,"1-1":false}"#)
        .unwrap();

    let mut app = App::start(api, store, "/somewhere-else");
    let model = play_model(&app);
    assert!(model.marks.is_marked(0, 0));
    assert!(!model.marks.is_marked(1, 1));

    let mut alerts = Vec::new();
    pump_until(&mut app, &mut alerts, |app, _| play_model(app).ticket.is_some()).await;
    assert_eq!(
        play_model(&app).ticket.as_ref().unwrap().player_name.as_deref(),
        Some("Mia")
    );
}

#[tokio::test]
async fn unknown_ticket_in_link_shows_load_error() {
    let base = spawn_server().await;
    let mut app = App::start(
        ApiClient::new(&base).unwrap(),
        Arc::new(MemoryStore::new()),
        "/play?ticketId=nope",
    );
    let mut alerts = Vec::new();
    pump_until(&mut app, &mut alerts, |app, _| play_model(app).load_error.is_some()).await;
    assert!(play_model(&app).ticket.is_none());
}

#[tokio::test]
async fn admin_logs_in_draws_reviews_and_resets() {
    let base = spawn_server().await;
    let player = ApiClient::new(&base).unwrap();
    let reg = player.register("Ivy").await.unwrap();

    let mut app = App::start(ApiClient::new(&base).unwrap(), Arc::new(MemoryStore::new()), "/admin");
    let mut alerts = Vec::new();
    assert!(app.pollers().next().is_none(), "no polling before login");

    app.dispatch(Msg::Admin(AdminMsg::PasswordChanged("wrong".into())));
    app.dispatch(Msg::Admin(AdminMsg::Login));
    pump_until(&mut app, &mut alerts, |_, alerts| !alerts.is_empty()).await;
    assert_eq!(alerts, vec!["Invalid password".to_string()]);
    assert!(!admin_model(&app).authenticated);

    app.dispatch(Msg::Admin(AdminMsg::PasswordChanged("admin123".into())));
    app.dispatch(Msg::Admin(AdminMsg::Login));
    pump_until(&mut app, &mut alerts, |app, _| {
        let m = admin_model(app);
        m.authenticated && m.qr.is_some() && m.status.is_some()
    })
    .await;
    assert_eq!(app.pollers().collect::<Vec<_>>(), vec!["admin-status"]);

    app.dispatch(Msg::Admin(AdminMsg::PickName));
    pump_until(&mut app, &mut alerts, |app, _| admin_model(app).reveal.is_some()).await;
    let reveal = admin_model(&app).reveal.clone().unwrap();
    assert_eq!(reveal.pick.order, Some(1));
    assert!(!reveal.photo_blurred());

    app.dispatch(Msg::Admin(AdminMsg::CloseReveal));
    pump_until(&mut app, &mut alerts, |app, _| {
        admin_model(app).status.as_ref().map(|s| s.picked_names.len()) == Some(1)
    })
    .await;

    player.claim(&reg.ticket_id).await.unwrap();
    pump_until(&mut app, &mut alerts, |app, _| admin_model(app).claims.len() == 1).await;
    let claim_id = admin_model(&app).claims[0].claim_id;
    app.dispatch(Msg::Admin(AdminMsg::Review(claim_id)));
    assert!(admin_model(&app).selected_claim.is_some());
    app.dispatch(Msg::Admin(AdminMsg::Verify { is_valid: true }));
    pump_until(&mut app, &mut alerts, |app, _| {
        let m = admin_model(app);
        m.selected_claim.is_none() && m.claims.is_empty()
    })
    .await;
    assert_eq!(player.ticket(&reg.ticket_id).await.unwrap().status, TicketStatus::Winner);

    alerts.clear();
    app.dispatch(Msg::Admin(AdminMsg::ResetRequested));
    app.dispatch(Msg::Admin(AdminMsg::ResetConfirmed));
    pump_until(&mut app, &mut alerts, |_, alerts| alerts.iter().any(|a| a == "Game reset")).await;
    assert!(player.game_status().await.unwrap().picked_names.is_empty());
}
