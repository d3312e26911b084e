use std::collections::HashMap;

use nambola_protocol::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::ServerConfig;
use crate::error::AppError;
use crate::game::Game;

fn test_names(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("{:02}_Guest{}", i, i)).collect()
}

/// Creates a game with `n` names and as many tickets
fn create_test_game(n: usize) -> Game {
    let mut rng = StdRng::seed_from_u64(42);
    Game::new(test_names(n), HashMap::new(), &mut rng).unwrap()
}

#[cfg(test)]
mod game_tests {
    use super::*;

    #[test]
    fn test_register_assigns_distinct_tickets_until_full() {
        let mut game = create_test_game(16);
        let mut ids = Vec::new();
        for i in 0..16 {
            let resp = game.register(&format!("  Player{}  ", i)).unwrap();
            assert_eq!(resp.player_name.as_deref(), Some(format!("Player{}", i).as_str()));
            assert_eq!(resp.grid.as_ref().map(filled_cells), Some(NAMES_PER_TICKET));
            ids.push(resp.ticket_id);
        }
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 16);

        match game.register("Late") {
            Err(AppError::BadRequest(msg)) => assert_eq!(msg, "Game full"),
            other => panic!("expected Game full, got {:?}", other.map(|r| r.ticket_id)),
        }
    }

    #[test]
    fn test_register_requires_name() {
        let mut game = create_test_game(15);
        match game.register("   ") {
            Err(AppError::BadRequest(msg)) => assert_eq!(msg, "Name required"),
            _ => panic!("blank name must be rejected"),
        }
    }

    #[test]
    fn test_unknown_ticket_is_not_found() {
        let game = create_test_game(15);
        assert!(matches!(game.ticket("not-a-uuid"), Err(AppError::NotFound(_))));
        assert!(matches!(
            game.ticket("6f1c2c3e-8c53-4b5d-9a59-8f55a3d1f0aa"),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_picks_are_ordered_until_exhausted() {
        let mut game = create_test_game(15);
        let mut rng = StdRng::seed_from_u64(3);
        for expected in 1..=15u32 {
            let pick = game.pick_name(&mut rng).unwrap();
            assert_eq!(pick.order, Some(expected));
            assert_eq!(pick.remaining, Some(15 - expected as usize));
        }
        assert!(matches!(game.pick_name(&mut rng), Err(AppError::BadRequest(_))));

        let status = game.status();
        let orders: Vec<u32> = status.picked_names.iter().map(|p| p.order).collect();
        assert_eq!(orders, (1..=15).collect::<Vec<_>>());
        assert!(status.last_pick_time.is_some());
    }

    #[test]
    fn test_claim_locks_and_verification_unlocks() {
        let mut game = create_test_game(15);
        let alice = game.register("Alice").unwrap().ticket_id;
        let bob = game.register("Bob").unwrap().ticket_id;

        let first = game.claim(&alice);
        assert!(first.success);
        assert_eq!(first.queue_position, Some(1));
        assert!(game.is_locked());
        assert_eq!(game.ticket(&alice).unwrap().status, TicketStatus::Claimed);

        // A claimed ticket cannot claim again
        let again = game.claim(&alice);
        assert!(!again.success);
        assert_eq!(again.message.as_deref(), Some("Invalid ticket"));

        let second = game.claim(&bob);
        assert_eq!(second.queue_position, Some(2));

        let pending = game.pending_claims();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].player_name.as_deref(), Some("Alice"));

        game.verify_claim(pending[0].claim_id, true).unwrap();
        assert!(game.is_locked(), "one claim still pending");
        assert_eq!(game.ticket(&alice).unwrap().status, TicketStatus::Winner);

        game.verify_claim(pending[1].claim_id, false).unwrap();
        assert!(!game.is_locked());
        assert_eq!(game.ticket(&bob).unwrap().status, TicketStatus::Active);

        let status = game.status();
        assert_eq!(status.winners.len(), 1);
        assert_eq!(status.winners[0].name.as_deref(), Some("Alice"));
    }

    #[test]
    fn test_resolved_claim_cannot_be_verified_again() {
        let mut game = create_test_game(15);
        let alice = game.register("Alice").unwrap().ticket_id;
        game.claim(&alice);
        let claim_id = game.pending_claims()[0].claim_id;

        game.verify_claim(claim_id, true).unwrap();
        match game.verify_claim(claim_id, false) {
            Err(AppError::BadRequest(msg)) => assert_eq!(msg, "Claim already resolved"),
            other => panic!("expected rejection, got {:?}", other.map(|r| r.winner)),
        }
        assert_eq!(game.ticket(&alice).unwrap().status, TicketStatus::Winner);
        assert_eq!(game.status().winners.len(), 1);
    }

    #[test]
    fn test_verify_unknown_claim() {
        let mut game = create_test_game(15);
        assert!(matches!(game.verify_claim(99, true), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_reset_restores_fresh_game() {
        let mut game = create_test_game(15);
        let mut rng = StdRng::seed_from_u64(9);
        let id = game.register("Alice").unwrap().ticket_id;
        game.pick_name(&mut rng).unwrap();
        game.claim(&id);

        game.reset();

        let status = game.status();
        assert!(status.picked_names.is_empty());
        assert!(!status.is_locked);
        assert!(game.pending_claims().is_empty());
        let ticket = game.ticket(&id).unwrap();
        assert_eq!(ticket.status, TicketStatus::Active);
        assert_eq!(ticket.player_name, None);
        // every ticket is available again
        for _ in 0..15 {
            game.register("Again").unwrap();
        }
    }
}

#[cfg(test)]
mod http_tests {
    use super::*;
    use crate::{router, AppState};
    use parking_lot::Mutex;
    use std::sync::Arc;

    async fn spawn_server() -> String {
        let state = AppState {
            game: Arc::new(Mutex::new(create_test_game(20))),
            config: Arc::new(ServerConfig::default()),
        };
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_register_and_fetch_ticket_over_http() {
        let base = spawn_server().await;
        let http = reqwest::Client::new();

        let resp: RegisterResponse = http
            .post(format!("{base}/api/register"))
            .json(&RegisterRequest { player_name: "Alice".into() })
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        let ticket: Ticket = http
            .get(format!("{base}/api/ticket/{}", resp.ticket_id))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(ticket.player_name.as_deref(), Some("Alice"));
        assert_eq!(ticket.status, TicketStatus::Active);
        assert_eq!(filled_cells(&ticket.grid), NAMES_PER_TICKET);
    }

    #[tokio::test]
    async fn test_errors_carry_detail() {
        let base = spawn_server().await;
        let http = reqwest::Client::new();

        let resp = http
            .post(format!("{base}/api/register"))
            .json(&RegisterRequest { player_name: " ".into() })
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
        let body: ErrorDetail = resp.json().await.unwrap();
        assert_eq!(body.detail, "Name required");

        let resp = http
            .post(format!("{base}/api/admin/login"))
            .json(&LoginRequest { password: "wrong".into() })
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_flow_over_http() {
        let base = spawn_server().await;
        let http = reqwest::Client::new();

        let login = http
            .post(format!("{base}/api/admin/login"))
            .json(&LoginRequest { password: "admin123".into() })
            .send()
            .await
            .unwrap();
        assert!(login.status().is_success());

        let pick: PickNameResponse = http
            .post(format!("{base}/api/admin/pick-name"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(pick.order, Some(1));

        let profile: Profile = http
            .get(format!("{base}/api/profile/{}", pick.picked_name))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(profile, Profile::default());

        let status: GameStatus = http
            .get(format!("{base}/api/game-status"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(status.is_called(&pick.picked_name));

        let qr: QrCode = http
            .get(format!("{base}/api/admin/qr-code"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(qr.url, ServerConfig::default().join_url);
        assert!(qr.qr_code.unwrap().starts_with("data:image/png;base64,"));

        let ack: Ack = http
            .post(format!("{base}/api/admin/reset-game"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(ack.success);
    }
}
