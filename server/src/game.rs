use std::collections::HashMap;

use chrono::{DateTime, Utc};
use nambola_protocol::*;
use rand::seq::IteratorRandom;
use rand::Rng;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone)]
struct NameEntry {
    name: String,
    picked_at: Option<DateTime<Utc>>,
    pick_order: Option<u32>,
}

#[derive(Debug, Clone)]
struct TicketRecord {
    id: Uuid,
    grid: Grid,
    player_name: Option<String>,
    assigned: bool,
    status: TicketStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClaimState {
    Pending,
    Verified,
    Rejected,
}

#[derive(Debug, Clone)]
struct ClaimRecord {
    id: u64,
    ticket_id: Uuid,
    claimed_at: DateTime<Utc>,
    state: ClaimState,
}

/// Whole game state. Callers hold the surrounding mutex for every operation,
/// so each method is one atomic read-modify-write.
#[derive(Debug)]
pub struct Game {
    names: Vec<NameEntry>,
    tickets: Vec<TicketRecord>,
    claims: Vec<ClaimRecord>,
    next_claim_id: u64,
    claim_lock: bool,
    profiles: HashMap<String, Profile>,
}

impl Game {
    /// Pre-generates one ticket per name.
    pub fn new<R: Rng + ?Sized>(
        names: Vec<String>,
        profiles: HashMap<String, Profile>,
        rng: &mut R,
    ) -> Result<Self, TicketError> {
        let grids = pre_generate_tickets(&names, names.len(), rng)?;
        info!("Generated {} tickets", grids.len());

        let tickets = grids
            .into_iter()
            .map(|grid| TicketRecord {
                id: Uuid::new_v4(),
                grid,
                player_name: None,
                assigned: false,
                status: TicketStatus::Active,
            })
            .collect();

        Ok(Self {
            names: names
                .into_iter()
                .map(|name| NameEntry { name, picked_at: None, pick_order: None })
                .collect(),
            tickets,
            claims: Vec::new(),
            next_claim_id: 1,
            claim_lock: false,
            profiles,
        })
    }

    pub fn names(&self) -> Vec<String> {
        self.names.iter().map(|n| n.name.clone()).collect()
    }

    pub fn profile(&self, name: &str) -> Profile {
        self.profiles.get(name).cloned().unwrap_or_default()
    }

    pub fn is_locked(&self) -> bool {
        self.claim_lock
    }

    fn picked_sorted(&self) -> Vec<&NameEntry> {
        let mut picked: Vec<&NameEntry> = self.names.iter().filter(|n| n.pick_order.is_some()).collect();
        picked.sort_by_key(|n| n.pick_order);
        picked
    }

    fn picked_names(&self) -> Vec<String> {
        self.picked_sorted().into_iter().map(|n| n.name.clone()).collect()
    }

    fn find_ticket(&self, ticket_id: &str) -> Option<&TicketRecord> {
        let id = Uuid::parse_str(ticket_id).ok()?;
        self.tickets.iter().find(|t| t.id == id)
    }

    pub fn register(&mut self, player_name: &str) -> Result<RegisterResponse, AppError> {
        let player_name = player_name.trim();
        if player_name.is_empty() {
            return Err(AppError::BadRequest("Name required".into()));
        }

        let ticket = self
            .tickets
            .iter_mut()
            .find(|t| !t.assigned)
            .ok_or_else(|| AppError::BadRequest("Game full".into()))?;

        ticket.assigned = true;
        ticket.player_name = Some(player_name.to_string());
        info!("[REGISTER] {} got ticket {}", player_name, ticket.id);

        Ok(RegisterResponse {
            ticket_id: ticket.id.to_string(),
            grid: Some(ticket.grid.clone()),
            player_name: ticket.player_name.clone(),
        })
    }

    pub fn ticket(&self, ticket_id: &str) -> Result<Ticket, AppError> {
        let ticket = self
            .find_ticket(ticket_id)
            .ok_or_else(|| AppError::NotFound("Ticket not found".into()))?;

        Ok(Ticket {
            ticket_id: Some(ticket.id.to_string()),
            player_name: ticket.player_name.clone(),
            grid: ticket.grid.clone(),
            status: ticket.status,
            picked_names: self.picked_names(),
        })
    }

    pub fn status(&self) -> GameStatus {
        let picked = self.picked_sorted();
        let last_pick_time = picked.last().and_then(|n| n.picked_at).map(|t| t.to_rfc3339());

        GameStatus {
            picked_names: picked
                .iter()
                .filter_map(|n| {
                    Some(PickedName {
                        name: n.name.clone(),
                        order: n.pick_order?,
                        picked_at: n.picked_at.map(|t| t.to_rfc3339()),
                    })
                })
                .collect(),
            is_locked: self.claim_lock,
            winners: self
                .tickets
                .iter()
                .filter(|t| t.status == TicketStatus::Winner)
                .map(|t| Winner {
                    name: t.player_name.clone(),
                    ticket_id: t.id.to_string(),
                })
                .collect(),
            last_pick_time,
        }
    }

    pub fn claim(&mut self, ticket_id: &str) -> ClaimResponse {
        let invalid = ClaimResponse {
            success: false,
            message: Some("Invalid ticket".into()),
            queue_position: None,
        };

        let Some(id) = Uuid::parse_str(ticket_id).ok() else {
            return invalid;
        };
        let Some(ticket) = self.tickets.iter_mut().find(|t| t.id == id) else {
            return invalid;
        };
        if ticket.status != TicketStatus::Active {
            return invalid;
        }

        let now = Utc::now();
        ticket.status = TicketStatus::Claimed;
        let player = ticket.player_name.clone().unwrap_or_default();

        self.claims.push(ClaimRecord {
            id: self.next_claim_id,
            ticket_id: id,
            claimed_at: now,
            state: ClaimState::Pending,
        });
        self.next_claim_id += 1;
        self.claim_lock = true;

        let position = self.pending_count();
        info!("[CLAIM] {} claimed ticket {} (queue position {})", player, id, position);

        ClaimResponse {
            success: true,
            message: None,
            queue_position: Some(position),
        }
    }

    fn pending_count(&self) -> usize {
        self.claims.iter().filter(|c| c.state == ClaimState::Pending).count()
    }

    pub fn pick_name<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<PickNameResponse, AppError> {
        let max_order = self.names.iter().filter_map(|n| n.pick_order).max().unwrap_or(0);

        let selected = self
            .names
            .iter_mut()
            .filter(|n| n.pick_order.is_none())
            .choose(rng)
            .ok_or_else(|| AppError::BadRequest("No names left".into()))?;

        selected.pick_order = Some(max_order + 1);
        selected.picked_at = Some(Utc::now());
        let picked_name = selected.name.clone();

        let remaining = self.names.iter().filter(|n| n.pick_order.is_none()).count();
        info!("[PICK] #{} {} ({} remaining)", max_order + 1, picked_name, remaining);

        Ok(PickNameResponse {
            picked_name,
            order: Some(max_order + 1),
            remaining: Some(remaining),
        })
    }

    pub fn pending_claims(&self) -> Vec<PendingClaim> {
        let picked = self.picked_names();
        let mut pending: Vec<&ClaimRecord> = self.claims.iter().filter(|c| c.state == ClaimState::Pending).collect();
        pending.sort_by_key(|c| c.claimed_at);

        pending
            .into_iter()
            .filter_map(|claim| {
                let ticket = self.tickets.iter().find(|t| t.id == claim.ticket_id)?;
                Some(PendingClaim {
                    claim_id: claim.id,
                    ticket_id: Some(ticket.id.to_string()),
                    player_name: ticket.player_name.clone(),
                    grid: ticket.grid.clone(),
                    picked_names: picked.clone(),
                    claimed_at: Some(claim.claimed_at.to_rfc3339()),
                })
            })
            .collect()
    }

    pub fn verify_claim(&mut self, claim_id: u64, is_valid: bool) -> Result<VerifyClaimResponse, AppError> {
        let claim = self
            .claims
            .iter_mut()
            .find(|c| c.id == claim_id)
            .ok_or_else(|| AppError::NotFound("Claim not found".into()))?;
        if claim.state != ClaimState::Pending {
            return Err(AppError::BadRequest("Claim already resolved".into()));
        }

        claim.state = if is_valid { ClaimState::Verified } else { ClaimState::Rejected };
        let ticket_id = claim.ticket_id;

        if let Some(ticket) = self.tickets.iter_mut().find(|t| t.id == ticket_id) {
            ticket.status = if is_valid { TicketStatus::Winner } else { TicketStatus::Active };
            info!(
                "[VERIFY] claim {} for {} → {}",
                claim_id,
                ticket.player_name.as_deref().unwrap_or("?"),
                ticket.status
            );
        }

        if self.pending_count() == 0 {
            self.claim_lock = false;
        }

        Ok(VerifyClaimResponse { success: true, winner: is_valid })
    }

    pub fn reset(&mut self) {
        self.claims.clear();
        for name in &mut self.names {
            name.picked_at = None;
            name.pick_order = None;
        }
        for ticket in &mut self.tickets {
            ticket.assigned = false;
            ticket.status = TicketStatus::Active;
            ticket.player_name = None;
        }
        self.claim_lock = false;
        info!("[RESET] game state wiped");
    }
}
