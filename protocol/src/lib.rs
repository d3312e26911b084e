use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A grid cell: `None` is a blocked square, `Some(token)` carries a name token.
pub type Cell = Option<String>;
pub type Grid = Vec<Vec<Cell>>;

/// ---- Ticket layout ----
pub const TICKET_ROWS: usize = 3;
pub const TICKET_COLS: usize = 9;
pub const NAMES_PER_TICKET: usize = 15;
pub const MAX_PER_COLUMN: usize = 2;
pub const MAX_PER_ROW: usize = 5;

/// ---- Ticket status ----
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Active,
    Claimed,
    Winner,
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TicketStatus::Active => write!(f, "active"),
            TicketStatus::Claimed => write!(f, "claimed"),
            TicketStatus::Winner => write!(f, "winner"),
        }
    }
}

impl Default for TicketStatus {
    fn default() -> Self {
        TicketStatus::Active
    }
}

/// Display label of a cell token: the part after the first `_` if there is one,
/// otherwise the whole token.
pub fn cell_label(token: &str) -> &str {
    match token.split('_').nth(1) {
        Some(rest) if !rest.is_empty() => rest,
        _ => token,
    }
}

/// Key used by the client mark map for a grid position.
pub fn mark_key(row: usize, col: usize) -> String {
    format!("{}-{}", row, col)
}

/// Number of non-blocked cells in a grid.
pub fn filled_cells(grid: &Grid) -> usize {
    grid.iter().flatten().filter(|c| c.is_some()).count()
}

pub fn cell_at(grid: &Grid, row: usize, col: usize) -> Option<&str> {
    grid.get(row)?.get(col)?.as_deref()
}

/// ---- Ticket generation ----
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TicketError {
    #[error("need at least {need} names, have {have}")]
    NotEnoughNames { have: usize, need: usize },
}

/// Builds a 3x9 ticket holding 15 distinct names, at most two per column and
/// five per row. Positions are shuffled and filled greedily; a layout that
/// strands names is thrown away and drawn again.
pub fn generate_ticket<R: Rng + ?Sized>(names: &[String], rng: &mut R) -> Result<Grid, TicketError> {
    if names.len() < NAMES_PER_TICKET {
        return Err(TicketError::NotEnoughNames {
            have: names.len(),
            need: NAMES_PER_TICKET,
        });
    }

    let mut positions: Vec<(usize, usize)> = (0..TICKET_ROWS)
        .flat_map(|r| (0..TICKET_COLS).map(move |c| (r, c)))
        .collect();

    loop {
        let selected: Vec<&String> = names.choose_multiple(rng, NAMES_PER_TICKET).collect();
        let mut grid: Grid = vec![vec![None; TICKET_COLS]; TICKET_ROWS];
        let mut col_counts = [0usize; TICKET_COLS];
        let mut row_counts = [0usize; TICKET_ROWS];
        let mut placed = 0;

        positions.shuffle(rng);
        for &(row, col) in &positions {
            if placed == NAMES_PER_TICKET {
                break;
            }
            if col_counts[col] < MAX_PER_COLUMN && row_counts[row] < MAX_PER_ROW {
                grid[row][col] = Some(selected[placed].clone());
                col_counts[col] += 1;
                row_counts[row] += 1;
                placed += 1;
            }
        }

        if placed == NAMES_PER_TICKET {
            return Ok(grid);
        }
    }
}

pub fn pre_generate_tickets<R: Rng + ?Sized>(
    names: &[String],
    count: usize,
    rng: &mut R,
) -> Result<Vec<Grid>, TicketError> {
    (0..count).map(|_| generate_ticket(names, rng)).collect()
}

/// ---- Player endpoints ----
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub player_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub ticket_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<Grid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NamesResponse {
    #[serde(default)]
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ticket {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<String>,
    #[serde(default)]
    pub player_name: Option<String>,
    pub grid: Grid,
    #[serde(default)]
    pub status: TicketStatus,
    #[serde(default)]
    pub picked_names: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PickedName {
    pub name: String,
    pub order: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picked_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Winner {
    pub name: Option<String>,
    pub ticket_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GameStatus {
    #[serde(default)]
    pub picked_names: Vec<PickedName>,
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default)]
    pub winners: Vec<Winner>,
    #[serde(default)]
    pub last_pick_time: Option<String>,
}

impl GameStatus {
    pub fn is_called(&self, name: &str) -> bool {
        self.picked_names.iter().any(|p| p.name == name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimRequest {
    pub ticket_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClaimResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_position: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub blur: bool,
    #[serde(default)]
    pub bio: Option<String>,
}

/// ---- Admin endpoints ----
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QrCode {
    /// Image data (a data URL) when the backend can render one.
    #[serde(default)]
    pub qr_code: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingClaim {
    pub claim_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<String>,
    #[serde(default)]
    pub player_name: Option<String>,
    pub grid: Grid,
    #[serde(default)]
    pub picked_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimed_at: Option<String>,
}

impl PendingClaim {
    /// Whether the cell at (row, col) holds a name that has been called.
    pub fn is_called(&self, row: usize, col: usize) -> bool {
        cell_at(&self.grid, row, col)
            .map(|token| self.picked_names.iter().any(|p| p == token))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PickNameResponse {
    pub picked_name: String,
    #[serde(default)]
    pub order: Option<u32>,
    #[serde(default)]
    pub remaining: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyClaimRequest {
    pub claim_id: u64,
    pub is_valid: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyClaimResponse {
    pub success: bool,
    #[serde(default)]
    pub winner: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub success: bool,
}

/// Error body returned with any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("n_Name{}", i)).collect()
    }

    #[test]
    fn labels_strip_prefix() {
        assert_eq!(cell_label("12_Alice"), "Alice");
        assert_eq!(cell_label("Bob"), "Bob");
        assert_eq!(cell_label("trailing_"), "trailing_");
    }

    #[test]
    fn generated_tickets_respect_layout() {
        let mut rng = StdRng::seed_from_u64(7);
        let pool = names(40);
        for _ in 0..50 {
            let grid = generate_ticket(&pool, &mut rng).unwrap();
            assert_eq!(grid.len(), TICKET_ROWS);
            assert!(grid.iter().all(|r| r.len() == TICKET_COLS));
            assert_eq!(filled_cells(&grid), NAMES_PER_TICKET);
            for row in &grid {
                assert!(row.iter().filter(|c| c.is_some()).count() <= MAX_PER_ROW);
            }
            for col in 0..TICKET_COLS {
                let n = grid.iter().filter(|r| r[col].is_some()).count();
                assert!(n <= MAX_PER_COLUMN);
            }
            let mut seen: Vec<&String> = grid.iter().flatten().flatten().collect();
            seen.sort();
            seen.dedup();
            assert_eq!(seen.len(), NAMES_PER_TICKET);
        }
    }

    #[test]
    fn too_few_names_is_an_error() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = generate_ticket(&names(10), &mut rng).unwrap_err();
        assert_eq!(err, TicketError::NotEnoughNames { have: 10, need: 15 });
        assert_eq!(err.to_string(), "need at least 15 names, have 10");
    }

    #[test]
    fn ticket_accepts_backend_json() {
        let json = r#"{"ticket_id":"t1","player_name":"Alice","grid":[["a_Ann",null]],"status":"claimed","picked_names":["a_Ann"]}"#;
        let ticket: Ticket = serde_json::from_str(json).unwrap();
        assert_eq!(ticket.status, TicketStatus::Claimed);
        assert_eq!(cell_at(&ticket.grid, 0, 0), Some("a_Ann"));
        assert_eq!(cell_at(&ticket.grid, 0, 1), None);
        assert_eq!(cell_at(&ticket.grid, 5, 5), None);
    }

    #[test]
    fn claim_highlights_called_cells() {
        let claim = PendingClaim {
            claim_id: 1,
            ticket_id: None,
            player_name: Some("Alice".into()),
            grid: vec![vec![Some("Ann".into()), None, Some("Ben".into())]],
            picked_names: vec!["Ben".into()],
            claimed_at: None,
        };
        assert!(!claim.is_called(0, 0));
        assert!(!claim.is_called(0, 1));
        assert!(claim.is_called(0, 2));
    }

    #[test]
    fn game_status_defaults_missing_fields() {
        let status: GameStatus = serde_json::from_str(r#"{"picked_names":[{"name":"Ann","order":1}]}"#).unwrap();
        assert!(!status.is_locked);
        assert!(status.is_called("Ann"));
        assert!(!status.is_called("Ben"));
    }
}
