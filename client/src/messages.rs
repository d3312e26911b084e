use nambola_protocol::{ClaimResponse, GameStatus, PendingClaim, PickNameResponse, Profile, QrCode, Ticket};

use crate::marks::MarkSet;
use crate::router::Route;

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    Register(RegisterMsg),
    Play(PlayMsg),
    Admin(AdminMsg),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RegisterMsg {
    NamesLoaded(Vec<String>),
    NameChanged(String),
    // index into the visible suggestions
    SuggestionChosen(usize),
    Submit,
    Registered(String),
    RegisterFailed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlayMsg {
    TicketLoaded { seq: u64, ticket: Ticket },
    TicketFailed { seq: u64, error: String },
    StatusLoaded { seq: u64, status: GameStatus },
    ToggleMark { row: usize, col: usize },
    Claim,
    ClaimFinished(Result<ClaimResponse, String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    Accepted,
    Rejected,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AdminMsg {
    PasswordChanged(String),
    Login,
    LoginFinished(LoginOutcome),

    QrLoaded(QrCode),
    ToggleQr,
    StatusLoaded { seq: u64, status: GameStatus },
    ClaimsLoaded { seq: u64, claims: Vec<PendingClaim> },

    // Name draw
    PickName,
    Picked { pick: PickNameResponse, profile: Profile },
    PickFailed(String),
    RevealPhoto,
    CloseReveal,

    // Claim review
    Review(u64),
    CancelReview,
    Verify { is_valid: bool },
    Verified,
    VerifyFailed(String),

    // Reset
    ResetRequested,
    ResetConfirmed,
    ResetCancelled,
    ResetFinished(Result<(), String>),
}

/// Which polling schedule a screen wants running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPlan {
    /// Game status on the jittered player cadence.
    Play,
    /// Game status and the claim queue every second.
    Admin,
}

/// Side effects requested by a reducer. The runtime executes them; reducers
/// never touch the network or storage themselves.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    LoadNames,
    Register(String),
    PersistTicket(String),
    Navigate(Route),

    LoadTicket(String),
    SaveMarks { ticket_id: String, marks: MarkSet },
    SubmitClaim(String),

    Login(String),
    LoadQr,
    LoadStatus,
    LoadClaims,
    PickName,
    VerifyClaim { claim_id: u64, is_valid: bool },
    ResetGame,

    StartPolling(PollPlan),
    Alert(String),
}
