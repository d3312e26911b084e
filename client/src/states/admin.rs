use nambola_protocol::{GameStatus, PendingClaim, PickNameResponse, Profile, QrCode};

use crate::messages::{AdminMsg, Effect, LoginOutcome, PollPlan};
use crate::poller::Freshness;

pub const INVALID_PASSWORD: &str = "Invalid password";
pub const LOGIN_FAILED: &str = "Login failed";
pub const PICK_FAILED: &str = "Pick failed";
pub const VERIFICATION_FAILED: &str = "Verification failed";
pub const GAME_RESET: &str = "Game reset";
pub const RESET_FAILED: &str = "Reset failed";
pub const RESET_PROMPT: &str = "Reset entire game?";

/// The modal shown after a draw.
#[derive(Debug, Clone, PartialEq)]
pub struct NameReveal {
    pub pick: PickNameResponse,
    pub profile: Profile,
    pub revealed: bool,
}

impl NameReveal {
    pub fn new(pick: PickNameResponse, profile: Profile) -> Self {
        let revealed = !profile.blur;
        Self { pick, profile, revealed }
    }

    pub fn has_photo(&self) -> bool {
        self.profile.photo.is_some()
    }

    pub fn photo_blurred(&self) -> bool {
        self.has_photo() && self.profile.blur && !self.revealed
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdminModel {
    pub authenticated: bool,
    pub password: String,
    pub logging_in: bool,

    pub status: Option<GameStatus>,
    pub claims: Vec<PendingClaim>,
    pub selected_claim: Option<PendingClaim>,
    /// A verdict is in flight; further verdicts wait for its answer.
    pub verifying: bool,

    pub qr: Option<QrCode>,
    pub show_qr: bool,

    pub reveal: Option<NameReveal>,
    pub picking: bool,
    pub confirming_reset: bool,

    status_seq: Freshness,
    claims_seq: Freshness,
}

impl AdminModel {
    pub fn init() -> (Self, Vec<Effect>) {
        (Self::default(), vec![])
    }

    pub fn update(&mut self, msg: AdminMsg) -> Vec<Effect> {
        if !self.authenticated {
            return self.update_login(msg);
        }

        match msg {
            AdminMsg::PasswordChanged(_) | AdminMsg::Login | AdminMsg::LoginFinished(_) => vec![],

            AdminMsg::QrLoaded(qr) => {
                self.qr = Some(qr);
                vec![]
            }
            AdminMsg::ToggleQr => {
                self.show_qr = !self.show_qr;
                vec![]
            }
            AdminMsg::StatusLoaded { seq, status } => {
                if self.status_seq.accept(seq) {
                    self.status = Some(status);
                }
                vec![]
            }
            AdminMsg::ClaimsLoaded { seq, claims } => {
                if self.claims_seq.accept(seq) {
                    self.claims = claims;
                }
                vec![]
            }

            AdminMsg::PickName => {
                if self.picking {
                    return vec![];
                }
                self.picking = true;
                vec![Effect::PickName]
            }
            AdminMsg::Picked { pick, profile } => {
                self.picking = false;
                self.reveal = Some(NameReveal::new(pick, profile));
                vec![]
            }
            AdminMsg::PickFailed(_) => {
                self.picking = false;
                vec![Effect::Alert(PICK_FAILED.to_string())]
            }
            AdminMsg::RevealPhoto => {
                if let Some(reveal) = &mut self.reveal {
                    reveal.revealed = true;
                }
                vec![]
            }
            AdminMsg::CloseReveal => {
                if self.reveal.take().is_some() {
                    vec![Effect::LoadStatus]
                } else {
                    vec![]
                }
            }

            AdminMsg::Review(claim_id) => {
                self.selected_claim = self.claims.iter().find(|c| c.claim_id == claim_id).cloned();
                vec![]
            }
            AdminMsg::CancelReview => {
                self.selected_claim = None;
                vec![]
            }
            AdminMsg::Verify { is_valid } => match &self.selected_claim {
                Some(claim) if !self.verifying => {
                    self.verifying = true;
                    vec![Effect::VerifyClaim { claim_id: claim.claim_id, is_valid }]
                }
                _ => vec![],
            },
            AdminMsg::Verified => {
                self.verifying = false;
                self.selected_claim = None;
                vec![Effect::LoadClaims]
            }
            AdminMsg::VerifyFailed(_) => {
                self.verifying = false;
                vec![Effect::Alert(VERIFICATION_FAILED.to_string())]
            }

            AdminMsg::ResetRequested => {
                self.confirming_reset = true;
                vec![]
            }
            AdminMsg::ResetCancelled => {
                self.confirming_reset = false;
                vec![]
            }
            AdminMsg::ResetConfirmed => {
                if !self.confirming_reset {
                    return vec![];
                }
                self.confirming_reset = false;
                vec![Effect::ResetGame]
            }
            AdminMsg::ResetFinished(Ok(())) => {
                vec![Effect::Alert(GAME_RESET.to_string()), Effect::LoadStatus]
            }
            AdminMsg::ResetFinished(Err(_)) => vec![Effect::Alert(RESET_FAILED.to_string())],
        }
    }

    /// Before authentication only the login form reacts.
    fn update_login(&mut self, msg: AdminMsg) -> Vec<Effect> {
        match msg {
            AdminMsg::PasswordChanged(password) => {
                self.password = password;
                vec![]
            }
            AdminMsg::Login => {
                if self.logging_in {
                    return vec![];
                }
                self.logging_in = true;
                vec![Effect::Login(self.password.clone())]
            }
            AdminMsg::LoginFinished(outcome) => {
                self.logging_in = false;
                match outcome {
                    LoginOutcome::Accepted => {
                        self.authenticated = true;
                        vec![Effect::LoadQr, Effect::StartPolling(PollPlan::Admin)]
                    }
                    LoginOutcome::Rejected => vec![Effect::Alert(INVALID_PASSWORD.to_string())],
                    LoginOutcome::Failed => vec![Effect::Alert(LOGIN_FAILED.to_string())],
                }
            }
            _ => vec![],
        }
    }
}
