use nambola_protocol::{cell_at, filled_cells, GameStatus, Ticket, TicketStatus};

use crate::marks::MarkSet;
use crate::messages::{Effect, PlayMsg, PollPlan};
use crate::poller::Freshness;

pub const CLAIM_SUBMITTED: &str = "Claim submitted! Waiting for verification...";
pub const CLAIM_FAILED: &str = "Claim failed";

#[derive(Debug, Clone, PartialEq)]
pub struct PlayModel {
    pub ticket_id: String,
    pub ticket: Option<Ticket>,
    pub status: Option<GameStatus>,
    pub marks: MarkSet,
    pub claiming: bool,
    pub load_error: Option<String>,
    ticket_seq: Freshness,
    status_seq: Freshness,
}

impl PlayModel {
    pub fn new(ticket_id: impl Into<String>, marks: MarkSet) -> Self {
        Self {
            ticket_id: ticket_id.into(),
            ticket: None,
            status: None,
            marks,
            claiming: false,
            load_error: None,
            ticket_seq: Freshness::default(),
            status_seq: Freshness::default(),
        }
    }

    /// Model with restored marks, plus the ticket fetch and status polling.
    pub fn init(ticket_id: impl Into<String>, marks: MarkSet) -> (Self, Vec<Effect>) {
        let model = Self::new(ticket_id, marks);
        let effects = vec![
            Effect::LoadTicket(model.ticket_id.clone()),
            Effect::StartPolling(PollPlan::Play),
        ];
        (model, effects)
    }

    pub fn ticket_status(&self) -> Option<TicketStatus> {
        self.ticket.as_ref().map(|t| t.status)
    }

    pub fn is_claimed(&self) -> bool {
        self.ticket_status() == Some(TicketStatus::Claimed)
    }

    pub fn is_winner(&self) -> bool {
        self.ticket_status() == Some(TicketStatus::Winner)
    }

    pub fn is_locked(&self) -> bool {
        self.status.as_ref().map(|s| s.is_locked).unwrap_or(false)
    }

    pub fn called_count(&self) -> usize {
        self.status.as_ref().map(|s| s.picked_names.len()).unwrap_or(0)
    }

    /// Marks are frozen while the ticket is under review or the game is locked.
    pub fn marking_frozen(&self) -> bool {
        self.is_claimed() || self.is_locked()
    }

    pub fn total_cells(&self) -> usize {
        self.ticket.as_ref().map(|t| filled_cells(&t.grid)).unwrap_or(0)
    }

    pub fn marked_cells(&self) -> usize {
        self.ticket.as_ref().map(|t| self.marks.count_on(&t.grid)).unwrap_or(0)
    }

    pub fn all_marked(&self) -> bool {
        let total = self.total_cells();
        total > 0 && self.marked_cells() == total
    }

    pub fn claim_enabled(&self) -> bool {
        self.all_marked() && !self.claiming && !self.is_claimed() && !self.is_locked()
    }

    pub fn claim_label(&self) -> String {
        if !self.all_marked() {
            format!("Mark All Cells ({}/{})", self.marked_cells(), self.total_cells())
        } else if self.is_claimed() {
            "Waiting for Verification...".to_string()
        } else if self.is_locked() {
            "Claim in Progress...".to_string()
        } else if self.claiming {
            "Submitting...".to_string()
        } else {
            "CLAIM WIN".to_string()
        }
    }

    pub fn update(&mut self, msg: PlayMsg) -> Vec<Effect> {
        match msg {
            PlayMsg::TicketLoaded { seq, ticket } => {
                if self.ticket_seq.accept(seq) {
                    self.ticket = Some(ticket);
                    self.load_error = None;
                }
                vec![]
            }
            PlayMsg::TicketFailed { seq, error } => {
                if self.ticket_seq.accept(seq) {
                    self.load_error = Some(error);
                }
                vec![]
            }
            PlayMsg::StatusLoaded { seq, status } => {
                if !self.status_seq.accept(seq) {
                    return vec![];
                }
                let was_locked = self.status.as_ref().map(|s| s.is_locked);
                let lock_flipped = was_locked.is_some_and(|l| l != status.is_locked);
                self.status = Some(status);

                // A claim resolution only shows up on the ticket itself.
                if lock_flipped || self.is_claimed() {
                    vec![Effect::LoadTicket(self.ticket_id.clone())]
                } else {
                    vec![]
                }
            }
            PlayMsg::ToggleMark { row, col } => {
                let Some(ticket) = &self.ticket else {
                    return vec![];
                };
                if self.marking_frozen() || cell_at(&ticket.grid, row, col).is_none() {
                    return vec![];
                }
                self.marks.toggle(row, col);
                vec![Effect::SaveMarks {
                    ticket_id: self.ticket_id.clone(),
                    marks: self.marks.clone(),
                }]
            }
            PlayMsg::Claim => {
                if !self.claim_enabled() {
                    return vec![];
                }
                self.claiming = true;
                vec![Effect::SubmitClaim(self.ticket_id.clone())]
            }
            PlayMsg::ClaimFinished(result) => {
                self.claiming = false;
                match result {
                    Ok(resp) if resp.success => vec![
                        Effect::Alert(CLAIM_SUBMITTED.to_string()),
                        Effect::LoadTicket(self.ticket_id.clone()),
                    ],
                    Ok(resp) => vec![Effect::Alert(resp.message.unwrap_or_else(|| CLAIM_FAILED.to_string()))],
                    Err(_) => vec![Effect::Alert(CLAIM_FAILED.to_string())],
                }
            }
        }
    }
}
