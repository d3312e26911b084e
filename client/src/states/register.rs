use crate::messages::{Effect, RegisterMsg};
use crate::router::Route;

pub const REGISTRATION_FAILED: &str = "Registration failed";

/// Names containing `input`, ignoring case. Blank input matches nothing.
pub fn filter_names(all: &[String], input: &str) -> Vec<String> {
    if input.trim().is_empty() {
        return Vec::new();
    }
    let needle = input.to_lowercase();
    all.iter()
        .filter(|n| n.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegisterModel {
    pub name: String,
    pub all_names: Vec<String>,
    pub suggestions: Vec<String>,
    pub show_dropdown: bool,
    pub loading: bool,
    pub error: Option<String>,
}

impl RegisterModel {
    pub fn init() -> (Self, Vec<Effect>) {
        (Self::default(), vec![Effect::LoadNames])
    }

    fn refilter(&mut self) {
        self.suggestions = filter_names(&self.all_names, &self.name);
        self.show_dropdown = !self.suggestions.is_empty();
    }

    pub fn submit_label(&self) -> &'static str {
        if self.loading {
            "Joining..."
        } else {
            "Join Game"
        }
    }

    pub fn update(&mut self, msg: RegisterMsg) -> Vec<Effect> {
        match msg {
            RegisterMsg::NamesLoaded(names) => {
                self.all_names = names;
                self.refilter();
                vec![]
            }
            RegisterMsg::NameChanged(name) => {
                self.name = name;
                self.refilter();
                vec![]
            }
            RegisterMsg::SuggestionChosen(idx) => {
                if let Some(chosen) = self.suggestions.get(idx).cloned() {
                    self.name = chosen;
                    self.suggestions = filter_names(&self.all_names, &self.name);
                    self.show_dropdown = false;
                }
                vec![]
            }
            RegisterMsg::Submit => {
                let trimmed = self.name.trim();
                if trimmed.is_empty() || self.loading {
                    return vec![];
                }
                let name = trimmed.to_string();
                self.loading = true;
                self.error = None;
                self.show_dropdown = false;
                vec![Effect::Register(name)]
            }
            RegisterMsg::Registered(ticket_id) => {
                self.loading = false;
                vec![
                    Effect::PersistTicket(ticket_id.clone()),
                    Effect::Navigate(Route::Play(ticket_id)),
                ]
            }
            RegisterMsg::RegisterFailed(detail) => {
                self.loading = false;
                self.error = Some(if detail.is_empty() { REGISTRATION_FAILED.to_string() } else { detail });
                vec![]
            }
        }
    }
}
