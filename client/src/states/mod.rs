pub mod admin;
pub mod play;
pub mod register;

pub use admin::{AdminModel, NameReveal};
pub use play::PlayModel;
pub use register::RegisterModel;

/// The mounted screen and its view model.
#[derive(Debug, Clone)]
pub enum Screen {
    Register(RegisterModel),
    Play(PlayModel),
    Admin(AdminModel),
}

impl Screen {
    pub fn title(&self) -> &'static str {
        match self {
            Screen::Register(_) => "register",
            Screen::Play(_) => "play",
            Screen::Admin(_) => "admin",
        }
    }
}
