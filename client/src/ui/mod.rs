// client/src/ui/mod.rs
pub mod input;
pub mod views;

pub use input::{help, parse_command, Command};
pub use views::render;
