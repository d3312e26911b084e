//! Terminal client for Nambola, a name-bingo game.
//!
//! Screens are plain reducers ([`states`]) that turn messages into
//! [`messages::Effect`]s. [`app::App`] owns the mounted screen, performs the
//! effects against the HTTP backend ([`api`]) and local storage
//! ([`storage`]), and feeds results back in.

pub mod api;
pub mod app;
pub mod config;
pub mod marks;
pub mod messages;
pub mod poller;
pub mod router;
pub mod states;
pub mod storage;
pub mod ui;

pub use app::App;
