// client/src/main.rs
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use nambola::api::ApiClient;
use nambola::config::ClientConfig;
use nambola::storage::{FileStore, KeyValueStore, MemoryStore};
use nambola::ui::{self, Command};
use nambola::App;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout belongs to the text UI
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let config = ClientConfig::parse();
    let api = ApiClient::new(&config.api_url)?;
    let store: Arc<dyn KeyValueStore> = match FileStore::open(&config.store) {
        Ok(store) => {
            info!("using {} with store {}", api.base_url(), store.path().display());
            Arc::new(store)
        }
        Err(e) => {
            warn!("store {} unavailable ({}), nothing will be saved", config.store.display(), e);
            Arc::new(MemoryStore::new())
        }
    };

    println!("🎱 Nambola");
    println!("==========");

    let mut app = App::start(api, store, config.location);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut location = String::new();
    let mut last_frame = String::new();

    loop {
        for alert in app.take_alerts() {
            println!("🔔 {}", alert);
        }
        if app.location() != location {
            location = app.location().to_string();
            println!("📍 {}", location);
        }
        let frame = ui::render(app.screen(), app.api());
        if frame != last_frame {
            print!("{}", frame);
            last_frame = frame;
        }

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match ui::parse_command(app.screen(), &line) {
                    Command::Send(msgs) => {
                        for msg in msgs {
                            app.dispatch(msg);
                        }
                    }
                    Command::Help => println!("{}", ui::help(app.screen())),
                    Command::Quit => break,
                    Command::Unknown(input) => {
                        println!("❓ Unknown command: {} (type help)", input);
                        // show the screen again after the complaint
                        last_frame.clear();
                    }
                }
            }
            alive = app.next_event() => {
                if !alive {
                    break;
                }
            }
        }
    }

    println!("👋 Goodbye!");
    Ok(())
}
