use clap::{Parser, Subcommand};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "nambola-combined")]
#[command(about = "Nambola - combined server, client and bot launcher")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the server plus a crowd of bot players
    Both {
        /// Number of bot players
        #[arg(short, long, default_value = "10")]
        bots: u32,
        /// Port for the server
        #[arg(short, long, default_value = "8000")]
        port: u16,
    },
    /// Run only the server
    Server {
        /// Port for the server
        #[arg(short, long, default_value = "8000")]
        port: u16,
    },
    /// Run the terminal client as a player
    Player {
        #[arg(long, default_value = "http://127.0.0.1:8000")]
        api_url: String,
    },
    /// Run the terminal client on the admin console
    Admin {
        #[arg(long, default_value = "http://127.0.0.1:8000")]
        api_url: String,
    },
    /// Run bot players against a running server
    Bots {
        /// Number of bot players
        #[arg(short, long, default_value = "10")]
        players: u32,
        #[arg(long, default_value = "http://127.0.0.1:8000")]
        api_url: String,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Both { bots, port } => {
            run_both(bots, port);
        }
        Commands::Server { port } => {
            run_server(port);
        }
        Commands::Player { api_url } => {
            run_client(&api_url, "/");
        }
        Commands::Admin { api_url } => {
            run_client(&api_url, "/admin");
        }
        Commands::Bots { players, api_url } => {
            run_bots(players, &api_url);
        }
    }
}

fn run_both(bots: u32, port: u16) {
    println!("🚀 Starting Nambola - server on port {} + {} bots", port, bots);

    println!("📡 Starting server...");
    let server_handle = thread::spawn(move || {
        run_server(port);
    });

    // Wait a moment for server to start
    thread::sleep(Duration::from_millis(1500));

    let api_url = format!("http://127.0.0.1:{}", port);
    println!("🤖 Starting {} bots against {}...", bots, api_url);
    let bots_handle = thread::spawn(move || {
        run_bots(bots, &api_url);
    });

    println!("✅ All processes started.");
    println!("💡 Open the admin console with: nambola-combined admin --api-url http://127.0.0.1:{}", port);
    println!("Press Ctrl+C to stop.");

    let _ = bots_handle.join();
    let _ = server_handle.join();
}

fn run_server(port: u16) {
    run_cargo("Server", &["run", "-p", "nambola-server"], &[("PORT", port.to_string())]);
}

fn run_client(api_url: &str, location: &str) {
    run_cargo(
        "Client",
        &["run", "-p", "nambola", "--", "--location", location],
        &[("NAMBOLA_API_URL", api_url.to_string())],
    );
}

fn run_bots(players: u32, api_url: &str) {
    let players = players.to_string();
    run_cargo(
        "Bots",
        &["run", "--bin", "demo_cli", "--", "--players", &players, "--api-url", api_url],
        &[],
    );
}

fn run_cargo(label: &str, args: &[&str], envs: &[(&str, String)]) {
    let status = Command::new("cargo")
        .args(args)
        .envs(envs.iter().map(|(k, v)| (*k, v.as_str())))
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status();

    match status {
        Ok(exit_status) => {
            if !exit_status.success() {
                eprintln!("❌ {} exited with error: {}", label, exit_status);
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("❌ Failed to start {}: {}", label.to_lowercase(), e);
            std::process::exit(1);
        }
    }
}
