//! Bot players for load-testing a Nambola server.
//!
//! Each bot registers, then every 2-4 seconds either polls game status,
//! refreshes its ticket or checks whether it can claim. Bots mark called
//! names on their own ticket and claim once every cell is marked. A summary
//! of request counts and latencies per endpoint is printed at the end.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use futures_util::future::join_all;
use parking_lot::Mutex;
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use nambola::api::ApiClient;
use nambola::marks::MarkSet;
use nambola::messages::{Effect, PlayMsg};
use nambola::poller::Cadence;
use nambola::states::PlayModel;

#[derive(Parser, Debug)]
#[command(name = "demo_cli")]
#[command(about = "Simulated Nambola players")]
struct Args {
    #[arg(long, env = "NAMBOLA_API_URL", default_value = "http://127.0.0.1:8000")]
    api_url: String,

    /// Number of simulated players
    #[arg(long, default_value = "10")]
    players: usize,

    /// How long to keep playing once everyone has joined
    #[arg(long, default_value = "60")]
    duration_secs: u64,

    /// Window over which players join
    #[arg(long, default_value = "10")]
    ramp_secs: u64,
}

const REGISTRATION: &str = "1. Registration";
const POLL_STATUS: &str = "2. Poll Game Status";
const GET_TICKET: &str = "3. Get Ticket";
const CLAIM: &str = "4. Claim Win";

#[derive(Debug, Default)]
struct EndpointStats {
    failures: usize,
    latencies: Vec<Duration>,
}

impl EndpointStats {
    fn count(&self) -> usize {
        self.latencies.len()
    }

    fn average(&self) -> Duration {
        if self.latencies.is_empty() {
            return Duration::ZERO;
        }
        self.latencies.iter().sum::<Duration>() / self.latencies.len() as u32
    }

    fn percentile(&self, pct: usize) -> Duration {
        let mut sorted = self.latencies.clone();
        sorted.sort();
        match sorted.len() {
            0 => Duration::ZERO,
            n => sorted[((n * pct).div_ceil(100)).clamp(1, n) - 1],
        }
    }
}

#[derive(Debug, Default, Clone)]
struct Stats {
    inner: Arc<Mutex<BTreeMap<&'static str, EndpointStats>>>,
}

impl Stats {
    /// Times `request` and books it under `endpoint`.
    async fn track<T, E, F>(&self, endpoint: &'static str, request: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
    {
        let started = Instant::now();
        let result = request.await;
        let elapsed = started.elapsed();

        let mut all = self.inner.lock();
        let entry = all.entry(endpoint).or_default();
        entry.latencies.push(elapsed);
        if result.is_err() {
            entry.failures += 1;
        }
        result
    }

    fn report(&self) {
        let all = self.inner.lock();
        let total: usize = all.values().map(|s| s.count()).sum();
        let failures: usize = all.values().map(|s| s.failures).sum();
        let rate = if total > 0 { failures as f64 * 100.0 / total as f64 } else { 0.0 };

        println!("\n{}", "=".repeat(72));
        println!("🏁 RESULTS");
        println!("{}", "=".repeat(72));
        println!("📊 Total requests: {}   failures: {} ({:.2}%)", total, failures, rate);
        println!("\n{:<24} {:>8} {:>8} {:>10} {:>10}", "endpoint", "count", "fails", "avg ms", "p95 ms");
        for (name, s) in all.iter() {
            println!(
                "{:<24} {:>8} {:>8} {:>10} {:>10}",
                name,
                s.count(),
                s.failures,
                s.average().as_millis(),
                s.percentile(95).as_millis()
            );
        }
        println!("{}", "=".repeat(72));
    }
}

struct Bot {
    name: String,
    api: ApiClient,
    stats: Stats,
    play: PlayModel,
    seq: u64,
}

impl Bot {
    async fn join(name: String, api: ApiClient, stats: Stats) -> Option<Self> {
        match stats.track(REGISTRATION, api.register(&name)).await {
            Ok(resp) => {
                info!("✅ {} joined the game", name);
                let play = PlayModel::new(resp.ticket_id, MarkSet::new());
                Some(Self { name, api, stats, play, seq: 0 })
            }
            Err(e) => {
                warn!("❌ {} could not register: {}", name, e);
                None
            }
        }
    }

    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    async fn poll_status(&mut self) {
        if let Ok(status) = self.stats.track(POLL_STATUS, self.api.game_status()).await {
            let seq = self.next_seq();
            let effects = self.play.update(PlayMsg::StatusLoaded { seq, status });
            if effects.iter().any(|e| matches!(e, Effect::LoadTicket(_))) {
                self.refresh_ticket().await;
            }
            self.mark_called();
        }
    }

    async fn refresh_ticket(&mut self) {
        let ticket_id = self.play.ticket_id.clone();
        if let Ok(ticket) = self.stats.track(GET_TICKET, self.api.ticket(&ticket_id)).await {
            let seq = self.next_seq();
            self.play.update(PlayMsg::TicketLoaded { seq, ticket });
            self.mark_called();
        }
    }

    /// Marks every cell whose name has been called.
    fn mark_called(&mut self) {
        let (Some(ticket), Some(status)) = (&self.play.ticket, &self.play.status) else {
            return;
        };
        let mut to_mark = Vec::new();
        for (r, row) in ticket.grid.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                if let Some(token) = cell {
                    if status.is_called(token) && !self.play.marks.is_marked(r, c) {
                        to_mark.push((r, c));
                    }
                }
            }
        }
        for (row, col) in to_mark {
            self.play.update(PlayMsg::ToggleMark { row, col });
        }
    }

    async fn try_claim(&mut self) {
        let effects = self.play.update(PlayMsg::Claim);
        let Some(Effect::SubmitClaim(ticket_id)) = effects.into_iter().next() else {
            return;
        };
        let result = self.stats.track(CLAIM, self.api.claim(&ticket_id)).await;
        if matches!(&result, Ok(resp) if resp.success) {
            info!("🎉 {} submitted a claim!", self.name);
        }
        let effects = self.play.update(PlayMsg::ClaimFinished(result.map_err(|e| e.to_string())));
        for effect in effects {
            match effect {
                Effect::Alert(text) => debug!("[{}] {}", self.name, text),
                Effect::LoadTicket(_) => self.refresh_ticket().await,
                _ => {}
            }
        }
    }

    async fn run(mut self, deadline: Instant) {
        let mut rng = StdRng::from_entropy();
        self.refresh_ticket().await;
        while Instant::now() < deadline {
            tokio::time::sleep(Cadence::PLAY.next_delay(&mut rng)).await;
            if self.play.is_winner() {
                info!("🏆 {} won!", self.name);
                return;
            }
            // weights 10:3:1 like a real player's traffic
            match rng.gen_range(0..14) {
                0..=9 => self.poll_status().await,
                10..=12 => self.refresh_ticket().await,
                _ => self.try_claim().await,
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let api = ApiClient::new(&args.api_url).context("bad --api-url")?;
    let stats = Stats::default();

    println!("{}", "=".repeat(72));
    println!("🎮 NAMBOLA LOAD TEST - {} PLAYERS", args.players);
    println!("{}", "=".repeat(72));
    println!("Backend: {}", api.base_url());
    println!("  - players join over {} seconds", args.ramp_secs);
    println!("  - each player acts every 2-4 seconds for {} seconds", args.duration_secs);
    println!("{}\n", "=".repeat(72));

    let deadline = Instant::now() + Duration::from_secs(args.ramp_secs + args.duration_secs);
    let stagger = Duration::from_secs(args.ramp_secs) / args.players.max(1) as u32;

    let bots = (0..args.players).map(|i| {
        let api = api.clone();
        let stats = stats.clone();
        async move {
            tokio::time::sleep(stagger * i as u32).await;
            let name = format!("TestPlayer_{}", &Uuid::new_v4().simple().to_string()[..8]);
            if let Some(bot) = Bot::join(name, api, stats).await {
                bot.run(deadline).await;
            }
        }
    });

    tokio::select! {
        _ = join_all(bots) => {}
        _ = tokio::signal::ctrl_c() => println!("\n⏹️  Interrupted"),
    }

    stats.report();
    Ok(())
}
