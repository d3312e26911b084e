// client/src/ui/views.rs
use std::fmt::Write;

use nambola_protocol::{cell_label, Grid};
use qrcode::render::unicode::Dense1x2;
use qrcode::QrCode;

use crate::api::ApiClient;
use crate::states::admin::RESET_PROMPT;
use crate::states::{AdminModel, NameReveal, PlayModel, RegisterModel, Screen};

const CELL_WIDTH: usize = 10;
const RECENT_NAMES: usize = 5;

/// Text rendering of the mounted screen.
pub fn render(screen: &Screen, api: &ApiClient) -> String {
    match screen {
        Screen::Register(model) => register_view(model),
        Screen::Play(model) => play_view(model),
        Screen::Admin(model) if !model.authenticated => login_view(model),
        Screen::Admin(model) => admin_view(model, api),
    }
}

fn banner(out: &mut String, title: &str) {
    let _ = writeln!(out, "\n🎱 === NAMBOLA {} ===", title);
}

fn truncate(label: &str, width: usize) -> String {
    label.chars().take(width).collect()
}

/// One line per row. `decorate` gets the row, column and cell label and
/// returns the text to show for a filled cell.
fn grid_lines<F>(grid: &Grid, mut decorate: F) -> Vec<String>
where
    F: FnMut(usize, usize, &str) -> String,
{
    grid.iter()
        .enumerate()
        .map(|(r, row)| {
            let cells: Vec<String> = row
                .iter()
                .enumerate()
                .map(|(c, cell)| match cell {
                    Some(token) => format!("{:^w$}", decorate(r, c, cell_label(token)), w = CELL_WIDTH),
                    None => format!("{:^w$}", "·", w = CELL_WIDTH),
                })
                .collect();
            format!("{} |{}|", r + 1, cells.join("|"))
        })
        .collect()
}

fn column_header(cols: usize) -> String {
    let heads: Vec<String> = (1..=cols).map(|c| format!("{:^w$}", c, w = CELL_WIDTH)).collect();
    format!("   {}", heads.join(" "))
}

pub fn register_view(model: &RegisterModel) -> String {
    let mut out = String::new();
    banner(&mut out, "JOIN");
    let _ = writeln!(out, "Your name: {}", model.name);
    if model.show_dropdown {
        for (i, name) in model.suggestions.iter().enumerate() {
            let _ = writeln!(out, "  {}. {}", i + 1, name);
        }
    }
    let _ = writeln!(out, "[ {} ]", model.submit_label());
    if let Some(error) = &model.error {
        let _ = writeln!(out, "❌ {}", error);
    }
    out
}

pub fn play_view(model: &PlayModel) -> String {
    let mut out = String::new();
    let Some(ticket) = &model.ticket else {
        banner(&mut out, "TICKET");
        match &model.load_error {
            Some(error) => {
                let _ = writeln!(out, "❌ Could not load ticket {}: {}", model.ticket_id, error);
            }
            None => {
                let _ = writeln!(out, "Loading ticket {}...", model.ticket_id);
            }
        }
        return out;
    };
    let player = ticket.player_name.as_deref().unwrap_or("Player");

    if model.is_winner() {
        banner(&mut out, "WINNER");
        let _ = writeln!(out, "🏆 BINGO! Congratulations {}, you won!", player);
        return out;
    }

    banner(&mut out, "TICKET");
    let _ = writeln!(out, "👤 {}   🎫 {}   status: {}", player, model.ticket_id, ticket.status);
    let _ = writeln!(out, "📣 Called: {}", model.called_count());
    if let Some(status) = &model.status {
        let mut recent: Vec<_> = status.picked_names.iter().collect();
        recent.sort_by(|a, b| b.order.cmp(&a.order));
        let names: Vec<&str> = recent.iter().take(RECENT_NAMES).map(|p| cell_label(&p.name)).collect();
        if !names.is_empty() {
            let _ = writeln!(out, "   latest: {}", names.join(", "));
        }
    }
    if model.is_locked() {
        let _ = writeln!(out, "🔒 A claim is being verified, marking is paused");
    }

    let cols = ticket.grid.first().map(|r| r.len()).unwrap_or(0);
    let _ = writeln!(out, "{}", column_header(cols));
    for line in grid_lines(&ticket.grid, |r, c, label| {
        let mark = if model.marks.is_marked(r, c) { "✔" } else { " " };
        format!("{}{}", mark, truncate(label, CELL_WIDTH - 2))
    }) {
        let _ = writeln!(out, "{}", line);
    }

    let button = model.claim_label();
    if model.claim_enabled() {
        let _ = writeln!(out, "[ {} ]  (type: claim)", button);
    } else {
        let _ = writeln!(out, "( {} )", button);
    }
    out
}

pub fn login_view(model: &AdminModel) -> String {
    let mut out = String::new();
    banner(&mut out, "ADMIN");
    if model.logging_in {
        let _ = writeln!(out, "🔐 Logging in...");
    } else {
        let _ = writeln!(out, "🔐 login <password>");
    }
    out
}

fn reveal_view(out: &mut String, reveal: &NameReveal, api: &ApiClient) {
    let _ = writeln!(out, "\n🎉 Picked: {}", reveal.pick.picked_name);
    if let Some(order) = reveal.pick.order {
        let _ = write!(out, "   #{}", order);
    }
    if let Some(remaining) = reveal.pick.remaining {
        let _ = write!(out, "   {} left", remaining);
    }
    let _ = writeln!(out);
    match &reveal.profile.photo {
        Some(_) if reveal.photo_blurred() => {
            let _ = writeln!(out, "   📷 [photo hidden] (type: reveal)");
        }
        Some(photo) => {
            let _ = writeln!(out, "   📷 {}", api.asset_url(photo));
        }
        None => {}
    }
    if let Some(bio) = &reveal.profile.bio {
        let _ = writeln!(out, "   {}", bio);
    }
    let _ = writeln!(out, "   (type: close)");
}

pub fn admin_view(model: &AdminModel, api: &ApiClient) -> String {
    let mut out = String::new();
    banner(&mut out, "ADMIN");

    match &model.status {
        Some(status) => {
            let _ = writeln!(
                out,
                "📣 Called: {}   {}",
                status.picked_names.len(),
                if status.is_locked { "🔒 claims locked" } else { "🔓 open" }
            );
            if let Some(last) = status.picked_names.iter().max_by_key(|p| p.order) {
                let _ = writeln!(out, "   last: {} (#{})", last.name, last.order);
            }
            for winner in &status.winners {
                let _ = writeln!(
                    out,
                    "🏆 {} ({})",
                    winner.name.as_deref().unwrap_or("unknown"),
                    winner.ticket_id
                );
            }
        }
        None => {
            let _ = writeln!(out, "Loading game status...");
        }
    }

    if model.show_qr {
        match &model.qr {
            Some(qr) => {
                let _ = writeln!(out, "\n📱 Join at {}", qr.url);
                match terminal_qr(&qr.url) {
                    Some(block) => {
                        let _ = writeln!(out, "{}", block);
                    }
                    None => {
                        let _ = writeln!(out, "   (no QR image)");
                    }
                }
            }
            None => {
                let _ = writeln!(out, "\n📱 Loading join link...");
            }
        }
    }

    let _ = writeln!(out, "\n📋 Pending claims: {}", model.claims.len());
    for claim in &model.claims {
        let _ = writeln!(
            out,
            "  #{} {} {}",
            claim.claim_id,
            claim.player_name.as_deref().unwrap_or("unknown"),
            claim.claimed_at.as_deref().unwrap_or("")
        );
    }

    if let Some(claim) = &model.selected_claim {
        let _ = writeln!(
            out,
            "\n🔎 Reviewing claim #{} by {}",
            claim.claim_id,
            claim.player_name.as_deref().unwrap_or("unknown")
        );
        let cols = claim.grid.first().map(|r| r.len()).unwrap_or(0);
        let _ = writeln!(out, "{}", column_header(cols));
        for line in grid_lines(&claim.grid, |r, c, label| {
            let hit = if claim.is_called(r, c) { "*" } else { " " };
            format!("{}{}", hit, truncate(label, CELL_WIDTH - 2))
        }) {
            let _ = writeln!(out, "{}", line);
        }
        let _ = writeln!(out, "   * = called    (approve / reject / cancel)");
    }

    if let Some(reveal) = &model.reveal {
        reveal_view(&mut out, reveal, api);
    }

    if model.confirming_reset {
        let _ = writeln!(out, "\n⚠️  {} (yes/no)", RESET_PROMPT);
    }
    out
}

/// Half-block QR code, drawn light-on-dark so it scans off a dark terminal.
fn terminal_qr(url: &str) -> Option<String> {
    let code = QrCode::new(url.as_bytes()).ok()?;
    Some(
        code.render::<Dense1x2>()
            .dark_color(Dense1x2::Light)
            .light_color(Dense1x2::Dark)
            .build(),
    )
}
