// client/src/ui/input.rs
use crate::messages::{AdminMsg, Msg, PlayMsg, RegisterMsg};
use crate::states::Screen;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Send(Vec<Msg>),
    Help,
    Quit,
    Unknown(String),
}

/// Turns one input line into messages for the mounted screen.
pub fn parse_command(screen: &Screen, input: &str) -> Command {
    let line = input.trim();
    let parts: Vec<&str> = line.split_whitespace().collect();
    let Some(first) = parts.first() else {
        return Command::Send(vec![]);
    };

    match first.to_lowercase().as_str() {
        "quit" | "exit" => return Command::Quit,
        "help" | "?" => return Command::Help,
        _ => {}
    }

    let parsed = match screen {
        Screen::Register(_) => parse_register(line, &parts),
        Screen::Play(_) => parse_play(&parts),
        Screen::Admin(model) if !model.authenticated => parse_login(line, &parts),
        Screen::Admin(_) => parse_admin(&parts),
    };
    match parsed {
        Some(msgs) => Command::Send(msgs),
        None => Command::Unknown(line.to_string()),
    }
}

/// 1-based number from the user to a 0-based index.
fn index_arg(parts: &[&str], at: usize) -> Option<usize> {
    parts.get(at)?.parse::<usize>().ok()?.checked_sub(1)
}

fn parse_register(line: &str, parts: &[&str]) -> Option<Vec<Msg>> {
    let msg = match (parts[0].to_lowercase().as_str(), parts.len()) {
        ("join", 1) => RegisterMsg::Submit,
        // `name <text>` takes the rest verbatim, even `join` or `quit`
        ("name", _) => RegisterMsg::NameChanged(line[parts[0].len()..].trim().to_string()),
        ("pick", 2) => match index_arg(parts, 1) {
            Some(idx) => RegisterMsg::SuggestionChosen(idx),
            None => RegisterMsg::NameChanged(line.to_string()),
        },
        // anything else is what the player is typing
        _ => RegisterMsg::NameChanged(line.to_string()),
    };
    Some(vec![Msg::Register(msg)])
}

fn parse_play(parts: &[&str]) -> Option<Vec<Msg>> {
    let msg = match parts[0].to_lowercase().as_str() {
        "mark" if parts.len() == 3 => PlayMsg::ToggleMark {
            row: index_arg(parts, 1)?,
            col: index_arg(parts, 2)?,
        },
        "claim" => PlayMsg::Claim,
        _ => return None,
    };
    Some(vec![Msg::Play(msg)])
}

fn parse_login(line: &str, parts: &[&str]) -> Option<Vec<Msg>> {
    if !parts[0].eq_ignore_ascii_case("login") {
        return None;
    }
    let password = line[parts[0].len()..].trim().to_string();
    Some(vec![
        Msg::Admin(AdminMsg::PasswordChanged(password)),
        Msg::Admin(AdminMsg::Login),
    ])
}

fn parse_admin(parts: &[&str]) -> Option<Vec<Msg>> {
    let msg = match parts[0].to_lowercase().as_str() {
        "pick" => AdminMsg::PickName,
        "reveal" => AdminMsg::RevealPhoto,
        "close" => AdminMsg::CloseReveal,
        "review" => AdminMsg::Review(parts.get(1)?.parse().ok()?),
        "approve" => AdminMsg::Verify { is_valid: true },
        "reject" => AdminMsg::Verify { is_valid: false },
        "cancel" => AdminMsg::CancelReview,
        "qr" => AdminMsg::ToggleQr,
        "reset" => AdminMsg::ResetRequested,
        "yes" | "y" => AdminMsg::ResetConfirmed,
        "no" | "n" => AdminMsg::ResetCancelled,
        _ => return None,
    };
    Some(vec![Msg::Admin(msg)])
}

pub fn help(screen: &Screen) -> &'static str {
    match screen {
        Screen::Register(_) => {
            "  <name>     - type your name\n  name <txt> - type a name that looks like a command\n  pick <n>   - use suggestion n\n  join       - join the game\n  quit       - exit"
        }
        Screen::Play(_) => "  mark <row> <col> - toggle a cell (1-based)\n  claim            - claim the win\n  quit             - exit",
        Screen::Admin(model) if !model.authenticated => "  login <password> - sign in\n  quit             - exit",
        Screen::Admin(_) => {
            "  pick         - draw the next name\n  reveal       - unblur the photo\n  close        - close the draw\n  review <id>  - open a claim\n  approve      - accept the open claim\n  reject       - refuse the open claim\n  cancel       - close the claim\n  qr           - show/hide the join QR\n  reset        - reset the game (then yes/no)\n  quit         - exit"
        }
    }
}
