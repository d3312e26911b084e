use url::Url;

/// Which screen to mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Register,
    Play(String),
    Admin,
}

/// Picks the initial screen from a location (`/path?query`) and the ticket id
/// held in storage. Evaluated once at startup.
pub fn resolve(location: &str, stored_ticket: Option<&str>) -> Route {
    let Some(url) = parse_location(location) else {
        return fallback(stored_ticket);
    };

    match url.path() {
        "/admin" => Route::Admin,
        "/play" => {
            let from_query = url
                .query_pairs()
                .find(|(k, _)| k == "ticketId")
                .map(|(_, v)| v.into_owned())
                .filter(|v| !v.is_empty());
            match from_query.or_else(|| stored_ticket.filter(|t| !t.is_empty()).map(str::to_string)) {
                Some(ticket_id) => Route::Play(ticket_id),
                None => Route::Register,
            }
        }
        _ => fallback(stored_ticket),
    }
}

fn fallback(stored_ticket: Option<&str>) -> Route {
    match stored_ticket.filter(|t| !t.is_empty()) {
        Some(ticket_id) => Route::Play(ticket_id.to_string()),
        None => Route::Register,
    }
}

fn parse_location(location: &str) -> Option<Url> {
    let base = Url::parse("http://nambola.local/").ok()?;
    base.join(location).ok()
}

/// Location shown once a player has a ticket.
pub fn play_location(ticket_id: &str) -> String {
    let mut url = match parse_location("/play") {
        Some(url) => url,
        None => return format!("/play?ticketId={}", ticket_id),
    };
    url.query_pairs_mut().append_pair("ticketId", ticket_id);
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}
