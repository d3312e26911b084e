use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "nambola")]
#[command(about = "Nambola bingo client for the terminal")]
pub struct ClientConfig {
    /// Base URL of the game backend
    #[arg(long, env = "NAMBOLA_API_URL", default_value = "http://127.0.0.1:8000")]
    pub api_url: String,

    /// Starting location, e.g. `/admin` or `/play?ticketId=...`
    #[arg(long, default_value = "/")]
    pub location: String,

    /// JSON file used for the ticket id and saved marks
    #[arg(long, default_value = ".nambola-store.json")]
    pub store: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::parse_from(["nambola"]);
        assert_eq!(config.location, "/");
        assert_eq!(config.store, PathBuf::from(".nambola-store.json"));
    }

    #[test]
    fn flags_override() {
        let config = ClientConfig::parse_from(["nambola", "--api-url", "http://game:9000", "--location", "/admin"]);
        assert_eq!(config.api_url, "http://game:9000");
        assert_eq!(config.location, "/admin");
    }
}
