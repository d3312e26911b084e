use std::{collections::HashMap, fs, path::PathBuf};

use anyhow::Context;
use clap::Parser;
use nambola_protocol::Profile;

const BUNDLED_NAMES: &str = include_str!("../names.json");

/// Server settings. Every flag can also come from the environment.
#[derive(Parser, Debug, Clone)]
#[command(name = "nambola-server")]
#[command(about = "Nambola game backend (in-memory)")]
pub struct ServerConfig {
    #[arg(long, env = "PORT", default_value = "8000")]
    pub port: u16,

    #[arg(long, env = "ADMIN_PASSWORD", default_value = "admin123")]
    pub admin_password: String,

    /// URL players open to join; encoded into the admin QR panel
    #[arg(long, env = "JOIN_URL", default_value = "http://127.0.0.1:5173/")]
    pub join_url: String,

    /// JSON array of names; the bundled list is used when absent
    #[arg(long, env = "NAMES_FILE")]
    pub names_file: Option<PathBuf>,

    /// JSON object mapping a name to `{photo, blur, bio}`
    #[arg(long, env = "PROFILES_FILE")]
    pub profiles_file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            admin_password: "admin123".to_string(),
            join_url: "http://127.0.0.1:5173/".to_string(),
            names_file: None,
            profiles_file: None,
        }
    }
}

impl ServerConfig {
    pub fn load_names(&self) -> anyhow::Result<Vec<String>> {
        let raw = match &self.names_file {
            Some(path) => fs::read_to_string(path)
                .with_context(|| format!("reading names from {}", path.display()))?,
            None => BUNDLED_NAMES.to_string(),
        };
        let names: Vec<String> = serde_json::from_str(&raw).context("names file is not a JSON string array")?;
        Ok(names)
    }

    pub fn load_profiles(&self) -> anyhow::Result<HashMap<String, Profile>> {
        let Some(path) = &self.profiles_file else {
            return Ok(HashMap::new());
        };
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading profiles from {}", path.display()))?;
        serde_json::from_str(&raw).context("profiles file is not a JSON object")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn bundled_names_are_enough_for_a_ticket() {
        let names = ServerConfig::default().load_names().unwrap();
        assert!(names.len() >= nambola_protocol::NAMES_PER_TICKET);
    }

    #[test]
    fn profiles_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"01_Aarav": {{"photo": "/photos/aarav.jpg", "blur": true, "bio": "Loves chess"}}}}"#).unwrap();
        let config = ServerConfig {
            profiles_file: Some(file.path().to_path_buf()),
            ..ServerConfig::default()
        };
        let profiles = config.load_profiles().unwrap();
        let aarav = &profiles["01_Aarav"];
        assert!(aarav.blur);
        assert_eq!(aarav.photo.as_deref(), Some("/photos/aarav.jpg"));
    }
}
