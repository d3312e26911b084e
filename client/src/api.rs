use std::time::Duration;

use nambola_protocol::*;
use reqwest::{Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("invalid API URL: {0}")]
    BadUrl(String),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned {status}: {}", detail.as_deref().unwrap_or("no detail"))]
    Status { status: StatusCode, detail: Option<String> },

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// The server-provided `detail` message, if the failure carried one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Status { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Thin async wrapper over the backend's JSON endpoints. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base = Url::parse(base_url).map_err(|e| ApiError::BadUrl(format!("{base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::BadUrl(base_url.to_string()));
        }
        let http = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self { http, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// `<base>/api/<segments...>`, each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("api").extend(segments);
        }
        url
    }

    /// Absolute URL of a server-relative asset such as a profile photo.
    pub fn asset_url(&self, path: &str) -> String {
        if Url::parse(path).is_ok() {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.base.as_str().trim_end_matches('/'),
            path.trim_start_matches('/').replace(' ', "%20")
        )
    }

    async fn send<B, T>(&self, method: Method, url: Url, body: Option<&B>) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!("{} {}", method, url);
        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let detail = serde_json::from_slice::<ErrorDetail>(&bytes).ok().map(|e| e.detail);
            return Err(ApiError::Status { status, detail });
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        self.send::<(), T>(Method::GET, self.endpoint(segments), None).await
    }

    async fn post<B, T>(&self, segments: &[&str], body: Option<&B>) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(Method::POST, self.endpoint(segments), body).await
    }

    /* ------------------------------ player ------------------------------ */

    pub async fn register(&self, player_name: &str) -> Result<RegisterResponse, ApiError> {
        let body = RegisterRequest { player_name: player_name.to_string() };
        self.post(&["register"], Some(&body)).await
    }

    pub async fn names(&self) -> Result<Vec<String>, ApiError> {
        let resp: NamesResponse = self.get(&["names"]).await?;
        Ok(resp.names)
    }

    pub async fn ticket(&self, ticket_id: &str) -> Result<Ticket, ApiError> {
        self.get(&["ticket", ticket_id]).await
    }

    pub async fn game_status(&self) -> Result<GameStatus, ApiError> {
        self.get(&["game-status"]).await
    }

    pub async fn claim(&self, ticket_id: &str) -> Result<ClaimResponse, ApiError> {
        let body = ClaimRequest { ticket_id: ticket_id.to_string() };
        self.post(&["claim"], Some(&body)).await
    }

    pub async fn profile(&self, name: &str) -> Result<Profile, ApiError> {
        self.get(&["profile", name]).await
    }

    /* ------------------------------- admin ------------------------------- */

    /// Succeeds only when the backend answers 2xx.
    pub async fn admin_login(&self, password: &str) -> Result<(), ApiError> {
        let body = LoginRequest { password: password.to_string() };
        let _: serde_json::Value = self.post(&["admin", "login"], Some(&body)).await?;
        Ok(())
    }

    pub async fn qr_code(&self) -> Result<QrCode, ApiError> {
        self.get(&["admin", "qr-code"]).await
    }

    pub async fn claims(&self) -> Result<Vec<PendingClaim>, ApiError> {
        self.get(&["admin", "claims"]).await
    }

    pub async fn pick_name(&self) -> Result<PickNameResponse, ApiError> {
        self.post::<(), _>(&["admin", "pick-name"], None).await
    }

    pub async fn verify_claim(&self, claim_id: u64, is_valid: bool) -> Result<(), ApiError> {
        let body = VerifyClaimRequest { claim_id, is_valid };
        let _: serde_json::Value = self.post(&["admin", "verify-claim"], Some(&body)).await?;
        Ok(())
    }

    pub async fn reset_game(&self) -> Result<(), ApiError> {
        let _: serde_json::Value = self.post::<(), _>(&["admin", "reset-game"], None).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_encode_segments() {
        let api = ApiClient::new("http://127.0.0.1:8000").unwrap();
        assert_eq!(api.endpoint(&["game-status"]).as_str(), "http://127.0.0.1:8000/api/game-status");
        assert_eq!(
            api.endpoint(&["profile", "Ann Lee/2"]).as_str(),
            "http://127.0.0.1:8000/api/profile/Ann%20Lee%2F2"
        );
    }

    #[test]
    fn base_path_prefix_is_kept() {
        let api = ApiClient::new("https://example.org/bingo/").unwrap();
        assert_eq!(api.endpoint(&["names"]).as_str(), "https://example.org/bingo/api/names");
        assert_eq!(api.asset_url("/photos/a b.jpg"), "https://example.org/bingo/photos/a%20b.jpg");
        assert_eq!(api.asset_url("https://cdn.example.org/x.png"), "https://cdn.example.org/x.png");
    }

    #[test]
    fn rejects_unusable_base() {
        assert!(matches!(ApiClient::new("not a url"), Err(ApiError::BadUrl(_))));
        assert!(matches!(ApiClient::new("mailto:admin@example.org"), Err(ApiError::BadUrl(_))));
    }
}
