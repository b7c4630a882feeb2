//! OAuth2 refresh-token flow.
//!
//! One long-lived refresh token is exchanged for short-lived access
//! tokens at the standard token endpoint. The current access token is
//! cached behind a mutex with a 60 second expiry slack; both REST
//! clients share one provider.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::config::GoogleCredentials;

use super::GatewayError;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

struct CachedToken {
    access_token: String,
    expiry: DateTime<Utc>,
}

pub struct TokenProvider {
    credentials: GoogleCredentials,
    http: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(credentials: GoogleCredentials, http: reqwest::Client) -> Self {
        Self {
            credentials,
            http,
            cached: Mutex::new(None),
        }
    }

    /// Current access token, exchanged anew when the cached one is
    /// within 60 seconds of expiry.
    pub async fn access_token(&self) -> Result<String, GatewayError> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if Utc::now() + Duration::seconds(60) < token.expiry {
                return Ok(token.access_token.clone());
            }
        }

        let form = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("refresh_token", self.credentials.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let resp = self
            .http
            .post(&self.credentials.token_uri)
            .form(&form)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Auth(format!(
                "status {}: {}",
                status.as_u16(),
                body
            )));
        }

        let token: TokenResponse = resp.json().await?;
        if token.access_token.is_empty() {
            return Err(GatewayError::Auth(
                "no access_token in response".to_string(),
            ));
        }

        let expiry = Utc::now() + Duration::seconds(token.expires_in as i64);
        log::info!("Refreshed Google access token, valid until {}", expiry);

        let access = token.access_token.clone();
        *cached = Some(CachedToken {
            access_token: token.access_token,
            expiry,
        });

        Ok(access)
    }
}
