//! Authorization-code flow against the Spotify accounts service.

use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_ACCOUNTS_BASE_URL: &str = "https://accounts.spotify.com";
pub const SCOPES: &str = "user-top-read playlist-read-private";

#[derive(Debug, Clone)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

/// Token endpoint response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
    #[serde(default)]
    pub scope: Option<String>,
}

fn default_expires_in() -> u64 {
    3600
}

pub struct SpotifyAuth {
    client: reqwest::Client,
    accounts_base_url: String,
    credentials: SpotifyCredentials,
}

impl SpotifyAuth {
    pub fn new(
        credentials: SpotifyCredentials,
        accounts_base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create Spotify accounts HTTP client")?;

        Ok(Self {
            client,
            accounts_base_url: accounts_base_url.into().trim_end_matches('/').to_string(),
            credentials,
        })
    }

    pub fn authorize_url(&self, state: &str) -> String {
        format!(
            "{}/authorize?client_id={}&response_type=code&redirect_uri={}&scope={}&state={}&show_dialog=true",
            self.accounts_base_url,
            urlencoding::encode(&self.credentials.client_id),
            urlencoding::encode(&self.credentials.redirect_uri),
            urlencoding::encode(SCOPES),
            urlencoding::encode(state),
        )
    }

    pub async fn exchange_code(&self, code: &str) -> Result<TokenGrant> {
        self.request_token(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.credentials.redirect_uri.as_str()),
        ])
        .await
        .context("Authorization code exchange failed")
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant> {
        self.request_token(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
        .context("Token refresh failed")
    }

    fn basic_authorization(&self) -> String {
        let pair = format!(
            "{}:{}",
            self.credentials.client_id, self.credentials.client_secret
        );
        format!("Basic {}", STANDARD.encode(pair))
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> Result<TokenGrant> {
        let url = format!("{}/api/token", self.accounts_base_url);
        debug!(url = %url, "Requesting token");

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, self.basic_authorization())
            .form(form)
            .send()
            .await
            .context("Failed to reach Spotify accounts service")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Token endpoint returned status {}: {}", status, body);
        }

        response
            .json()
            .await
            .context("Failed to parse token response")
    }
}
