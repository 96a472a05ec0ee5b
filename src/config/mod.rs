mod file_config;

pub use file_config::{FileConfig, LlmFileConfig, SpotifyFileConfig};

use crate::auth::{SpotifyCredentials, DEFAULT_ACCOUNTS_BASE_URL};
use crate::llm::{ApiKeySource, CompletionOptions};
use crate::server::RequestsLoggingLevel;
use crate::spotify::{UserDataLimits, DEFAULT_API_BASE_URL};
use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use std::time::Duration;

pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_LLM_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_LLM_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_LLM_MAX_TOKENS: u32 = 800;
pub const DEFAULT_PLAYLIST_FETCH_TIMEOUT_SEC: u64 = 10;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_url: Option<String>,
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
    pub spotify_redirect_uri: Option<String>,
    pub spotify_timeout_sec: u64,
    pub llm_base_url: Option<String>,
    pub llm_model: Option<String>,
    pub llm_api_key: Option<String>,
    pub llm_timeout_sec: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    /// Where `/callback` sends the browser once a token is granted.
    pub frontend_url: String,
    pub llm: LlmSettings,
    pub spotify: SpotifySettings,
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub api_key_command: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl LlmSettings {
    pub fn api_key_source(&self) -> ApiKeySource {
        match (&self.api_key_command, &self.api_key) {
            (Some(command), _) => ApiKeySource::Command(command.clone()),
            (None, Some(key)) => ApiKeySource::Static(key.clone()),
            (None, None) => ApiKeySource::None,
        }
    }

    pub fn completion_options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: self.temperature,
            max_tokens: Some(self.max_tokens),
            json_response: true,
            timeout: self.timeout,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpotifySettings {
    pub credentials: SpotifyCredentials,
    pub api_base_url: String,
    pub accounts_base_url: String,
    pub timeout: Duration,
    pub playlist_fetch_timeout: Duration,
}

impl SpotifySettings {
    pub fn user_data_limits(&self) -> UserDataLimits {
        UserDataLimits {
            playlist_fetch_timeout: self.playlist_fetch_timeout,
            ..Default::default()
        }
    }
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);
        if port == metrics_port && port != 0 {
            bail!("port and metrics_port must differ (both are {})", port);
        }

        let logging_level = match file.logging_level {
            Some(level) => parse_logging_level(&level).ok_or_else(|| {
                anyhow::anyhow!(
                    "Invalid logging_level '{}' (expected none, path, headers or body)",
                    level
                )
            })?,
            None => cli.logging_level.clone(),
        };

        let frontend_url = file
            .frontend_url
            .or_else(|| cli.frontend_url.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("frontend_url must be specified via --frontend-url or in config file")
            })?;
        validate_url("frontend_url", &frontend_url)?;

        let llm_file = file.llm.unwrap_or_default();
        let llm = LlmSettings {
            base_url: llm_file
                .base_url
                .or_else(|| cli.llm_base_url.clone())
                .unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
            model: llm_file
                .model
                .or_else(|| cli.llm_model.clone())
                .unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            api_key: llm_file.api_key.or_else(|| cli.llm_api_key.clone()),
            api_key_command: llm_file.api_key_command,
            temperature: llm_file.temperature.unwrap_or(DEFAULT_LLM_TEMPERATURE),
            max_tokens: llm_file.max_tokens.unwrap_or(DEFAULT_LLM_MAX_TOKENS),
            timeout: Duration::from_secs(llm_file.timeout_sec.unwrap_or(cli.llm_timeout_sec)),
        };
        validate_url("llm.base_url", &llm.base_url)?;
        if !(0.0..=2.0).contains(&llm.temperature) {
            bail!("llm.temperature must be between 0 and 2, got {}", llm.temperature);
        }
        if llm.max_tokens == 0 {
            bail!("llm.max_tokens must be positive");
        }

        let spotify_file = file.spotify.unwrap_or_default();
        let credentials = SpotifyCredentials {
            client_id: required(
                spotify_file.client_id,
                &cli.spotify_client_id,
                "spotify.client_id",
                "--spotify-client-id",
            )?,
            client_secret: required(
                spotify_file.client_secret,
                &cli.spotify_client_secret,
                "spotify.client_secret",
                "--spotify-client-secret",
            )?,
            redirect_uri: required(
                spotify_file.redirect_uri,
                &cli.spotify_redirect_uri,
                "spotify.redirect_uri",
                "--spotify-redirect-uri",
            )?,
        };
        validate_url("spotify.redirect_uri", &credentials.redirect_uri)?;

        let spotify = SpotifySettings {
            credentials,
            api_base_url: spotify_file
                .api_base_url
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            accounts_base_url: spotify_file
                .accounts_base_url
                .unwrap_or_else(|| DEFAULT_ACCOUNTS_BASE_URL.to_string()),
            timeout: Duration::from_secs(
                spotify_file.timeout_sec.unwrap_or(cli.spotify_timeout_sec),
            ),
            playlist_fetch_timeout: Duration::from_secs(
                spotify_file
                    .playlist_fetch_timeout_sec
                    .unwrap_or(DEFAULT_PLAYLIST_FETCH_TIMEOUT_SEC),
            ),
        };
        validate_url("spotify.api_base_url", &spotify.api_base_url)?;
        validate_url("spotify.accounts_base_url", &spotify.accounts_base_url)?;

        Ok(Self {
            port,
            metrics_port,
            logging_level,
            frontend_url,
            llm,
            spotify,
        })
    }
}

fn required(
    from_file: Option<String>,
    from_cli: &Option<String>,
    key: &str,
    flag: &str,
) -> Result<String> {
    match from_file.or_else(|| from_cli.clone()) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => bail!("{} must be specified via {} or in config file", key, flag),
    }
}

fn validate_url(key: &str, value: &str) -> Result<()> {
    reqwest::Url::parse(value)
        .map(|_| ())
        .with_context(|| format!("{} is not a valid URL: {:?}", key, value))
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
