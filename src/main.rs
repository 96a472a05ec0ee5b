use aesthetics_server::analysis::Analyzer;
use aesthetics_server::auth::SpotifyAuth;
use aesthetics_server::config::{AppConfig, CliConfig, FileConfig};
use aesthetics_server::llm::{LlmProvider, OpenAIProvider};
use aesthetics_server::metrics;
use aesthetics_server::server::{run_server, RequestsLoggingLevel, ServerConfig};
use aesthetics_server::spotify::{MusicPlatform, SpotifyClient};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to a TOML config file. Values in it override the flags below.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3000)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Where the browser is sent after login, with the token in the fragment.
    #[clap(long, env = "FRONTEND_URL")]
    pub frontend_url: Option<String>,

    #[clap(long, env = "CLIENT_ID")]
    pub spotify_client_id: Option<String>,

    #[clap(long, env = "CLIENT_SECRET", hide_env_values = true)]
    pub spotify_client_secret: Option<String>,

    #[clap(long, env = "REDIRECT_URI")]
    pub spotify_redirect_uri: Option<String>,

    /// Timeout in seconds for Spotify API and accounts requests.
    #[clap(long, default_value_t = 15)]
    pub spotify_timeout_sec: u64,

    /// Base URL of the OpenAI-compatible completion API.
    #[clap(long)]
    pub llm_base_url: Option<String>,

    #[clap(long)]
    pub llm_model: Option<String>,

    #[clap(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub llm_api_key: Option<String>,

    /// Timeout in seconds for a single completion request.
    #[clap(long, default_value_t = 120)]
    pub llm_timeout_sec: u64,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            port: self.port,
            metrics_port: self.metrics_port,
            logging_level: self.logging_level.clone(),
            frontend_url: self.frontend_url.clone(),
            spotify_client_id: self.spotify_client_id.clone(),
            spotify_client_secret: self.spotify_client_secret.clone(),
            spotify_redirect_uri: self.spotify_redirect_uri.clone(),
            spotify_timeout_sec: self.spotify_timeout_sec,
            llm_base_url: self.llm_base_url.clone(),
            llm_model: self.llm_model.clone(),
            llm_api_key: self.llm_api_key.clone(),
            llm_timeout_sec: self.llm_timeout_sec,
        }
    }
}

async fn run_metrics_server(port: u16) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", port))?;
    Ok(axum::serve(listener, metrics::make_metrics_app()).await?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}...", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    info!("Initializing metrics...");
    metrics::init_metrics();

    let provider = OpenAIProvider::new(
        config.llm.base_url.clone(),
        config.llm.model.clone(),
        config.llm.api_key_source(),
    );
    info!(
        "Using {} model {} at {}",
        provider.name(),
        provider.model(),
        config.llm.base_url
    );
    if let Err(err) = provider.health_check().await {
        // The server is still useful for login and user data without it.
        warn!("LLM backend health check failed: {}", err);
    }
    let analyzer = Arc::new(Analyzer::new(
        Arc::new(provider),
        config.llm.completion_options(),
    ));

    let platform: Arc<dyn MusicPlatform> = Arc::new(SpotifyClient::new(
        config.spotify.api_base_url.clone(),
        config.spotify.timeout,
    )?);
    let spotify_auth = Arc::new(SpotifyAuth::new(
        config.spotify.credentials.clone(),
        config.spotify.accounts_base_url.clone(),
        config.spotify.timeout,
    )?);

    let server_config = ServerConfig {
        requests_logging_level: config.logging_level.clone(),
        port: config.port,
        frontend_url: config.frontend_url.clone(),
        user_data_limits: config.spotify.user_data_limits(),
    };

    info!("Ready to serve at port {}!", config.port);
    info!("Metrics available at port {}!", config.metrics_port);
    tokio::select! {
        result = run_server(server_config, analyzer, platform, spotify_auth) => {
            if let Err(err) = &result {
                error!("Server stopped: {:#}", err);
            }
            result
        }
        result = run_metrics_server(config.metrics_port) => {
            if let Err(err) = &result {
                error!("Metrics server stopped: {:#}", err);
            }
            result
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
            Ok(())
        }
    }
}
