//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated server with its own fakes and token store.

use super::constants::*;
use super::fixtures::{default_reply, spawn_accounts_stub, InMemoryPlatform, ScriptedProvider};
use aesthetics_server::analysis::Analyzer;
use aesthetics_server::auth::{SpotifyAuth, SpotifyCredentials};
use aesthetics_server::llm::CompletionOptions;
use aesthetics_server::server::{make_app, RequestsLoggingLevel, ServerConfig};
use aesthetics_server::spotify::UserDataLimits;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// Test server instance with its own accounts stub
///
/// When dropped, the server and the stub gracefully shut down.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    // Private fields - keep resources alive until drop
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    _accounts_shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a test server whose model gives a well-formed reply
    pub async fn spawn() -> Self {
        Self::spawn_with_reply(default_reply()).await
    }

    /// Spawns a test server whose model answers every prompt with `reply`
    ///
    /// # Panics
    ///
    /// Panics if port binding fails or the server doesn't become ready
    /// within timeout.
    pub async fn spawn_with_reply(reply: impl Into<String>) -> Self {
        let (accounts_base_url, accounts_shutdown_tx) = spawn_accounts_stub().await;

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");

        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let base_url = format!("http://127.0.0.1:{}", port);

        // Create shutdown channel
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            frontend_url: FRONTEND_URL.to_string(),
            user_data_limits: UserDataLimits {
                playlist_fetch_timeout: Duration::from_secs(2),
                ..Default::default()
            },
        };

        let analyzer = Arc::new(Analyzer::new(
            Arc::new(ScriptedProvider::new(reply)),
            CompletionOptions::default(),
        ));

        let spotify_auth = SpotifyAuth::new(
            SpotifyCredentials {
                client_id: "test-client".to_string(),
                client_secret: "test-secret".to_string(),
                redirect_uri: format!("{}/callback", base_url),
            },
            accounts_base_url,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        )
        .expect("Failed to build accounts client");

        let app = make_app(
            config,
            analyzer,
            Arc::new(InMemoryPlatform::new()),
            Arc::new(spotify_auth),
        );

        // Spawn server in background task with graceful shutdown
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            _shutdown_tx: Some(shutdown_tx),
            _accounts_shutdown_tx: Some(accounts_shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the /health endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/health", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(tx) = self._accounts_shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
