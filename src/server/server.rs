use anyhow::{Context, Result};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use super::{log_requests, state::*, BearerToken, OptionalBearerToken, ServerConfig};
use crate::analysis::ListeningProfile;
use crate::auth::generate_state;
use crate::spotify::{fetch_user_data, TokenScopedLookup};

#[derive(Serialize)]
struct LlmStatus {
    provider: String,
    model: String,
}

#[derive(Serialize)]
struct HealthStatus {
    status: &'static str,
    uptime: String,
    llm: LlmStatus,
}

#[derive(Deserialize, Debug)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

/// 302 with a `Location` header, the status browsers follow for logins.
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

fn invalid_format() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "Invalid data format" })),
    )
        .into_response()
}

async fn health(State(state): State<ServerState>) -> impl IntoResponse {
    let provider = state.analyzer.provider();
    Json(HealthStatus {
        status: "ok",
        uptime: format_uptime(state.start_time.elapsed()),
        llm: LlmStatus {
            provider: provider.name().to_string(),
            model: provider.model().to_string(),
        },
    })
}

async fn analyze(
    State(state): State<ServerState>,
    OptionalBearerToken(token): OptionalBearerToken,
    body: Bytes,
) -> Response {
    // An empty body reads as a profile with nothing in it.
    let body: Value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Object(Default::default())
    } else {
        match serde_json::from_slice(&body) {
            Ok(value) => value,
            Err(err) => {
                debug!("Rejecting unparseable analyze body: {}", err);
                return invalid_format();
            }
        }
    };

    let profile = match ListeningProfile::from_json(&body) {
        Ok(profile) => profile,
        Err(err) => {
            debug!("Rejecting analyze body: {}", err);
            return invalid_format();
        }
    };

    let lookup = TokenScopedLookup::new(state.platform.clone(), token);
    match state.analyzer.analyze(&profile, &lookup).await {
        Ok(analysis) => Json(analysis).into_response(),
        Err(err) => {
            let details = err.to_string();
            error!("Analysis failed: {}", details);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Analysis failed", "details": details })),
            )
                .into_response()
        }
    }
}

async fn user_data(State(state): State<ServerState>, BearerToken(token): BearerToken) -> Response {
    match fetch_user_data(
        state.platform.as_ref(),
        &token,
        &state.config.user_data_limits,
    )
    .await
    {
        Ok(data) => Json(data).into_response(),
        Err(err) => {
            error!("Failed to fetch user data: {:#}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch user data").into_response()
        }
    }
}

async fn login(
    State(spotify_auth): State<GuardedSpotifyAuth>,
    State(login_states): State<GuardedLoginStateStore>,
) -> Response {
    let state = generate_state();
    let url = spotify_auth.authorize_url(&state);
    login_states.insert(state).await;
    found(&url)
}

async fn callback(State(state): State<ServerState>, Query(params): Query<CallbackParams>) -> Response {
    let known_state = match params.state.as_deref() {
        Some(login_state) => state.login_states.take(login_state).await,
        None => false,
    };
    if !known_state {
        warn!("Callback with unknown or expired login state");
        return (StatusCode::BAD_REQUEST, "Invalid login state").into_response();
    }

    let code = match (params.code, params.error) {
        (Some(code), None) => code,
        (_, error) => {
            warn!(error = ?error, "Authorization was not granted");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch access token")
                .into_response();
        }
    };

    match state.spotify_auth.exchange_code(&code).await {
        Ok(grant) => {
            let record = state.token_store.store(grant).await;
            info!("Login completed, redirecting to frontend");
            found(&format!(
                "{}#access_token={}",
                state.config.frontend_url,
                urlencoding::encode(&record.access_token)
            ))
        }
        Err(err) => {
            error!("Failed to fetch access token: {:#}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch access token").into_response()
        }
    }
}

async fn refresh(
    State(spotify_auth): State<GuardedSpotifyAuth>,
    State(token_store): State<GuardedTokenStore>,
) -> Response {
    let result = token_store
        .refresh(|refresh_token| async move { spotify_auth.refresh(&refresh_token).await })
        .await;
    match result {
        Ok(access_token) => Json(json!({ "accessToken": access_token })).into_response(),
        Err(err) => {
            error!("Token refresh failed: {:#}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, "Token refresh failed").into_response()
        }
    }
}

pub fn make_app(
    config: ServerConfig,
    analyzer: GuardedAnalyzer,
    platform: GuardedMusicPlatform,
    spotify_auth: GuardedSpotifyAuth,
) -> Router {
    let state = ServerState::new(config, analyzer, platform, spotify_auth);

    let auth_routes: Router = Router::new()
        .route("/login", get(login))
        .route("/callback", get(callback))
        .route("/refresh", get(refresh))
        .with_state(state.clone());

    let analysis_routes: Router = Router::new()
        .route("/analyze", post(analyze))
        .route("/user-data", get(user_data))
        .route("/health", get(health))
        .with_state(state.clone());

    auth_routes
        .merge(analysis_routes)
        .layer(middleware::from_fn_with_state(state.clone(), log_requests))
        .layer(CorsLayer::permissive())
}

pub async fn run_server(
    config: ServerConfig,
    analyzer: GuardedAnalyzer,
    platform: GuardedMusicPlatform,
    spotify_auth: GuardedSpotifyAuth,
) -> Result<()> {
    let port = config.port;
    let app = make_app(config, analyzer, platform, spotify_auth);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    info!("Listening on port {}", port);

    Ok(axum::serve(listener, app).await?)
}
