//! HTTP client for end-to-end tests
//!
//! This module wraps reqwest and provides methods for every server endpoint.
//! Redirects are not followed, so tests can inspect `Location` headers.
//!
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::Response;
use serde_json::Value;
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
    /// Spotify access token sent as `Authorization: Bearer`
    pub access_token: Option<String>,
}

impl TestClient {
    /// Creates a client that sends no access token
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self {
            client,
            base_url,
            access_token: None,
        }
    }

    /// Creates a client carrying the token the fake platform accepts
    pub fn authenticated(base_url: String) -> Self {
        Self::with_token(base_url, TEST_ACCESS_TOKEN)
    }

    pub fn with_token(base_url: String, token: &str) -> Self {
        Self {
            access_token: Some(token.to_string()),
            ..Self::new(base_url)
        }
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let request = self.client.get(format!("{}{}", self.base_url, path));
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    // ========================================================================
    // Analysis Endpoints
    // ========================================================================

    /// POST /analyze with a JSON body
    pub async fn analyze(&self, body: &Value) -> Response {
        self.analyze_raw(body.to_string()).await
    }

    /// POST /analyze with an arbitrary body
    pub async fn analyze_raw(&self, body: String) -> Response {
        let request = self
            .client
            .post(format!("{}/analyze", self.base_url))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body);
        let request = match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        request.send().await.expect("Analyze request failed")
    }

    /// GET /user-data
    pub async fn user_data(&self) -> Response {
        self.get("/user-data")
            .send()
            .await
            .expect("User data request failed")
    }

    /// GET /health
    pub async fn health(&self) -> Response {
        self.get("/health")
            .send()
            .await
            .expect("Health request failed")
    }

    // ========================================================================
    // Authentication Endpoints
    // ========================================================================

    /// GET /login
    pub async fn login(&self) -> Response {
        self.get("/login").send().await.expect("Login request failed")
    }

    /// GET /callback?code=..&state=..
    pub async fn callback(&self, code: &str, state: &str) -> Response {
        self.client
            .get(format!("{}/callback", self.base_url))
            .query(&[("code", code), ("state", state)])
            .send()
            .await
            .expect("Callback request failed")
    }

    /// GET /refresh
    pub async fn refresh(&self) -> Response {
        self.get("/refresh")
            .send()
            .await
            .expect("Refresh request failed")
    }

    /// Starts a login and returns the `state` value from the authorize redirect
    pub async fn start_login(&self) -> String {
        let response = self.login().await;
        assert_eq!(response.status(), reqwest::StatusCode::FOUND);
        let location = location(&response);
        let url = reqwest::Url::parse(&location).expect("Invalid authorize URL");
        url.query_pairs()
            .find(|(key, _)| key == "state")
            .map(|(_, value)| value.into_owned())
            .expect("Authorize URL has no state")
    }
}

/// The `Location` header of a redirect response
pub fn location(response: &Response) -> String {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .expect("Response has no Location header")
        .to_str()
        .expect("Location header is not text")
        .to_string()
}
