//! Caller-supplied Spotify access token, read from `Authorization: Bearer`.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
    response::IntoResponse,
};
use std::convert::Infallible;
use tracing::debug;

const BEARER_SCHEME: &str = "bearer";

#[derive(Debug, Clone, PartialEq)]
pub struct BearerToken(pub String);

/// Same as [`BearerToken`] for routes where the token is optional.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionalBearerToken(pub Option<String>);

pub enum AccessTokenRejection {
    Missing,
}

impl IntoResponse for AccessTokenRejection {
    fn into_response(self) -> axum::response::Response {
        match self {
            AccessTokenRejection::Missing => {
                (StatusCode::UNAUTHORIZED, "Access token missing").into_response()
            }
        }
    }
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        debug!("Ignoring Authorization header with scheme {}", scheme);
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

impl<S: Send + Sync> FromRequestParts<S> for BearerToken {
    type Rejection = AccessTokenRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        extract_bearer_token(&parts.headers)
            .map(BearerToken)
            .ok_or(AccessTokenRejection::Missing)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for OptionalBearerToken {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalBearerToken(extract_bearer_token(&parts.headers)))
    }
}
