//! Shared constants for end-to-end tests
//!
//! When the fake Spotify data or the scripted model reply changes, update only
//! this file.

// ============================================================================
// Caller tokens
// ============================================================================

/// Token the in-memory platform accepts
pub const TEST_ACCESS_TOKEN: &str = "test-access-token";

/// Token the in-memory platform rejects, as an expired token would be
pub const EXPIRED_ACCESS_TOKEN: &str = "expired-access-token";

// ============================================================================
// Accounts service stub
// ============================================================================

/// Authorization code the accounts stub exchanges successfully
pub const GOOD_AUTH_CODE: &str = "good-code";

pub const GRANTED_ACCESS_TOKEN: &str = "granted-access-token";
pub const GRANTED_REFRESH_TOKEN: &str = "granted-refresh-token";
pub const REFRESHED_ACCESS_TOKEN: &str = "refreshed-access-token";

pub const FRONTEND_URL: &str = "http://frontend.test/app";

// ============================================================================
// Fake catalog
// ============================================================================

/// The one track the fake search knows
pub const KNOWN_TRACK: &str = "Only Shallow";
pub const KNOWN_TRACK_ARTIST: &str = "My Bloody Valentine";
pub const KNOWN_TRACK_IMAGE: &str = "https://img.test/loveless.jpg";
pub const KNOWN_TRACK_GENRE: &str = "shoegaze";

/// Playlist whose track listing always fails to load
pub const BROKEN_PLAYLIST_NAME: &str = "Broken Mix";

pub const PLAYLIST_300_IMAGE: &str = "https://img.test/playlist-300.jpg";

// ============================================================================
// Timeouts
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Interval between readiness checks (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;

/// HTTP request timeout for test client (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;
