//! Shared constants for end-to-end tests

/// Regular test user credentials
pub const TEST_USER: &str = "test_user";
pub const TEST_PASS: &str = "test_password_123";

/// Caller-scoped catalog credential forwarded on every recommendation request
pub const SPOTIFY_TOKEN: &str = "BQC-test-spotify-token";

/// How long to wait for the test server to become ready
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 20;

/// Timeout for individual test requests
pub const REQUEST_TIMEOUT_SECS: u64 = 10;
