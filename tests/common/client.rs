//! HTTP client for end-to-end tests
//!
//! This module provides a high-level HTTP client that wraps reqwest
//! and provides methods for all promptify-server endpoints.
//!
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::Response;
use serde_json::json;
use std::time::Duration;

/// HTTP test client with cookie-based session management
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    /// Creates a new unauthenticated client
    ///
    /// Use this for testing authentication flows.
    /// For most tests, use `authenticated()` instead.
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(true) // Automatically handle session cookies
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// Creates a client pre-authenticated as the standard test user
    ///
    /// # Panics
    ///
    /// Panics if authentication fails (indicates test infrastructure problem).
    pub async fn authenticated(base_url: String) -> Self {
        let client = Self::new(base_url);

        let response = client.login(TEST_USER, TEST_PASS).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::CREATED,
            "Test user authentication failed: {:?}",
            response.text().await
        );

        client
    }

    // ========================================================================
    // Authentication Endpoints
    // ========================================================================

    /// POST /v1/auth/login
    pub async fn login(&self, handle: &str, password: &str) -> Response {
        self.client
            .post(format!("{}/v1/auth/login", self.base_url))
            .json(&json!({
                "user_handle": handle,
                "password": password
            }))
            .send()
            .await
            .expect("Login request failed")
    }

    /// GET /v1/auth/logout
    pub async fn logout(&self) -> Response {
        self.client
            .get(format!("{}/v1/auth/logout", self.base_url))
            .send()
            .await
            .expect("Logout request failed")
    }

    // ========================================================================
    // Unauthenticated Endpoints
    // ========================================================================

    /// GET /
    pub async fn get_statics(&self) -> Response {
        self.client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .expect("Statics request failed")
    }

    /// GET /health
    pub async fn get_health(&self) -> Response {
        self.client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .expect("Health request failed")
    }

    // ========================================================================
    // Recommendation Endpoint
    // ========================================================================

    /// POST /v1/curator/recommendations with an arbitrary body
    pub async fn post_recommendations(&self, body: serde_json::Value) -> Response {
        self.client
            .post(format!("{}/v1/curator/recommendations", self.base_url))
            .json(&body)
            .send()
            .await
            .expect("Recommendations request failed")
    }

    /// POST /v1/curator/recommendations with the standard catalog credential
    pub async fn recommend(&self, prompt: &str) -> Response {
        self.post_recommendations(json!({
            "prompt": prompt,
            "spotify_token": SPOTIFY_TOKEN
        }))
        .await
    }
}

/// Parses the `data:` frames of a fully-read SSE body into JSON payloads.
///
/// Keep-alive comment lines (starting with ':') are ignored.
pub fn parse_sse_frames(body: &str) -> Vec<serde_json::Value> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .map(|payload| {
            serde_json::from_str(payload)
                .unwrap_or_else(|e| panic!("Unparseable SSE frame {:?}: {}", payload, e))
        })
        .collect()
}

/// Asserts that the frame sequence ends with its only terminal frame.
///
/// A terminal frame carries either "trackIds" or "error"; "content" frames
/// are progress updates.
pub fn assert_single_terminal(frames: &[serde_json::Value]) {
    let terminal_count = frames
        .iter()
        .filter(|f| f.get("trackIds").is_some() || f.get("error").is_some())
        .count();
    assert_eq!(
        terminal_count, 1,
        "expected exactly one terminal frame, got {:?}",
        frames
    );
    let last = frames.last().expect("no frames emitted");
    assert!(
        last.get("trackIds").is_some() || last.get("error").is_some(),
        "last frame is not terminal: {:?}",
        frames
    );
}
