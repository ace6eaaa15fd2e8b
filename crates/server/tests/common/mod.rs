//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with a mock agent platform injected, enabling E2E testing of the upload
//! endpoints without a SwarmNode deployment.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use slaterunner_core::{
    testing::{AgentBehavior, MockAgentPlatform},
    Config, LineupPipeline,
};

/// Re-export fixtures for test convenience
pub use slaterunner_core::testing::fixtures;

/// Boundary used by [`Multipart`] bodies.
const BOUNDARY: &str = "----slaterunner-test-boundary";

/// Test fixture for E2E testing with a mock agent platform.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_submit() {
///     let fixture = TestFixture::new().await;
///     fixture.all_agents_succeed().await;
///
///     let response = fixture
///         .post_multipart("/api/v1/submit", Multipart::new().file("slate.csv", CSV))
///         .await;
///
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock platform - configure agent behavior, inspect created jobs
    pub platform: Arc<MockAgentPlatform>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    /// Raw body, for non-JSON endpoints.
    pub text: String,
}

impl TestFixture {
    /// Create a new test fixture with every agent configured.
    pub async fn new() -> Self {
        Self::with_config(fixtures::config()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(config: Config) -> Self {
        let platform = Arc::new(MockAgentPlatform::new());
        let pipeline = Arc::new(LineupPipeline::from_config(platform.clone(), &config));

        let state = Arc::new(slaterunner_server::state::AppState::new(config, pipeline));
        let router = slaterunner_server::api::create_router(state);

        Self { router, platform }
    }

    /// Configure every agent in [`fixtures::agents`] to succeed.
    pub async fn all_agents_succeed(&self) {
        let p = &self.platform;
        p.on_agent(
            fixtures::INGEST_AGENT,
            AgentBehavior::succeeds(fixtures::ingest_result(&["Alice Guard", "Bob Wing"])),
        )
        .await;
        p.on_agent(
            fixtures::SIGNALS_AGENT,
            AgentBehavior::succeeds(serde_json::json!({"injuries": []})),
        )
        .await;
        p.on_agent(
            fixtures::PROJECTIONS_AGENT,
            AgentBehavior::succeeds(fixtures::projection_result(&["Alice Guard", "Bob Wing"], 30.0)),
        )
        .await;
        p.on_agent(
            fixtures::CONSENSUS_AGENT,
            AgentBehavior::succeeds(fixtures::consensus_result(&["Alice Guard", "Bob Wing"])),
        )
        .await;
        p.on_agent(
            fixtures::OPTIMIZER_AGENT,
            AgentBehavior::succeeds(fixtures::lineups_result(serde_json::json!([
                {"players": ["Alice Guard", "Bob Wing"], "salary": 17400}
            ]))),
        )
        .await;
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Send a POST request with a multipart form body.
    pub async fn post_multipart(&self, path: &str, form: Multipart) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", form.content_type())
            .body(Body::from(form.into_bytes()))
            .unwrap();
        self.send(request).await
    }

    /// Send a POST request with custom content type (for testing wrong content types).
    pub async fn post_with_content_type(
        &self,
        path: &str,
        body: &str,
        content_type: &str,
    ) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", content_type)
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).into_owned();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}

/// Builder for `multipart/form-data` request bodies.
#[derive(Debug, Default)]
pub struct Multipart {
    body: Vec<u8>,
}

impl Multipart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text field.
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
        self
    }

    /// Add the `file` field.
    pub fn file(self, filename: &str, contents: &str) -> Self {
        self.file_bytes(filename, contents.as_bytes())
    }

    /// Add the `file` field with raw bytes.
    pub fn file_bytes(mut self, filename: &str, contents: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: text/csv\r\n\r\n",
                BOUNDARY, filename
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(contents);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", BOUNDARY)
    }

    pub fn into_bytes(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        self.body
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
