//! Integration tests for the patient dashboard API.
//!
//! Each test spawns the full router (all layers included) on an ephemeral
//! port, backed by a fresh in-memory store, and talks to it over HTTP.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p patient-dashboard-integration-tests
//! ```

use std::net::SocketAddr;

use patient_dashboard_api::config::ApiConfig;
use patient_dashboard_api::db::Store;
use patient_dashboard_api::routes;
use patient_dashboard_api::state::AppState;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde_json::{Value, json};

/// A running server plus a client pointed at it.
pub struct TestServer {
    pub base_url: String,
    pub client: Client,
}

impl TestServer {
    /// Spawn a server with the in-memory store and rate limiting off.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn spawn() -> Self {
        let config = ApiConfig::from_lookup(|key| match key {
            "PD_STORE" => Some("memory".to_string()),
            "PD_RATE_LIMIT" => Some("false".to_string()),
            _ => None,
        })
        .expect("test configuration is valid");

        let app = routes::app(AppState::new(config, Store::memory()));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("listener has an address");

        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .expect("Test server error");
        });

        Self {
            base_url: format!("http://{addr}"),
            client: Client::new(),
        }
    }

    /// A request to `path`, optionally with a bearer token.
    #[must_use]
    pub fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{path}", self.base_url));
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and decode the envelope.
    ///
    /// # Panics
    ///
    /// Panics if the request fails or the body is not JSON.
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = self.request(method, path, token);
        if let Some(body) = body {
            builder = builder.json(&body);
        }
        let response = builder.send().await.expect("request failed");
        let status = response.status();
        let body = response.json().await.expect("response body is JSON");
        (status, body)
    }

    /// Register a user and return their bearer token.
    ///
    /// # Panics
    ///
    /// Panics if registration fails.
    pub async fn register(&self, name: &str, email: &str) -> String {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({"name": name, "email": email, "password": "password123"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        body["data"]["token"]
            .as_str()
            .expect("token in response")
            .to_string()
    }
}
