//! Registration, login and bearer-token lifecycle over HTTP.

#![allow(clippy::unwrap_used)]

use patient_dashboard_integration_tests::TestServer;
use reqwest::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn test_register_login_me_logout() {
    let server = TestServer::spawn().await;

    let (status, body) = server
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"name": "Alex", "email": "Alex@Example.com", "password": "password123"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["user"]["email"], "alex@example.com");
    assert!(body["data"]["user"].get("passwordHash").is_none());
    let first = body["data"]["token"].as_str().unwrap().to_string();

    let (status, body) = server
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "alex@example.com", "password": "password123"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let second = body["data"]["token"].as_str().unwrap().to_string();
    assert_ne!(first, second);

    let (status, body) = server
        .call(Method::GET, "/api/auth/me", Some(&first), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Alex");

    let (status, _) = server
        .call(Method::POST, "/api/auth/logout", Some(&first), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = server
        .call(Method::GET, "/api/auth/me", Some(&first), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = server
        .call(Method::GET, "/api/auth/me", Some(&second), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_registration_and_login_failures() {
    let server = TestServer::spawn().await;
    server.register("Alex", "alex@example.com").await;

    let (status, body) = server
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"name": "Other", "email": "alex@example.com", "password": "password123"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = server
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"name": "Short", "email": "short@example.com", "password": "pw"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = server
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "alex@example.com", "password": "wrong-password"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid credentials");
}

#[tokio::test]
async fn test_profile_round_trip() {
    let server = TestServer::spawn().await;
    let token = server.register("Alex", "alex@example.com").await;

    let (status, body) = server
        .call(
            Method::PUT,
            "/api/users/profile",
            Some(&token),
            Some(json!({
                "height": 180,
                "targetWeight": 170,
                "address": {"city": "Lisbon"},
                "email": "ignored@example.com"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "alex@example.com");
    assert_eq!(body["data"]["address"]["city"], "Lisbon");

    let (_, body) = server
        .call(Method::GET, "/api/users/profile", Some(&token), None)
        .await;
    assert_eq!(body["data"]["height"], 180.0);
    assert_eq!(body["data"]["targetWeight"], 170.0);
}
