//! Weight records, goal resolution and progress over HTTP.

#![allow(clippy::unwrap_used)]

use patient_dashboard_integration_tests::TestServer;
use reqwest::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn test_goals_resolve_independently_across_records() {
    let server = TestServer::spawn().await;
    let token = server.register("Alex", "alex@example.com").await;

    for body in [
        json!({"weight": 205, "date": "2026-01-01", "startingWeight": 200}),
        json!({"weight": 190, "date": "2026-01-02"}),
        json!({"weight": 190, "date": "2026-01-03", "weightGoal": 170}),
    ] {
        let (status, _) = server
            .call(Method::POST, "/api/weight", Some(&token), Some(body))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = server
        .call(Method::GET, "/api/weight/goals", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"],
        json!({
            "startingWeight": 200.0,
            "currentWeight": 190.0,
            "weightGoal": 170.0,
            "weightChange": -10.0
        })
    );

    let (_, body) = server
        .call(Method::GET, "/api/weight", Some(&token), None)
        .await;
    assert_eq!(body["count"], 3);
    assert_eq!(body["data"][0]["weight"], 190.0);
}

#[tokio::test]
async fn test_set_goals_requires_a_weight_and_appends() {
    let server = TestServer::spawn().await;
    let token = server.register("Alex", "alex@example.com").await;

    let (status, body) = server
        .call(
            Method::POST,
            "/api/weight/goals",
            Some(&token),
            Some(json!({"weightGoal": 160})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, _) = server
        .call(Method::POST, "/api/weight/goals", Some(&token), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = server
        .call(Method::GET, "/api/weight", Some(&token), None)
        .await;
    assert_eq!(body["count"], 0);

    let (status, body) = server
        .call(
            Method::POST,
            "/api/weight/goals",
            Some(&token),
            Some(json!({"startingWeight": 210, "weightGoal": 160})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["weight"], 210.0);
    assert_eq!(body["data"]["weightGoal"], 160.0);

    let (_, body) = server
        .call(Method::GET, "/api/weight/goals", Some(&token), None)
        .await;
    assert_eq!(body["data"]["startingWeight"], 210.0);
    assert_eq!(body["data"]["weightGoal"], 160.0);
    assert_eq!(body["data"]["weightChange"], 0.0);
}

#[tokio::test]
async fn test_progress_uses_profile_and_history() {
    let server = TestServer::spawn().await;
    let token = server.register("Alex", "alex@example.com").await;

    server
        .call(
            Method::PUT,
            "/api/users/profile",
            Some(&token),
            Some(json!({"height": 180, "targetWeight": 180})),
        )
        .await;
    for body in [
        json!({"weight": 220, "date": "2026-01-01", "startingWeight": 220}),
        json!({"weight": 200, "date": "2026-01-21"}),
    ] {
        server
            .call(Method::POST, "/api/weight", Some(&token), Some(body))
            .await;
    }

    let (status, body) = server
        .call(Method::GET, "/api/weight/progress", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let progress = &body["data"];
    assert_eq!(progress["startingWeight"], 220.0);
    assert_eq!(progress["currentWeight"], 200.0);
    assert_eq!(progress["goalWeight"], 180.0);
    assert_eq!(progress["totalLost"], 20.0);
    assert_eq!(progress["weightToLose"], 20.0);
    assert_eq!(progress["progressPercentage"], 50.0);
    assert_eq!(progress["targetBmi"], 25.0);
    assert!(progress["bmi"].as_f64().unwrap() > 27.0);
    assert!(progress["estimatedCompletion"].is_string());
}

#[tokio::test]
async fn test_weight_record_ownership() {
    let server = TestServer::spawn().await;
    let alice = server.register("Alice", "alice@example.com").await;
    let bob = server.register("Bob", "bob@example.com").await;

    let (_, body) = server
        .call(
            Method::POST,
            "/api/weight",
            Some(&alice),
            Some(json!({"weight": 150})),
        )
        .await;
    let path = format!("/api/weight/{}", body["data"]["id"]);

    let (status, body) = server.call(Method::DELETE, &path, Some(&bob), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Not authorized to delete this weight record");

    let (status, body) = server
        .call(Method::PUT, &path, Some(&alice), Some(json!({"weight": 148})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["currentWeight"], 148.0);
}
