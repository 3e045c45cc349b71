//! Bearer token enforcement on protected routes.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use chrono::{Duration, Utc};

use garden_core::{UserId, Username};
use garden_integration_tests::TestApp;

const PROTECTED: [(&str, &str); 3] = [
    ("GET", "/api/profile"),
    ("GET", "/api/store"),
    ("GET", "/api/purchases"),
];

#[tokio::test]
async fn test_missing_token_rejected() {
    let app = TestApp::new();

    for (method, path) in PROTECTED {
        let method: Method = method.parse().unwrap();
        let response = app.request(method, path, None, None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{path}");
        assert!(response.body["error"].as_str().is_some());
    }
}

#[tokio::test]
async fn test_wrong_scheme_rejected() {
    let app = TestApp::new();
    let token = app.register_token("alice123", "secret1").await;

    let response = app
        .send(
            Request::builder()
                .uri("/api/profile")
                .header(header::AUTHORIZATION, format!("Token {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_valid_token_grants_access() {
    let app = TestApp::new();
    let token = app.register_token("alice123", "secret1").await;

    let response = app
        .request(Method::GET, "/api/profile", Some(&token), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["username"], "alice123");
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let app = TestApp::new();
    let token = app.register_token("alice123", "secret1").await;
    let claims = app.state.tokens().verify(&token).unwrap();

    let expired = app
        .state
        .tokens()
        .issue_at(
            claims.user_id,
            &claims.username,
            Utc::now() - Duration::hours(2),
        )
        .unwrap();

    let response = app
        .request(Method::GET, "/api/profile", Some(&expired), None)
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"], "Token expired");
}

#[tokio::test]
async fn test_tampered_payload_rejected() {
    let app = TestApp::new();
    let token = app.register_token("alice123", "secret1").await;

    // Swap in the payload of a token for a different user, keep the signature
    let other = app
        .state
        .tokens()
        .issue(UserId::generate(), &Username::parse("mallory").unwrap())
        .unwrap();
    let mut parts: Vec<&str> = token.split('.').collect();
    let other_parts: Vec<&str> = other.split('.').collect();
    parts[1] = other_parts[1];
    let forged = parts.join(".");

    let response = app
        .request(Method::GET, "/api/profile", Some(&forged), None)
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"], "Invalid token");
}

#[tokio::test]
async fn test_garbage_token_rejected() {
    let app = TestApp::new();
    let response = app
        .request(Method::GET, "/api/store", Some("not.a.jwt"), None)
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_for_deleted_user() {
    let app = TestApp::new();
    // Valid signature, but no such user in the store
    let token = app
        .state
        .tokens()
        .issue(UserId::generate(), &Username::parse("ghost").unwrap())
        .unwrap();

    let response = app
        .request(Method::GET, "/api/profile", Some(&token), None)
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"], "User does not exist");
}
