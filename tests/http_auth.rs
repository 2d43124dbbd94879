mod common;

use axum::http::{Method, StatusCode};
use common::{SECRET, TestApp};
use serde_json::json;
use sitecms::auth::TokenSigner;

#[tokio::test]
async fn root_reports_running() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("API is running"));
}

#[tokio::test]
async fn register_then_login_issues_a_token() {
    let app = TestApp::new().await;
    let credentials = json!({ "username": "asha", "password": "longenough" });

    let (status, body) = app
        .send(Method::POST, "/register", None, Some(credentials.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "User registered successfully");

    let (status, body) = app
        .send(Method::POST, "/login", None, Some(credentials))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Login successful");

    let claims = TokenSigner::new(SECRET, 1800)
        .verify(body["token"].as_str().unwrap())
        .unwrap();
    assert_eq!(claims.username, "asha");
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let app = TestApp::new().await;
    let credentials = json!({ "username": "asha", "password": "longenough" });
    app.send(Method::POST, "/register", None, Some(credentials.clone()))
        .await;

    let (status, body) = app
        .send(Method::POST, "/register", None, Some(credentials))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Username already exists");
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = TestApp::new().await;
    app.login().await;

    let (status, body) = app
        .send(
            Method::POST,
            "/login",
            None,
            Some(json!({ "username": "editor", "password": "not-the-one" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");
}

#[tokio::test]
async fn mutation_without_token_is_unauthorized() {
    let app = TestApp::new().await;
    let (status, body) = app
        .send(Method::POST, "/homepage", None, Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Access denied. No token provided.");
    assert_eq!(body["code"], "unauthorized");
}

#[tokio::test]
async fn expired_token_is_unauthorized_with_its_own_code() {
    let app = TestApp::new().await;
    let an_hour_ago = chrono::Utc::now().timestamp() - 3600;
    let token = TokenSigner::new(SECRET, 1800)
        .issue_at("acc-1", "editor", an_hour_ago)
        .unwrap();

    let (status, body) = app
        .send(
            Method::PATCH,
            "/homepage",
            Some(&token),
            Some(json!({ "sectionName": "sectionOne", "data": { "title": "x" } })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "token_expired");
    assert_eq!(body["error"], "Token expired. Please login again.");
}

#[tokio::test]
async fn tampered_token_is_forbidden() {
    let app = TestApp::new().await;
    let token = app.login().await;
    let mut tampered = token.clone();
    tampered.push('x');

    let (status, body) = app
        .send(Method::DELETE, "/locationpage/any", Some(&tampered), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Invalid token");

    let foreign = TokenSigner::new("someone-else", 1800)
        .issue("acc-1", "editor")
        .unwrap();
    let (status, _) = app
        .send(Method::DELETE, "/locationpage/any", Some(&foreign), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn reads_are_public() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/homepage").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "HomePage document not found");
}
