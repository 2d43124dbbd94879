#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use sitecms::{
    AppState, build_router,
    auth::{AccountStore, TokenSigner},
    content::FieldPolicy,
    storage::MemoryStore,
    upload::UploadReceiver,
};
use tempfile::TempDir;
use tower::ServiceExt;

pub const SECRET: &str = "integration-secret";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub upload_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_upload_limit(1024 * 1024).await
    }

    pub async fn with_upload_limit(max_bytes: u64) -> Self {
        let upload_dir = TempDir::new().expect("temp dir");
        let store = Arc::new(MemoryStore::new());
        let uploads = UploadReceiver::new(upload_dir.path(), max_bytes, None);
        uploads.ensure_dirs().await.expect("upload dirs");

        let state = AppState::new(
            store.clone(),
            FieldPolicy::Strict,
            AccountStore::new(store, 4),
            TokenSigner::new(SECRET, 1800),
            uploads,
        );
        Self {
            router: build_router(state.clone()),
            state,
            upload_dir,
        }
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        payload: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match payload {
            Some(payload) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(payload.to_string())
            }
            None => Body::empty(),
        };
        let request = builder.body(body).expect("request should build");
        self.dispatch(request).await
    }

    pub async fn dispatch(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("response expected");
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("response body should be readable");

        if body.is_empty() {
            return (status, Value::Null);
        }

        let json = serde_json::from_slice::<Value>(&body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()));
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None, None).await
    }

    /// Registers an editor account and returns a fresh session token.
    pub async fn login(&self) -> String {
        let credentials = json!({ "username": "editor", "password": "password123" });
        let (status, _) = self
            .send(Method::POST, "/register", None, Some(credentials.clone()))
            .await;
        assert!(
            status == StatusCode::CREATED || status == StatusCode::BAD_REQUEST,
            "unexpected register status {status}"
        );

        let (status, body) = self
            .send(Method::POST, "/login", None, Some(credentials))
            .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().expect("token").to_string()
    }
}
