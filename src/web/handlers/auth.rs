use crate::core::{CmsError, Result};
use crate::state::AppState;
use crate::web::error::JsonBody;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Credentials {
    fn required(self) -> Result<(String, String)> {
        match (self.username, self.password) {
            (Some(username), Some(password)) => Ok((username, password)),
            _ => Err(CmsError::validation("username and password are required")),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
}

pub async fn register(
    State(state): State<AppState>,
    JsonBody(credentials): JsonBody<Credentials>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    let (username, password) = credentials.required()?;
    state.accounts.register(&username, &password).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "User registered successfully".to_string(),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    JsonBody(credentials): JsonBody<Credentials>,
) -> Result<Json<LoginResponse>> {
    let (username, password) = credentials.required()?;
    let account = state.accounts.authenticate(&username, &password).await?;
    let token = state.tokens.issue(account.id(), account.username())?;
    info!(username = account.username(), "login succeeded");
    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token,
    }))
}
