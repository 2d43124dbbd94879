use crate::core::{CmsError, Result};
use crate::state::AppState;
use crate::upload::MediaKind;
use axum::Json;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::header::HOST;
use axum::http::{HeaderMap, StatusCode};
use futures::StreamExt;
use serde_json::{Map, Value};

pub async fn upload_image(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>> {
    receive(&state, MediaKind::Image, &headers, multipart).await
}

pub async fn upload_video(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>> {
    receive(&state, MediaKind::Video, &headers, multipart).await
}

async fn receive(
    state: &AppState,
    kind: MediaKind,
    headers: &HeaderMap,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>> {
    let mut multipart =
        multipart.map_err(|rejection| CmsError::validation(rejection.body_text()))?;
    let limit = state.uploads.max_bytes();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| multipart_error(err, limit))?
    {
        if field.name() != Some(kind.field_name()) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let chunks = Box::pin(field.map(move |chunk| chunk.map_err(|err| multipart_error(err, limit))));

        let stored = state
            .uploads
            .store(kind, file_name.as_deref(), content_type.as_deref(), chunks)
            .await?;

        let host = headers.get(HOST).and_then(|value| value.to_str().ok());
        let mut body = Map::new();
        body.insert(
            kind.url_key().to_string(),
            Value::String(state.uploads.public_url(&stored, host)),
        );
        return Ok(Json(Value::Object(body)));
    }

    Err(CmsError::validation(kind.missing_message()))
}

fn multipart_error(err: MultipartError, limit: u64) -> CmsError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        CmsError::PayloadTooLarge { limit }
    } else {
        CmsError::validation(format!("Multipart error: {}", err.body_text()))
    }
}
