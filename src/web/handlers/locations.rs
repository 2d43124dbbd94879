//! Location listings: flat documents wrapped as `{ message, data }`.

use super::{document_value, envelope};
use crate::content::PageKind;
use crate::core::{Document, Result};
use crate::state::AppState;
use crate::storage::Selector;
use crate::web::error::JsonBody;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde_json::Value;

const KIND: PageKind = PageKind::Location;
const DATA: &str = "data";

pub async fn create_location(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<Document>,
) -> Result<(StatusCode, Json<Value>)> {
    let doc = state.pages.create(KIND, body).await?;
    Ok((
        StatusCode::CREATED,
        envelope("Location added successfully", DATA, document_value(doc)),
    ))
}

pub async fn list_locations(State(state): State<AppState>) -> Result<Json<Value>> {
    let docs = state.pages.list(KIND).await?;
    let data = Value::Array(docs.into_iter().map(document_value).collect());
    Ok(envelope("Locations fetched successfully", DATA, data))
}

pub async fn get_location(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let doc = state.pages.get(KIND, &Selector::Id(id)).await?;
    Ok(envelope("Location fetched successfully", DATA, document_value(doc)))
}

pub async fn patch_location(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(fields): JsonBody<Document>,
) -> Result<Json<Value>> {
    let doc = state.pages.set_fields(KIND, &Selector::Id(id), fields).await?;
    Ok(envelope("Location updated successfully", DATA, document_value(doc)))
}

pub async fn delete_location(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let doc = state.pages.delete(KIND, &Selector::Id(id)).await?;
    Ok(envelope("Location deleted successfully", DATA, document_value(doc)))
}
