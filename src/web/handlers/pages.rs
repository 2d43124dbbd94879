use super::{ListRoute, document_value, envelope, parse_index};
use crate::content::{PageKind, SectionPatch};
use crate::core::{Document, Result};
use crate::state::AppState;
use crate::storage::Selector;
use crate::web::error::JsonBody;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde_json::Value;

pub async fn create_page(
    State(state): State<AppState>,
    Extension(kind): Extension<PageKind>,
    JsonBody(body): JsonBody<Document>,
) -> Result<(StatusCode, Json<Value>)> {
    let schema = kind.schema();
    let doc = state.pages.create(kind, body).await?;
    Ok((
        StatusCode::CREATED,
        envelope(
            format!("{} initial data created successfully", schema.label),
            schema.response_key,
            document_value(doc),
        ),
    ))
}

// ---------------------------------------------------------------------------
// Singleton pages
// ---------------------------------------------------------------------------

pub async fn get_singleton(
    State(state): State<AppState>,
    Extension(kind): Extension<PageKind>,
) -> Result<Json<Document>> {
    let doc = state.pages.get(kind, &Selector::Singleton).await?;
    Ok(Json(doc))
}

pub async fn patch_singleton(
    State(state): State<AppState>,
    Extension(kind): Extension<PageKind>,
    JsonBody(patch): JsonBody<SectionPatch>,
) -> Result<Json<Document>> {
    let doc = state.pages.patch(kind, &Selector::Singleton, patch).await?;
    Ok(Json(doc))
}

pub async fn mutate_singleton_list(
    State(state): State<AppState>,
    Extension(route): Extension<ListRoute>,
    JsonBody(body): JsonBody<Document>,
) -> Result<Json<Document>> {
    let doc = state
        .pages
        .mutate_list(route.kind, &Selector::Singleton, route.path, body)
        .await?;
    Ok(Json(doc))
}

// ---------------------------------------------------------------------------
// Pages addressed by position
// ---------------------------------------------------------------------------

pub async fn get_indexed(
    State(state): State<AppState>,
    Extension(kind): Extension<PageKind>,
    Path(index): Path<String>,
) -> Result<Json<Document>> {
    let selector = Selector::Index(parse_index(&index)?);
    let doc = state.pages.get(kind, &selector).await?;
    Ok(Json(doc))
}

pub async fn patch_indexed(
    State(state): State<AppState>,
    Extension(kind): Extension<PageKind>,
    Path(index): Path<String>,
    JsonBody(patch): JsonBody<SectionPatch>,
) -> Result<Json<Value>> {
    let selector = Selector::Index(parse_index(&index)?);
    let doc = state.pages.patch(kind, &selector, patch).await?;
    Ok(envelope(
        "Section updated successfully",
        "product",
        document_value(doc),
    ))
}

pub async fn mutate_indexed_list(
    State(state): State<AppState>,
    Extension(route): Extension<ListRoute>,
    Path(index): Path<String>,
    JsonBody(body): JsonBody<Document>,
) -> Result<Json<Document>> {
    let selector = Selector::Index(parse_index(&index)?);
    let doc = state
        .pages
        .mutate_list(route.kind, &selector, route.path, body)
        .await?;
    Ok(Json(doc))
}

// ---------------------------------------------------------------------------
// Pages addressed by id
// ---------------------------------------------------------------------------

pub async fn list_pages(
    State(state): State<AppState>,
    Extension(kind): Extension<PageKind>,
) -> Result<Json<Vec<Document>>> {
    Ok(Json(state.pages.list(kind).await?))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    Extension(kind): Extension<PageKind>,
    Path(id): Path<String>,
) -> Result<Json<Document>> {
    let doc = state.pages.get(kind, &Selector::Id(id)).await?;
    Ok(Json(doc))
}

/// Takes either `sectionName + data` or a flat body of whole sections.
pub async fn patch_by_id(
    State(state): State<AppState>,
    Extension(kind): Extension<PageKind>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<Document>,
) -> Result<Json<Value>> {
    let doc = state.pages.update(kind, &Selector::Id(id), body).await?;
    Ok(envelope(
        "Document updated successfully",
        "product",
        document_value(doc),
    ))
}

pub async fn delete_by_id(
    State(state): State<AppState>,
    Extension(kind): Extension<PageKind>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let schema = kind.schema();
    let doc = state.pages.delete(kind, &Selector::Id(id)).await?;
    Ok(envelope(
        format!("{} deleted successfully", schema.label),
        schema.response_key,
        document_value(doc),
    ))
}
