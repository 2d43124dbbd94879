pub mod auth;
pub mod locations;
pub mod pages;
pub mod upload;

use crate::content::PageKind;
use crate::core::{CmsError, Document, Result};
use axum::Json;
use serde_json::{Map, Value};

/// Embedded list served by one `PUT` route.
#[derive(Debug, Clone, Copy)]
pub struct ListRoute {
    pub kind: PageKind,
    pub path: &'static str,
}

impl ListRoute {
    pub const fn new(kind: PageKind, path: &'static str) -> Self {
        Self { kind, path }
    }
}

pub async fn root() -> &'static str {
    "API is running"
}

/// `{ "message": ..., "<key>": payload }`
pub(crate) fn envelope(message: impl Into<String>, key: &str, payload: Value) -> Json<Value> {
    let mut body = Map::new();
    body.insert("message".to_string(), Value::String(message.into()));
    body.insert(key.to_string(), payload);
    Json(Value::Object(body))
}

pub(crate) fn document_value(doc: Document) -> Value {
    Value::Object(doc)
}

pub(crate) fn parse_index(raw: &str) -> Result<usize> {
    raw.parse::<usize>()
        .map_err(|_| CmsError::validation(format!("Invalid index '{raw}'")))
}
