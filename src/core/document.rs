//! JSON documents and dotted-path access.
//!
//! A document is a JSON object whose `_id` field is a string. Nested values are
//! addressed with dotted paths (`sectionTwo.points`), the same notation the
//! partial-update protocol sends over the wire.

use super::error::{CmsError, Result};
use serde_json::{Map, Value};
use uuid::Uuid;

pub type Document = Map<String, Value>;

/// Name of the identifier field carried by every document and list entry.
pub const ID_FIELD: &str = "_id";

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn document_id(doc: &Document) -> Option<&str> {
    doc.get(ID_FIELD).and_then(Value::as_str)
}

/// Splits a dotted path, rejecting empty segments such as `a..b` or `.a`.
pub fn split_path(path: &str) -> Result<Vec<&str>> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(CmsError::validation(format!("Invalid field path '{path}'")));
    }
    Ok(segments)
}

pub fn get_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = doc.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Writes `value` at `path`, creating missing intermediate objects.
///
/// Fails when an intermediate value exists but is not an object, since the
/// write would otherwise have to discard it.
pub fn set_path(doc: &mut Document, path: &str, value: Value) -> Result<()> {
    let segments = split_path(path)?;
    let (last, parents) = segments
        .split_last()
        .ok_or_else(|| CmsError::validation("Empty field path"))?;

    let mut current = doc;
    for segment in parents {
        let slot = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if slot.is_null() {
            *slot = Value::Object(Map::new());
        }
        current = slot.as_object_mut().ok_or_else(|| {
            CmsError::validation(format!(
                "Cannot write '{path}': '{segment}' is not an object"
            ))
        })?;
    }
    current.insert(last.to_string(), value);
    Ok(())
}

/// Returns the array at `path`, creating an empty one when absent.
pub fn list_mut<'a>(doc: &'a mut Document, path: &str) -> Result<&'a mut Vec<Value>> {
    let exists = matches!(get_path(doc, path), Some(value) if !value.is_null());
    if !exists {
        set_path(doc, path, Value::Array(Vec::new()))?;
    }

    let mut segments = path.split('.');
    let first = segments.next().unwrap_or_default();
    let mut current = doc
        .get_mut(first)
        .ok_or_else(|| CmsError::store(format!("path '{path}' vanished during write")))?;
    for segment in segments {
        current = current
            .as_object_mut()
            .and_then(|object| object.get_mut(segment))
            .ok_or_else(|| CmsError::store(format!("path '{path}' vanished during write")))?;
    }

    current
        .as_array_mut()
        .ok_or_else(|| CmsError::validation(format!("'{path}' is not a list")))
}

/// Gives every object entry of `list` an `_id` when it has none.
pub fn ensure_entry_ids(list: &mut [Value]) {
    for entry in list.iter_mut() {
        if let Some(object) = entry.as_object_mut() {
            let has_id = matches!(object.get(ID_FIELD), Some(Value::String(id)) if !id.is_empty());
            if !has_id {
                object.insert(ID_FIELD.to_string(), Value::String(new_id()));
            }
        }
    }
}

/// Replaces whatever `_id` each object entry carries with a fresh one.
///
/// Used where a whole list arrives from a client, so ids stay store assigned
/// and unique within the list.
pub fn assign_fresh_ids(list: &mut [Value]) {
    for object in list.iter_mut().filter_map(Value::as_object_mut) {
        object.insert(ID_FIELD.to_string(), Value::String(new_id()));
    }
}

pub fn entry_has_id(entry: &Value, id: &str) -> bool {
    entry
        .as_object()
        .and_then(|object| object.get(ID_FIELD))
        .and_then(Value::as_str)
        == Some(id)
}
