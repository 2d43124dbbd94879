//! Embedded-list mutation requests.
//!
//! Every list endpoint takes `{ "action": ..., "<itemKey>": { ... } }`. A request
//! is planned into exactly one store [`Mutation`], so the change happens on the
//! element itself rather than by rewriting the whole array.

use super::schema::{FieldPolicy, ListSpec};
use crate::core::document::ID_FIELD;
use crate::core::{CmsError, Document, Result};
use crate::storage::Mutation;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

pub const INVALID_ACTION: &str = "Invalid action";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListAction {
    Add,
    Edit,
    Delete,
    Status,
}

impl FromStr for ListAction {
    type Err = CmsError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw {
            "add" => Ok(Self::Add),
            "edit" => Ok(Self::Edit),
            "delete" => Ok(Self::Delete),
            "status" => Ok(Self::Status),
            _ => Err(CmsError::validation(INVALID_ACTION)),
        }
    }
}

impl fmt::Display for ListAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "add",
            Self::Edit => "edit",
            Self::Delete => "delete",
            Self::Status => "status",
        })
    }
}

/// A list request with the item already pulled out from under its key.
#[derive(Debug, Clone, Default)]
pub struct ListRequest {
    pub action: Option<String>,
    pub item: Option<Value>,
}

impl ListRequest {
    pub fn new(action: impl Into<String>, item: Value) -> Self {
        Self {
            action: Some(action.into()),
            item: Some(item),
        }
    }

    /// Reads `action` and the item stored under `item_key` from a request body.
    pub fn from_body(mut body: Document, item_key: &str) -> Self {
        let action = match body.remove("action") {
            Some(Value::String(action)) => Some(action),
            _ => None,
        };
        Self {
            action,
            item: body.remove(item_key),
        }
    }
}

/// Turns a request into the single mutation that carries it out.
pub fn plan(
    spec: &ListSpec,
    policy: FieldPolicy,
    request: ListRequest,
) -> Result<(ListAction, Mutation)> {
    let action: ListAction = request
        .action
        .as_deref()
        .ok_or_else(|| CmsError::validation(INVALID_ACTION))?
        .parse()?;

    let mut item = match request.item {
        Some(Value::Object(item)) => item,
        Some(_) => {
            return Err(CmsError::validation(format!(
                "'{}' must be an object",
                spec.item_key
            )));
        }
        None => {
            return Err(CmsError::validation(format!("'{}' is required", spec.item_key)));
        }
    };

    let mutation = match action {
        ListAction::Add => {
            // Ids are always server assigned on add.
            item.remove(ID_FIELD);
            check_fields(spec, policy, &item)?;
            if let Some(flag) = spec.status_flag {
                item.entry(flag.to_string()).or_insert(Value::Bool(false));
            }
            Mutation::Push {
                list: spec.path.to_string(),
                entry: Value::Object(item),
            }
        }
        ListAction::Edit => {
            if !spec.editable {
                return Err(CmsError::validation(INVALID_ACTION));
            }
            let id = take_id(spec, action, &mut item)?;
            check_fields(spec, policy, &item)?;
            if item.is_empty() {
                return Err(CmsError::validation(format!(
                    "Nothing to update in '{}'",
                    spec.item_key
                )));
            }
            Mutation::MergeEntry {
                list: spec.path.to_string(),
                id,
                fields: item,
            }
        }
        ListAction::Delete => {
            let id = take_id(spec, action, &mut item)?;
            Mutation::PullEntry {
                list: spec.path.to_string(),
                id,
            }
        }
        ListAction::Status => {
            let flag = spec
                .status_flag
                .ok_or_else(|| CmsError::validation(INVALID_ACTION))?;
            let id = take_id(spec, action, &mut item)?;
            let value = match item.get(flag) {
                Some(Value::Bool(value)) => *value,
                _ => {
                    return Err(CmsError::validation(format!("'{flag}' must be true or false")));
                }
            };
            let mut fields = Document::new();
            fields.insert(flag.to_string(), Value::Bool(value));
            Mutation::MergeEntry {
                list: spec.path.to_string(),
                id,
                fields,
            }
        }
    };

    Ok((action, mutation))
}

fn take_id(spec: &ListSpec, action: ListAction, item: &mut Document) -> Result<String> {
    match item.remove(ID_FIELD) {
        Some(Value::String(id)) if !id.is_empty() => Ok(id),
        _ => Err(CmsError::validation(format!(
            "{} _id is required for {action}",
            spec.item_key
        ))),
    }
}

fn check_fields(spec: &ListSpec, policy: FieldPolicy, item: &Document) -> Result<()> {
    if policy == FieldPolicy::Open {
        return Ok(());
    }
    match item.keys().find(|key| !spec.allows_field(key)) {
        Some(unknown) => Err(CmsError::validation(format!(
            "Unknown field '{unknown}' for {}",
            spec.item_key
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::schema::{CONTACT_US, MICA};
    use serde_json::json;

    fn points() -> &'static ListSpec {
        MICA.list("sectionTwo.points").unwrap()
    }

    fn enquiries() -> &'static ListSpec {
        CONTACT_US.list("enquiryForm").unwrap()
    }

    #[test]
    fn body_item_is_read_from_its_key() {
        let body = json!({ "action": "add", "point": { "point": "x" }, "other": 1 });
        let request = ListRequest::from_body(body.as_object().cloned().unwrap(), "point");
        assert_eq!(request.action.as_deref(), Some("add"));
        assert_eq!(request.item, Some(json!({ "point": "x" })));
    }

    #[test]
    fn add_drops_client_id() {
        let (action, mutation) = plan(
            points(),
            FieldPolicy::Strict,
            ListRequest::new("add", json!({ "_id": "mine", "point": "Heat resistant" })),
        )
        .unwrap();
        assert_eq!(action, ListAction::Add);
        assert_eq!(
            mutation,
            Mutation::Push {
                list: "sectionTwo.points".into(),
                entry: json!({ "point": "Heat resistant" }),
            }
        );
    }

    #[test]
    fn add_defaults_the_status_flag() {
        let (_, mutation) = plan(
            enquiries(),
            FieldPolicy::Strict,
            ListRequest::new("add", json!({ "name": "Asha", "message": "Hello" })),
        )
        .unwrap();
        let Mutation::Push { entry, .. } = mutation else {
            panic!("expected push");
        };
        assert_eq!(entry["isResolved"], json!(false));
    }

    #[test]
    fn edit_is_sparse_and_needs_an_id() {
        let (_, mutation) = plan(
            points(),
            FieldPolicy::Strict,
            ListRequest::new("edit", json!({ "_id": "p1", "point": "Edited" })),
        )
        .unwrap();
        let Mutation::MergeEntry { id, fields, .. } = mutation else {
            panic!("expected merge");
        };
        assert_eq!(id, "p1");
        assert_eq!(Value::Object(fields), json!({ "point": "Edited" }));

        let err = plan(
            points(),
            FieldPolicy::Strict,
            ListRequest::new("edit", json!({ "point": "Edited" })),
        )
        .unwrap_err();
        assert!(err.to_string().contains("_id is required"));

        let err = plan(
            points(),
            FieldPolicy::Strict,
            ListRequest::new("edit", json!({ "_id": "p1" })),
        )
        .unwrap_err();
        assert!(matches!(err, CmsError::Validation(_)));
    }

    #[test]
    fn delete_needs_only_the_id() {
        let (_, mutation) = plan(
            points(),
            FieldPolicy::Strict,
            ListRequest::new("delete", json!({ "_id": "p1" })),
        )
        .unwrap();
        assert_eq!(
            mutation,
            Mutation::PullEntry {
                list: "sectionTwo.points".into(),
                id: "p1".into(),
            }
        );
    }

    #[test]
    fn status_sets_only_the_flag() {
        let (_, mutation) = plan(
            enquiries(),
            FieldPolicy::Strict,
            ListRequest::new(
                "status",
                json!({ "_id": "e1", "isResolved": true, "name": "ignored" }),
            ),
        )
        .unwrap();
        let Mutation::MergeEntry { fields, .. } = mutation else {
            panic!("expected merge");
        };
        assert_eq!(Value::Object(fields), json!({ "isResolved": true }));
    }

    #[test]
    fn status_requires_a_boolean() {
        let err = plan(
            enquiries(),
            FieldPolicy::Strict,
            ListRequest::new("status", json!({ "_id": "e1", "isResolved": "yes" })),
        )
        .unwrap_err();
        assert!(err.to_string().contains("isResolved"));
    }

    #[test]
    fn unsupported_actions_are_invalid() {
        for (spec, action) in [
            (points(), "status"),
            (enquiries(), "edit"),
            (points(), "replace"),
        ] {
            let err = plan(
                spec,
                FieldPolicy::Strict,
                ListRequest::new(action, json!({ "_id": "x" })),
            )
            .unwrap_err();
            assert_eq!(err.to_string(), INVALID_ACTION, "{action}");
        }
    }

    #[test]
    fn missing_item_is_rejected() {
        let request = ListRequest {
            action: Some("add".into()),
            item: None,
        };
        let err = plan(points(), FieldPolicy::Strict, request).unwrap_err();
        assert_eq!(err.to_string(), "'point' is required");
    }

    #[test]
    fn strict_policy_checks_item_fields() {
        let request = ListRequest::new("add", json!({ "colour": "red" }));
        assert!(plan(points(), FieldPolicy::Strict, request.clone()).is_err());
        assert!(plan(points(), FieldPolicy::Open, request).is_ok());
    }
}
