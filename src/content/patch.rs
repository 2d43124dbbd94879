//! Partial-update resolution.
//!
//! A request `{ "sectionName": "sectionTwo", "data": { "title": "New" } }`
//! becomes the assignment list `[("sectionTwo.title", "New")]`, which the store
//! applies to one document in a single write. Fields not named in `data` are
//! left as they are.

use super::schema::{FieldPolicy, PageSchema, SectionShape, SectionSpec};
use crate::core::document::{ID_FIELD, assign_fresh_ids};
use crate::core::{CmsError, Document, Result};
use serde::Deserialize;
use serde_json::Value;

pub const SECTION_AND_DATA_REQUIRED: &str = "sectionName and data are required";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionPatch {
    pub section_name: Option<String>,
    pub data: Option<Value>,
}

impl SectionPatch {
    pub fn new(section_name: impl Into<String>, data: Value) -> Self {
        Self {
            section_name: Some(section_name.into()),
            data: Some(data),
        }
    }
}

pub type Assignments = Vec<(String, Value)>;

/// Resolves a section patch into dotted-path assignments.
///
/// An empty `data` object resolves to no assignments; the write then leaves
/// the document as it is and returns it.
pub fn resolve_section(
    schema: &PageSchema,
    policy: FieldPolicy,
    patch: SectionPatch,
) -> Result<Assignments> {
    let section = patch
        .section_name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| CmsError::validation(SECTION_AND_DATA_REQUIRED))?;
    let data = match patch.data {
        Some(Value::Object(data)) => data,
        _ => return Err(CmsError::validation(SECTION_AND_DATA_REQUIRED)),
    };
    if section == ID_FIELD {
        return Err(CmsError::validation("'_id' cannot be modified"));
    }

    if policy == FieldPolicy::Strict {
        let spec = schema.section(&section).ok_or_else(|| {
            CmsError::validation(format!("Unknown section '{section}' for {}", schema.label))
        })?;
        if spec.shape == SectionShape::List {
            return Err(CmsError::validation(format!(
                "Section '{section}' is a list; change its entries through the list endpoint"
            )));
        }
        if let Some(unknown) = data.keys().find(|key| !spec.fields.contains(&key.as_str())) {
            return Err(CmsError::validation(format!(
                "Unknown field '{unknown}' in section '{section}'"
            )));
        }
    }

    let mut assignments = Vec::with_capacity(data.len());
    for (key, mut value) in data {
        if key.is_empty() {
            return Err(CmsError::validation("Field names must not be empty"));
        }
        let path = format!("{section}.{key}");
        prepare_list_value(schema, policy, &path, &mut value)?;
        assignments.push((path, value));
    }
    Ok(assignments)
}

/// Resolves a flat body into top-level assignments.
///
/// Keys are root fields (`title`, `isNewProductPage`) or whole sections, which
/// replace the stored section wholesale.
pub fn resolve_root(
    schema: &PageSchema,
    policy: FieldPolicy,
    fields: Document,
) -> Result<Assignments> {
    if fields.is_empty() {
        return Err(CmsError::validation("Updated document data is required"));
    }

    let mut assignments = Vec::with_capacity(fields.len());
    for (key, mut value) in fields {
        if key == ID_FIELD {
            return Err(CmsError::validation("'_id' cannot be modified"));
        }
        if key.is_empty() || key.contains('.') {
            return Err(CmsError::validation(format!("Invalid field name '{key}'")));
        }
        if !schema.has_root_field(&key) {
            match schema.section(&key) {
                Some(section) => prepare_section_value(schema, policy, section, &mut value)?,
                None if policy == FieldPolicy::Strict => {
                    return Err(CmsError::validation(format!(
                        "Unknown field '{key}' for {}",
                        schema.label
                    )));
                }
                None => {}
            }
        }
        assignments.push((key, value));
    }
    Ok(assignments)
}

/// Checks a whole-section value and assigns ids to the lists it carries.
pub(crate) fn prepare_section_value(
    schema: &PageSchema,
    policy: FieldPolicy,
    section: &SectionSpec,
    value: &mut Value,
) -> Result<()> {
    match section.shape {
        SectionShape::List => prepare_list_value(schema, policy, section.name, value),
        SectionShape::Group => {
            let Value::Object(group) = value else {
                if policy == FieldPolicy::Strict && !value.is_null() {
                    return Err(CmsError::validation(format!(
                        "Section '{}' must be an object",
                        section.name
                    )));
                }
                return Ok(());
            };
            for (key, field) in group.iter_mut() {
                if policy == FieldPolicy::Strict && !section.fields.contains(&key.as_str()) {
                    return Err(CmsError::validation(format!(
                        "Unknown field '{key}' in section '{}'",
                        section.name
                    )));
                }
                prepare_list_value(schema, policy, &format!("{}.{key}", section.name), field)?;
            }
            Ok(())
        }
    }
}

/// Replacing a whole declared list is allowed; its entries get fresh ids and, under the
/// strict policy, their fields are checked like list `add` items.
fn prepare_list_value(
    schema: &PageSchema,
    policy: FieldPolicy,
    path: &str,
    value: &mut Value,
) -> Result<()> {
    let Some(list) = schema.list(path) else {
        return Ok(());
    };
    let Value::Array(entries) = value else {
        if policy == FieldPolicy::Strict {
            return Err(CmsError::validation(format!("'{path}' must be a list")));
        }
        return Ok(());
    };

    if policy == FieldPolicy::Strict {
        for entry in entries.iter() {
            let object = entry.as_object().ok_or_else(|| {
                CmsError::validation(format!("Entries of '{path}' must be objects"))
            })?;
            if let Some(unknown) = object
                .keys()
                .find(|key| key.as_str() != ID_FIELD && !list.allows_field(key))
            {
                return Err(CmsError::validation(format!(
                    "Unknown field '{unknown}' in '{path}' entry"
                )));
            }
        }
    }
    assign_fresh_ids(entries);
    Ok(())
}
