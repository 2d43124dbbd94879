use super::lists::{self, ListRequest};
use super::patch::{self, SectionPatch, prepare_section_value};
use super::schema::{Addressing, FieldPolicy, PageKind, PageSchema};
use crate::core::document::{self, ID_FIELD};
use crate::core::{CmsError, Document, Result};
use crate::storage::{DocumentStore, Mutation, SINGLETON_ID, Selector};
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

const CREATED_AT: &str = "createdAt";
const UPDATED_AT: &str = "updatedAt";

/// Page operations over any [`DocumentStore`].
#[derive(Clone)]
pub struct PageService {
    store: Arc<dyn DocumentStore>,
    policy: FieldPolicy,
}

impl PageService {
    pub fn new(store: Arc<dyn DocumentStore>, policy: FieldPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> FieldPolicy {
        self.policy
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Stores a new page document built from `body`.
    ///
    /// Singleton kinds are stored under the well-known id, so a second create
    /// fails with a conflict instead of producing a shadow copy.
    pub async fn create(&self, kind: PageKind, body: Document) -> Result<Document> {
        let schema = kind.schema();
        let mut doc = Document::new();

        for (key, mut value) in body {
            if key == ID_FIELD {
                continue;
            }
            if !schema.has_root_field(&key) {
                match schema.section(&key) {
                    Some(section) => {
                        prepare_section_value(schema, self.policy, section, &mut value)?
                    }
                    None if self.policy == FieldPolicy::Strict => {
                        return Err(CmsError::validation(format!(
                            "Unknown field '{key}' for {}",
                            schema.label
                        )));
                    }
                    None => {}
                }
            }
            doc.insert(key, value);
        }

        apply_status_defaults(schema, &mut doc);
        if schema.addressing == Addressing::Singleton {
            doc.insert(ID_FIELD.to_string(), Value::String(SINGLETON_ID.to_string()));
        }
        if schema.timestamps {
            let now = Value::String(timestamp());
            doc.insert(CREATED_AT.to_string(), now.clone());
            doc.insert(UPDATED_AT.to_string(), now);
        }

        let stored = match self.store.insert(schema.collection, doc).await {
            Err(CmsError::Conflict(_)) => {
                return Err(CmsError::Conflict(format!(
                    "{} document already exists",
                    schema.label
                )));
            }
            other => other?,
        };
        info!(page = %kind, id = ?document::document_id(&stored), "page created");
        Ok(stored)
    }

    pub async fn get(&self, kind: PageKind, selector: &Selector) -> Result<Document> {
        let schema = kind.schema();
        self.store
            .find(schema.collection, selector)
            .await?
            .ok_or_else(|| CmsError::not_found(schema.missing_message(selector)))
    }

    pub async fn list(&self, kind: PageKind) -> Result<Vec<Document>> {
        self.store.find_all(kind.schema().collection).await
    }

    /// Applies a `sectionName + data` partial update.
    pub async fn patch(
        &self,
        kind: PageKind,
        selector: &Selector,
        section_patch: SectionPatch,
    ) -> Result<Document> {
        let schema = kind.schema();
        let assignments = patch::resolve_section(schema, self.policy, section_patch)?;
        if assignments.is_empty() {
            return self.get(kind, selector).await;
        }
        self.write(schema, selector, vec![Mutation::SetPaths(assignments)])
            .await
    }

    /// Applies a flat update whose keys are root fields or whole sections.
    pub async fn set_fields(
        &self,
        kind: PageKind,
        selector: &Selector,
        fields: Document,
    ) -> Result<Document> {
        let schema = kind.schema();
        let assignments = patch::resolve_root(schema, self.policy, fields)?;
        self.write(schema, selector, vec![Mutation::SetPaths(assignments)])
            .await
    }

    /// Accepts either update protocol, picked by the presence of `sectionName`.
    pub async fn update(
        &self,
        kind: PageKind,
        selector: &Selector,
        body: Document,
    ) -> Result<Document> {
        if body.contains_key("sectionName") {
            let section_patch: SectionPatch = serde_json::from_value(Value::Object(body))
                .map_err(|_| CmsError::validation(patch::SECTION_AND_DATA_REQUIRED))?;
            self.patch(kind, selector, section_patch).await
        } else {
            self.set_fields(kind, selector, body).await
        }
    }

    /// Runs an `action + item` request against the embedded list at `list_path`.
    pub async fn mutate_list(
        &self,
        kind: PageKind,
        selector: &Selector,
        list_path: &str,
        body: Document,
    ) -> Result<Document> {
        let schema = kind.schema();
        let spec = schema.list(list_path).ok_or_else(|| {
            CmsError::store(format!("{} has no list '{list_path}'", schema.label))
        })?;

        let request = ListRequest::from_body(body, spec.item_key);
        let (action, mutation) = lists::plan(spec, self.policy, request)?;
        debug!(page = %kind, list = list_path, %action, "list mutation");

        self.write(schema, selector, vec![mutation]).await
    }

    pub async fn delete(&self, kind: PageKind, selector: &Selector) -> Result<Document> {
        let schema = kind.schema();
        let removed = self
            .store
            .remove(schema.collection, selector)
            .await?
            .ok_or_else(|| CmsError::not_found(schema.missing_message(selector)))?;
        info!(page = %kind, %selector, "page deleted");
        Ok(removed)
    }

    async fn write(
        &self,
        schema: &PageSchema,
        selector: &Selector,
        mut mutations: Vec<Mutation>,
    ) -> Result<Document> {
        if schema.timestamps {
            mutations.push(Mutation::SetPaths(vec![(
                UPDATED_AT.to_string(),
                Value::String(timestamp()),
            )]));
        }
        self.store
            .apply(schema.collection, selector, mutations)
            .await?
            .ok_or_else(|| CmsError::not_found(schema.missing_message(selector)))
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Entries of flagged lists supplied at creation start out unresolved.
fn apply_status_defaults(schema: &PageSchema, doc: &mut Document) {
    for list in schema.lists {
        let Some(flag) = list.status_flag else {
            continue;
        };
        if !matches!(document::get_path(doc, list.path), Some(Value::Array(_))) {
            continue;
        }
        if let Ok(entries) = document::list_mut(doc, list.path) {
            for entry in entries.iter_mut().filter_map(Value::as_object_mut) {
                entry
                    .entry(flag.to_string())
                    .or_insert(Value::Bool(false));
            }
        }
    }
}
