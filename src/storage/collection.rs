use super::{Mutation, SINGLETON_ID, Selector};
use crate::core::document::{
    self, Document, ID_FIELD, entry_has_id, ensure_entry_ids, list_mut, set_path,
};
use crate::core::{CmsError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

lazy_static! {
    static ref COLLECTION_NAME: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,63}$").unwrap();
}

/// Collection names double as snapshot file names.
pub fn validate_collection_name(name: &str) -> Result<()> {
    if COLLECTION_NAME.is_match(name) {
        Ok(())
    } else {
        Err(CmsError::validation(format!(
            "Invalid collection name '{name}': use letters, digits and underscores (max 64)"
        )))
    }
}

/// Ordered set of documents sharing one name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Collection {
    name: String,
    documents: Vec<Document>,
}

impl Collection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documents: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn position(&self, selector: &Selector) -> Option<usize> {
        match selector {
            Selector::Singleton => self.position_of_id(SINGLETON_ID),
            Selector::Id(id) => self.position_of_id(id),
            Selector::Index(index) => (*index < self.documents.len()).then_some(*index),
        }
    }

    fn position_of_id(&self, id: &str) -> Option<usize> {
        self.documents
            .iter()
            .position(|doc| document::document_id(doc) == Some(id))
    }

    pub fn get(&self, selector: &Selector) -> Option<&Document> {
        self.position(selector).map(|index| &self.documents[index])
    }

    pub fn find_by_field(&self, field: &str, value: &Value) -> Option<&Document> {
        self.documents.iter().find(|doc| doc.get(field) == Some(value))
    }

    /// Appends `doc`, assigning an `_id` when absent. Duplicate ids are rejected.
    pub fn insert(&mut self, mut doc: Document) -> Result<Document> {
        let id = match document::document_id(&doc) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                let id = document::new_id();
                doc.insert(ID_FIELD.to_string(), Value::String(id.clone()));
                id
            }
        };

        if self.position_of_id(&id).is_some() {
            return Err(CmsError::Conflict(format!(
                "Document '{id}' already exists in '{}'",
                self.name
            )));
        }

        self.documents.push(doc.clone());
        Ok(doc)
    }

    /// Applies `mutations` to a copy of the document at `index` and returns it
    /// without committing. Callers commit with [`Collection::replace`].
    pub fn preview(&self, index: usize, mutations: &[Mutation]) -> Result<Document> {
        let mut doc = self.documents[index].clone();
        for mutation in mutations {
            apply_mutation(&mut doc, mutation)?;
        }
        Ok(doc)
    }

    pub fn replace(&mut self, index: usize, doc: Document) {
        self.documents[index] = doc;
    }

    pub fn remove(&mut self, index: usize) -> Document {
        self.documents.remove(index)
    }
}

fn apply_mutation(doc: &mut Document, mutation: &Mutation) -> Result<()> {
    match mutation {
        Mutation::SetPaths(assignments) => {
            for (path, value) in assignments {
                if path == ID_FIELD {
                    return Err(CmsError::validation("'_id' cannot be modified"));
                }
                set_path(doc, path, value.clone())?;
            }
            Ok(())
        }
        Mutation::Push { list, entry } => {
            let mut entry = entry.clone();
            ensure_entry_ids(std::slice::from_mut(&mut entry));
            list_mut(doc, list)?.push(entry);
            Ok(())
        }
        Mutation::MergeEntry { list, id, fields } => {
            let target = list_mut(doc, list)?
                .iter_mut()
                .find(|entry| entry_has_id(entry, id))
                .and_then(Value::as_object_mut)
                .ok_or_else(|| CmsError::not_found(format!("Entry '{id}' not found in '{list}'")))?;
            for (key, value) in fields {
                if key != ID_FIELD {
                    target.insert(key.clone(), value.clone());
                }
            }
            Ok(())
        }
        Mutation::PullEntry { list, id } => {
            let entries = list_mut(doc, list)?;
            let before = entries.len();
            entries.retain(|entry| !entry_has_id(entry, id));
            if entries.len() == before {
                return Err(CmsError::not_found(format!(
                    "Entry '{id}' not found in '{list}'"
                )));
            }
            Ok(())
        }
    }
}
