//! Document store.
//!
//! Collections are ordered lists of JSON documents. Every write goes through
//! [`DocumentStore::apply`], which runs a batch of [`Mutation`]s against one
//! document while the owning collection is write-locked, so a partial update or
//! list mutation is never interleaved with another writer on the same collection.

pub mod collection;
pub mod memory;
pub mod persistence;

pub use collection::{Collection, validate_collection_name};
pub use memory::MemoryStore;
pub use persistence::SnapshotManager;

use crate::core::{Document, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

/// Well-known `_id` of the single document backing a singleton page.
pub const SINGLETON_ID: &str = "main";

/// How a write or read picks its target document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// The document stored under [`SINGLETON_ID`].
    Singleton,
    /// The document with this `_id`.
    Id(String),
    /// The n-th document in insertion order.
    Index(usize),
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Singleton => f.write_str(SINGLETON_ID),
            Selector::Id(id) => write!(f, "id {id}"),
            Selector::Index(index) => write!(f, "index {index}"),
        }
    }
}

/// A single-document write instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Assign each value at its dotted path.
    SetPaths(Vec<(String, Value)>),
    /// Append an entry to the array at `list`.
    Push { list: String, entry: Value },
    /// Merge `fields` into the entry of `list` whose `_id` is `id`.
    MergeEntry {
        list: String,
        id: String,
        fields: Document,
    },
    /// Remove the entry of `list` whose `_id` is `id`.
    PullEntry { list: String, id: String },
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Stores `doc`, assigning an `_id` when it has none.
    async fn insert(&self, collection: &str, doc: Document) -> Result<Document>;

    async fn find(&self, collection: &str, selector: &Selector) -> Result<Option<Document>>;

    async fn find_all(&self, collection: &str) -> Result<Vec<Document>>;

    /// First document whose top-level `field` equals `value`.
    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Option<Document>>;

    /// Applies `mutations` in order as one atomic write.
    ///
    /// Returns `Ok(None)` when no document matches `selector`. If any mutation
    /// fails the document is left untouched.
    async fn apply(
        &self,
        collection: &str,
        selector: &Selector,
        mutations: Vec<Mutation>,
    ) -> Result<Option<Document>>;

    /// Removes and returns the selected document.
    async fn remove(&self, collection: &str, selector: &Selector) -> Result<Option<Document>>;

    async fn count(&self, collection: &str) -> Result<usize>;
}
