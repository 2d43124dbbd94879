use super::collection::{Collection, validate_collection_name};
use super::persistence::SnapshotManager;
use super::{DocumentStore, Mutation, Selector};
use crate::core::{CmsError, Document, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

const MEMORY_SCHEME: &str = "memory://";
const FILE_SCHEME: &str = "file://";

/// In-process document store with optional per-collection snapshots.
pub struct MemoryStore {
    /// Each collection carries its own lock; the outer map lock is held only
    /// long enough to look a handle up or register a new one.
    collections: RwLock<HashMap<String, Arc<RwLock<Collection>>>>,
    snapshots: Option<SnapshotManager>,
}

impl MemoryStore {
    /// Volatile store; contents vanish with the process.
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            snapshots: None,
        }
    }

    /// Store backed by snapshot files in `dir`, loading whatever is already there.
    pub fn persistent<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let manager = SnapshotManager::open(dir)?;
        let mut collections = HashMap::new();
        for collection in manager.load_all()? {
            info!(
                collection = collection.name(),
                documents = collection.len(),
                "collection restored"
            );
            collections.insert(
                collection.name().to_string(),
                Arc::new(RwLock::new(collection)),
            );
        }
        Ok(Self {
            collections: RwLock::new(collections),
            snapshots: Some(manager),
        })
    }

    /// Opens a store from a connection string.
    ///
    /// Supported forms are `memory://` and `file://<directory>`.
    pub fn open(url: &str) -> Result<Self> {
        if url == MEMORY_SCHEME || url == "memory" {
            return Ok(Self::new());
        }
        if let Some(dir) = url.strip_prefix(FILE_SCHEME) {
            if dir.is_empty() {
                return Err(CmsError::store("file:// store URL needs a directory"));
            }
            return Self::persistent(dir);
        }
        Err(CmsError::store(format!(
            "Invalid STORE_URL '{url}': must start with \"memory://\" or \"file://\""
        )))
    }

    pub fn is_persistent(&self) -> bool {
        self.snapshots.is_some()
    }

    async fn existing(&self, name: &str) -> Option<Arc<RwLock<Collection>>> {
        self.collections.read().await.get(name).cloned()
    }

    async fn get_or_create(&self, name: &str) -> Result<Arc<RwLock<Collection>>> {
        if let Some(handle) = self.existing(name).await {
            return Ok(handle);
        }
        validate_collection_name(name)?;
        let mut collections = self.collections.write().await;
        let handle = collections
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(Collection::new(name))))
            .clone();
        Ok(handle)
    }

    /// Persists `next` before it becomes visible, so a failed write leaves
    /// memory and disk in agreement.
    ///
    /// The file write and fsync run on the blocking pool; only the calling
    /// request waits for them, behind the collection's async lock.
    async fn persist(&self, next: Collection) -> Result<Collection> {
        let Some(manager) = self.snapshots.clone() else {
            return Ok(next);
        };
        let name = next.name().to_string();
        let saved = tokio::task::spawn_blocking(move || manager.save(&next).map(|()| next))
            .await
            .map_err(CmsError::from)
            .and_then(|result| result);
        saved.map_err(|err| {
            error!(collection = %name, error = %err, "snapshot write failed");
            err
        })
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, collection: &str, doc: Document) -> Result<Document> {
        let handle = self.get_or_create(collection).await?;
        let mut guard = handle.write().await;

        let mut next = guard.clone();
        let stored = next.insert(doc)?;
        *guard = self.persist(next).await?;

        debug!(collection, id = ?stored.get(crate::core::ID_FIELD), "document inserted");
        Ok(stored)
    }

    async fn find(&self, collection: &str, selector: &Selector) -> Result<Option<Document>> {
        let Some(handle) = self.existing(collection).await else {
            return Ok(None);
        };
        let guard = handle.read().await;
        Ok(guard.get(selector).cloned())
    }

    async fn find_all(&self, collection: &str) -> Result<Vec<Document>> {
        let Some(handle) = self.existing(collection).await else {
            return Ok(Vec::new());
        };
        let guard = handle.read().await;
        Ok(guard.documents().to_vec())
    }

    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Option<Document>> {
        let Some(handle) = self.existing(collection).await else {
            return Ok(None);
        };
        let guard = handle.read().await;
        Ok(guard.find_by_field(field, value).cloned())
    }

    async fn apply(
        &self,
        collection: &str,
        selector: &Selector,
        mutations: Vec<Mutation>,
    ) -> Result<Option<Document>> {
        let Some(handle) = self.existing(collection).await else {
            return Ok(None);
        };
        let mut guard = handle.write().await;
        let Some(index) = guard.position(selector) else {
            return Ok(None);
        };

        let updated = guard.preview(index, &mutations)?;
        if self.is_persistent() {
            let mut next = guard.clone();
            next.replace(index, updated.clone());
            *guard = self.persist(next).await?;
        } else {
            guard.replace(index, updated.clone());
        }

        debug!(collection, %selector, mutations = mutations.len(), "document updated");
        Ok(Some(updated))
    }

    async fn remove(&self, collection: &str, selector: &Selector) -> Result<Option<Document>> {
        let Some(handle) = self.existing(collection).await else {
            return Ok(None);
        };
        let mut guard = handle.write().await;
        let Some(index) = guard.position(selector) else {
            return Ok(None);
        };

        let mut next = guard.clone();
        let removed = next.remove(index);
        *guard = self.persist(next).await?;

        debug!(collection, %selector, "document removed");
        Ok(Some(removed))
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let Some(handle) = self.existing(collection).await else {
            return Ok(0);
        };
        let guard = handle.read().await;
        Ok(guard.len())
    }
}
