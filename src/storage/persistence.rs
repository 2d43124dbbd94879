//! Snapshot persistence for collections.
//!
//! Each collection lives in `<dir>/<name>.json`. Saves write a sibling temp file,
//! fsync it and rename it over the target, so readers never see a torn file.

use super::collection::{Collection, validate_collection_name};
use crate::core::{CmsError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

const SNAPSHOT_VERSION: u32 = 1;
const SNAPSHOT_EXTENSION: &str = "json";

#[derive(Debug, Serialize, Deserialize)]
pub struct CollectionSnapshot {
    pub version: u32,
    pub collection: Collection,
    pub metadata: SnapshotMetadata,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub saved_at: i64,
    pub document_count: usize,
}

impl CollectionSnapshot {
    pub fn new(collection: Collection) -> Self {
        let document_count = collection.len();
        Self {
            version: SNAPSHOT_VERSION,
            collection,
            metadata: SnapshotMetadata {
                saved_at: chrono::Utc::now().timestamp_millis(),
                document_count,
            },
        }
    }
}

// ============================================================================
// Snapshot Manager
// ============================================================================

#[derive(Debug, Clone)]
pub struct SnapshotManager {
    dir: PathBuf,
}

impl SnapshotManager {
    /// Opens (and creates when missing) the snapshot directory.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| {
            CmsError::store(format!(
                "Failed to create data directory {}: {}",
                dir.display(),
                e
            ))
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{SNAPSHOT_EXTENSION}"))
    }

    pub fn save(&self, collection: &Collection) -> Result<()> {
        validate_collection_name(collection.name())?;
        let snapshot = CollectionSnapshot::new(collection.clone());
        let serialized = serde_json::to_vec_pretty(&snapshot)?;

        let mut temp = NamedTempFile::new_in(&self.dir)
            .map_err(|e| CmsError::store(format!("Failed to create temp file: {}", e)))?;
        temp.write_all(&serialized)
            .map_err(|e| CmsError::store(format!("Failed to write snapshot: {}", e)))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| CmsError::store(format!("Failed to sync snapshot: {}", e)))?;
        temp.persist(self.path_for(collection.name()))
            .map_err(|e| CmsError::store(format!("Failed to rename snapshot: {}", e)))?;

        debug!(
            collection = collection.name(),
            documents = collection.len(),
            "snapshot saved"
        );
        Ok(())
    }

    pub fn load(&self, name: &str) -> Result<Option<Collection>> {
        let path = self.path_for(name);
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read(&path)
            .map_err(|e| CmsError::store(format!("Failed to read {}: {}", path.display(), e)))?;
        let snapshot: CollectionSnapshot = serde_json::from_slice(&data).map_err(|e| {
            CmsError::store(format!("Corrupt snapshot {}: {}", path.display(), e))
        })?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(CmsError::store(format!(
                "Unsupported snapshot version {} in {}",
                snapshot.version,
                path.display()
            )));
        }
        Ok(Some(snapshot.collection))
    }

    /// Loads every `*.json` snapshot in the directory.
    pub fn load_all(&self) -> Result<Vec<Collection>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| {
            CmsError::store(format!("Failed to list {}: {}", self.dir.display(), e))
        })?;

        let mut collections = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(SNAPSHOT_EXTENSION) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            if validate_collection_name(name).is_err() {
                warn!(path = %path.display(), "skipping file with invalid collection name");
                continue;
            }
            if let Some(collection) = self.load(name)? {
                collections.push(collection);
            }
        }
        Ok(collections)
    }
}
