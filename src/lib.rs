// ============================================================================
// sitecms Library
// ============================================================================

//! Content backend for a marketing site.
//!
//! Page documents (home, about, product pages, contact, locations) live in a
//! [`storage::DocumentStore`] and are edited section by section over HTTP.
//!
//! ```no_run
//! use std::sync::Arc;
//! use sitecms::auth::{AccountStore, TokenSigner};
//! use sitecms::content::FieldPolicy;
//! use sitecms::storage::MemoryStore;
//! use sitecms::upload::UploadReceiver;
//! use sitecms::{AppState, build_router};
//!
//! let store = Arc::new(MemoryStore::new());
//! let state = AppState::new(
//!     store.clone(),
//!     FieldPolicy::Strict,
//!     AccountStore::new(store, 12),
//!     TokenSigner::new("change-me", 1800),
//!     UploadReceiver::new("uploads", 100 * 1024 * 1024, None),
//! );
//! let _app = build_router(state);
//! ```

pub mod auth;
pub mod config;
pub mod content;
pub mod core;
pub mod state;
pub mod storage;
pub mod upload;
pub mod web;

// Re-export main types for convenience
pub use crate::core::{CmsError, Document, Result};
pub use state::AppState;
pub use web::build_router;
