pub mod document;
pub mod error;

pub use document::{Document, ID_FIELD};
pub use error::{CmsError, Result};
