//! Page content: schemas, partial updates, embedded lists.

pub mod lists;
pub mod patch;
pub mod schema;
pub mod service;

pub use lists::{ListAction, ListRequest};
pub use patch::SectionPatch;
pub use schema::{Addressing, FieldPolicy, PageKind, PageSchema};
pub use service::PageService;
