//! tenantdb Document — document-store repository.
//!
//! [`DocumentRepository`] implements the generic repository contract over a
//! [`Collection`] driver. Entities are stored as JSON-like documents whose
//! logical `id` lives in the native `_id` key, and every query document is
//! produced by the tenant-scoping serializer.

pub mod codec;
pub mod collection;
pub mod repository;

pub use collection::{Collection, FindOptions};
pub use repository::DocumentRepository;
