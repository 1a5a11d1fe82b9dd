//! Persistent storage for category hierarchies and their documents.

pub mod catalog_store;
pub mod schema;

pub use catalog_store::{
    CategoryNode, CategoryStore, DocumentPayload, DocumentStore, FileMeta, NewDocument,
    SqliteCatalog, StoredFile, TIMESTAMP_FORMAT, now_timestamp,
};
pub use schema::{ensure_all, ensure_schema, open_database};
