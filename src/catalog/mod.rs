//! Document tree import into `SQLite` category hierarchies.
//!
//! This module is organized into:
//! - `core`: Configuration, errors, IDs and hierarchy handles
//! - `normalize`: Name cleanup and conversion of office formats to HTML
//! - `storage`: Schema bootstrap and the `SQLite` category/document stores
//! - `ingest`: Source enumeration, category materialization, title dedupe and byte transfer
//! - `reconcile`: Path-based category matching across hierarchies
//! - `engine`: Job orchestration, run summaries and tree rendering

pub mod core;
pub mod engine;
pub mod ingest;
pub mod normalize;
pub mod reconcile;
pub mod storage;

// Re-export commonly used types for convenience
pub use self::core::{
    CategoryId, ContentJobConfig, ConversionError, ConversionLimits, DocumentId, FileJobConfig,
    Hierarchy, ImportConfig, ImportError, ImportResult, JobConfig, NamingConfig, PayloadKind,
    ProjectionJobConfig, StorageConfig,
};
pub use engine::{CategoryTree, CategoryTreeNode, ImportEngine, JobReport, RunSummary};
pub use ingest::{
    ByteTransfer, EnumerationRules, HierarchyMaterializer, RunState, SourceItem, TitleRegistry,
    UploadsDir, enumerate_sources, reserve_title,
};
pub use normalize::{ContentNormalizer, ContentOutcome, NameNormalizer, SkipReason, SourceFormat};
pub use reconcile::{PathIndex, Reconciliation, build_path_index, mirror_hierarchy, reconcile};
pub use storage::{
    CategoryNode, CategoryStore, DocumentPayload, DocumentStore, NewDocument, SqliteCatalog,
    StoredFile, ensure_all, ensure_schema, open_database,
};
