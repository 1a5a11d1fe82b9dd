//! Ingestion: enumeration, materialization, deduplication and byte transfer.

pub mod dedupe;
pub mod enumerator;
pub mod materializer;
pub mod run_state;
pub mod transfer;

pub use dedupe::{TitleRegistry, reserve_title};
pub use enumerator::{EnumerationRules, SourceItem, enumerate_sources};
pub use materializer::{CategoryCounters, HierarchyMaterializer, SortCounters};
pub use run_state::RunState;
pub use transfer::{ByteTransfer, DEFAULT_CONTENT_TYPE, UploadsDir, content_type_for, stored_file_name};
