//! Core catalog types: configuration, errors, identifiers, hierarchy handles.

pub mod config;
pub mod errors;
pub mod hierarchy;
pub mod ids;

pub use config::{
    ContentJobConfig, ConversionLimits, FileJobConfig, ImportConfig, JobConfig, NamingConfig,
    ProjectionJobConfig, StorageConfig, CONVERTIBLE_EXTENSIONS, DEFAULT_FILE_EXTENSIONS,
    DEFAULT_SKIP_PATTERNS,
};
pub use errors::{ConversionError, ImportError, ImportResult};
pub use hierarchy::{Hierarchy, PayloadKind, DEFAULT_CATEGORY};
pub use ids::{CategoryId, DocumentId};
