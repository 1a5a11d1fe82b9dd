//! Error types for the import pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Import pipeline error type.
///
/// Only structural failures travel through this type as `Err`; per-item
/// problems are counted in the run summary instead.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Invalid configuration or unsupported values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A source root or other required path does not exist.
    #[error("missing source path: {}", .0.display())]
    MissingSource(PathBuf),
    /// Persisted rows that cannot be decoded into the catalog model.
    #[error("inconsistent catalog data: {0}")]
    Inconsistent(String),
    /// `SQLite` storage error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Config (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Invalid naming or skip pattern.
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ImportError {
    /// Whether this error is a storage-level uniqueness violation.
    #[must_use]
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            Self::Sqlite(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation
        )
    }
}

/// Convenience result alias for import operations.
pub type ImportResult<T> = Result<T, ImportError>;

/// Failure inside a format converter.
///
/// Never escapes the content normalizer: every variant is folded into a
/// "no usable content" outcome.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// The OOXML container could not be read.
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    /// Malformed document XML.
    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),
    /// Malformed XML attribute.
    #[error("xml attribute error: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),
    /// Workbook could not be parsed.
    #[error("spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::XlsxError),
    /// I/O error while reading the payload.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Input exceeds a configured resource ceiling.
    #[error("input too large: {0}")]
    TooLarge(String),
}
