//! Raw byte transfer into an uploads directory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::catalog::core::errors::ImportResult;
use crate::catalog::core::ids::DocumentId;

/// Fallback MIME type for unknown extensions.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Copies a source file into durable storage under an id-derived name.
pub trait ByteTransfer {
    /// Store `source` for document `id`, returning the stored file name.
    ///
    /// # Errors
    /// Returns an error if the copy fails.
    fn store(&self, id: DocumentId, source: &Path, file_name: &str) -> ImportResult<String>;
}

/// Copies into a flat directory as `<id>_<safe name>`.
#[derive(Clone, Debug)]
pub struct UploadsDir {
    root: PathBuf,
}

impl UploadsDir {
    /// Use `root`, creating it if needed.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created.
    pub fn create(root: impl Into<PathBuf>) -> ImportResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Directory holding stored files.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full path of a stored file.
    #[must_use]
    pub fn path_of(&self, stored_file_name: &str) -> PathBuf {
        self.root.join(stored_file_name)
    }
}

impl ByteTransfer for UploadsDir {
    fn store(&self, id: DocumentId, source: &Path, file_name: &str) -> ImportResult<String> {
        let stored = stored_file_name(id, file_name);
        fs::copy(source, self.path_of(&stored))?;
        Ok(stored)
    }
}

/// `<id>_<name>` with characters unsafe on common filesystems replaced.
#[must_use]
pub fn stored_file_name(id: DocumentId, file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            other => other,
        })
        .collect();
    format!("{id}_{safe}")
}

/// MIME type guessed from the file extension.
#[must_use]
pub fn content_type_for(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_file_name() {
        assert_eq!(
            stored_file_name(DocumentId::new(12), r#"Q1: "plan" <v2>?.xlsx"#),
            "12_Q1_ _plan_ _v2__.xlsx"
        );
        assert_eq!(stored_file_name(DocumentId::new(3), "ok name.pdf"), "3_ok name.pdf");
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type_for(Path::new("a.pdf")), "application/pdf");
        assert_eq!(content_type_for(Path::new("a.unknownext")), DEFAULT_CONTENT_TYPE);
        assert_eq!(content_type_for(Path::new("noext")), DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn test_store_copies_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("in.txt");
        fs::write(&source, b"hello").unwrap();

        let uploads = UploadsDir::create(dir.path().join("uploads/nested")).unwrap();
        let stored = uploads.store(DocumentId::new(5), &source, "in.txt").unwrap();
        assert_eq!(stored, "5_in.txt");
        assert_eq!(fs::read(uploads.path_of(&stored)).unwrap(), b"hello");
    }

    #[test]
    fn test_store_missing_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = UploadsDir::create(dir.path()).unwrap();
        assert!(
            uploads
                .store(DocumentId::new(1), &dir.path().join("missing"), "missing")
                .is_err()
        );
    }
}
