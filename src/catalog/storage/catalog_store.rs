//! Category and document stores over one hierarchy's tables.

use std::collections::HashMap;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

use crate::catalog::core::errors::{ImportError, ImportResult};
use crate::catalog::core::hierarchy::{Hierarchy, PayloadKind};
use crate::catalog::core::ids::{CategoryId, DocumentId};

/// Timestamp layout shared by every row written in a run.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current UTC time in the store's timestamp layout.
#[must_use]
pub fn now_timestamp() -> String {
    Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

/// A persisted category node.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CategoryNode {
    /// Row id.
    pub id: CategoryId,
    /// Display name.
    pub name: String,
    /// Position among siblings.
    pub sort_order: i64,
    /// Parent node, `None` for roots.
    pub parent: Option<CategoryId>,
}

/// Metadata of a copied file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FileMeta {
    /// Original file name.
    pub file_name: String,
    /// MIME type.
    pub content_type: String,
    /// Size in bytes.
    pub file_size: u64,
}

/// What a new document carries.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DocumentPayload {
    /// File reference; the stored name is backfilled by `finalize`.
    File(FileMeta),
    /// Inline HTML body.
    Html(String),
}

impl DocumentPayload {
    const fn kind(&self) -> PayloadKind {
        match self {
            Self::File(_) => PayloadKind::File,
            Self::Html(_) => PayloadKind::Html,
        }
    }
}

/// A document row about to be inserted.
#[derive(Clone, Debug)]
pub struct NewDocument {
    /// Unique title within the category.
    pub title: String,
    /// Owning category.
    pub category: CategoryId,
    /// Position among the category's documents.
    pub sort_order: i64,
    /// Payload.
    pub payload: DocumentPayload,
    /// `CreatedAt` / `UpdatedAt` value.
    pub timestamp: String,
}

/// A file document as listed for projection.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StoredFile {
    /// Row id.
    pub id: DocumentId,
    /// Title.
    pub title: String,
    /// Original file name.
    pub file_name: String,
    /// Name of the copy in the uploads directory.
    pub stored_file_name: String,
    /// Owning category.
    pub category: CategoryId,
    /// Position among the category's documents.
    pub sort_order: i64,
}

/// Category persistence.
pub trait CategoryStore {
    /// Exact `(parent, name)` lookup.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn find_category(&self, name: &str, parent: Option<CategoryId>)
    -> ImportResult<Option<CategoryId>>;

    /// Insert a category node.
    ///
    /// # Errors
    /// Returns an error if storage access fails or `(parent, name)` is taken.
    fn insert_category(
        &self,
        name: &str,
        parent: Option<CategoryId>,
        sort_order: i64,
    ) -> ImportResult<CategoryId>;

    /// First free sibling position under `parent`.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn next_category_sort_order(&self, parent: Option<CategoryId>) -> ImportResult<i64>;

    /// Every node, roots first, then by parent and sibling order.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn load_categories(&self) -> ImportResult<Vec<CategoryNode>>;
}

/// Document persistence.
pub trait DocumentStore {
    /// Titles already used in a category.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn titles_in_category(&self, category: CategoryId) -> ImportResult<Vec<String>>;

    /// First free document position in a category.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn next_document_sort_order(&self, category: CategoryId) -> ImportResult<i64>;

    /// Insert a document row. File documents start with an empty stored
    /// name and must be finalized; HTML documents are complete.
    ///
    /// # Errors
    /// Returns an error if storage access fails, the payload does not match
    /// the hierarchy, or the title is taken in the category.
    fn create_pending(&self, document: &NewDocument) -> ImportResult<DocumentId>;

    /// Backfill the stored file name of a pending document.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn finalize(&self, id: DocumentId, stored_file_name: &str) -> ImportResult<()>;

    /// Remove a pending document whose payload never arrived.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn discard(&self, id: DocumentId) -> ImportResult<()>;

    /// Number of documents per category.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn document_counts(&self) -> ImportResult<HashMap<CategoryId, usize>>;

    /// File documents ordered by category then position.
    ///
    /// # Errors
    /// Returns an error if storage access fails or the hierarchy stores HTML.
    fn list_file_documents(&self) -> ImportResult<Vec<StoredFile>>;

    /// Delete every document, returning how many were removed.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn clear_documents(&self) -> ImportResult<usize>;
}

/// `SQLite` implementation of both stores for one hierarchy.
///
/// Borrows the connection so the caller controls the transaction.
#[derive(Clone, Copy)]
pub struct SqliteCatalog<'c> {
    conn: &'c Connection,
    hierarchy: Hierarchy,
}

impl<'c> SqliteCatalog<'c> {
    /// Bind a hierarchy to a connection.
    #[must_use]
    pub const fn new(conn: &'c Connection, hierarchy: Hierarchy) -> Self {
        Self { conn, hierarchy }
    }

    /// Bound hierarchy.
    #[must_use]
    pub const fn hierarchy(&self) -> Hierarchy {
        self.hierarchy
    }

    /// Total and root category counts.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    pub fn category_counts(&self) -> ImportResult<(usize, usize)> {
        let table = self.hierarchy.category_table();
        let (total, roots): (i64, i64) = self.conn.query_row(
            &format!(
                "SELECT COUNT(*), COALESCE(SUM(ParentId IS NULL), 0) FROM {table}"
            ),
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok((to_count(total)?, to_count(roots)?))
    }

    /// Delete every document and category of the hierarchy.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    pub fn clear_hierarchy(&self) -> ImportResult<()> {
        self.clear_documents()?;
        self.conn.execute(
            &format!("DELETE FROM {}", self.hierarchy.category_table()),
            [],
        )?;
        Ok(())
    }

    fn require_payload(&self, expected: PayloadKind) -> ImportResult<()> {
        if self.hierarchy.payload() == expected {
            Ok(())
        } else {
            Err(ImportError::InvalidConfig(format!(
                "hierarchy {} does not store {expected:?} documents",
                self.hierarchy
            )))
        }
    }
}

impl CategoryStore for SqliteCatalog<'_> {
    fn find_category(
        &self,
        name: &str,
        parent: Option<CategoryId>,
    ) -> ImportResult<Option<CategoryId>> {
        let table = self.hierarchy.category_table();
        let id = match parent {
            Some(parent) => self
                .conn
                .query_row(
                    &format!("SELECT Id FROM {table} WHERE Name = ?1 AND ParentId = ?2"),
                    params![name, parent],
                    |row| row.get(0),
                )
                .optional()?,
            None => self
                .conn
                .query_row(
                    &format!("SELECT Id FROM {table} WHERE Name = ?1 AND ParentId IS NULL"),
                    params![name],
                    |row| row.get(0),
                )
                .optional()?,
        };
        Ok(id)
    }

    fn insert_category(
        &self,
        name: &str,
        parent: Option<CategoryId>,
        sort_order: i64,
    ) -> ImportResult<CategoryId> {
        let table = self.hierarchy.category_table();
        self.conn.execute(
            &format!("INSERT INTO {table} (Name, SortOrder, ParentId) VALUES (?1, ?2, ?3)"),
            params![name, sort_order, parent],
        )?;
        Ok(CategoryId::new(self.conn.last_insert_rowid()))
    }

    fn next_category_sort_order(&self, parent: Option<CategoryId>) -> ImportResult<i64> {
        let table = self.hierarchy.category_table();
        let next = match parent {
            Some(parent) => self.conn.query_row(
                &format!(
                    "SELECT COALESCE(MAX(SortOrder) + 1, 0) FROM {table} WHERE ParentId = ?1"
                ),
                params![parent],
                |row| row.get(0),
            )?,
            None => self.conn.query_row(
                &format!(
                    "SELECT COALESCE(MAX(SortOrder) + 1, 0) FROM {table} WHERE ParentId IS NULL"
                ),
                [],
                |row| row.get(0),
            )?,
        };
        Ok(next)
    }

    fn load_categories(&self) -> ImportResult<Vec<CategoryNode>> {
        let table = self.hierarchy.category_table();
        let mut stmt = self.conn.prepare(&format!(
            "SELECT Id, Name, SortOrder, ParentId FROM {table}
             ORDER BY ParentId IS NOT NULL, ParentId, SortOrder, Id"
        ))?;
        let nodes = stmt
            .query_map([], |row| {
                Ok(CategoryNode {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    sort_order: row.get(2)?,
                    parent: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(nodes)
    }
}

impl DocumentStore for SqliteCatalog<'_> {
    fn titles_in_category(&self, category: CategoryId) -> ImportResult<Vec<String>> {
        let table = self.hierarchy.document_table();
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT Title FROM {table} WHERE CategoryId = ?1"))?;
        let titles = stmt
            .query_map(params![category], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(titles)
    }

    fn next_document_sort_order(&self, category: CategoryId) -> ImportResult<i64> {
        let table = self.hierarchy.document_table();
        let next = self.conn.query_row(
            &format!("SELECT COALESCE(MAX(SortOrder) + 1, 0) FROM {table} WHERE CategoryId = ?1"),
            params![category],
            |row| row.get(0),
        )?;
        Ok(next)
    }

    fn create_pending(&self, document: &NewDocument) -> ImportResult<DocumentId> {
        self.require_payload(document.payload.kind())?;
        let table = self.hierarchy.document_table();

        match &document.payload {
            DocumentPayload::File(meta) => {
                let file_size = i64::try_from(meta.file_size).map_err(|_| {
                    ImportError::Inconsistent(format!("file size {} out of range", meta.file_size))
                })?;
                self.conn.execute(
                    &format!(
                        "INSERT INTO {table}
                         (Title, FileName, StoredFileName, ContentType, FileSize, IsFavorited,
                          CategoryId, SortOrder, CreatedAt, UpdatedAt)
                         VALUES (?1, ?2, '', ?3, ?4, 0, ?5, ?6, ?7, ?7)"
                    ),
                    params![
                        document.title,
                        meta.file_name,
                        meta.content_type,
                        file_size,
                        document.category,
                        document.sort_order,
                        document.timestamp,
                    ],
                )?;
            }
            DocumentPayload::Html(body) => {
                let sql = if self.hierarchy.has_display_flags() {
                    format!(
                        "INSERT INTO {table}
                         (Title, HtmlContent, CategoryId, SortOrder, IsFavorited, CreatedAt, UpdatedAt)
                         VALUES (?1, ?2, ?3, ?4, 0, ?5, ?5)"
                    )
                } else {
                    format!(
                        "INSERT INTO {table}
                         (Title, HtmlContent, CategoryId, SortOrder, CreatedAt, UpdatedAt)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?5)"
                    )
                };
                self.conn.execute(
                    &sql,
                    params![
                        document.title,
                        body,
                        document.category,
                        document.sort_order,
                        document.timestamp,
                    ],
                )?;
            }
        }

        Ok(DocumentId::new(self.conn.last_insert_rowid()))
    }

    fn finalize(&self, id: DocumentId, stored_file_name: &str) -> ImportResult<()> {
        self.require_payload(PayloadKind::File)?;
        let table = self.hierarchy.document_table();
        let updated = self.conn.execute(
            &format!("UPDATE {table} SET StoredFileName = ?1 WHERE Id = ?2"),
            params![stored_file_name, id],
        )?;
        if updated == 0 {
            return Err(ImportError::Inconsistent(format!(
                "no pending document {id} in {table}"
            )));
        }
        Ok(())
    }

    fn discard(&self, id: DocumentId) -> ImportResult<()> {
        let table = self.hierarchy.document_table();
        self.conn
            .execute(&format!("DELETE FROM {table} WHERE Id = ?1"), params![id])?;
        Ok(())
    }

    fn document_counts(&self) -> ImportResult<HashMap<CategoryId, usize>> {
        let table = self.hierarchy.document_table();
        let mut stmt = self.conn.prepare(&format!(
            "SELECT CategoryId, COUNT(*) FROM {table} GROUP BY CategoryId"
        ))?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, CategoryId>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut counts = HashMap::with_capacity(rows.len());
        for (category, count) in rows {
            counts.insert(category, to_count(count)?);
        }
        Ok(counts)
    }

    fn list_file_documents(&self) -> ImportResult<Vec<StoredFile>> {
        self.require_payload(PayloadKind::File)?;
        let table = self.hierarchy.document_table();
        let mut stmt = self.conn.prepare(&format!(
            "SELECT Id, Title, FileName, StoredFileName, CategoryId, SortOrder
             FROM {table} ORDER BY CategoryId, SortOrder, Id"
        ))?;
        let files = stmt
            .query_map([], |row| {
                Ok(StoredFile {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    file_name: row.get(2)?,
                    stored_file_name: row.get(3)?,
                    category: row.get(4)?,
                    sort_order: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(files)
    }

    fn clear_documents(&self) -> ImportResult<usize> {
        let table = self.hierarchy.document_table();
        Ok(self.conn.execute(&format!("DELETE FROM {table}"), [])?)
    }
}

fn to_count(value: i64) -> ImportResult<usize> {
    usize::try_from(value)
        .map_err(|_| ImportError::Inconsistent(format!("negative count {value}")))
}
