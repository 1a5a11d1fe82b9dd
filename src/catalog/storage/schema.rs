//! Table bootstrap for the catalog hierarchies.

use std::path::Path;

use rusqlite::Connection;
use tracing::info;

use crate::catalog::core::errors::ImportResult;
use crate::catalog::core::hierarchy::{Hierarchy, PayloadKind};

/// Create the category and document tables of a hierarchy if missing.
///
/// # Errors
/// Returns an error if the DDL fails.
pub fn ensure_schema(conn: &Connection, hierarchy: Hierarchy) -> ImportResult<()> {
    conn.execute_batch(&category_ddl(hierarchy))?;
    conn.execute_batch(&document_ddl(hierarchy))?;
    Ok(())
}

/// Create every hierarchy's tables.
///
/// # Errors
/// Returns an error if the DDL fails.
pub fn ensure_all(conn: &Connection) -> ImportResult<()> {
    for hierarchy in Hierarchy::ALL {
        ensure_schema(conn, hierarchy)?;
    }
    Ok(())
}

/// Open (or create) the database file and bootstrap every hierarchy.
///
/// # Errors
/// Returns an error if the file cannot be opened or the DDL fails.
pub fn open_database(path: &Path) -> ImportResult<Connection> {
    let conn = Connection::open(path)?;
    ensure_all(&conn)?;
    info!(path = %path.display(), "catalog database ready");
    Ok(conn)
}

fn category_ddl(hierarchy: Hierarchy) -> String {
    let table = hierarchy.category_table();
    let display_columns = if hierarchy.has_display_flags() {
        "IsFavorited INTEGER NOT NULL DEFAULT 0,
            IsPinned INTEGER NOT NULL DEFAULT 0,
            Color TEXT,"
    } else {
        ""
    };

    format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            Id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
            Name TEXT NOT NULL DEFAULT '',
            SortOrder INTEGER NOT NULL DEFAULT 0,
            {display_columns}
            ParentId INTEGER,
            FOREIGN KEY (ParentId) REFERENCES {table}(Id) ON DELETE RESTRICT
        );
        CREATE UNIQUE INDEX IF NOT EXISTS IX_{table}_ParentId_Name ON {table}(ParentId, Name);"
    )
}

fn document_ddl(hierarchy: Hierarchy) -> String {
    let table = hierarchy.document_table();
    let categories = hierarchy.category_table();
    let payload_columns = match hierarchy.payload() {
        PayloadKind::File => {
            "FileName TEXT NOT NULL DEFAULT '',
            StoredFileName TEXT NOT NULL DEFAULT '',
            ContentType TEXT NOT NULL DEFAULT '',
            FileSize INTEGER NOT NULL DEFAULT 0,"
        }
        PayloadKind::Html => "HtmlContent TEXT NOT NULL DEFAULT '',",
    };
    let favorite_column = if hierarchy.has_display_flags() {
        "IsFavorited INTEGER NOT NULL DEFAULT 0,"
    } else {
        ""
    };

    format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            Id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
            Title TEXT NOT NULL DEFAULT '',
            {payload_columns}
            {favorite_column}
            CategoryId INTEGER NOT NULL,
            SortOrder INTEGER NOT NULL DEFAULT 0,
            CreatedAt TEXT NOT NULL DEFAULT '0001-01-01 00:00:00',
            UpdatedAt TEXT NOT NULL DEFAULT '0001-01-01 00:00:00',
            FOREIGN KEY (CategoryId) REFERENCES {categories}(Id) ON DELETE CASCADE
        );
        CREATE UNIQUE INDEX IF NOT EXISTS IX_{table}_CategoryId_Title ON {table}(CategoryId, Title);"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(conn: &Connection, table: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info('{table}')"))
            .unwrap();
        stmt.query_map([], |row| row.get::<_, String>(1))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_all(&conn).unwrap();
        ensure_all(&conn).unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 8);
    }

    #[test]
    fn test_open_database_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.db");
        open_database(&path).unwrap();
        assert!(path.exists());
        let conn = open_database(&path).unwrap();
        assert!(columns(&conn, "WebDocCategories").contains(&"ParentId".to_string()));
    }

    #[test]
    fn test_columns_follow_hierarchy_layout() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_all(&conn).unwrap();

        let protocols = columns(&conn, "Categories");
        assert!(!protocols.contains(&"IsPinned".to_string()));
        let sop = columns(&conn, "SopCategories");
        assert!(sop.contains(&"Color".to_string()));

        let office = columns(&conn, "OfficeDocuments");
        assert!(office.contains(&"StoredFileName".to_string()));
        assert!(!office.contains(&"HtmlContent".to_string()));

        let web = columns(&conn, "WebDocuments");
        assert!(web.contains(&"HtmlContent".to_string()));
        assert!(web.contains(&"IsFavorited".to_string()));
        assert!(!columns(&conn, "Documents").contains(&"IsFavorited".to_string()));
    }
}
