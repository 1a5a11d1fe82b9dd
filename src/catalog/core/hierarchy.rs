//! Hierarchy handles.
//!
//! A hierarchy is a persisted forest of category nodes plus the document table
//! that hangs off it. The store holds several independent hierarchies side by
//! side; this enum names them and carries their table layout.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Category assigned to files that sit directly in a source root.
pub const DEFAULT_CATEGORY: &str = "General";

/// What a hierarchy's documents carry.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PayloadKind {
    /// A copied file, referenced by its stored name.
    File,
    /// A canonical HTML body stored inline.
    Html,
}

/// One of the persisted hierarchies.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hierarchy {
    /// Converted protocol documents.
    Protocols,
    /// Uploaded office documents.
    Documents,
    /// Uploaded SOP files.
    SopFiles,
    /// Web documents projected from uploaded office documents.
    WebDocs,
}

impl Hierarchy {
    /// All hierarchies, in schema creation order.
    pub const ALL: [Self; 4] = [Self::Protocols, Self::Documents, Self::SopFiles, Self::WebDocs];

    /// Stable string representation (config and logs).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Protocols => "protocols",
            Self::Documents => "documents",
            Self::SopFiles => "sop_files",
            Self::WebDocs => "web_docs",
        }
    }

    /// Category table name.
    #[must_use]
    pub const fn category_table(self) -> &'static str {
        match self {
            Self::Protocols => "Categories",
            Self::Documents => "DocumentCategories",
            Self::SopFiles => "SopCategories",
            Self::WebDocs => "WebDocCategories",
        }
    }

    /// Document table name.
    #[must_use]
    pub const fn document_table(self) -> &'static str {
        match self {
            Self::Protocols => "Documents",
            Self::Documents => "OfficeDocuments",
            Self::SopFiles => "SopFiles",
            Self::WebDocs => "WebDocuments",
        }
    }

    /// Payload carried by this hierarchy's documents.
    #[must_use]
    pub const fn payload(self) -> PayloadKind {
        match self {
            Self::Protocols | Self::WebDocs => PayloadKind::Html,
            Self::Documents | Self::SopFiles => PayloadKind::File,
        }
    }

    /// Whether rows carry the favorite/pin/color columns used by the viewer.
    #[must_use]
    pub const fn has_display_flags(self) -> bool {
        !matches!(self, Self::Protocols)
    }

    /// Noun used when rendering per-category document counts.
    #[must_use]
    pub const fn item_label(self) -> &'static str {
        match self {
            Self::SopFiles => "SOPs",
            _ => "docs",
        }
    }
}

impl fmt::Display for Hierarchy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Hierarchy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|h| h.as_str() == s.trim())
            .ok_or_else(|| format!("unknown hierarchy: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_roundtrip() {
        for hierarchy in Hierarchy::ALL {
            assert_eq!(hierarchy.as_str().parse::<Hierarchy>(), Ok(hierarchy));
        }
        assert!("nope".parse::<Hierarchy>().is_err());
    }

    #[test]
    fn test_payload_kinds() {
        assert_eq!(Hierarchy::Documents.payload(), PayloadKind::File);
        assert_eq!(Hierarchy::WebDocs.payload(), PayloadKind::Html);
    }
}
