//! Identifier types for catalog rows.
//!
//! Category and document identities are `SQLite` rowids. They are wrapped in
//! distinct newtypes so a category id can never be passed where a document id
//! is expected, and the other way round.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Declare a rowid newtype with a consistent API.
macro_rules! define_row_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[repr(transparent)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Wrap an existing rowid.
            #[inline]
            #[must_use]
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Extract the underlying rowid.
            #[inline]
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            #[inline]
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            #[inline]
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl FromStr for $name {
            type Err = core::num::ParseIntError;

            #[inline]
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.trim().parse()?))
            }
        }
    };
}

define_row_id!(
    /// Identifier of a category node within one hierarchy.
    CategoryId
);

define_row_id!(
    /// Identifier of a document record.
    DocumentId
);

// ===== Rusqlite integration ================================================

mod rusqlite_impl {
    use super::{CategoryId, DocumentId};

    use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

    macro_rules! impl_rusqlite_row_id {
        ($t:ty) => {
            impl ToSql for $t {
                fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                    Ok(ToSqlOutput::from(self.0))
                }
            }

            impl FromSql for $t {
                fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                    i64::column_result(value).map(Self)
                }
            }
        };
    }

    impl_rusqlite_row_id!(CategoryId);
    impl_rusqlite_row_id!(DocumentId);
}
