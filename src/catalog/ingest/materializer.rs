//! Idempotent materialization of directory paths into category nodes.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::hash::Hash;
use std::path::{Component, Path};

use tracing::debug;

use crate::catalog::core::errors::ImportResult;
use crate::catalog::core::hierarchy::DEFAULT_CATEGORY;
use crate::catalog::core::ids::CategoryId;
use crate::catalog::normalize::NameNormalizer;
use crate::catalog::storage::CategoryStore;

/// Next free sort position per key, seeded lazily from persisted state.
#[derive(Debug)]
pub struct SortCounters<K> {
    next: HashMap<K, i64>,
}

impl<K> Default for SortCounters<K> {
    fn default() -> Self {
        Self {
            next: HashMap::new(),
        }
    }
}

impl<K: Copy + Eq + Hash> SortCounters<K> {
    /// Create empty counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next position for `key`, calling `seed` on first use.
    ///
    /// # Errors
    /// Returns the seeding error.
    pub fn issue<F>(&mut self, key: K, seed: F) -> ImportResult<i64>
    where
        F: FnOnce() -> ImportResult<i64>,
    {
        let next = match self.next.entry(key) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(seed()?),
        };
        let issued = *next;
        *next += 1;
        Ok(issued)
    }

    /// Take back `issued` if it is the most recent position for `key`.
    pub fn rewind(&mut self, key: K, issued: i64) {
        if let Some(next) = self.next.get_mut(&key)
            && *next == issued + 1
        {
            *next = issued;
        }
    }

    /// Forget every key, forcing a reseed on next use.
    pub fn clear(&mut self) {
        self.next.clear();
    }
}

/// Sibling counters for category nodes, keyed by parent.
pub type CategoryCounters = SortCounters<Option<CategoryId>>;

/// Turns cleaned path segments into persisted category nodes.
pub struct HierarchyMaterializer<'a, S: ?Sized> {
    store: &'a S,
    names: &'a NameNormalizer,
}

impl<'a, S> HierarchyMaterializer<'a, S>
where
    S: CategoryStore + ?Sized,
{
    /// Bind a store and a name normalizer.
    #[must_use]
    pub const fn new(store: &'a S, names: &'a NameNormalizer) -> Self {
        Self { store, names }
    }

    /// Find or create the node `(parent, name)`.
    ///
    /// # Errors
    /// Returns an error if storage access fails; a uniqueness violation on
    /// insert is not retried.
    pub fn ensure_node(
        &self,
        name: &str,
        parent: Option<CategoryId>,
        counters: &mut CategoryCounters,
    ) -> ImportResult<CategoryId> {
        if let Some(id) = self.store.find_category(name, parent)? {
            return Ok(id);
        }

        let sort_order = counters.issue(parent, || self.store.next_category_sort_order(parent))?;
        let id = self.store.insert_category(name, parent, sort_order)?;
        debug!(category = %id, name, sort_order, "created category");
        Ok(id)
    }

    /// Resolve a file's source-relative path to its category, creating
    /// missing nodes on the way.
    ///
    /// Files directly under the root land in [`DEFAULT_CATEGORY`].
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    pub fn resolve_path(
        &self,
        relative_path: &Path,
        counters: &mut CategoryCounters,
    ) -> ImportResult<CategoryId> {
        let segments: Vec<String> = relative_path
            .parent()
            .map(|dir| {
                dir.components()
                    .filter_map(|component| match component {
                        Component::Normal(segment) => Some(segment.to_string_lossy().into_owned()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        let mut segments = segments.iter();
        let Some(top) = segments.next() else {
            return self.ensure_node(DEFAULT_CATEGORY, None, counters);
        };

        let mut id = self.ensure_node(&self.names.clean_segment(top, true), None, counters)?;
        for raw in segments {
            let name = self.names.clean_segment(raw, false);
            id = self.ensure_node(&name, Some(id), counters)?;
        }
        Ok(id)
    }
}
