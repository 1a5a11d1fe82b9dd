//! Per-category title deduplication.

use std::collections::{HashMap, HashSet};

use crate::catalog::core::errors::ImportResult;
use crate::catalog::core::ids::CategoryId;
use crate::catalog::storage::DocumentStore;

/// Reserve `candidate`, or `candidate (n)` for the smallest free `n >= 2`.
///
/// The suffix is always appended to the original candidate, never to an
/// already-suffixed title.
pub fn reserve_title(candidate: &str, used: &mut HashSet<String>) -> String {
    if used.insert(candidate.to_string()) {
        return candidate.to_string();
    }

    let mut n: u32 = 2;
    loop {
        let title = format!("{candidate} ({n})");
        if used.insert(title.clone()) {
            return title;
        }
        n += 1;
    }
}

/// Used titles per category, seeded from persisted rows on first touch.
#[derive(Debug, Default)]
pub struct TitleRegistry {
    used: HashMap<CategoryId, HashSet<String>>,
}

impl TitleRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a unique title for `candidate` in `category`.
    ///
    /// # Errors
    /// Returns an error if seeding from storage fails.
    pub fn reserve<S>(
        &mut self,
        store: &S,
        candidate: &str,
        category: CategoryId,
    ) -> ImportResult<String>
    where
        S: DocumentStore + ?Sized,
    {
        let used = match self.used.entry(category) {
            std::collections::hash_map::Entry::Occupied(entry) => entry.into_mut(),
            std::collections::hash_map::Entry::Vacant(entry) => {
                let persisted = store.titles_in_category(category)?;
                entry.insert(persisted.into_iter().collect())
            }
        };
        Ok(reserve_title(candidate, used))
    }

    /// Give back a title whose document was never stored.
    pub fn release(&mut self, category: CategoryId, title: &str) {
        if let Some(used) = self.used.get_mut(&category) {
            used.remove(title);
        }
    }

    /// Forget every category, forcing a reseed on next touch.
    pub fn clear(&mut self) {
        self.used.clear();
    }
}
