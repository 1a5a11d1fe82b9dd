//! Mutable bookkeeping carried through one run against one hierarchy.

use crate::catalog::core::errors::ImportResult;
use crate::catalog::core::ids::CategoryId;
use crate::catalog::ingest::dedupe::TitleRegistry;
use crate::catalog::ingest::materializer::{CategoryCounters, SortCounters};
use crate::catalog::storage::DocumentStore;

/// Sort counters and used titles for the target hierarchy of a run.
#[derive(Debug, Default)]
pub struct RunState {
    /// Sibling positions for category nodes, keyed by parent.
    pub category_orders: CategoryCounters,
    /// Document positions, keyed by category.
    pub document_orders: SortCounters<CategoryId>,
    /// Titles in use, keyed by category.
    pub titles: TitleRegistry,
}

impl RunState {
    /// Fresh state; everything seeds from storage on first touch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next document position in `category`.
    ///
    /// # Errors
    /// Returns an error if seeding from storage fails.
    pub fn next_document_order<S>(&mut self, store: &S, category: CategoryId) -> ImportResult<i64>
    where
        S: DocumentStore + ?Sized,
    {
        self.document_orders
            .issue(category, || store.next_document_sort_order(category))
    }

    /// Undo the title and position handed out for a document that was
    /// never stored.
    pub fn release_document(&mut self, category: CategoryId, title: &str, sort_order: i64) {
        self.titles.release(category, title);
        self.document_orders.rewind(category, sort_order);
    }

    /// Drop all cached state, e.g. after the target rows were cleared.
    pub fn reset(&mut self) {
        self.category_orders.clear();
        self.document_orders.clear();
        self.titles.clear();
    }
}
