//! Run summaries and category tree rendering.

use std::collections::HashMap;
use std::fmt;

use crate::catalog::core::errors::ImportResult;
use crate::catalog::core::hierarchy::Hierarchy;
use crate::catalog::core::ids::CategoryId;
use crate::catalog::storage::{CategoryNode, CategoryStore, DocumentStore, SqliteCatalog};

/// Counters reported at the end of a job.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RunSummary {
    /// Documents stored.
    pub imported: usize,
    /// Items with no usable content or an unconvertible format.
    pub skipped: usize,
    /// Items lost to duplicates, I/O failures or missing files.
    pub failed: usize,
    /// Projected documents whose category had no counterpart.
    pub unmapped_categories: Option<usize>,
    /// Categories in the target hierarchy after the run.
    pub categories_total: usize,
    /// Root categories in the target hierarchy after the run.
    pub categories_root: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Import complete!")?;
        writeln!(f, "  Imported: {}", self.imported)?;
        writeln!(f, "  Skipped: {}", self.skipped)?;
        writeln!(f, "  Failed: {}", self.failed)?;
        if let Some(unmapped) = self.unmapped_categories {
            writeln!(f, "  Unmapped categories: {unmapped}")?;
        }
        write!(
            f,
            "  Categories: {} total ({} top-level)",
            self.categories_total, self.categories_root
        )
    }
}

/// A category with its document count and children.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CategoryTreeNode {
    /// Row id.
    pub id: CategoryId,
    /// Display name.
    pub name: String,
    /// Documents directly in this category.
    pub documents: usize,
    /// Child categories in sibling order.
    pub children: Vec<CategoryTreeNode>,
}

/// A hierarchy's categories as a tree, for display.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CategoryTree {
    /// Root categories in sibling order.
    pub roots: Vec<CategoryTreeNode>,
    item_label: &'static str,
}

impl CategoryTree {
    /// Assemble a tree from flat nodes and per-category counts.
    ///
    /// Nodes whose parent is absent are shown as roots.
    #[must_use]
    pub fn build(
        nodes: &[CategoryNode],
        counts: &HashMap<CategoryId, usize>,
        item_label: &'static str,
    ) -> Self {
        let known: HashMap<CategoryId, &CategoryNode> =
            nodes.iter().map(|node| (node.id, node)).collect();
        let mut children: HashMap<Option<CategoryId>, Vec<&CategoryNode>> = HashMap::new();
        for node in nodes {
            let parent = node.parent.filter(|id| known.contains_key(id));
            children.entry(parent).or_default().push(node);
        }
        for siblings in children.values_mut() {
            siblings.sort_by_key(|node| (node.sort_order, node.id));
        }

        Self {
            roots: assemble(None, &children, counts),
            item_label,
        }
    }

    /// Load the tree of one hierarchy.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    pub fn load(store: &SqliteCatalog<'_>) -> ImportResult<Self> {
        let nodes = store.load_categories()?;
        let counts = store.document_counts()?;
        Ok(Self::build(&nodes, &counts, store.hierarchy().item_label()))
    }

    /// Tree for `hierarchy`, labelled with its item noun.
    #[must_use]
    pub fn for_hierarchy(
        hierarchy: Hierarchy,
        nodes: &[CategoryNode],
        counts: &HashMap<CategoryId, usize>,
    ) -> Self {
        Self::build(nodes, counts, hierarchy.item_label())
    }

    /// Indented text rendering, two spaces per level, counts only when
    /// non-zero.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for root in &self.roots {
            self.render_node(root, 0, &mut out);
        }
        out
    }

    fn render_node(&self, node: &CategoryTreeNode, depth: usize, out: &mut String) {
        out.push_str(&"  ".repeat(depth + 1));
        out.push_str(&node.name);
        if node.documents > 0 {
            out.push_str(&format!(" ({} {})", node.documents, self.item_label));
        }
        out.push('\n');
        for child in &node.children {
            self.render_node(child, depth + 1, out);
        }
    }
}

impl fmt::Display for CategoryTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

fn assemble(
    parent: Option<CategoryId>,
    children: &HashMap<Option<CategoryId>, Vec<&CategoryNode>>,
    counts: &HashMap<CategoryId, usize>,
) -> Vec<CategoryTreeNode> {
    children
        .get(&parent)
        .map(|siblings| {
            siblings
                .iter()
                .map(|node| CategoryTreeNode {
                    id: node.id,
                    name: node.name.clone(),
                    documents: counts.get(&node.id).copied().unwrap_or(0),
                    children: assemble(Some(node.id), children, counts),
                })
                .collect()
        })
        .unwrap_or_default()
}
