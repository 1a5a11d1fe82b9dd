//! Cross-hierarchy category reconciliation by reconstructed path.
//!
//! Two hierarchies built independently from the same directory tree share no
//! ids. What they do share is the chain of display names from root to node,
//! so each node is keyed by that chain joined with `/` and nodes are matched
//! by exact string equality.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use tracing::{debug, warn};

use crate::catalog::core::errors::ImportResult;
use crate::catalog::core::ids::CategoryId;
use crate::catalog::ingest::{CategoryCounters, HierarchyMaterializer};
use crate::catalog::storage::{CategoryNode, CategoryStore};

/// Separator between names in a reconstructed path.
pub const PATH_SEPARATOR: char = '/';

/// Bidirectional path lookup for one hierarchy.
#[derive(Clone, Debug, Default)]
pub struct PathIndex {
    by_path: HashMap<String, CategoryId>,
    by_id: BTreeMap<CategoryId, String>,
}

impl PathIndex {
    /// Path of a node.
    #[must_use]
    pub fn path_of(&self, id: CategoryId) -> Option<&str> {
        self.by_id.get(&id).map(String::as_str)
    }

    /// Node at a path.
    #[must_use]
    pub fn id_of(&self, path: &str) -> Option<CategoryId> {
        self.by_path.get(path).copied()
    }

    /// Number of indexed nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether no node is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// `(id, path)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (CategoryId, &str)> {
        self.by_id.iter().map(|(id, path)| (*id, path.as_str()))
    }
}

/// Index every node by its root-to-node name path.
///
/// A parent id absent from `nodes` ends the walk as if the node were a root.
/// When two nodes share a path, the first one in `nodes` keeps it.
#[must_use]
pub fn build_path_index(nodes: &[CategoryNode]) -> PathIndex {
    let by_node_id: HashMap<CategoryId, &CategoryNode> =
        nodes.iter().map(|node| (node.id, node)).collect();
    let mut paths: HashMap<CategoryId, String> = HashMap::with_capacity(nodes.len());

    for node in nodes {
        if paths.contains_key(&node.id) {
            continue;
        }

        // Leaf first; stops at a memoized ancestor, a root, a missing parent
        // or a revisited id.
        let mut chain = vec![node];
        let mut seen = HashSet::from([node.id]);
        let mut prefix: Option<String> = None;
        let mut current = node;
        while let Some(parent_id) = current.parent {
            if let Some(known) = paths.get(&parent_id) {
                prefix = Some(known.clone());
                break;
            }
            let Some(&parent) = by_node_id.get(&parent_id) else {
                break;
            };
            if !seen.insert(parent_id) {
                warn!(category = %parent_id, "cycle in category parents");
                break;
            }
            chain.push(parent);
            current = parent;
        }

        for link in chain.into_iter().rev() {
            let path = match prefix.as_deref() {
                Some(prefix) => format!("{prefix}{PATH_SEPARATOR}{}", link.name),
                None => link.name.clone(),
            };
            paths.insert(link.id, path.clone());
            prefix = Some(path);
        }
    }

    let mut index = PathIndex::default();
    for node in nodes {
        let Some(path) = paths.remove(&node.id) else {
            continue;
        };
        index.by_path.entry(path.clone()).or_insert(node.id);
        index.by_id.insert(node.id, path);
    }
    index
}

/// Outcome of matching hierarchy A against hierarchy B.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Reconciliation {
    /// A-node to B-node with the identical path.
    pub mapping: HashMap<CategoryId, CategoryId>,
    /// A-nodes with no B counterpart, in id order.
    pub unmapped: Vec<CategoryId>,
}

impl Reconciliation {
    /// B-node matching an A-node.
    #[must_use]
    pub fn target_of(&self, source: CategoryId) -> Option<CategoryId> {
        self.mapping.get(&source).copied()
    }
}

/// Match every A-node to the B-node with an identical path.
///
/// Comparison is exact: case, whitespace and punctuation all count.
#[must_use]
pub fn reconcile(source: &PathIndex, target: &PathIndex) -> Reconciliation {
    let mut result = Reconciliation::default();
    for (id, path) in source.iter() {
        match target.id_of(path) {
            Some(target_id) => {
                result.mapping.insert(id, target_id);
            }
            None => {
                debug!(category = %id, path, "no counterpart");
                result.unmapped.push(id);
            }
        }
    }
    result
}

/// Materialize every source node into the target hierarchy, parents first
/// and siblings in source order, returning source id to target id.
///
/// Names are copied as-is. Nodes whose parent chain never reaches a root
/// (cycles) are skipped.
///
/// # Errors
/// Returns an error if storage access fails.
pub fn mirror_hierarchy<S>(
    source: &[CategoryNode],
    target: &HierarchyMaterializer<'_, S>,
    counters: &mut CategoryCounters,
) -> ImportResult<HashMap<CategoryId, CategoryId>>
where
    S: CategoryStore + ?Sized,
{
    let known: HashSet<CategoryId> = source.iter().map(|node| node.id).collect();
    let mut children: HashMap<Option<CategoryId>, Vec<&CategoryNode>> = HashMap::new();
    for node in source {
        let parent = node.parent.filter(|id| known.contains(id));
        children.entry(parent).or_default().push(node);
    }
    for siblings in children.values_mut() {
        siblings.sort_by_key(|node| (node.sort_order, node.id));
    }

    let mut mapped = HashMap::with_capacity(source.len());
    let mut queue: VecDeque<(Option<CategoryId>, Option<CategoryId>)> = VecDeque::new();
    queue.push_back((None, None));

    while let Some((source_parent, target_parent)) = queue.pop_front() {
        let Some(siblings) = children.get(&source_parent) else {
            continue;
        };
        for node in siblings {
            let id = target.ensure_node(&node.name, target_parent, counters)?;
            mapped.insert(node.id, id);
            queue.push_back((Some(node.id), Some(id)));
        }
    }

    if mapped.len() < source.len() {
        warn!(
            skipped = source.len() - mapped.len(),
            "categories unreachable from any root were not mirrored"
        );
    }
    Ok(mapped)
}
