//! Node module for the tree graph.
//!
//! A [Node] is an arena element of [Tree](crate::model::Tree). Unlike a
//! child-pointer representation, nodes keep an unordered set of neighbor
//! indices plus one designated ancestor among them, which is the natural
//! shape for an unrooted tree carrying a designated root: rearrangement
//! moves rewire neighbor sets and re-designate ancestors without ever
//! creating or destroying nodes.

use crate::model::branch::BranchIndex;

/// Index of a node in a tree (arena).
pub type NodeIndex = usize;

// =#========================================================================#=
// NODE
// =#========================================================================#=
/// A node in a phylogenetic tree.
///
/// # Invariants
/// - `index` is the position of this node in the tree arena
/// - `neighbors` is an exclusive set: size 1 for leaves, 2 for the root,
///   3 for other internal nodes
/// - `ancestor`, if set, is one of the neighbors; the root has none
/// - `branch`, if set, is the outgoing branch to the ancestor; the root
///   has none
///
/// Neighbor order is not semantically meaningful, but it is deterministic:
/// removal preserves the relative order of the remaining neighbors and
/// additions append. Proposal moves rely on this for reproducible
/// descendant enumeration under a fixed random seed.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Index of this node in the tree arena
    index: NodeIndex,
    /// Whether this node is a leaf (taxon)
    is_leaf: bool,
    /// Indices of adjacent nodes (exclusive set)
    neighbors: Vec<NodeIndex>,
    /// Designated ancestor among the neighbors; `None` for the root
    ancestor: Option<NodeIndex>,
    /// Outgoing branch to the ancestor; `None` for the root
    branch: Option<BranchIndex>,
}

impl Node {
    /// Creates a new, still unconnected node.
    ///
    /// # Arguments
    /// * `index` - The unique index of this node in the tree (arena)
    /// * `is_leaf` - Whether this node is a leaf
    pub fn new(index: NodeIndex, is_leaf: bool) -> Self {
        Node {
            index,
            is_leaf,
            neighbors: Vec::with_capacity(3),
            ancestor: None,
            branch: None,
        }
    }

    /// Returns the index of this node.
    pub fn index(&self) -> NodeIndex {
        self.index
    }

    /// Returns `true` if this node is a leaf.
    pub fn is_leaf(&self) -> bool {
        self.is_leaf
    }

    /// Returns the neighbors of this node.
    pub fn neighbors(&self) -> &[NodeIndex] {
        &self.neighbors
    }

    /// Returns the number of neighbors of this node.
    pub fn degree(&self) -> usize {
        self.neighbors.len()
    }

    /// Returns `true` if the given node is a neighbor of this node.
    pub fn has_neighbor(&self, neighbor: NodeIndex) -> bool {
        self.neighbors.contains(&neighbor)
    }

    /// Adds a neighbor to this node.
    ///
    /// # Panics
    /// Panics if the node is already a neighbor (neighbors form an
    /// exclusive set).
    pub fn add_neighbor(&mut self, neighbor: NodeIndex) {
        assert!(
            !self.neighbors.contains(&neighbor),
            "Node {} already has neighbor {}",
            self.index,
            neighbor
        );
        self.neighbors.push(neighbor);
    }

    /// Removes a neighbor from this node, preserving the order of the
    /// remaining neighbors.
    ///
    /// # Panics
    /// Panics if the given node is not a neighbor; a missing neighbor
    /// signals a corrupted tree.
    pub fn remove_neighbor(&mut self, neighbor: NodeIndex) {
        match self.neighbors.iter().position(|&n| n == neighbor) {
            Some(position) => {
                self.neighbors.remove(position);
            }
            None => panic!("Node {} has no neighbor {}", self.index, neighbor),
        }
    }

    /// Returns the index of this node's ancestor, or `None` for the root.
    pub fn ancestor(&self) -> Option<NodeIndex> {
        self.ancestor
    }

    /// Sets the designated ancestor of this node.
    ///
    /// The ancestor must already be among the neighbors when set.
    pub fn set_ancestor(&mut self, ancestor: Option<NodeIndex>) {
        debug_assert!(
            ancestor.is_none_or(|a| self.neighbors.contains(&a)),
            "Ancestor of node {} must be one of its neighbors",
            self.index
        );
        self.ancestor = ancestor;
    }

    /// Returns the index of this node's outgoing branch to its ancestor,
    /// or `None` for the root.
    pub fn branch(&self) -> Option<BranchIndex> {
        self.branch
    }

    /// Sets the outgoing branch of this node.
    pub fn set_branch(&mut self, branch: Option<BranchIndex>) {
        self.branch = branch;
    }
}
