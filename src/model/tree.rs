//! Provides the tree graph used by the proposal moves.
//!
//! Provides core data structures for the mutable tree a sampler walks on:
//! * [Tree] - Arena-based container of [Node]s and [Branch]es with a
//!   designated root, a cached post-order traversal, and the cache flags
//!   the likelihood machinery depends on.
//! * [NodeIndex]/[BranchIndex] as types used to index the arenas.

use crate::model::branch::{Branch, BranchIndex, BranchLength};
use crate::model::node::{Node, NodeIndex};

/// *During construction only*, index for unset root.
const NO_ROOT_SET_INDEX: NodeIndex = usize::MAX;

// =$========================================================================$=
// TREE
// =$========================================================================$=
/// A binary phylogenetic tree represented using the arena pattern on
/// [Node] and [Branch].
///
/// Nodes and branches are stored in contiguous vectors and referenced by
/// [NodeIndex] and [BranchIndex]. The node/branch graph is cyclic
/// (node↔neighbor, node↔ancestor, branch↔ends); indices instead of owning
/// references avoid reference-cycle lifetime trouble and give efficient
/// memory layout for traversal.
///
/// # Structure
/// - The tree is unrooted with a designated root of degree 2 and no
///   ancestor; leaves have degree 1, other internal nodes degree 3.
/// - Every non-root node designates one neighbor as its ancestor and owns
///   the branch to it; branch ends are stored child-first.
/// - Branch lengths are non-negative (enforced by [BranchLength]).
/// - A post-order ("down-pass") traversal sequence is cached and must be
///   rebuilt after any topology change, see
///   [`Tree::initialize_down_pass_sequence`].
/// - Per-node conditional-likelihood flags and per-branch
///   transition-probability freshness markers are carried for the
///   likelihood machinery, which consumes them outside this crate.
///
/// # Construction
/// Create nodes with [`Tree::add_leaf`], [`Tree::add_internal`] and
/// [`Tree::add_root`], then link each child to its ancestor with
/// [`Tree::connect`]. Test validity with [`Tree::is_valid`].
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    /// Number of leaf nodes this tree was sized for
    num_leaves_init: usize,

    /// Nodes of this tree (arena pattern)
    nodes: Vec<Node>,

    /// Branches of this tree (arena pattern)
    branches: Vec<Branch>,

    /// Index of the root of this tree
    root_index: NodeIndex,

    /// Cached post-order traversal (children before ancestors, root last)
    down_pass: Vec<NodeIndex>,

    /// Per-node flag selecting the active conditional-likelihood buffer
    active_likelihood: Vec<bool>,

    /// Per-node flag marking the conditional likelihoods for recomputation
    likelihood_dirty: Vec<bool>,
}

// ============================================================================
// New, Construction (pub)
// ============================================================================
impl Tree {
    /// Creates a new, empty tree with capacity for a binary tree with
    /// `num_leaves` leaves.
    ///
    /// # Arguments
    /// * `num_leaves` - number of leaves of the new binary tree, implying
    ///   number of nodes and branches; must be positive
    pub fn new(num_leaves: usize) -> Self {
        assert!(num_leaves > 0);
        let node_capacity = 2 * num_leaves - 1;
        Tree {
            num_leaves_init: num_leaves,
            nodes: Vec::with_capacity(node_capacity),
            branches: Vec::with_capacity(node_capacity.saturating_sub(1)),
            root_index: NO_ROOT_SET_INDEX,
            down_pass: Vec::with_capacity(node_capacity),
            active_likelihood: Vec::with_capacity(node_capacity),
            likelihood_dirty: Vec::with_capacity(node_capacity),
        }
    }

    /// Adds a leaf node to the tree, assigning a unique index, which gets
    /// returned. The leaf is unconnected until passed to [`Tree::connect`].
    pub fn add_leaf(&mut self) -> NodeIndex {
        self.add_node(true)
    }

    /// Adds an internal node to the tree, assigning a unique index, which
    /// gets returned. The node is unconnected until passed to
    /// [`Tree::connect`].
    pub fn add_internal(&mut self) -> NodeIndex {
        self.add_node(false)
    }

    /// Adds the root node to the tree, assigning a unique index, which
    /// gets returned. The root has no ancestor and no outgoing branch;
    /// connect its two descendants to it with [`Tree::connect`].
    ///
    /// # Panics
    /// Panics if a root has already been added.
    pub fn add_root(&mut self) -> NodeIndex {
        assert!(
            self.root_index == NO_ROOT_SET_INDEX,
            "Tree already has a root"
        );
        let index = self.add_node(false);
        self.root_index = index;
        index
    }

    fn add_node(&mut self, is_leaf: bool) -> NodeIndex {
        let index = self.nodes.len();
        self.nodes.push(Node::new(index, is_leaf));
        self.active_likelihood.push(false);
        self.likelihood_dirty.push(true);
        index
    }

    /// Connects `child` to its ancestor: both become neighbors of each
    /// other, `ancestor` becomes the designated ancestor of `child`, and a
    /// new branch of the given length is created and owned by `child`.
    /// Returns the index of the new branch.
    ///
    /// # Arguments
    /// * `child` - node on the child side of the new branch
    /// * `ancestor` - node that becomes the ancestor of `child`
    /// * `length` - length of the new branch
    ///
    /// # Panics
    /// Panics if `child` already has an ancestor, if the two nodes are
    /// already neighbors, or if either index is out of bounds.
    pub fn connect(
        &mut self,
        child: NodeIndex,
        ancestor: NodeIndex,
        length: BranchLength,
    ) -> BranchIndex {
        assert!(
            self.nodes[child].ancestor().is_none() && self.nodes[child].branch().is_none(),
            "Node {} already has an ancestor",
            child
        );

        self.nodes[child].add_neighbor(ancestor);
        self.nodes[ancestor].add_neighbor(child);
        self.nodes[child].set_ancestor(Some(ancestor));

        let branch_index = self.branches.len();
        self.branches
            .push(Branch::new(branch_index, (child, ancestor), length));
        self.nodes[child].set_branch(Some(branch_index));

        branch_index
    }
}

// ============================================================================
// Getters / Accessors (pub)
// ============================================================================
impl Tree {
    /// Returns whether the root of the tree has been set.
    pub fn is_root_set(&self) -> bool {
        self.root_index != NO_ROOT_SET_INDEX
    }

    /// Returns a reference to the root node.
    ///
    /// # Panics
    /// Panics if the root hasn't been set and thus the tree hasn't been
    /// fully constructed yet.
    pub fn root(&self) -> &Node {
        &self[self.root_index]
    }

    /// Returns the index of the root.
    pub fn root_index(&self) -> NodeIndex {
        self.root_index
    }

    /// Returns the number of leaves this tree was initialized to hold.
    pub fn num_leaves_init(&self) -> usize {
        self.num_leaves_init
    }

    /// Returns the number of leaves in this tree.
    pub fn num_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Returns the number of nodes in this tree.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of branches in this tree.
    pub fn num_branches(&self) -> usize {
        self.branches.len()
    }

    /// Returns a reference to the branch at the given index.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    pub fn branch(&self, index: BranchIndex) -> &Branch {
        &self.branches[index]
    }

    /// Returns a mutable reference to the branch at the given index.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    pub fn branch_mut(&mut self, index: BranchIndex) -> &mut Branch {
        &mut self.branches[index]
    }

    /// Returns a reference to the outgoing branch of the given node.
    ///
    /// # Panics
    /// Panics if the node has no outgoing branch (i.e. it is the root).
    pub fn my_branch(&self, node: NodeIndex) -> &Branch {
        match self.nodes[node].branch() {
            Some(branch_index) => &self.branches[branch_index],
            None => panic!("Node {} has no branch to an ancestor", node),
        }
    }

    /// Returns a mutable reference to the outgoing branch of the given node.
    ///
    /// # Panics
    /// Panics if the node has no outgoing branch (i.e. it is the root).
    pub fn my_branch_mut(&mut self, node: NodeIndex) -> &mut Branch {
        match self.nodes[node].branch() {
            Some(branch_index) => &mut self.branches[branch_index],
            None => panic!("Node {} has no branch to an ancestor", node),
        }
    }

    /// Returns the descendants of the given node: its neighbors without
    /// its designated ancestor. For the root these are both neighbors.
    ///
    /// The order is the (deterministic) neighbor order of the node.
    pub fn descendants(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let ancestor = self.nodes[node].ancestor();
        self.nodes[node]
            .neighbors()
            .iter()
            .copied()
            .filter(|&n| Some(n) != ancestor)
            .collect()
    }

    /// Returns the sum of all branch lengths in the tree.
    pub fn total_branch_length(&self) -> f64 {
        self.branches.iter().map(|b| *b.length()).sum()
    }
}

impl std::ops::Index<NodeIndex> for Tree {
    type Output = Node;

    fn index(&self, index: NodeIndex) -> &Self::Output {
        &self.nodes[index]
    }
}

impl std::ops::IndexMut<NodeIndex> for Tree {
    fn index_mut(&mut self, index: NodeIndex) -> &mut Self::Output {
        &mut self.nodes[index]
    }
}

// ============================================================================
// Traversal and cache maintenance (pub)
// ============================================================================
impl Tree {
    /// Rebuilds the cached post-order traversal ("down-pass sequence"):
    /// every node appears after all its descendants, the root last.
    ///
    /// Must be called after any topology change; the likelihood recursion
    /// consumes the cached sequence via [`Tree::down_pass_sequence`].
    pub fn initialize_down_pass_sequence(&mut self) {
        self.down_pass.clear();

        if !self.is_root_set() {
            return;
        }

        // Stack-based post-order over (node, descendants_visited)
        let mut stack: Vec<(NodeIndex, bool)> = vec![(self.root_index, false)];
        while let Some((index, descendants_visited)) = stack.pop() {
            if descendants_visited || self.nodes[index].is_leaf() {
                self.down_pass.push(index);
            } else {
                stack.push((index, true));
                // Push descendants in reverse so the first is processed first
                for descendant in self.descendants(index).into_iter().rev() {
                    stack.push((descendant, false));
                }
            }
        }
    }

    /// Returns the cached post-order traversal sequence.
    pub fn down_pass_sequence(&self) -> &[NodeIndex] {
        &self.down_pass
    }

    /// Flips the active conditional-likelihood buffer flag of every node.
    ///
    /// The likelihood machinery keeps two buffers per node; flipping
    /// redirects the next recursion into the spare buffer so a rejected
    /// proposal can fall back to the previous one.
    pub fn flip_all_active_conditional_likelihoods(&mut self) {
        for flag in &mut self.active_likelihood {
            *flag = !*flag;
        }
    }

    /// Returns the active conditional-likelihood buffer flag of a node.
    pub fn active_conditional_likelihood(&self, node: NodeIndex) -> bool {
        self.active_likelihood[node]
    }

    /// Sets the recompute flag of every node's conditional likelihoods.
    ///
    /// # Arguments
    /// * `update` - `true` marks all nodes for recomputation on the next
    ///   likelihood pass, `false` clears the marks
    pub fn update_all_conditional_likelihoods(&mut self, update: bool) {
        for flag in &mut self.likelihood_dirty {
            *flag = update;
        }
    }

    /// Returns whether a node's conditional likelihoods are marked for
    /// recomputation.
    pub fn needs_likelihood_update(&self, node: NodeIndex) -> bool {
        self.likelihood_dirty[node]
    }

    /// Recomputes cached per-branch transition probabilities.
    ///
    /// # Arguments
    /// * `update` - `true` recomputes every branch, `false` only branches
    ///   whose cache no longer matches their length
    pub fn update_all_transition_probabilities(&mut self, update: bool) {
        for branch in &mut self.branches {
            if update || !branch.transition_probabilities_fresh() {
                branch.refresh_transition_probabilities();
            }
        }
    }

    /// Returns whether every branch's cached transition probabilities
    /// match its current length.
    pub fn transition_probabilities_fresh(&self) -> bool {
        self.branches
            .iter()
            .all(|b| b.transition_probabilities_fresh())
    }
}

// ============================================================================
// Validation (pub)
// ============================================================================
impl Tree {
    /// Validates the tree structure and all index references.
    ///
    /// Checks:
    /// - Root index is valid; root is internal with degree 2, no ancestor
    ///   and no branch
    /// - All node and branch indices match their arena positions
    /// - Neighbor references are symmetric and free of duplicates
    /// - Leaves have degree 1, non-root internal nodes degree 3
    /// - Every non-root node has an ancestor among its neighbors and a
    ///   branch whose ends are (node, ancestor)
    /// - Leaf and branch counts match the binary-tree invariants
    ///   (`2n - 1` nodes and `2n - 2` branches for `n` leaves)
    ///
    /// # Returns
    /// `true` if the tree is valid, `false` otherwise
    pub fn is_valid(&self) -> bool {
        // Check root index is set and within bounds
        if self.root_index == NO_ROOT_SET_INDEX || self.root_index >= self.nodes.len() {
            return false;
        }

        let root = &self.nodes[self.root_index];
        if root.is_leaf()
            || root.degree() != 2
            || root.ancestor().is_some()
            || root.branch().is_some()
        {
            return false;
        }

        let mut leaf_count = 0;

        // Validate each node
        for (index, node) in self.nodes.iter().enumerate() {
            // Check node index matches its arena position
            if node.index() != index {
                return false;
            }

            if node.is_leaf() {
                leaf_count += 1;
            }

            // Check degree invariant
            let expected_degree = if node.is_leaf() {
                1
            } else if index == self.root_index {
                2
            } else {
                3
            };
            if node.degree() != expected_degree {
                return false;
            }

            // Check neighbor references: in bounds, symmetric, no duplicates
            for (position, &neighbor) in node.neighbors().iter().enumerate() {
                if neighbor >= self.nodes.len() {
                    return false;
                }
                if node.neighbors()[position + 1..].contains(&neighbor) {
                    return false;
                }
                if !self.nodes[neighbor].has_neighbor(index) {
                    return false;
                }
            }

            // Check ancestor and branch references
            if index == self.root_index {
                continue;
            }
            match (node.ancestor(), node.branch()) {
                (Some(ancestor), Some(branch_index)) => {
                    if !node.has_neighbor(ancestor) {
                        return false;
                    }
                    if branch_index >= self.branches.len() {
                        return false;
                    }
                    if self.branches[branch_index].ends() != (index, ancestor) {
                        return false;
                    }
                }
                // Non-root without ancestor or branch - invalid
                _ => return false,
            }
        }

        // Check counts match binary tree invariant:
        // for n leaves, there are 2n-1 nodes and 2n-2 branches
        let expected_leaf_count = self.nodes.len().div_ceil(2);
        if leaf_count != expected_leaf_count {
            return false;
        }
        if self.branches.len() != self.nodes.len() - 1 {
            return false;
        }

        // Check branch arena positions and ownership
        for (index, branch) in self.branches.iter().enumerate() {
            if branch.index() != index {
                return false;
            }
            if self.nodes[branch.child()].branch() != Some(index) {
                return false;
            }
        }

        true
    }
}

// ============================================================================
// Printing (pub)
// ============================================================================
impl Tree {
    /// Prints a visual representation of the tree to the console.
    ///
    /// Used for diagnostics before aborting on a corrupted tree.
    ///
    /// # Example Output
    /// ```text
    /// Tree with 3 leaves (5 nodes total):
    /// Root: node 4
    ///   [4] Internal
    ///     ├─ [3] Internal (branch: 1.000)
    ///     │   ├─ [0] Leaf (branch: 1.000)
    ///     │   └─ [1] Leaf (branch: 1.000)
    ///     └─ [2] Leaf (branch: 1.000)
    /// ```
    pub fn print_tree(&self) {
        println!(
            "Tree with {} leaves ({} nodes total):",
            self.num_leaves(),
            self.nodes.len()
        );

        if self.is_root_set() {
            println!("Root: node {}", self.root_index);
            self.print_node(self.root_index, "", true);
        } else {
            println!("(No root set)");
        }
    }

    /// Helper function to recursively print a node and its descendants.
    fn print_node(&self, index: NodeIndex, prefix: &str, is_last: bool) {
        let node = &self.nodes[index];

        let connector = if prefix.is_empty() {
            ""
        } else if is_last {
            "└─ "
        } else {
            "├─ "
        };

        let kind = if node.is_leaf() { "Leaf" } else { "Internal" };
        let branch_str = match node.branch() {
            Some(branch_index) => {
                format!(" (branch: {:.3})", *self.branches[branch_index].length())
            }
            None => String::new(),
        };

        println!("{}{}[{}] {}{}", prefix, connector, index, kind, branch_str);

        let descendants = self.descendants(index);
        let new_prefix = if prefix.is_empty() {
            "  ".to_string()
        } else {
            format!("{}{}  ", prefix, if is_last { " " } else { "│" })
        };
        for (position, &descendant) in descendants.iter().enumerate() {
            self.print_node(descendant, &new_prefix, position + 1 == descendants.len());
        }
    }
}
