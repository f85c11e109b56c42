//! Branch module for the tree graph.
//!
//! A [Branch] connects a node to its designated ancestor and carries the
//! evolutionary distance between them. Branches live in the tree's arena
//! and are referenced by [BranchIndex]; the node on the child side owns
//! the reference to its outgoing branch.

use crate::model::node::NodeIndex;
use std::ops::Deref;

/// Index of a branch in a tree (arena).
pub type BranchIndex = usize;

// =#========================================================================#=
// BRANCH
// =#========================================================================#=
/// An edge of the tree, connecting exactly two nodes.
///
/// Ends are stored child-first: `ends.0` is the node that owns this branch,
/// `ends.1` its ancestor. Updating a node's ancestor requires updating the
/// branch ends to match via [`Branch::set_ends`].
///
/// Besides its [BranchLength], a branch tracks for which length the
/// substitution-model transition probabilities were last computed. The
/// probability matrices themselves belong to the model layer; this marker
/// is what lets the tree report whether that cache is stale.
///
/// # Invariants
/// - `index` is the position of this branch in the tree arena
/// - `length` is non-negative and finite (guaranteed by [BranchLength])
/// - `ends.0` is a non-root node with `ends.1` as its ancestor
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    /// Index of this branch in the tree arena
    index: BranchIndex,
    /// Connected nodes as (child, ancestor)
    ends: (NodeIndex, NodeIndex),
    /// Distance between the two ends
    length: BranchLength,
    /// Length the cached transition probabilities were computed for;
    /// `None` until first computed
    tp_computed_for: Option<f64>,
}

impl Branch {
    /// Creates a new branch.
    ///
    /// # Arguments
    /// * `index` - The unique index of this branch in the tree (arena)
    /// * `ends` - Connected nodes as (child, ancestor)
    /// * `length` - Distance between the ends
    pub fn new(index: BranchIndex, ends: (NodeIndex, NodeIndex), length: BranchLength) -> Self {
        Branch {
            index,
            ends,
            length,
            tp_computed_for: None,
        }
    }

    /// Returns the index of this branch.
    pub fn index(&self) -> BranchIndex {
        self.index
    }

    /// Returns the two ends of this branch as (child, ancestor).
    pub fn ends(&self) -> (NodeIndex, NodeIndex) {
        self.ends
    }

    /// Returns the node on the child side of this branch.
    pub fn child(&self) -> NodeIndex {
        self.ends.0
    }

    /// Returns the node on the ancestor side of this branch.
    pub fn ancestor(&self) -> NodeIndex {
        self.ends.1
    }

    /// Sets the ends of this branch, child side first.
    ///
    /// Called when a rearrangement changes which node hangs below this
    /// branch; the caller is responsible for updating the nodes' ancestor
    /// references to match.
    pub fn set_ends(&mut self, child: NodeIndex, ancestor: NodeIndex) {
        self.ends = (child, ancestor);
    }

    /// Returns the length of this branch.
    pub fn length(&self) -> BranchLength {
        self.length
    }

    /// Sets the length of this branch.
    ///
    /// A length change makes the cached transition probabilities stale
    /// until the next refresh.
    pub fn set_length(&mut self, length: BranchLength) {
        self.length = length;
    }

    /// Returns whether the cached transition probabilities match the
    /// current branch length.
    pub fn transition_probabilities_fresh(&self) -> bool {
        self.tp_computed_for == Some(*self.length)
    }

    /// Recomputes the cached transition probabilities for the current
    /// length, marking them fresh.
    pub fn refresh_transition_probabilities(&mut self) {
        self.tp_computed_for = Some(*self.length);
    }
}

// =#========================================================================#=
// BRANCH LENGTH
// =#========================================================================#=
/// Branch length in a phylogenetic tree, enforced non-negative.
///
/// Represents the evolutionary distance between a node and its ancestor.
/// The value is guaranteed to be non-negative and finite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchLength(f64);

impl BranchLength {
    /// Creates a new branch length.
    ///
    /// # Arguments
    /// * `length` - The branch length value (must be non-negative)
    ///
    /// # Panics
    /// Panics if `length` is negative or not finite.
    pub fn new(length: f64) -> Self {
        assert!(
            length >= 0.0,
            "Branch length must be non-negative, got {}",
            length
        );
        assert!(
            length.is_finite(),
            "Branch length must be finite, got {}",
            length
        );
        BranchLength(length)
    }
}

impl Deref for BranchLength {
    type Target = f64;
    fn deref(&self) -> &f64 {
        &self.0
    }
}
