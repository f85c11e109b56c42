//! Data model for the mutable phylogenetic tree a sampler operates on.
//!
//! # Tree representation
//! Trees are represented by [Tree], which uses the arena pattern to store
//! [Node]s and [Branch]es, referenced by [NodeIndex] and [BranchIndex].
//! The representation is that of an unrooted binary tree with a designated
//! root:
//!
//! | Node kind | Degree | Ancestor | Outgoing branch |
//! |-----------|--------|----------|-----------------|
//! | Leaf | 1 | yes | yes |
//! | Root | 2 | no | no |
//! | Other internal | 3 | yes | yes |
//!
//! Each node keeps an unordered neighbor set and designates one neighbor
//! as its ancestor; the branch to the ancestor is owned by the child side.
//! Proposal moves rearrange the tree purely by rewiring these references
//! and updating branch lengths.
//!
//! # Cache maintenance
//! [Tree] also carries the caches the surrounding likelihood machinery
//! depends on and that must be refreshed after any mutation: the
//! post-order down-pass sequence, per-node conditional-likelihood flags,
//! and per-branch transition-probability freshness markers. The moves in
//! [crate::moves] call the corresponding maintenance hooks after every
//! proposal.

pub mod branch;
pub mod node;
pub mod tree;

pub use branch::Branch;
pub use branch::BranchIndex;
pub use branch::BranchLength;
pub use node::Node;
pub use node::NodeIndex;
pub use tree::Tree;
