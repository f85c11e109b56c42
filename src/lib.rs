//! Rootmove provides the root-neighborhood proposal move of a
//! Metropolis-Hastings sampler for Bayesian phylogenetic tree inference.
//!
//! Given the current unrooted binary tree (with a designated root of
//! degree 2 and branch lengths), [RootMove](moves::RootMove)
//! stochastically rearranges the three-edge neighborhood around the root,
//! recomputes the lengths of the affected edges in place, and returns the
//! natural-log proposal-density ratio the sampler needs to preserve
//! detailed balance. Core functionality provided:
//! - Tree model: arena-based [Tree](model::Tree) of nodes with unordered
//!   neighbor sets, designated ancestors, and child-owned branches,
//!   together with the maintenance hooks the likelihood machinery relies
//!   on (post-order rebuild, conditional-likelihood flags,
//!   transition-probability freshness). See [crate::model].
//! - Move family: the [Move](moves::Move) trait with the
//!   update/accept/reject/restore/tune contract the sampler loop drives,
//!   and the [ModelCoordinator](moves::ModelCoordinator) notification
//!   seam. See [crate::moves].
//! - Randomness: a one-primitive [UniformSource](rng::UniformSource)
//!   seam with an adapter over any [`rand`] generator and a scripted
//!   replay source for draw-exact testing. See [crate::rng].
//!
//! Limitations:
//! - Only binary trees with a degree-2 root
//! - Likelihood computation, tree parsing/serialization, and the sampler
//!   loop itself live outside this crate
//!
//! # Example
//! Propose, then accept or reject:
//! ```
//! use rootmove::model::{BranchLength, Tree};
//! use rootmove::moves::{Move, RootMove};
//! use rootmove::rng::RngSource;
//! use rand::SeedableRng;
//!
//! // ((a,b),c) with unit branch lengths
//! let mut tree = Tree::new(3);
//! let a = tree.add_leaf();
//! let b = tree.add_leaf();
//! let c = tree.add_leaf();
//! let u = tree.add_internal();
//! let r = tree.add_root();
//! tree.connect(a, u, BranchLength::new(1.0));
//! tree.connect(b, u, BranchLength::new(1.0));
//! tree.connect(u, r, BranchLength::new(1.0));
//! tree.connect(c, r, BranchLength::new(1.0));
//! tree.initialize_down_pass_sequence();
//! assert!(tree.is_valid());
//!
//! let mut root_move = RootMove::new("root rearrangement", tree);
//! let mut rng = RngSource(rand::rngs::StdRng::seed_from_u64(42));
//!
//! let ln_ratio = root_move.update(&mut rng, &mut ());
//! assert!(ln_ratio.is_finite());
//!
//! // The sampler would combine ln_ratio with the prior and likelihood
//! // ratios; here we simply accept
//! root_move.accept();
//! assert_eq!(root_move.current_tree(), root_move.proposal_tree());
//! ```

pub mod model;
pub mod moves;
pub mod rng;

pub use model::BranchLength;
pub use model::Tree;
pub use moves::Move;
pub use moves::ModelCoordinator;
pub use moves::RootMove;
pub use rng::RngSource;
pub use rng::ScriptedSource;
pub use rng::UniformSource;
