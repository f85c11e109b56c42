//! Root-neighborhood rearrangement move.
//!
//! [RootMove] stochastically rearranges the three-edge neighborhood around
//! the root of the tree and recomputes the lengths of the affected edges.
//! See the type-level documentation for the proposal algorithm.

use crate::model::{BranchLength, NodeIndex, Tree};
use crate::moves::utils::{min3, sort3};
use crate::moves::{ModelCoordinator, Move};
use crate::rng::UniformSource;

/// Buffer index of the last-accepted tree.
const CURRENT: usize = 0;
/// Buffer index of the proposal workspace.
const PROPOSAL: usize = 1;

/// Boundaries of the three equally likely pairing bands in the free-move
/// branch. Deliberately the historical literals, not exact thirds; the
/// bias is of order 1e-5.
const PAIRING_BAND_1: f64 = 0.33333;
const PAIRING_BAND_2: f64 = 0.66666;

// =#========================================================================#=
// ROOT MOVE
// =#========================================================================#=
/// Stochastic rearrangement of the three-edge neighborhood around the root.
///
/// The root `r` has two descendants; one internal descendant is chosen as
/// the pivot `u` with descendants `a` and `b`, and the other root
/// descendant `c` completes the neighborhood. The move rescales the
/// smallest of the three root-to-subtree heights by a log-uniform
/// multiplier with window factor 4, redraws the position of `u` on the
/// path between `r` and its nearer subtrees, and either keeps the pairing
/// `{a, b}` below `u` or exchanges `c` with `a` or `b`:
///
/// * If the new position of `u` falls above the smallest shifted height,
///   the subtree owning that height can no longer attach below `u` and
///   the new pairing is **forced**.
/// * Otherwise the move is **free** and one of the three pairings is
///   drawn uniformly.
///
/// The asymmetry between forced and free proposals is corrected by a
/// ±ln 3 Hastings term, determined by whether the forward move and the
/// reverse move are forced.
///
/// The tree state is double-buffered: `update` mutates only the proposal
/// tree; `accept`/`reject` synchronize the buffers by value. The tuning
/// constant is fixed at ln 4 and [`Move::tune`] is deliberately a no-op.
#[derive(Debug, Clone)]
pub struct RootMove {
    /// Name of this move, for the sampler's reporting
    name: String,
    /// Proposal window constant, ln 4; never adapted
    tuning: f64,
    /// How often this move has been proposed
    num_tries: u64,
    /// How often this move has been accepted
    num_accepted: u64,
    /// The two tree buffers: current and proposal
    trees: [Tree; 2],
}

impl RootMove {
    /// Creates a new root move over the given tree.
    ///
    /// The tree is cloned into the two buffers (current and proposal),
    /// which stay value-identical outside an update/accept/reject cycle.
    ///
    /// # Arguments
    /// * `name` - name of this move, for the sampler's reporting
    /// * `tree` - initial tree state
    pub fn new<S: Into<String>>(name: S, tree: Tree) -> Self {
        RootMove {
            name: name.into(),
            tuning: 4.0_f64.ln(),
            num_tries: 0,
            num_accepted: 0,
            trees: [tree.clone(), tree],
        }
    }

    /// Returns the last-accepted tree.
    pub fn current_tree(&self) -> &Tree {
        &self.trees[CURRENT]
    }

    /// Returns the proposal tree, mutated in place by [`Move::update`].
    pub fn proposal_tree(&self) -> &Tree {
        &self.trees[PROPOSAL]
    }
}

impl Move for RootMove {
    /// Proposes a rearrangement of the root neighborhood of the proposal
    /// tree.
    ///
    /// Consumes, in order: one draw to pick the pivot (only if both root
    /// descendants are internal), one draw for the height multiplier, one
    /// draw for the pivot edge position, and one draw for the pairing
    /// choice (only in the free-move branch). A fixed draw sequence
    /// reproduces identical output.
    ///
    /// # Returns
    /// The natural-log proposal-density ratio: the Jacobian of the height
    /// multiplier plus the ±ln 3 forced/free Hastings correction.
    ///
    /// # Panics
    /// Panics if the root does not have exactly two descendants, if
    /// neither descendant is internal, or if the pivot does not have
    /// exactly two descendants. These indicate a corrupted tree and are
    /// not recoverable.
    fn update(&mut self, rng: &mut dyn UniformSource, model: &mut dyn ModelCoordinator) -> f64 {
        let tree = &mut self.trees[PROPOSAL];

        // Find the area of rearrangement at the root of the tree
        let root = tree.root_index();
        let root_descendants = tree.descendants(root);
        if root_descendants.len() != 2 {
            panic!(
                "Root should have two descendants, found {}",
                root_descendants.len()
            );
        }

        let mut potential_pivots = Vec::with_capacity(2);
        for &descendant in &root_descendants {
            if !tree[descendant].is_leaf() {
                potential_pivots.push(descendant);
            }
        }
        let u = match potential_pivots.len() {
            1 => potential_pivots[0],
            2 => potential_pivots[(2.0 * rng.uniform()) as usize],
            _ => panic!("Root should have at least one internal descendant"),
        };
        let v = match tree[u].ancestor() {
            Some(ancestor) => ancestor,
            None => panic!("Pivot node {} should have an ancestor", u),
        };
        let c = if u == root_descendants[0] {
            root_descendants[1]
        } else {
            root_descendants[0]
        };
        let pivot_descendants = tree.descendants(u);
        if pivot_descendants.len() != 2 {
            tree.print_tree();
            panic!(
                "Pivot node {} should have two descendants, found {}",
                u,
                pivot_descendants.len()
            );
        }
        let a = pivot_descendants[0];
        let b = pivot_descendants[1];

        // Get lengths of the four branches of the neighborhood
        let len_a = *tree.my_branch(a).length();
        let len_b = *tree.my_branch(b).length();
        let len_c = *tree.my_branch(c).length();
        let len_u = *tree.my_branch(u).length();

        // The reverse move is forced when u currently sits above the
        // sibling subtree's height
        let is_forced_back_move = len_u >= len_c;

        // Heights of the three subtrees measured from the far side of the
        // pivot edge
        let height_a = len_a + len_u;
        let height_b = len_b + len_u;
        let height_c = len_c;

        // Log-uniform multiplier proposal on the smallest height, window
        // factor 4; shift all three heights by the resulting delta
        let old_h1 = min3(height_a, height_b, height_c);
        let new_h1 = old_h1 * (self.tuning * (rng.uniform() - 0.5)).exp();
        let delta = new_h1 - old_h1;
        let shifted_a = height_a + delta;
        let shifted_b = height_b + delta;
        let shifted_c = height_c + delta;

        let (h, owner) = sort3([shifted_a, shifted_b, shifted_c]);
        // Shifted heights indexed back by original subtree (0 = a, 1 = b,
        // 2 = c); used by the free-move branch
        let mut new_shifted = [0.0; 3];
        for i in 0..3 {
            new_shifted[owner[i]] = h[i];
        }

        // New position of u on the pivot edge, below the second-smallest
        // shifted height
        let x = rng.uniform() * h[1];

        // Jacobian of the multiplier step
        let mut ln_proposal_ratio = new_h1.ln() - old_h1.ln();

        let mut is_forced_forward_move = false;
        if x > h[0] {
            // The subtree owning the smallest shifted height can no longer
            // attach below u; the new pairing is forced
            is_forced_forward_move = true;
            match owner[0] {
                0 => {
                    // a is shortest, (b,c) forced below u
                    rewire(tree, u, v, a, c);
                    tree.my_branch_mut(u).set_length(BranchLength::new(x));
                    tree.my_branch_mut(a).set_length(BranchLength::new(shifted_a));
                    tree.my_branch_mut(b)
                        .set_length(BranchLength::new(shifted_b - x));
                    tree.my_branch_mut(c)
                        .set_length(BranchLength::new(shifted_c - x));
                }
                1 => {
                    // b is shortest, (a,c) forced below u
                    rewire(tree, u, v, b, c);
                    tree.my_branch_mut(u).set_length(BranchLength::new(x));
                    tree.my_branch_mut(a)
                        .set_length(BranchLength::new(shifted_a - x));
                    tree.my_branch_mut(b).set_length(BranchLength::new(shifted_b));
                    tree.my_branch_mut(c)
                        .set_length(BranchLength::new(shifted_c - x));
                }
                _ => {
                    // c is shortest, (a,b) forced; topology unchanged
                    tree.my_branch_mut(u).set_length(BranchLength::new(x));
                    tree.my_branch_mut(a)
                        .set_length(BranchLength::new(shifted_a - x));
                    tree.my_branch_mut(b)
                        .set_length(BranchLength::new(shifted_b - x));
                    tree.my_branch_mut(c).set_length(BranchLength::new(shifted_c));
                }
            }
        } else {
            // Free move: draw one of the three pairings uniformly
            let ran = rng.uniform();
            if ran <= PAIRING_BAND_1 {
                // Pair a with c: b moves up to v, c moves down to u
                rewire(tree, u, v, b, c);
                tree.my_branch_mut(u).set_length(BranchLength::new(x));
                tree.my_branch_mut(a)
                    .set_length(BranchLength::new(new_shifted[0] - x));
                tree.my_branch_mut(b)
                    .set_length(BranchLength::new(new_shifted[1]));
                tree.my_branch_mut(c)
                    .set_length(BranchLength::new(new_shifted[2] - x));
            } else if ran <= PAIRING_BAND_2 {
                // Pair b with c: a moves up to v, c moves down to u
                rewire(tree, u, v, a, c);
                tree.my_branch_mut(u).set_length(BranchLength::new(x));
                tree.my_branch_mut(a)
                    .set_length(BranchLength::new(new_shifted[0]));
                tree.my_branch_mut(b)
                    .set_length(BranchLength::new(new_shifted[1] - x));
                tree.my_branch_mut(c)
                    .set_length(BranchLength::new(new_shifted[2] - x));
            } else {
                // No topology change
                tree.my_branch_mut(u).set_length(BranchLength::new(x));
                tree.my_branch_mut(a)
                    .set_length(BranchLength::new(new_shifted[0] - x));
                tree.my_branch_mut(b)
                    .set_length(BranchLength::new(new_shifted[1] - x));
                tree.my_branch_mut(c)
                    .set_length(BranchLength::new(new_shifted[2]));
            }
        }

        // Hastings correction for the mismatch between the forward and
        // backward branching factors
        if !is_forced_forward_move && is_forced_back_move {
            ln_proposal_ratio += 3.0_f64.ln();
        } else if is_forced_forward_move && !is_forced_back_move {
            ln_proposal_ratio += (1.0 / 3.0_f64).ln();
        }

        // Refresh the traversal and caches the likelihood machinery
        // depends on, and notify the model
        tree.initialize_down_pass_sequence();
        tree.flip_all_active_conditional_likelihoods();
        tree.update_all_conditional_likelihoods(true);
        tree.update_all_transition_probabilities(true);
        model.update_transition_probabilities();

        ln_proposal_ratio
    }

    fn accept(&mut self) {
        self.num_tries += 1;
        self.num_accepted += 1;

        let [current, proposal] = &mut self.trees;
        current.clone_from(proposal);
    }

    fn reject(&mut self, model: &mut dyn ModelCoordinator) {
        self.num_tries += 1;

        let [current, proposal] = &mut self.trees;
        proposal.clone_from(current);
        // The restored proposal may carry stale partial updates
        proposal.update_all_transition_probabilities(true);
        model.update_transition_probabilities();
    }

    fn restore(&mut self) {}

    fn tune(&mut self) {
        // Fixed proposal window (ln 4); this move does not self-tune
    }

    /// Returns a single-element placeholder; this move computes no live
    /// diagnostic value.
    fn values(&self) -> Vec<f64> {
        vec![0.0]
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn num_tries(&self) -> u64 {
        self.num_tries
    }

    fn num_accepted(&self) -> u64 {
        self.num_accepted
    }
}

// ============================================================================
// Rewire primitive
// ============================================================================
/// Exchanges two children across the pivot edge: `moved` (currently
/// attached to `u`) moves up to `v`, and `displaced` (currently attached
/// to `v`) moves down to `u`. Updates both neighbor sets, both ancestor
/// references, and both branch endpoints; a single logical step with no
/// externally observable intermediate state.
fn rewire(tree: &mut Tree, u: NodeIndex, v: NodeIndex, moved: NodeIndex, displaced: NodeIndex) {
    tree[u].remove_neighbor(moved);
    tree[u].add_neighbor(displaced);
    tree[v].remove_neighbor(displaced);
    tree[v].add_neighbor(moved);

    tree[moved].remove_neighbor(u);
    tree[moved].add_neighbor(v);
    tree[moved].set_ancestor(Some(v));
    tree[displaced].remove_neighbor(v);
    tree[displaced].add_neighbor(u);
    tree[displaced].set_ancestor(Some(u));

    tree.my_branch_mut(moved).set_ends(moved, v);
    tree.my_branch_mut(displaced).set_ends(displaced, u);
}
