use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rootmove::model::{BranchLength, Tree};
use rootmove::moves::{ModelCoordinator, Move, RootMove};
use rootmove::rng::{RngSource, ScriptedSource};

const TOLERANCE: f64 = 1e-9;

/// Model coordinator stub counting notifications.
#[derive(Default)]
struct CountingModel {
    notifications: usize,
}

impl ModelCoordinator for CountingModel {
    fn update_transition_probabilities(&mut self) {
        self.notifications += 1;
    }
}

/// Builds ((a,b),c): root r with internal child u and leaf child c, and
/// leaves a and b below u. Returns the tree and the indices [a, b, c, u, r].
fn three_leaf_tree(len_a: f64, len_b: f64, len_c: f64, len_u: f64) -> (Tree, [usize; 5]) {
    let mut tree = Tree::new(3);
    let a = tree.add_leaf();
    let b = tree.add_leaf();
    let c = tree.add_leaf();
    let u = tree.add_internal();
    let r = tree.add_root();
    tree.connect(a, u, BranchLength::new(len_a));
    tree.connect(b, u, BranchLength::new(len_b));
    tree.connect(u, r, BranchLength::new(len_u));
    tree.connect(c, r, BranchLength::new(len_c));
    tree.initialize_down_pass_sequence();
    (tree, [a, b, c, u, r])
}

/// Builds ((a,b),(d,e)) with unit branch lengths: both root descendants
/// are internal. Returns the tree and the indices [a, b, d, e, u1, u2, r].
fn four_leaf_tree() -> (Tree, [usize; 7]) {
    let mut tree = Tree::new(4);
    let a = tree.add_leaf();
    let b = tree.add_leaf();
    let d = tree.add_leaf();
    let e = tree.add_leaf();
    let u1 = tree.add_internal();
    let u2 = tree.add_internal();
    let r = tree.add_root();
    tree.connect(a, u1, BranchLength::new(1.0));
    tree.connect(b, u1, BranchLength::new(1.0));
    tree.connect(d, u2, BranchLength::new(1.0));
    tree.connect(e, u2, BranchLength::new(1.0));
    tree.connect(u1, r, BranchLength::new(1.0));
    tree.connect(u2, r, BranchLength::new(1.0));
    tree.initialize_down_pass_sequence();
    (tree, [a, b, d, e, u1, u2, r])
}

/// Asserts that two trees agree on topology and branch lengths (within
/// tolerance), ignoring neighbor order and cache state.
fn assert_trees_equivalent(x: &Tree, y: &Tree) {
    assert_eq!(x.num_nodes(), y.num_nodes());
    for node in 0..x.num_nodes() {
        assert_eq!(x[node].is_leaf(), y[node].is_leaf(), "leaf flag of {node}");
        let mut x_neighbors = x[node].neighbors().to_vec();
        let mut y_neighbors = y[node].neighbors().to_vec();
        x_neighbors.sort_unstable();
        y_neighbors.sort_unstable();
        assert_eq!(x_neighbors, y_neighbors, "neighbors of node {node}");
        assert_eq!(x[node].ancestor(), y[node].ancestor(), "ancestor of {node}");
        if x[node].ancestor().is_some() {
            let x_length = *x.my_branch(node).length();
            let y_length = *y.my_branch(node).length();
            assert!(
                (x_length - y_length).abs() < TOLERANCE,
                "length of node {node}: {x_length} vs {y_length}"
            );
        }
    }
}

// ============= Scenario Tests (scripted draws) =============

#[test]
fn test_free_move_without_topology_change() {
    // Unit lengths: heights are (2, 2, 1), so the smallest is the sibling
    // side. Multiplier draw 0.5 leaves the heights unshifted; position
    // draw 0.25 puts u at 0.25 * 2.0 = 0.5 <= 1.0, a free move; pairing
    // draw 0.9 keeps the topology.
    let (tree, [a, b, c, u, r]) = three_leaf_tree(1.0, 1.0, 1.0, 1.0);
    let mut root_move = RootMove::new("root", tree);
    let mut source = ScriptedSource::new([0.5, 0.25, 0.9]);
    let mut model = CountingModel::default();

    let ln_ratio = root_move.update(&mut source, &mut model);

    // Only internal root descendant: no pivot draw was consumed
    assert_eq!(source.remaining(), 0);

    let proposal = root_move.proposal_tree();
    assert!(proposal.is_valid());
    assert_eq!(*proposal.my_branch(u).length(), 0.5);
    assert_eq!(*proposal.my_branch(a).length(), 1.5);
    assert_eq!(*proposal.my_branch(b).length(), 1.5);
    assert_eq!(*proposal.my_branch(c).length(), 1.0);

    // Topology unchanged
    assert_eq!(proposal.descendants(u), vec![a, b]);
    assert_eq!(proposal.descendants(r), vec![u, c]);

    // Reverse move is forced (1.0 >= 1.0), forward is free: +ln 3
    assert!((ln_ratio - 3.0_f64.ln()).abs() < TOLERANCE);
}

#[test]
fn test_forced_move_swaps_shortest_subtree() {
    // Heights are (1.0, 1.5, 2.0); position draw 0.75 puts u at
    // 0.75 * 1.5 = 1.125 > 1.0, above subtree a: the pairing (b,c) below
    // u is forced and a moves up to the root.
    let (tree, [a, b, c, u, r]) = three_leaf_tree(0.5, 1.0, 2.0, 0.5);
    let mut root_move = RootMove::new("root", tree);
    let mut source = ScriptedSource::new([0.5, 0.75]);

    let ln_ratio = root_move.update(&mut source, &mut CountingModel::default());

    assert_eq!(source.remaining(), 0);

    let proposal = root_move.proposal_tree();
    assert!(proposal.is_valid());

    // a now hangs from the root, c below the pivot
    assert_eq!(proposal[a].ancestor(), Some(r));
    assert_eq!(proposal[c].ancestor(), Some(u));
    assert_eq!(proposal.my_branch(a).ends(), (a, r));
    assert_eq!(proposal.my_branch(c).ends(), (c, u));
    let mut pivot_descendants = proposal.descendants(u);
    pivot_descendants.sort_unstable();
    let mut expected = vec![b, c];
    expected.sort_unstable();
    assert_eq!(pivot_descendants, expected);

    assert_eq!(*proposal.my_branch(u).length(), 1.125);
    assert_eq!(*proposal.my_branch(a).length(), 1.0);
    assert_eq!(*proposal.my_branch(b).length(), 0.375);
    assert_eq!(*proposal.my_branch(c).length(), 0.875);

    // Forward forced, reverse free (0.5 < 2.0): ln(1/3)
    assert!((ln_ratio - (1.0 / 3.0_f64).ln()).abs() < TOLERANCE);
}

#[test]
fn test_reverse_draws_undo_forced_move() {
    let (tree, _) = three_leaf_tree(0.5, 1.0, 2.0, 0.5);
    let original = tree.clone();
    let mut root_move = RootMove::new("root", tree);

    // Forward: forced move as in test_forced_move_swaps_shortest_subtree
    let mut forward = ScriptedSource::new([0.5, 0.75]);
    let forward_ratio = root_move.update(&mut forward, &mut CountingModel::default());
    root_move.accept();

    // Reverse: in the rearranged neighborhood the second-smallest height
    // is 1.5, so a position draw of 0.5 / 1.5 puts u back at 0.5; the
    // first pairing band re-pairs the moved subtrees.
    let second_height = (1.5 - 1.125) + 1.125;
    let mut reverse = ScriptedSource::new([0.5, 0.5 / second_height, 0.2]);
    let reverse_ratio = root_move.update(&mut reverse, &mut CountingModel::default());

    assert_trees_equivalent(root_move.proposal_tree(), &original);

    // The +/- ln 3 corrections cancel; the multiplier Jacobians are zero
    assert!((forward_ratio + reverse_ratio).abs() < 1e-12);
}

#[test]
fn test_no_correction_when_both_directions_forced() {
    // Heights are (2.5, 3.0, 0.5); position draw 0.5 puts u at 1.25 above
    // the sibling subtree: forced forward without topology change. The
    // reverse move is forced as well (2.0 >= 0.5), so no correction.
    let (tree, [a, b, c, u, r]) = three_leaf_tree(0.5, 1.0, 0.5, 2.0);
    let mut root_move = RootMove::new("root", tree);
    let mut source = ScriptedSource::new([0.5, 0.5]);

    let ln_ratio = root_move.update(&mut source, &mut CountingModel::default());

    assert_eq!(source.remaining(), 0);

    let proposal = root_move.proposal_tree();
    assert!(proposal.is_valid());
    assert_eq!(proposal.descendants(u), vec![a, b]);
    assert_eq!(proposal.descendants(r), vec![u, c]);
    assert_eq!(*proposal.my_branch(u).length(), 1.25);
    assert_eq!(*proposal.my_branch(a).length(), 1.25);
    assert_eq!(*proposal.my_branch(b).length(), 1.75);
    assert_eq!(*proposal.my_branch(c).length(), 0.5);

    assert!(ln_ratio.abs() < TOLERANCE);
}

#[test]
fn test_no_correction_when_both_directions_free() {
    // Reverse not forced (0.5 < 2.0) and position draw keeps the forward
    // move free: the ratio is exactly the (zero) multiplier Jacobian.
    let (tree, _) = three_leaf_tree(0.5, 1.0, 2.0, 0.5);
    let mut root_move = RootMove::new("root", tree);
    let mut source = ScriptedSource::new([0.5, 0.2, 0.9]);

    let ln_ratio = root_move.update(&mut source, &mut CountingModel::default());

    assert_eq!(source.remaining(), 0);
    assert!(ln_ratio.abs() < 1e-15);
}

#[test]
fn test_multiplier_jacobian_enters_ratio() {
    // Multiplier draw 0.75 rescales the smallest height by
    // exp(ln 4 * 0.25); free move with forced reverse adds ln 3 on top.
    let (tree, _) = three_leaf_tree(1.0, 1.0, 1.0, 1.0);
    let mut root_move = RootMove::new("root", tree);
    let mut source = ScriptedSource::new([0.75, 0.1, 0.9]);

    let ln_ratio = root_move.update(&mut source, &mut CountingModel::default());

    let expected = 0.25 * 4.0_f64.ln() + 3.0_f64.ln();
    assert!((ln_ratio - expected).abs() < TOLERANCE);
}

#[test]
fn test_pivot_draw_consumed_when_both_descendants_internal() {
    let (tree, [_, _, d, e, u1, u2, _]) = four_leaf_tree();
    let mut root_move = RootMove::new("root", tree);
    // Pivot draw 0.6 selects the second candidate u2; then a free move
    // without topology change: u2 goes to 0.2 * 2.0 = 0.4
    let mut source = ScriptedSource::new([0.6, 0.5, 0.2, 0.9]);

    let ln_ratio = root_move.update(&mut source, &mut CountingModel::default());

    assert_eq!(source.remaining(), 0);

    let proposal = root_move.proposal_tree();
    assert!(proposal.is_valid());
    assert_eq!(*proposal.my_branch(u2).length(), 0.4);
    assert_eq!(*proposal.my_branch(d).length(), 1.6);
    assert_eq!(*proposal.my_branch(e).length(), 1.6);
    // The unchosen subtree is untouched
    assert_eq!(*proposal.my_branch(u1).length(), 1.0);

    assert!((ln_ratio - 3.0_f64.ln()).abs() < TOLERANCE);
}

#[test]
fn test_pivot_draw_below_half_selects_first_candidate() {
    let (tree, [a, b, _, _, u1, u2, _]) = four_leaf_tree();
    let mut root_move = RootMove::new("root", tree);
    let mut source = ScriptedSource::new([0.3, 0.5, 0.2, 0.9]);

    root_move.update(&mut source, &mut CountingModel::default());

    let proposal = root_move.proposal_tree();
    assert_eq!(*proposal.my_branch(u1).length(), 0.4);
    assert_eq!(*proposal.my_branch(a).length(), 1.6);
    assert_eq!(*proposal.my_branch(b).length(), 1.6);
    assert_eq!(*proposal.my_branch(u2).length(), 1.0);
}

// ============= Accept / Reject Tests =============

#[test]
fn test_accept_synchronizes_current_with_proposal() {
    let (tree, _) = three_leaf_tree(1.0, 1.0, 1.0, 1.0);
    let mut root_move = RootMove::new("root", tree);
    let mut source = ScriptedSource::new([0.5, 0.25, 0.9]);

    root_move.update(&mut source, &mut CountingModel::default());
    assert_ne!(root_move.current_tree(), root_move.proposal_tree());

    root_move.accept();

    assert_eq!(root_move.current_tree(), root_move.proposal_tree());
    assert_eq!(root_move.num_tries(), 1);
    assert_eq!(root_move.num_accepted(), 1);
}

#[test]
fn test_reject_restores_proposal_from_current() {
    let (tree, _) = three_leaf_tree(1.0, 1.0, 1.0, 1.0);
    let original = tree.clone();
    let mut root_move = RootMove::new("root", tree);
    let mut source = ScriptedSource::new([0.5, 0.25, 0.9]);
    let mut model = CountingModel::default();

    root_move.update(&mut source, &mut model);
    root_move.reject(&mut model);

    assert_trees_equivalent(root_move.proposal_tree(), &original);
    assert_trees_equivalent(root_move.current_tree(), &original);
    assert_eq!(root_move.num_tries(), 1);
    assert_eq!(root_move.num_accepted(), 0);

    // The restored proposal's transition probabilities are fresh again
    assert!(root_move.proposal_tree().transition_probabilities_fresh());

    // Notified once by update and once by reject
    assert_eq!(model.notifications, 2);
}

// ============= Maintenance Tests =============

#[test]
fn test_update_refreshes_traversal_and_caches() {
    let (tree, _) = three_leaf_tree(1.0, 1.0, 1.0, 1.0);
    let mut root_move = RootMove::new("root", tree);
    let flags_before: Vec<bool> = (0..root_move.proposal_tree().num_nodes())
        .map(|n| root_move.proposal_tree().active_conditional_likelihood(n))
        .collect();
    let mut source = ScriptedSource::new([0.5, 0.25, 0.9]);
    let mut model = CountingModel::default();

    root_move.update(&mut source, &mut model);

    let proposal = root_move.proposal_tree();

    // Down-pass rebuilt: a valid post-order of the mutated tree
    let sequence = proposal.down_pass_sequence();
    assert_eq!(sequence.len(), proposal.num_nodes());
    assert_eq!(*sequence.last().unwrap(), proposal.root_index());
    for (position, &node) in sequence.iter().enumerate() {
        if let Some(ancestor) = proposal[node].ancestor() {
            let ancestor_position = sequence.iter().position(|&n| n == ancestor).unwrap();
            assert!(position < ancestor_position, "node {node} after its ancestor");
        }
    }

    // Conditional-likelihood flags flipped and marked for recomputation
    for node in 0..proposal.num_nodes() {
        assert_eq!(
            proposal.active_conditional_likelihood(node),
            !flags_before[node]
        );
        assert!(proposal.needs_likelihood_update(node));
    }

    // Transition probabilities recomputed, model notified exactly once
    assert!(proposal.transition_probabilities_fresh());
    assert_eq!(model.notifications, 1);
}

// ============= Determinism Tests =============

#[test]
fn test_identical_seeds_give_identical_chains() {
    let (tree, _) = four_leaf_tree();
    let mut first_move = RootMove::new("root", tree.clone());
    let mut second_move = RootMove::new("root", tree);
    let mut first_rng = RngSource(ChaCha8Rng::seed_from_u64(7));
    let mut second_rng = RngSource(ChaCha8Rng::seed_from_u64(7));

    for _ in 0..25 {
        let first_ratio = first_move.update(&mut first_rng, &mut CountingModel::default());
        let second_ratio = second_move.update(&mut second_rng, &mut CountingModel::default());
        assert_eq!(first_ratio, second_ratio);
        first_move.accept();
        second_move.accept();
    }

    assert_eq!(first_move.proposal_tree(), second_move.proposal_tree());
    assert_eq!(first_move.current_tree(), second_move.current_tree());
}

#[test]
fn test_long_run_preserves_invariants() {
    let (tree, _) = four_leaf_tree();
    let mut root_move = RootMove::new("root", tree);
    let mut rng = RngSource(ChaCha8Rng::seed_from_u64(42));
    let mut model = CountingModel::default();

    for iteration in 0..200 {
        let ln_ratio = root_move.update(&mut rng, &mut model);
        assert!(ln_ratio.is_finite());
        assert!(root_move.proposal_tree().is_valid());

        // Deterministic stand-in for the sampler's accept/reject decision
        if iteration % 3 == 0 {
            root_move.accept();
        } else {
            root_move.reject(&mut model);
            assert!(root_move.proposal_tree().transition_probabilities_fresh());
        }
        assert!(root_move.current_tree().is_valid());
    }

    assert_eq!(root_move.num_tries(), 200);
    assert_eq!(root_move.num_accepted(), 67);
}

// ============= Contract Tests =============

#[test]
fn test_name_values_and_noops() {
    let (tree, _) = three_leaf_tree(1.0, 1.0, 1.0, 1.0);
    let mut root_move = RootMove::new("kakapo root move", tree);

    assert_eq!(root_move.name(), "kakapo root move");
    assert_eq!(root_move.values(), vec![0.0]);

    // restore and tune are deliberate no-ops
    root_move.restore();
    root_move.tune();
    assert_eq!(root_move.num_tries(), 0);
    assert_eq!(root_move.current_tree(), root_move.proposal_tree());
}

#[test]
#[should_panic(expected = "internal descendant")]
fn test_update_panics_when_both_root_descendants_are_leaves() {
    let mut tree = Tree::new(2);
    let a = tree.add_leaf();
    let b = tree.add_leaf();
    let r = tree.add_root();
    tree.connect(a, r, BranchLength::new(1.0));
    tree.connect(b, r, BranchLength::new(1.0));
    tree.initialize_down_pass_sequence();

    let mut root_move = RootMove::new("root", tree);
    let mut source = ScriptedSource::new([0.5, 0.5, 0.5]);
    root_move.update(&mut source, &mut CountingModel::default());
}
