//! Proposal moves for the Metropolis-Hastings sampler.
//!
//! A move perturbs part of the sampler state and reports the natural-log
//! proposal-density ratio needed to preserve detailed balance. All moves
//! implement the [Move] trait; the sampler loop drives them through the
//! update/accept/reject cycle:
//!
//! 1. [`Move::update`] mutates the move's proposal state in place, drawing
//!    randomness from a [UniformSource](crate::rng::UniformSource), and
//!    returns the log proposal-density ratio.
//! 2. The sampler combines that ratio with the prior and likelihood ratios
//!    and decides.
//! 3. [`Move::accept`] or [`Move::reject`] synchronizes the move's buffered
//!    state and refreshes dependent caches.
//!
//! After any mutation a move notifies the [ModelCoordinator] so globally
//! cached transition-probability state can be refreshed.
//!
//! Provided moves:
//! * [RootMove] - stochastic rearrangement of the three-edge neighborhood
//!   around the root

pub mod root;
pub mod utils;

pub use root::RootMove;

use crate::rng::UniformSource;

// =#========================================================================#=
// MODEL COORDINATOR TRAIT
// =#========================================================================#=
/// The model object coordinating globally cached state across parameters.
///
/// Moves call [`ModelCoordinator::update_transition_probabilities`]
/// unconditionally after any length or topology change, and inside
/// [`Move::reject`].
pub trait ModelCoordinator {
    /// Refreshes any globally cached transition-probability state.
    fn update_transition_probabilities(&mut self);
}

/// No-op coordinator for benchmarks and moves run outside a full model.
impl ModelCoordinator for () {
    fn update_transition_probabilities(&mut self) {}
}

// =#========================================================================#=
// MOVE TRAIT
// =#========================================================================#=
/// Contract between the sampler loop and a proposal move.
///
/// A move owns its parameter state double-buffered: the last-accepted
/// *current* state and the *proposal* workspace mutated by
/// [`Move::update`]. Outside an in-flight update/accept/reject cycle the
/// two buffers are value-identical.
pub trait Move {
    /// Proposes a new state by mutating the proposal buffer in place.
    ///
    /// # Arguments
    /// * `rng` - source of uniform draws on `[0, 1)`
    /// * `model` - coordinator notified after the mutation
    ///
    /// # Returns
    /// The natural-log proposal-density ratio (Hastings correction
    /// included), a finite number.
    fn update(&mut self, rng: &mut dyn UniformSource, model: &mut dyn ModelCoordinator) -> f64;

    /// Accepts the in-flight proposal: the current buffer takes the value
    /// of the proposal buffer, and both the try and accept counters are
    /// incremented.
    fn accept(&mut self);

    /// Rejects the in-flight proposal: the proposal buffer is restored
    /// from the current buffer, its dependent caches are recomputed, the
    /// coordinator is notified, and only the try counter is incremented.
    fn reject(&mut self, model: &mut dyn ModelCoordinator);

    /// Restores auxiliary state after a rejected proposal; a no-op for
    /// moves without such state.
    fn restore(&mut self);

    /// Adapts the proposal window based on the acceptance history; a
    /// no-op for moves with a fixed window.
    fn tune(&mut self);

    /// Returns the diagnostic values of this move.
    fn values(&self) -> Vec<f64>;

    /// Returns the name of this move.
    fn name(&self) -> &str;

    /// Returns how often this move has been proposed.
    fn num_tries(&self) -> u64;

    /// Returns how often this move has been accepted.
    fn num_accepted(&self) -> u64;
}
