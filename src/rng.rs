//! Random source abstraction for proposal moves.
//!
//! Moves consume randomness through a single primitive: a draw uniform on
//! `[0, 1)`, see [UniformSource]. The sequence and count of draws a move
//! makes is part of its observable contract, so besides the [RngSource]
//! adapter over any [`rand`] generator this module provides
//! [ScriptedSource], which replays an explicit sequence of draws and is
//! the instrument of choice for testing draw-for-draw behavior.

use rand::Rng;
use std::collections::VecDeque;

// =#========================================================================#=
// UNIFORM SOURCE TRAIT
// =#========================================================================#=
/// A source of independent draws uniform on `[0, 1)`.
pub trait UniformSource {
    /// Draws the next value uniformly from `[0, 1)`.
    fn uniform(&mut self) -> f64;
}

// =#========================================================================#=
// RNG SOURCE
// =#========================================================================#=
/// Adapter implementing [UniformSource] on top of any [`rand`] generator.
///
/// # Example
/// ```
/// use rootmove::rng::{RngSource, UniformSource};
/// use rand::SeedableRng;
///
/// let mut source = RngSource(rand::rngs::StdRng::seed_from_u64(42));
/// let draw = source.uniform();
/// assert!((0.0..1.0).contains(&draw));
/// ```
#[derive(Debug, Clone)]
pub struct RngSource<R>(pub R);

impl<R: Rng> UniformSource for RngSource<R> {
    fn uniform(&mut self) -> f64 {
        self.0.gen_range(0.0..1.0)
    }
}

// =#========================================================================#=
// SCRIPTED SOURCE
// =#========================================================================#=
/// A [UniformSource] replaying a fixed sequence of draws.
///
/// # Example
/// ```
/// use rootmove::rng::{ScriptedSource, UniformSource};
///
/// let mut source = ScriptedSource::new([0.5, 0.25]);
/// assert_eq!(source.uniform(), 0.5);
/// assert_eq!(source.uniform(), 0.25);
/// assert_eq!(source.remaining(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    draws: VecDeque<f64>,
}

impl ScriptedSource {
    /// Creates a source replaying the given draws in order.
    ///
    /// # Arguments
    /// * `draws` - the values to return from [`UniformSource::uniform`],
    ///   each in `[0, 1)`
    ///
    /// # Panics
    /// Panics if any draw lies outside `[0, 1)`.
    pub fn new<I: IntoIterator<Item = f64>>(draws: I) -> Self {
        let draws: VecDeque<f64> = draws.into_iter().collect();
        for &draw in &draws {
            assert!(
                (0.0..1.0).contains(&draw),
                "Scripted draw must lie in [0, 1), got {}",
                draw
            );
        }
        ScriptedSource { draws }
    }

    /// Returns the number of draws not yet consumed.
    pub fn remaining(&self) -> usize {
        self.draws.len()
    }
}

impl UniformSource for ScriptedSource {
    /// # Panics
    /// Panics if the script is exhausted; a move drawing more values than
    /// scripted indicates the test's draw count is wrong.
    fn uniform(&mut self) -> f64 {
        match self.draws.pop_front() {
            Some(draw) => draw,
            None => panic!("Scripted random source ran out of draws"),
        }
    }
}
