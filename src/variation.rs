//! Execution-time and inter-arrival variation.
//!
//! The simulator itself is fully deterministic; every source of variation is
//! injected through the [`VariationOracle`] trait.  The oracle is consulted
//! exactly once per job materialization, so two runs with the same task set,
//! the same options, and the same oracle seed produce identical traces.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::task::{Task, Tick};

// ── VariationOracle ───────────────────────────────────────────────────────────

/// Supplies the per-release execution time and, for sporadic tasks, the
/// inter-arrival separation.
///
/// Contract:
/// * `varied_execution_time` returns a value in `1..=task.wcet`;
/// * `varied_inter_arrival_time` returns a value `>= task.period` (the
///   period is the *minimum* separation) and is only consulted for sporadic
///   tasks;
/// * implementations are deterministic given their seed state and must be
///   side-effect-free apart from advancing that state.
pub trait VariationOracle {
    fn varied_execution_time(&mut self, task: &Task) -> Tick;

    fn varied_inter_arrival_time(&mut self, task: &Task) -> Tick;
}

// ── NoVariation ───────────────────────────────────────────────────────────────

/// Oracle without variation: every job runs for exactly its WCET and every
/// sporadic release arrives at the minimum separation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVariation;

impl VariationOracle for NoVariation {
    fn varied_execution_time(&mut self, task: &Task) -> Tick {
        task.wcet
    }

    fn varied_inter_arrival_time(&mut self, task: &Task) -> Tick {
        task.period
    }
}

// ── UniformVariation ──────────────────────────────────────────────────────────

/// Seeded uniform variation.
///
/// Execution times are drawn uniformly from `1..=wcet`; sporadic
/// inter-arrival times uniformly from `period..=2·period`.  The generator is
/// a [`StdRng`] seeded explicitly, so a run is reproducible from its seed.
#[derive(Debug, Clone)]
pub struct UniformVariation {
    rng: StdRng,
}

impl UniformVariation {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl VariationOracle for UniformVariation {
    fn varied_execution_time(&mut self, task: &Task) -> Tick {
        self.rng.random_range(1..=task.wcet.max(1))
    }

    fn varied_inter_arrival_time(&mut self, task: &Task) -> Tick {
        self.rng.random_range(task.period..=task.period * 2)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
