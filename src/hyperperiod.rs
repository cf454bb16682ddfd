/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Hyperperiod calculation over task periods.
//!
//! The hyperperiod of a task set is the least common multiple of all its
//! periods — the smallest window after which a purely periodic schedule
//! repeats, and therefore the natural unit for simulation horizons.

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::debug;

use crate::task::{TaskSet, Tick};

// ── Error type ────────────────────────────────────────────────────────────────

/// Why a hyperperiod could not be produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HyperperiodError {
    /// No runnable task carries a usable (non-zero) period.
    #[error("task set has no usable periods to build a hyperperiod from")]
    NoValidPeriods,

    /// Folding `lhs` and `rhs` into the running LCM left the `u64` range.
    /// The offending operands are carried for diagnostics.
    #[error("hyperperiod overflow: lcm({lhs}, {rhs}) exceeds 64 bits")]
    Overflow { lhs: Tick, rhs: Tick },
}

// ── Arithmetic ────────────────────────────────────────────────────────────────

/// Greatest common divisor via Euclid's algorithm.
///
/// `gcd(n, 0)` and `gcd(0, n)` both evaluate to `n`, so a degenerate zero
/// operand falls through the fold below without effect.
pub fn gcd(mut n: u64, mut m: u64) -> u64 {
    while m != 0 {
        (n, m) = (m, n % m);
    }
    n
}

/// Least common multiple, or [`HyperperiodError::Overflow`] when the exact
/// value needs more than 64 bits.
///
/// One operand is divided by the GCD first, the product is formed in 128-bit
/// arithmetic, and the narrowing back to `u64` doubles as the overflow
/// check.  A zero operand yields zero.
pub fn lcm(lhs: u64, rhs: u64) -> Result<u64, HyperperiodError> {
    if lhs == 0 || rhs == 0 {
        return Ok(0);
    }

    let exact = u128::from(lhs / gcd(lhs, rhs)) * u128::from(rhs);
    u64::try_from(exact).map_err(|_| HyperperiodError::Overflow { lhs, rhs })
}

/// Fold a list of periods into their common hyperperiod.
///
/// An empty list folds to zero; the first overflow aborts the fold.
pub fn lcm_all(periods: &[u64]) -> Result<u64, HyperperiodError> {
    let Some((&head, rest)) = periods.split_first() else {
        return Ok(0);
    };
    let mut running = head;
    for &period in rest {
        running = lcm(running, period)?;
    }
    Ok(running)
}

// ── Hyperperiod of a task set ─────────────────────────────────────────────────

/// Hyperperiod of the runnable tasks: the LCM of their distinct non-zero
/// periods.
///
/// # Errors
/// * [`HyperperiodError::NoValidPeriods`] – the set is empty or every period
///   is zero.
/// * [`HyperperiodError::Overflow`] – the LCM exceeded `u64`.
pub fn hyperperiod_of(task_set: &TaskSet) -> Result<Tick, HyperperiodError> {
    // A set keeps the periods deduplicated and in ascending order, so the
    // fold is deterministic.
    let distinct: BTreeSet<Tick> = task_set
        .tasks()
        .map(|t| t.period)
        .filter(|&p| p > 0)
        .collect();

    if distinct.is_empty() {
        return Err(HyperperiodError::NoValidPeriods);
    }

    let periods: Vec<Tick> = distinct.into_iter().collect();
    let hyperperiod = lcm_all(&periods)?;

    debug!(
        task_count = task_set.len(),
        distinct_periods = periods.len(),
        hyperperiod,
        "calculated hyperperiod"
    );

    Ok(hyperperiod)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Task;

    // ── gcd ───────────────────────────────────────────────────────────────────

    #[test]
    fn gcd_of_composite_pairs() {
        assert_eq!(gcd(54, 24), 6);
        assert_eq!(gcd(48, 180), 12);
    }

    #[test]
    fn gcd_of_coprime_pair_is_one() {
        assert_eq!(gcd(25, 9), 1);
    }

    #[test]
    fn gcd_treats_zero_as_identity() {
        assert_eq!(gcd(0, 7), 7);
        assert_eq!(gcd(7, 0), 7);
        assert_eq!(gcd(0, 0), 0);
    }

    // ── lcm ───────────────────────────────────────────────────────────────────

    #[test]
    fn lcm_of_small_pairs() {
        assert_eq!(lcm(6, 4).unwrap(), 12);
        assert_eq!(lcm(21, 6).unwrap(), 42);
        assert_eq!(lcm(9, 9).unwrap(), 9);
    }

    #[test]
    fn lcm_zero_operand_short_circuits_to_zero() {
        assert_eq!(lcm(0, 11).unwrap(), 0);
        assert_eq!(lcm(11, 0).unwrap(), 0);
    }

    #[test]
    fn lcm_reports_the_overflowing_operands() {
        // Consecutive integers are coprime, so the exact LCM is their
        // product — far outside u64 for these two.
        let even = 1u64 << 63;
        let odd = even + 1;
        assert_eq!(
            lcm(even, odd).unwrap_err(),
            HyperperiodError::Overflow {
                lhs: even,
                rhs: odd
            }
        );
    }

    // ── lcm_all ───────────────────────────────────────────────────────────────

    #[test]
    fn lcm_all_of_nothing_is_zero() {
        assert_eq!(lcm_all(&[]).unwrap(), 0);
    }

    #[test]
    fn lcm_all_of_one_period_is_that_period() {
        assert_eq!(lcm_all(&[35]).unwrap(), 35);
    }

    #[test]
    fn lcm_all_folds_across_the_list() {
        assert_eq!(lcm_all(&[10, 20, 50]).unwrap(), 100);
        assert_eq!(lcm_all(&[4, 6, 14]).unwrap(), 84);
    }

    #[test]
    fn lcm_all_surfaces_a_mid_fold_overflow() {
        let even = 1u64 << 63;
        assert!(lcm_all(&[3, even, even + 1]).is_err());
    }

    // ── hyperperiod_of ────────────────────────────────────────────────────────

    #[test]
    fn hyperperiod_of_classic_set() {
        let mut ts = TaskSet::new();
        ts.add_task(Task::periodic(1, "a", 10, 3));
        ts.add_task(Task::periodic(2, "b", 20, 5));
        ts.add_task(Task::periodic(3, "c", 50, 8));
        assert_eq!(hyperperiod_of(&ts).unwrap(), 100);
    }

    #[test]
    fn hyperperiod_of_duplicate_periods_counted_once() {
        let mut ts = TaskSet::new();
        ts.add_task(Task::periodic(1, "a", 10, 1));
        ts.add_task(Task::periodic(2, "b", 10, 1));
        assert_eq!(hyperperiod_of(&ts).unwrap(), 10);
    }

    #[test]
    fn hyperperiod_of_empty_set_is_an_error() {
        let ts = TaskSet::new();
        assert_eq!(
            hyperperiod_of(&ts).unwrap_err(),
            HyperperiodError::NoValidPeriods
        );
    }

    #[test]
    fn hyperperiod_of_all_zero_periods_is_an_error() {
        let mut ts = TaskSet::new();
        ts.add_task(Task {
            id: 1,
            name: "z".into(),
            period: 0,
            wcet: 1,
            ..Default::default()
        });
        assert_eq!(
            hyperperiod_of(&ts).unwrap_err(),
            HyperperiodError::NoValidPeriods
        );
    }
}
