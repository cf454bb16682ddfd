/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Rate-monotonic schedulability analysis.
//!
//! **Liu & Layland (1973)**: under rate-monotonic scheduling (shorter period
//! → higher priority), a set of `n` independent periodic tasks is
//! guaranteed schedulable on one processor if
//!
//! `U = Σ (Cᵢ / Tᵢ) ≤ n · (2^(1/n) − 1)`
//!
//! The bound tightens as `n` grows, converging to `ln(2) ≈ 0.693`.
//!
//! | n | Bound |
//! |---|---|
//! | 1 | 1.000 |
//! | 2 | 0.828 |
//! | 3 | 0.780 |
//! | ∞ | ln(2) ≈ 0.693 |
//!
//! The check is **advisory**: if `U` lies between the bound and 1.0 the set
//! may or may not be schedulable, and the simulator is precisely the tool
//! that settles the question.  Simulator construction logs a warning when
//! the bound is exceeded; the run proceeds either way.

use crate::task::TaskSet;

// ── Public API ────────────────────────────────────────────────────────────────

/// Compute the Liu & Layland utilisation upper bound for `n` tasks.
///
/// `U_bound(n) = n × (2^(1/n) − 1)`
///
/// Returns `1.0` for `n = 1` and `0.0` for `n = 0`.
pub fn liu_layland_bound(n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let nf = n as f64;
    nf * (2.0_f64.powf(1.0 / nf) - 1.0)
}

/// Check the task set against the Liu & Layland schedulability bound.
///
/// Returns `None` if the set is provably schedulable under rate-monotonic
/// priorities (total utilisation ≤ bound), `Some(total_utilisation)` if the
/// bound is exceeded and the caller should warn.
///
/// Tasks with a zero period are excluded from the utilisation sum.
pub fn check_liu_layland(task_set: &TaskSet) -> Option<f64> {
    let feasible: Vec<_> = task_set.tasks().filter(|t| t.period > 0).collect();

    if feasible.is_empty() {
        return None;
    }

    let total_u: f64 = feasible.iter().map(|t| t.utilization()).sum();
    let bound = liu_layland_bound(feasible.len());

    if total_u > bound {
        Some(total_u)
    } else {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Task, TaskSet};

    fn set_of(specs: &[(u64, u64)]) -> TaskSet {
        let mut ts = TaskSet::new();
        for (i, &(period, wcet)) in specs.iter().enumerate() {
            ts.add_task(Task::periodic(i as u64 + 1, format!("t{i}"), period, wcet));
        }
        ts
    }

    // ── liu_layland_bound ─────────────────────────────────────────────────────

    #[test]
    fn bound_zero_tasks_is_zero() {
        assert_eq!(liu_layland_bound(0), 0.0);
    }

    #[test]
    fn bound_one_task_is_one() {
        assert!((liu_layland_bound(1) - 1.0).abs() < 1e-10);
    }

    #[test]
    fn bound_two_tasks_is_approximately_0_828() {
        assert!((liu_layland_bound(2) - 0.8284).abs() < 1e-3);
    }

    #[test]
    fn bound_converges_toward_ln2() {
        assert!((liu_layland_bound(1000) - 2.0_f64.ln()).abs() < 1e-3);
    }

    // ── check_liu_layland ─────────────────────────────────────────────────────

    #[test]
    fn classic_three_task_set_is_feasible() {
        // U = 0.30 + 0.25 + 0.16 = 0.71 ≤ bound(3) ≈ 0.780
        let ts = set_of(&[(10, 3), (20, 5), (50, 8)]);
        assert!(check_liu_layland(&ts).is_none());
    }

    #[test]
    fn overloaded_set_exceeds_bound() {
        // 0.4 + 0.4 + 0.25 → U = 1.05
        let ts = set_of(&[(10, 4), (10, 4), (20, 5)]);
        let u = check_liu_layland(&ts).expect("bound should be exceeded");
        assert!((u - 1.05).abs() < 1e-9);
    }

    #[test]
    fn empty_set_is_trivially_feasible() {
        assert!(check_liu_layland(&TaskSet::new()).is_none());
    }

    #[test]
    fn utilization_exactly_at_bound_is_feasible() {
        // One task with U = 1.0 exactly; bound(1) = 1.0 and the check is ≤.
        let ts = set_of(&[(10, 10)]);
        assert!(check_liu_layland(&ts).is_none());
    }
}
