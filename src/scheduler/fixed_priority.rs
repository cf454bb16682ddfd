/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Preemptive fixed-priority scheduling with rate-monotonic priorities.
//!
//! The canonical single-processor rule: at every instant the released job
//! with the greatest task priority runs, and a running job is preempted the
//! moment a higher-priority job is released.  Priorities are assigned
//! rate-monotonically before the simulation starts — the shorter the period,
//! the higher the priority — which is the optimal static assignment for
//! implicit-deadline periodic tasks.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use crate::event::PolicyLabel;
use crate::scheduler::{JobTable, SchedulingPolicy, SimulatorError};
use crate::task::{Job, TaskId, TaskSet, Tick};

/// Fixed-priority policy with rate-monotonic assignment.
///
/// Stateless: every decision is a pure function of the job table and the
/// priorities frozen into the task set by [`prepare`](SchedulingPolicy::prepare).
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedPriorityPolicy;

impl FixedPriorityPolicy {
    pub fn new() -> Self {
        Self
    }
}

impl SchedulingPolicy for FixedPriorityPolicy {
    fn label(&self) -> PolicyLabel {
        PolicyLabel::FixedPriority
    }

    /// Assign rate-monotonic priorities and verify the assignment is
    /// duplicate-free.
    fn prepare(&mut self, task_set: &mut TaskSet) -> Result<(), SimulatorError> {
        task_set.assign_priority_rm();

        let mut seen: BTreeMap<u32, &str> = BTreeMap::new();
        for task in task_set.tasks() {
            if let Some(first) = seen.insert(task.priority, &task.name) {
                return Err(SimulatorError::DuplicatePriority {
                    priority: task.priority,
                    first: first.to_string(),
                    second: task.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// The released job with the greatest task priority; if nothing is
    /// released, the earliest future release (equal releases resolve to the
    /// higher priority).
    fn next_job(&self, task_set: &TaskSet, jobs: &JobTable, tick: Tick) -> Option<TaskId> {
        let priority = |job: &Job| task_set.task(job.task_id).map_or(0, |t| t.priority);

        if let Some(job) = jobs
            .values()
            .filter(|j| j.release_time <= tick)
            .max_by_key(|j| priority(j))
        {
            return Some(job.task_id);
        }

        jobs.values()
            .min_by_key(|j| (j.release_time, Reverse(priority(j))))
            .map(|j| j.task_id)
    }

    /// The earliest release, strictly inside `(tick, finish)`, of a job
    /// whose task priority is strictly greater than the running job's.
    fn preempting_tick(
        &self,
        run_job: &Job,
        task_set: &TaskSet,
        jobs: &JobTable,
        tick: Tick,
    ) -> Option<Tick> {
        let finish = tick + run_job.remaining_exec_time;
        let run_priority = task_set.task(run_job.task_id).map_or(0, |t| t.priority);

        jobs.values()
            .filter(|j| j.task_id != run_job.task_id)
            .filter(|j| j.release_time > tick && j.release_time < finish)
            .filter(|j| task_set.task(j.task_id).map_or(0, |t| t.priority) > run_priority)
            .map(|j| j.release_time)
            .min()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
