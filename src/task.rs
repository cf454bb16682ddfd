/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Core task data structures for the schedule simulator.
//!
//! Two distinct types model the two timescales of the simulation:
//!
//! ```text
//! TaskSet ──(frozen at construction)──►  Task   ──(one per release)──►  Job
//!                                         ↑ immutable parameters        ↑ mutable per-release state
//! ```
//!
//! # Ownership model
//! A [`TaskSet`] is **moved** into the simulator at construction and frozen
//! for the whole run.  [`Job`]s refer back to their task through a stable
//! [`TaskId`] handle rather than a shared pointer: the task set strictly
//! outlives every job, and the handle keeps the per-release state trivially
//! owned by the simulator.

use std::collections::BTreeMap;

// ── Time and identity ─────────────────────────────────────────────────────────

/// Integer unit of simulated time.  A tick has no physical duration; callers
/// decide whether one tick is a microsecond, a millisecond, or a bus cycle.
pub type Tick = u64;

/// Unique task identifier within a task set.
pub type TaskId = u64;

/// Reserved identifier of the idle sentinel task.
///
/// The idle task represents processor idleness in the event log.  It never
/// releases jobs and is not part of the runnable set; [`TaskSet::add_task`]
/// rejects it.
pub const IDLE_TASK_ID: TaskId = 0;

// ── Task (immutable parameters) ───────────────────────────────────────────────

/// Immutable parameters of one real-time task.
///
/// All timing fields are in ticks.  `priority` is the only field written
/// after construction: the scheduling policy assigns it before the
/// simulation starts (greater value = higher priority, `0` = unassigned).
#[derive(Debug, Clone, Default)]
pub struct Task {
    /// Unique task id (`IDLE_TASK_ID` is reserved for the idle sentinel).
    pub id: TaskId,

    /// Human-readable task name, used in logs and error messages.
    pub name: String,

    /// Period for periodic tasks; minimum inter-arrival separation for
    /// sporadic tasks.
    pub period: Tick,

    /// Worst-case execution time.
    pub wcet: Tick,

    /// Relative deadline.  Defaults to the period.
    pub deadline: Tick,

    /// Release offset of the first job.
    pub offset: Tick,

    /// Scheduling priority, assigned by the policy (greater = higher).
    pub priority: u32,

    /// `true` for sporadic tasks: the period is a lower bound on the
    /// inter-arrival time rather than an exact separation.
    pub sporadic: bool,
}

impl Task {
    /// Create a periodic task with an implicit deadline (= period) and no
    /// release offset.
    pub fn periodic(id: TaskId, name: impl Into<String>, period: Tick, wcet: Tick) -> Self {
        Self {
            id,
            name: name.into(),
            period,
            wcet,
            deadline: period,
            ..Default::default()
        }
    }

    /// Create a sporadic task whose `period` is the minimum inter-arrival
    /// separation, with an implicit deadline and no release offset.
    pub fn sporadic(id: TaskId, name: impl Into<String>, period: Tick, wcet: Tick) -> Self {
        Self {
            sporadic: true,
            ..Self::periodic(id, name, period, wcet)
        }
    }

    /// Returns the task with a constrained relative deadline.
    pub fn with_deadline(self, deadline: Tick) -> Self {
        Self { deadline, ..self }
    }

    /// Returns the task with a release offset for its first job.
    pub fn with_offset(self, offset: Tick) -> Self {
        Self { offset, ..self }
    }

    /// CPU utilisation fraction: `wcet / period`.
    ///
    /// Returns `0.0` when `period` is zero to avoid division by zero.
    pub fn utilization(&self) -> f64 {
        if self.period == 0 {
            0.0
        } else {
            self.wcet as f64 / self.period as f64
        }
    }
}

// ── TaskSet ───────────────────────────────────────────────────────────────────

/// Frozen set of runnable tasks plus the idle sentinel.
///
/// Backed by a `BTreeMap` (not `HashMap`) so every iteration over the set is
/// ordered by task id — the simulator must be deterministic for identical
/// inputs.
#[derive(Debug, Clone)]
pub struct TaskSet {
    tasks: BTreeMap<TaskId, Task>,
    idle_task: Task,
}

impl TaskSet {
    /// Create an empty task set.  The idle sentinel is always present but is
    /// not part of the runnable set.
    pub fn new() -> Self {
        Self {
            tasks: BTreeMap::new(),
            idle_task: Task {
                id: IDLE_TASK_ID,
                name: String::from("idle"),
                ..Default::default()
            },
        }
    }

    /// Add a runnable task.
    ///
    /// Returns `false` (and leaves the set unchanged) if the id is already
    /// taken or is the reserved [`IDLE_TASK_ID`].
    pub fn add_task(&mut self, task: Task) -> bool {
        if task.id == IDLE_TASK_ID || self.tasks.contains_key(&task.id) {
            return false;
        }
        self.tasks.insert(task.id, task);
        true
    }

    /// Look up a runnable task by id.
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    /// Iterate over the runnable tasks in ascending id order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    /// The idle sentinel task.
    pub fn idle_task(&self) -> &Task {
        &self.idle_task
    }

    /// Number of runnable tasks (the idle sentinel does not count).
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// `true` when the set has no runnable task.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// The runnable task with the largest period.
    ///
    /// Ties resolve to the smallest id.  Used to derive the default warm-up
    /// offset for trimmed simulations.
    pub fn largest_period_task(&self) -> Option<&Task> {
        self.tasks
            .values()
            .max_by(|a, b| a.period.cmp(&b.period).then_with(|| b.id.cmp(&a.id)))
    }

    /// Total utilisation of the runnable set.
    pub fn utilization(&self) -> f64 {
        self.tasks.values().map(Task::utilization).sum()
    }

    /// Assign rate-monotonic priorities: the shorter the period, the higher
    /// the numeric priority.  Ties break by ascending task id (the smaller
    /// id wins the higher priority).
    ///
    /// Priorities are `1..=n` with `n` = number of runnable tasks, so the
    /// assignment is always duplicate-free.
    pub fn assign_priority_rm(&mut self) {
        let mut order: Vec<TaskId> = self.tasks.keys().copied().collect();
        // Longest period first; among equal periods the larger id first, so
        // that ascending rank lands the top priority on the shortest period
        // and smallest id.
        order.sort_by(|a, b| {
            let ta = &self.tasks[a];
            let tb = &self.tasks[b];
            tb.period.cmp(&ta.period).then_with(|| b.cmp(a))
        });
        for (rank, id) in order.iter().enumerate() {
            if let Some(task) = self.tasks.get_mut(id) {
                task.priority = rank as u32 + 1;
            }
        }
    }
}

impl Default for TaskSet {
    fn default() -> Self {
        Self::new()
    }
}

// ── Job (per-release mutable state) ───────────────────────────────────────────

/// One activation of a task: the mutable state of a single release.
///
/// `release_time` is never written after construction; it doubles as the
/// job's initial arrival time when the intervals of a preempted job are
/// emitted.
#[derive(Debug, Clone)]
pub struct Job {
    /// Handle to the owning task.
    pub task_id: TaskId,

    /// Tick at which the job becomes ready.
    pub release_time: Tick,

    /// `release_time + task.deadline`; the tick by which the job must have
    /// completed.
    pub absolute_deadline: Tick,

    /// Execution budget still to run.  Zero only immediately before the job
    /// is retired.
    pub remaining_exec_time: Tick,

    /// Whether the job has ever occupied the processor.  Decides between the
    /// `Start` and `Resume` begin states of emitted intervals.
    pub has_started: bool,
}

impl Job {
    /// Create the job for one release of `task` with the given execution
    /// budget.
    pub fn new(task: &Task, release_time: Tick, exec_time: Tick) -> Self {
        Self {
            task_id: task.id,
            release_time,
            absolute_deadline: release_time + task.deadline,
            remaining_exec_time: exec_time,
            has_started: false,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── Task ──────────────────────────────────────────────────────────────────

    #[test]
    fn periodic_task_defaults_deadline_to_period() {
        let t = Task::periodic(1, "a", 10, 3);
        assert_eq!(t.deadline, 10);
        assert_eq!(t.offset, 0);
        assert!(!t.sporadic);
    }

    #[test]
    fn sporadic_constructor_sets_flag() {
        let t = Task::sporadic(1, "s", 50, 5);
        assert!(t.sporadic);
        assert_eq!(t.deadline, 50);
    }

    #[test]
    fn with_deadline_and_offset_override_defaults() {
        let t = Task::periodic(1, "a", 10, 3).with_deadline(8).with_offset(2);
        assert_eq!(t.deadline, 8);
        assert_eq!(t.offset, 2);
    }

    #[test]
    fn utilization_is_wcet_over_period() {
        let t = Task::periodic(1, "a", 10, 3);
        assert!((t.utilization() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn utilization_zero_period_returns_zero() {
        let t = Task {
            period: 0,
            wcet: 5,
            ..Default::default()
        };
        assert_eq!(t.utilization(), 0.0);
    }

    // ── TaskSet ───────────────────────────────────────────────────────────────

    #[test]
    fn add_task_rejects_idle_id_and_duplicates() {
        let mut ts = TaskSet::new();
        assert!(!ts.add_task(Task::periodic(IDLE_TASK_ID, "bad", 10, 1)));
        assert!(ts.add_task(Task::periodic(1, "a", 10, 1)));
        assert!(!ts.add_task(Task::periodic(1, "dup", 20, 1)));
        assert_eq!(ts.len(), 1);
    }

    #[test]
    fn idle_task_has_reserved_id() {
        let ts = TaskSet::new();
        assert_eq!(ts.idle_task().id, IDLE_TASK_ID);
        assert!(ts.is_empty());
    }

    #[test]
    fn tasks_iterate_in_ascending_id_order() {
        let mut ts = TaskSet::new();
        ts.add_task(Task::periodic(3, "c", 30, 1));
        ts.add_task(Task::periodic(1, "a", 10, 1));
        ts.add_task(Task::periodic(2, "b", 20, 1));
        let ids: Vec<TaskId> = ts.tasks().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn largest_period_task_found() {
        let mut ts = TaskSet::new();
        ts.add_task(Task::periodic(1, "a", 10, 1));
        ts.add_task(Task::periodic(2, "b", 50, 1));
        ts.add_task(Task::periodic(3, "c", 20, 1));
        assert_eq!(ts.largest_period_task().unwrap().id, 2);
    }

    #[test]
    fn largest_period_task_tie_resolves_to_smallest_id() {
        let mut ts = TaskSet::new();
        ts.add_task(Task::periodic(2, "b", 50, 1));
        ts.add_task(Task::periodic(1, "a", 50, 1));
        assert_eq!(ts.largest_period_task().unwrap().id, 1);
    }

    #[test]
    fn total_utilization_sums_tasks() {
        let mut ts = TaskSet::new();
        ts.add_task(Task::periodic(1, "a", 10, 3)); // 0.30
        ts.add_task(Task::periodic(2, "b", 20, 5)); // 0.25
        assert!((ts.utilization() - 0.55).abs() < 1e-9);
    }

    // ── RM priority assignment ────────────────────────────────────────────────

    #[test]
    fn rm_assigns_higher_priority_to_shorter_period() {
        let mut ts = TaskSet::new();
        ts.add_task(Task::periodic(1, "slow", 100, 1));
        ts.add_task(Task::periodic(2, "fast", 10, 1));
        ts.add_task(Task::periodic(3, "mid", 50, 1));
        ts.assign_priority_rm();

        let p = |id: TaskId| ts.task(id).unwrap().priority;
        assert!(p(2) > p(3) && p(3) > p(1));
        assert_eq!(p(2), 3); // shortest period gets the top priority
        assert_eq!(p(1), 1);
    }

    #[test]
    fn rm_ties_break_by_ascending_task_id() {
        let mut ts = TaskSet::new();
        ts.add_task(Task::periodic(7, "late", 10, 1));
        ts.add_task(Task::periodic(2, "early", 10, 1));
        ts.assign_priority_rm();
        // Equal periods: the smaller id wins the higher priority.
        assert!(ts.task(2).unwrap().priority > ts.task(7).unwrap().priority);
    }

    #[test]
    fn rm_priorities_are_unique() {
        let mut ts = TaskSet::new();
        for id in 1..=5 {
            ts.add_task(Task::periodic(id, format!("t{id}"), id * 10, 1));
        }
        ts.assign_priority_rm();
        let mut prios: Vec<u32> = ts.tasks().map(|t| t.priority).collect();
        prios.sort_unstable();
        prios.dedup();
        assert_eq!(prios.len(), 5);
    }

    // ── Job ───────────────────────────────────────────────────────────────────

    #[test]
    fn job_absolute_deadline_is_release_plus_relative() {
        let t = Task::periodic(1, "a", 10, 3).with_deadline(8);
        let j = Job::new(&t, 20, 3);
        assert_eq!(j.absolute_deadline, 28);
        assert_eq!(j.remaining_exec_time, 3);
        assert!(!j.has_started);
    }
}
