/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured error types for the schedule simulator.
//!
//! Every variant carries enough data to be logged as a fully-qualified
//! `tracing` event (task name, tick values) and to be matched by callers
//! without parsing the message text.
//!
//! **Do not** replace these with `anyhow::Error` in the simulation path —
//! the structured variants are intentional.  `anyhow` is reserved for the
//! configuration-loading boundary.

use thiserror::Error;

use crate::hyperperiod::HyperperiodError;
use crate::task::{TaskId, Tick};

/// Errors surfaced by simulator construction and the advance loop.
///
/// A returned error means the simulation stopped where it stood; there is
/// no partial recovery.  Deadline misses are only errors in
/// assert-on-deadline-miss mode — otherwise they are recorded in the event
/// stream and the per-task trace counters instead.
#[derive(Debug, Error)]
pub enum SimulatorError {
    /// `advance()` was called with no runnable task.
    #[error("task set is empty — nothing to advance")]
    EmptyTaskSet,

    /// A task declared a zero period.
    #[error("task '{task}' has a non-positive period")]
    NonPositivePeriod { task: String },

    /// A task declared a zero worst-case execution time.
    #[error("task '{task}' has a non-positive worst-case execution time")]
    NonPositiveWcet { task: String },

    /// Priority assignment produced two tasks with the same priority.
    #[error("tasks '{first}' and '{second}' share priority {priority}")]
    DuplicatePriority {
        priority: u32,
        first: String,
        second: String,
    },

    /// A job overran its absolute deadline while the simulator was
    /// configured to treat misses as fatal.
    #[error("task '{task}' missed its deadline: deadline={deadline}, finish={finish}")]
    DeadlineMiss {
        task: String,
        deadline: Tick,
        finish: Tick,
    },

    /// The policy predicted a preemption at or before the present tick.
    /// A preemption must lie strictly in the future of the job it disturbs.
    #[error(
        "policy predicted a preemption of task '{task}' at tick {preempting_tick}, \
         not after the present tick {tick}"
    )]
    PreemptionNotInFuture {
        task: String,
        preempting_tick: Tick,
        tick: Tick,
    },

    /// The policy selected a task with no pending job.
    #[error("policy selected unknown task id {task_id}")]
    UnknownTask { task_id: TaskId },

    /// The simulation horizon could not be derived from the task periods.
    #[error("cannot derive simulation horizon: {0}")]
    Hyperperiod(#[from] HyperperiodError),
}
