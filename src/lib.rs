/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Timpani-Sim – tick-accurate schedule simulator for real-time task sets.
//!
//! Simulates a periodic/sporadic task set under a preemptive,
//! priority-driven scheduler on a single processor and produces a totally
//! ordered trace of scheduling intervals: which task ran on which interval,
//! whether the interval was a first dispatch or a resumption, and whether it
//! ended with a completion, a preemption, or a missed deadline.
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── task        – immutable task parameters, frozen task set, per-release jobs
//! ├── event       – interval events, schedule states, ordered event container
//! ├── variation   – execution-time / inter-arrival variation oracle
//! ├── scheduler/  – the advance loop, policy hooks, fixed-priority (RM) policy
//! ├── hyperperiod – LCM / GCD helpers for simulation horizons
//! └── config/     – YAML task-set and simulator-option loading
//! ```
//!
//! The simulation clock is an integer tick count with no physical duration.
//! Time only moves inside `ScheduleSimulator::advance`; one call emits
//! exactly one interval event and stops at the next scheduling point (a
//! completion, a higher-priority release, or a deadline).
//!
//! # Example
//! ```rust
//! use timpani_sim::scheduler::{FixedPriorityPolicy, ScheduleSimulator, SimOptions};
//! use timpani_sim::task::{Task, TaskSet};
//! use timpani_sim::variation::NoVariation;
//!
//! let mut task_set = TaskSet::new();
//! task_set.add_task(Task::periodic(1, "engine_ctrl", 10, 3));
//! task_set.add_task(Task::periodic(2, "telemetry", 20, 5));
//!
//! let mut sim = ScheduleSimulator::new(
//!     task_set,
//!     FixedPriorityPolicy::new(),
//!     NoVariation,
//!     SimOptions::default(),
//! )
//! .unwrap();
//! let trace = sim.run_sim(200).unwrap();
//! assert!(!trace.is_empty());
//! ```

pub mod config;
pub mod event;
pub mod hyperperiod;
pub mod scheduler;
pub mod task;
pub mod variation;
