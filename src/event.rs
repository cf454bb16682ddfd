/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Scheduling-interval events and the ordered event container.
//!
//! The event stream is the simulator's sole output.  Each event is a closed
//! interval `[begin, end]` on the tick axis, attributed to the task that
//! occupied the processor, annotated with a begin state (first dispatch or
//! resumption) and an end state (completion, preemption, or deadline miss).
//! Events are constructed in a single step with both endpoints known — there
//! is no half-built event awaiting closure.
//!
//! [`EventContainer`] is append-only and totally ordered: insertion order
//! equals ascending `begin` order, a property the simulator's advance loop
//! guarantees and the container debug-asserts.

use std::fmt;

use crate::task::{Task, TaskId, Tick};

// ── Schedule states ───────────────────────────────────────────────────────────

/// How an interval begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeginState {
    /// The job's first time on the processor.
    Start,
    /// The job continues after an earlier preemption.
    Resume,
}

/// How an interval ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndState {
    /// The job completed its execution budget.
    End,
    /// A higher-priority release took the processor.
    Suspend,
    /// The job reached its absolute deadline before completing; the interval
    /// is truncated at the deadline.
    EndDeadlineMissed,
}

// ── Policy label ──────────────────────────────────────────────────────────────

/// Scheduling policy tag carried by an [`EventContainer`].
///
/// Identifies, for downstream tooling, which scheduler produced a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolicyLabel {
    #[default]
    Unknown,
    FixedPriority,
    Edf,
}

impl fmt::Display for PolicyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyLabel::Unknown => write!(f, "Unknown"),
            PolicyLabel::FixedPriority => write!(f, "FixedPriority"),
            PolicyLabel::Edf => write!(f, "EDF"),
        }
    }
}

// ── SchedulerIntervalEvent ────────────────────────────────────────────────────

/// One scheduling interval: `task_id` occupied the processor on the closed
/// interval `[begin, end]`.
///
/// `job_release_time` identifies the activation the interval belongs to — a
/// preempted job contributes several intervals that all carry the same
/// release time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerIntervalEvent {
    pub begin: Tick,
    pub end: Tick,
    /// The task that ran, or the idle sentinel.
    pub task_id: TaskId,
    /// Initial arrival time of the job this interval belongs to.
    pub job_release_time: Tick,
    pub begin_state: BeginState,
    pub end_state: EndState,
    /// Free-form annotation; empty in normal operation.
    pub note: String,
}

impl SchedulerIntervalEvent {
    /// Create a fully annotated event with an empty note.
    pub fn new(
        begin: Tick,
        end: Tick,
        task_id: TaskId,
        job_release_time: Tick,
        begin_state: BeginState,
        end_state: EndState,
    ) -> Self {
        Self {
            begin,
            end,
            task_id,
            job_release_time,
            begin_state,
            end_state,
            note: String::new(),
        }
    }

    /// Interval length in ticks.
    pub fn duration(&self) -> Tick {
        self.end - self.begin
    }

    /// `true` if this interval is the job's first dispatch.
    pub fn is_start_event(&self) -> bool {
        self.begin_state == BeginState::Start
    }

    /// `true` if the job retired at this interval's end (with or without
    /// meeting its deadline).
    pub fn is_end_event(&self) -> bool {
        matches!(self.end_state, EndState::End | EndState::EndDeadlineMissed)
    }

    pub fn is_deadline_missed(&self) -> bool {
        self.end_state == EndState::EndDeadlineMissed
    }

    /// Per-tick rendering: `end − begin` copies of the task id separated by
    /// `", "`.  One entry per occupied tick of the closed interval.
    pub fn to_raw_schedule_string(&self) -> String {
        let ids: Vec<String> = (self.begin..self.end)
            .map(|_| self.task_id.to_string())
            .collect();
        ids.join(", ")
    }
}

impl fmt::Display for SchedulerIntervalEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}-{}, {}, \"{}\")",
            self.begin, self.end, self.task_id, self.note
        )
    }
}

// ── EventContainer ────────────────────────────────────────────────────────────

/// Append-only, totally ordered sequence of scheduling intervals, tagged
/// with the policy that produced it.
#[derive(Debug, Clone, Default)]
pub struct EventContainer {
    policy: PolicyLabel,
    events: Vec<SchedulerIntervalEvent>,
}

impl EventContainer {
    pub fn new(policy: PolicyLabel) -> Self {
        Self {
            policy,
            events: Vec::new(),
        }
    }

    pub fn policy(&self) -> PolicyLabel {
        self.policy
    }

    /// Append an event.
    ///
    /// The caller must preserve the container's total order: the new event
    /// must be well-formed and must not begin before the previous event
    /// begins.
    pub fn push(&mut self, event: SchedulerIntervalEvent) {
        debug_assert!(event.end >= event.begin, "interval ends before it begins");
        debug_assert!(
            self.events.last().map_or(true, |last| last.begin <= event.begin),
            "event inserted out of order"
        );
        self.events.push(event);
    }

    pub fn events(&self) -> &[SchedulerIntervalEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn last(&self) -> Option<&SchedulerIntervalEvent> {
        self.events.last()
    }

    /// Iterate over the intervals attributed to one task.
    pub fn events_of_task(&self, task_id: TaskId) -> impl Iterator<Item = &SchedulerIntervalEvent> {
        self.events.iter().filter(move |e| e.task_id == task_id)
    }

    /// Drop everything that lies beyond `tick`: events beginning at or after
    /// `tick` are removed, and an event straddling `tick` is truncated so
    /// its end is `tick`.  Idempotent.
    pub fn trim_to(&mut self, tick: Tick) {
        self.events.retain(|e| e.begin < tick);
        for e in &mut self.events {
            if e.end > tick {
                e.end = tick;
            }
        }
    }

    /// Drop everything that lies before `tick`: events ending at or before
    /// `tick` are removed, and an event straddling `tick` is truncated so
    /// its begin is `tick`.  Idempotent.
    pub fn trim_before(&mut self, tick: Tick) {
        self.events.retain(|e| e.end > tick);
        for e in &mut self.events {
            if e.begin < tick {
                e.begin = tick;
            }
        }
    }

    /// Per-tick rendering of the whole trace: the concatenation of each
    /// event's rendering, `", "`-separated.  Idle intervals appear under the
    /// idle sentinel's id; gaps left by disabled idle events are absent.
    pub fn to_raw_schedule_string(&self) -> String {
        let parts: Vec<String> = self
            .events
            .iter()
            .map(SchedulerIntervalEvent::to_raw_schedule_string)
            .filter(|s| !s.is_empty())
            .collect();
        parts.join(", ")
    }
}

// ── Idle helper ───────────────────────────────────────────────────────────────

impl SchedulerIntervalEvent {
    /// Event for an idle gap `[begin, end]` attributed to the idle sentinel.
    pub fn idle(idle_task: &Task, begin: Tick, end: Tick) -> Self {
        Self::new(
            begin,
            end,
            idle_task.id,
            begin,
            BeginState::Start,
            EndState::End,
        )
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
