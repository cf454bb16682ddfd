//! The advanceable schedule simulator.
//!
//! [`ScheduleSimulator`] drives a task set across scheduling decision points
//! one interval at a time.  Each call to [`advance`](ScheduleSimulator::advance)
//! selects the job that should occupy the processor, computes the next
//! instant at which that job could be disturbed (a higher-priority release,
//! its completion, or its deadline), emits exactly one interval event, and
//! moves the clock there.  Stepping by intervals — instead of running a
//! fixed horizon in one shot — lets callers choose the simulation length
//! after the fact and stop whenever they have seen enough.
//!
//! # Design
//!
//! | Topic | Choice |
//! |---|---|
//! | Policy variants | [`SchedulingPolicy`] capability trait — selection and preemption prediction are hooks, not subclasses |
//! | State | All mutable state (clock, job table, trace counters, events) is owned by the simulator; `advance` is the only mutation boundary |
//! | Job → task linkage | Stable [`TaskId`] handle into the frozen [`TaskSet`] |
//! | Map iteration order | `BTreeMap` — deterministic replay for identical inputs |
//! | Failure | `Result<_, SimulatorError>` with typed variants; fatal errors unwind, recorded deadline misses flow through the event stream |
//!
//! The concrete rate-monotonic policy lives in [`fixed_priority`];
//! schedulability analysis in [`feasibility`].

pub mod error;
pub mod feasibility;
pub mod fixed_priority;

pub use error::SimulatorError;
pub use fixed_priority::FixedPriorityPolicy;

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::event::{BeginState, EndState, EventContainer, PolicyLabel, SchedulerIntervalEvent};
use crate::hyperperiod::hyperperiod_of;
use crate::task::{Job, TaskId, TaskSet, Tick};
use crate::variation::VariationOracle;

use feasibility::{check_liu_layland, liu_layland_bound};

// ── Options ───────────────────────────────────────────────────────────────────

/// Simulator configuration flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimOptions {
    /// Route execution times and sporadic inter-arrival times through the
    /// variation oracle.  When off, jobs run for exactly their WCET and
    /// sporadic releases arrive at the minimum separation.
    pub run_time_variation: bool,

    /// Emit an event for every idle gap, attributed to the idle sentinel.
    /// When off, gaps are left implicit in the trace.
    pub gen_idle_time_events: bool,

    /// Treat a deadline miss as a fatal error instead of recording it and
    /// truncating the interval at the deadline.
    pub assert_on_deadline_miss: bool,

    /// Maintain per-task deadline-miss counters, consecutive-miss streaks,
    /// and the inter-arrival history.
    pub trace_enabled: bool,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            run_time_variation: false,
            gen_idle_time_events: true,
            assert_on_deadline_miss: true,
            trace_enabled: false,
        }
    }
}

// ── Policy capability ─────────────────────────────────────────────────────────

/// The simulator's next-job table: one pending job per task, released or not.
pub type JobTable = BTreeMap<TaskId, Job>;

/// Scheduling decisions, supplied by a concrete policy.
///
/// The simulator owns all state; the policy only answers questions about it.
/// Implementations must be deterministic — two identical calls must return
/// the same answer.
pub trait SchedulingPolicy {
    /// Tag attached to the emitted event container.
    fn label(&self) -> PolicyLabel;

    /// One-time setup before the first job is created — typically priority
    /// assignment over the task set.
    fn prepare(&mut self, _task_set: &mut TaskSet) -> Result<(), SimulatorError> {
        Ok(())
    }

    /// The task whose pending job should occupy the processor at `tick`: the
    /// preferred released job, or, if nothing is released, the job whose
    /// release the processor should idle towards.  `None` only when the
    /// table is empty.
    fn next_job(&self, task_set: &TaskSet, jobs: &JobTable, tick: Tick) -> Option<TaskId>;

    /// The earliest tick strictly after `tick` at which another pending
    /// job's release would take the processor away from `run_job` before it
    /// completes, or `None` if `run_job` runs to completion undisturbed.
    fn preempting_tick(
        &self,
        run_job: &Job,
        task_set: &TaskSet,
        jobs: &JobTable,
        tick: Tick,
    ) -> Option<Tick>;

    /// Called after every executed interval of a job.  Extensibility point;
    /// the default does nothing.
    fn on_job_executed(&mut self, _job: &Job, _tick: Tick, _executed: Tick) {}

    /// Called when a job overruns its deadline in recording mode.
    fn on_deadline_missed(&mut self, _job: &Job) {}
}

// ── Per-task trace state ──────────────────────────────────────────────────────

/// Per-task bookkeeping collected while `trace_enabled` is set.
#[derive(Debug, Clone, Default)]
pub struct TaskTrace {
    /// Total deadline misses over the whole run.
    pub deadline_miss_count: u64,

    /// Whether the most recently retired job missed its deadline.
    pub miss_streak_active: bool,

    /// Length of the current consecutive-miss streak.
    pub running_consecutive_miss_count: u64,

    /// Longest consecutive-miss streak ever observed.
    pub max_consecutive_miss_count: u64,

    /// Inter-arrival time of every materialized release, in order.
    pub inter_arrival_times: Vec<Tick>,
}

// ── ScheduleSimulator ─────────────────────────────────────────────────────────

/// Discrete-event simulator for one task set under one scheduling policy.
///
/// Single-threaded and synchronous: there is no I/O on the hot path and
/// [`advance`](Self::advance) is the only operation that mutates state.
#[derive(Debug)]
pub struct ScheduleSimulator<P: SchedulingPolicy, O: VariationOracle> {
    task_set: TaskSet,
    policy: P,
    oracle: O,
    options: SimOptions,
    tick: Tick,
    next_jobs: JobTable,
    events: EventContainer,
    traces: BTreeMap<TaskId, TaskTrace>,
}

impl<P: SchedulingPolicy, O: VariationOracle> ScheduleSimulator<P, O> {
    /// Build a simulator over `task_set`.
    ///
    /// Validates the task parameters, lets the policy prepare the set
    /// (priority assignment), and materializes the first job of every task
    /// at its release offset.
    ///
    /// # Errors
    /// * [`SimulatorError::NonPositivePeriod`] / [`SimulatorError::NonPositiveWcet`]
    ///   – a task carries a zero timing parameter.
    /// * Whatever the policy's `prepare` reports (e.g.
    ///   [`SimulatorError::DuplicatePriority`]).
    pub fn new(
        mut task_set: TaskSet,
        mut policy: P,
        mut oracle: O,
        options: SimOptions,
    ) -> Result<Self, SimulatorError> {
        for task in task_set.tasks() {
            if task.period == 0 {
                return Err(SimulatorError::NonPositivePeriod {
                    task: task.name.clone(),
                });
            }
            if task.wcet == 0 {
                return Err(SimulatorError::NonPositiveWcet {
                    task: task.name.clone(),
                });
            }
        }

        policy.prepare(&mut task_set)?;

        // Advisory only: the simulation itself is the authoritative answer.
        if let Some(total_u) = check_liu_layland(&task_set) {
            warn!(
                utilization = total_u,
                bound = liu_layland_bound(task_set.len()),
                task_count = task_set.len(),
                "task set may not be RM-schedulable (utilization exceeds the \
                 Liu & Layland bound)"
            );
        }

        let mut next_jobs = JobTable::new();
        let mut traces = BTreeMap::new();
        for task in task_set.tasks() {
            let exec = if options.run_time_variation {
                oracle.varied_execution_time(task)
            } else {
                task.wcet
            };
            next_jobs.insert(task.id, Job::new(task, task.offset, exec));
            traces.insert(task.id, TaskTrace::default());
        }

        let events = EventContainer::new(policy.label());
        info!(
            task_count = task_set.len(),
            policy = %events.policy(),
            "schedule simulator initialised"
        );

        Ok(Self {
            task_set,
            policy,
            oracle,
            options,
            tick: 0,
            next_jobs,
            events,
            traces,
        })
    }

    // ── Public operations ─────────────────────────────────────────────────────

    /// Run the simulation forward by exactly one scheduling interval.
    ///
    /// Emits one event (plus, when enabled, one idle event if the processor
    /// has to wait for the next release) and advances the clock to the next
    /// scheduling point.
    pub fn advance(&mut self) -> Result<(), SimulatorError> {
        let Some(task_id) = self.policy.next_job(&self.task_set, &self.next_jobs, self.tick)
        else {
            return Err(SimulatorError::EmptyTaskSet);
        };
        let release = match self.next_jobs.get(&task_id) {
            Some(job) => job.release_time,
            None => return Err(SimulatorError::UnknownTask { task_id }),
        };

        // Nothing released yet: the processor idles until the next release.
        if release > self.tick {
            if self.options.gen_idle_time_events {
                self.events.push(SchedulerIntervalEvent::idle(
                    self.task_set.idle_task(),
                    self.tick,
                    release,
                ));
            }
            self.tick = release;
        }

        self.run_to_next_scheduling_point(task_id)
    }

    /// Repeatedly [`advance`](Self::advance) while the clock is below
    /// `tick_limit`, then trim the trace at the limit.
    ///
    /// An empty task set yields an empty container immediately.
    pub fn run_sim(&mut self, tick_limit: Tick) -> Result<&EventContainer, SimulatorError> {
        if self.task_set.is_empty() {
            return Ok(&self.events);
        }
        // Strictly below the limit: a step launched at the limit could only
        // produce events the trim below discards, yet it would still advance
        // job state and miss counters past the horizon.
        while self.tick < tick_limit {
            self.advance()?;
        }
        self.events.trim_to(tick_limit);
        Ok(&self.events)
    }

    /// Simulate `[0, offset + duration]` and discard everything before
    /// `offset`.  Used to cut transient warm-up effects out of the trace.
    pub fn run_sim_with_offset(
        &mut self,
        offset: Tick,
        duration: Tick,
    ) -> Result<&EventContainer, SimulatorError> {
        self.run_sim(offset + duration)?;
        self.events.trim_before(offset);
        Ok(&self.events)
    }

    /// [`run_sim_with_offset`](Self::run_sim_with_offset) with the default
    /// warm-up offset: the largest period in the set plus that task's
    /// release offset.
    pub fn run_sim_with_default_offset(
        &mut self,
        duration: Tick,
    ) -> Result<&EventContainer, SimulatorError> {
        let offset = self
            .task_set
            .largest_period_task()
            .map_or(0, |t| t.period + t.offset);
        self.run_sim_with_offset(offset, duration)
    }

    /// Simulate for `count` hyperperiods of the task set.
    ///
    /// The hyperperiod is the natural horizon for a purely periodic set: one
    /// of them contains every phasing the schedule will ever exhibit.
    pub fn run_sim_hyperperiods(&mut self, count: u64) -> Result<&EventContainer, SimulatorError> {
        let horizon = hyperperiod_of(&self.task_set)?;
        self.run_sim(horizon.saturating_mul(count))
    }

    /// Trim the trailing event to the current tick and return the trace.
    ///
    /// For hosts that stop calling [`advance`](Self::advance) on their own
    /// schedule rather than through [`run_sim`](Self::run_sim).
    pub fn conclude(&mut self) -> &EventContainer {
        self.events.trim_to(self.tick);
        &self.events
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    /// The current simulated time.
    pub fn current_tick(&self) -> Tick {
        self.tick
    }

    /// The trace accumulated so far.
    pub fn event_container(&self) -> &EventContainer {
        &self.events
    }

    /// The (frozen) task set, with policy-assigned priorities.
    pub fn task_set(&self) -> &TaskSet {
        &self.task_set
    }

    /// The scheduling policy instance.
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Per-task trace state, if the task exists.  Counters only move while
    /// `trace_enabled` is set.
    pub fn trace(&self, task_id: TaskId) -> Option<&TaskTrace> {
        self.traces.get(&task_id)
    }

    /// All per-task trace state, keyed by task id.
    pub fn traces(&self) -> &BTreeMap<TaskId, TaskTrace> {
        &self.traces
    }

    // ── The advance machinery ─────────────────────────────────────────────────

    /// Run the selected job from `self.tick` to the next scheduling point:
    /// its completion (or deadline) if nothing intervenes, or the earliest
    /// preempting release.
    fn run_to_next_scheduling_point(&mut self, task_id: TaskId) -> Result<(), SimulatorError> {
        let tick = self.tick;
        let preemption = match self.next_jobs.get(&task_id) {
            Some(job) => self
                .policy
                .preempting_tick(job, &self.task_set, &self.next_jobs, tick),
            None => return Err(SimulatorError::UnknownTask { task_id }),
        };

        match preemption {
            None => self.complete_job(task_id, tick),
            Some(p) => self.preempt_job(task_id, tick, p),
        }
    }

    /// The job runs to completion (or to its deadline, if it would overrun).
    /// Emits the closing interval, retires the job, and materializes the
    /// task's next release.
    fn complete_job(&mut self, task_id: TaskId, tick: Tick) -> Result<(), SimulatorError> {
        let Some(job) = self.next_jobs.get_mut(&task_id) else {
            return Err(SimulatorError::UnknownTask { task_id });
        };
        let natural_finish = tick + job.remaining_exec_time;
        let missed = natural_finish > job.absolute_deadline;
        let task_name = self
            .task_set
            .task(task_id)
            .map(|t| t.name.as_str())
            .unwrap_or("");

        let (end, end_state) = if missed {
            if self.options.assert_on_deadline_miss {
                return Err(SimulatorError::DeadlineMiss {
                    task: task_name.to_string(),
                    deadline: job.absolute_deadline,
                    finish: natural_finish,
                });
            }

            if self.options.trace_enabled {
                let trace = self.traces.entry(task_id).or_default();
                trace.deadline_miss_count += 1;
                if trace.miss_streak_active {
                    trace.running_consecutive_miss_count += 1;
                    if trace.running_consecutive_miss_count > trace.max_consecutive_miss_count {
                        trace.max_consecutive_miss_count = trace.running_consecutive_miss_count;
                    }
                }
                trace.miss_streak_active = true;
            }

            self.policy.on_deadline_missed(job);
            warn!(
                task = task_name,
                deadline = job.absolute_deadline,
                finish = natural_finish,
                "deadline missed"
            );

            // The clamp keeps the trace monotone when the job was first
            // dispatched after its deadline had already passed.
            (job.absolute_deadline.max(tick), EndState::EndDeadlineMissed)
        } else {
            if self.options.trace_enabled {
                let trace = self.traces.entry(task_id).or_default();
                trace.miss_streak_active = false;
                trace.running_consecutive_miss_count = 0;
            }
            (natural_finish, EndState::End)
        };

        let begin_state = if job.has_started {
            BeginState::Resume
        } else {
            BeginState::Start
        };
        job.has_started = true;
        job.remaining_exec_time = 0;
        let release_time = job.release_time;
        self.policy.on_job_executed(job, end, end - tick);

        debug!(
            task = task_name,
            begin = tick,
            end,
            release = release_time,
            "job retired"
        );
        self.events.push(SchedulerIntervalEvent::new(
            tick,
            end,
            task_id,
            release_time,
            begin_state,
            end_state,
        ));

        self.install_next_job(task_id)?;
        self.tick = end;
        Ok(())
    }

    /// The job is preempted at `preempting_tick` before finishing.  Emits
    /// the suspension interval and charges the executed ticks against the
    /// job's budget; the same job is selected again when it resumes.
    fn preempt_job(
        &mut self,
        task_id: TaskId,
        tick: Tick,
        preempting_tick: Tick,
    ) -> Result<(), SimulatorError> {
        // A preemption at or before the present tick is a policy-hook bug:
        // a job selected to run at `tick` cannot be displaced at `tick`.
        if preempting_tick <= tick {
            return Err(SimulatorError::PreemptionNotInFuture {
                task: self
                    .task_set
                    .task(task_id)
                    .map(|t| t.name.clone())
                    .unwrap_or_default(),
                preempting_tick,
                tick,
            });
        }

        let Some(job) = self.next_jobs.get_mut(&task_id) else {
            return Err(SimulatorError::UnknownTask { task_id });
        };
        debug_assert!(
            preempting_tick < tick + job.remaining_exec_time,
            "preemption predicted at or after the job's completion"
        );

        let begin_state = if job.has_started {
            BeginState::Resume
        } else {
            BeginState::Start
        };
        job.has_started = true;
        job.remaining_exec_time -= preempting_tick - tick;
        let release_time = job.release_time;
        self.policy
            .on_job_executed(job, preempting_tick, preempting_tick - tick);

        self.events.push(SchedulerIntervalEvent::new(
            tick,
            preempting_tick,
            task_id,
            release_time,
            begin_state,
            EndState::Suspend,
        ));

        self.tick = preempting_tick;
        Ok(())
    }

    /// Materialize the next release of `task_id` after its previous job
    /// retired: next release = previous release + inter-arrival time.
    ///
    /// The inter-arrival time is the period for periodic tasks and the
    /// oracle's draw (bounded below by the period) for sporadic tasks; it is
    /// recorded in the trace history whenever tracing is enabled.
    fn install_next_job(&mut self, task_id: TaskId) -> Result<(), SimulatorError> {
        let Some(task) = self.task_set.task(task_id) else {
            return Err(SimulatorError::UnknownTask { task_id });
        };
        let Some(prev) = self.next_jobs.get(&task_id) else {
            return Err(SimulatorError::UnknownTask { task_id });
        };
        let prev_release = prev.release_time;

        let inter_arrival = if task.sporadic && self.options.run_time_variation {
            self.oracle.varied_inter_arrival_time(task)
        } else {
            task.period
        };
        if self.options.trace_enabled {
            self.traces
                .entry(task_id)
                .or_default()
                .inter_arrival_times
                .push(inter_arrival);
        }

        let exec = if self.options.run_time_variation {
            self.oracle.varied_execution_time(task)
        } else {
            task.wcet
        };

        let next = Job::new(task, prev_release + inter_arrival, exec);
        self.next_jobs.insert(task_id, next);
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
