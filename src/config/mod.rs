//! Simulation configuration loading.
//!
//! Deserializes a task set and the simulator options from a YAML file.  The
//! expected structure is:
//! ```yaml
//! options:
//!   run_time_variation: false
//!   gen_idle_time_events: true
//!   assert_on_deadline_miss: false
//!   trace_enabled: true
//! tasks:
//!   engine_ctrl:
//!     period: 10
//!     wcet: 3
//!     deadline: 10      # optional, defaults to the period
//!     offset: 0         # optional, defaults to 0
//!     sporadic: false   # optional, defaults to false
//!   telemetry:
//!     period: 20
//!     wcet: 5
//! ```
//!
//! Task ids are assigned `1..=n` in sorted name order (id `0` is reserved
//! for the idle sentinel), so a given file always produces the same task
//! set.  Every `options` key is optional and falls back to its
//! [`SimOptions`] default.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use crate::scheduler::SimOptions;
use crate::task::{Task, TaskSet, Tick};

// ── Private YAML deserialization types ────────────────────────────────────────

/// Top-level wrapper that maps directly onto the YAML file layout.
///
/// Kept private – callers work with [`SimConfig`] instead.
#[derive(Debug, Deserialize)]
struct SimConfigFile {
    #[serde(default)]
    options: OptionsEntry,
    /// `BTreeMap` so id assignment follows sorted name order.
    tasks: BTreeMap<String, TaskEntry>,
}

/// Simulator flags as they appear in the YAML file; every field optional.
#[derive(Debug, Deserialize)]
#[serde(default)]
struct OptionsEntry {
    run_time_variation: bool,
    gen_idle_time_events: bool,
    assert_on_deadline_miss: bool,
    trace_enabled: bool,
}

impl Default for OptionsEntry {
    fn default() -> Self {
        let defaults = SimOptions::default();
        Self {
            run_time_variation: defaults.run_time_variation,
            gen_idle_time_events: defaults.gen_idle_time_events,
            assert_on_deadline_miss: defaults.assert_on_deadline_miss,
            trace_enabled: defaults.trace_enabled,
        }
    }
}

/// Per-task fields as they appear in the YAML file.
#[derive(Debug, Deserialize)]
struct TaskEntry {
    period: Tick,
    wcet: Tick,
    /// Relative deadline; defaults to the period when absent.
    deadline: Option<Tick>,
    #[serde(default)]
    offset: Tick,
    #[serde(default)]
    sporadic: bool,
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// A fully parsed simulation configuration: the task set plus the simulator
/// options.
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub task_set: TaskSet,
    pub options: SimOptions,
}

impl SimConfig {
    /// Parse `path` into a [`SimConfig`].
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or if the YAML is
    /// structurally invalid.  Task *parameter* validation (non-zero period
    /// and WCET) is left to simulator construction.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading simulation configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open configuration file: {}", path.display()))?;

        Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse YAML file: {}", path.display()))
    }

    /// Parse a YAML document into a [`SimConfig`].
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let file: SimConfigFile = serde_yaml::from_str(content)?;

        let mut task_set = TaskSet::new();
        for (id, (name, entry)) in (1u64..).zip(file.tasks) {
            let task = Task {
                id,
                name: name.clone(),
                period: entry.period,
                wcet: entry.wcet,
                deadline: entry.deadline.unwrap_or(entry.period),
                offset: entry.offset,
                priority: 0,
                sporadic: entry.sporadic,
            };
            debug!(
                task = %name,
                id,
                period = task.period,
                wcet = task.wcet,
                deadline = task.deadline,
                offset = task.offset,
                sporadic = task.sporadic,
                "task loaded"
            );
            task_set.add_task(task);
        }

        let options = SimOptions {
            run_time_variation: file.options.run_time_variation,
            gen_idle_time_events: file.options.gen_idle_time_events,
            assert_on_deadline_miss: file.options.assert_on_deadline_miss,
            trace_enabled: file.options.trace_enabled,
        };

        info!(task_count = task_set.len(), "simulation configuration loaded");

        Ok(Self { task_set, options })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Helper: write a YAML string to a temp file and return it.
    fn yaml_tempfile(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    // ── load_from_file ────────────────────────────────────────────────────────

    #[test]
    fn load_full_example_yaml() {
        let yaml = r#"
options:
  run_time_variation: false
  gen_idle_time_events: true
  assert_on_deadline_miss: false
  trace_enabled: true
tasks:
  engine_ctrl:
    period: 10
    wcet: 3
  telemetry:
    period: 20
    wcet: 5
    deadline: 15
    offset: 2
  diag_poll:
    period: 50
    wcet: 4
    sporadic: true
"#;
        let f = yaml_tempfile(yaml);
        let cfg = SimConfig::load_from_file(f.path()).unwrap();

        assert_eq!(cfg.task_set.len(), 3);
        assert!(!cfg.options.assert_on_deadline_miss);
        assert!(cfg.options.trace_enabled);

        // Names sorted: diag_poll → 1, engine_ctrl → 2, telemetry → 3.
        let diag = cfg.task_set.task(1).unwrap();
        assert_eq!(diag.name, "diag_poll");
        assert!(diag.sporadic);
        assert_eq!(diag.deadline, 50); // defaults to the period

        let engine = cfg.task_set.task(2).unwrap();
        assert_eq!(engine.name, "engine_ctrl");
        assert_eq!((engine.period, engine.wcet), (10, 3));

        let telemetry = cfg.task_set.task(3).unwrap();
        assert_eq!(telemetry.deadline, 15);
        assert_eq!(telemetry.offset, 2);
    }

    #[test]
    fn missing_options_section_uses_defaults() {
        let yaml = r#"
tasks:
  only_task:
    period: 10
    wcet: 2
"#;
        let cfg = SimConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(cfg.options, SimOptions::default());
    }

    #[test]
    fn partial_options_fall_back_per_field() {
        let yaml = r#"
options:
  trace_enabled: true
tasks:
  only_task:
    period: 10
    wcet: 2
"#;
        let cfg = SimConfig::from_yaml_str(yaml).unwrap();
        assert!(cfg.options.trace_enabled);
        // Untouched fields keep their defaults.
        assert!(cfg.options.gen_idle_time_events);
        assert!(cfg.options.assert_on_deadline_miss);
        assert!(!cfg.options.run_time_variation);
    }

    #[test]
    fn id_assignment_is_deterministic_in_name_order() {
        let yaml = r#"
tasks:
  zeta:
    period: 30
    wcet: 1
  alpha:
    period: 10
    wcet: 1
  mid:
    period: 20
    wcet: 1
"#;
        let cfg = SimConfig::from_yaml_str(yaml).unwrap();
        let names: Vec<&str> = cfg.task_set.tasks().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn missing_file_returns_error() {
        let result = SimConfig::load_from_file(Path::new("/nonexistent/path/sim.yaml"));
        assert!(result.is_err());
    }

    #[test]
    fn malformed_yaml_returns_error() {
        let f = yaml_tempfile("this is: not: valid: yaml: content:::");
        assert!(SimConfig::load_from_file(f.path()).is_err());
    }

    #[test]
    fn missing_required_task_field_returns_error() {
        // wcet missing
        let yaml = r#"
tasks:
  broken:
    period: 10
"#;
        assert!(SimConfig::from_yaml_str(yaml).is_err());
    }

    // ── End-to-end with the simulator ─────────────────────────────────────────

    #[test]
    fn loaded_config_drives_a_simulation() {
        use crate::scheduler::{FixedPriorityPolicy, ScheduleSimulator};
        use crate::variation::NoVariation;

        let yaml = r#"
options:
  assert_on_deadline_miss: false
  trace_enabled: true
tasks:
  fast:
    period: 10
    wcet: 3
  slow:
    period: 20
    wcet: 5
"#;
        let cfg = SimConfig::from_yaml_str(yaml).unwrap();
        let mut sim = ScheduleSimulator::new(
            cfg.task_set,
            FixedPriorityPolicy::new(),
            NoVariation,
            cfg.options,
        )
        .unwrap();
        let trace = sim.run_sim(40).unwrap();

        assert!(!trace.is_empty());
        assert_eq!(trace.last().unwrap().end, 40);
    }
}
