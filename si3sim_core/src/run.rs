//! Run records and the guard that keeps them honest.
//!
//! Every generation pass appends a [`RunRecord`] to the schedule's history
//! before it starts. The record is persisted with the schedule whether the
//! pass succeeds, fails, or unwinds, so the next run can tell how the
//! previous one ended and pick up from where it stopped.

use crate::engine::{GenerationSummary, ScheduleEngine};
use crate::{Result, TimePoint};
use chrono::Duration;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::path::Path;

/// Continuation key: cursor position at the end of the run
pub const NEXT_CURSOR: &str = "next_cursor";
/// Continuation key: samples written during the run
pub const SAMPLES_WRITTEN: &str = "samples_written";
/// Continuation key: window occurrences visited during the run
pub const WINDOWS_VISITED: &str = "windows_visited";

const TOOL_NAME: &str = "si3sim";

/// Provenance of one generation run
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RunRecord {
    pub run_id: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub continued_from: Option<String>,
    pub output_file: String,
    pub start_time: TimePoint,
    pub end_time: TimePoint,
    pub clean_run: bool,
    pub tool_name: String,
    pub tool_version: String,
    pub git_commit: String,
    pub git_branch: String,
    pub git_clean: bool,
    pub command_line_args: String,
    #[serde(default)]
    pub continuation_vars: Map<String, Value>,
}

impl RunRecord {
    /// A fresh, not-yet-clean record for a run writing to `output_file`,
    /// chained to `previous` when there is one.
    pub fn begin(output_file: impl Into<String>, previous: Option<&RunRecord>) -> Self {
        let now = TimePoint::now();
        Self {
            run_id: uuid::Uuid::new_v4().simple().to_string(),
            continued_from: previous.map(|p| p.run_id.clone()),
            output_file: output_file.into(),
            start_time: now,
            end_time: now,
            clean_run: false,
            tool_name: TOOL_NAME.to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            git_commit: option_env!("SI3SIM_GIT_COMMIT").unwrap_or("unknown").to_string(),
            git_branch: option_env!("SI3SIM_GIT_BRANCH").unwrap_or("unknown").to_string(),
            git_clean: option_env!("SI3SIM_GIT_CLEAN") == Some("true"),
            command_line_args: std::env::args().collect::<Vec<_>>().join(" "),
            continuation_vars: Map::new(),
        }
    }

    pub fn with_command_line(mut self, args: impl Into<String>) -> Self {
        self.command_line_args = args.into();
        self
    }

    pub fn duration(&self) -> Duration {
        self.end_time.duration_since(&self.start_time)
    }

    /// Where the run stopped, if it got far enough to say
    pub fn next_cursor(&self) -> Option<TimePoint> {
        self.continuation_vars
            .get(NEXT_CURSOR)
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
    }

    pub fn samples_written(&self) -> Option<u64> {
        self.continuation_vars.get(SAMPLES_WRITTEN).and_then(Value::as_u64)
    }

    fn store_progress(&mut self, progress: &GenerationSummary) {
        self.end_time = TimePoint::now();
        self.continuation_vars
            .insert(NEXT_CURSOR.into(), Value::String(progress.cursor.to_string()));
        self.continuation_vars
            .insert(SAMPLES_WRITTEN.into(), Value::from(progress.samples));
        self.continuation_vars
            .insert(WINDOWS_VISITED.into(), Value::from(progress.windows));
    }
}

fn empty_as_none<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<String>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.is_empty()))
}

/// `[-]HH:MM:SS` with a `.ffffff` suffix when there are microseconds
pub fn format_elapsed(elapsed: Duration) -> String {
    let negative = elapsed < Duration::zero();
    let magnitude = if negative { -elapsed } else { elapsed };

    let total_seconds = magnitude.num_seconds();
    let micros = (magnitude - Duration::seconds(total_seconds))
        .num_microseconds()
        .unwrap_or(0);

    let sign = if negative { "-" } else { "" };
    let clock = format!(
        "{}{:02}:{:02}:{:02}",
        sign,
        total_seconds / 3_600,
        (total_seconds / 60) % 60,
        total_seconds % 60
    );
    if micros == 0 {
        clock
    } else {
        format!("{}.{:06}", clock, micros)
    }
}

impl Serialize for RunRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let fields = if self.continued_from.is_some() { 14 } else { 13 };
        let mut state = serializer.serialize_struct("RunRecord", fields)?;
        state.serialize_field("run_id", &self.run_id)?;
        match &self.continued_from {
            Some(previous) => state.serialize_field("continued_from", previous)?,
            None => state.skip_field("continued_from")?,
        }
        state.serialize_field("output_file", &self.output_file)?;
        state.serialize_field("start_time", &self.start_time)?;
        state.serialize_field("end_time", &self.end_time)?;
        state.serialize_field("duration", &format_elapsed(self.duration()))?;
        state.serialize_field("clean_run", &self.clean_run)?;
        state.serialize_field("tool_name", &self.tool_name)?;
        state.serialize_field("tool_version", &self.tool_version)?;
        state.serialize_field("git_commit", &self.git_commit)?;
        state.serialize_field("git_branch", &self.git_branch)?;
        state.serialize_field("git_clean", &self.git_clean)?;
        state.serialize_field("command_line_args", &self.command_line_args)?;
        state.serialize_field("continuation_vars", &self.continuation_vars)?;
        state.end()
    }
}

/// Scoped ownership of an in-progress run.
///
/// Starting the guard appends the run record to the engine's schedule.
/// [`RunGuard::finalize`] stamps the record and saves the schedule to
/// `record_path`. If the guard is dropped without being finalized, for
/// example while unwinding, the record is marked unclean and saved anyway.
pub struct RunGuard<'a> {
    engine: &'a mut ScheduleEngine,
    record_path: &'a Path,
    finalized: bool,
}

impl<'a> RunGuard<'a> {
    pub fn start(engine: &'a mut ScheduleEngine, record_path: &'a Path, record: RunRecord) -> Self {
        if let Some(previous) = engine.config().last_run_record() {
            if !previous.clean_run {
                tracing::warn!(
                    "Previous run {} did not finish cleanly; its output may be incomplete",
                    previous.run_id
                );
            }
        }

        tracing::info!("Starting run {} writing {}", record.run_id, record.output_file);
        engine.config_mut().add_run_record(record);

        Self {
            engine,
            record_path,
            finalized: false,
        }
    }

    pub fn engine(&mut self) -> &mut ScheduleEngine {
        &mut *self.engine
    }

    pub fn record(&self) -> Option<&RunRecord> {
        self.engine.config().last_run_record()
    }

    /// Stamp the end time and progress, then persist the schedule
    pub fn finalize(mut self) -> Result<()> {
        self.finalized = true;
        self.stamp();
        self.engine.config().save_to(self.record_path)
    }

    fn stamp(&mut self) {
        let progress = self.engine.progress();
        if let Some(record) = self.engine.config_mut().last_run_record_mut() {
            record.store_progress(&progress);
        }
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if self.finalized {
            return;
        }

        if let Some(record) = self.engine.config_mut().last_run_record_mut() {
            record.clean_run = false;
        }
        self.stamp();

        match self.engine.config().save_to(self.record_path) {
            Ok(()) => tracing::warn!("Run abandoned; saved unclean record to {:?}", self.record_path),
            Err(e) => tracing::error!("Failed to save run record to {:?}: {}", self.record_path, e),
        }
    }
}

/// Run `generate` under a [`RunGuard`], always persisting the record.
///
/// A generation error is reported in preference to a failure to save.
pub fn run_to_completion<F>(
    engine: &mut ScheduleEngine,
    record_path: &Path,
    record: RunRecord,
    generate: F,
) -> Result<GenerationSummary>
where
    F: FnOnce(&mut ScheduleEngine) -> Result<GenerationSummary>,
{
    let mut guard = RunGuard::start(engine, record_path, record);
    let outcome = generate(guard.engine());
    let saved = guard.finalize();

    let summary = outcome?;
    saved?;
    Ok(summary)
}
