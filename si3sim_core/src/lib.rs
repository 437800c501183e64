#![forbid(unsafe_code)]

//! Core model and schedule engine for the Si3 measurement simulator.
//!
//! This crate provides:
//! - Precise decimal, time-of-day and timestamp primitives
//! - Recurring measurement schedules and their JSON documents
//! - The schedule engine and its sample sinks
//! - Run records with crash-safe finalization
//! - Tool settings and logging setup

pub mod error;
pub mod precise;
pub mod clock_time;
pub mod time_point;
pub mod schedule;
pub mod run;
pub mod sink;
pub mod engine;
pub mod config;
pub mod logging;

// Re-export commonly used types
pub use error::{Error, Result};
pub use precise::Precise;
pub use clock_time::ClockTime;
pub use time_point::{TimePoint, Weekday, Zone};
pub use schedule::{MeasurementWindow, RecurrencePeriod, ScheduleConfig};
pub use run::{run_to_completion, RunGuard, RunRecord};
pub use sink::{CsvSampleSink, OutputOptions, Sample, SampleSink, TimestampFormat};
pub use engine::{GenerationSummary, ScheduleEngine};
pub use config::Settings;
