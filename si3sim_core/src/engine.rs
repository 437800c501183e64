//! Schedule engine: finds the next measurement window and walks the
//! configured time range emitting samples of the linear drift model.
//!
//! One generation pass moves a single cursor forward through time:
//!
//! 1. **Seek**: pick the next window relative to the cursor's schedule day
//!    and time of day, wrapping to the first window of the next cycle.
//! 2. **Jump**: move the cursor to that window's next concrete occurrence.
//! 3. **Sample**: emit one sample per `sample_interval_seconds` until the
//!    window ends, the day rolls over, or the range ends.
//! 4. **Advance**: park the cursor at the window's end and seek again.
//!
//! The cursor never moves backwards during a pass.

use crate::sink::{Sample, SampleSink};
use crate::{Error, MeasurementWindow, Precise, RecurrencePeriod, Result, ScheduleConfig, TimePoint};

/// Counters for one generation pass
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationSummary {
    /// Samples handed to the sink
    pub samples: u64,
    /// Window occurrences visited
    pub windows: u64,
    /// Where the cursor stopped
    pub cursor: TimePoint,
}

/// Owns one schedule and the cursor walking through it
#[derive(Debug)]
pub struct ScheduleEngine {
    config: ScheduleConfig,
    cursor: TimePoint,
    samples: u64,
    windows: u64,
}

impl ScheduleEngine {
    /// Sort and check the schedule, placing the cursor at the range start.
    ///
    /// Fails with a validation error before anything is generated if the
    /// schedule is empty, has inverted or overlapping windows, or is
    /// otherwise unusable.
    pub fn new(mut config: ScheduleConfig) -> Result<Self> {
        config.check()?;
        let cursor = *config.range_start();
        Ok(Self {
            config,
            cursor,
            samples: 0,
            windows: 0,
        })
    }

    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    pub(crate) fn config_mut(&mut self) -> &mut ScheduleConfig {
        &mut self.config
    }

    pub fn into_config(self) -> ScheduleConfig {
        self.config
    }

    pub fn cursor(&self) -> &TimePoint {
        &self.cursor
    }

    /// Move the cursor forward, e.g. to continue where a previous run stopped
    pub fn resume_at(&mut self, time: TimePoint) -> Result<()> {
        if time < self.cursor {
            return Err(Error::Validation(format!(
                "cannot resume at {}: cursor is already at {}",
                time, self.cursor
            )));
        }
        tracing::info!("Resuming schedule at {}", time);
        self.cursor = time;
        Ok(())
    }

    pub fn progress(&self) -> GenerationSummary {
        GenerationSummary {
            samples: self.samples,
            windows: self.windows,
            cursor: self.cursor,
        }
    }

    /// The cursor's position within the recurrence cycle
    pub fn schedule_day(&self) -> u32 {
        match self.config.recurrence() {
            RecurrencePeriod::Daily => 0,
            RecurrencePeriod::Weekly => self.cursor.day_of_week(),
            RecurrencePeriod::Monthly => self.cursor.day_of_month(),
            RecurrencePeriod::Yearly => self.cursor.day_of_year(),
            RecurrencePeriod::ModuloJulianDay(period) => {
                self.cursor.mjd().rem_euclid(i64::from(period.max(1))) as u32
            }
        }
    }

    /// First window at or after the cursor in this cycle, else the first
    /// window of the next cycle.
    ///
    /// A window starting exactly at the cursor's time of day is selected.
    pub fn next_measurement_window(&self) -> Result<MeasurementWindow> {
        let windows = self.config.windows();
        let first = windows
            .first()
            .ok_or_else(|| Error::validation("no measurement windows configured"))?;

        let day = self.schedule_day();
        let now = self.cursor.time_of_day();

        let next = windows
            .iter()
            .find(|w| w.day > day || (w.day == day && w.start >= now))
            .unwrap_or(first);

        Ok(*next)
    }

    /// The soonest occurrence of `window.start` that is not in the past
    pub fn next_occurrence(&self, window: &MeasurementWindow) -> TimePoint {
        let interval = i64::from(self.config.interval());
        let mut day_diff = i64::from(window.day) - i64::from(self.schedule_day());
        while day_diff < 0 {
            day_diff += interval;
        }
        // Same day but already started: next cycle
        if day_diff == 0 && self.cursor.time_of_day() > window.start {
            day_diff = interval;
        }

        let mut time = self.cursor;
        time.add_days(day_diff);
        time.set_time(window.start);
        time
    }

    /// Linear drift model evaluated at `time`, with no intermediate rounding
    pub fn value_at(&self, time: &TimePoint) -> Precise {
        let elapsed = time.seconds_since(self.config.range_start());
        self.config.start_value() + &(self.config.drift_rate() * &elapsed)
    }

    /// Walk the range, writing every sample to `sink`.
    ///
    /// On success the newest run record, if any, is marked clean. On failure
    /// the cursor and counters reflect how far generation got.
    pub fn generate<S: SampleSink + ?Sized>(&mut self, sink: &mut S) -> Result<GenerationSummary> {
        let range_end = *self.config.range_end();
        tracing::info!(
            "Generating {} schedule from {} to {}",
            self.config.recurrence(),
            self.cursor,
            range_end
        );

        let mut window = self.next_measurement_window()?;
        self.cursor = self.next_occurrence(&window);

        while self.cursor < range_end {
            let occurrence = self.cursor;
            self.windows += 1;
            tracing::debug!(
                "Window day {} {}-{} at {}",
                window.day,
                window.start,
                window.end,
                occurrence
            );

            while self.cursor.date() == occurrence.date()
                && self.cursor.time_of_day() <= window.end
                && self.cursor < range_end
            {
                let sample = Sample {
                    time: self.cursor,
                    value: self.value_at(&self.cursor),
                };
                sink.record(&sample)?;
                self.samples += 1;
                self.cursor.add_seconds(window.sample_interval_seconds);
            }

            // Park at this occurrence's end so it is not entered again
            let mut parked = occurrence;
            parked.set_time(window.end);
            self.cursor = parked;

            window = self.next_measurement_window()?;
            let next = self.next_occurrence(&window);
            if next <= occurrence {
                return Err(Error::Logic(format!(
                    "schedule failed to advance past {} (next occurrence {})",
                    occurrence, next
                )));
            }
            self.cursor = next;
        }

        sink.finish()?;

        if let Some(record) = self.config.last_run_record_mut() {
            record.clean_run = true;
        }

        let summary = self.progress();
        tracing::info!(
            "Generated {} samples across {} window occurrences",
            summary.samples,
            summary.windows
        );
        Ok(summary)
    }
}
