//! Recurring schedule definition and its JSON document form.
//!
//! A [`ScheduleConfig`] owns the recurrence, the simulated time range, the
//! measurement windows, the linear model parameters and the history of
//! previous runs. It is loaded from and saved back to a JSON document.

use crate::run::RunRecord;
use crate::{ClockTime, Error, Precise, Result, TimePoint, Weekday};
use fs2::FileExt;
use serde::{de, ser, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::str::FromStr;
use tempfile::NamedTempFile;

/// How the schedule repeats, and what a window's `day` means
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecurrencePeriod {
    /// Every day; all windows use day 0
    Daily,
    /// Day of week, Sunday = 0
    Weekly,
    /// Day of month, 1-based
    Monthly,
    /// Day of year, 1-based
    Yearly,
    /// Modified Julian Day modulo `period`
    ModuloJulianDay(u32),
}

impl RecurrencePeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurrencePeriod::Daily => "DAILY",
            RecurrencePeriod::Weekly => "WEEKLY",
            RecurrencePeriod::Monthly => "MONTHLY",
            RecurrencePeriod::Yearly => "YEARLY",
            RecurrencePeriod::ModuloJulianDay(_) => "MJD",
        }
    }

    /// Integer cycle length used for wraparound arithmetic
    pub fn cycle_length(&self) -> u32 {
        match self {
            RecurrencePeriod::Daily => 1,
            RecurrencePeriod::Weekly => 7,
            RecurrencePeriod::Monthly => 30,
            RecurrencePeriod::Yearly => 365,
            RecurrencePeriod::ModuloJulianDay(period) => *period,
        }
    }

    /// Inclusive range of meaningful window days, `None` when any day is accepted
    fn day_range(&self) -> Option<(u32, u32)> {
        match self {
            RecurrencePeriod::Daily => None,
            RecurrencePeriod::Weekly => Some((0, 6)),
            RecurrencePeriod::Monthly => Some((1, 31)),
            RecurrencePeriod::Yearly => Some((1, 366)),
            RecurrencePeriod::ModuloJulianDay(period) => Some((0, period.saturating_sub(1))),
        }
    }
}

impl fmt::Display for RecurrencePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecurrencePeriod::ModuloJulianDay(period) => write!(f, "MJD mod {}", period),
            other => f.write_str(other.as_str()),
        }
    }
}

impl FromStr for RecurrencePeriod {
    type Err = Error;

    /// `"MJD"` parses with a period of 1; the document's `mjd_period`
    /// replaces it.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "DAILY" => Ok(RecurrencePeriod::Daily),
            "WEEKLY" => Ok(RecurrencePeriod::Weekly),
            "MONTHLY" => Ok(RecurrencePeriod::Monthly),
            "YEARLY" => Ok(RecurrencePeriod::Yearly),
            "MJD" => Ok(RecurrencePeriod::ModuloJulianDay(1)),
            other => Err(Error::parse(format!("unknown recurrence: {:?}", other))),
        }
    }
}

/// A schedule-relative interval during which samples are emitted
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeasurementWindow {
    /// Schedule-relative day; meaning depends on the recurrence
    pub day: u32,
    pub start: ClockTime,
    pub end: ClockTime,
    pub sample_interval_seconds: u32,
}

impl MeasurementWindow {
    pub fn new(day: u32, start: ClockTime, end: ClockTime, sample_interval_seconds: u32) -> Self {
        Self {
            day,
            start,
            end,
            sample_interval_seconds,
        }
    }

    fn sort_key(&self) -> (u32, ClockTime) {
        (self.day, self.start)
    }
}

/// The recurring schedule, model parameters and run provenance
#[derive(Clone, Debug, PartialEq)]
pub struct ScheduleConfig {
    recurrence: RecurrencePeriod,
    range_start: TimePoint,
    range_end: TimePoint,
    windows: Vec<MeasurementWindow>,
    start_value: Precise,
    drift_rate: Precise,
    run_history: Vec<RunRecord>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        let now = TimePoint::now();
        Self {
            recurrence: RecurrencePeriod::Daily,
            range_start: now,
            range_end: now,
            windows: Vec::new(),
            start_value: Precise::from_scaled(-2_753_484_340, 3),
            drift_rate: Precise::from_scaled(2, 4),
            run_history: Vec::new(),
        }
    }
}

impl ScheduleConfig {
    pub fn new(recurrence: RecurrencePeriod, range_start: TimePoint, range_end: TimePoint) -> Self {
        Self {
            recurrence,
            range_start,
            range_end,
            ..Self::default()
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn recurrence(&self) -> RecurrencePeriod {
        self.recurrence
    }

    pub fn range_start(&self) -> &TimePoint {
        &self.range_start
    }

    pub fn range_end(&self) -> &TimePoint {
        &self.range_end
    }

    pub fn windows(&self) -> &[MeasurementWindow] {
        &self.windows
    }

    pub fn start_value(&self) -> &Precise {
        &self.start_value
    }

    pub fn drift_rate(&self) -> &Precise {
        &self.drift_rate
    }

    pub fn run_history(&self) -> &[RunRecord] {
        &self.run_history
    }

    pub fn last_run_record(&self) -> Option<&RunRecord> {
        self.run_history.last()
    }

    pub(crate) fn last_run_record_mut(&mut self) -> Option<&mut RunRecord> {
        self.run_history.last_mut()
    }

    /// Cycle length of the recurrence
    pub fn interval(&self) -> u32 {
        self.recurrence.cycle_length()
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    pub fn set_recurrence(&mut self, recurrence: RecurrencePeriod) {
        self.recurrence = recurrence;
    }

    pub fn set_range(&mut self, start: TimePoint, end: TimePoint) {
        self.range_start = start;
        self.range_end = end;
    }

    pub fn set_model(&mut self, start_value: Precise, drift_rate: Precise) {
        self.start_value = start_value;
        self.drift_rate = drift_rate;
    }

    /// Appends without sorting; call [`sort_windows`](Self::sort_windows) or
    /// [`validate_windows`](Self::validate_windows) before relying on order.
    pub fn add_window(&mut self, window: MeasurementWindow) {
        self.windows.push(window);
    }

    pub fn clear_windows(&mut self) {
        self.windows.clear();
    }

    /// Stable sort by `(day, start)`
    pub fn sort_windows(&mut self) {
        self.windows.sort_by_key(MeasurementWindow::sort_key);
    }

    /// Sort, then report whether every window ends after it starts and no
    /// two windows on the same day overlap.
    pub fn validate_windows(&mut self) -> bool {
        self.sort_windows();
        self.first_window_problem().is_none()
    }

    fn first_window_problem(&self) -> Option<String> {
        for (index, current) in self.windows.iter().enumerate() {
            if current.end <= current.start {
                return Some(format!(
                    "window on day {} ends ({}) at or before it starts ({})",
                    current.day, current.end, current.start
                ));
            }
            if index > 0 {
                let prev = &self.windows[index - 1];
                if current.day == prev.day && current.start < prev.end {
                    return Some(format!(
                        "windows on day {} overlap: {}-{} and {}-{}",
                        current.day, prev.start, prev.end, current.start, current.end
                    ));
                }
            }
        }
        None
    }

    /// Everything the engine needs to hold before generation may start.
    ///
    /// Sorts the windows as a side effect.
    pub fn check(&mut self) -> Result<()> {
        if self.windows.is_empty() {
            return Err(Error::validation("no measurement windows configured"));
        }

        self.sort_windows();
        if let Some(problem) = self.first_window_problem() {
            return Err(Error::Validation(problem));
        }

        if self.interval() == 0 {
            return Err(Error::validation("MJD recurrence period must be at least 1"));
        }

        if let Some(window) = self.windows.iter().find(|w| w.sample_interval_seconds == 0) {
            return Err(Error::Validation(format!(
                "window on day {} starting {} has a zero sample interval",
                window.day, window.start
            )));
        }

        if let Some((low, high)) = self.recurrence.day_range() {
            if let Some(window) = self.windows.iter().find(|w| w.day < low || w.day > high) {
                return Err(Error::Validation(format!(
                    "window day {} is outside {}..={} for {} recurrence",
                    window.day, low, high, self.recurrence
                )));
            }
        }

        if self.range_end < self.range_start {
            return Err(Error::Validation(format!(
                "range end {} precedes range start {}",
                self.range_end, self.range_start
            )));
        }

        Ok(())
    }

    // ------------------------------------------------------------------
    // Run history
    // ------------------------------------------------------------------

    pub fn add_run_record(&mut self, record: RunRecord) {
        self.run_history.push(record);
    }

    /// Replace the newest record, or append when the history is empty
    pub fn update_last_run_record(&mut self, record: RunRecord) {
        match self.run_history.last_mut() {
            Some(last) => *last = record,
            None => self.run_history.push(record),
        }
    }

    pub fn clear_run_records(&mut self) {
        self.run_history.clear();
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Load a config document, holding a shared lock while reading
    pub fn load_from(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read?;

        let config = Self::from_json_str(&contents)?;
        tracing::info!(
            "Loaded {} schedule with {} windows from {:?}",
            config.recurrence,
            config.windows.len(),
            path
        );
        Ok(config)
    }

    /// Atomically replace the document at `path`
    ///
    /// Writes to a locked temp file in the same directory, syncs it, then
    /// renames it over the target.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            self.to_writer(&mut writer)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;
        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::info!(
            "Saved schedule with {} run records to {:?}",
            self.run_history.len(),
            path
        );
        Ok(())
    }
}

// ============================================================================
// Document form
// ============================================================================

/// On-disk shape of a [`ScheduleConfig`]
#[derive(Debug, Serialize, Deserialize)]
struct ConfigDocument {
    recurrence: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mjd_period: Option<u32>,
    range_start: TimePoint,
    range_end: TimePoint,
    windows: Vec<WindowDocument>,
    start_value: Precise,
    drift_rate: Precise,
    #[serde(default)]
    run_history: Vec<RunRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WindowDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    day: Option<DayField>,
    start: ClockTime,
    end: ClockTime,
    sample_interval_seconds: u32,
}

/// Weekly schedules name their days; everything else numbers them
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum DayField {
    Index(u32),
    Name(String),
}

impl DayField {
    fn for_window(recurrence: RecurrencePeriod, day: u32) -> Result<Option<Self>> {
        match recurrence {
            RecurrencePeriod::Daily => Ok(None),
            RecurrencePeriod::Weekly => {
                let weekday = Weekday::from_index(day).ok_or_else(|| {
                    Error::validation(format!(
                        "window day {} is not a weekday for WEEKLY recurrence",
                        day
                    ))
                })?;
                Ok(Some(DayField::Name(weekday.name().to_string())))
            }
            _ => Ok(Some(DayField::Index(day))),
        }
    }

    fn resolve(field: Option<DayField>, recurrence: RecurrencePeriod) -> Result<u32> {
        match (recurrence, field) {
            (RecurrencePeriod::Daily, _) => Ok(0),
            (RecurrencePeriod::Weekly, Some(DayField::Name(name))) => {
                Ok(name.parse::<Weekday>()?.index())
            }
            (RecurrencePeriod::Weekly, Some(DayField::Index(day))) => Err(Error::parse(format!(
                "window day {} must be a weekday name for WEEKLY recurrence",
                day
            ))),
            (_, Some(DayField::Index(day))) => Ok(day),
            (_, Some(DayField::Name(name))) => Err(Error::parse(format!(
                "window day {:?} must be an integer for {} recurrence",
                name,
                recurrence.as_str()
            ))),
            (_, None) => Err(Error::parse(format!(
                "window is missing its day for {} recurrence",
                recurrence.as_str()
            ))),
        }
    }
}

impl TryFrom<ConfigDocument> for ScheduleConfig {
    type Error = Error;

    fn try_from(doc: ConfigDocument) -> Result<Self> {
        let recurrence = match doc.recurrence.parse::<RecurrencePeriod>()? {
            RecurrencePeriod::ModuloJulianDay(_) => {
                let period = doc.mjd_period.ok_or_else(|| {
                    Error::parse("MJD recurrence requires an mjd_period field")
                })?;
                RecurrencePeriod::ModuloJulianDay(period)
            }
            other => other,
        };

        let windows = doc
            .windows
            .into_iter()
            .map(|w| {
                Ok(MeasurementWindow {
                    day: DayField::resolve(w.day, recurrence)?,
                    start: w.start,
                    end: w.end,
                    sample_interval_seconds: w.sample_interval_seconds,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ScheduleConfig {
            recurrence,
            range_start: doc.range_start,
            range_end: doc.range_end,
            windows,
            start_value: doc.start_value,
            drift_rate: doc.drift_rate,
            run_history: doc.run_history,
        })
    }
}

impl TryFrom<&ScheduleConfig> for ConfigDocument {
    type Error = Error;

    fn try_from(config: &ScheduleConfig) -> Result<Self> {
        let mjd_period = match config.recurrence {
            RecurrencePeriod::ModuloJulianDay(period) => Some(period),
            _ => None,
        };

        let windows = config
            .windows
            .iter()
            .map(|w| {
                Ok(WindowDocument {
                    day: DayField::for_window(config.recurrence, w.day)?,
                    start: w.start,
                    end: w.end,
                    sample_interval_seconds: w.sample_interval_seconds,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ConfigDocument {
            recurrence: config.recurrence.as_str().to_string(),
            mjd_period,
            range_start: config.range_start,
            range_end: config.range_end,
            windows,
            start_value: config.start_value.clone(),
            drift_rate: config.drift_rate.clone(),
            run_history: config.run_history.clone(),
        })
    }
}

impl Serialize for ScheduleConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        ConfigDocument::try_from(self)
            .map_err(ser::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ScheduleConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let doc = ConfigDocument::deserialize(deserializer)?;
        ScheduleConfig::try_from(doc).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> ClockTime {
        s.parse().unwrap()
    }

    fn window(day: u32, start: &str, end: &str) -> MeasurementWindow {
        MeasurementWindow::new(day, t(start), t(end), 60)
    }

    fn weekly_config() -> ScheduleConfig {
        let mut config = ScheduleConfig::new(
            RecurrencePeriod::Weekly,
            "2024-01-03T08:00:00Z".parse().unwrap(),
            "2024-02-01T00:00:00Z".parse().unwrap(),
        );
        config.add_window(window(5, "12:00:00", "13:00:00"));
        config.add_window(window(1, "09:00:00", "10:00:00"));
        config.add_window(window(1, "07:00:00", "08:30:00"));
        config
    }

    #[test]
    fn test_interval_per_recurrence() {
        let mut config = ScheduleConfig::default();
        let cases = [
            (RecurrencePeriod::Daily, 1),
            (RecurrencePeriod::Weekly, 7),
            (RecurrencePeriod::Monthly, 30),
            (RecurrencePeriod::Yearly, 365),
            (RecurrencePeriod::ModuloJulianDay(11), 11),
        ];
        for (recurrence, expected) in cases {
            config.set_recurrence(recurrence);
            assert_eq!(config.interval(), expected);
        }
    }

    #[test]
    fn test_add_window_does_not_sort() {
        let config = weekly_config();
        assert_eq!(config.windows()[0].day, 5);
    }

    #[test]
    fn test_sort_windows_by_day_then_start() {
        let mut config = weekly_config();
        config.sort_windows();
        let keys: Vec<_> = config.windows().iter().map(|w| (w.day, w.start)).collect();
        assert_eq!(
            keys,
            vec![(1, t("07:00:00")), (1, t("09:00:00")), (5, t("12:00:00"))]
        );
    }

    #[test]
    fn test_validate_accepts_disjoint_windows() {
        let mut config = weekly_config();
        assert!(config.validate_windows());
    }

    #[test]
    fn test_validate_is_idempotent() {
        let mut config = weekly_config();
        config.add_window(window(5, "12:30:00", "14:00:00"));

        let first = config.validate_windows();
        let order = config.windows().to_vec();
        let second = config.validate_windows();

        assert!(!first);
        assert_eq!(first, second);
        assert_eq!(order, config.windows());
    }

    #[test]
    fn test_validate_rejects_identical_starts() {
        let mut config = ScheduleConfig::default();
        config.add_window(window(0, "10:00:00", "11:00:00"));
        config.add_window(window(0, "10:00:00", "10:30:00"));
        assert!(!config.validate_windows());
    }

    #[test]
    fn test_validate_rejects_inverted_and_empty_windows() {
        let mut config = ScheduleConfig::default();
        config.add_window(window(0, "11:00:00", "10:00:00"));
        assert!(!config.validate_windows());

        config.clear_windows();
        config.add_window(window(0, "10:00:00", "10:00:00"));
        assert!(!config.validate_windows());
    }

    #[test]
    fn test_validate_allows_touching_windows() {
        let mut config = ScheduleConfig::default();
        config.add_window(window(0, "10:00:00", "11:00:00"));
        config.add_window(window(0, "11:00:00", "12:00:00"));
        assert!(config.validate_windows());
    }

    #[test]
    fn test_check_reports_problems() {
        let mut empty = ScheduleConfig::default();
        assert!(empty.check().unwrap_err().is_validation());

        let mut weekly = weekly_config();
        weekly.add_window(window(10, "09:00:00", "10:00:00"));
        assert!(weekly.check().unwrap_err().is_validation());

        let mut mjd = ScheduleConfig::default();
        mjd.set_recurrence(RecurrencePeriod::ModuloJulianDay(3));
        mjd.add_window(window(3, "09:00:00", "10:00:00"));
        assert!(mjd.check().is_err());

        mjd.set_recurrence(RecurrencePeriod::ModuloJulianDay(0));
        assert!(mjd.check().is_err());

        let mut zero_interval = ScheduleConfig::default();
        zero_interval.add_window(MeasurementWindow::new(0, t("09:00:00"), t("10:00:00"), 0));
        assert!(zero_interval.check().is_err());

        let mut backwards = weekly_config();
        backwards.set_range(
            "2024-02-01T00:00:00Z".parse().unwrap(),
            "2024-01-01T00:00:00Z".parse().unwrap(),
        );
        assert!(backwards.check().is_err());

        assert!(weekly_config().check().is_ok());
    }

    #[test]
    fn test_update_last_run_record_appends_when_empty() {
        let mut config = ScheduleConfig::default();
        assert!(config.last_run_record().is_none());

        config.update_last_run_record(RunRecord::begin("out.csv", None));
        assert_eq!(config.run_history().len(), 1);

        let mut replacement = RunRecord::begin("other.csv", None);
        replacement.clean_run = true;
        config.update_last_run_record(replacement);
        assert_eq!(config.run_history().len(), 1);
        assert!(config.last_run_record().unwrap().clean_run);
    }

    #[test]
    fn test_weekly_days_serialize_as_names() {
        let mut config = weekly_config();
        config.sort_windows();
        let json = config.to_json_string().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["recurrence"], "WEEKLY");
        assert_eq!(value["windows"][0]["day"], "Monday");
        assert_eq!(value["windows"][2]["day"], "Friday");
        assert_eq!(value["windows"][0]["start"], "07:00:00");
    }

    #[test]
    fn test_document_roundtrip() {
        let mut config = weekly_config();
        config.set_model("-2753484.340".parse().unwrap(), "0.0002".parse().unwrap());
        let mut record = RunRecord::begin("data.csv", None);
        record
            .continuation_vars
            .insert("next_cursor".into(), "2024-01-08T10:00:00Z".into());
        config.add_run_record(record);

        let json = config.to_json_string().unwrap();
        let parsed = ScheduleConfig::from_json_str(&json).unwrap();

        assert_eq!(parsed.recurrence(), config.recurrence());
        assert_eq!(parsed.range_start(), config.range_start());
        assert_eq!(parsed.range_end(), config.range_end());
        assert_eq!(parsed.windows(), config.windows());
        assert_eq!(parsed.start_value().to_string(), "-2753484.340");
        assert_eq!(parsed.drift_rate().to_string(), "0.0002");
        assert_eq!(parsed.run_history(), config.run_history());
    }

    #[test]
    fn test_weekly_days_must_be_names() {
        let numbered = r#"{
            "recurrence": "WEEKLY",
            "range_start": "2024-01-01T00:00:00Z",
            "range_end": "2024-01-08T00:00:00Z",
            "windows": [{"day": 1, "start": "01:00:00", "end": "02:00:00", "sample_interval_seconds": 60}],
            "start_value": "1",
            "drift_rate": "0"
        }"#;
        let err = ScheduleConfig::from_json_str(numbered).unwrap_err();
        assert!(err.is_parse());
        assert!(err.to_string().contains("weekday name"));
    }

    #[test]
    fn test_weekly_day_out_of_range_is_not_written() {
        let mut config = weekly_config();
        config.add_window(window(9, "09:00:00", "10:00:00"));
        assert!(config.to_json_string().is_err());

        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("schedule.json");
        assert!(config.save_to(&path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_mjd_document() {
        let json = r#"{
            "recurrence": "MJD",
            "mjd_period": 4,
            "range_start": "2024-01-01T00:00:00Z",
            "range_end": "2024-01-10T00:00:00Z",
            "windows": [{"day": 2, "start": "01:00:00", "end": "02:00:00", "sample_interval_seconds": 600}],
            "start_value": "1.5",
            "drift_rate": "0"
        }"#;
        let config = ScheduleConfig::from_json_str(json).unwrap();
        assert_eq!(config.recurrence(), RecurrencePeriod::ModuloJulianDay(4));
        assert_eq!(config.windows()[0].day, 2);
        assert!(config.run_history().is_empty());

        let reparsed = ScheduleConfig::from_json_str(&config.to_json_string().unwrap()).unwrap();
        assert_eq!(reparsed.recurrence(), RecurrencePeriod::ModuloJulianDay(4));
    }

    #[test]
    fn test_daily_document_ignores_day() {
        let json = r#"{
            "recurrence": "DAILY",
            "range_start": "2024-01-01T00:00:00",
            "range_end": "2024-01-02T00:00:00",
            "windows": [{"start": "00:00:00", "end": "23:59:59", "sample_interval_seconds": 3600}],
            "start_value": "100",
            "drift_rate": "0"
        }"#;
        let config = ScheduleConfig::from_json_str(json).unwrap();
        assert_eq!(config.windows()[0].day, 0);
        let written = config.to_json_string().unwrap();
        assert!(!written.contains("\"day\""));
    }

    #[test]
    fn test_document_parse_failures() {
        let missing = r#"{"recurrence": "DAILY"}"#;
        assert!(ScheduleConfig::from_json_str(missing).unwrap_err().is_parse());

        let bad_recurrence = r#"{
            "recurrence": "HOURLY",
            "range_start": "2024-01-01T00:00:00Z",
            "range_end": "2024-01-02T00:00:00Z",
            "windows": [],
            "start_value": "1",
            "drift_rate": "0"
        }"#;
        assert!(ScheduleConfig::from_json_str(bad_recurrence).is_err());

        let bad_weekday = r#"{
            "recurrence": "WEEKLY",
            "range_start": "2024-01-01T00:00:00Z",
            "range_end": "2024-01-02T00:00:00Z",
            "windows": [{"day": "Funday", "start": "01:00:00", "end": "02:00:00", "sample_interval_seconds": 1}],
            "start_value": "1",
            "drift_rate": "0"
        }"#;
        assert!(ScheduleConfig::from_json_str(bad_weekday).is_err());

        let mjd_without_period = r#"{
            "recurrence": "MJD",
            "range_start": "2024-01-01T00:00:00Z",
            "range_end": "2024-01-02T00:00:00Z",
            "windows": [],
            "start_value": "1",
            "drift_rate": "0"
        }"#;
        assert!(ScheduleConfig::from_json_str(mjd_without_period).is_err());

        let bad_decimal = r#"{
            "recurrence": "DAILY",
            "range_start": "2024-01-01T00:00:00Z",
            "range_end": "2024-01-02T00:00:00Z",
            "windows": [],
            "start_value": "one hundred",
            "drift_rate": "0"
        }"#;
        assert!(ScheduleConfig::from_json_str(bad_decimal).is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("schedule.json");

        let config = weekly_config();
        config.save_to(&path).unwrap();
        let loaded = ScheduleConfig::load_from(&path).unwrap();
        assert_eq!(loaded.windows(), config.windows());

        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "schedule.json")
            .collect();
        assert!(extras.is_empty(), "stray files: {:?}", extras);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = ScheduleConfig::load_from(&temp_dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
