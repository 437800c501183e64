//! Sample sinks: where generated samples go.

use crate::{Precise, Result, TimePoint};
use std::io::Write;

/// One modelled measurement
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    pub time: TimePoint,
    pub value: Precise,
}

/// Receiver for the engine's sample stream
pub trait SampleSink {
    fn record(&mut self, sample: &Sample) -> Result<()>;

    /// Called once after the last sample of a successful pass
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl SampleSink for Vec<Sample> {
    fn record(&mut self, sample: &Sample) -> Result<()> {
        self.push(sample.clone());
        Ok(())
    }
}

/// How the time column is rendered
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimestampFormat {
    /// `YYMMDD HHMMSS[.f]`, or `YY-MM-DD HH:MM:SS[.f]` with delimiters
    Calendar { delimiters: bool, decimals: u32 },
    /// Milliseconds since the Unix epoch
    EpochMillis,
}

impl TimestampFormat {
    pub fn render(&self, time: &TimePoint) -> String {
        match *self {
            TimestampFormat::Calendar { delimiters, decimals } => {
                time.to_simple_string(decimals, delimiters)
            }
            TimestampFormat::EpochMillis => time.to_epoch_millis().to_string(),
        }
    }

    /// Value precision used when none is configured
    pub fn default_value_decimals(&self) -> u32 {
        match self {
            TimestampFormat::Calendar { .. } => 2,
            TimestampFormat::EpochMillis => 10,
        }
    }
}

impl Default for TimestampFormat {
    fn default() -> Self {
        TimestampFormat::Calendar {
            delimiters: true,
            decimals: 0,
        }
    }
}

/// Presentation of the two-column sample stream
#[derive(Clone, Debug, PartialEq)]
pub struct OutputOptions {
    pub series_name: String,
    pub timestamps: TimestampFormat,
    pub value_decimals: u32,
}

impl Default for OutputOptions {
    fn default() -> Self {
        let timestamps = TimestampFormat::default();
        Self {
            series_name: "Si3 si3_estimate".to_string(),
            value_decimals: timestamps.default_value_decimals(),
            timestamps,
        }
    }
}

/// Writes `"Time","<series>"` followed by one `time,value` row per sample
pub struct CsvSampleSink<W: Write> {
    writer: csv::Writer<W>,
    options: OutputOptions,
    rows: u64,
}

impl<W: Write> CsvSampleSink<W> {
    /// Wrap `inner`, writing the header immediately
    pub fn new(mut inner: W, options: OutputOptions) -> Result<Self> {
        let mut header = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Always)
            .from_writer(Vec::new());
        header.write_record(["Time", options.series_name.as_str()])?;
        let header = header
            .into_inner()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
        inner.write_all(&header)?;

        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(inner);

        Ok(Self {
            writer,
            options,
            rows: 0,
        })
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Flush and hand back the underlying writer
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()).into())
    }
}

impl<W: Write> SampleSink for CsvSampleSink<W> {
    fn record(&mut self, sample: &Sample) -> Result<()> {
        let time = self.options.timestamps.render(&sample.time);
        let value = sample.value.to_fixed(self.options.value_decimals);
        self.writer.write_record([time.as_str(), value.as_str()])?;
        self.rows += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        tracing::debug!("Flushed {} sample rows", self.rows);
        Ok(())
    }
}
