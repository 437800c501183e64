//! Time-of-day values used for measurement window boundaries.

use crate::{Error, Result};
use chrono::{NaiveTime, Timelike};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub(crate) const NANOS_PER_SECOND: u64 = 1_000_000_000;
pub(crate) const NANOS_PER_DAY: u64 = 86_400 * NANOS_PER_SECOND;

/// A time of day with nanosecond resolution, `00:00:00` up to but
/// excluding `24:00:00`.
///
/// Textual form is `HH:MM:SS[.fraction]`; the fraction is printed only when
/// non-zero, using 3, 6 or 9 digits, so every value round-trips exactly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime {
    nanos: u64,
}

impl ClockTime {
    pub fn midnight() -> Self {
        Self::default()
    }

    pub fn from_hms(hours: u32, minutes: u32, seconds: u32) -> Result<Self> {
        Self::from_hms_nano(hours, minutes, seconds, 0)
    }

    pub fn from_hms_micro(hours: u32, minutes: u32, seconds: u32, micros: u32) -> Result<Self> {
        if micros >= 1_000_000 {
            return Err(Error::parse(format!("microseconds out of range: {}", micros)));
        }
        Self::from_hms_nano(hours, minutes, seconds, micros * 1_000)
    }

    pub fn from_hms_nano(hours: u32, minutes: u32, seconds: u32, nanos: u32) -> Result<Self> {
        if hours >= 24 || minutes >= 60 || seconds >= 60 || u64::from(nanos) >= NANOS_PER_SECOND {
            return Err(Error::parse(format!(
                "time of day out of range: {:02}:{:02}:{:02}.{:09}",
                hours, minutes, seconds, nanos
            )));
        }
        let whole = u64::from(hours) * 3_600 + u64::from(minutes) * 60 + u64::from(seconds);
        Ok(Self {
            nanos: whole * NANOS_PER_SECOND + u64::from(nanos),
        })
    }

    pub(crate) fn from_nanos_since_midnight(nanos: u64) -> Self {
        Self {
            nanos: nanos % NANOS_PER_DAY,
        }
    }

    pub fn nanos_since_midnight(&self) -> u64 {
        self.nanos
    }

    pub fn hours(&self) -> u32 {
        (self.nanos / (3_600 * NANOS_PER_SECOND)) as u32
    }

    pub fn minutes(&self) -> u32 {
        ((self.nanos / (60 * NANOS_PER_SECOND)) % 60) as u32
    }

    pub fn seconds(&self) -> u32 {
        ((self.nanos / NANOS_PER_SECOND) % 60) as u32
    }

    pub fn subsec_nanos(&self) -> u32 {
        (self.nanos % NANOS_PER_SECOND) as u32
    }

    /// Fraction of the day elapsed, in `[0, 1)`
    pub fn fraction_of_day(&self) -> f64 {
        self.nanos as f64 / NANOS_PER_DAY as f64
    }
}

impl FromStr for ClockTime {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (whole, fraction) = match s.split_once('.') {
            Some((whole, fraction)) => (whole, Some(fraction)),
            None => (s, None),
        };

        if let Some(fraction) = fraction {
            if fraction.is_empty()
                || fraction.len() > 9
                || !fraction.bytes().all(|b| b.is_ascii_digit())
            {
                return Err(Error::parse(format!("invalid fractional seconds in {:?}", s)));
            }
        }

        let time = NaiveTime::parse_from_str(whole, "%H:%M:%S")
            .map_err(|e| Error::parse(format!("invalid time of day {:?}: {}", s, e)))?;

        let nanos = match fraction {
            Some(digits) => {
                let value: u32 = digits
                    .parse()
                    .map_err(|_| Error::parse(format!("invalid fractional seconds in {:?}", s)))?;
                value * 10u32.pow(9 - digits.len() as u32)
            }
            None => 0,
        };

        // chrono reports "23:59:60" as a leap second; we have no use for it
        if time.nanosecond() >= 1_000_000_000 {
            return Err(Error::parse(format!("leap seconds are not supported: {:?}", s)));
        }

        Self::from_hms_nano(time.hour(), time.minute(), time.second(), nanos)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hours(), self.minutes(), self.seconds())?;
        write_fraction(f, self.subsec_nanos())
    }
}

/// Append `.fff`, `.ffffff` or `.fffffffff`, whichever is shortest and exact
pub(crate) fn write_fraction(f: &mut dyn fmt::Write, nanos: u32) -> fmt::Result {
    if nanos == 0 {
        Ok(())
    } else if nanos % 1_000_000 == 0 {
        write!(f, ".{:03}", nanos / 1_000_000)
    } else if nanos % 1_000 == 0 {
        write!(f, ".{:06}", nanos / 1_000)
    } else {
        write!(f, ".{:09}", nanos)
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}
