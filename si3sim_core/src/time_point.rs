//! Absolute timestamps with a timezone disposition.
//!
//! A [`TimePoint`] stores the wall-clock date and time exactly as written
//! together with how that wall clock relates to UTC. Calendar fields
//! (`hour()`, `day_of_week()`, ...) always describe the wall-clock value, so
//! `2024-05-23T12:00:12+06:00` reports hour 12.

use crate::clock_time::{write_fraction, ClockTime, NANOS_PER_SECOND};
use crate::{Error, Precise, Result};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// `num_days_from_ce()` of 1858-11-17, day zero of the Modified Julian Day count
const MJD_EPOCH_DAYS_FROM_CE: i64 = 678_576;

/// How a wall-clock value relates to UTC
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Zone {
    /// Written with a trailing `Z`
    Utc,
    /// Written without any suffix
    Local,
    /// Written with a `+HH:MM` or `-HH:MM` suffix
    Offset {
        negative: bool,
        hours: u32,
        minutes: u32,
    },
}

impl Zone {
    fn offset_seconds(&self) -> i64 {
        match *self {
            Zone::Offset {
                negative,
                hours,
                minutes,
            } => {
                let magnitude = i64::from(hours) * 3_600 + i64::from(minutes) * 60;
                if negative {
                    -magnitude
                } else {
                    magnitude
                }
            }
            Zone::Utc | Zone::Local => 0,
        }
    }
}

/// Day of the week, numbered from Sunday = 0
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Weekday {
    Sunday = 0,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Weekday {
    const ALL: [Weekday; 7] = [
        Weekday::Sunday,
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
    ];

    pub fn from_index(index: u32) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn index(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        match self {
            Weekday::Sunday => "Sunday",
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Weekday {
    type Err = Error;

    /// Only the first two letters are significant: `Mo`, `Mon` and `Monday`
    /// all name Monday.
    fn from_str(s: &str) -> Result<Self> {
        let prefix = s.get(..2).unwrap_or(s);
        Self::ALL
            .iter()
            .copied()
            .find(|day| day.name().starts_with(prefix) && prefix.len() == 2)
            .ok_or_else(|| Error::parse(format!("unknown weekday: {:?}", s)))
    }
}

/// An absolute timestamp
///
/// Equality, ordering and hashing look at the wall clock only; the zone
/// affects display and epoch conversion.
#[derive(Clone, Copy, Debug)]
pub struct TimePoint {
    wall: NaiveDateTime,
    zone: Zone,
}

impl PartialEq for TimePoint {
    fn eq(&self, other: &Self) -> bool {
        self.wall == other.wall
    }
}

impl Eq for TimePoint {}

impl PartialOrd for TimePoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimePoint {
    fn cmp(&self, other: &Self) -> Ordering {
        self.wall.cmp(&other.wall)
    }
}

impl Hash for TimePoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.wall.hash(state);
    }
}

impl TimePoint {
    pub fn new(wall: NaiveDateTime, zone: Zone) -> Self {
        Self { wall, zone }
    }

    /// The current time, in UTC
    pub fn now() -> Self {
        Self::new(Utc::now().naive_utc(), Zone::Utc)
    }

    pub fn wall_clock(&self) -> NaiveDateTime {
        self.wall
    }

    pub fn zone(&self) -> Zone {
        self.zone
    }

    /// Signed UTC offset in hours; zero for UTC and local values
    pub fn offset_hours(&self) -> f64 {
        self.zone.offset_seconds() as f64 / 3_600.0
    }

    pub fn date(&self) -> NaiveDate {
        self.wall.date()
    }

    pub fn year(&self) -> i32 {
        self.wall.year()
    }

    pub fn month(&self) -> u32 {
        self.wall.month()
    }

    pub fn day(&self) -> u32 {
        self.wall.day()
    }

    pub fn hour(&self) -> u32 {
        self.wall.hour()
    }

    pub fn minute(&self) -> u32 {
        self.wall.minute()
    }

    /// Seconds within the minute, including the fractional part
    pub fn seconds(&self) -> f64 {
        f64::from(self.wall.second()) + f64::from(self.wall.nanosecond()) / 1e9
    }

    pub fn time_of_day(&self) -> ClockTime {
        let whole = u64::from(self.wall.num_seconds_from_midnight());
        ClockTime::from_nanos_since_midnight(
            whole * NANOS_PER_SECOND + u64::from(self.wall.nanosecond()),
        )
    }

    /// 0 = Sunday ... 6 = Saturday
    pub fn day_of_week(&self) -> u32 {
        self.wall.weekday().num_days_from_sunday()
    }

    /// 1 ..= 31
    pub fn day_of_month(&self) -> u32 {
        self.wall.day()
    }

    /// 1 ..= 366
    pub fn day_of_year(&self) -> u32 {
        self.wall.ordinal()
    }

    /// Modified Julian Day of the wall-clock date
    pub fn mjd(&self) -> i64 {
        i64::from(self.wall.num_days_from_ce()) - MJD_EPOCH_DAYS_FROM_CE
    }

    pub fn fractional_mjd(&self) -> f64 {
        self.mjd() as f64 + self.time_of_day().fraction_of_day()
    }

    pub fn add_days(&mut self, days: i64) {
        self.wall += Duration::days(days);
    }

    pub fn add_seconds(&mut self, seconds: u32) {
        self.wall += Duration::seconds(i64::from(seconds));
    }

    /// Keep the date, replace the time of day
    pub fn set_time(&mut self, time: ClockTime) {
        let current = self.time_of_day().nanos_since_midnight() as i64;
        let target = time.nanos_since_midnight() as i64;
        self.wall += Duration::nanoseconds(target - current);
    }

    /// Wall-clock difference `self - earlier`
    pub fn duration_since(&self, earlier: &TimePoint) -> Duration {
        self.wall - earlier.wall
    }

    /// Exact elapsed seconds `self - earlier`, to the nanosecond
    pub fn seconds_since(&self, earlier: &TimePoint) -> Precise {
        let elapsed = self.duration_since(earlier);
        let whole = elapsed.num_seconds();
        let fraction = elapsed - Duration::seconds(whole);
        let fraction_nanos = fraction.num_nanoseconds().unwrap_or(0);
        &Precise::from(whole) + &Precise::from_nanos(fraction_nanos)
    }

    /// Milliseconds since the Unix epoch. Offset values are shifted to UTC;
    /// UTC and local wall clocks are taken as UTC.
    pub fn to_epoch_millis(&self) -> i64 {
        let utc = self.wall - Duration::seconds(self.zone.offset_seconds());
        utc.and_utc().timestamp_millis()
    }

    /// Compact calendar form `YYMMDD HHMMSS[.f]`, or `YY-MM-DD HH:MM:SS[.f]`
    /// with `delimiters`. Seconds are rounded half up to `decimals` digits,
    /// carrying into the minute (and beyond) when needed.
    pub fn to_simple_string(&self, decimals: u32, delimiters: bool) -> String {
        let decimals = decimals.min(9);
        let unit = 10i64.pow(9 - decimals);
        let remainder = i64::from(self.wall.nanosecond() % 1_000_000_000) % unit;
        let rounded = if remainder * 2 >= unit {
            self.wall + Duration::nanoseconds(unit - remainder)
        } else {
            self.wall - Duration::nanoseconds(remainder)
        };

        let (date_sep, time_sep) = if delimiters { ("-", ":") } else { ("", "") };
        let stamp = format!(
            "{:02}{sep}{:02}{sep}{:02} {:02}{tsep}{:02}{tsep}{:02}",
            rounded.year().rem_euclid(100),
            rounded.month(),
            rounded.day(),
            rounded.hour(),
            rounded.minute(),
            rounded.second(),
            sep = date_sep,
            tsep = time_sep,
        );
        if decimals == 0 {
            return stamp;
        }

        let fraction = i64::from(rounded.nanosecond() % 1_000_000_000) / unit;
        format!("{}.{:0width$}", stamp, fraction, width = decimals as usize)
    }
}

impl FromStr for TimePoint {
    type Err = Error;

    /// `YYYY-MM-DDTHH:MM:SS[.f{1,9}][Z|+HH:MM|-HH:MM]`; no suffix means local
    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(Error::parse("empty ISO-8601 timestamp"));
        }

        let (body, zone) = split_zone(s)?;
        if !has_iso_shape(body) {
            return Err(Error::parse(format!("invalid ISO-8601 timestamp: {:?}", s)));
        }

        let wall = NaiveDateTime::parse_from_str(body, "%Y-%m-%dT%H:%M:%S%.f")
            .map_err(|e| Error::parse(format!("invalid ISO-8601 timestamp {:?}: {}", s, e)))?;

        Ok(Self::new(wall, zone))
    }
}

fn split_zone(s: &str) -> Result<(&str, Zone)> {
    if let Some(body) = s.strip_suffix('Z') {
        return Ok((body, Zone::Utc));
    }

    let bytes = s.as_bytes();
    if bytes.len() >= 6 {
        let tail = &bytes[bytes.len() - 6..];
        let shaped = matches!(tail[0], b'+' | b'-')
            && tail[3] == b':'
            && [1, 2, 4, 5].iter().all(|&i| tail[i].is_ascii_digit());
        if shaped {
            let digits = |i: usize| u32::from(tail[i] - b'0') * 10 + u32::from(tail[i + 1] - b'0');
            let (hours, minutes) = (digits(1), digits(4));
            if hours >= 24 || minutes >= 60 {
                return Err(Error::parse(format!("UTC offset out of range in {:?}", s)));
            }
            let zone = Zone::Offset {
                negative: tail[0] == b'-',
                hours,
                minutes,
            };
            return Ok((&s[..s.len() - 6], zone));
        }
    }

    Ok((s, Zone::Local))
}

/// `YYYY-MM-DDTHH:MM:SS` followed by nothing or `.` and 1-9 digits
fn has_iso_shape(body: &str) -> bool {
    let bytes = body.as_bytes();
    if bytes.len() < 19 {
        return false;
    }
    let fixed = bytes[..19].iter().enumerate().all(|(i, b)| match i {
        4 | 7 => *b == b'-',
        10 => *b == b'T',
        13 | 16 => *b == b':',
        _ => b.is_ascii_digit(),
    });
    let fraction = &bytes[19..];
    let fraction_ok = fraction.is_empty()
        || (fraction[0] == b'.'
            && (2..=10).contains(&fraction.len())
            && fraction[1..].iter().all(u8::is_ascii_digit));
    fixed && fraction_ok
}

impl fmt::Display for TimePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.wall.format("%Y-%m-%dT%H:%M:%S"))?;
        write_fraction(f, self.wall.nanosecond())?;
        match self.zone {
            Zone::Utc => f.write_str("Z"),
            Zone::Local => Ok(()),
            Zone::Offset {
                negative,
                hours,
                minutes,
            } => write!(f, "{}{:02}:{:02}", if negative { '-' } else { '+' }, hours, minutes),
        }
    }
}

impl Serialize for TimePoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TimePoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tp(s: &str) -> TimePoint {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_utc() {
        let time = tp("2024-05-23T12:00:12Z");
        assert_eq!(time.year(), 2024);
        assert_eq!(time.month(), 5);
        assert_eq!(time.hour(), 12);
        assert_eq!(time.minute(), 0);
        assert_eq!(time.seconds(), 12.0);
        assert_eq!(time.zone(), Zone::Utc);
    }

    #[test]
    fn test_parse_offsets() {
        let east = tp("2024-05-23T12:00:12+06:00");
        assert_eq!(east.hour(), 12);
        assert_eq!(east.offset_hours(), 6.0);

        let west = tp("2024-05-23T12:00:12.123456-06:30");
        assert_eq!(west.hour(), 12);
        assert!((west.seconds() - 12.123456).abs() < 1e-9);
        assert_eq!(west.offset_hours(), -6.5);
        assert!(matches!(west.zone(), Zone::Offset { negative: true, .. }));
    }

    #[test]
    fn test_parse_local() {
        let time = tp("2024-05-23T12:00:12.123456");
        assert_eq!(time.zone(), Zone::Local);
        assert_eq!(time.offset_hours(), 0.0);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for text in [
            "",
            "2024-05-23T12:00:12+06:30:00",
            "2024-05-23 12:00:12Z",
            "2024-5-23T12:00:12Z",
            "2024-05-23T12:00:12.Z",
            "2024-02-30T00:00:00Z",
            "2024-05-23T12:00:12+25:00",
        ] {
            let err = text.parse::<TimePoint>().unwrap_err();
            assert!(err.is_parse(), "{:?} gave {:?}", text, err);
        }
    }

    #[test]
    fn test_display_roundtrip() {
        for text in [
            "2024-05-23T12:00:12",
            "2024-05-23T12:00:12Z",
            "2024-05-23T12:00:12+06:30",
            "2024-05-23T12:00:12-06:30",
            "2024-05-23T12:00:12.123456",
            "2024-05-23T12:00:12.123456Z",
            "2024-05-23T12:00:12.123456+06:30",
            "2024-05-23T12:00:12.123456-06:30",
        ] {
            assert_eq!(tp(text).to_string(), text);
        }
    }

    #[test]
    fn test_calendar_indices() {
        // 2024-01-03 is a Wednesday, MJD 60312
        let time = tp("2024-01-03T08:00:00Z");
        assert_eq!(time.day_of_week(), 3);
        assert_eq!(time.day_of_month(), 3);
        assert_eq!(time.day_of_year(), 3);
        assert_eq!(time.mjd(), 60312);

        assert_eq!(tp("1858-11-17T00:00:00Z").mjd(), 0);
        assert_eq!(tp("2024-12-31T00:00:00Z").day_of_year(), 366);
        assert_eq!(tp("2024-01-07T00:00:00Z").day_of_week(), 0);
    }

    #[test]
    fn test_fractional_mjd() {
        let time = tp("2024-01-01T18:00:00Z");
        assert!((time.fractional_mjd() - 60310.75).abs() < 1e-9);
    }

    #[test]
    fn test_day_and_time_arithmetic() {
        let mut time = tp("2024-02-28T23:30:00Z");
        time.add_days(1);
        assert_eq!(time.to_string(), "2024-02-29T23:30:00Z");

        time.add_seconds(3_600);
        assert_eq!(time.to_string(), "2024-03-01T00:30:00Z");

        time.set_time("09:15:00.250".parse().unwrap());
        assert_eq!(time.to_string(), "2024-03-01T09:15:00.250Z");

        time.add_days(-2);
        assert_eq!(time.day(), 28);
    }

    #[test]
    fn test_seconds_since_is_exact() {
        let start = tp("2024-01-01T00:00:00Z");
        let later = tp("2024-01-01T01:00:00.000000001Z");
        assert_eq!(later.seconds_since(&start).to_string(), "3600.000000001");
        assert_eq!(start.seconds_since(&later).to_string(), "-3600.000000001");
        assert!(start.seconds_since(&start).is_zero());
    }

    #[test]
    fn test_ordering_follows_wall_clock() {
        assert!(tp("2024-01-01T00:00:00Z") < tp("2024-01-01T00:00:01Z"));
        assert!(tp("2024-01-02T00:00:00Z") > tp("2024-01-01T23:59:59.999Z"));
    }

    #[test]
    fn test_zone_does_not_break_ties() {
        let utc = tp("2024-01-02T00:00:00Z");
        let local = tp("2024-01-02T00:00:00");
        let offset = tp("2024-01-02T00:00:00+02:00");

        assert_eq!(utc, local);
        assert_eq!(utc, offset);
        assert!(!(utc < local) && !(local < utc));
        assert_eq!(utc.cmp(&offset), std::cmp::Ordering::Equal);
        assert!(tp("2024-01-01T23:00:00Z") < local);

        // Zone survives for display
        assert_eq!(utc.to_string(), "2024-01-02T00:00:00Z");
        assert_eq!(local.to_string(), "2024-01-02T00:00:00");

        let mut set = std::collections::HashSet::new();
        set.insert(utc);
        assert!(set.contains(&local));
    }

    #[test]
    fn test_simple_string() {
        let time = tp("2024-01-02T03:04:05.678Z");
        assert_eq!(time.to_simple_string(0, false), "240102 030406");
        assert_eq!(time.to_simple_string(0, true), "24-01-02 03:04:06");
        assert_eq!(time.to_simple_string(2, true), "24-01-02 03:04:05.68");
        assert_eq!(time.to_simple_string(3, true), "24-01-02 03:04:05.678");
        assert_eq!(time.to_simple_string(5, false), "240102 030405.67800");
    }

    #[test]
    fn test_simple_string_rounding_carries() {
        let time = tp("2023-12-31T23:59:59.996Z");
        assert_eq!(time.to_simple_string(2, true), "24-01-01 00:00:00.00");
        assert_eq!(time.to_simple_string(3, true), "23-12-31 23:59:59.996");

        let below_half = tp("2024-01-02T03:04:05.004Z");
        assert_eq!(below_half.to_simple_string(2, false), "240102 030405.00");
        assert_eq!(below_half.to_simple_string(0, false), "240102 030405");
    }

    #[test]
    fn test_epoch_millis() {
        assert_eq!(tp("2024-01-01T00:00:00Z").to_epoch_millis(), 1_704_067_200_000);
        assert_eq!(tp("2024-01-01T06:00:00.5+06:00").to_epoch_millis(), 1_704_067_200_500);
    }

    #[test]
    fn test_weekday_names() {
        assert_eq!("Mo".parse::<Weekday>().unwrap(), Weekday::Monday);
        assert_eq!("Monday".parse::<Weekday>().unwrap(), Weekday::Monday);
        assert_eq!("Thu".parse::<Weekday>().unwrap(), Weekday::Thursday);
        assert_eq!("Sa".parse::<Weekday>().unwrap().index(), 6);
        assert!("M".parse::<Weekday>().is_err());
        assert!("Xy".parse::<Weekday>().is_err());
        assert_eq!(Weekday::from_index(0).unwrap().to_string(), "Sunday");
        assert!(Weekday::from_index(7).is_none());
    }
}
