//! Sampling intervals, written the way run configuration files write them
//! (`"5T"`, `"15min"`, `"1H"`, `"30S"`, `"1D"`).

use crate::registry::error::ConfigurationError;
use chrono::{NaiveDateTime, TimeDelta};
use polars::prelude::{Duration, PolarsResult};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrequencyUnit {
    Second,
    Minute,
    Hour,
    Day,
}

impl FrequencyUnit {
    fn seconds(self) -> i64 {
        match self {
            FrequencyUnit::Second => 1,
            FrequencyUnit::Minute => 60,
            FrequencyUnit::Hour => 3_600,
            FrequencyUnit::Day => 86_400,
        }
    }

    /// Largest count of this unit that stays within [`Frequency::MAX_SECONDS`].
    fn max_count(self) -> u32 {
        (Frequency::MAX_SECONDS / self.seconds()) as u32
    }

    fn suffix(self) -> &'static str {
        match self {
            FrequencyUnit::Second => "s",
            FrequencyUnit::Minute => "min",
            FrequencyUnit::Hour => "h",
            FrequencyUnit::Day => "D",
        }
    }

    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "S" | "s" | "sec" => Some(FrequencyUnit::Second),
            "T" | "min" => Some(FrequencyUnit::Minute),
            "H" | "h" => Some(FrequencyUnit::Hour),
            "D" | "d" => Some(FrequencyUnit::Day),
            _ => None,
        }
    }
}

/// A positive, fixed sampling interval of at most one leap year.
///
/// Used for the station cadence and for the output cadence of a run.
///
/// ```
/// use metforce::Frequency;
///
/// let five_minutes: Frequency = "5T".parse().unwrap();
/// assert_eq!(five_minutes, Frequency::minutes(5));
/// assert_eq!(five_minutes.to_string(), "5min");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Frequency {
    count: u32,
    unit: FrequencyUnit,
}

impl Frequency {
    /// 366 days.
    pub const MAX_SECONDS: i64 = 366 * 86_400;

    pub fn seconds(count: u32) -> Self {
        Self::new(count, FrequencyUnit::Second)
    }

    pub fn minutes(count: u32) -> Self {
        Self::new(count, FrequencyUnit::Minute)
    }

    pub fn hours(count: u32) -> Self {
        Self::new(count, FrequencyUnit::Hour)
    }

    pub fn days(count: u32) -> Self {
        Self::new(count, FrequencyUnit::Day)
    }

    fn new(count: u32, unit: FrequencyUnit) -> Self {
        Self {
            count: count.clamp(1, unit.max_count()),
            unit,
        }
    }

    pub fn duration(&self) -> TimeDelta {
        TimeDelta::seconds(self.count as i64 * self.unit.seconds())
    }

    fn step_millis(&self) -> i64 {
        self.duration().num_milliseconds()
    }

    /// The same interval as a polars window duration.
    pub fn polars_duration(&self) -> PolarsResult<Duration> {
        Duration::try_parse(&format!("{}s", self.duration().num_seconds()))
    }

    /// Start of the bin of this width containing `timestamp`, with bins anchored at the Unix epoch.
    pub fn floor(&self, timestamp: NaiveDateTime) -> NaiveDateTime {
        let millis = timestamp.and_utc().timestamp_millis();
        let step = self.step_millis();
        let floored = millis - millis.rem_euclid(step);
        timestamp - TimeDelta::milliseconds(millis - floored)
    }
}

impl FromStr for Frequency {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let split = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| ConfigurationError::InvalidFrequency(s.to_string()))?;
        let (digits, suffix) = trimmed.split_at(split);
        let count = if digits.is_empty() {
            1
        } else {
            digits
                .parse::<u32>()
                .map_err(|_| ConfigurationError::InvalidFrequency(s.to_string()))?
        };
        let unit = FrequencyUnit::from_suffix(suffix)
            .ok_or_else(|| ConfigurationError::InvalidFrequency(s.to_string()))?;
        if count == 0 || count > unit.max_count() {
            return Err(ConfigurationError::InvalidFrequency(s.to_string()));
        }
        Ok(Frequency { count, unit })
    }
}

impl TryFrom<String> for Frequency {
    type Error = ConfigurationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.count, self.unit.suffix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("5T".parse::<Frequency>().unwrap(), Frequency::minutes(5));
        assert_eq!("15min".parse::<Frequency>().unwrap(), Frequency::minutes(15));
        assert_eq!("1H".parse::<Frequency>().unwrap(), Frequency::hours(1));
        assert_eq!("H".parse::<Frequency>().unwrap(), Frequency::hours(1));
        assert_eq!("30S".parse::<Frequency>().unwrap(), Frequency::seconds(30));
        assert_eq!("1D".parse::<Frequency>().unwrap(), Frequency::days(1));
    }

    #[test]
    fn test_reject_invalid() {
        for bad in ["", "5", "0H", "5 weeks", "-1H", "H5"] {
            assert!(bad.parse::<Frequency>().is_err(), "'{}' should not parse", bad);
        }
    }

    #[test]
    fn test_reject_longer_than_a_year() {
        assert!(matches!(
            "100000000D".parse::<Frequency>(),
            Err(ConfigurationError::InvalidFrequency(_))
        ));
        assert!("367D".parse::<Frequency>().is_err());
        assert_eq!("366D".parse::<Frequency>().unwrap(), Frequency::days(366));
        assert_eq!(
            "8784H".parse::<Frequency>().unwrap().duration(),
            TimeDelta::days(366)
        );
        assert_eq!(Frequency::days(u32::MAX), Frequency::days(366));
    }

    #[test]
    fn test_polars_duration() -> Result<(), Box<dyn std::error::Error>> {
        let duration = Frequency::minutes(15).polars_duration()?;
        assert_eq!(duration.duration_ms(), 15 * 60 * 1000);
        Ok(())
    }

    #[test]
    fn test_duration_and_display() {
        assert_eq!(Frequency::minutes(5).duration(), TimeDelta::minutes(5));
        assert_eq!(Frequency::hours(1).to_string(), "1h");
        assert_eq!(Frequency::days(2).duration(), TimeDelta::hours(48));
    }

    #[test]
    fn test_floor_to_bin_start() {
        let ts = NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_opt(13, 47, 12)
            .unwrap();
        let hour = NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_opt(13, 0, 0)
            .unwrap();
        let quarter = NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_opt(13, 45, 0)
            .unwrap();
        assert_eq!(Frequency::hours(1).floor(ts), hour);
        assert_eq!(Frequency::minutes(15).floor(ts), quarter);
        assert_eq!(Frequency::hours(1).floor(hour), hour);
    }

    #[test]
    fn test_deserialize_from_string() {
        let freq: Frequency = serde_json::from_str("\"10min\"").unwrap();
        assert_eq!(freq, Frequency::minutes(10));
        assert!(serde_json::from_str::<Frequency>("\"fortnightly\"").is_err());
    }
}
