use crate::registry::error::ConfigurationError;
use crate::types::any_datetime::AnyDateTime;
use crate::types::frequency::Frequency;
use chrono::NaiveDateTime;
use std::fmt;

/// The inclusive `[start, end]` window of a run, in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeRange {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl TimeRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, ConfigurationError> {
        if end < start {
            return Err(ConfigurationError::InvalidTimeRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Resolves both bounds through [`AnyDateTime`], e.g. `"2023-06-01 00:00"`.
    pub fn parse(
        start: impl AnyDateTime + fmt::Debug + Clone,
        end: impl AnyDateTime + fmt::Debug + Clone,
    ) -> Result<Self, ConfigurationError> {
        let start_naive = start
            .clone()
            .to_naive_utc()
            .ok_or_else(|| ConfigurationError::InvalidTimestamp(format!("{:?}", start)))?;
        let end_naive = end
            .clone()
            .to_naive_utc()
            .ok_or_else(|| ConfigurationError::InvalidTimestamp(format!("{:?}", end)))?;
        Self::new(start_naive, end_naive)
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        timestamp >= self.start && timestamp <= self.end
    }

    /// The smallest range holding both timestamps.
    pub(crate) fn spanning(a: NaiveDateTime, b: NaiveDateTime) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    /// `start, start + f, ...` up to and including `end` when it falls on the grid.
    ///
    /// Stops early rather than stepping past the last representable timestamp.
    pub fn grid(&self, frequency: Frequency) -> Vec<NaiveDateTime> {
        let step = frequency.duration();
        let mut grid = Vec::new();
        let mut current = Some(self.start);
        while let Some(ts) = current.filter(|ts| *ts <= self.end) {
            grid.push(ts);
            current = ts.checked_add_signed(step);
        }
        grid
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {}",
            self.start.format("%Y-%m-%d %H:%M"),
            self.end.format("%Y-%m-%d %H:%M")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() -> Result<(), Box<dyn std::error::Error>> {
        let range = TimeRange::parse("2023-06-01 00:00", "2023-06-02 12:30")?;
        assert_eq!(range.to_string(), "2023-06-01 00:00 to 2023-06-02 12:30");
        Ok(())
    }

    #[test]
    fn test_reversed_range_is_rejected() {
        let result = TimeRange::parse("2023-06-02 00:00", "2023-06-01 00:00");
        assert!(matches!(
            result,
            Err(ConfigurationError::InvalidTimeRange { .. })
        ));
    }

    #[test]
    fn test_unparsable_bound_is_rejected() {
        let result = TimeRange::parse("not a date", "2023-06-01 00:00");
        assert!(matches!(result, Err(ConfigurationError::InvalidTimestamp(_))));
    }

    #[test]
    fn test_grid_is_inclusive() -> Result<(), Box<dyn std::error::Error>> {
        let range = TimeRange::parse("2023-06-01 00:00", "2023-06-01 03:00")?;
        let grid = range.grid(Frequency::hours(1));
        assert_eq!(grid.len(), 4);
        assert_eq!(grid[0], range.start());
        assert_eq!(grid[3], range.end());

        // End not on the grid: last point stays inside the range.
        let grid = range.grid(Frequency::minutes(50));
        assert_eq!(grid.len(), 4);
        assert!(grid.iter().all(|ts| range.contains(*ts)));
        Ok(())
    }

    #[test]
    fn test_grid_near_the_end_of_time() {
        let end = NaiveDateTime::MAX;
        let range = TimeRange::new(end - chrono::TimeDelta::hours(2), end).unwrap();
        let grid = range.grid(Frequency::days(366));
        assert_eq!(grid, vec![range.start()]);

        let grid = range.grid(Frequency::hours(1));
        assert_eq!(grid.len(), 3);
    }

    #[test]
    fn test_spanning_orders_bounds() -> Result<(), Box<dyn std::error::Error>> {
        let range = TimeRange::parse("2023-06-01 06:00", "2023-06-01 08:00")?;
        let spanned = TimeRange::spanning(range.end(), range.start());
        assert_eq!(spanned, range);
        Ok(())
    }

    #[test]
    fn test_single_instant_range() -> Result<(), Box<dyn std::error::Error>> {
        let range = TimeRange::parse("2023-06-01 06:00", "2023-06-01 06:00")?;
        assert_eq!(range.grid(Frequency::hours(1)), vec![range.start()]);
        Ok(())
    }
}
