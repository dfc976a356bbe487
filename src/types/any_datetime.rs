use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, Utc};

/// Anything that can be resolved to a timezone-naive UTC timestamp.
///
/// All time indices in this crate are `NaiveDateTime` values that represent UTC,
/// which is also how the `datetime` column of a fused polars frame is stored.
pub trait AnyDateTime {
    fn to_naive_utc(self) -> Option<NaiveDateTime>;
}

impl AnyDateTime for NaiveDateTime {
    fn to_naive_utc(self) -> Option<NaiveDateTime> {
        Some(self)
    }
}

impl AnyDateTime for DateTime<Utc> {
    fn to_naive_utc(self) -> Option<NaiveDateTime> {
        Some(self.naive_utc())
    }
}

impl AnyDateTime for DateTime<Local> {
    fn to_naive_utc(self) -> Option<NaiveDateTime> {
        Some(self.naive_utc())
    }
}

impl AnyDateTime for DateTime<FixedOffset> {
    fn to_naive_utc(self) -> Option<NaiveDateTime> {
        Some(self.naive_utc())
    }
}

impl AnyDateTime for NaiveDate {
    fn to_naive_utc(self) -> Option<NaiveDateTime> {
        self.and_hms_opt(0, 0, 0)
    }
}

impl AnyDateTime for &str {
    fn to_naive_utc(self) -> Option<NaiveDateTime> {
        let trimmed = self.trim();
        // Full UTC or offset timestamps
        if let Ok(dt) = trimmed.parse::<DateTime<Utc>>() {
            return dt.to_naive_utc();
        }
        if let Ok(dt) = trimmed.parse::<DateTime<FixedOffset>>() {
            return dt.to_naive_utc();
        }
        for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
            if let Ok(naive_dt) = NaiveDateTime::parse_from_str(trimmed, format) {
                return Some(naive_dt);
            }
        }
        if let Ok(naive_date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            return naive_date.to_naive_utc();
        }
        None
    }
}

impl AnyDateTime for String {
    fn to_naive_utc(self) -> Option<NaiveDateTime> {
        self.as_str().to_naive_utc()
    }
}

impl AnyDateTime for &String {
    fn to_naive_utc(self) -> Option<NaiveDateTime> {
        self.as_str().to_naive_utc()
    }
}
