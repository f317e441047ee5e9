use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::error::{AnalyticsError, Result};

/// Aggregation granularity. Each symbol maps to a trailing window of whole days:
/// "daily" is a 7-day window sampled daily, and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Daily,
    Weekly,
    Monthly,
}

impl Period {
    pub const ALL: [Period; 3] = [Period::Daily, Period::Weekly, Period::Monthly];

    pub fn window_days(self) -> i64 {
        match self {
            Period::Daily => 7,
            Period::Weekly => 30,
            Period::Monthly => 90,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Period::Daily => "daily",
            Period::Weekly => "weekly",
            Period::Monthly => "monthly",
        }
    }
}

impl FromStr for Period {
    type Err = AnalyticsError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Period::Daily),
            "weekly" => Ok(Period::Weekly),
            "monthly" => Ok(Period::Monthly),
            _ => Err(AnalyticsError::InvalidPeriod(value.to_string())),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Whether `timestamp` falls between start-of-day of `start` and
    /// end-of-day of `end`.
    pub fn contains(&self, timestamp: &NaiveDateTime) -> bool {
        let day = timestamp.date();
        day >= self.start && day <= self.end
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeriodWindow {
    pub period: Period,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub previous_start_date: NaiveDate,
    pub previous_end_date: NaiveDate,
}

impl PeriodWindow {
    pub fn current(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }

    pub fn previous(&self) -> DateRange {
        DateRange::new(self.previous_start_date, self.previous_end_date)
    }

    /// Both windows back to back, used to fetch source rows in one pass.
    pub fn span(&self) -> DateRange {
        DateRange::new(self.previous_start_date, self.end_date)
    }
}

/// Fails only when the previous window would start before the earliest
/// date chrono can represent.
pub fn resolve_period(period: Period, reference_date: NaiveDate) -> Result<PeriodWindow> {
    let length = period.window_days();
    let back = |date: NaiveDate, days: i64| {
        date.checked_sub_signed(Duration::days(days))
            .ok_or(AnalyticsError::DateOutOfRange(reference_date, period.as_str()))
    };
    let start_date = back(reference_date, length - 1)?;
    let previous_end_date = back(start_date, 1)?;
    let previous_start_date = back(previous_end_date, length - 1)?;

    Ok(PeriodWindow {
        period,
        start_date,
        end_date: reference_date,
        previous_start_date,
        previous_end_date,
    })
}

/// Parses a period symbol and resolves it in one step.
pub fn resolve_period_str(period: &str, reference_date: NaiveDate) -> Result<PeriodWindow> {
    let period: Period = period.parse()?;
    resolve_period(period, reference_date)
}
