use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalyticsError {
    #[error("invalid period '{0}': expected daily, weekly or monthly")]
    InvalidPeriod(String),

    #[error("invalid sort order '{0}': expected asc or desc")]
    InvalidSortOrder(String),

    #[error("invalid metric '{0}': expected percentage, numerator or denominator")]
    InvalidMetric(String),

    #[error("unknown domain '{0}'")]
    UnknownDomain(String),

    #[error("invalid stability band '{0}': expected a finite, non-negative number of percentage points")]
    InvalidStabilityBand(String),

    #[error("reference date {0} is too close to the start of the calendar for a {1} window")]
    DateOutOfRange(chrono::NaiveDate, &'static str),
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
