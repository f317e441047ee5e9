//! Per-domain mappings from raw school records to [`FactRow`]s.
//!
//! Adapters are pure: fetching their source rows is the job of
//! [`crate::source`], and everything after the mapping is shared.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::error::{AnalyticsError, Result};
use crate::models::FactRow;

pub mod academics;
pub mod attendance;
pub mod fees;
pub mod operations;
pub mod syllabus;

pub use academics::{AcademicsAdapter, TestSubmission};
pub use attendance::{AttendanceAdapter, AttendanceMark};
pub use fees::{FeeInvoice, FeesAdapter};
pub use operations::{OperationsAdapter, TimetableSlot};
pub use syllabus::{ChapterProgress, SyllabusAdapter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Attendance,
    Fees,
    Academics,
    Syllabus,
    Operations,
}

impl Domain {
    pub const ALL: [Domain; 5] = [
        Domain::Attendance,
        Domain::Fees,
        Domain::Academics,
        Domain::Syllabus,
        Domain::Operations,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Domain::Attendance => "attendance",
            Domain::Fees => "fees",
            Domain::Academics => "academics",
            Domain::Syllabus => "syllabus",
            Domain::Operations => "operations",
        }
    }

    /// What the percentage means for this domain.
    pub fn rate_label(self) -> &'static str {
        match self {
            Domain::Attendance => "attendance rate",
            Domain::Fees => "fee collection rate",
            Domain::Academics => "test participation rate",
            Domain::Syllabus => "syllabus completion rate",
            Domain::Operations => "timetable coverage rate",
        }
    }

    pub fn group_label(self) -> &'static str {
        match self {
            Domain::Attendance | Domain::Fees => "class",
            Domain::Academics => "class and subject",
            Domain::Syllabus => "subject",
            Domain::Operations => "teacher",
        }
    }
}

impl FromStr for Domain {
    type Err = AnalyticsError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "attendance" => Ok(Domain::Attendance),
            "fees" | "fee" => Ok(Domain::Fees),
            "academics" | "tests" => Ok(Domain::Academics),
            "syllabus" => Ok(Domain::Syllabus),
            "operations" | "timetable" => Ok(Domain::Operations),
            _ => Err(AnalyticsError::UnknownDomain(value.to_string())),
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub trait DomainAdapter {
    type Source;

    const DOMAIN: Domain;

    fn to_fact(source: &Self::Source) -> FactRow;

    fn to_facts(sources: &[Self::Source]) -> Vec<FactRow> {
        sources.iter().map(Self::to_fact).collect()
    }
}

/// Date-only facts are stamped at the start of their day.
pub(crate) fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// 1 or 0, the contribution of a yes/no fact.
pub(crate) fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}
