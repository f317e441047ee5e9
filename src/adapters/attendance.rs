use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{flag, start_of_day, Domain, DomainAdapter};
use crate::models::{FactRow, GroupKey};

/// One student's mark for one school day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttendanceMark {
    #[serde(default)]
    pub source_key: Option<String>,
    pub class_id: String,
    pub class_name: String,
    pub student_id: String,
    pub marked_on: NaiveDate,
    pub status: String,
}

impl AttendanceMark {
    /// Late arrivals still count as attended; absent and excused do not.
    pub fn attended(&self) -> bool {
        matches!(
            self.status.trim().to_ascii_lowercase().as_str(),
            "present" | "late"
        )
    }
}

pub struct AttendanceAdapter;

impl DomainAdapter for AttendanceAdapter {
    type Source = AttendanceMark;

    const DOMAIN: Domain = Domain::Attendance;

    fn to_fact(mark: &AttendanceMark) -> FactRow {
        FactRow {
            group_key: GroupKey::class(&mark.class_id),
            group_label: mark.class_name.clone(),
            numerator: flag(mark.attended()),
            denominator: 1.0,
            timestamp: start_of_day(mark.marked_on),
        }
    }
}
