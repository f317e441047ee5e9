use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{flag, start_of_day, Domain, DomainAdapter};
use crate::models::{FactRow, GroupKey};

/// A scheduled timetable period and whether its teacher took it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TimetableSlot {
    #[serde(default)]
    pub source_key: Option<String>,
    pub teacher_id: String,
    pub teacher_name: String,
    pub slot_date: NaiveDate,
    pub covered: bool,
}

pub struct OperationsAdapter;

impl DomainAdapter for OperationsAdapter {
    type Source = TimetableSlot;

    const DOMAIN: Domain = Domain::Operations;

    fn to_fact(slot: &TimetableSlot) -> FactRow {
        FactRow {
            group_key: GroupKey::teacher(&slot.teacher_id),
            group_label: slot.teacher_name.clone(),
            numerator: flag(slot.covered),
            denominator: 1.0,
            timestamp: start_of_day(slot.slot_date),
        }
    }
}
