use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{flag, start_of_day, Domain, DomainAdapter};
use crate::models::{FactRow, GroupKey};

/// Whether a student sat a scheduled test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TestSubmission {
    #[serde(default)]
    pub source_key: Option<String>,
    pub class_id: String,
    pub class_name: String,
    pub subject_id: String,
    pub subject_name: String,
    pub student_id: String,
    pub submitted: bool,
    pub held_on: NaiveDate,
}

pub struct AcademicsAdapter;

impl DomainAdapter for AcademicsAdapter {
    type Source = TestSubmission;

    const DOMAIN: Domain = Domain::Academics;

    fn to_fact(submission: &TestSubmission) -> FactRow {
        FactRow {
            group_key: GroupKey::class_subject(&submission.class_id, &submission.subject_id),
            group_label: format!("{} {}", submission.class_name, submission.subject_name),
            numerator: flag(submission.submitted),
            denominator: 1.0,
            timestamp: start_of_day(submission.held_on),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_by_class_and_subject() {
        let submission = TestSubmission {
            source_key: Some("t-1".to_string()),
            class_id: "7A".to_string(),
            class_name: "Grade 7A".to_string(),
            subject_id: "math".to_string(),
            subject_name: "Mathematics".to_string(),
            student_id: "s-1".to_string(),
            submitted: false,
            held_on: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
        };

        let fact = AcademicsAdapter::to_fact(&submission);
        assert_eq!(fact.group_key, GroupKey::class_subject("7A", "math"));
        assert_eq!(fact.group_label, "Grade 7A Mathematics");
        assert_eq!(fact.numerator, 0.0);
        assert_eq!(fact.denominator, 1.0);
    }
}
