use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{flag, Domain, DomainAdapter};
use crate::models::{FactRow, GroupKey};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ChapterProgress {
    #[serde(default)]
    pub source_key: Option<String>,
    pub subject_id: String,
    pub subject_name: String,
    pub chapter: String,
    pub completed: bool,
    pub updated_at: NaiveDateTime,
}

pub struct SyllabusAdapter;

impl DomainAdapter for SyllabusAdapter {
    type Source = ChapterProgress;

    const DOMAIN: Domain = Domain::Syllabus;

    fn to_fact(progress: &ChapterProgress) -> FactRow {
        FactRow {
            group_key: GroupKey::subject(&progress.subject_id),
            group_label: progress.subject_name.clone(),
            numerator: flag(progress.completed),
            denominator: 1.0,
            timestamp: progress.updated_at,
        }
    }
}
