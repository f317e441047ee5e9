use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

/// Identity of the entity a fact is grouped under.
///
/// Variant order matters: it is the canonical iteration order of aggregates.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GroupKey {
    Class { id: String },
    Subject { id: String },
    Teacher { id: String },
    ClassSubject { class_id: String, subject_id: String },
}

impl GroupKey {
    pub fn class(id: impl Into<String>) -> Self {
        GroupKey::Class { id: id.into() }
    }

    pub fn subject(id: impl Into<String>) -> Self {
        GroupKey::Subject { id: id.into() }
    }

    pub fn teacher(id: impl Into<String>) -> Self {
        GroupKey::Teacher { id: id.into() }
    }

    pub fn class_subject(class_id: impl Into<String>, subject_id: impl Into<String>) -> Self {
        GroupKey::ClassSubject {
            class_id: class_id.into(),
            subject_id: subject_id.into(),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Class { id } => write!(f, "class:{id}"),
            GroupKey::Subject { id } => write!(f, "subject:{id}"),
            GroupKey::Teacher { id } => write!(f, "teacher:{id}"),
            GroupKey::ClassSubject {
                class_id,
                subject_id,
            } => write!(f, "class:{class_id}/subject:{subject_id}"),
        }
    }
}

/// One observed event, already mapped out of its domain shape.
#[derive(Debug, Clone, PartialEq)]
pub struct FactRow {
    pub group_key: GroupKey,
    pub group_label: String,
    pub numerator: f64,
    pub denominator: f64,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub group_key: GroupKey,
    pub group_label: String,
    pub numerator: f64,
    pub denominator: f64,
    pub percentage: f64,
    pub last_updated: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Improving,
    Stable,
    Declining,
    Unknown,
}

impl TrendDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            TrendDirection::Improving => "improving",
            TrendDirection::Stable => "stable",
            TrendDirection::Declining => "declining",
            TrendDirection::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRow {
    #[serde(flatten)]
    pub row: AggregateRow,
    pub previous_percentage: Option<f64>,
    pub trend_delta: Option<f64>,
    pub trend_direction: TrendDirection,
    pub rank: usize,
}

/// Roll-up of a set of aggregates, weighted by their denominators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub group_count: usize,
    pub numerator: f64,
    pub denominator: f64,
    pub percentage: f64,
    pub last_updated: NaiveDateTime,
}
