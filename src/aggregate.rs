use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::{AggregateRow, FactRow, GroupKey, Summary};
use crate::period::DateRange;

/// `numerator / denominator * 100`, or 0 when there is nothing to divide by.
///
/// Scales before dividing so whole-number counts give exact percentages
/// (7 of 100 is 7.0, not 7.000000000000001).
pub fn percentage(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 && numerator.is_finite() && denominator.is_finite() {
        numerator * 100.0 / denominator
    } else {
        0.0
    }
}

struct Fold {
    label: String,
    numerator: f64,
    denominator: f64,
    last_updated: chrono::NaiveDateTime,
}

/// Folds the rows that fall inside `[window_start, window_end]` into one
/// aggregate per group key, ordered by key.
pub fn aggregate(rows: &[FactRow], window_start: NaiveDate, window_end: NaiveDate) -> Vec<AggregateRow> {
    let window = DateRange::new(window_start, window_end);
    let mut groups: BTreeMap<&GroupKey, Fold> = BTreeMap::new();
    let mut matched = 0usize;

    for row in rows {
        if !window.contains(&row.timestamp) {
            continue;
        }
        matched += 1;

        let entry = groups.entry(&row.group_key).or_insert_with(|| Fold {
            label: row.group_label.clone(),
            numerator: 0.0,
            denominator: 0.0,
            last_updated: row.timestamp,
        });

        entry.numerator += row.numerator;
        entry.denominator += row.denominator;
        if row.timestamp > entry.last_updated {
            entry.last_updated = row.timestamp;
        }
    }

    tracing::debug!(
        window = %window,
        rows = rows.len(),
        matched,
        groups = groups.len(),
        "aggregated fact rows"
    );

    groups
        .into_iter()
        .map(|(key, fold)| AggregateRow {
            group_key: key.clone(),
            group_label: fold.label,
            numerator: fold.numerator,
            denominator: fold.denominator,
            percentage: percentage(fold.numerator, fold.denominator),
            last_updated: fold.last_updated,
        })
        .collect()
}

pub fn aggregate_range(rows: &[FactRow], range: DateRange) -> Vec<AggregateRow> {
    aggregate(rows, range.start, range.end)
}

/// Rolls a set of aggregates up into one figure. Groups weigh in by their
/// denominators, so a class with 40 marks counts more than one with 4.
pub fn summarize(rows: &[AggregateRow]) -> Option<Summary> {
    let last_updated = rows.iter().map(|row| row.last_updated).max()?;
    let numerator: f64 = rows.iter().map(|row| row.numerator).sum();
    let denominator: f64 = rows.iter().map(|row| row.denominator).sum();

    Some(Summary {
        group_count: rows.len(),
        numerator,
        denominator,
        percentage: percentage(numerator, denominator),
        last_updated,
    })
}
