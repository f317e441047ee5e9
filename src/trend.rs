use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{AnalyticsError, Result};
use crate::models::{AggregateRow, GroupKey, RankedRow, TrendDirection};

/// Percentage points a group must move before it counts as a change.
pub const DEFAULT_STABILITY_BAND: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendThresholds {
    pub stability_band: f64,
}

impl Default for TrendThresholds {
    fn default() -> Self {
        Self {
            stability_band: DEFAULT_STABILITY_BAND,
        }
    }
}

impl TrendThresholds {
    /// Rejects NaN, infinite and negative bands, any of which would leave
    /// every group classified the same way.
    pub fn new(stability_band: f64) -> Result<Self> {
        if !stability_band.is_finite() || stability_band < 0.0 {
            return Err(AnalyticsError::InvalidStabilityBand(stability_band.to_string()));
        }
        Ok(Self { stability_band })
    }

    pub fn classify(&self, delta: Option<f64>) -> TrendDirection {
        match delta {
            None => TrendDirection::Unknown,
            Some(delta) if delta > self.stability_band => TrendDirection::Improving,
            Some(delta) if delta < -self.stability_band => TrendDirection::Declining,
            Some(_) => TrendDirection::Stable,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortOrder {
    type Err = AnalyticsError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Asc),
            "desc" | "descending" => Ok(SortOrder::Desc),
            _ => Err(AnalyticsError::InvalidSortOrder(value.to_string())),
        }
    }
}

/// Standard ranking metrics over an aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    #[default]
    Percentage,
    Numerator,
    Denominator,
}

impl Metric {
    pub fn value(self, row: &AggregateRow) -> f64 {
        match self {
            Metric::Percentage => row.percentage,
            Metric::Numerator => row.numerator,
            Metric::Denominator => row.denominator,
        }
    }
}

impl FromStr for Metric {
    type Err = AnalyticsError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "percentage" | "rate" => Ok(Metric::Percentage),
            "numerator" => Ok(Metric::Numerator),
            "denominator" => Ok(Metric::Denominator),
            _ => Err(AnalyticsError::InvalidMetric(value.to_string())),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Metric::Percentage => "percentage",
            Metric::Numerator => "numerator",
            Metric::Denominator => "denominator",
        };
        f.write_str(name)
    }
}

fn compare_labels(a: &AggregateRow, b: &AggregateRow) -> Ordering {
    a.group_label
        .to_lowercase()
        .cmp(&b.group_label.to_lowercase())
        .then_with(|| a.group_label.cmp(&b.group_label))
        .then_with(|| a.group_key.cmp(&b.group_key))
}

/// Merges current aggregates with the previous window's, classifies each
/// group's movement and orders the result. Groups that only appear in
/// `previous` are dropped.
pub fn rank_with_trend<F>(
    current: &[AggregateRow],
    previous: &[AggregateRow],
    metric_selector: F,
    sort_order: SortOrder,
    thresholds: &TrendThresholds,
) -> Vec<RankedRow>
where
    F: Fn(&AggregateRow) -> f64,
{
    let lookup: HashMap<&GroupKey, &AggregateRow> =
        previous.iter().map(|row| (&row.group_key, row)).collect();

    let mut scored: Vec<(f64, RankedRow)> = current
        .iter()
        .map(|row| {
            let previous_percentage = lookup.get(&row.group_key).map(|prev| prev.percentage);
            let trend_delta = previous_percentage.map(|prev| row.percentage - prev);
            let ranked = RankedRow {
                row: row.clone(),
                previous_percentage,
                trend_delta,
                trend_direction: thresholds.classify(trend_delta),
                rank: 0,
            };
            (metric_selector(row), ranked)
        })
        .collect();

    scored.sort_by(|(a_metric, a), (b_metric, b)| {
        let by_metric = match sort_order {
            SortOrder::Asc => a_metric.total_cmp(b_metric),
            SortOrder::Desc => b_metric.total_cmp(a_metric),
        };
        by_metric.then_with(|| compare_labels(&a.row, &b.row))
    });

    let ranked: Vec<RankedRow> = scored
        .into_iter()
        .enumerate()
        .map(|(index, (_, mut row))| {
            row.rank = index + 1;
            row
        })
        .collect();

    tracing::debug!(
        current = current.len(),
        previous = previous.len(),
        ranked = ranked.len(),
        ?sort_order,
        "ranked aggregates"
    );

    ranked
}
