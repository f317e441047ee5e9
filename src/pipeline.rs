use chrono::NaiveDate;
use serde::Serialize;

use crate::adapters::{Domain, DomainAdapter};
use crate::aggregate::{aggregate_range, summarize};
use crate::error::Result;
use crate::models::{AggregateRow, FactRow, RankedRow, Summary};
use crate::period::{resolve_period, Period, PeriodWindow};
use crate::trend::{rank_with_trend, Metric, SortOrder, TrendThresholds};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisRequest {
    pub window: PeriodWindow,
    pub metric: Metric,
    pub sort_order: SortOrder,
    pub thresholds: TrendThresholds,
}

impl AnalysisRequest {
    pub fn new(period: Period, reference_date: NaiveDate) -> Result<Self> {
        Ok(Self {
            window: resolve_period(period, reference_date)?,
            metric: Metric::default(),
            sort_order: SortOrder::default(),
            thresholds: TrendThresholds::default(),
        })
    }

    /// Like [`AnalysisRequest::new`] but from a period symbol, failing on
    /// anything other than daily, weekly or monthly.
    pub fn parse(period: &str, reference_date: NaiveDate) -> Result<Self> {
        Self::new(period.parse()?, reference_date)
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_sort_order(mut self, sort_order: SortOrder) -> Self {
        self.sort_order = sort_order;
        self
    }

    pub fn with_thresholds(mut self, thresholds: TrendThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub domain: Domain,
    pub window: PeriodWindow,
    pub current_summary: Option<Summary>,
    pub previous_summary: Option<Summary>,
    pub ranked: Vec<RankedRow>,
    #[serde(skip)]
    pub previous: Vec<AggregateRow>,
}

impl Analysis {
    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }
}

/// Runs already-mapped facts through both windows and the ranker.
pub fn analyze_facts(domain: Domain, facts: &[FactRow], request: &AnalysisRequest) -> Analysis {
    let current = aggregate_range(facts, request.window.current());
    let previous = aggregate_range(facts, request.window.previous());
    let metric = request.metric;
    let ranked = rank_with_trend(
        &current,
        &previous,
        |row| metric.value(row),
        request.sort_order,
        &request.thresholds,
    );

    tracing::debug!(
        %domain,
        period = %request.window.period,
        facts = facts.len(),
        current_groups = current.len(),
        previous_groups = previous.len(),
        "analysis complete"
    );

    Analysis {
        domain,
        window: request.window,
        current_summary: summarize(&current),
        previous_summary: summarize(&previous),
        ranked,
        previous,
    }
}

pub fn analyze<A: DomainAdapter>(sources: &[A::Source], request: &AnalysisRequest) -> Analysis {
    analyze_facts(A::DOMAIN, &A::to_facts(sources), request)
}
