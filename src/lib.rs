//! Period-bounded rates, rankings and trends for school analytics.
//!
//! Raw records from each domain are mapped to [`models::FactRow`]s by an
//! adapter, folded per group for the current and previous window by
//! [`aggregate::aggregate`], and merged into ranked, trend-annotated rows by
//! [`trend::rank_with_trend`]. [`pipeline::analyze`] runs the whole flow.

pub mod adapters;
pub mod aggregate;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod period;
pub mod pipeline;
pub mod report;
pub mod source;
pub mod trend;

pub use error::{AnalyticsError, Result};
