use std::fmt::Write;

use crate::models::{RankedRow, Summary, TrendDirection};
use crate::pipeline::Analysis;

fn format_percentage(value: Option<f64>) -> String {
    match value {
        Some(value) => format!("{value:.1}%"),
        None => "n/a".to_string(),
    }
}

fn format_delta(value: Option<f64>) -> String {
    match value {
        Some(value) => format!("{value:+.1}"),
        None => "n/a".to_string(),
    }
}

fn summary_line(summary: Option<&Summary>) -> String {
    match summary {
        Some(summary) => format!(
            "{:.1}% across {} groups ({:.0} of {:.0}, last updated {})",
            summary.percentage,
            summary.group_count,
            summary.numerator,
            summary.denominator,
            summary.last_updated.format("%Y-%m-%d")
        ),
        None => "no data".to_string(),
    }
}

/// One line per ranked row, for the terminal.
pub fn format_row(row: &RankedRow) -> String {
    format!(
        "{:>3}. {} ({}) {:.1}% [{:.0}/{:.0}] {} {}",
        row.rank,
        row.row.group_label,
        row.row.group_key,
        row.row.percentage,
        row.row.numerator,
        row.row.denominator,
        row.trend_direction,
        format_delta(row.trend_delta)
    )
}

pub fn overview_line(analysis: &Analysis) -> String {
    let current = analysis.current_summary.as_ref();
    let previous = analysis.previous_summary.as_ref();
    let delta = match (current, previous) {
        (Some(current), Some(previous)) => Some(current.percentage - previous.percentage),
        _ => None,
    };

    format!(
        "{:<11} {:>7} (previous {:>7}, change {:>6}) over {} groups",
        analysis.domain.as_str(),
        format_percentage(current.map(|s| s.percentage)),
        format_percentage(previous.map(|s| s.percentage)),
        format_delta(delta),
        analysis.ranked.len()
    )
}

pub fn build_report(analysis: &Analysis, limit: usize) -> String {
    let mut output = String::new();
    let window = &analysis.window;

    let _ = writeln!(output, "# {} Report", title_case(analysis.domain.as_str()));
    let _ = writeln!(
        output,
        "Generated for the {} window {} (compared with {})",
        window.period,
        window.current(),
        window.previous()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Overall");
    let _ = writeln!(
        output,
        "- Current {}: {}",
        analysis.domain.rate_label(),
        summary_line(analysis.current_summary.as_ref())
    );
    let _ = writeln!(
        output,
        "- Previous {}: {}",
        analysis.domain.rate_label(),
        summary_line(analysis.previous_summary.as_ref())
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Ranking by {}", analysis.domain.group_label());

    if analysis.ranked.is_empty() {
        let _ = writeln!(output, "No data recorded for this window.");
    } else {
        let _ = writeln!(output, "| Rank | Group | Rate | Previous | Change | Trend |");
        let _ = writeln!(output, "|---:|---|---:|---:|---:|---|");
        for row in analysis.ranked.iter().take(limit) {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} | {} | {} |",
                row.rank,
                row.row.group_label,
                format_percentage(Some(row.row.percentage)),
                format_percentage(row.previous_percentage),
                format_delta(row.trend_delta),
                row.trend_direction
            );
        }
    }

    let declining: Vec<&RankedRow> = analysis
        .ranked
        .iter()
        .filter(|row| row.trend_direction == TrendDirection::Declining)
        .collect();
    let _ = writeln!(output);
    let _ = writeln!(output, "## Declining");

    if declining.is_empty() {
        let _ = writeln!(output, "No groups declined beyond the stability band.");
    } else {
        for row in declining {
            let _ = writeln!(
                output,
                "- {}: {} (was {}, {})",
                row.row.group_label,
                format_percentage(Some(row.row.percentage)),
                format_percentage(row.previous_percentage),
                format_delta(row.trend_delta)
            );
        }
    }

    let new_groups: Vec<&RankedRow> = analysis
        .ranked
        .iter()
        .filter(|row| row.trend_direction == TrendDirection::Unknown)
        .collect();
    if !new_groups.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## No Previous Data");
        for row in new_groups {
            let _ = writeln!(output, "- {}", row.row.group_label);
        }
    }

    let dropped: Vec<&str> = analysis
        .previous
        .iter()
        .filter(|prev| {
            !analysis
                .ranked
                .iter()
                .any(|row| row.row.group_key == prev.group_key)
        })
        .map(|prev| prev.group_label.as_str())
        .collect();
    if !dropped.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Inactive This Window");
        for label in dropped {
            let _ = writeln!(output, "- {label}");
        }
    }

    output
}

fn title_case(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
