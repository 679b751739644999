//! End-to-end ticket lifecycle summaries

use crate::analytics::aggregation::group_durations;
use crate::analytics::error::{AnalyticsError, AnalyticsResult};
use crate::analytics::ordering::{Case, CaseMap};
use crate::analytics::transitions::hours_between;
use crate::models::Priority;
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Label used when a case carries no priority or category
pub const UNKNOWN_DIMENSION: &str = "Unknown";

/// Created-to-closed summary of one ticket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleSummary {
    pub case_id: String,
    pub created_at: DateTime<Utc>,
    pub closed_at: DateTime<Utc>,
    pub total_hours: f64,
    pub priority: Option<Priority>,
    pub category: Option<String>,
}

impl LifecycleSummary {
    pub fn priority_label(&self) -> String {
        self.priority
            .map(|p| p.to_string())
            .unwrap_or_else(|| UNKNOWN_DIMENSION.to_string())
    }

    pub fn category_label(&self) -> &str {
        self.category.as_deref().unwrap_or(UNKNOWN_DIMENSION)
    }
}

/// Resolution statistics for one (priority, category) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionGroup {
    pub priority: String,
    pub category: String,
    pub avg_resolution_hours: f64,
    pub median_hours: f64,
    pub ticket_count: usize,
}

/// Summarize a single case; dimensions use the first non-null value
pub fn summarize_case(case: &Case) -> LifecycleSummary {
    LifecycleSummary {
        case_id: case.case_id().to_string(),
        created_at: case.created_at(),
        closed_at: case.closed_at(),
        total_hours: hours_between(case.created_at(), case.closed_at()),
        priority: case.priority(),
        category: case.category().map(str::to_string),
    }
}

/// Summarize every case, in case-id order
pub fn summarize_lifecycles(cases: &CaseMap) -> Vec<LifecycleSummary> {
    let ordered: Vec<&Case> = cases.values().collect();
    ordered.par_iter().map(|case| summarize_case(case)).collect()
}

/// Group lifecycles by (priority, category).
///
/// Rows are ordered by priority rank (unknown last), then category.
pub fn resolution_summary(
    lifecycles: &[LifecycleSummary],
    parallel: bool,
) -> AnalyticsResult<Vec<ResolutionGroup>> {
    let groups = group_durations(
        lifecycles,
        |l| {
            Some((
                l.priority.map(|p| p.rank()).unwrap_or(u8::MAX),
                l.priority_label(),
                l.category_label().to_string(),
            ))
        },
        |l| l.total_hours,
        parallel,
    );

    let mut rows: Vec<((u8, String, String), ResolutionGroup)> = groups
        .into_iter()
        .filter_map(|(key, acc)| {
            let summary = acc.summary()?;
            let row = ResolutionGroup {
                priority: key.1.clone(),
                category: key.2.clone(),
                avg_resolution_hours: summary.mean_hours,
                median_hours: summary.median_hours,
                ticket_count: summary.count,
            };
            Some((key, row))
        })
        .collect();

    if rows.is_empty() {
        return Err(AnalyticsError::InsufficientData(
            "no cases to summarize resolution time".to_string(),
        ));
    }

    rows.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(rows.into_iter().map(|(_, row)| row).collect())
}
