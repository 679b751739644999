//! Segmentation views: stage-by-priority pivot and category resolution ranking

use crate::analytics::aggregation::group_durations;
use crate::analytics::lifecycle::LifecycleSummary;
use crate::analytics::statistics::descending_then;
use crate::analytics::transitions::Transition;
use crate::models::Priority;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Mean stage duration per priority; absent combinations are 0.0
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriorityPivot {
    /// Column order (most urgent first)
    pub priorities: Vec<Priority>,
    pub rows: Vec<PivotRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotRow {
    pub stage: String,
    /// One mean per entry of `PriorityPivot::priorities`
    pub mean_hours: Vec<f64>,
}

impl PriorityPivot {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Look up a single cell
    pub fn get(&self, stage: &str, priority: Priority) -> Option<f64> {
        let column = self.priorities.iter().position(|p| *p == priority)?;
        self.rows
            .iter()
            .find(|r| r.stage == stage)
            .and_then(|r| r.mean_hours.get(column).copied())
    }
}

/// Average resolution time for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryResolution {
    pub category: String,
    pub avg_resolution_hours: f64,
    pub ticket_count: usize,
}

/// Build the stage x priority pivot from transitions.
///
/// Transitions without a priority are left out; rows are sorted by stage.
pub fn priority_pivot(transitions: &[Transition], parallel: bool) -> PriorityPivot {
    let groups = group_durations(
        transitions,
        |t| Some((t.from_stage.clone(), t.priority?)),
        |t| t.duration_hours,
        parallel,
    );

    let priorities: Vec<Priority> = groups
        .keys()
        .map(|(_, p)| *p)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut cells: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for ((stage, priority), acc) in groups {
        let Some(column) = priorities.iter().position(|p| *p == priority) else {
            continue;
        };
        let row = cells
            .entry(stage)
            .or_insert_with(|| vec![0.0; priorities.len()]);
        row[column] = acc.mean().unwrap_or(0.0);
    }

    PriorityPivot {
        priorities,
        rows: cells
            .into_iter()
            .map(|(stage, mean_hours)| PivotRow { stage, mean_hours })
            .collect(),
    }
}

/// Rank categories by mean resolution time, slowest first
pub fn category_resolution(lifecycles: &[LifecycleSummary]) -> Vec<CategoryResolution> {
    let groups = group_durations(
        lifecycles,
        |l| Some(l.category_label().to_string()),
        |l| l.total_hours,
        false,
    );

    let mut rows: Vec<CategoryResolution> = groups
        .into_iter()
        .filter_map(|(category, acc)| {
            Some(CategoryResolution {
                category,
                avg_resolution_hours: acc.mean()?,
                ticket_count: acc.count(),
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        descending_then(
            (a.avg_resolution_hours, &a.category),
            (b.avg_resolution_hours, &b.category),
        )
    });
    rows
}
