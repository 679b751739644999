//! Duration aggregation per stage, stage cross-tab, and agent

use crate::analytics::error::{AnalyticsError, AnalyticsResult};
use crate::analytics::ordering::CaseMap;
use crate::analytics::severity::Severity;
use crate::analytics::statistics::{descending_then, DurationAccumulator};
use crate::analytics::transitions::{hours_between, Transition};
use crate::models::Priority;
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// Minimum distinct cases before an agent is reported
pub const DEFAULT_MIN_AGENT_CASES: usize = 10;

/// How transitions are grouped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    #[default]
    Stage,
    StagePriority,
    StageCategory,
}

/// Predicate applied before grouping; unset fields match anything
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DimensionFilter {
    pub priority: Option<Priority>,
    pub category: Option<String>,
    pub agent: Option<String>,
}

impl DimensionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_agent(mut self, agent: impl Into<String>) -> Self {
        self.agent = Some(agent.into());
        self
    }

    pub fn matches(&self, transition: &Transition) -> bool {
        if let Some(priority) = self.priority {
            if transition.priority != Some(priority) {
                return false;
            }
        }

        if let Some(ref category) = self.category {
            if transition.category.as_ref() != Some(category) {
                return false;
            }
        }

        if let Some(ref agent) = self.agent {
            if transition.agent.as_ref() != Some(agent) {
                return false;
            }
        }

        true
    }
}

/// Options for one aggregation pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationOptions {
    pub group_by: GroupBy,
    pub filter: DimensionFilter,
    /// Groups with fewer transitions are suppressed
    pub min_count: usize,
    /// Fold on the rayon pool instead of a single pass
    pub parallel: bool,
}

impl Default for AggregationOptions {
    fn default() -> Self {
        Self {
            group_by: GroupBy::Stage,
            filter: DimensionFilter::default(),
            min_count: 1,
            parallel: true,
        }
    }
}

impl AggregationOptions {
    pub fn grouped_by(mut self, group_by: GroupBy) -> Self {
        self.group_by = group_by;
        self
    }

    pub fn with_filter(mut self, filter: DimensionFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_min_count(mut self, min_count: usize) -> Self {
        self.min_count = min_count;
        self
    }

    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

/// Duration statistics for one stage (optionally one dimension value)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageAggregate {
    pub stage: String,
    /// Priority or category value for cross-tab groupings
    pub dimension: Option<String>,
    pub count: usize,
    pub mean_hours: f64,
    pub median_hours: f64,
    pub stddev_hours: Option<f64>,
    /// Filled in by the severity classifier
    pub severity: Option<Severity>,
}

/// Case-handling statistics for one agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentAggregate {
    pub agent: String,
    pub case_count: usize,
    pub mean_hours: f64,
    pub median_hours: f64,
    pub stddev_hours: Option<f64>,
}

/// Fold values into per-key accumulators.
///
/// `key` returning `None` drops the item. The parallel path builds partial
/// maps per rayon job and merges them; it yields the same statistics as the
/// sequential path up to floating-point rounding.
pub fn group_durations<T, K, KF, VF>(
    items: &[T],
    key: KF,
    value: VF,
    parallel: bool,
) -> HashMap<K, DurationAccumulator>
where
    T: Sync,
    K: Eq + Hash + Send,
    KF: Fn(&T) -> Option<K> + Sync,
    VF: Fn(&T) -> f64 + Sync,
{
    if !parallel {
        let mut groups: HashMap<K, DurationAccumulator> = HashMap::new();
        for item in items {
            if let Some(k) = key(item) {
                groups.entry(k).or_default().push(value(item));
            }
        }
        return groups;
    }

    items
        .par_iter()
        .fold(HashMap::new, |mut groups: HashMap<K, DurationAccumulator>, item| {
            if let Some(k) = key(item) {
                groups.entry(k).or_default().push(value(item));
            }
            groups
        })
        .reduce(HashMap::new, merge_groups)
}

fn merge_groups<K: Eq + Hash>(
    mut left: HashMap<K, DurationAccumulator>,
    right: HashMap<K, DurationAccumulator>,
) -> HashMap<K, DurationAccumulator> {
    for (k, acc) in right {
        left.entry(k).or_default().merge(acc);
    }
    left
}

/// Aggregate transition durations by stage.
///
/// Output is sorted by mean hours descending, ties broken by stage then
/// dimension. Returns `InsufficientData` when no group reaches `min_count`.
pub fn aggregate_stages(
    transitions: &[Transition],
    options: &AggregationOptions,
) -> AnalyticsResult<Vec<StageAggregate>> {
    let group_by = options.group_by;
    let filter = &options.filter;

    let groups = group_durations(
        transitions,
        |t| {
            if !filter.matches(t) {
                return None;
            }
            let dimension = match group_by {
                GroupBy::Stage => None,
                GroupBy::StagePriority => Some(t.priority?.to_string()),
                GroupBy::StageCategory => Some(t.category.clone()?),
            };
            Some((t.from_stage.clone(), dimension))
        },
        |t| t.duration_hours,
        options.parallel,
    );

    let mut aggregates: Vec<StageAggregate> = groups
        .into_iter()
        .filter(|(_, acc)| acc.count() >= options.min_count.max(1))
        .filter_map(|((stage, dimension), acc)| {
            let summary = acc.summary()?;
            Some(StageAggregate {
                stage,
                dimension,
                count: summary.count,
                mean_hours: summary.mean_hours,
                median_hours: summary.median_hours,
                stddev_hours: summary.stddev_hours,
                severity: None,
            })
        })
        .collect();

    if aggregates.is_empty() {
        return Err(AnalyticsError::InsufficientData(format!(
            "no {:?} group has at least {} transition(s)",
            group_by,
            options.min_count.max(1)
        )));
    }

    aggregates.sort_by(|a, b| {
        descending_then(
            (a.mean_hours, (&a.stage, &a.dimension)),
            (b.mean_hours, (&b.stage, &b.dimension)),
        )
    });
    Ok(aggregates)
}

/// Aggregate per-agent handling time.
///
/// For each (agent, case) the duration is the span between the agent's first
/// and last touch in that case. Agents with fewer than `min_cases` distinct
/// cases are suppressed.
pub fn aggregate_agents(
    cases: &CaseMap,
    min_cases: usize,
    parallel: bool,
) -> AnalyticsResult<Vec<AgentAggregate>> {
    let spans: Vec<(String, f64)> = cases
        .values()
        .flat_map(|case| {
            let mut touches: BTreeMap<&str, (DateTime<Utc>, DateTime<Utc>)> = BTreeMap::new();
            for event in case.events() {
                if let Some(agent) = event.agent.as_deref() {
                    touches
                        .entry(agent)
                        .and_modify(|(_, last)| *last = event.timestamp)
                        .or_insert((event.timestamp, event.timestamp));
                }
            }
            touches
                .into_iter()
                .map(|(agent, (first, last))| (agent.to_string(), hours_between(first, last)))
                .collect::<Vec<_>>()
        })
        .collect();

    let groups = group_durations(&spans, |(agent, _)| Some(agent.clone()), |(_, h)| *h, parallel);

    let mut aggregates: Vec<AgentAggregate> = groups
        .into_iter()
        .filter(|(_, acc)| acc.count() >= min_cases.max(1))
        .filter_map(|(agent, acc)| {
            let summary = acc.summary()?;
            Some(AgentAggregate {
                agent,
                case_count: summary.count,
                mean_hours: summary.mean_hours,
                median_hours: summary.median_hours,
                stddev_hours: summary.stddev_hours,
            })
        })
        .collect();

    if aggregates.is_empty() {
        return Err(AnalyticsError::InsufficientData(format!(
            "no agent handled at least {} case(s)",
            min_cases.max(1)
        )));
    }

    aggregates.sort_by(|a, b| descending_then((a.mean_hours, &a.agent), (b.mean_hours, &b.agent)));
    Ok(aggregates)
}
