//! Transition extraction: the timed gap between consecutive stages of a case

use crate::analytics::ordering::{Case, CaseMap};
use crate::models::{Event, Priority};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// One stage-to-stage hop within a case.
///
/// Dimensional fields are copied from the event being left (`from_stage`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub case_id: String,
    pub from_stage: String,
    pub to_stage: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_hours: f64,
    pub priority: Option<Priority>,
    pub category: Option<String>,
    pub agent: Option<String>,
}

impl Transition {
    fn between(case_id: &str, from: &Event, to: &Event) -> Self {
        Self {
            case_id: case_id.to_string(),
            from_stage: from.activity.clone(),
            to_stage: to.activity.clone(),
            start_time: from.timestamp,
            end_time: to.timestamp,
            duration_hours: hours_between(from.timestamp, to.timestamp),
            priority: from.priority,
            category: from.category.clone(),
            agent: from.agent.clone(),
        }
    }
}

/// Signed difference `end - start` in fractional hours (millisecond precision)
pub fn hours_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    end.signed_duration_since(start).num_milliseconds() as f64 / MILLIS_PER_HOUR
}

/// Lazily walk a case's adjacent event pairs.
///
/// A case with `k` events yields `k - 1` transitions; a single-event case
/// yields none.
pub fn extract_transitions(case: &Case) -> impl Iterator<Item = Transition> + '_ {
    case.events()
        .windows(2)
        .map(move |pair| Transition::between(case.case_id(), &pair[0], &pair[1]))
}

/// Extract transitions for every case, in case-id order
pub fn extract_all(cases: &CaseMap) -> Vec<Transition> {
    let ordered: Vec<&Case> = cases.values().collect();
    let transitions: Vec<Transition> = ordered
        .par_iter()
        .flat_map_iter(|case| extract_transitions(*case))
        .collect();

    tracing::debug!(
        cases = ordered.len(),
        transitions = transitions.len(),
        "Extracted stage transitions"
    );
    transitions
}
