//! Event ordering: reconstructs per-ticket timelines from an unordered log
//!
//! Events are grouped by case id in input order and each group is then
//! stable-sorted by timestamp. Events of one case that share a timestamp keep
//! their relative input order.

use crate::analytics::error::{AnalyticsError, AnalyticsResult};
use crate::models::{Event, Priority, RawEvent};
use chrono::{DateTime, NaiveDateTime, Utc};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::str::FromStr;
use validator::Validate;

/// Ordered cases keyed by case id
pub type CaseMap = BTreeMap<String, Case>;

/// Naive timestamp layouts accepted besides RFC 3339 (interpreted as UTC)
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// The time-ordered event history of one ticket
#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    case_id: String,
    events: Vec<Event>,
}

impl Case {
    /// Build a case, stable-sorting `events` by timestamp.
    ///
    /// Fails if `events` is empty.
    pub fn new(case_id: impl Into<String>, mut events: Vec<Event>) -> AnalyticsResult<Self> {
        let case_id = case_id.into();
        if events.is_empty() {
            return Err(AnalyticsError::MalformedEvent(format!(
                "case '{}' has no events",
                case_id
            )));
        }
        events.sort_by_key(|e| e.timestamp);
        Ok(Self { case_id, events })
    }

    pub fn case_id(&self) -> &str {
        &self.case_id
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Always false; a case holds at least one event
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Timestamp of the first event
    pub fn created_at(&self) -> DateTime<Utc> {
        self.events[0].timestamp
    }

    /// Timestamp of the last event
    pub fn closed_at(&self) -> DateTime<Utc> {
        self.events[self.events.len() - 1].timestamp
    }

    /// First non-null priority on the timeline
    pub fn priority(&self) -> Option<Priority> {
        self.events.iter().find_map(|e| e.priority)
    }

    /// First non-null category on the timeline
    pub fn category(&self) -> Option<&str> {
        self.events.iter().find_map(|e| e.category.as_deref())
    }
}

/// Parse a timestamp in RFC 3339 or one of the naive layouts
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Convert one raw record into a typed event.
///
/// `index` is the record's position in the input and only used for diagnostics.
pub fn parse_event(index: usize, raw: RawEvent) -> AnalyticsResult<Event> {
    if raw.validate().is_err() || raw.case_id.trim().is_empty() || raw.activity.trim().is_empty()
    {
        return Err(AnalyticsError::MalformedEvent(format!(
            "record {}: missing case_id or activity",
            index
        )));
    }

    let timestamp = parse_timestamp(&raw.timestamp).ok_or_else(|| {
        AnalyticsError::MalformedEvent(format!(
            "record {} (case '{}'): unparseable timestamp '{}'",
            index, raw.case_id, raw.timestamp
        ))
    })?;

    let priority = match non_blank(raw.priority) {
        Some(text) => Some(Priority::from_str(&text).map_err(|_| {
            AnalyticsError::MalformedEvent(format!(
                "record {} (case '{}'): unknown priority '{}'",
                index, raw.case_id, text
            ))
        })?),
        None => None,
    };

    Ok(Event {
        case_id: raw.case_id.trim().to_string(),
        activity: raw.activity.trim().to_string(),
        timestamp,
        priority,
        category: non_blank(raw.category),
        agent: non_blank(raw.agent),
    })
}

/// Parse a batch of raw records, reporting the first malformed one by position
pub fn parse_events(raw: Vec<RawEvent>) -> AnalyticsResult<Vec<Event>> {
    raw.into_par_iter()
        .enumerate()
        .map(|(index, record)| parse_event(index, record))
        .collect::<Vec<_>>()
        .into_iter()
        .collect()
}

/// Group events by case id and order each case by timestamp
pub fn order_events(events: Vec<Event>) -> AnalyticsResult<CaseMap> {
    let mut groups: BTreeMap<String, Vec<Event>> = BTreeMap::new();
    for (index, event) in events.into_iter().enumerate() {
        if event.case_id.trim().is_empty() {
            return Err(AnalyticsError::MalformedEvent(format!(
                "event {}: missing case_id",
                index
            )));
        }
        groups.entry(event.case_id.clone()).or_default().push(event);
    }

    let cases: Vec<AnalyticsResult<Case>> = groups
        .into_par_iter()
        .map(|(case_id, events)| Case::new(case_id, events))
        .collect();

    let cases = cases
        .into_iter()
        .map(|case| case.map(|c| (c.case_id.clone(), c)))
        .collect::<AnalyticsResult<CaseMap>>()?;

    tracing::debug!(cases = cases.len(), "Ordered event log into cases");
    Ok(cases)
}

/// Parse and order raw records in one step
pub fn order_raw_events(raw: Vec<RawEvent>) -> AnalyticsResult<CaseMap> {
    order_events(parse_events(raw)?)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(hours: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap() + Duration::hours(hours)
    }

    #[test]
    fn test_groups_and_sorts_each_case() {
        let events = vec![
            Event::new("B", "Closed", at(9)),
            Event::new("A", "Assigned", at(2)),
            Event::new("B", "Created", at(0)),
            Event::new("A", "Created", at(1)),
        ];

        let cases = order_events(events).unwrap();
        assert_eq!(cases.len(), 2);

        let a: Vec<_> = cases["A"].events().iter().map(|e| e.activity.as_str()).collect();
        assert_eq!(a, vec!["Created", "Assigned"]);
        assert_eq!(cases["B"].created_at(), at(0));
        assert_eq!(cases["B"].closed_at(), at(9));
    }

    #[test]
    fn test_equal_timestamps_keep_input_order() {
        let events = vec![
            Event::new("A", "Second", at(5)),
            Event::new("A", "First", at(1)),
            Event::new("A", "Third", at(5)),
        ];

        let cases = order_events(events).unwrap();
        let order: Vec<_> = cases["A"].events().iter().map(|e| e.activity.as_str()).collect();
        assert_eq!(order, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn test_empty_case_is_rejected() {
        assert!(matches!(
            Case::new("X", vec![]),
            Err(AnalyticsError::MalformedEvent(_))
        ));
    }

    #[test]
    fn test_missing_case_id_is_rejected() {
        let result = order_events(vec![Event::new("  ", "Created", at(0))]);
        assert!(matches!(result, Err(AnalyticsError::MalformedEvent(_))));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-01-15 09:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-15T09:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-15T09:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-15T11:30:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-15 09:30"), Some(expected));
        assert_eq!(parse_timestamp("15/01/2024"), None);
    }

    #[test]
    fn test_parse_event_reports_bad_timestamp() {
        let raw = RawEvent::new("T-1", "Created", "yesterday");
        let err = parse_event(7, raw).unwrap_err();
        assert!(err.to_string().contains("record 7"));
    }

    #[test]
    fn test_parse_event_normalizes_dimensions() {
        let raw = RawEvent::new("T-1", "Created", "2024-01-15 09:30:00")
            .with_priority("high")
            .with_category("  ")
            .with_agent(" bob ");
        let event = parse_event(0, raw).unwrap();
        assert_eq!(event.priority, Some(Priority::High));
        assert_eq!(event.category, None);
        assert_eq!(event.agent.as_deref(), Some("bob"));
    }

    #[test]
    fn test_parse_event_rejects_unknown_priority() {
        let raw = RawEvent::new("T-1", "Created", "2024-01-15 09:30:00").with_priority("P1");
        assert!(matches!(
            parse_event(0, raw),
            Err(AnalyticsError::MalformedEvent(_))
        ));
    }

    #[test]
    fn test_parse_events_reports_first_failure() {
        let raw = vec![
            RawEvent::new("T-1", "Created", "2024-01-15 09:30:00"),
            RawEvent::new("T-1", "Closed", "not a time"),
            RawEvent::new("", "Closed", "2024-01-15 10:30:00"),
        ];
        let err = parse_events(raw).unwrap_err();
        assert!(err.to_string().contains("record 1"));
    }

    #[test]
    fn test_dimension_resolution_takes_first_non_null() {
        let case = Case::new(
            "A",
            vec![
                Event::new("A", "Created", at(0)),
                Event::new("A", "Assigned", at(1))
                    .with_priority(Priority::Low)
                    .with_category("Hardware"),
                Event::new("A", "Closed", at(2)).with_priority(Priority::High),
            ],
        )
        .unwrap();

        assert_eq!(case.priority(), Some(Priority::Low));
        assert_eq!(case.category(), Some("Hardware"));
    }
}
