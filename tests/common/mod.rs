//! Shared fixtures for the integration tests

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use ticketflow::models::{Event, Priority};

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 8, 0, 0).unwrap()
}

/// Builds one ticket from `(stage, hours since previous event)` steps
pub struct TicketBuilder {
    case_id: String,
    start: DateTime<Utc>,
    priority: Option<Priority>,
    category: Option<String>,
    agent: Option<String>,
}

impl TicketBuilder {
    pub fn new(case_id: &str) -> Self {
        Self {
            case_id: case_id.to_string(),
            start: base_time(),
            priority: None,
            category: None,
            agent: None,
        }
    }

    pub fn starting_at(mut self, start: DateTime<Utc>) -> Self {
        self.start = start;
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    pub fn agent(mut self, agent: &str) -> Self {
        self.agent = Some(agent.to_string());
        self
    }

    pub fn steps(self, steps: &[(&str, f64)]) -> Vec<Event> {
        let mut at = self.start;
        steps
            .iter()
            .map(|(stage, gap_hours)| {
                at += Duration::milliseconds((gap_hours * 3_600_000.0).round() as i64);
                let mut event = Event::new(self.case_id.as_str(), *stage, at);
                event.priority = self.priority;
                event.category = self.category.clone();
                event.agent = self.agent.clone();
                event
            })
            .collect()
    }
}

/// Two full tickets plus one that was only opened.
///
/// Investigation Started averages 44.3 h and Solution Implemented 43.6 h.
pub fn helpdesk_log() -> Vec<Event> {
    let mut events = TicketBuilder::new("T-100")
        .priority(Priority::High)
        .category("Network")
        .agent("alice")
        .steps(&[
            ("Ticket Created", 0.0),
            ("Assigned", 1.5),
            ("Investigation Started", 3.0),
            ("Solution Implemented", 44.0),
            ("Customer Verified", 43.0),
            ("Closed", 2.0),
        ]);
    events.extend(
        TicketBuilder::new("T-101")
            .priority(Priority::Low)
            .category("Software")
            .agent("bob")
            .steps(&[
                ("Ticket Created", 0.0),
                ("Assigned", 4.5),
                ("Investigation Started", 6.0),
                ("Solution Implemented", 44.6),
                ("Customer Verified", 44.2),
                ("Closed", 1.0),
            ]),
    );
    events.extend(
        TicketBuilder::new("T-102")
            .priority(Priority::Medium)
            .category("Access")
            .steps(&[("Ticket Created", 0.0)]),
    );
    events
}

/// Render events as a CSV log with the usual helpdesk header
pub fn to_csv(events: &[Event]) -> String {
    let mut out = String::from("Case_ID,Activity,Timestamp,Priority,Category,Agent\n");
    for e in events {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            e.case_id,
            e.activity,
            e.timestamp.format("%Y-%m-%d %H:%M:%S"),
            e.priority.map(|p| p.to_string()).unwrap_or_default(),
            e.category.clone().unwrap_or_default(),
            e.agent.clone().unwrap_or_default(),
        ));
    }
    out
}

pub fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {} to be within {} of {}",
        actual,
        tolerance,
        expected
    );
}
