use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use validator::Validate;

/// A single activity recorded against a service ticket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Ticket identifier shared by every event of one case
    pub case_id: String,

    /// Process stage the ticket entered
    pub activity: String,

    /// When the stage was entered
    pub timestamp: DateTime<Utc>,

    /// Ticket priority, if the log carries it on this event
    pub priority: Option<Priority>,

    /// Ticket category, if the log carries it on this event
    pub category: Option<String>,

    /// Agent that recorded the event
    pub agent: Option<String>,
}

impl Event {
    /// Create an event without dimensional fields
    pub fn new(
        case_id: impl Into<String>,
        activity: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            case_id: case_id.into(),
            activity: activity.into(),
            timestamp,
            priority: None,
            category: None,
            agent: None,
        }
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
}

/// Unparsed event record as it arrives from an ingestion source.
///
/// Field aliases accept the column names used by helpdesk exports
/// (`Case_ID`, `Activity`, `Timestamp`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct RawEvent {
    #[serde(alias = "Case_ID", alias = "case")]
    #[validate(length(min = 1, max = 255))]
    pub case_id: String,

    #[serde(alias = "Activity", alias = "stage")]
    #[validate(length(min = 1))]
    pub activity: String,

    #[serde(alias = "Timestamp")]
    pub timestamp: String,

    #[serde(default, alias = "Priority")]
    pub priority: Option<String>,

    #[serde(default, alias = "Category")]
    pub category: Option<String>,

    #[serde(default, alias = "Agent", alias = "Resource")]
    pub agent: Option<String>,
}

impl RawEvent {
    pub fn new(
        case_id: impl Into<String>,
        activity: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            case_id: case_id.into(),
            activity: activity.into(),
            timestamp: timestamp.into(),
            ..Default::default()
        }
    }

    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
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
}

/// Ticket priority as recorded by the helpdesk
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumString,
    EnumIter,
    Display,
)]
#[strum(ascii_case_insensitive)]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    /// Numeric rank (lower is more urgent)
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Critical => 0,
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }
}
