//! Ticket lifecycle analytics
//!
//! This module reconstructs per-ticket stage timelines from an unordered event
//! log and measures where time is lost between stages.
//!
//! # Pipeline
//!
//! - **Ordering**: group events by case id, stable-sort each case by timestamp
//! - **Transitions**: one duration per consecutive event pair
//! - **Aggregation**: count, mean, median and sample standard deviation per stage,
//!   optionally crossed with priority or category
//! - **Severity**: explicit threshold presets map mean hours to a tier
//! - **Lifecycle**: created-to-closed time per case, grouped by priority and category
//! - **Impact**: projected annual hours, FTE and cost saved by shortening the
//!   slowest stages
//! - **Recommendations**: rule table matched against the flagged stages
//!
//! Everything except [`ReportExporter::write_all`] is a pure function of its input.
//!
//! # Example
//!
//! ```no_run
//! use ticketflow::analytics::{AnalyticsConfig, AnalyticsEngine, SeverityPreset};
//! use ticketflow::models::RawEvent;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = AnalyticsEngine::new(AnalyticsConfig::new(SeverityPreset::Standard))?;
//!
//!     let report = engine.analyze_raw(vec![
//!         RawEvent::new("T-1", "Ticket Created", "2024-01-01 09:00:00"),
//!         RawEvent::new("T-1", "Closed", "2024-01-03 17:30:00"),
//!     ])?;
//!     println!("{} bottleneck(s)", report.bottlenecks.len());
//!
//!     Ok(())
//! }
//! ```

mod aggregation;
mod engine;
mod error;
mod export;
mod impact;
mod lifecycle;
mod ordering;
mod recommendations;
mod reports;
mod segmentation;
mod severity;
mod statistics;
mod transitions;

pub use aggregation::{
    aggregate_agents, aggregate_stages, group_durations, AgentAggregate, AggregationOptions,
    DimensionFilter, GroupBy, StageAggregate, DEFAULT_MIN_AGENT_CASES,
};
pub use engine::{AnalyticsConfig, AnalyticsEngine};
pub use error::{AnalyticsError, AnalyticsResult};
pub use export::{Artifact, ExportFormat, ReportExporter};
pub use impact::{project_impact, ImpactParameters, ImpactProjection, HOURS_PER_FTE_YEAR};
pub use lifecycle::{
    resolution_summary, summarize_case, summarize_lifecycles, LifecycleSummary, ResolutionGroup,
    UNKNOWN_DIMENSION,
};
pub use ordering::{
    order_events, order_raw_events, parse_event, parse_events, parse_timestamp, Case, CaseMap,
};
pub use recommendations::{
    default_rules, generate_recommendations, Recommendation, RecommendationRule,
};
pub use reports::{
    AgentRow, AnalysisReport, BottleneckRow, CategoryRow, Diagnostic, ImpactRow, LifecycleRow,
    RecommendationRow, ReportSummary, ResolutionRow, StageSummaryRow,
};
pub use segmentation::{
    category_resolution, priority_pivot, CategoryResolution, PivotRow, PriorityPivot,
};
pub use severity::{
    classify_all, identify_bottlenecks, severity, Bottleneck, Severity, SeverityPreset,
    SeverityThresholds,
};
pub use statistics::{mean, median, percentile, sample_std_dev, DurationAccumulator, DurationSummary};
pub use transitions::{extract_all, extract_transitions, hours_between, Transition};
