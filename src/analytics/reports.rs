//! Analysis report and its tabular views

use crate::analytics::aggregation::{AgentAggregate, StageAggregate};
use crate::analytics::impact::ImpactProjection;
use crate::analytics::lifecycle::{LifecycleSummary, ResolutionGroup};
use crate::analytics::recommendations::Recommendation;
use crate::analytics::segmentation::{CategoryResolution, PriorityPivot};
use crate::analytics::severity::{Bottleneck, Severity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A non-fatal condition recorded during a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Pipeline step that produced the diagnostic
    pub component: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            message: message.into(),
        }
    }
}

/// Everything one analysis run produces.
///
/// Values are kept at full precision; rounding happens in the row views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub id: String,
    pub generated_at: DateTime<Utc>,
    pub event_count: usize,
    pub case_count: usize,
    pub transition_count: usize,
    pub stage_summary: Vec<StageAggregate>,
    /// One entry per case, in case-id order
    pub lifecycles: Vec<LifecycleSummary>,
    pub bottlenecks: Vec<Bottleneck>,
    pub priority_pivot: PriorityPivot,
    pub resolution_summary: Vec<ResolutionGroup>,
    pub category_resolution: Vec<CategoryResolution>,
    pub agent_summary: Vec<AgentAggregate>,
    pub impact: Option<ImpactProjection>,
    pub recommendations: Vec<Recommendation>,
    pub diagnostics: Vec<Diagnostic>,
}

impl AnalysisReport {
    pub fn new(event_count: usize, case_count: usize, transition_count: usize) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            generated_at: Utc::now(),
            event_count,
            case_count,
            transition_count,
            stage_summary: Vec::new(),
            lifecycles: Vec::new(),
            bottlenecks: Vec::new(),
            priority_pivot: PriorityPivot::default(),
            resolution_summary: Vec::new(),
            category_resolution: Vec::new(),
            agent_summary: Vec::new(),
            impact: None,
            recommendations: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn add_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn has_diagnostics(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// Highest severity among reported bottlenecks
    pub fn worst_severity(&self) -> Option<Severity> {
        self.bottlenecks.iter().map(|b| b.severity).max()
    }

    /// Human-readable digest for the terminal
    pub fn summary(&self) -> ReportSummary<'_> {
        ReportSummary(self)
    }

    pub fn stage_rows(&self) -> Vec<StageSummaryRow> {
        self.stage_summary.iter().map(StageSummaryRow::from).collect()
    }

    pub fn lifecycle_rows(&self) -> Vec<LifecycleRow> {
        self.lifecycles.iter().map(LifecycleRow::from).collect()
    }

    pub fn resolution_rows(&self) -> Vec<ResolutionRow> {
        self.resolution_summary.iter().map(ResolutionRow::from).collect()
    }

    pub fn bottleneck_rows(&self) -> Vec<BottleneckRow> {
        self.bottlenecks.iter().map(BottleneckRow::from).collect()
    }

    pub fn recommendation_rows(&self) -> Vec<RecommendationRow> {
        self.recommendations.iter().map(RecommendationRow::from).collect()
    }

    pub fn impact_row(&self) -> Option<ImpactRow> {
        self.impact.as_ref().map(ImpactRow::from)
    }

    pub fn agent_rows(&self) -> Vec<AgentRow> {
        self.agent_summary.iter().map(AgentRow::from).collect()
    }

    pub fn category_rows(&self) -> Vec<CategoryRow> {
        self.category_resolution.iter().map(CategoryRow::from).collect()
    }
}

/// Console rendering of a report, see [`AnalysisReport::summary`]
pub struct ReportSummary<'a>(&'a AnalysisReport);

impl fmt::Display for ReportSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        writeln!(
            f,
            "Analyzed {} events in {} tickets ({} transitions)",
            report.event_count, report.case_count, report.transition_count
        )?;

        if !report.bottlenecks.is_empty() {
            writeln!(f, "\nBottlenecks:")?;
            for row in report.bottleneck_rows() {
                writeln!(
                    f,
                    "  {:<32} {:>8.2} h  {:>4} transitions  {}",
                    row.stage, row.avg_hours, row.count, row.severity
                )?;
            }
        }

        if let Some(impact) = report.impact_row() {
            writeln!(
                f,
                "\nImpact of a {:.0}% reduction in {}:",
                impact.reduction_fraction * 100.0,
                impact.selected_stages
            )?;
            writeln!(f, "  Hours saved per ticket: {:.2}", impact.hours_saved_per_ticket)?;
            writeln!(f, "  Annual hours saved:     {:.0}", impact.annual_hours_saved)?;
            writeln!(f, "  FTE equivalency:        {:.2}", impact.fte_equivalency)?;
            writeln!(f, "  Annual cost savings:    {:.0}", impact.annual_cost_savings)?;
        }

        let pivot = &report.priority_pivot;
        if !pivot.is_empty() {
            writeln!(f, "\nMean hours by stage and priority:")?;
            write!(f, "  {:<32}", "")?;
            for priority in &pivot.priorities {
                write!(f, "{:>10}", priority.to_string())?;
            }
            writeln!(f)?;
            for row in &pivot.rows {
                write!(f, "  {:<32}", row.stage)?;
                for hours in &row.mean_hours {
                    write!(f, "{:>10.2}", hours)?;
                }
                writeln!(f)?;
            }
        }

        if !report.category_resolution.is_empty() {
            writeln!(f, "\nResolution time by category:")?;
            for row in report.category_rows() {
                writeln!(
                    f,
                    "  {:<24} {:>8.2} h  {:>4} tickets",
                    row.category, row.avg_resolution_hours, row.ticket_count
                )?;
            }
        }

        if !report.recommendations.is_empty() {
            writeln!(f, "\nRecommended actions:")?;
            for (i, rec) in report.recommendations.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, rec.issue)?;
                writeln!(f, "     Action: {}", rec.action)?;
                writeln!(f, "     Expected impact: {}", rec.expected_impact)?;
            }
        }

        for diagnostic in &report.diagnostics {
            writeln!(f, "note [{}]: {}", diagnostic.component, diagnostic.message)?;
        }
        Ok(())
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Stage summary table row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageSummaryRow {
    #[serde(rename = "Stage")]
    pub stage: String,
    #[serde(rename = "Avg_Hours")]
    pub avg_hours: f64,
    #[serde(rename = "Median_Hours")]
    pub median_hours: f64,
    #[serde(rename = "Std_Hours")]
    pub std_hours: Option<f64>,
    #[serde(rename = "Count")]
    pub count: usize,
}

impl From<&StageAggregate> for StageSummaryRow {
    fn from(a: &StageAggregate) -> Self {
        Self {
            stage: a.stage.clone(),
            avg_hours: round2(a.mean_hours),
            median_hours: round2(a.median_hours),
            std_hours: a.stddev_hours.map(round2),
            count: a.count,
        }
    }
}

/// Per-ticket lifecycle table row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LifecycleRow {
    #[serde(rename = "Case_ID")]
    pub case_id: String,
    #[serde(rename = "Created_At")]
    pub created_at: String,
    #[serde(rename = "Closed_At")]
    pub closed_at: String,
    #[serde(rename = "Total_Hours")]
    pub total_hours: f64,
    #[serde(rename = "Priority")]
    pub priority: String,
    #[serde(rename = "Category")]
    pub category: String,
}

impl From<&LifecycleSummary> for LifecycleRow {
    fn from(l: &LifecycleSummary) -> Self {
        Self {
            case_id: l.case_id.clone(),
            created_at: l.created_at.to_rfc3339(),
            closed_at: l.closed_at.to_rfc3339(),
            total_hours: round2(l.total_hours),
            priority: l.priority_label(),
            category: l.category_label().to_string(),
        }
    }
}

/// Resolution summary table row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionRow {
    #[serde(rename = "Priority")]
    pub priority: String,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Avg_Resolution_Hours")]
    pub avg_resolution_hours: f64,
    #[serde(rename = "Median_Hours")]
    pub median_hours: f64,
    #[serde(rename = "Ticket_Count")]
    pub ticket_count: usize,
}

impl From<&ResolutionGroup> for ResolutionRow {
    fn from(g: &ResolutionGroup) -> Self {
        Self {
            priority: g.priority.clone(),
            category: g.category.clone(),
            avg_resolution_hours: round2(g.avg_resolution_hours),
            median_hours: round2(g.median_hours),
            ticket_count: g.ticket_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BottleneckRow {
    #[serde(rename = "Stage")]
    pub stage: String,
    #[serde(rename = "Avg_Hours")]
    pub avg_hours: f64,
    #[serde(rename = "Count")]
    pub count: usize,
    #[serde(rename = "Severity")]
    pub severity: Severity,
}

impl From<&Bottleneck> for BottleneckRow {
    fn from(b: &Bottleneck) -> Self {
        Self {
            stage: b.stage.clone(),
            avg_hours: round2(b.mean_hours),
            count: b.count,
            severity: b.severity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationRow {
    #[serde(rename = "Issue")]
    pub issue: String,
    #[serde(rename = "Action")]
    pub action: String,
    #[serde(rename = "Expected_Impact")]
    pub expected_impact: String,
}

impl From<&Recommendation> for RecommendationRow {
    fn from(r: &Recommendation) -> Self {
        Self {
            issue: r.issue.clone(),
            action: r.action.clone(),
            expected_impact: r.expected_impact.clone(),
        }
    }
}

/// Impact projection flattened to one row.
///
/// Annual hours and cost are whole numbers; the rest keep two decimals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactRow {
    #[serde(rename = "Selected_Stages")]
    pub selected_stages: String,
    #[serde(rename = "Total_Bottleneck_Hours")]
    pub total_bottleneck_hours: f64,
    #[serde(rename = "Reduction_Fraction")]
    pub reduction_fraction: f64,
    #[serde(rename = "Hours_Saved_Per_Ticket")]
    pub hours_saved_per_ticket: f64,
    #[serde(rename = "Tickets_Per_Year")]
    pub tickets_per_year: u64,
    #[serde(rename = "Annual_Hours_Saved")]
    pub annual_hours_saved: f64,
    #[serde(rename = "FTE_Equivalency")]
    pub fte_equivalency: f64,
    #[serde(rename = "Hourly_Cost")]
    pub hourly_cost: f64,
    #[serde(rename = "Annual_Cost_Savings")]
    pub annual_cost_savings: f64,
}

impl From<&ImpactProjection> for ImpactRow {
    fn from(p: &ImpactProjection) -> Self {
        Self {
            selected_stages: p.selected_stages.join("; "),
            total_bottleneck_hours: round2(p.total_bottleneck_hours_per_ticket),
            reduction_fraction: round2(p.reduction_fraction),
            hours_saved_per_ticket: round2(p.hours_saved_per_ticket),
            tickets_per_year: p.tickets_per_year,
            annual_hours_saved: p.annual_hours_saved.round(),
            fte_equivalency: round2(p.fte_equivalency),
            hourly_cost: round2(p.hourly_cost),
            annual_cost_savings: p.annual_cost_savings.round(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentRow {
    #[serde(rename = "Agent")]
    pub agent: String,
    #[serde(rename = "Case_Count")]
    pub case_count: usize,
    #[serde(rename = "Avg_Hours")]
    pub avg_hours: f64,
    #[serde(rename = "Median_Hours")]
    pub median_hours: f64,
    #[serde(rename = "Std_Hours")]
    pub std_hours: Option<f64>,
}

impl From<&AgentAggregate> for AgentRow {
    fn from(a: &AgentAggregate) -> Self {
        Self {
            agent: a.agent.clone(),
            case_count: a.case_count,
            avg_hours: round2(a.mean_hours),
            median_hours: round2(a.median_hours),
            std_hours: a.stddev_hours.map(round2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRow {
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Avg_Resolution_Hours")]
    pub avg_resolution_hours: f64,
    #[serde(rename = "Ticket_Count")]
    pub ticket_count: usize,
}

impl From<&CategoryResolution> for CategoryRow {
    fn from(c: &CategoryResolution) -> Self {
        Self {
            category: c.category.clone(),
            avg_resolution_hours: round2(c.avg_resolution_hours),
            ticket_count: c.ticket_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn projection() -> ImpactProjection {
        ImpactProjection {
            selected_stages: vec!["Investigation Started".into(), "Solution Implemented".into()],
            total_bottleneck_hours_per_ticket: 87.9,
            reduction_fraction: 0.3,
            hours_saved_per_ticket: 26.369999999999997,
            tickets_per_year: 500,
            annual_hours_saved: 13184.999999999998,
            fte_equivalency: 6.338942307692307,
            hourly_cost: 30.0,
            annual_cost_savings: 395549.99999999994,
        }
    }

    #[test]
    fn test_impact_row_rounding() {
        let row = ImpactRow::from(&projection());
        assert_eq!(row.selected_stages, "Investigation Started; Solution Implemented");
        assert_eq!(row.hours_saved_per_ticket, 26.37);
        assert_eq!(row.annual_hours_saved, 13185.0);
        assert_eq!(row.fte_equivalency, 6.34);
        assert_eq!(row.annual_cost_savings, 395550.0);
    }

    #[test]
    fn test_stage_row_keeps_missing_stddev() {
        let aggregate = StageAggregate {
            stage: "Ticket Created".into(),
            dimension: None,
            count: 1,
            mean_hours: 1.23456,
            median_hours: 1.23456,
            stddev_hours: None,
            severity: None,
        };
        let row = StageSummaryRow::from(&aggregate);
        assert_eq!(row.avg_hours, 1.23);
        assert!(row.std_hours.is_none());
    }

    #[test]
    fn test_report_keeps_full_precision() {
        let mut report = AnalysisReport::new(4, 2, 2);
        report.impact = Some(projection());
        assert_eq!(report.impact.as_ref().map(|p| p.fte_equivalency), Some(6.338942307692307));
        assert!(!report.has_diagnostics());
        report.add_diagnostic(Diagnostic::new("agents", "no agent has 10 cases"));
        assert!(report.has_diagnostics());
        assert!(report.worst_severity().is_none());
    }

    #[test]
    fn test_row_headers_serialize_with_table_names() {
        let row = RecommendationRow {
            issue: "i".into(),
            action: "a".into(),
            expected_impact: "e".into(),
        };
        let json = serde_json::to_value(&row).unwrap();
        assert!(json.get("Expected_Impact").is_some());
    }
}
