//! Report export formats and utilities

use crate::analytics::error::{AnalyticsError, AnalyticsResult};
use crate::analytics::reports::{
    round2, AgentRow, AnalysisReport, BottleneckRow, CategoryRow, ImpactRow, LifecycleRow,
    RecommendationRow, ResolutionRow, StageSummaryRow,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Export format for report tables
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::EnumString,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    /// Get file extension for this format
    pub fn extension(&self) -> &str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

/// One rendered output file
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Artifact {
    fn new(name: &str, format: ExportFormat, bytes: Vec<u8>) -> Self {
        Self {
            file_name: format!("{}.{}", name, format.extension()),
            bytes,
        }
    }
}

/// A table row with a fixed column order
trait CsvRow {
    fn header() -> Vec<String>;
    fn fields(&self) -> Vec<String>;
}

fn opt(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl CsvRow for StageSummaryRow {
    fn header() -> Vec<String> {
        to_strings(&["Stage", "Avg_Hours", "Median_Hours", "Std_Hours", "Count"])
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.stage.clone(),
            self.avg_hours.to_string(),
            self.median_hours.to_string(),
            opt(self.std_hours),
            self.count.to_string(),
        ]
    }
}

impl CsvRow for LifecycleRow {
    fn header() -> Vec<String> {
        to_strings(&[
            "Case_ID",
            "Created_At",
            "Closed_At",
            "Total_Hours",
            "Priority",
            "Category",
        ])
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.case_id.clone(),
            self.created_at.clone(),
            self.closed_at.clone(),
            self.total_hours.to_string(),
            self.priority.clone(),
            self.category.clone(),
        ]
    }
}

impl CsvRow for ResolutionRow {
    fn header() -> Vec<String> {
        to_strings(&[
            "Priority",
            "Category",
            "Avg_Resolution_Hours",
            "Median_Hours",
            "Ticket_Count",
        ])
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.priority.clone(),
            self.category.clone(),
            self.avg_resolution_hours.to_string(),
            self.median_hours.to_string(),
            self.ticket_count.to_string(),
        ]
    }
}

impl CsvRow for BottleneckRow {
    fn header() -> Vec<String> {
        to_strings(&["Stage", "Avg_Hours", "Count", "Severity"])
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.stage.clone(),
            self.avg_hours.to_string(),
            self.count.to_string(),
            self.severity.to_string(),
        ]
    }
}

impl CsvRow for RecommendationRow {
    fn header() -> Vec<String> {
        to_strings(&["Issue", "Action", "Expected_Impact"])
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.issue.clone(),
            self.action.clone(),
            self.expected_impact.clone(),
        ]
    }
}

impl CsvRow for ImpactRow {
    fn header() -> Vec<String> {
        to_strings(&[
            "Selected_Stages",
            "Total_Bottleneck_Hours",
            "Reduction_Fraction",
            "Hours_Saved_Per_Ticket",
            "Tickets_Per_Year",
            "Annual_Hours_Saved",
            "FTE_Equivalency",
            "Hourly_Cost",
            "Annual_Cost_Savings",
        ])
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.selected_stages.clone(),
            self.total_bottleneck_hours.to_string(),
            self.reduction_fraction.to_string(),
            self.hours_saved_per_ticket.to_string(),
            self.tickets_per_year.to_string(),
            self.annual_hours_saved.to_string(),
            self.fte_equivalency.to_string(),
            self.hourly_cost.to_string(),
            self.annual_cost_savings.to_string(),
        ]
    }
}

impl CsvRow for AgentRow {
    fn header() -> Vec<String> {
        to_strings(&["Agent", "Case_Count", "Avg_Hours", "Median_Hours", "Std_Hours"])
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.agent.clone(),
            self.case_count.to_string(),
            self.avg_hours.to_string(),
            self.median_hours.to_string(),
            opt(self.std_hours),
        ]
    }
}

impl CsvRow for CategoryRow {
    fn header() -> Vec<String> {
        to_strings(&["Category", "Avg_Resolution_Hours", "Ticket_Count"])
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.category.clone(),
            self.avg_resolution_hours.to_string(),
            self.ticket_count.to_string(),
        ]
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Report exporter
pub struct ReportExporter;

impl ReportExporter {
    /// Render every table of the report plus the full `report.json`
    pub fn render(report: &AnalysisReport, format: ExportFormat) -> AnalyticsResult<Vec<Artifact>> {
        let impact: Vec<ImpactRow> = report.impact_row().into_iter().collect();

        let mut artifacts = vec![
            Self::table("stage_summary", format, &report.stage_rows())?,
            Self::table("ticket_lifecycles", format, &report.lifecycle_rows())?,
            Self::table("resolution_summary", format, &report.resolution_rows())?,
            Self::table("impact_summary", format, &impact)?,
            Self::table("recommendations", format, &report.recommendation_rows())?,
            Self::table("bottlenecks", format, &report.bottleneck_rows())?,
            Self::table("agent_summary", format, &report.agent_rows())?,
            Self::table("category_resolution", format, &report.category_rows())?,
            Artifact::new("priority_pivot", format, Self::pivot(report, format)?),
        ];

        let json = serde_json::to_vec_pretty(report).map_err(|e| {
            AnalyticsError::ExportFailed(format!("JSON serialization failed: {}", e))
        })?;
        artifacts.push(Artifact::new("report", ExportFormat::Json, json));

        Ok(artifacts)
    }

    /// Write rendered artifacts into `dir`, creating it if needed
    pub async fn write_all(artifacts: &[Artifact], dir: &Path) -> AnalyticsResult<Vec<PathBuf>> {
        fs::create_dir_all(dir).await.map_err(|e| {
            AnalyticsError::ExportFailed(format!("Failed to create {}: {}", dir.display(), e))
        })?;

        let mut written = Vec::with_capacity(artifacts.len());
        for artifact in artifacts {
            let path = dir.join(&artifact.file_name);
            fs::write(&path, &artifact.bytes).await.map_err(|e| {
                AnalyticsError::ExportFailed(format!("Failed to write {}: {}", path.display(), e))
            })?;
            written.push(path);
        }
        Ok(written)
    }

    fn table<R: CsvRow + Serialize>(
        name: &str,
        format: ExportFormat,
        rows: &[R],
    ) -> AnalyticsResult<Artifact> {
        let bytes = match format {
            ExportFormat::Csv => {
                let mut out = Self::csv_line(&R::header());
                for row in rows {
                    out.push_str(&Self::csv_line(&row.fields()));
                }
                out.into_bytes()
            }
            ExportFormat::Json => serde_json::to_vec_pretty(rows).map_err(|e| {
                AnalyticsError::ExportFailed(format!("{} serialization failed: {}", name, e))
            })?,
        };
        Ok(Artifact::new(name, format, bytes))
    }

    /// Stage x priority pivot; CSV columns follow the pivot's priority order
    fn pivot(report: &AnalysisReport, format: ExportFormat) -> AnalyticsResult<Vec<u8>> {
        let pivot = &report.priority_pivot;
        match format {
            ExportFormat::Csv => {
                let mut header = vec!["Stage".to_string()];
                header.extend(pivot.priorities.iter().map(|p| p.to_string()));
                let mut out = Self::csv_line(&header);
                for row in &pivot.rows {
                    let mut fields = vec![row.stage.clone()];
                    fields.extend(row.mean_hours.iter().map(|h| round2(*h).to_string()));
                    out.push_str(&Self::csv_line(&fields));
                }
                Ok(out.into_bytes())
            }
            ExportFormat::Json => {
                let rows: Vec<serde_json::Value> = pivot
                    .rows
                    .iter()
                    .map(|row| {
                        let mut object = serde_json::Map::new();
                        object.insert("Stage".to_string(), row.stage.clone().into());
                        for (priority, hours) in pivot.priorities.iter().zip(&row.mean_hours) {
                            object.insert(priority.to_string(), round2(*hours).into());
                        }
                        serde_json::Value::Object(object)
                    })
                    .collect();
                serde_json::to_vec_pretty(&rows).map_err(|e| {
                    AnalyticsError::ExportFailed(format!("priority_pivot serialization failed: {}", e))
                })
            }
        }
    }

    fn csv_line(fields: &[String]) -> String {
        let mut line = fields
            .iter()
            .map(|f| Self::escape_csv(f))
            .collect::<Vec<_>>()
            .join(",");
        line.push('\n');
        line
    }

    /// Quote a field when it contains a delimiter, quote or line break
    pub fn escape_csv(s: &str) -> String {
        if s.contains([',', '"', '\n', '\r']) {
            format!("\"{}\"", s.replace('"', "\"\""))
        } else {
            s.to_string()
        }
    }
}
