//! End-to-end tests for the analytics engine

mod common;

use common::{assert_close, helpdesk_log, TicketBuilder};
use ticketflow::analytics::*;
use ticketflow::models::Priority;

fn engine(preset: SeverityPreset) -> AnalyticsEngine {
    AnalyticsEngine::new(AnalyticsConfig::new(preset)).unwrap()
}

#[test]
fn test_stage_summary_ordering_and_statistics() {
    let report = engine(SeverityPreset::Standard).analyze(helpdesk_log()).unwrap();

    assert_eq!(report.event_count, 13);
    assert_eq!(report.case_count, 3);
    assert_eq!(report.transition_count, 10);

    let stages: Vec<&str> = report.stage_summary.iter().map(|s| s.stage.as_str()).collect();
    assert_eq!(
        stages,
        vec![
            "Investigation Started",
            "Solution Implemented",
            "Assigned",
            "Ticket Created",
            "Customer Verified"
        ]
    );

    let top = &report.stage_summary[0];
    assert_eq!(top.count, 2);
    assert_close(top.mean_hours, 44.3, 1e-9);
    assert_close(top.median_hours, 44.3, 1e-9);
    assert_close(top.stddev_hours.unwrap(), 0.424264, 1e-6);
    assert_eq!(top.severity, Some(Severity::Critical));
}

#[test]
fn test_reference_impact_projection() {
    let report = engine(SeverityPreset::Standard).analyze(helpdesk_log()).unwrap();
    let impact = report.impact.as_ref().unwrap();

    assert_eq!(
        impact.selected_stages,
        vec!["Investigation Started", "Solution Implemented"]
    );
    assert_close(impact.total_bottleneck_hours_per_ticket, 87.9, 1e-9);
    assert_close(impact.hours_saved_per_ticket, 26.37, 1e-9);
    assert_close(impact.annual_hours_saved, 13185.0, 1e-6);
    assert_close(impact.fte_equivalency, 6.34, 0.005);
    assert_close(impact.annual_cost_savings, 395550.0, 1e-4);

    let row = report.impact_row().unwrap();
    assert_eq!(row.annual_hours_saved, 13185.0);
    assert_eq!(row.fte_equivalency, 6.34);
}

#[test]
fn test_presets_change_bottleneck_set_not_stage_summary() {
    let mut log = helpdesk_log();
    log.extend(TicketBuilder::new("T-200").steps(&[("Escalated", 0.0), ("Closed", 25.0)]));

    let standard = engine(SeverityPreset::Standard).analyze(log.clone()).unwrap();
    let baseline = engine(SeverityPreset::Baseline).analyze(log.clone()).unwrap();
    let extended = engine(SeverityPreset::Extended).analyze(log).unwrap();

    assert_eq!(standard.stage_summary.len(), baseline.stage_summary.len());

    let escalated = |r: &AnalysisReport| {
        r.bottlenecks
            .iter()
            .find(|b| b.stage == "Escalated")
            .map(|b| b.severity)
    };
    assert_eq!(escalated(&standard), Some(Severity::High));
    assert_eq!(escalated(&baseline), Some(Severity::Moderate));
    assert_eq!(escalated(&extended), Some(Severity::High));

    // Extended reports stages above 5 h, standard only above 10 h
    assert_eq!(standard.bottlenecks.len(), 3);
    assert_eq!(extended.bottlenecks.len(), 3);
}

#[test]
fn test_resolution_summary_groups_by_priority_then_category() {
    let report = engine(SeverityPreset::Standard).analyze(helpdesk_log()).unwrap();

    let keys: Vec<(&str, &str)> = report
        .resolution_summary
        .iter()
        .map(|r| (r.priority.as_str(), r.category.as_str()))
        .collect();
    assert_eq!(
        keys,
        vec![("High", "Network"), ("Medium", "Access"), ("Low", "Software")]
    );
    assert_close(report.resolution_summary[0].avg_resolution_hours, 93.5, 1e-9);
    assert_eq!(report.resolution_summary[1].avg_resolution_hours, 0.0);

    assert_eq!(report.category_resolution[0].category, "Software");
}

#[test]
fn test_priority_pivot_fills_missing_cells() {
    let report = engine(SeverityPreset::Standard).analyze(helpdesk_log()).unwrap();
    let pivot = &report.priority_pivot;

    assert_eq!(pivot.priorities, vec![Priority::High, Priority::Low]);
    assert_close(
        pivot.get("Investigation Started", Priority::High).unwrap(),
        44.0,
        1e-9,
    );
    assert_close(
        pivot.get("Investigation Started", Priority::Low).unwrap(),
        44.6,
        1e-9,
    );
}

#[test]
fn test_agent_summary_respects_minimum_cases() {
    let default_run = engine(SeverityPreset::Standard).analyze(helpdesk_log()).unwrap();
    assert!(default_run.agent_summary.is_empty());
    assert!(default_run
        .diagnostics
        .iter()
        .any(|d| d.component == "agent_summary"));

    let config = AnalyticsConfig::new(SeverityPreset::Standard).with_min_agent_cases(1);
    let report = AnalyticsEngine::new(config).unwrap().analyze(helpdesk_log()).unwrap();
    let agents: Vec<&str> = report.agent_summary.iter().map(|a| a.agent.as_str()).collect();
    assert_eq!(agents, vec!["bob", "alice"]);
    assert_close(report.agent_summary[1].mean_hours, 93.5, 1e-9);
}

#[test]
fn test_filtered_stage_summary() {
    let config = AnalyticsConfig::new(SeverityPreset::Standard)
        .with_filter(DimensionFilter::new().with_priority(Priority::Low));
    let report = AnalyticsEngine::new(config).unwrap().analyze(helpdesk_log()).unwrap();

    assert!(report.stage_summary.iter().all(|s| s.count == 1));
    assert_close(report.stage_summary[0].mean_hours, 44.6, 1e-9);
    assert!(report.stage_summary[0].stddev_hours.is_none());
}

#[test]
fn test_recommendations_follow_bottlenecks() {
    let report = engine(SeverityPreset::Standard).analyze(helpdesk_log()).unwrap();
    let triggers: Vec<Option<&str>> = report
        .recommendations
        .iter()
        .map(|r| r.trigger_stage.as_deref())
        .collect();
    assert_eq!(
        triggers,
        vec![
            Some("Investigation Started"),
            Some("Solution Implemented"),
            None,
            None
        ]
    );
}

#[test]
fn test_empty_log_yields_diagnostics() {
    let report = engine(SeverityPreset::Standard).analyze(Vec::new()).unwrap();
    assert_eq!(report.case_count, 0);
    assert!(report.impact.is_none());
    assert!(report.recommendations.iter().all(|r| r.trigger_stage.is_none()));
    assert!(report.has_diagnostics());
}

#[test]
fn test_raw_and_typed_inputs_agree() {
    let csv = common::to_csv(&helpdesk_log());
    let raw = ticketflow::ingest::parse_csv(&csv).unwrap();

    let from_raw = engine(SeverityPreset::Standard).analyze_raw(raw).unwrap();
    let typed = engine(SeverityPreset::Standard).analyze(helpdesk_log()).unwrap();
    assert_eq!(from_raw.stage_summary.len(), typed.stage_summary.len());
    for (a, b) in from_raw.stage_summary.iter().zip(&typed.stage_summary) {
        assert_eq!(a.stage, b.stage);
        assert_eq!(a.count, b.count);
        assert_close(a.mean_hours, b.mean_hours, 1e-9);
    }
    assert_eq!(from_raw.resolution_summary.len(), typed.resolution_summary.len());
}

#[test]
fn test_csv_export_round_trip_through_filesystem() {
    let report = engine(SeverityPreset::Standard).analyze(helpdesk_log()).unwrap();
    let artifacts = ReportExporter::render(&report, ExportFormat::Csv).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let runtime = tokio::runtime::Runtime::new().unwrap();
    runtime
        .block_on(ReportExporter::write_all(&artifacts, dir.path()))
        .unwrap();

    let stage_csv = std::fs::read_to_string(dir.path().join("stage_summary.csv")).unwrap();
    let mut lines = stage_csv.lines();
    assert_eq!(
        lines.next(),
        Some("Stage,Avg_Hours,Median_Hours,Std_Hours,Count")
    );
    assert_eq!(
        lines.next(),
        Some("Investigation Started,44.3,44.3,0.42,2")
    );

    let impact_csv = std::fs::read_to_string(dir.path().join("impact_summary.csv")).unwrap();
    assert!(impact_csv.contains(",13185,6.34,30,395550"));
}

#[test]
fn test_ticket_lifecycle_table() {
    let report = engine(SeverityPreset::Standard).analyze(helpdesk_log()).unwrap();
    assert_eq!(report.lifecycles.len(), 3);

    let rows = report.lifecycle_rows();
    let row = |id: &str| rows.iter().find(|r| r.case_id == id).unwrap().clone();

    let opened_only = row("T-102");
    assert_eq!(opened_only.total_hours, 0.0);
    assert_eq!(opened_only.created_at, opened_only.closed_at);
    assert_eq!(opened_only.priority, "Medium");

    let resolved = row("T-100");
    assert_eq!(resolved.total_hours, 93.5);
    assert_eq!(resolved.category, "Network");

    let artifacts = ReportExporter::render(&report, ExportFormat::Csv).unwrap();
    let csv = artifacts
        .iter()
        .find(|a| a.file_name == "ticket_lifecycles.csv")
        .unwrap();
    let text = String::from_utf8(csv.bytes.clone()).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("Case_ID,Created_At,Closed_At,Total_Hours,Priority,Category")
    );
    assert!(text.lines().any(|l| l.starts_with("T-102,") && l.ends_with(",0,Medium,Access")));
    assert!(text.lines().any(|l| l.starts_with("T-100,") && l.ends_with(",93.5,High,Network")));

    let json = artifacts.iter().find(|a| a.file_name == "report.json").unwrap();
    let value: serde_json::Value = serde_json::from_slice(&json.bytes).unwrap();
    assert_eq!(value["lifecycles"].as_array().map(Vec::len), Some(3));
}

#[test]
fn test_console_summary_lists_recommendations_and_segments() {
    let report = engine(SeverityPreset::Standard).analyze(helpdesk_log()).unwrap();
    let text = report.summary().to_string();

    assert!(text.starts_with("Analyzed 13 events in 3 tickets (10 transitions)"));
    assert!(text.contains("Mean hours by stage and priority:"));
    assert!(text.contains("Resolution time by category:"));
    assert!(text.contains("Recommended actions:"));
    assert!(text.contains("  1. Long wait times for customer responses"));
    assert!(text.contains("  4. Repetitive investigation work for similar issues"));
    assert!(text.contains("note [agent_summary]"));
}
