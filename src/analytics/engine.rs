//! Analysis engine: runs the full pipeline over one batch of events

use crate::analytics::aggregation::{
    aggregate_agents, aggregate_stages, AggregationOptions, DimensionFilter,
    DEFAULT_MIN_AGENT_CASES,
};
use crate::analytics::error::{AnalyticsError, AnalyticsResult};
use crate::analytics::impact::{project_impact, ImpactParameters};
use crate::analytics::lifecycle::{resolution_summary, summarize_lifecycles};
use crate::analytics::ordering::{order_events, parse_events};
use crate::analytics::recommendations::{
    default_rules, generate_recommendations, RecommendationRule,
};
use crate::analytics::reports::{AnalysisReport, Diagnostic};
use crate::analytics::segmentation::{category_resolution, priority_pivot};
use crate::analytics::severity::{
    classify_all, identify_bottlenecks, SeverityPreset, SeverityThresholds,
};
use crate::analytics::transitions::extract_all;
use crate::models::{Event, RawEvent};
use serde::{Deserialize, Serialize};

/// Configuration for the analytics engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Severity tiers and bottleneck inclusion floor
    pub thresholds: SeverityThresholds,

    /// Minimum transitions for a stage to be summarized
    pub min_stage_count: usize,

    /// Minimum distinct cases for an agent to be reported
    pub min_agent_cases: usize,

    /// Run grouping and aggregation on the rayon pool
    pub parallel: bool,

    /// Restrict the stage summary to matching transitions
    pub filter: DimensionFilter,

    pub impact: ImpactParameters,

    pub rules: Vec<RecommendationRule>,
}

impl AnalyticsConfig {
    /// Thresholds have no default; a preset has to be chosen
    pub fn new(preset: SeverityPreset) -> Self {
        Self {
            thresholds: preset.thresholds(),
            min_stage_count: 1,
            min_agent_cases: DEFAULT_MIN_AGENT_CASES,
            parallel: true,
            filter: DimensionFilter::default(),
            impact: ImpactParameters::default(),
            rules: default_rules(),
        }
    }

    pub fn with_thresholds(mut self, thresholds: SeverityThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_min_stage_count(mut self, min_stage_count: usize) -> Self {
        self.min_stage_count = min_stage_count;
        self
    }

    pub fn with_min_agent_cases(mut self, min_agent_cases: usize) -> Self {
        self.min_agent_cases = min_agent_cases;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_filter(mut self, filter: DimensionFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_impact(mut self, impact: ImpactParameters) -> Self {
        self.impact = impact;
        self
    }

    pub fn with_rules(mut self, rules: Vec<RecommendationRule>) -> Self {
        self.rules = rules;
        self
    }

    pub fn validate(&self) -> AnalyticsResult<()> {
        self.thresholds.validate()?;
        self.impact.validate()?;

        if self.min_stage_count == 0 {
            return Err(AnalyticsError::Configuration(
                "min_stage_count must be at least 1".to_string(),
            ));
        }
        if self.min_agent_cases == 0 {
            return Err(AnalyticsError::Configuration(
                "min_agent_cases must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Main analytics engine
#[derive(Debug, Clone)]
pub struct AnalyticsEngine {
    config: AnalyticsConfig,
}

impl AnalyticsEngine {
    /// Create an engine; invalid configuration is rejected here, never clamped
    pub fn new(config: AnalyticsConfig) -> AnalyticsResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Parse raw records, then analyze them
    pub fn analyze_raw(&self, raw: Vec<RawEvent>) -> AnalyticsResult<AnalysisReport> {
        let events = parse_events(raw)?;
        self.analyze(events)
    }

    /// Run every step over one batch.
    ///
    /// Malformed input fails the run. A step without enough data is recorded
    /// as a diagnostic and the remaining steps still run.
    pub fn analyze(&self, events: Vec<Event>) -> AnalyticsResult<AnalysisReport> {
        let span = tracing::info_span!("analyze", events = events.len());
        let _guard = span.enter();

        let event_count = events.len();
        let cases = order_events(events)?;
        let transitions = extract_all(&cases);

        tracing::info!(
            events = event_count,
            cases = cases.len(),
            transitions = transitions.len(),
            "Event log ordered"
        );

        let mut report = AnalysisReport::new(event_count, cases.len(), transitions.len());
        let parallel = self.config.parallel;

        let mut options = AggregationOptions::default()
            .with_filter(self.config.filter.clone())
            .with_min_count(self.config.min_stage_count);
        if !parallel {
            options = options.sequential();
        }

        let mut stages = recover(&mut report, "stage_summary", aggregate_stages(&transitions, &options))?
            .unwrap_or_default();
        classify_all(&mut stages, &self.config.thresholds);
        for stage in &stages {
            tracing::debug!(
                stage = %stage.stage,
                count = stage.count,
                mean_hours = stage.mean_hours,
                severity = ?stage.severity,
                "Stage aggregated"
            );
        }

        report.bottlenecks = identify_bottlenecks(&stages, &self.config.thresholds);
        report.priority_pivot = priority_pivot(&transitions, parallel);

        let lifecycles = summarize_lifecycles(&cases);
        report.resolution_summary =
            recover(&mut report, "resolution_summary", resolution_summary(&lifecycles, parallel))?
                .unwrap_or_default();
        report.category_resolution = category_resolution(&lifecycles);
        report.lifecycles = lifecycles;

        report.agent_summary = recover(
            &mut report,
            "agent_summary",
            aggregate_agents(&cases, self.config.min_agent_cases, parallel),
        )?
        .unwrap_or_default();

        report.impact = recover(&mut report, "impact", project_impact(&stages, &self.config.impact))?;
        report.recommendations = generate_recommendations(&report.bottlenecks, &self.config.rules);
        report.stage_summary = stages;

        tracing::info!(
            stages = report.stage_summary.len(),
            bottlenecks = report.bottlenecks.len(),
            diagnostics = report.diagnostics.len(),
            "✅ Analysis complete"
        );

        Ok(report)
    }
}

/// Turn a recoverable failure into a diagnostic; propagate the rest
fn recover<T>(
    report: &mut AnalysisReport,
    component: &str,
    result: AnalyticsResult<T>,
) -> AnalyticsResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_recoverable() => {
            tracing::warn!(component, error = %err, "Step skipped");
            report.add_diagnostic(Diagnostic::new(component, err.to_string()));
            Ok(None)
        }
        Err(err) => Err(err),
    }
}
