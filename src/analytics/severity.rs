//! Bottleneck severity classification
//!
//! Two threshold tables exist for helpdesk bottleneck reporting and they
//! disagree on the inclusion floor, so neither is a default: callers choose a
//! [`SeverityPreset`] explicitly.

use crate::analytics::aggregation::StageAggregate;
use crate::analytics::error::{AnalyticsError, AnalyticsResult};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Severity tier of a stage, ordered from least to most severe
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
    Display,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Severity {
    Normal,
    Moderate,
    High,
    Critical,
}

/// Named threshold tables
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, EnumIter, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SeverityPreset {
    /// 40 / 20 / 10 tiers, stages above 10h are reported
    Standard,
    /// Same tiers, stages above 5h are reported (some as NORMAL)
    Extended,
    /// 40 / 30 / 20 tiers, stages above 20h are reported
    Baseline,
}

impl SeverityPreset {
    pub fn thresholds(&self) -> SeverityThresholds {
        SeverityThresholds::preset(*self)
    }
}

/// Upper-exclusive hour boundaries for each tier plus the reporting floor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeverityThresholds {
    /// Mean hours strictly above this are CRITICAL
    pub critical_above: f64,
    /// Mean hours strictly above this are at least HIGH
    pub high_above: f64,
    /// Mean hours strictly above this are at least MODERATE
    pub moderate_above: f64,
    /// Stages at or below this are left out of bottleneck reporting
    pub inclusion_floor: f64,
}

impl SeverityThresholds {
    pub fn preset(preset: SeverityPreset) -> Self {
        match preset {
            SeverityPreset::Standard => Self {
                critical_above: 40.0,
                high_above: 20.0,
                moderate_above: 10.0,
                inclusion_floor: 10.0,
            },
            SeverityPreset::Extended => Self {
                critical_above: 40.0,
                high_above: 20.0,
                moderate_above: 10.0,
                inclusion_floor: 5.0,
            },
            SeverityPreset::Baseline => Self {
                critical_above: 40.0,
                high_above: 30.0,
                moderate_above: 20.0,
                inclusion_floor: 20.0,
            },
        }
    }

    /// Reject tables that would make classification non-monotonic
    pub fn validate(&self) -> AnalyticsResult<()> {
        let values = [
            self.inclusion_floor,
            self.moderate_above,
            self.high_above,
            self.critical_above,
        ];
        if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(AnalyticsError::Configuration(
                "severity thresholds must be finite and non-negative".to_string(),
            ));
        }
        if !(self.moderate_above < self.high_above && self.high_above < self.critical_above) {
            return Err(AnalyticsError::Configuration(format!(
                "severity thresholds must ascend (moderate {} < high {} < critical {})",
                self.moderate_above, self.high_above, self.critical_above
            )));
        }
        Ok(())
    }

    /// Map a mean stage duration to its tier
    pub fn classify(&self, mean_hours: f64) -> Severity {
        if mean_hours > self.critical_above {
            Severity::Critical
        } else if mean_hours > self.high_above {
            Severity::High
        } else if mean_hours > self.moderate_above {
            Severity::Moderate
        } else {
            Severity::Normal
        }
    }

    /// Whether a stage belongs in bottleneck reporting at all
    pub fn includes(&self, mean_hours: f64) -> bool {
        mean_hours > self.inclusion_floor
    }
}

/// Classify against the standard 40 / 20 / 10 table
pub fn severity(mean_hours: f64) -> Severity {
    SeverityThresholds::preset(SeverityPreset::Standard).classify(mean_hours)
}

/// A stage flagged for bottleneck reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bottleneck {
    pub stage: String,
    pub mean_hours: f64,
    pub median_hours: f64,
    pub count: usize,
    pub severity: Severity,
}

/// Attach a severity tier to each aggregate
pub fn classify_all(aggregates: &mut [StageAggregate], thresholds: &SeverityThresholds) {
    for aggregate in aggregates.iter_mut() {
        aggregate.severity = Some(thresholds.classify(aggregate.mean_hours));
    }
}

/// Select stages above the inclusion floor, keeping the input order
pub fn identify_bottlenecks(
    aggregates: &[StageAggregate],
    thresholds: &SeverityThresholds,
) -> Vec<Bottleneck> {
    aggregates
        .iter()
        .filter(|a| thresholds.includes(a.mean_hours))
        .map(|a| Bottleneck {
            stage: a.stage.clone(),
            mean_hours: a.mean_hours,
            median_hours: a.median_hours,
            count: a.count,
            severity: thresholds.classify(a.mean_hours),
        })
        .collect()
}
