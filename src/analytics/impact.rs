//! Savings projection from reducing the slowest stages

use crate::analytics::aggregation::StageAggregate;
use crate::analytics::error::{AnalyticsError, AnalyticsResult};
use crate::analytics::statistics::descending_then;
use serde::{Deserialize, Serialize};

/// Standard annual working hours of one full-time employee (52 weeks x 40 h)
pub const HOURS_PER_FTE_YEAR: f64 = 2080.0;

/// Inputs to the savings model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactParameters {
    /// Fraction of bottleneck time removed, in `[0, 1]`
    #[serde(default = "default_reduction_fraction")]
    pub reduction_fraction: f64,

    /// Expected ticket volume per year
    #[serde(default = "default_tickets_per_year")]
    pub tickets_per_year: u64,

    /// Loaded cost per hour (staff + overhead)
    #[serde(default = "default_hourly_cost")]
    pub hourly_cost: f64,

    /// Number of slowest stages targeted
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for ImpactParameters {
    fn default() -> Self {
        Self {
            reduction_fraction: default_reduction_fraction(),
            tickets_per_year: default_tickets_per_year(),
            hourly_cost: default_hourly_cost(),
            top_n: default_top_n(),
        }
    }
}

impl ImpactParameters {
    pub fn validate(&self) -> AnalyticsResult<()> {
        if !self.reduction_fraction.is_finite() || !(0.0..=1.0).contains(&self.reduction_fraction)
        {
            return Err(AnalyticsError::Configuration(format!(
                "reduction_fraction must be in [0, 1], got {}",
                self.reduction_fraction
            )));
        }

        if self.top_n == 0 {
            return Err(AnalyticsError::Configuration(
                "top_n must be at least 1".to_string(),
            ));
        }

        if !self.hourly_cost.is_finite() || self.hourly_cost < 0.0 {
            return Err(AnalyticsError::Configuration(format!(
                "hourly_cost must be a non-negative number, got {}",
                self.hourly_cost
            )));
        }

        Ok(())
    }
}

/// Projected annual effect of the reduction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactProjection {
    /// Targeted stages, slowest first
    pub selected_stages: Vec<String>,
    pub total_bottleneck_hours_per_ticket: f64,
    pub reduction_fraction: f64,
    pub hours_saved_per_ticket: f64,
    pub tickets_per_year: u64,
    pub annual_hours_saved: f64,
    pub fte_equivalency: f64,
    pub hourly_cost: f64,
    pub annual_cost_savings: f64,
}

/// Project savings from the `top_n` stages with the highest mean duration.
///
/// Uses every stage when fewer than `top_n` exist. Fails with
/// `InsufficientData` on an empty stage set.
pub fn project_impact(
    aggregates: &[StageAggregate],
    params: &ImpactParameters,
) -> AnalyticsResult<ImpactProjection> {
    params.validate()?;

    if aggregates.is_empty() {
        return Err(AnalyticsError::InsufficientData(
            "no stages available for impact projection".to_string(),
        ));
    }

    let mut ranked: Vec<&StageAggregate> = aggregates.iter().collect();
    ranked.sort_by(|a, b| descending_then((a.mean_hours, &a.stage), (b.mean_hours, &b.stage)));
    ranked.truncate(params.top_n);

    let total_bottleneck_hours_per_ticket: f64 = ranked.iter().map(|a| a.mean_hours).sum();
    let hours_saved_per_ticket = total_bottleneck_hours_per_ticket * params.reduction_fraction;
    let annual_hours_saved = hours_saved_per_ticket * params.tickets_per_year as f64;

    Ok(ImpactProjection {
        selected_stages: ranked.iter().map(|a| a.stage.clone()).collect(),
        total_bottleneck_hours_per_ticket,
        reduction_fraction: params.reduction_fraction,
        hours_saved_per_ticket,
        tickets_per_year: params.tickets_per_year,
        annual_hours_saved,
        fte_equivalency: annual_hours_saved / HOURS_PER_FTE_YEAR,
        hourly_cost: params.hourly_cost,
        annual_cost_savings: annual_hours_saved * params.hourly_cost,
    })
}

fn default_reduction_fraction() -> f64 {
    0.30
}

fn default_tickets_per_year() -> u64 {
    500
}

fn default_hourly_cost() -> f64 {
    30.0
}

fn default_top_n() -> usize {
    2
}
