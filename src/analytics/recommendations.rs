//! Improvement recommendations driven by flagged bottlenecks

use crate::analytics::severity::Bottleneck;
use serde::{Deserialize, Serialize};

/// A recommendation template.
///
/// Rules with a `stage` fire only when that stage is a reported bottleneck;
/// rules without one always fire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRule {
    #[serde(default)]
    pub stage: Option<String>,
    pub issue: String,
    pub action: String,
    pub expected_impact: String,
}

impl RecommendationRule {
    pub fn new(
        issue: impl Into<String>,
        action: impl Into<String>,
        expected_impact: impl Into<String>,
    ) -> Self {
        Self {
            stage: None,
            issue: issue.into(),
            action: action.into(),
            expected_impact: expected_impact.into(),
        }
    }

    pub fn for_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub issue: String,
    pub action: String,
    pub expected_impact: String,
    /// Bottleneck stage that triggered the rule, if any
    pub trigger_stage: Option<String>,
}

/// Rules for a typical helpdesk lifecycle
pub fn default_rules() -> Vec<RecommendationRule> {
    vec![
        RecommendationRule::new(
            "Long wait times for customer responses",
            "Implement automated reminder system for tickets waiting >48 hours",
            "20-30% reduction in customer response wait time",
        )
        .for_stage("Investigation Started"),
        RecommendationRule::new(
            "Delays in customer verification of solutions",
            "Create self-service verification portal with auto-close after 72 hours",
            "25% reduction in verification cycle time",
        )
        .for_stage("Solution Implemented"),
        RecommendationRule::new(
            "Critical priority tickets experiencing same delays as low priority",
            "Dedicate resources for critical/high priority tickets with <4 hour SLA",
            "40% improvement in critical ticket resolution time",
        ),
        RecommendationRule::new(
            "Repetitive investigation work for similar issues",
            "Build searchable knowledge base with solution templates",
            "15-20% reduction in investigation time",
        ),
    ]
}

/// Evaluate rules in order against the reported bottlenecks
pub fn generate_recommendations(
    bottlenecks: &[Bottleneck],
    rules: &[RecommendationRule],
) -> Vec<Recommendation> {
    rules
        .iter()
        .filter(|rule| match rule.stage {
            Some(ref stage) => bottlenecks.iter().any(|b| &b.stage == stage),
            None => true,
        })
        .map(|rule| Recommendation {
            issue: rule.issue.clone(),
            action: rule.action.clone(),
            expected_impact: rule.expected_impact.clone(),
            trigger_stage: rule.stage.clone(),
        })
        .collect()
}
