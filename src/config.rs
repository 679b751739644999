use crate::analytics::{
    default_rules, AnalyticsConfig, ExportFormat, ImpactParameters, RecommendationRule,
    SeverityPreset, DEFAULT_MIN_AGENT_CASES,
};
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an extra config file
pub const CONFIG_PATH_ENV: &str = "TICKETFLOW_CONFIG";

const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Analysis configuration
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Savings model parameters
    #[serde(default)]
    pub impact: ImpactParameters,

    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Recommendation rules
    #[serde(default)]
    pub recommendations: RecommendationsConfig,
}

impl Config {
    /// Load configuration from the embedded defaults, an optional file and
    /// the environment.
    ///
    /// `path` takes precedence over `TICKETFLOW_CONFIG`; either one must exist
    /// when given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));

        let mut builder = config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                DEFAULT_CONFIG,
                config::FileFormat::Toml,
            ));

        if let Some(file) = file {
            builder = builder.add_source(config::File::from(file).required(true));
        }

        let config: Config = builder
            // Override with environment variables (prefix: TICKETFLOW_)
            .add_source(
                config::Environment::with_prefix("TICKETFLOW")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Layer a TOML document over the defaults, ignoring the environment
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(
                DEFAULT_CONFIG,
                config::FileFormat::Toml,
            ))
            .add_source(config::File::from_str(content, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Reject out-of-range values instead of clamping them
    pub fn validate(&self) -> Result<()> {
        self.impact.validate()?;

        if self.analysis.min_stage_count == 0 {
            return Err(AppError::Configuration(
                "analysis.min_stage_count must be at least 1".to_string(),
            ));
        }
        if self.analysis.min_agent_cases == 0 {
            return Err(AppError::Configuration(
                "analysis.min_agent_cases must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Rules in effect: the built-in table (if enabled) followed by custom rules
    pub fn rules(&self) -> Vec<RecommendationRule> {
        let mut rules = if self.recommendations.use_default_rules {
            default_rules()
        } else {
            Vec::new()
        };
        rules.extend(self.recommendations.rules.iter().cloned());
        rules
    }

    /// Build the engine configuration.
    ///
    /// `preset` overrides `analysis.severity_preset`; one of the two is required.
    pub fn to_analytics_config(&self, preset: Option<SeverityPreset>) -> Result<AnalyticsConfig> {
        let preset = preset.or(self.analysis.severity_preset).ok_or_else(|| {
            AppError::Configuration(
                "no severity preset selected (standard, extended or baseline)".to_string(),
            )
        })?;

        let config = AnalyticsConfig::new(preset)
            .with_min_stage_count(self.analysis.min_stage_count)
            .with_min_agent_cases(self.analysis.min_agent_cases)
            .with_parallel(self.analysis.parallel)
            .with_impact(self.impact)
            .with_rules(self.rules());
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Threshold table; has no default
    #[serde(default)]
    pub severity_preset: Option<SeverityPreset>,

    /// Minimum transitions per reported stage
    #[serde(default = "default_min_stage_count")]
    pub min_stage_count: usize,

    /// Minimum distinct cases per reported agent
    #[serde(default = "default_min_agent_cases")]
    pub min_agent_cases: usize,

    /// Aggregate on the rayon pool
    #[serde(default = "default_true")]
    pub parallel: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            severity_preset: None,
            min_stage_count: default_min_stage_count(),
            min_agent_cases: default_min_agent_cases(),
            parallel: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving the exported tables
    #[serde(default = "default_output_directory")]
    pub directory: PathBuf,

    #[serde(default)]
    pub format: ExportFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            format: ExportFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationsConfig {
    /// Include the built-in helpdesk rules
    #[serde(default = "default_true")]
    pub use_default_rules: bool,

    /// Extra rules, evaluated after the built-in ones
    #[serde(default)]
    pub rules: Vec<RecommendationRule>,
}

impl Default for RecommendationsConfig {
    fn default() -> Self {
        Self {
            use_default_rules: true,
            rules: Vec::new(),
        }
    }
}

fn default_min_stage_count() -> usize {
    1
}

fn default_min_agent_cases() -> usize {
    DEFAULT_MIN_AGENT_CASES
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("output")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}
