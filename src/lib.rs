//! Ticket lifecycle bottleneck analytics.
//!
//! [`analytics`] holds the engine; [`ingest`] reads event logs, [`config`]
//! loads layered settings and [`error`] defines the application error type.

pub mod analytics;
pub mod config;
pub mod error;
pub mod ingest;
pub mod models;

pub use analytics::{AnalysisReport, AnalyticsConfig, AnalyticsEngine, SeverityPreset};
pub use config::Config;
pub use error::{AppError, Result};
