//! Presentation of coordinated results.
//!
//! [`format_response`] flattens a [`crate::coordinator::CoordinatedResult`]
//! into the shape API consumers read, [`build_report_text`] renders it for a
//! terminal, and [`ReportGenerator`] writes the full report to disk.
//!
//! # Example
//!
//! ```rust,ignore
//! use analytics_autodetect::reporting::{AnalysisReport, ReportGenerator, format_response};
//!
//! let response = format_response(&result);
//! println!("{}", serde_json::to_string_pretty(&response)?);
//!
//! let generator = ReportGenerator::new(PathBuf::from("output"));
//! generator.write_report_to_file(&AnalysisReport::new("survey.csv", result), "survey")?;
//! ```

mod generator;

pub use generator::{
    AnalysisReport, AnalysisResponse, DataOverview, ErrorResponse, ModuleRecommendations,
    ReportGenerator, build_report_text, format_response,
};
