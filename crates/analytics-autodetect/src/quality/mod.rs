//! Data quality assessment.
//!
//! This module turns the dataset profile into the warnings every detector
//! attaches to its recommendations and into the quality summary reported
//! by the coordinator.

mod analyzer;

pub use analyzer::{DataQualityAnalyzer, DataQualitySummary, QualityGrade};
