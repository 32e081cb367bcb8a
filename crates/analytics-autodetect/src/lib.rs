//! Statistics Auto-Detection Library
//!
//! Inspects a tabular dataset and recommends which statistical analyses
//! suit it, built on Polars.
//!
//! # Overview
//!
//! - **Column classification**: every column gets a semantic type
//!   (continuous, discrete, categorical, binary, datetime, text, geographic,
//!   identifier) independent of its storage dtype
//! - **Profiling**: one immutable [`DataCharacteristics`] per dataset
//! - **Detection**: descriptive, inferential and qualitative detectors score
//!   static method catalogs with one shared scorer
//! - **Coordination**: module selection, failure isolation, cross-module
//!   insights and a merged analysis plan
//! - **Reporting**: API responses, plain-text reports and JSON report files
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use analytics_autodetect::{AnalysisType, UnifiedCoordinator, input, reporting};
//!
//! let df = input::load_csv("survey.csv")?;
//!
//! let coordinator = UnifiedCoordinator::builder().build()?;
//! let result = coordinator.analyze_comprehensive_data(&df, AnalysisType::Auto)?;
//!
//! for step in &result.unified_recommendations.analysis_sequence {
//!     println!("{}. {} ({})", step.step, step.method, step.module);
//! }
//!
//! let response = reporting::format_response(&result);
//! println!("{}", response.report);
//! ```
//!
//! # Goals and metadata
//!
//! ```rust,ignore
//! use analytics_autodetect::{AnalysisRequest, VariableMetadata};
//!
//! let metadata = vec![VariableMetadata::new("q7", "likert")];
//! let goals = vec!["compare satisfaction between departments".to_string()];
//!
//! let result = coordinator.analyze(
//!     AnalysisRequest::new(&df)
//!         .variable_metadata(&metadata)
//!         .goals(&goals),
//! )?;
//! ```
//!
//! Goals only annotate rationales and can enable the inferential module;
//! they never change scores.
//!
//! # Configuration
//!
//! ```rust,ignore
//! use analytics_autodetect::DetectionConfig;
//!
//! let config = DetectionConfig::builder()
//!     .confidence_cutoffs(0.45, 0.75)
//!     .missing_warning_threshold(10.0)
//!     .build()?;
//!
//! let coordinator = UnifiedCoordinator::builder().config(config).build()?;
//! ```

pub mod config;
pub mod coordinator;
pub mod detectors;
pub mod error;
pub mod input;
pub mod profiler;
pub mod quality;
pub mod reporting;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use config::{
    ClassifierConfig, ConfigValidationError, DetectionConfig, DetectionConfigBuilder,
    QualityWeights, SampleSizeThresholds, ScoringPolicy, TextThresholds, WarningThresholds,
};
pub use coordinator::{
    AnalysisRequest, AnalysisType, CoordinatedResult, CrossModuleInsights, ModuleOutcome,
    PatternConvergence, ReportingStrategy, SequenceStep, UnifiedCoordinator,
    UnifiedCoordinatorBuilder, UnifiedRecommendations,
};
pub use detectors::{
    AnalysisMethod, DescriptiveDetector, DescriptiveMethod, InferentialDetector,
    InferentialMethod, ModuleDetector, QualitativeDetector, QualitativeMethod, TextResources,
};
pub use error::{AnalysisError, Result as AnalysisResult, ResultExt};
pub use profiler::{DataProfiler, classify_column, classify_column_with};
pub use quality::{DataQualityAnalyzer, DataQualitySummary, QualityGrade};
pub use reporting::{
    AnalysisResponse, ErrorResponse, ReportGenerator, build_report_text, format_response,
};
pub use types::{
    AnalysisModule, Confidence, DataCharacteristics, MethodTier, Recommendation,
    RecommendationSet, SampleSizeCategory, SemanticType, VariableMetadata,
};
