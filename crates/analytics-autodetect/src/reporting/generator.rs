use crate::coordinator::{CoordinatedResult, ModuleOutcome, SequenceStep};
use crate::error::{AnalysisError, Result};
use crate::quality::QualityGrade;
use crate::types::{AnalysisModule, Recommendation, SampleSizeCategory, SemanticType};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

// ============================================================================
// API response types
// ============================================================================

/// Headline facts about the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataOverview {
    pub n_observations: usize,
    pub n_variables: usize,
    pub type_counts: BTreeMap<SemanticType, usize>,
    pub completeness_score: f64,
    pub missing_percentage: f64,
    pub sample_size_category: SampleSizeCategory,
}

/// Recommendations of one module as shown to API consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleRecommendations {
    pub display_name: String,
    pub primary: Vec<Recommendation>,
    pub secondary: Vec<Recommendation>,
    /// Set when the module failed; the lists are then empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Flattened, presentation-ready view of a [`CoordinatedResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub data_overview: DataOverview,
    pub quality_grade: QualityGrade,
    pub quality_score: f64,
    pub modules_used: Vec<AnalysisModule>,
    pub recommendations: BTreeMap<AnalysisModule, ModuleRecommendations>,
    pub immediate_actions: Vec<String>,
    pub analysis_sequence: Vec<SequenceStep>,
    /// Plain-text rendering of the whole result.
    pub report: String,
}

/// Body returned for requests that fail with an input error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl From<&AnalysisError> for ErrorResponse {
    fn from(error: &AnalysisError) -> Self {
        Self {
            error: error.to_string(),
            code: error.error_code().to_string(),
        }
    }
}

/// Report written to disk by `--emit-report`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Timestamp when the report was generated
    pub generated_at: String,
    /// Path to the input file
    pub input_file: String,
    pub response: AnalysisResponse,
    pub result: CoordinatedResult,
}

impl AnalysisReport {
    pub fn new(input_file: impl Into<String>, result: CoordinatedResult) -> Self {
        Self {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            input_file: input_file.into(),
            response: format_response(&result),
            result,
        }
    }
}

// ============================================================================
// Formatting
// ============================================================================

/// Build the API response for a coordinated result.
pub fn format_response(result: &CoordinatedResult) -> AnalysisResponse {
    let c = &result.data_characteristics;
    let quality = &result.cross_module_insights.data_quality_summary;

    let recommendations = result
        .module_results
        .iter()
        .map(|(module, outcome)| {
            let entry = match outcome {
                ModuleOutcome::Completed(set) => ModuleRecommendations {
                    display_name: module.display_name().to_string(),
                    primary: set.primary_recommendations.clone(),
                    secondary: set.secondary_recommendations.clone(),
                    error: None,
                },
                ModuleOutcome::Failed { error } => ModuleRecommendations {
                    display_name: module.display_name().to_string(),
                    primary: Vec::new(),
                    secondary: Vec::new(),
                    error: Some(error.clone()),
                },
            };
            (*module, entry)
        })
        .collect();

    AnalysisResponse {
        data_overview: DataOverview {
            n_observations: c.n_observations,
            n_variables: c.n_variables,
            type_counts: c.type_counts.clone(),
            completeness_score: c.completeness_score,
            missing_percentage: c.missing_percentage,
            sample_size_category: c.sample_size_category,
        },
        quality_grade: quality.grade,
        quality_score: quality.overall_score,
        modules_used: result.modules_used.iter().copied().collect(),
        recommendations,
        immediate_actions: result.unified_recommendations.immediate_actions.clone(),
        analysis_sequence: result.unified_recommendations.analysis_sequence.clone(),
        report: build_report_text(result),
    }
}

fn push_recommendations(lines: &mut Vec<String>, label: &str, recs: &[Recommendation]) {
    if recs.is_empty() {
        return;
    }
    lines.push(format!("  {}:", label));
    lines.extend(
        recs.iter()
            .map(|r| format!("    - {} ({:.2}): {}", r.method, r.score, r.rationale)),
    );
}

/// Render a coordinated result as a plain-text report.
pub fn build_report_text(result: &CoordinatedResult) -> String {
    let c = &result.data_characteristics;
    let quality = &result.cross_module_insights.data_quality_summary;
    let unified = &result.unified_recommendations;

    let mut lines = vec![
        "STATISTICAL ANALYSIS RECOMMENDATIONS".to_string(),
        "=".repeat(36),
        format!(
            "Dataset: {} observations x {} variables (sample size: {})",
            c.n_observations, c.n_variables, c.sample_size_category
        ),
    ];
    let types: Vec<String> = c
        .type_counts
        .iter()
        .map(|(t, n)| format!("{} {}", n, t))
        .collect();
    if !types.is_empty() {
        lines.push(format!("Variable types: {}", types.join(", ")));
    }
    lines.push(format!(
        "Data quality: {} ({:.2}/100), {:.2}% missing, {} duplicate row(s)",
        quality.grade, quality.overall_score, quality.missing_percentage, quality.duplicate_rows
    ));

    if !unified.immediate_actions.is_empty() {
        lines.push(String::new());
        lines.push("Immediate actions:".to_string());
        lines.extend(unified.immediate_actions.iter().map(|a| format!("  - {}", a)));
    }

    for (module, outcome) in &result.module_results {
        lines.push(String::new());
        lines.push(module.display_name().to_string());
        match outcome {
            ModuleOutcome::Completed(set) if set.is_empty() => {
                lines.push("  No suitable methods".to_string());
            }
            ModuleOutcome::Completed(set) => {
                push_recommendations(&mut lines, "Primary", &set.primary_recommendations);
                push_recommendations(&mut lines, "Secondary", &set.secondary_recommendations);
                push_recommendations(&mut lines, "Optional", &set.optional_analyses);
            }
            ModuleOutcome::Failed { error } => {
                lines.push(format!("  Failed: {}", error));
            }
        }
    }

    if !unified.analysis_sequence.is_empty() {
        lines.push(String::new());
        lines.push("Suggested sequence:".to_string());
        lines.extend(
            unified
                .analysis_sequence
                .iter()
                .map(|s| format!("  {}. {} [{}]", s.step, s.method, s.module)),
        );
    }

    if !unified.integration_opportunities.is_empty() {
        lines.push(String::new());
        lines.push("Integration opportunities:".to_string());
        lines.extend(unified.integration_opportunities.iter().map(|o| format!("  - {}", o)));
    }

    lines.push(String::new());
    lines.push(format!(
        "Reporting strategy: {}",
        unified.reporting_strategy.primary_narrative
    ));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

// ============================================================================
// File output
// ============================================================================

/// Writes analysis reports to an output directory.
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    output_dir: PathBuf,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new(PathBuf::from("output"))
    }
}

impl ReportGenerator {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    /// Write `report` as pretty JSON to `<output_dir>/<base_name>_analysis.json`.
    pub fn write_report_to_file(
        &self,
        report: &AnalysisReport,
        base_name: &str,
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let report_path = self.output_dir.join(format!("{}_analysis.json", base_name));
        let mut file = File::create(&report_path)?;
        file.write_all(serde_json::to_string_pretty(report)?.as_bytes())?;

        info!("Report saved: {}", report_path.display());

        Ok(report_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::{AnalysisType, UnifiedCoordinator};
    use polars::prelude::*;

    fn small_frame() -> DataFrame {
        df! {
            "score" => [1.5, 2.5, 3.5, 4.5, 5.5, 6.5, 7.5, 8.5, 9.5, 10.5],
            "hours" => [3.0, 1.0, 4.0, 1.5, 5.0, 9.0, 2.0, 6.0, 5.5, 3.5],
        }
        .unwrap()
    }

    fn analyze(df: &DataFrame) -> CoordinatedResult {
        UnifiedCoordinator::new()
            .analyze_comprehensive_data(df, AnalysisType::Auto)
            .unwrap()
    }

    #[test]
    fn test_format_response_mirrors_result() {
        let result = analyze(&small_frame());
        let response = format_response(&result);

        assert_eq!(response.data_overview.n_observations, 10);
        assert_eq!(response.data_overview.n_variables, 2);
        assert_eq!(
            response.modules_used,
            result.modules_used.iter().copied().collect::<Vec<_>>()
        );
        assert_eq!(
            response.immediate_actions,
            result.unified_recommendations.immediate_actions
        );
        assert_eq!(response.quality_grade, QualityGrade::A);
        assert!(response.report.contains("10 observations x 2 variables"));
    }

    #[test]
    fn test_report_text_lists_warnings_and_sequence() {
        let result = analyze(&small_frame());
        let text = build_report_text(&result);
        assert!(text.contains("Immediate actions:"));
        assert!(text.contains("Small sample size (n=10)"));
        assert!(text.contains("Suggested sequence:"));
        assert!(text.contains("1. basic_statistics [descriptive]"));
    }

    #[test]
    fn test_report_text_layout() {
        let text = build_report_text(&analyze(&small_frame()));

        assert!(text.starts_with("STATISTICAL ANALYSIS RECOMMENDATIONS\n====="));
        assert!(text.contains("\n\nImmediate actions:\n  - "));
        assert!(text.contains("\n\nDescriptive Statistics\n  Primary:\n    - "));
        assert!(text.ends_with('\n'));
        let last = text.lines().last().unwrap();
        assert!(last.starts_with("Reporting strategy: Lead with"));
    }

    #[test]
    fn test_error_response_from_input_error() {
        let response = ErrorResponse::from(&AnalysisError::EmptyDataset);
        assert_eq!(response.code, "EMPTY_DATASET");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["error"], "Dataset has no columns to analyze");
    }

    #[test]
    fn test_failed_module_is_reported_with_error() {
        let mut result = analyze(&small_frame());
        result.module_results.insert(
            AnalysisModule::Qualitative,
            ModuleOutcome::Failed {
                error: "lexicon missing".to_string(),
            },
        );
        let response = format_response(&result);
        let entry = &response.recommendations[&AnalysisModule::Qualitative];
        assert_eq!(entry.error.as_deref(), Some("lexicon missing"));
        assert!(response.report.contains("Failed: lexicon missing"));
    }

    #[test]
    fn test_write_report_to_file() {
        let dir = std::env::temp_dir().join(format!("autodetect_report_{}", std::process::id()));
        let generator = ReportGenerator::new(dir.clone());
        let report = AnalysisReport::new("scores.csv", analyze(&small_frame()));

        let path = generator.write_report_to_file(&report, "scores").unwrap();
        assert!(path.ends_with("scores_analysis.json"));

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["input_file"], "scores.csv");
        assert!(written["generated_at"].is_string());
        assert_eq!(written["response"]["data_overview"]["n_observations"], 10);

        let _ = fs::remove_dir_all(dir);
    }
}
