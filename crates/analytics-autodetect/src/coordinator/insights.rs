use super::ModuleOutcome;
use crate::config::DetectionConfig;
use crate::detectors::{AnalysisMethod, DescriptiveMethod, InferentialMethod, QualitativeMethod};
use crate::quality::{DataQualityAnalyzer, DataQualitySummary};
use crate::types::{AnalysisModule, DataCharacteristics, Recommendation};
use crate::utils::round4;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Pairs of methods from different modules that look at the same thing.
const CONVERGENCE_TABLE: &[(AnalysisMethod, AnalysisMethod, &str)] = &[
    (
        AnalysisMethod::Descriptive(DescriptiveMethod::CorrelationAnalysis),
        AnalysisMethod::Inferential(InferentialMethod::CorrelationTest),
        "relationships between numeric variables",
    ),
    (
        AnalysisMethod::Descriptive(DescriptiveMethod::DistributionAnalysis),
        AnalysisMethod::Inferential(InferentialMethod::NormalityTests),
        "the distribution of numeric variables",
    ),
    (
        AnalysisMethod::Descriptive(DescriptiveMethod::CrossTabulation),
        AnalysisMethod::Inferential(InferentialMethod::ChiSquareTest),
        "associations between categorical variables",
    ),
    (
        AnalysisMethod::Descriptive(DescriptiveMethod::OutlierDetection),
        AnalysisMethod::Inferential(InferentialMethod::NonparametricTests),
        "the influence of outliers and skew",
    ),
    (
        AnalysisMethod::Descriptive(DescriptiveMethod::CategoricalAnalysis),
        AnalysisMethod::Inferential(InferentialMethod::Anova),
        "differences between groups",
    ),
    (
        AnalysisMethod::Descriptive(DescriptiveMethod::BasicStatistics),
        AnalysisMethod::Qualitative(QualitativeMethod::TextStatistics),
        "the overall response profile",
    ),
    (
        AnalysisMethod::Descriptive(DescriptiveMethod::CategoricalAnalysis),
        AnalysisMethod::Qualitative(QualitativeMethod::ContentAnalysis),
        "how responses differ across groups",
    ),
    (
        AnalysisMethod::Inferential(InferentialMethod::ChiSquareTest),
        AnalysisMethod::Qualitative(QualitativeMethod::ContentAnalysis),
        "how response content depends on group membership",
    ),
];

/// Two recommended methods from different modules that corroborate each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternConvergence {
    /// What both methods examine.
    pub pattern: String,
    pub methods: Vec<String>,
    pub modules: Vec<AnalysisModule>,
    /// Variables both methods touch; for a frame-wide method, the other
    /// method's variables.
    pub shared_variables: Vec<String>,
    pub mean_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossModuleInsights {
    pub data_quality_summary: DataQualitySummary,
    pub pattern_convergence: Vec<PatternConvergence>,
}

pub(super) fn build_insights(
    characteristics: &DataCharacteristics,
    module_results: &BTreeMap<AnalysisModule, ModuleOutcome>,
    config: &DetectionConfig,
) -> CrossModuleInsights {
    CrossModuleInsights {
        data_quality_summary: DataQualityAnalyzer::summarize(characteristics, &config.quality),
        pattern_convergence: pattern_convergence(module_results),
    }
}

fn find_recommendation<'a>(
    module_results: &'a BTreeMap<AnalysisModule, ModuleOutcome>,
    method: AnalysisMethod,
) -> Option<&'a Recommendation> {
    module_results
        .get(&method.module())?
        .recommendations()?
        .find(method.as_str())
}

fn shared_variables(a: &[String], b: &[String]) -> Option<Vec<String>> {
    match (a.is_empty(), b.is_empty()) {
        (true, _) => Some(b.to_vec()),
        (_, true) => Some(a.to_vec()),
        _ => {
            let shared: Vec<String> = a.iter().filter(|v| b.contains(v)).cloned().collect();
            (!shared.is_empty()).then_some(shared)
        }
    }
}

fn pattern_convergence(
    module_results: &BTreeMap<AnalysisModule, ModuleOutcome>,
) -> Vec<PatternConvergence> {
    CONVERGENCE_TABLE
        .iter()
        .filter_map(|(first, second, pattern)| {
            let a = find_recommendation(module_results, *first)?;
            let b = find_recommendation(module_results, *second)?;
            let shared = shared_variables(&a.required_variables, &b.required_variables)?;
            debug!("Convergence: {} + {} on {}", a.method, b.method, pattern);
            Some(PatternConvergence {
                pattern: pattern.to_string(),
                methods: vec![a.method.clone(), b.method.clone()],
                modules: vec![a.module, b.module],
                shared_variables: shared,
                mean_score: round4((a.score + b.score) / 2.0),
            })
        })
        .collect()
}
