//! Unified coordinator.
//!
//! Profiles a frame once, decides which analysis modules apply, runs their
//! detectors in isolation and merges the results into a single
//! [`CoordinatedResult`].
//!
//! # Example
//!
//! ```rust,ignore
//! use analytics_autodetect::{AnalysisRequest, AnalysisType, UnifiedCoordinator};
//!
//! let coordinator = UnifiedCoordinator::builder().build()?;
//! let result = coordinator.analyze_comprehensive_data(&df, AnalysisType::Auto)?;
//!
//! let goals = vec!["compare satisfaction by department".to_string()];
//! let request = AnalysisRequest::new(&df).goals(&goals);
//! let result = coordinator.analyze(request)?;
//! ```

mod insights;
mod synthesis;

pub use insights::{CrossModuleInsights, PatternConvergence};
pub use synthesis::{ReportingStrategy, SequenceStep, UnifiedRecommendations};

use crate::config::{ConfigValidationError, DetectionConfig};
use crate::detectors::{
    DescriptiveDetector, InferentialDetector, ModuleDetector, QualitativeDetector, TextResources,
};
use crate::error::{AnalysisError, Result};
use crate::profiler::DataProfiler;
use crate::types::{AnalysisModule, DataCharacteristics, RecommendationSet, VariableMetadata};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Goal words that make a group comparison worth testing even when the
/// column mix alone would not select the inferential module.
const COMPARISON_KEYWORDS: &[&str] = &[
    "compare",
    "group",
    "difference",
    "relationship",
    "effect",
    "test",
];

/// Which modules a request should run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    /// Select modules from the data profile and goals.
    #[default]
    Auto,
    /// Run every module regardless of the data.
    Comprehensive,
    Descriptive,
    Inferential,
    Qualitative,
}

impl AnalysisType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Comprehensive => "comprehensive",
            Self::Descriptive => "descriptive",
            Self::Inferential => "inferential",
            Self::Qualitative => "qualitative",
        }
    }

    /// The single module this type is restricted to, if any.
    fn single_module(&self) -> Option<AnalysisModule> {
        match self {
            Self::Descriptive => Some(AnalysisModule::Descriptive),
            Self::Inferential => Some(AnalysisModule::Inferential),
            Self::Qualitative => Some(AnalysisModule::Qualitative),
            Self::Auto | Self::Comprehensive => None,
        }
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisType {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "comprehensive" => Ok(Self::Comprehensive),
            "descriptive" => Ok(Self::Descriptive),
            "inferential" => Ok(Self::Inferential),
            "qualitative" => Ok(Self::Qualitative),
            _ => Err(AnalysisError::UnknownAnalysisType(s.to_string())),
        }
    }
}

/// One analysis request.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisRequest<'a> {
    pub data: &'a DataFrame,
    pub analysis_type: AnalysisType,
    pub variable_metadata: Option<&'a [VariableMetadata]>,
    pub goals: Option<&'a [String]>,
}

impl<'a> AnalysisRequest<'a> {
    pub fn new(data: &'a DataFrame) -> Self {
        Self {
            data,
            analysis_type: AnalysisType::Auto,
            variable_metadata: None,
            goals: None,
        }
    }

    pub fn analysis_type(mut self, analysis_type: AnalysisType) -> Self {
        self.analysis_type = analysis_type;
        self
    }

    pub fn variable_metadata(mut self, metadata: &'a [VariableMetadata]) -> Self {
        self.variable_metadata = Some(metadata);
        self
    }

    pub fn goals(mut self, goals: &'a [String]) -> Self {
        self.goals = Some(goals);
        self
    }
}

/// Result of running one module.
///
/// Serialized untagged: a completed module is its recommendation set, a
/// failed one is `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModuleOutcome {
    Completed(RecommendationSet),
    Failed { error: String },
}

impl ModuleOutcome {
    pub fn recommendations(&self) -> Option<&RecommendationSet> {
        match self {
            Self::Completed(set) => Some(set),
            Self::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Everything the coordinator knows about one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinatedResult {
    pub analysis_type: AnalysisType,
    /// Modules whose detector completed and contributed.
    pub modules_used: BTreeSet<AnalysisModule>,
    /// Every module that was run, including failed ones.
    pub module_results: BTreeMap<AnalysisModule, ModuleOutcome>,
    pub data_characteristics: DataCharacteristics,
    pub cross_module_insights: CrossModuleInsights,
    pub unified_recommendations: UnifiedRecommendations,
}

impl CoordinatedResult {
    /// Recommendation set of a completed module.
    pub fn recommendations(&self, module: AnalysisModule) -> Option<&RecommendationSet> {
        self.module_results
            .get(&module)
            .and_then(ModuleOutcome::recommendations)
    }
}

/// Entry point of the engine.
///
/// Holds no per-request state; one instance can serve any number of
/// requests from any number of threads.
pub struct UnifiedCoordinator {
    config: DetectionConfig,
    profiler: DataProfiler,
    detectors: BTreeMap<AnalysisModule, Arc<dyn ModuleDetector>>,
}

static_assertions::assert_impl_all!(UnifiedCoordinator: Send, Sync);

impl Default for UnifiedCoordinator {
    fn default() -> Self {
        Self::with_parts(DetectionConfig::default(), None, Vec::new())
    }
}

impl UnifiedCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> UnifiedCoordinatorBuilder {
        UnifiedCoordinatorBuilder::default()
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    fn with_parts(
        config: DetectionConfig,
        resources: Option<Arc<TextResources>>,
        overrides: Vec<Arc<dyn ModuleDetector>>,
    ) -> Self {
        let resources = resources.unwrap_or_else(|| Arc::new(TextResources::english()));

        let mut detectors: BTreeMap<AnalysisModule, Arc<dyn ModuleDetector>> = BTreeMap::new();
        detectors.insert(
            AnalysisModule::Descriptive,
            Arc::new(DescriptiveDetector::new(config.clone())),
        );
        detectors.insert(
            AnalysisModule::Inferential,
            Arc::new(InferentialDetector::new(config.clone())),
        );
        detectors.insert(
            AnalysisModule::Qualitative,
            Arc::new(QualitativeDetector::new(config.clone(), resources)),
        );
        for detector in overrides {
            detectors.insert(detector.module(), detector);
        }

        Self {
            profiler: DataProfiler::with_config(config.clone()),
            config,
            detectors,
        }
    }

    /// Analyze a frame without metadata or goals.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::EmptyDataset`] for a frame without columns.
    /// Module failures are reported inside the result, not as errors.
    pub fn analyze_comprehensive_data(
        &self,
        df: &DataFrame,
        analysis_type: AnalysisType,
    ) -> Result<CoordinatedResult> {
        self.analyze(AnalysisRequest::new(df).analysis_type(analysis_type))
    }

    /// Analyze a request carrying optional variable metadata and goals.
    pub fn analyze(&self, request: AnalysisRequest<'_>) -> Result<CoordinatedResult> {
        let df = request.data;
        if df.width() == 0 {
            return Err(AnalysisError::EmptyDataset);
        }

        info!(
            "Analyzing {} rows x {} columns ({})",
            df.height(),
            df.width(),
            request.analysis_type
        );

        let characteristics = self.profiler.profile(df, request.variable_metadata)?;
        let selected = self.select_modules(request.analysis_type, &characteristics, request.goals);
        debug!("Selected modules: {:?}", selected);

        let mut module_results = BTreeMap::new();
        let mut modules_used = BTreeSet::new();

        for module in selected {
            let Some(detector) = self.detectors.get(&module) else {
                continue;
            };

            match detector.suggest(&characteristics, Some(df), request.goals) {
                Ok(set) => {
                    let contributes =
                        request.analysis_type != AnalysisType::Auto || !set.is_empty();
                    if contributes {
                        modules_used.insert(module);
                    }
                    debug!(
                        "Module {} produced {} recommendation(s)",
                        module,
                        set.len()
                    );
                    module_results.insert(module, ModuleOutcome::Completed(set));
                }
                Err(e) => {
                    warn!("Module {} failed: {}", module, e);
                    module_results.insert(
                        module,
                        ModuleOutcome::Failed {
                            error: e.to_string(),
                        },
                    );
                }
            }
        }

        let cross_module_insights =
            insights::build_insights(&characteristics, &module_results, &self.config);
        let unified_recommendations =
            synthesis::synthesize(&module_results, &cross_module_insights);

        info!(
            "Analysis complete: {} module(s) used, {} step(s) in sequence",
            modules_used.len(),
            unified_recommendations.analysis_sequence.len()
        );

        Ok(CoordinatedResult {
            analysis_type: request.analysis_type,
            modules_used,
            module_results,
            data_characteristics: characteristics,
            cross_module_insights,
            unified_recommendations,
        })
    }

    fn select_modules(
        &self,
        analysis_type: AnalysisType,
        characteristics: &DataCharacteristics,
        goals: Option<&[String]>,
    ) -> Vec<AnalysisModule> {
        match analysis_type {
            AnalysisType::Comprehensive => AnalysisModule::ALL.to_vec(),
            AnalysisType::Auto => AnalysisModule::ALL
                .into_iter()
                .filter(|m| self.is_eligible(*m, characteristics, goals))
                .collect(),
            single => single.single_module().into_iter().collect(),
        }
    }

    fn is_eligible(
        &self,
        module: AnalysisModule,
        c: &DataCharacteristics,
        goals: Option<&[String]>,
    ) -> bool {
        match module {
            AnalysisModule::Descriptive => c.n_variables > 0,
            AnalysisModule::Inferential => {
                let numeric = c.usable_numeric_columns().len();
                numeric >= 2
                    || c.usable_categorical_columns().len() >= 2
                    || (has_comparison_goal(goals)
                        && numeric >= 1
                        && !c.grouping_variables.is_empty())
            }
            AnalysisModule::Qualitative => c.has_text,
        }
    }
}

fn has_comparison_goal(goals: Option<&[String]>) -> bool {
    goals.unwrap_or_default().iter().any(|goal| {
        let goal = goal.to_lowercase();
        COMPARISON_KEYWORDS.iter().any(|k| goal.contains(k))
    })
}

/// Builder for [`UnifiedCoordinator`].
#[derive(Default)]
pub struct UnifiedCoordinatorBuilder {
    config: Option<DetectionConfig>,
    text_resources: Option<Arc<TextResources>>,
    detectors: Vec<Arc<dyn ModuleDetector>>,
}

static_assertions::assert_impl_all!(UnifiedCoordinatorBuilder: Send);

impl UnifiedCoordinatorBuilder {
    /// Set the detection configuration.
    pub fn config(mut self, config: DetectionConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Stopwords and sentiment lexicon for the qualitative module.
    ///
    /// Defaults to [`TextResources::english()`].
    pub fn text_resources(mut self, resources: Arc<TextResources>) -> Self {
        self.text_resources = Some(resources);
        self
    }

    /// Replace the built-in detector of `detector.module()`.
    pub fn detector(mut self, detector: Arc<dyn ModuleDetector>) -> Self {
        self.detectors.push(detector);
        self
    }

    /// Build the coordinator.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<UnifiedCoordinator, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        Ok(UnifiedCoordinator::with_parts(
            config,
            self.text_resources,
            self.detectors,
        ))
    }
}
