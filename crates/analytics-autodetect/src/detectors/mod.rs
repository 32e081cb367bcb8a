//! Per-module method detectors.
//!
//! Each detector scores a static catalog of methods against the dataset
//! profile and returns a [`RecommendationSet`]. Scoring, tiering and
//! prerequisite ordering are shared through [`scoring`]; the modules only
//! declare their catalogs and requirement checks.

mod descriptive;
mod inferential;
mod qualitative;
pub mod scoring;
mod text_resources;

pub use descriptive::DescriptiveDetector;
pub use inferential::InferentialDetector;
pub use qualitative::{NO_TEXT_WARNING, QualitativeDetector, TextMetrics};
pub use scoring::{CatalogMethod, MissingSensitivity, RecommendationScorer};
pub use text_resources::{Polarity, TextResources};

use crate::error::{AnalysisError, Result};
use crate::types::{AnalysisModule, DataCharacteristics, MethodTier, RecommendationSet};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A module that turns a dataset profile into recommendations.
///
/// `raw_data` is optional; detectors that need actual values (the text
/// metrics of the qualitative module) treat the affected methods as
/// unsuitable when it is absent. `goals` never change scores.
pub trait ModuleDetector: Send + Sync {
    fn module(&self) -> AnalysisModule;

    fn suggest(
        &self,
        characteristics: &DataCharacteristics,
        raw_data: Option<&DataFrame>,
        goals: Option<&[String]>,
    ) -> Result<RecommendationSet>;
}

macro_rules! method_catalog {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal, $tier:ident;)+ }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            /// Catalog order; used for tie-breaks.
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }

            pub fn tier(&self) -> MethodTier {
                match self {
                    $(Self::$variant => MethodTier::$tier,)+
                }
            }
        }

        impl CatalogMethod for $name {
            fn name(&self) -> &'static str {
                self.as_str()
            }

            fn tier(&self) -> MethodTier {
                $name::tier(self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = AnalysisError;

            fn from_str(s: &str) -> Result<Self> {
                match s.trim() {
                    $($label => Ok(Self::$variant),)+
                    _ => Err(AnalysisError::UnknownMethod(s.to_string())),
                }
            }
        }
    };
}

method_catalog! {
    /// Descriptive statistics methods.
    DescriptiveMethod {
        BasicStatistics => "basic_statistics", Foundational;
        MissingDataAnalysis => "missing_data_analysis", Foundational;
        DistributionAnalysis => "distribution_analysis", Exploratory;
        OutlierDetection => "outlier_detection", Exploratory;
        CorrelationAnalysis => "correlation_analysis", Exploratory;
        CategoricalAnalysis => "categorical_analysis", Exploratory;
        CrossTabulation => "cross_tabulation", Exploratory;
        TemporalAnalysis => "temporal_analysis", Exploratory;
        GeospatialAnalysis => "geospatial_analysis", Exploratory;
    }
}

method_catalog! {
    /// Hypothesis tests and models.
    InferentialMethod {
        NormalityTests => "normality_tests", Exploratory;
        CorrelationTest => "correlation_test", Inferential;
        TTest => "t_test", Inferential;
        Anova => "anova", Inferential;
        ChiSquareTest => "chi_square_test", Inferential;
        NonparametricTests => "nonparametric_tests", Inferential;
        RegressionAnalysis => "regression_analysis", Inferential;
        BootstrapAnalysis => "bootstrap_analysis", Inferential;
    }
}

method_catalog! {
    /// Free-text analysis methods.
    QualitativeMethod {
        TextStatistics => "text_statistics", Foundational;
        WordFrequency => "word_frequency", Exploratory;
        KeywordExtraction => "keyword_extraction", Exploratory;
        SentimentAnalysis => "sentiment_analysis", Exploratory;
        ThematicAnalysis => "thematic_analysis", Exploratory;
        ContentAnalysis => "content_analysis", Exploratory;
    }
}

/// Any method from any module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalysisMethod {
    Descriptive(DescriptiveMethod),
    Inferential(InferentialMethod),
    Qualitative(QualitativeMethod),
}

impl AnalysisMethod {
    pub fn module(&self) -> AnalysisModule {
        match self {
            Self::Descriptive(_) => AnalysisModule::Descriptive,
            Self::Inferential(_) => AnalysisModule::Inferential,
            Self::Qualitative(_) => AnalysisModule::Qualitative,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Descriptive(m) => m.as_str(),
            Self::Inferential(m) => m.as_str(),
            Self::Qualitative(m) => m.as_str(),
        }
    }

    pub fn tier(&self) -> MethodTier {
        match self {
            Self::Descriptive(m) => m.tier(),
            Self::Inferential(m) => m.tier(),
            Self::Qualitative(m) => m.tier(),
        }
    }
}

impl fmt::Display for AnalysisMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisMethod {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        if let Ok(m) = s.parse::<DescriptiveMethod>() {
            return Ok(Self::Descriptive(m));
        }
        if let Ok(m) = s.parse::<InferentialMethod>() {
            return Ok(Self::Inferential(m));
        }
        if let Ok(m) = s.parse::<QualitativeMethod>() {
            return Ok(Self::Qualitative(m));
        }
        Err(AnalysisError::UnknownMethod(s.to_string()))
    }
}

impl From<DescriptiveMethod> for AnalysisMethod {
    fn from(m: DescriptiveMethod) -> Self {
        Self::Descriptive(m)
    }
}

impl From<InferentialMethod> for AnalysisMethod {
    fn from(m: InferentialMethod) -> Self {
        Self::Inferential(m)
    }
}

impl From<QualitativeMethod> for AnalysisMethod {
    fn from(m: QualitativeMethod) -> Self {
        Self::Qualitative(m)
    }
}
