//! Tunable policy for classification, scoring and quality assessment.
//!
//! Every heuristic constant of the engine lives here. The defaults are the
//! values the engine has always used; none of them is statistically derived,
//! so callers are free to adjust them through [`DetectionConfig::builder()`].

use serde::{Deserialize, Serialize};

/// Thresholds used by the column type classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Share of non-null string values that must parse as dates. Default: 0.9
    pub datetime_parse_ratio: f64,
    /// Share of non-null string values that must parse as numbers for a
    /// string column to be treated as numeric. Default: 0.9
    pub numeric_parse_ratio: f64,
    /// Unique/non-null ratio below which a numeric column is low-cardinality.
    /// Default: 0.05
    pub low_cardinality_ratio: f64,
    /// Maximum distinct values for a numeric-coded categorical. Default: 20
    pub max_coded_categories: usize,
    /// Maximum length of a value that can still look like an identifier.
    /// Default: 40
    pub identifier_max_length: usize,
    /// Average character length above which strings are free text. Default: 50
    pub text_min_avg_length: f64,
    /// Average whitespace token count above which strings are free text
    /// (combined with `text_min_unique_ratio`). Default: 6
    pub text_min_avg_tokens: f64,
    /// Minimum unique ratio for the token-count text rule. Default: 0.5
    pub text_min_unique_ratio: f64,
    /// Maximum number of values inspected by the string parse checks.
    /// Default: 500
    pub parse_sample_size: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            datetime_parse_ratio: 0.9,
            numeric_parse_ratio: 0.9,
            low_cardinality_ratio: 0.05,
            max_coded_categories: 20,
            identifier_max_length: 40,
            text_min_avg_length: 50.0,
            text_min_avg_tokens: 6.0,
            text_min_unique_ratio: 0.5,
            parse_sample_size: 500,
        }
    }
}

/// Lower bounds (in observations) of the sample size categories.
///
/// Below `small` a dataset is `very_small`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleSizeThresholds {
    /// Default: 30
    pub small: usize,
    /// Default: 100
    pub medium: usize,
    /// Default: 1000
    pub large: usize,
}

impl Default for SampleSizeThresholds {
    fn default() -> Self {
        Self {
            small: 30,
            medium: 100,
            large: 1000,
        }
    }
}

/// Weights of the shared recommendation scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringPolicy {
    /// Starting score of every method that passes its requirement check.
    pub base_score: f64,
    /// Added when the required semantic types are present.
    pub type_match_bonus: f64,
    /// Added when the sample size meets the method minimum.
    pub sample_size_bonus: f64,
    /// Added when the method's special feature is present.
    pub feature_bonus: f64,
    /// Penalty at the first missing cell for a highly sensitive method.
    pub missing_penalty_min: f64,
    /// Penalty once missingness reaches `missing_penalty_saturation`.
    pub missing_penalty_max: f64,
    /// Missing percentage at which the penalty stops growing.
    pub missing_penalty_saturation: f64,
    /// Multiplier applied to the penalty for weakly sensitive methods.
    pub low_sensitivity_factor: f64,
    /// Scores at or above this are HIGH confidence and primary.
    pub high_cutoff: f64,
    /// Scores at or above this are MEDIUM confidence and secondary.
    pub medium_cutoff: f64,
    /// Maximum distinct values for a column to act as a grouping variable.
    pub max_grouping_levels: usize,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            base_score: 0.5,
            type_match_bonus: 0.2,
            sample_size_bonus: 0.15,
            feature_bonus: 0.1,
            missing_penalty_min: 0.1,
            missing_penalty_max: 0.3,
            missing_penalty_saturation: 50.0,
            low_sensitivity_factor: 0.5,
            high_cutoff: 0.7,
            medium_cutoff: 0.4,
            max_grouping_levels: 10,
        }
    }
}

/// Thresholds that trigger data quality warnings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarningThresholds {
    /// Warn when the missing percentage exceeds this. Default: 20.0
    pub missing_percentage: f64,
    /// Warn when there are fewer observations than this. Default: 30
    pub min_observations: usize,
}

impl Default for WarningThresholds {
    fn default() -> Self {
        Self {
            missing_percentage: 20.0,
            min_observations: 30,
        }
    }
}

/// Weights of the overall data quality score. Must sum to 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityWeights {
    pub completeness: f64,
    pub duplicates: f64,
    pub constant_columns: f64,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            completeness: 0.6,
            duplicates: 0.2,
            constant_columns: 0.2,
        }
    }
}

/// Thresholds applied to text metrics by the qualitative detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextThresholds {
    /// Distinct content words needed before keywords can be extracted.
    /// Default: 20
    pub min_keyword_vocabulary: usize,
    /// Distinct content words that count as a rich vocabulary. Default: 50
    pub rich_vocabulary: usize,
    /// Average content words per response needed for thematic coding.
    /// Default: 3
    pub min_thematic_tokens: f64,
    /// Average content words per response that count as long answers.
    /// Default: 10
    pub long_response_tokens: f64,
    /// Share of content words found in the sentiment lexicon that makes
    /// sentiment scoring informative. Default: 0.05
    pub lexicon_coverage: f64,
}

impl Default for TextThresholds {
    fn default() -> Self {
        Self {
            min_keyword_vocabulary: 20,
            rich_vocabulary: 50,
            min_thematic_tokens: 3.0,
            long_response_tokens: 10.0,
            lexicon_coverage: 0.05,
        }
    }
}

/// Complete engine configuration.
///
/// # Example
///
/// ```rust,ignore
/// use analytics_autodetect::config::DetectionConfig;
///
/// let config = DetectionConfig::builder()
///     .confidence_cutoffs(0.4, 0.75)
///     .missing_warning_threshold(10.0)
///     .build()?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    pub classifier: ClassifierConfig,
    pub sample_sizes: SampleSizeThresholds,
    pub scoring: ScoringPolicy,
    pub warnings: WarningThresholds,
    pub quality: QualityWeights,
    #[serde(default)]
    pub text: TextThresholds,
}

impl DetectionConfig {
    /// Create a new configuration builder.
    pub fn builder() -> DetectionConfigBuilder {
        DetectionConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let ratios = [
            ("datetime_parse_ratio", self.classifier.datetime_parse_ratio),
            ("numeric_parse_ratio", self.classifier.numeric_parse_ratio),
            ("low_cardinality_ratio", self.classifier.low_cardinality_ratio),
            ("text_min_unique_ratio", self.classifier.text_min_unique_ratio),
            ("medium_cutoff", self.scoring.medium_cutoff),
            ("high_cutoff", self.scoring.high_cutoff),
            ("lexicon_coverage", self.text.lexicon_coverage),
        ];
        for (field, value) in ratios {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigValidationError::InvalidThreshold {
                    field: field.to_string(),
                    value,
                });
            }
        }

        if self.scoring.medium_cutoff >= self.scoring.high_cutoff {
            return Err(ConfigValidationError::UnorderedCutoffs {
                medium: self.scoring.medium_cutoff,
                high: self.scoring.high_cutoff,
            });
        }

        let sizes = self.sample_sizes;
        if !(sizes.small < sizes.medium && sizes.medium < sizes.large) {
            return Err(ConfigValidationError::UnorderedSampleSizes {
                small: sizes.small,
                medium: sizes.medium,
                large: sizes.large,
            });
        }

        if self.scoring.missing_penalty_min > self.scoring.missing_penalty_max
            || self.scoring.missing_penalty_saturation <= 0.0
        {
            return Err(ConfigValidationError::InvalidPenaltyRange {
                min: self.scoring.missing_penalty_min,
                max: self.scoring.missing_penalty_max,
            });
        }

        let weight_sum = self.quality.completeness
            + self.quality.duplicates
            + self.quality.constant_columns;
        if (weight_sum - 1.0).abs() > 1e-6 {
            return Err(ConfigValidationError::QualityWeightsSum(weight_sum));
        }

        if self.scoring.max_grouping_levels < 2 {
            return Err(ConfigValidationError::InvalidGroupingLevels(
                self.scoring.max_grouping_levels,
            ));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid threshold for '{field}': {value} (must be between 0.0 and 1.0)")]
    InvalidThreshold { field: String, value: f64 },

    #[error("Confidence cutoffs out of order: medium {medium} must be below high {high}")]
    UnorderedCutoffs { medium: f64, high: f64 },

    #[error("Sample size thresholds must be strictly increasing (got {small}, {medium}, {large})")]
    UnorderedSampleSizes {
        small: usize,
        medium: usize,
        large: usize,
    },

    #[error("Invalid missing-data penalty range: {min}..{max}")]
    InvalidPenaltyRange { min: f64, max: f64 },

    #[error("Quality weights must sum to 1.0 (got {0})")]
    QualityWeightsSum(f64),

    #[error("Grouping variables need at least 2 levels (got {0})")]
    InvalidGroupingLevels(usize),
}

/// Builder for [`DetectionConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct DetectionConfigBuilder {
    classifier: Option<ClassifierConfig>,
    sample_sizes: Option<SampleSizeThresholds>,
    scoring: Option<ScoringPolicy>,
    warnings: Option<WarningThresholds>,
    quality: Option<QualityWeights>,
    text: Option<TextThresholds>,
    cutoffs: Option<(f64, f64)>,
    missing_warning: Option<f64>,
    min_observations: Option<usize>,
}

impl DetectionConfigBuilder {
    /// Replace the classifier thresholds.
    pub fn classifier(mut self, classifier: ClassifierConfig) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Replace the sample size category bounds.
    pub fn sample_sizes(mut self, small: usize, medium: usize, large: usize) -> Self {
        self.sample_sizes = Some(SampleSizeThresholds {
            small,
            medium,
            large,
        });
        self
    }

    /// Replace the whole scoring policy.
    pub fn scoring(mut self, scoring: ScoringPolicy) -> Self {
        self.scoring = Some(scoring);
        self
    }

    /// Set the MEDIUM and HIGH confidence cutoffs.
    ///
    /// Applied on top of [`Self::scoring`] if both are given.
    pub fn confidence_cutoffs(mut self, medium: f64, high: f64) -> Self {
        self.cutoffs = Some((medium, high));
        self
    }

    /// Replace the warning thresholds.
    pub fn warnings(mut self, warnings: WarningThresholds) -> Self {
        self.warnings = Some(warnings);
        self
    }

    /// Set the missing percentage above which a warning is emitted.
    pub fn missing_warning_threshold(mut self, percentage: f64) -> Self {
        self.missing_warning = Some(percentage);
        self
    }

    /// Set the observation count below which a small-sample warning is emitted.
    pub fn min_observations(mut self, n: usize) -> Self {
        self.min_observations = Some(n);
        self
    }

    /// Replace the quality score weights.
    pub fn quality_weights(mut self, completeness: f64, duplicates: f64, constant: f64) -> Self {
        self.quality = Some(QualityWeights {
            completeness,
            duplicates,
            constant_columns: constant,
        });
        self
    }

    /// Replace the text metric thresholds.
    pub fn text_thresholds(mut self, text: TextThresholds) -> Self {
        self.text = Some(text);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `DetectionConfig` or an error if validation fails.
    pub fn build(self) -> Result<DetectionConfig, ConfigValidationError> {
        let mut scoring = self.scoring.unwrap_or_default();
        if let Some((medium, high)) = self.cutoffs {
            scoring.medium_cutoff = medium;
            scoring.high_cutoff = high;
        }

        let mut warnings = self.warnings.unwrap_or_default();
        if let Some(pct) = self.missing_warning {
            warnings.missing_percentage = pct;
        }
        if let Some(n) = self.min_observations {
            warnings.min_observations = n;
        }

        let config = DetectionConfig {
            classifier: self.classifier.unwrap_or_default(),
            sample_sizes: self.sample_sizes.unwrap_or_default(),
            scoring,
            warnings,
            quality: self.quality.unwrap_or_default(),
            text: self.text.unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }
}
