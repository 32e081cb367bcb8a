use super::scoring::{
    MethodSpec, MissingSensitivity, Requirement, SpecialFeature, build_recommendation_set,
};
use super::text_resources::TextResources;
use super::{ModuleDetector, QualitativeMethod};
use crate::config::{DetectionConfig, TextThresholds};
use crate::error::Result;
use crate::quality::DataQualityAnalyzer;
use crate::types::{
    AnalysisModule, DataCharacteristics, RecommendationSet, SampleSizeCategory, UnsuitableMethod,
};
use crate::utils::{non_empty_strings, tokenize};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

use QualitativeMethod::*;

/// Warning attached when a frame has nothing for this module to analyze.
pub const NO_TEXT_WARNING: &str = "No free-text columns detected";

/// Token-level facts about the free-text columns of a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextMetrics {
    /// Non-empty responses across all text columns.
    pub n_documents: usize,
    /// Mean number of non-stopword tokens per response.
    pub avg_content_tokens: f64,
    /// Distinct non-stopword tokens.
    pub vocabulary_size: usize,
    /// Share of content tokens found in the sentiment lexicon.
    pub lexicon_hit_rate: f64,
}

impl TextMetrics {
    /// Compute metrics over `columns` of `df`.
    ///
    /// Fails if a named column is missing from the frame.
    pub fn compute(df: &DataFrame, columns: &[String], resources: &TextResources) -> Result<Self> {
        let mut n_documents = 0usize;
        let mut content_tokens = 0usize;
        let mut lexicon_hits = 0usize;
        let mut vocabulary: HashSet<String> = HashSet::new();

        for name in columns {
            let series = df.column(name)?.as_materialized_series();
            for document in non_empty_strings(series)? {
                n_documents += 1;
                for token in tokenize(&document) {
                    if resources.is_stopword(&token) {
                        continue;
                    }
                    content_tokens += 1;
                    if resources.polarity(&token).is_some() {
                        lexicon_hits += 1;
                    }
                    vocabulary.insert(token);
                }
            }
        }

        let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };

        Ok(Self {
            n_documents,
            avg_content_tokens: ratio(content_tokens, n_documents),
            vocabulary_size: vocabulary.len(),
            lexicon_hit_rate: ratio(lexicon_hits, content_tokens),
        })
    }
}

/// What the requirement checks see besides the profile.
struct QualitativeContext {
    metrics: Option<TextMetrics>,
    has_lexicon: bool,
    thresholds: TextThresholds,
}

static CATALOG: &[MethodSpec<QualitativeMethod, QualitativeContext>] = &[
    MethodSpec {
        method: TextStatistics,
        min_sample: SampleSizeCategory::VerySmall,
        missing_sensitivity: MissingSensitivity::None,
        requirement: text_columns,
        special_feature: Some(SpecialFeature {
            applies: |c: &DataCharacteristics, _: &QualitativeContext| {
                c.text_columns().len() >= 2
            },
            reason: "several free-text columns",
        }),
        prerequisites: &[],
        goal_keywords: &["text", "response", "length"],
    },
    MethodSpec {
        method: WordFrequency,
        min_sample: SampleSizeCategory::VerySmall,
        missing_sensitivity: MissingSensitivity::Low,
        requirement: word_frequency,
        special_feature: Some(SpecialFeature {
            applies: |_: &DataCharacteristics, x: &QualitativeContext| {
                x.metrics
                    .as_ref()
                    .is_some_and(|m| m.vocabulary_size >= x.thresholds.rich_vocabulary)
            },
            reason: "rich vocabulary",
        }),
        prerequisites: &[TextStatistics],
        goal_keywords: &["word", "frequen", "common"],
    },
    MethodSpec {
        method: KeywordExtraction,
        min_sample: SampleSizeCategory::Small,
        missing_sensitivity: MissingSensitivity::Low,
        requirement: keyword_extraction,
        special_feature: Some(SpecialFeature {
            applies: |_: &DataCharacteristics, x: &QualitativeContext| {
                x.metrics
                    .as_ref()
                    .is_some_and(|m| m.vocabulary_size >= x.thresholds.rich_vocabulary)
            },
            reason: "rich vocabulary",
        }),
        prerequisites: &[WordFrequency],
        goal_keywords: &["keyword", "key term", "topic"],
    },
    MethodSpec {
        method: SentimentAnalysis,
        min_sample: SampleSizeCategory::VerySmall,
        missing_sensitivity: MissingSensitivity::Low,
        requirement: sentiment,
        special_feature: Some(SpecialFeature {
            applies: |_: &DataCharacteristics, x: &QualitativeContext| {
                x.metrics
                    .as_ref()
                    .is_some_and(|m| m.lexicon_hit_rate >= x.thresholds.lexicon_coverage)
            },
            reason: "responses carry sentiment-bearing words",
        }),
        prerequisites: &[TextStatistics],
        goal_keywords: &["sentiment", "feel", "satisf", "opinion", "emotion"],
    },
    MethodSpec {
        method: ThematicAnalysis,
        min_sample: SampleSizeCategory::Small,
        missing_sensitivity: MissingSensitivity::Low,
        requirement: thematic,
        special_feature: Some(SpecialFeature {
            applies: |_: &DataCharacteristics, x: &QualitativeContext| {
                x.metrics
                    .as_ref()
                    .is_some_and(|m| m.avg_content_tokens >= x.thresholds.long_response_tokens)
            },
            reason: "long responses support theme coding",
        }),
        prerequisites: &[KeywordExtraction],
        goal_keywords: &["theme", "thematic", "pattern"],
    },
    MethodSpec {
        method: ContentAnalysis,
        min_sample: SampleSizeCategory::Small,
        missing_sensitivity: MissingSensitivity::Low,
        requirement: content_by_group,
        special_feature: Some(SpecialFeature {
            applies: |c: &DataCharacteristics, _: &QualitativeContext| {
                c.grouping_variables.len() >= 2
            },
            reason: "several grouping variables to compare responses across",
        }),
        prerequisites: &[ThematicAnalysis],
        goal_keywords: &["content", "compare", "group", "segment"],
    },
];

fn text_columns(
    c: &DataCharacteristics,
    _: &QualitativeContext,
    _: &DetectionConfig,
) -> Requirement {
    let columns = c.text_columns();
    if columns.is_empty() {
        return Requirement::unmet("requires a free-text column");
    }
    let summary = format!("{} free-text columns", columns.len());
    Requirement::met(columns, summary)
}

fn metrics_or_unmet(x: &QualitativeContext) -> std::result::Result<&TextMetrics, Requirement> {
    x.metrics
        .as_ref()
        .ok_or_else(|| Requirement::unmet("requires raw text values"))
}

fn word_frequency(
    c: &DataCharacteristics,
    x: &QualitativeContext,
    _: &DetectionConfig,
) -> Requirement {
    let metrics = match metrics_or_unmet(x) {
        Ok(m) => m,
        Err(unmet) => return unmet,
    };
    if metrics.vocabulary_size == 0 {
        return Requirement::unmet("no content words after stopword removal");
    }
    Requirement::met(
        c.text_columns(),
        format!("{} distinct content words", metrics.vocabulary_size),
    )
}

fn keyword_extraction(
    c: &DataCharacteristics,
    x: &QualitativeContext,
    _: &DetectionConfig,
) -> Requirement {
    let metrics = match metrics_or_unmet(x) {
        Ok(m) => m,
        Err(unmet) => return unmet,
    };
    if metrics.vocabulary_size < x.thresholds.min_keyword_vocabulary {
        return Requirement::unmet(format!(
            "vocabulary of {} words is too small for keyword extraction",
            metrics.vocabulary_size
        ));
    }
    Requirement::met(
        c.text_columns(),
        format!("{} distinct content words", metrics.vocabulary_size),
    )
}

fn sentiment(c: &DataCharacteristics, x: &QualitativeContext, _: &DetectionConfig) -> Requirement {
    if !x.has_lexicon {
        return Requirement::unmet("no sentiment lexicon available");
    }
    let metrics = match metrics_or_unmet(x) {
        Ok(m) => m,
        Err(unmet) => return unmet,
    };
    Requirement::met(
        c.text_columns(),
        format!(
            "{:.0}% of content words carry sentiment",
            metrics.lexicon_hit_rate * 100.0
        ),
    )
}

fn thematic(c: &DataCharacteristics, x: &QualitativeContext, _: &DetectionConfig) -> Requirement {
    let metrics = match metrics_or_unmet(x) {
        Ok(m) => m,
        Err(unmet) => return unmet,
    };
    if metrics.avg_content_tokens < x.thresholds.min_thematic_tokens {
        return Requirement::unmet("responses are too short for thematic coding");
    }
    Requirement::met(
        c.text_columns(),
        format!(
            "{:.1} content words per response",
            metrics.avg_content_tokens
        ),
    )
}

fn content_by_group(
    c: &DataCharacteristics,
    _: &QualitativeContext,
    _: &DetectionConfig,
) -> Requirement {
    let text = c.text_columns();
    let Some(group) = c.grouping_variables.first() else {
        return Requirement::unmet("requires a free-text column and a grouping variable");
    };
    if text.is_empty() {
        return Requirement::unmet("requires a free-text column and a grouping variable");
    }
    let summary = format!("responses can be compared across '{}'", group);
    let mut variables = text;
    variables.push(group.clone());
    Requirement::met(variables, summary)
}

/// Recommendations for open-ended responses.
#[derive(Debug, Clone)]
pub struct QualitativeDetector {
    config: DetectionConfig,
    resources: Arc<TextResources>,
}

impl Default for QualitativeDetector {
    fn default() -> Self {
        Self::new(DetectionConfig::default(), Arc::new(TextResources::english()))
    }
}

impl QualitativeDetector {
    pub fn new(config: DetectionConfig, resources: Arc<TextResources>) -> Self {
        Self { config, resources }
    }

    pub fn resources(&self) -> &TextResources {
        &self.resources
    }

    fn no_text_set(&self, characteristics: &DataCharacteristics) -> RecommendationSet {
        let mut set = RecommendationSet::empty(AnalysisModule::Qualitative);
        set.data_quality_warnings =
            DataQualityAnalyzer::warnings(characteristics, &self.config.warnings);
        set.data_quality_warnings.push(NO_TEXT_WARNING.to_string());
        set.unsuitable_methods = QualitativeMethod::ALL
            .iter()
            .map(|m| UnsuitableMethod {
                method: m.as_str().to_string(),
                reason: "no free-text columns detected".to_string(),
            })
            .collect();
        set
    }
}

impl ModuleDetector for QualitativeDetector {
    fn module(&self) -> AnalysisModule {
        AnalysisModule::Qualitative
    }

    fn suggest(
        &self,
        characteristics: &DataCharacteristics,
        raw_data: Option<&DataFrame>,
        goals: Option<&[String]>,
    ) -> Result<RecommendationSet> {
        let text_columns = characteristics.text_columns();
        if text_columns.is_empty() {
            info!("Qualitative detector: no free-text columns");
            return Ok(self.no_text_set(characteristics));
        }

        let metrics = raw_data
            .map(|df| TextMetrics::compute(df, &text_columns, &self.resources))
            .transpose()?;
        match &metrics {
            Some(m) => debug!(
                "Text metrics: {} responses, {:.1} content words each, vocabulary {}",
                m.n_documents, m.avg_content_tokens, m.vocabulary_size
            ),
            None => debug!("No raw data supplied; text metrics unavailable"),
        }

        let context = QualitativeContext {
            metrics,
            has_lexicon: self.resources.has_lexicon(),
            thresholds: self.config.text,
        };
        let warnings = DataQualityAnalyzer::warnings(characteristics, &self.config.warnings);
        let set = build_recommendation_set(
            AnalysisModule::Qualitative,
            CATALOG,
            characteristics,
            &context,
            goals,
            &self.config,
            warnings,
        );
        info!(
            "Qualitative detector: {} recommended, {} unsuitable",
            set.len(),
            set.unsuitable_methods.len()
        );
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use crate::profiler::DataProfiler;
    use polars::prelude::*;
    use pretty_assertions::assert_eq;

    fn feedback_frame(n: usize) -> DataFrame {
        let adjectives = ["detailed", "short", "practical", "lengthy", "interactive"];
        let topics = ["security", "payroll", "tooling", "compliance"];
        let sentiments = ["great", "slow", "helpful", "confusing"];
        let comments: Vec<String> = (0..n)
            .map(|i| {
                format!(
                    "The {} onboarding session about {} was {} and the trainer explained {} benefits clearly for team {}",
                    adjectives[i % 5],
                    topics[i % 4],
                    sentiments[i % 4],
                    topics[(i + 1) % 4],
                    i
                )
            })
            .collect();
        let team: Vec<&str> = (0..n).map(|i| ["alpha", "beta", "gamma"][i % 3]).collect();
        let rating: Vec<f64> = (0..n).map(|i| 1.0 + (i * 7 % 50) as f64 * 0.08).collect();
        df! { "comments" => comments, "team" => team, "rating" => rating }.unwrap()
    }

    fn profile(df: &DataFrame) -> DataCharacteristics {
        DataProfiler::new().profile(df, None).unwrap()
    }

    #[test]
    fn test_catalog_is_in_enum_order() {
        let methods: Vec<_> = CATALOG.iter().map(|s| s.method).collect();
        assert_eq!(methods, QualitativeMethod::ALL.to_vec());
    }

    #[test]
    fn test_text_metrics() {
        let df = feedback_frame(60);
        let metrics = TextMetrics::compute(
            &df,
            &["comments".to_string()],
            &TextResources::english(),
        )
        .unwrap();
        assert_eq!(metrics.n_documents, 60);
        assert!((metrics.avg_content_tokens - 12.0).abs() < 1e-9);
        assert!(metrics.vocabulary_size >= 60);
        assert!((metrics.lexicon_hit_rate - 1.0 / 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_full_recommendations_with_raw_data() {
        let df = feedback_frame(60);
        let characteristics = profile(&df);
        assert!(characteristics.has_text);

        let set = QualitativeDetector::default()
            .suggest(&characteristics, Some(&df), None)
            .unwrap();

        assert_eq!(set.len(), QualitativeMethod::ALL.len());
        assert!(set.unsuitable_methods.is_empty());
        assert_eq!(set.find("thematic_analysis").unwrap().score, 0.95);
        assert!(
            set.find("sentiment_analysis")
                .unwrap()
                .rationale
                .contains("sentiment-bearing words")
        );
        assert_eq!(
            set.find("content_analysis").unwrap().required_variables,
            vec!["comments".to_string(), "team".to_string()]
        );
        assert_eq!(
            set.analysis_order,
            vec![
                "text_statistics",
                "word_frequency",
                "keyword_extraction",
                "sentiment_analysis",
                "thematic_analysis",
                "content_analysis"
            ]
        );
    }

    #[test]
    fn test_without_raw_data_metric_methods_are_unsuitable() {
        let df = feedback_frame(60);
        let characteristics = profile(&df);
        let set = QualitativeDetector::default()
            .suggest(&characteristics, None, None)
            .unwrap();

        assert!(set.find("text_statistics").is_some());
        assert!(set.find("content_analysis").is_some());
        let unsuitable: Vec<_> = set.unsuitable_methods.iter().map(|u| u.method.as_str()).collect();
        assert_eq!(
            unsuitable,
            vec![
                "word_frequency",
                "keyword_extraction",
                "sentiment_analysis",
                "thematic_analysis"
            ]
        );
        assert!(
            set.unsuitable_methods
                .iter()
                .all(|u| u.reason == "requires raw text values")
        );
        // content_analysis still follows text_statistics once the chain is dropped
        assert_eq!(set.analysis_order, vec!["text_statistics", "content_analysis"]);
    }

    #[test]
    fn test_empty_lexicon_makes_sentiment_unsuitable() {
        let df = feedback_frame(60);
        let characteristics = profile(&df);
        let detector =
            QualitativeDetector::new(DetectionConfig::default(), Arc::new(TextResources::empty()));
        let set = detector.suggest(&characteristics, Some(&df), None).unwrap();

        assert!(set.find("sentiment_analysis").is_none());
        let reason = &set
            .unsuitable_methods
            .iter()
            .find(|u| u.method == "sentiment_analysis")
            .unwrap()
            .reason;
        assert_eq!(reason, "no sentiment lexicon available");
    }

    #[test]
    fn test_no_text_columns() {
        let df = df! {
            "score" => (0..40).map(|i| i as f64).collect::<Vec<_>>(),
        }
        .unwrap();
        let characteristics = profile(&df);
        let set = QualitativeDetector::default()
            .suggest(&characteristics, Some(&df), None)
            .unwrap();

        assert!(set.is_empty());
        assert_eq!(set.data_quality_warnings, vec![NO_TEXT_WARNING.to_string()]);
        assert_eq!(set.unsuitable_methods.len(), QualitativeMethod::ALL.len());
    }

    #[test]
    fn test_raw_data_missing_text_column_is_an_error() {
        let df = feedback_frame(40);
        let characteristics = profile(&df);
        let other = df! { "rating" => &[1.0, 2.0] }.unwrap();

        let err = QualitativeDetector::default()
            .suggest(&characteristics, Some(&other), None)
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Polars(_)));
    }
}
