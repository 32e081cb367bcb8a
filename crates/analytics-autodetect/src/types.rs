use crate::config::{SampleSizeThresholds, ScoringPolicy};
use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Column classification
// ============================================================================

/// Statistical meaning of a column, independent of its storage dtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    NumericContinuous,
    NumericDiscrete,
    Categorical,
    Binary,
    Datetime,
    Text,
    Geographic,
    Identifier,
    Unknown,
}

impl SemanticType {
    pub const ALL: [SemanticType; 9] = [
        SemanticType::NumericContinuous,
        SemanticType::NumericDiscrete,
        SemanticType::Categorical,
        SemanticType::Binary,
        SemanticType::Datetime,
        SemanticType::Text,
        SemanticType::Geographic,
        SemanticType::Identifier,
        SemanticType::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NumericContinuous => "numeric_continuous",
            Self::NumericDiscrete => "numeric_discrete",
            Self::Categorical => "categorical",
            Self::Binary => "binary",
            Self::Datetime => "datetime",
            Self::Text => "text",
            Self::Geographic => "geographic",
            Self::Identifier => "identifier",
            Self::Unknown => "unknown",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::NumericContinuous | Self::NumericDiscrete)
    }

    /// Categorical or binary: columns that can form groups or contingency tables.
    pub fn is_categorical_like(&self) -> bool {
        matches!(self, Self::Categorical | Self::Binary)
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SemanticType {
    type Err = AnalysisError;

    /// Accepts the canonical snake_case names and the survey-schema aliases
    /// callers commonly send as `intended_type`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        let parsed = match normalized.as_str() {
            "numeric_continuous" | "numeric" | "continuous" | "float" | "decimal" => {
                Self::NumericContinuous
            }
            "numeric_discrete" | "discrete" | "integer" | "int" | "count" => Self::NumericDiscrete,
            "categorical" | "category" | "nominal" | "ordinal" | "likert" | "string"
            | "single_choice" | "multiple_choice" => Self::Categorical,
            "binary" | "boolean" | "bool" | "yes_no" => Self::Binary,
            "datetime" | "date" | "time" | "timestamp" => Self::Datetime,
            "text" | "free_text" | "open_ended" | "textarea" => Self::Text,
            "geographic" | "location" | "gps" | "geo" => Self::Geographic,
            "identifier" | "id" => Self::Identifier,
            "unknown" => Self::Unknown,
            _ => {
                return Err(AnalysisError::InvalidInput(format!(
                    "unrecognized variable type '{}'",
                    s
                )));
            }
        };
        Ok(parsed)
    }
}

/// Caller-supplied type override for a named column (e.g. from a survey schema).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableMetadata {
    pub name: String,
    #[serde(alias = "type")]
    pub intended_type: String,
}

impl VariableMetadata {
    pub fn new(name: impl Into<String>, intended_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            intended_type: intended_type.into(),
        }
    }
}

/// Sample size bucket derived from the number of observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleSizeCategory {
    VerySmall,
    Small,
    Medium,
    Large,
}

impl SampleSizeCategory {
    pub fn from_count(n_observations: usize, thresholds: &SampleSizeThresholds) -> Self {
        if n_observations < thresholds.small {
            Self::VerySmall
        } else if n_observations < thresholds.medium {
            Self::Small
        } else if n_observations < thresholds.large {
            Self::Medium
        } else {
            Self::Large
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VerySmall => "very_small",
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }

    /// Plain-language adequacy label used in quality summaries.
    pub fn adequacy_label(&self) -> &'static str {
        match self {
            Self::VerySmall => "inadequate",
            Self::Small => "limited",
            Self::Medium => "adequate",
            Self::Large => "excellent",
        }
    }
}

impl fmt::Display for SampleSizeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Data characteristics (profile)
// ============================================================================

/// Classification and quality facts about a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnCharacteristics {
    pub name: String,
    pub semantic_type: SemanticType,
    pub null_count: usize,
    pub null_percentage: f64,
    /// Distinct non-null values.
    pub unique_count: usize,
    /// Exactly one distinct non-null value.
    pub is_constant: bool,
    /// 0.0 for columns that could not be classified at all.
    pub classification_confidence: f64,
    /// True when variable metadata forced the semantic type.
    pub overridden: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub skewness: f64,
    pub has_outliers: bool,
    pub missing_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalSummary {
    pub n_categories: usize,
    pub most_frequent: Option<String>,
    /// Share (0..1) of non-null values taken by the most frequent category.
    pub most_frequent_share: f64,
    /// "balanced" or "imbalanced".
    pub balance: String,
    pub missing_percentage: f64,
}

/// Structured profile of a whole dataset.
///
/// Computed once per request by [`crate::profiler::DataProfiler`] and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataCharacteristics {
    pub n_observations: usize,
    pub n_variables: usize,
    pub data_shape: (usize, usize),
    /// Histogram of column classifications; only types that occur are present.
    pub type_counts: BTreeMap<SemanticType, usize>,
    pub columns: Vec<ColumnCharacteristics>,
    /// Column-weighted: mean of per-column non-null percentages.
    pub completeness_score: f64,
    /// Cell-level: total nulls over total cells.
    pub missing_percentage: f64,
    pub duplicate_rows: usize,
    pub constant_columns: Vec<String>,
    pub has_datetime: bool,
    pub has_geographic: bool,
    pub has_text: bool,
    pub has_identifiers: bool,
    /// Pairs of usable numeric columns.
    pub potential_correlations: usize,
    /// Pairs of usable categorical/binary columns.
    pub potential_cross_tabs: usize,
    pub grouping_variables: Vec<String>,
    pub sample_size_category: SampleSizeCategory,
    pub numeric_summaries: BTreeMap<String, NumericSummary>,
    pub categorical_summaries: BTreeMap<String, CategoricalSummary>,
}

impl DataCharacteristics {
    /// True when there are no observations to analyze.
    pub fn is_empty(&self) -> bool {
        self.n_observations == 0
    }

    pub fn column(&self, name: &str) -> Option<&ColumnCharacteristics> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn count_of(&self, semantic_type: SemanticType) -> usize {
        self.type_counts.get(&semantic_type).copied().unwrap_or(0)
    }

    fn names_where(&self, pred: impl Fn(&ColumnCharacteristics) -> bool) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| pred(c))
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn numeric_columns(&self) -> Vec<String> {
        self.names_where(|c| c.semantic_type.is_numeric())
    }

    pub fn categorical_columns(&self) -> Vec<String> {
        self.names_where(|c| c.semantic_type.is_categorical_like())
    }

    /// Non-constant numeric columns.
    pub fn usable_numeric_columns(&self) -> Vec<String> {
        self.names_where(|c| c.semantic_type.is_numeric() && !c.is_constant)
    }

    /// Non-constant categorical or binary columns.
    pub fn usable_categorical_columns(&self) -> Vec<String> {
        self.names_where(|c| c.semantic_type.is_categorical_like() && !c.is_constant)
    }

    /// Binary columns that are not constant.
    pub fn binary_columns(&self) -> Vec<String> {
        self.names_where(|c| c.semantic_type == SemanticType::Binary && !c.is_constant)
    }

    pub fn text_columns(&self) -> Vec<String> {
        self.names_where(|c| c.semantic_type == SemanticType::Text)
    }

    pub fn datetime_columns(&self) -> Vec<String> {
        self.names_where(|c| c.semantic_type == SemanticType::Datetime)
    }

    pub fn geographic_columns(&self) -> Vec<String> {
        self.names_where(|c| c.semantic_type == SemanticType::Geographic)
    }

    pub fn columns_with_missing(&self) -> Vec<String> {
        self.names_where(|c| c.null_count > 0)
    }

    /// Every column that carries analyzable values (not identifiers or unknowns).
    pub fn analyzable_columns(&self) -> Vec<String> {
        self.names_where(|c| {
            !matches!(
                c.semantic_type,
                SemanticType::Identifier | SemanticType::Unknown
            )
        })
    }

    /// Grouping variables with at least `min_levels` distinct values.
    pub fn grouping_variables_with_levels(&self, min_levels: usize) -> Vec<String> {
        self.grouping_variables
            .iter()
            .filter(|name| {
                self.column(name)
                    .map(|c| c.unique_count >= min_levels)
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }
}

// ============================================================================
// Recommendations
// ============================================================================

/// Confidence tier of a recommendation, derived from its score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    /// Map a score onto a tier using the policy cutoffs.
    pub fn from_score(score: f64, policy: &ScoringPolicy) -> Self {
        if score >= policy.high_cutoff {
            Self::High
        } else if score >= policy.medium_cutoff {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// The three analysis modules, in tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisModule {
    Descriptive,
    Inferential,
    Qualitative,
}

impl AnalysisModule {
    pub const ALL: [AnalysisModule; 3] = [
        AnalysisModule::Descriptive,
        AnalysisModule::Inferential,
        AnalysisModule::Qualitative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Descriptive => "descriptive",
            Self::Inferential => "inferential",
            Self::Qualitative => "qualitative",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Descriptive => "Descriptive Statistics",
            Self::Inferential => "Inferential Statistics",
            Self::Qualitative => "Qualitative Analysis",
        }
    }
}

impl fmt::Display for AnalysisModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a method sits in an analysis workflow.
///
/// Foundational steps run before exploratory ones, which run before
/// hypothesis tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodTier {
    Foundational,
    Exploratory,
    Inferential,
}

/// One scored candidate method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub method: String,
    pub score: f64,
    pub confidence: Confidence,
    pub rationale: String,
    pub module: AnalysisModule,
    /// Empty when the method applies to the whole frame.
    pub required_variables: Vec<String>,
    pub tier: MethodTier,
}

/// A catalog method that could not be scored, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsuitableMethod {
    pub method: String,
    pub reason: String,
}

/// Output of one module detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSet {
    pub module: AnalysisModule,
    pub primary_recommendations: Vec<Recommendation>,
    pub secondary_recommendations: Vec<Recommendation>,
    pub optional_analyses: Vec<Recommendation>,
    pub data_quality_warnings: Vec<String>,
    /// Method names in prerequisite order.
    pub analysis_order: Vec<String>,
    pub unsuitable_methods: Vec<UnsuitableMethod>,
}

impl RecommendationSet {
    /// A set with no recommendations at all.
    pub fn empty(module: AnalysisModule) -> Self {
        Self {
            module,
            primary_recommendations: Vec::new(),
            secondary_recommendations: Vec::new(),
            optional_analyses: Vec::new(),
            data_quality_warnings: Vec::new(),
            analysis_order: Vec::new(),
            unsuitable_methods: Vec::new(),
        }
    }

    /// All recommendations, primary first.
    pub fn iter(&self) -> impl Iterator<Item = &Recommendation> {
        self.primary_recommendations
            .iter()
            .chain(self.secondary_recommendations.iter())
            .chain(self.optional_analyses.iter())
    }

    pub fn len(&self) -> usize {
        self.primary_recommendations.len()
            + self.secondary_recommendations.len()
            + self.optional_analyses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn find(&self, method: &str) -> Option<&Recommendation> {
        self.iter().find(|r| r.method == method)
    }

    pub fn primary_methods(&self) -> Vec<&str> {
        self.primary_recommendations
            .iter()
            .map(|r| r.method.as_str())
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semantic_type_serializes_snake_case() {
        let json = serde_json::to_string(&SemanticType::NumericContinuous).unwrap();
        assert_eq!(json, "\"numeric_continuous\"");
        for t in SemanticType::ALL {
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, format!("\"{}\"", t.as_str()));
        }
    }

    #[test]
    fn test_semantic_type_from_str_aliases() {
        assert_eq!("numeric".parse::<SemanticType>().unwrap(), SemanticType::NumericContinuous);
        assert_eq!("Likert".parse::<SemanticType>().unwrap(), SemanticType::Categorical);
        assert_eq!("yes-no".parse::<SemanticType>().unwrap(), SemanticType::Binary);
        assert_eq!("open ended".parse::<SemanticType>().unwrap(), SemanticType::Text);
        assert!("matrix".parse::<SemanticType>().is_err());
    }

    #[test]
    fn test_sample_size_category_thresholds() {
        let t = SampleSizeThresholds::default();
        assert_eq!(SampleSizeCategory::from_count(0, &t), SampleSizeCategory::VerySmall);
        assert_eq!(SampleSizeCategory::from_count(29, &t), SampleSizeCategory::VerySmall);
        assert_eq!(SampleSizeCategory::from_count(30, &t), SampleSizeCategory::Small);
        assert_eq!(SampleSizeCategory::from_count(99, &t), SampleSizeCategory::Small);
        assert_eq!(SampleSizeCategory::from_count(100, &t), SampleSizeCategory::Medium);
        assert_eq!(SampleSizeCategory::from_count(999, &t), SampleSizeCategory::Medium);
        assert_eq!(SampleSizeCategory::from_count(1000, &t), SampleSizeCategory::Large);
    }

    #[test]
    fn test_confidence_cutoffs_are_exact() {
        let policy = ScoringPolicy::default();
        assert_eq!(Confidence::from_score(0.69, &policy), Confidence::Medium);
        assert_eq!(Confidence::from_score(0.70, &policy), Confidence::High);
        assert_eq!(Confidence::from_score(0.39, &policy), Confidence::Low);
        assert_eq!(Confidence::from_score(0.40, &policy), Confidence::Medium);
        assert_eq!(Confidence::from_score(0.0, &policy), Confidence::Low);
        assert_eq!(Confidence::from_score(1.0, &policy), Confidence::High);
    }

    #[test]
    fn test_module_ordering_for_tie_breaks() {
        assert!(AnalysisModule::Descriptive < AnalysisModule::Inferential);
        assert!(AnalysisModule::Inferential < AnalysisModule::Qualitative);
        assert!(MethodTier::Foundational < MethodTier::Inferential);
    }

    #[test]
    fn test_type_counts_serialize_with_string_keys() {
        let mut counts = BTreeMap::new();
        counts.insert(SemanticType::Categorical, 2);
        counts.insert(SemanticType::Text, 1);
        let json = serde_json::to_string(&counts).unwrap();
        assert_eq!(json, r#"{"categorical":2,"text":1}"#);
    }

    #[test]
    fn test_variable_metadata_accepts_type_alias() {
        let meta: VariableMetadata =
            serde_json::from_str(r#"{"name": "q1", "type": "likert"}"#).unwrap();
        assert_eq!(meta.intended_type, "likert");
    }

    #[test]
    fn test_empty_recommendation_set() {
        let set = RecommendationSet::empty(AnalysisModule::Qualitative);
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
        assert!(set.find("text_statistics").is_none());
    }
}
