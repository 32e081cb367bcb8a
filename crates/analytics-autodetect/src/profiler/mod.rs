//! Dataset profiling.
//!
//! This module turns a DataFrame into [`DataCharacteristics`]:
//! - Semantic type classification per column
//! - Caller overrides from variable metadata
//! - Completeness, duplicates and constant columns
//! - Numeric and categorical summaries
//! - Derived counts the detectors score against

mod statistics;
mod type_inference;

pub use type_inference::{ColumnClassification, classify_column, classify_column_with};

use crate::config::DetectionConfig;
use crate::error::Result;
use crate::types::{
    ColumnCharacteristics, DataCharacteristics, SampleSizeCategory, SemanticType,
    VariableMetadata,
};
use crate::utils::pair_count;
use polars::prelude::*;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

use statistics::{categorical_summary, numeric_summary, numeric_values};

/// Data profiler for analyzing dataset structure and characteristics.
#[derive(Debug, Clone, Default)]
pub struct DataProfiler {
    config: DetectionConfig,
}

impl DataProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DetectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Profile an entire dataset.
    ///
    /// Columns that cannot be read are profiled as [`SemanticType::Unknown`];
    /// metadata entries naming missing columns or unrecognized types are
    /// ignored with a warning. Rejecting frames without columns is left to
    /// the caller.
    pub fn profile(
        &self,
        df: &DataFrame,
        metadata: Option<&[VariableMetadata]>,
    ) -> Result<DataCharacteristics> {
        let n_rows = df.height();
        let n_cols = df.width();
        info!("Profiling dataset: {} rows x {} columns", n_rows, n_cols);

        let overrides = Self::resolve_overrides(df, metadata);

        let mut columns = Vec::with_capacity(n_cols);
        let mut numeric_summaries = BTreeMap::new();
        let mut categorical_summaries = BTreeMap::new();

        for name in df.get_column_names() {
            let series = df.column(name)?.as_materialized_series();
            let column = self.profile_column(series, overrides.get(name.as_str()).copied())?;

            if column.semantic_type.is_numeric() {
                match numeric_values(series) {
                    Ok(values) => {
                        if let Some(summary) = numeric_summary(&values) {
                            numeric_summaries.insert(column.name.clone(), summary);
                        }
                    }
                    Err(e) => warn!("Skipping numeric summary for '{}': {}", column.name, e),
                }
            } else if column.semantic_type.is_categorical_like() {
                match categorical_summary(series) {
                    Ok(Some(summary)) => {
                        categorical_summaries.insert(column.name.clone(), summary);
                    }
                    Ok(None) => {}
                    Err(e) => warn!("Skipping categorical summary for '{}': {}", column.name, e),
                }
            }

            columns.push(column);
        }

        let mut type_counts: BTreeMap<SemanticType, usize> = BTreeMap::new();
        for column in &columns {
            *type_counts.entry(column.semantic_type).or_insert(0) += 1;
        }

        let completeness_score = completeness_score(&columns, n_rows);
        let missing_percentage = missing_percentage(&columns, n_rows);

        let duplicate_rows = Self::count_duplicates(df);

        let constant_columns = columns
            .iter()
            .filter(|c| c.is_constant)
            .map(|c| c.name.clone())
            .collect();

        let max_levels = self.config.scoring.max_grouping_levels;
        let grouping_variables = columns
            .iter()
            .filter(|c| {
                c.semantic_type.is_categorical_like()
                    && !c.is_constant
                    && (2..=max_levels).contains(&c.unique_count)
            })
            .map(|c| c.name.clone())
            .collect();

        let has = |t: SemanticType| type_counts.contains_key(&t);
        let has_datetime = has(SemanticType::Datetime);
        let has_geographic = has(SemanticType::Geographic);
        let has_text = has(SemanticType::Text);
        let has_identifiers = has(SemanticType::Identifier);

        let mut characteristics = DataCharacteristics {
            n_observations: n_rows,
            n_variables: n_cols,
            data_shape: (n_rows, n_cols),
            type_counts,
            columns,
            completeness_score,
            missing_percentage,
            duplicate_rows,
            constant_columns,
            has_datetime,
            has_geographic,
            has_text,
            has_identifiers,
            potential_correlations: 0,
            potential_cross_tabs: 0,
            grouping_variables,
            sample_size_category: SampleSizeCategory::from_count(
                n_rows,
                &self.config.sample_sizes,
            ),
            numeric_summaries,
            categorical_summaries,
        };
        characteristics.potential_correlations =
            pair_count(characteristics.usable_numeric_columns().len());
        characteristics.potential_cross_tabs =
            pair_count(characteristics.usable_categorical_columns().len());

        info!(
            "Profile complete: {} types, completeness {:.1}%, {} duplicate rows",
            characteristics.type_counts.len(),
            characteristics.completeness_score,
            characteristics.duplicate_rows
        );

        Ok(characteristics)
    }

    fn profile_column(
        &self,
        series: &Series,
        override_type: Option<SemanticType>,
    ) -> Result<ColumnCharacteristics> {
        let name = series.name().to_string();
        let len = series.len();
        let null_count = series.null_count();
        let null_percentage = if len == 0 {
            0.0
        } else {
            null_count as f64 / len as f64 * 100.0
        };
        let unique_count = series.drop_nulls().n_unique()?;

        let (semantic_type, classification_confidence, overridden) = match override_type {
            Some(t) => (t, 1.0, true),
            None => {
                let c = classify_column_with(series, &self.config.classifier);
                (c.semantic_type, c.confidence, false)
            }
        };

        debug!(
            "Column '{}': {} (confidence {:.2}{})",
            name,
            semantic_type,
            classification_confidence,
            if overridden { ", overridden" } else { "" }
        );

        Ok(ColumnCharacteristics {
            name,
            semantic_type,
            null_count,
            null_percentage,
            unique_count,
            is_constant: unique_count == 1,
            classification_confidence,
            overridden,
        })
    }

    fn resolve_overrides(
        df: &DataFrame,
        metadata: Option<&[VariableMetadata]>,
    ) -> HashMap<String, SemanticType> {
        let mut overrides = HashMap::new();
        let Some(metadata) = metadata else {
            return overrides;
        };

        for meta in metadata {
            if df.column(&meta.name).is_err() {
                warn!("Metadata names unknown column '{}', ignoring", meta.name);
                continue;
            }
            match meta.intended_type.parse::<SemanticType>() {
                Ok(t) => {
                    overrides.insert(meta.name.clone(), t);
                }
                Err(e) => warn!("Ignoring metadata for '{}': {}", meta.name, e),
            }
        }
        overrides
    }

    fn count_duplicates(df: &DataFrame) -> usize {
        if df.height() == 0 {
            return 0;
        }
        match df.unique::<&str, &str>(None, UniqueKeepStrategy::First, None) {
            Ok(unique) => df.height() - unique.height(),
            Err(e) => {
                warn!("Could not check duplicate rows: {}", e);
                0
            }
        }
    }
}

/// Column-weighted completeness: mean of per-column non-null percentages.
fn completeness_score(columns: &[ColumnCharacteristics], n_rows: usize) -> f64 {
    if n_rows == 0 || columns.is_empty() {
        return 0.0;
    }
    columns
        .iter()
        .map(|c| 100.0 - c.null_percentage)
        .sum::<f64>()
        / columns.len() as f64
}

/// Cell-level share of nulls across the whole frame.
fn missing_percentage(columns: &[ColumnCharacteristics], n_rows: usize) -> f64 {
    let cells = n_rows * columns.len();
    if cells == 0 {
        return 0.0;
    }
    let total_nulls: usize = columns.iter().map(|c| c.null_count).sum();
    total_nulls as f64 / cells as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn survey_frame() -> DataFrame {
        let n = 120;
        let ages: Vec<i64> = (0..n).map(|i| 18 + (i * 7) % 60).collect();
        let departments: Vec<&str> = (0..n)
            .map(|i| ["HR", "IT", "Sales"][i as usize % 3])
            .collect();
        let income: Vec<Option<f64>> = (0..n)
            .map(|i| {
                if i % 10 == 0 {
                    None
                } else {
                    Some(30_000.0 + i as f64 * 412.5)
                }
            })
            .collect();
        let smoker: Vec<&str> = (0..n).map(|i| if i % 4 == 0 { "yes" } else { "no" }).collect();
        df! {
            "respondent_id" => (0..n).collect::<Vec<i64>>(),
            "age" => ages,
            "department" => departments,
            "income" => income,
            "smoker" => smoker,
            "wave" => vec![1i64; n as usize],
        }
        .unwrap()
    }

    #[test]
    fn test_profile_types_and_counts() {
        let df = survey_frame();
        let profile = DataProfiler::new().profile(&df, None).unwrap();

        assert_eq!(profile.n_observations, 120);
        assert_eq!(profile.n_variables, 6);
        assert_eq!(profile.data_shape, (120, 6));
        assert_eq!(profile.type_counts.values().sum::<usize>(), 6);

        assert_eq!(
            profile.column("respondent_id").unwrap().semantic_type,
            SemanticType::Identifier
        );
        assert_eq!(
            profile.column("age").unwrap().semantic_type,
            SemanticType::NumericContinuous
        );
        assert_eq!(
            profile.column("department").unwrap().semantic_type,
            SemanticType::Categorical
        );
        assert_eq!(profile.column("smoker").unwrap().semantic_type, SemanticType::Binary);
        assert!(profile.has_identifiers);
        assert!(!profile.has_text);
    }

    #[test]
    fn test_profile_quality_facts() {
        let df = survey_frame();
        let profile = DataProfiler::new().profile(&df, None).unwrap();

        assert_eq!(profile.constant_columns, vec!["wave".to_string()]);
        assert_eq!(profile.duplicate_rows, 0);

        // 12 nulls in one of six columns of 120 rows
        assert!((profile.missing_percentage - 12.0 / 720.0 * 100.0).abs() < 1e-9);
        assert!((profile.completeness_score - (500.0 + 90.0) / 6.0).abs() < 1e-9);
        assert!(profile.completeness_score <= 100.0);
    }

    #[test]
    fn test_profile_derived_counts() {
        let df = survey_frame();
        let profile = DataProfiler::new().profile(&df, None).unwrap();

        assert_eq!(profile.potential_correlations, 1);
        assert_eq!(profile.potential_cross_tabs, 1);
        assert_eq!(
            profile.grouping_variables,
            vec!["department".to_string(), "smoker".to_string()]
        );
        assert_eq!(profile.sample_size_category, SampleSizeCategory::Medium);
        assert!(profile.numeric_summaries.contains_key("income"));
        assert!(profile.categorical_summaries.contains_key("department"));
        assert!(!profile.numeric_summaries.contains_key("respondent_id"));
    }

    #[test]
    fn test_metadata_overrides_classification() {
        let df = survey_frame();
        let metadata = vec![
            VariableMetadata::new("age", "categorical"),
            VariableMetadata::new("missing_column", "text"),
            VariableMetadata::new("income", "matrix"),
        ];
        let profile = DataProfiler::new().profile(&df, Some(&metadata)).unwrap();

        let age = profile.column("age").unwrap();
        assert_eq!(age.semantic_type, SemanticType::Categorical);
        assert!(age.overridden);
        assert_eq!(age.classification_confidence, 1.0);

        let income = profile.column("income").unwrap();
        assert!(!income.overridden);
        assert_eq!(income.semantic_type, SemanticType::NumericContinuous);
    }

    #[test]
    fn test_duplicates_are_counted() {
        let df = df! {
            "a" => &[1i64, 1, 2, 2, 3],
            "b" => &["x", "x", "y", "y", "z"],
        }
        .unwrap();
        let profile = DataProfiler::new().profile(&df, None).unwrap();
        assert_eq!(profile.duplicate_rows, 2);
    }

    #[test]
    fn test_zero_rows() {
        let df = df! {
            "a" => Vec::<i64>::new(),
            "b" => Vec::<String>::new(),
        }
        .unwrap();
        let profile = DataProfiler::new().profile(&df, None).unwrap();
        assert!(profile.is_empty());
        assert_eq!(profile.completeness_score, 0.0);
        assert_eq!(profile.missing_percentage, 0.0);
        assert_eq!(profile.count_of(SemanticType::Unknown), 2);
        assert_eq!(profile.sample_size_category, SampleSizeCategory::VerySmall);
    }

    #[test]
    fn test_zero_columns_profiles_as_empty() {
        let df = DataFrame::empty();
        let profile = DataProfiler::new().profile(&df, None).unwrap();
        assert_eq!(profile.n_variables, 0);
        assert!(profile.type_counts.is_empty());
        assert_eq!(profile.completeness_score, 0.0);
    }

    #[test]
    fn test_profile_is_deterministic() {
        let df = survey_frame();
        let profiler = DataProfiler::new();
        let first = profiler.profile(&df, None).unwrap();
        let second = profiler.profile(&df, None).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_column_selectors() {
        let profile = DataProfiler::new().profile(&survey_frame(), None).unwrap();

        assert_eq!(profile.categorical_columns(), vec!["department", "smoker", "wave"]);
        assert_eq!(profile.binary_columns(), vec!["smoker"]);
        assert_eq!(profile.usable_numeric_columns(), vec!["age", "income"]);
    }
}
