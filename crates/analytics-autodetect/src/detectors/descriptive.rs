use super::scoring::{
    MethodSpec, MissingSensitivity, Requirement, SpecialFeature, build_recommendation_set,
};
use super::{DescriptiveMethod, ModuleDetector};
use crate::config::DetectionConfig;
use crate::error::Result;
use crate::quality::DataQualityAnalyzer;
use crate::types::{AnalysisModule, DataCharacteristics, RecommendationSet, SampleSizeCategory};
use polars::prelude::DataFrame;
use tracing::info;

use DescriptiveMethod::*;

static CATALOG: &[MethodSpec<DescriptiveMethod, ()>] = &[
    MethodSpec {
        method: BasicStatistics,
        min_sample: SampleSizeCategory::VerySmall,
        missing_sensitivity: MissingSensitivity::None,
        requirement: basic_statistics,
        special_feature: None,
        prerequisites: &[],
        goal_keywords: &["summary", "summarize", "describe", "overview"],
    },
    MethodSpec {
        method: MissingDataAnalysis,
        min_sample: SampleSizeCategory::VerySmall,
        missing_sensitivity: MissingSensitivity::None,
        requirement: missing_data,
        special_feature: Some(SpecialFeature {
            applies: |c: &DataCharacteristics, _: &()| c.columns_with_missing().len() >= 2,
            reason: "missing values spread across several columns",
        }),
        prerequisites: &[BasicStatistics],
        goal_keywords: &["missing", "quality", "complete"],
    },
    MethodSpec {
        method: DistributionAnalysis,
        min_sample: SampleSizeCategory::Small,
        missing_sensitivity: MissingSensitivity::Low,
        requirement: any_numeric,
        special_feature: Some(SpecialFeature {
            applies: |c: &DataCharacteristics, _: &()| {
                c.numeric_summaries.values().any(|s| s.skewness.abs() >= 1.0)
            },
            reason: "skewed variables present",
        }),
        prerequisites: &[MissingDataAnalysis],
        goal_keywords: &["distribution", "spread", "shape"],
    },
    MethodSpec {
        method: OutlierDetection,
        min_sample: SampleSizeCategory::Small,
        missing_sensitivity: MissingSensitivity::Low,
        requirement: any_numeric,
        special_feature: Some(SpecialFeature {
            applies: |c: &DataCharacteristics, _: &()| {
                c.numeric_summaries.values().any(|s| s.has_outliers)
            },
            reason: "IQR outliers detected",
        }),
        prerequisites: &[DistributionAnalysis],
        goal_keywords: &["outlier", "anomal", "extreme"],
    },
    MethodSpec {
        method: CorrelationAnalysis,
        min_sample: SampleSizeCategory::Small,
        missing_sensitivity: MissingSensitivity::High,
        requirement: numeric_pairs,
        special_feature: Some(SpecialFeature {
            applies: |c: &DataCharacteristics, _: &()| c.potential_correlations >= 3,
            reason: "several numeric pairs to compare",
        }),
        prerequisites: &[OutlierDetection],
        goal_keywords: &["correlat", "relationship", "associat"],
    },
    MethodSpec {
        method: CategoricalAnalysis,
        min_sample: SampleSizeCategory::VerySmall,
        missing_sensitivity: MissingSensitivity::Low,
        requirement: any_categorical,
        special_feature: Some(SpecialFeature {
            applies: |c: &DataCharacteristics, _: &()| !c.grouping_variables.is_empty(),
            reason: "grouping variables available",
        }),
        prerequisites: &[OutlierDetection],
        goal_keywords: &["categor", "frequenc", "group", "segment"],
    },
    MethodSpec {
        method: CrossTabulation,
        min_sample: SampleSizeCategory::Small,
        missing_sensitivity: MissingSensitivity::Low,
        requirement: categorical_pairs,
        special_feature: Some(SpecialFeature {
            applies: |c: &DataCharacteristics, _: &()| c.potential_cross_tabs >= 3,
            reason: "several categorical pairs to cross",
        }),
        prerequisites: &[CategoricalAnalysis],
        goal_keywords: &["cross", "contingency", "breakdown"],
    },
    MethodSpec {
        method: TemporalAnalysis,
        min_sample: SampleSizeCategory::Small,
        missing_sensitivity: MissingSensitivity::Low,
        requirement: datetime_columns,
        special_feature: Some(SpecialFeature {
            applies: |c: &DataCharacteristics, _: &()| {
                !c.usable_numeric_columns().is_empty()
            },
            reason: "numeric measures available to trend over time",
        }),
        prerequisites: &[BasicStatistics],
        goal_keywords: &["trend", "time", "season", "over time"],
    },
    MethodSpec {
        method: GeospatialAnalysis,
        min_sample: SampleSizeCategory::Small,
        missing_sensitivity: MissingSensitivity::Low,
        requirement: geographic_columns,
        special_feature: Some(SpecialFeature {
            applies: |c: &DataCharacteristics, _: &()| c.geographic_columns().len() >= 2,
            reason: "coordinate columns available",
        }),
        prerequisites: &[BasicStatistics],
        goal_keywords: &["map", "location", "spatial", "region", "geograph"],
    },
];

fn basic_statistics(c: &DataCharacteristics, _: &(), _: &DetectionConfig) -> Requirement {
    let analyzable = c.analyzable_columns();
    if analyzable.is_empty() {
        return Requirement::unmet("no analyzable columns");
    }
    let summary = format!("{} analyzable columns", analyzable.len());
    if c.usable_numeric_columns().is_empty() && c.usable_categorical_columns().is_empty() {
        Requirement::partial(Vec::new(), summary)
    } else {
        Requirement::met(Vec::new(), summary)
    }
}

fn missing_data(c: &DataCharacteristics, _: &(), _: &DetectionConfig) -> Requirement {
    let columns = c.columns_with_missing();
    if columns.is_empty() {
        return Requirement::unmet("no missing values to analyze");
    }
    let summary = format!("{} columns with missing values", columns.len());
    Requirement::met(columns, summary)
}

fn any_numeric(c: &DataCharacteristics, _: &(), _: &DetectionConfig) -> Requirement {
    let columns = c.usable_numeric_columns();
    if columns.is_empty() {
        return Requirement::unmet("requires at least 1 non-constant numeric column");
    }
    let summary = format!("{} numeric columns", columns.len());
    Requirement::met(columns, summary)
}

fn numeric_pairs(c: &DataCharacteristics, _: &(), _: &DetectionConfig) -> Requirement {
    let columns = c.usable_numeric_columns();
    if columns.len() < 2 {
        return Requirement::unmet("requires at least 2 non-constant numeric columns");
    }
    let summary = format!("{} numeric columns", columns.len());
    Requirement::met(columns, summary)
}

fn any_categorical(c: &DataCharacteristics, _: &(), _: &DetectionConfig) -> Requirement {
    let columns = c.usable_categorical_columns();
    if columns.is_empty() {
        return Requirement::unmet("requires at least 1 non-constant categorical column");
    }
    let summary = format!("{} categorical columns", columns.len());
    Requirement::met(columns, summary)
}

fn categorical_pairs(c: &DataCharacteristics, _: &(), _: &DetectionConfig) -> Requirement {
    let columns = c.usable_categorical_columns();
    if columns.len() < 2 {
        return Requirement::unmet("requires at least 2 non-constant categorical columns");
    }
    let summary = format!("{} categorical columns", columns.len());
    Requirement::met(columns, summary)
}

fn datetime_columns(c: &DataCharacteristics, _: &(), _: &DetectionConfig) -> Requirement {
    let columns = c.datetime_columns();
    if columns.is_empty() {
        return Requirement::unmet("requires a datetime column");
    }
    let summary = format!("{} datetime columns", columns.len());
    Requirement::met(columns, summary)
}

fn geographic_columns(c: &DataCharacteristics, _: &(), _: &DetectionConfig) -> Requirement {
    let columns = c.geographic_columns();
    if columns.is_empty() {
        return Requirement::unmet("requires a geographic column");
    }
    let summary = format!("{} geographic columns", columns.len());
    Requirement::met(columns, summary)
}

/// Summaries, distributions and relationships of the columns as they are.
#[derive(Debug, Clone, Default)]
pub struct DescriptiveDetector {
    config: DetectionConfig,
}

impl DescriptiveDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }
}

impl ModuleDetector for DescriptiveDetector {
    fn module(&self) -> AnalysisModule {
        AnalysisModule::Descriptive
    }

    fn suggest(
        &self,
        characteristics: &DataCharacteristics,
        _raw_data: Option<&DataFrame>,
        goals: Option<&[String]>,
    ) -> Result<RecommendationSet> {
        let warnings = DataQualityAnalyzer::warnings(characteristics, &self.config.warnings);
        let set = build_recommendation_set(
            AnalysisModule::Descriptive,
            CATALOG,
            characteristics,
            &(),
            goals,
            &self.config,
            warnings,
        );
        info!(
            "Descriptive detector: {} recommended, {} unsuitable",
            set.len(),
            set.unsuitable_methods.len()
        );
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiler::DataProfiler;
    use polars::prelude::*;
    use pretty_assertions::assert_eq;

    fn suggest(df: &DataFrame) -> RecommendationSet {
        let characteristics = DataProfiler::new().profile(df, None).unwrap();
        DescriptiveDetector::default()
            .suggest(&characteristics, Some(df), None)
            .unwrap()
    }

    fn mixed_frame(n: usize) -> DataFrame {
        let age: Vec<i64> = (0..n as i64).map(|i| 20 + (i * 7) % 45).collect();
        let income: Vec<f64> = (0..n).map(|i| 25_000.0 + (i * 37 % 101) as f64 * 410.0).collect();
        let dept: Vec<&str> = (0..n).map(|i| ["HR", "IT", "Sales", "Ops"][i % 4]).collect();
        df! { "age" => age, "income" => income, "department" => dept }.unwrap()
    }

    #[test]
    fn test_catalog_is_in_enum_order() {
        let methods: Vec<_> = CATALOG.iter().map(|s| s.method).collect();
        assert_eq!(methods, DescriptiveMethod::ALL.to_vec());
    }

    #[test]
    fn test_mixed_frame_recommendations() {
        let set = suggest(&mixed_frame(200));

        let basic = set.find("basic_statistics").unwrap();
        assert_eq!(basic.score, 0.85);
        assert!(set.primary_methods().contains(&"basic_statistics"));
        assert!(set.primary_methods().contains(&"correlation_analysis"));
        assert!(set.primary_methods().contains(&"categorical_analysis"));

        let correlation = set.find("correlation_analysis").unwrap();
        assert_eq!(
            correlation.required_variables,
            vec!["age".to_string(), "income".to_string()]
        );

        let unsuitable: Vec<_> = set.unsuitable_methods.iter().map(|u| u.method.as_str()).collect();
        assert_eq!(
            unsuitable,
            vec![
                "missing_data_analysis",
                "cross_tabulation",
                "temporal_analysis",
                "geospatial_analysis"
            ]
        );
    }

    #[test]
    fn test_analysis_order_follows_prerequisites() {
        let set = suggest(&mixed_frame(200));
        assert_eq!(
            set.analysis_order,
            vec![
                "basic_statistics",
                "distribution_analysis",
                "outlier_detection",
                "correlation_analysis",
                "categorical_analysis"
            ]
        );
    }

    #[test]
    fn test_every_recommendation_is_bounded_and_tiered() {
        let set = suggest(&mixed_frame(40));
        for rec in set.iter() {
            assert!(rec.score > 0.0 && rec.score <= 1.0);
            assert_eq!(rec.module, AnalysisModule::Descriptive);
        }
        for rec in &set.primary_recommendations {
            assert!(rec.score >= 0.7);
        }
        for rec in &set.secondary_recommendations {
            assert!(rec.score >= 0.4 && rec.score < 0.7);
        }
    }

    #[test]
    fn test_zero_rows_recommend_nothing() {
        let df = df! { "a" => Vec::<f64>::new(), "b" => Vec::<String>::new() }.unwrap();
        let set = suggest(&df);
        assert!(set.is_empty());
        assert!(set.analysis_order.is_empty());
        assert_eq!(set.unsuitable_methods.len(), DescriptiveMethod::ALL.len());
        assert!(!set.data_quality_warnings.is_empty());
    }

    #[test]
    fn test_temporal_and_geospatial() {
        let n = 60;
        let dates: Vec<String> = (0..n)
            .map(|i| format!("2024-{:02}-{:02}", 1 + i % 12, 1 + i % 28))
            .collect();
        let lat: Vec<f64> = (0..n).map(|i| 10.0 + i as f64 * 0.05).collect();
        let lon: Vec<f64> = (0..n).map(|i| 120.0 + i as f64 * 0.05).collect();
        let visits: Vec<f64> = (0..n).map(|i| i as f64 * 2.5).collect();
        let df = df! {
            "visit_date" => dates,
            "latitude" => lat,
            "longitude" => lon,
            "visits" => visits,
        }
        .unwrap();
        let set = suggest(&df);

        let temporal = set.find("temporal_analysis").unwrap();
        assert_eq!(temporal.required_variables, vec!["visit_date".to_string()]);
        assert!(temporal.rationale.contains("trend over time"));

        let geo = set.find("geospatial_analysis").unwrap();
        assert_eq!(geo.score, 0.95);
    }
}
