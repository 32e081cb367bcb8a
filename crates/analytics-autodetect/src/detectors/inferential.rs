use super::scoring::{
    MethodSpec, MissingSensitivity, Requirement, SpecialFeature, build_recommendation_set,
};
use super::{InferentialMethod, ModuleDetector};
use crate::config::DetectionConfig;
use crate::error::Result;
use crate::quality::DataQualityAnalyzer;
use crate::types::{AnalysisModule, DataCharacteristics, RecommendationSet, SampleSizeCategory};
use polars::prelude::DataFrame;
use tracing::info;

use InferentialMethod::*;

static CATALOG: &[MethodSpec<InferentialMethod, ()>] = &[
    MethodSpec {
        method: NormalityTests,
        min_sample: SampleSizeCategory::Small,
        missing_sensitivity: MissingSensitivity::Low,
        requirement: any_numeric,
        special_feature: Some(SpecialFeature {
            applies: |c: &DataCharacteristics, _: &()| has_skewed_numeric(c),
            reason: "skewed variables make the normality check decisive",
        }),
        prerequisites: &[],
        goal_keywords: &["normal", "assumption"],
    },
    MethodSpec {
        method: CorrelationTest,
        min_sample: SampleSizeCategory::Small,
        missing_sensitivity: MissingSensitivity::High,
        requirement: numeric_pairs,
        special_feature: Some(SpecialFeature {
            applies: |c: &DataCharacteristics, _: &()| c.potential_correlations >= 3,
            reason: "several numeric pairs to test",
        }),
        prerequisites: &[NormalityTests],
        goal_keywords: &["correlat", "relationship", "associat"],
    },
    MethodSpec {
        method: TTest,
        min_sample: SampleSizeCategory::Small,
        missing_sensitivity: MissingSensitivity::High,
        requirement: two_group_comparison,
        special_feature: Some(SpecialFeature {
            applies: |c: &DataCharacteristics, _: &()| {
                two_level_groups(c).iter().any(|g| is_balanced(c, g))
            },
            reason: "balanced groups",
        }),
        prerequisites: &[NormalityTests],
        goal_keywords: &["compare", "difference", "two groups", "t-test", "t test"],
    },
    MethodSpec {
        method: Anova,
        min_sample: SampleSizeCategory::Small,
        missing_sensitivity: MissingSensitivity::High,
        requirement: multi_group_comparison,
        special_feature: Some(SpecialFeature {
            applies: |c: &DataCharacteristics, _: &()| {
                c.grouping_variables_with_levels(3)
                    .iter()
                    .any(|g| is_balanced(c, g))
            },
            reason: "balanced groups",
        }),
        prerequisites: &[NormalityTests],
        goal_keywords: &["compare", "difference", "group", "anova"],
    },
    MethodSpec {
        method: ChiSquareTest,
        min_sample: SampleSizeCategory::Small,
        missing_sensitivity: MissingSensitivity::Low,
        requirement: categorical_pairs,
        special_feature: Some(SpecialFeature {
            applies: |c: &DataCharacteristics, _: &()| c.grouping_variables.len() >= 2,
            reason: "low-cardinality variables suit contingency tables",
        }),
        prerequisites: &[],
        goal_keywords: &["associat", "independen", "relationship"],
    },
    MethodSpec {
        method: NonparametricTests,
        min_sample: SampleSizeCategory::VerySmall,
        missing_sensitivity: MissingSensitivity::Low,
        requirement: rank_comparison,
        special_feature: Some(SpecialFeature {
            applies: |c: &DataCharacteristics, _: &()| {
                c.sample_size_category <= SampleSizeCategory::Small || has_skewed_numeric(c)
            },
            reason: "skewed or small samples favor rank-based tests",
        }),
        prerequisites: &[],
        goal_keywords: &["compare", "difference", "rank", "median"],
    },
    MethodSpec {
        method: RegressionAnalysis,
        min_sample: SampleSizeCategory::Medium,
        missing_sensitivity: MissingSensitivity::High,
        requirement: numeric_pairs,
        special_feature: Some(SpecialFeature {
            applies: |c: &DataCharacteristics, _: &()| c.usable_numeric_columns().len() >= 3,
            reason: "multiple predictors available",
        }),
        prerequisites: &[CorrelationTest, NormalityTests],
        goal_keywords: &["predict", "effect", "influence", "regression", "driver"],
    },
    MethodSpec {
        method: BootstrapAnalysis,
        min_sample: SampleSizeCategory::VerySmall,
        missing_sensitivity: MissingSensitivity::None,
        requirement: any_numeric,
        special_feature: Some(SpecialFeature {
            applies: |c: &DataCharacteristics, _: &()| {
                c.sample_size_category <= SampleSizeCategory::Small
            },
            reason: "small samples benefit from resampling",
        }),
        prerequisites: &[],
        goal_keywords: &["confidence interval", "uncertainty", "bootstrap"],
    },
];

fn has_skewed_numeric(c: &DataCharacteristics) -> bool {
    c.numeric_summaries.values().any(|s| s.skewness.abs() >= 1.0)
}

fn is_balanced(c: &DataCharacteristics, group: &str) -> bool {
    c.categorical_summaries
        .get(group)
        .map(|s| s.balance == "balanced")
        .unwrap_or(false)
}

fn two_level_groups(c: &DataCharacteristics) -> Vec<String> {
    c.grouping_variables
        .iter()
        .filter(|g| c.column(g).map(|col| col.unique_count == 2).unwrap_or(false))
        .cloned()
        .collect()
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

fn categorical_pairs(c: &DataCharacteristics, _: &(), _: &DetectionConfig) -> Requirement {
    let columns = c.usable_categorical_columns();
    if columns.len() < 2 {
        return Requirement::unmet("requires at least 2 non-constant categorical columns");
    }
    let summary = format!("{} categorical columns", columns.len());
    Requirement::met(columns, summary)
}

/// Numeric outcomes plus the first of `groups`.
fn outcome_by_group(
    c: &DataCharacteristics,
    groups: Vec<String>,
    unmet: &str,
    group_label: &str,
) -> Requirement {
    let numeric = c.usable_numeric_columns();
    let Some(group) = groups.into_iter().next() else {
        return Requirement::unmet(unmet);
    };
    if numeric.is_empty() {
        return Requirement::unmet(unmet);
    }
    let summary = format!(
        "{} numeric outcomes by {} '{}'",
        numeric.len(),
        group_label,
        group
    );
    let mut variables = numeric;
    variables.push(group);
    Requirement::met(variables, summary)
}

fn two_group_comparison(c: &DataCharacteristics, _: &(), _: &DetectionConfig) -> Requirement {
    outcome_by_group(
        c,
        two_level_groups(c),
        "requires a numeric outcome and a two-level grouping variable",
        "two-level group",
    )
}

fn multi_group_comparison(c: &DataCharacteristics, _: &(), _: &DetectionConfig) -> Requirement {
    outcome_by_group(
        c,
        c.grouping_variables_with_levels(3),
        "requires a numeric outcome and a grouping variable with at least 3 levels",
        "grouping variable",
    )
}

fn rank_comparison(c: &DataCharacteristics, _: &(), _: &DetectionConfig) -> Requirement {
    let numeric = c.usable_numeric_columns();
    if numeric.is_empty() {
        return Requirement::unmet("requires at least 1 non-constant numeric column");
    }
    if let Some(group) = c.grouping_variables.first() {
        let summary = format!("{} numeric outcomes by '{}'", numeric.len(), group);
        let mut variables = numeric;
        variables.push(group.clone());
        return Requirement::met(variables, summary);
    }
    if numeric.len() >= 2 {
        let summary = format!("{} numeric columns for rank correlation", numeric.len());
        return Requirement::partial(numeric, summary);
    }
    Requirement::unmet("requires a grouping variable or a second numeric column")
}

/// Hypothesis tests and models that generalize beyond the sample.
#[derive(Debug, Clone, Default)]
pub struct InferentialDetector {
    config: DetectionConfig,
}

impl InferentialDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }
}

impl ModuleDetector for InferentialDetector {
    fn module(&self) -> AnalysisModule {
        AnalysisModule::Inferential
    }

    fn suggest(
        &self,
        characteristics: &DataCharacteristics,
        _raw_data: Option<&DataFrame>,
        goals: Option<&[String]>,
    ) -> Result<RecommendationSet> {
        let warnings = DataQualityAnalyzer::warnings(characteristics, &self.config.warnings);
        let set = build_recommendation_set(
            AnalysisModule::Inferential,
            CATALOG,
            characteristics,
            &(),
            goals,
            &self.config,
            warnings,
        );
        info!(
            "Inferential detector: {} recommended, {} unsuitable",
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
    use crate::types::Confidence;
    use polars::prelude::*;
    use pretty_assertions::assert_eq;

    fn suggest(df: &DataFrame, goals: Option<&[String]>) -> RecommendationSet {
        let characteristics = DataProfiler::new().profile(df, None).unwrap();
        InferentialDetector::default()
            .suggest(&characteristics, Some(df), goals)
            .unwrap()
    }

    fn treatment_frame(n: usize) -> DataFrame {
        let group: Vec<&str> = (0..n)
            .map(|i| if i % 2 == 0 { "control" } else { "treatment" })
            .collect();
        let site: Vec<&str> = (0..n).map(|i| ["north", "south", "east"][i % 3]).collect();
        let outcome: Vec<f64> = (0..n)
            .map(|i| 50.0 + (i % 2) as f64 * 5.0 + (i * 13 % 29) as f64 * 0.7)
            .collect();
        df! { "group" => group, "site" => site, "outcome" => outcome }.unwrap()
    }

    #[test]
    fn test_catalog_is_in_enum_order() {
        let methods: Vec<_> = CATALOG.iter().map(|s| s.method).collect();
        assert_eq!(methods, InferentialMethod::ALL.to_vec());
    }

    #[test]
    fn test_group_comparisons() {
        let set = suggest(&treatment_frame(120), None);

        let t_test = set.find("t_test").unwrap();
        assert_eq!(t_test.confidence, Confidence::High);
        assert_eq!(
            t_test.required_variables,
            vec!["outcome".to_string(), "group".to_string()]
        );
        assert!(t_test.rationale.contains("balanced groups"));

        let anova = set.find("anova").unwrap();
        assert_eq!(
            anova.required_variables,
            vec!["outcome".to_string(), "site".to_string()]
        );

        assert!(set.find("chi_square_test").is_some());
        assert!(set.find("correlation_test").is_none());
        assert!(set.find("regression_analysis").is_none());
    }

    #[test]
    fn test_analysis_order_puts_normality_first() {
        let set = suggest(&treatment_frame(120), None);
        assert_eq!(set.analysis_order.first().map(String::as_str), Some("normality_tests"));
        let pos = |m: &str| set.analysis_order.iter().position(|x| x == m).unwrap();
        assert!(pos("normality_tests") < pos("t_test"));
        assert!(pos("normality_tests") < pos("anova"));
    }

    #[test]
    fn test_regression_follows_correlation_test() {
        let n = 150;
        let x: Vec<f64> = (0..n).map(|i| i as f64 * 0.8).collect();
        let y: Vec<f64> = (0..n).map(|i| i as f64 * 1.7 + (i % 7) as f64).collect();
        let z: Vec<f64> = (0..n).map(|i| (i * 31 % 97) as f64 * 1.1).collect();
        let df = df! { "x" => x, "y" => y, "z" => z }.unwrap();
        let set = suggest(&df, None);

        let regression = set.find("regression_analysis").unwrap();
        assert!(regression.rationale.contains("multiple predictors"));
        let pos = |m: &str| set.analysis_order.iter().position(|x| x == m).unwrap();
        assert!(pos("correlation_test") < pos("regression_analysis"));
        assert!(pos("normality_tests") < pos("correlation_test"));
    }

    #[test]
    fn test_goals_annotate_but_never_change_scores() {
        let df = treatment_frame(120);
        let plain = suggest(&df, None);
        let goals = vec!["Compare outcomes between treatment groups".to_string()];
        let with_goal = suggest(&df, Some(&goals));

        for (a, b) in plain.iter().zip(with_goal.iter()) {
            assert_eq!(a.method, b.method);
            assert_eq!(a.score, b.score);
        }
        assert!(
            with_goal
                .find("t_test")
                .unwrap()
                .rationale
                .contains("aligned with stated goal")
        );
        assert!(
            !with_goal
                .find("normality_tests")
                .unwrap()
                .rationale
                .contains("aligned with stated goal")
        );
    }

    #[test]
    fn test_no_numeric_no_tests_on_outcomes() {
        let df = df! {
            "a" => &["x", "y", "x", "y", "z", "x"],
            "b" => &["p", "q", "q", "p", "p", "q"],
        }
        .unwrap();
        let set = suggest(&df, None);
        for method in ["normality_tests", "t_test", "anova", "correlation_test"] {
            assert!(set.find(method).is_none(), "{} should be unsuitable", method);
        }
        assert!(set.find("chi_square_test").is_some());
    }
}
