use crate::config::{QualityWeights, WarningThresholds};
use crate::types::DataCharacteristics;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Letter grade for overall data quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QualityGrade {
    A,
    B,
    C,
    D,
    F,
}

impl QualityGrade {
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Self::A
        } else if score >= 80.0 {
            Self::B
        } else if score >= 70.0 {
            Self::C
        } else if score >= 60.0 {
            Self::D
        } else {
            Self::F
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        }
    }
}

impl fmt::Display for QualityGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Frame-level quality facts shared by all modules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataQualitySummary {
    /// 0-100, weighted from completeness, duplicates and constant columns.
    pub overall_score: f64,
    pub grade: QualityGrade,
    pub sample_size_adequacy: String,
    pub completeness_score: f64,
    pub missing_percentage: f64,
    pub duplicate_rows: usize,
    pub constant_columns: Vec<String>,
}

pub struct DataQualityAnalyzer;

impl DataQualityAnalyzer {
    /// Warnings about the frame as a whole.
    ///
    /// Every detector calls this with the same profile, so identical
    /// conditions produce identical strings and deduplicate downstream.
    pub fn warnings(
        characteristics: &DataCharacteristics,
        thresholds: &WarningThresholds,
    ) -> Vec<String> {
        let mut warnings = Vec::new();

        if characteristics.n_observations == 0 {
            warnings.push("Dataset has no observations; no analysis can be run".to_string());
            return warnings;
        }

        if characteristics.missing_percentage > thresholds.missing_percentage {
            warnings.push(format!(
                "High missing data: {:.1}% of values are missing",
                characteristics.missing_percentage
            ));
        }

        if characteristics.duplicate_rows > 0 {
            warnings.push(format!(
                "{} duplicate row(s) detected; consider deduplicating before analysis",
                characteristics.duplicate_rows
            ));
        }

        if !characteristics.constant_columns.is_empty() {
            warnings.push(format!(
                "Constant columns carry no information: {}",
                characteristics.constant_columns.join(", ")
            ));
        }

        if characteristics.n_observations < thresholds.min_observations {
            warnings.push(format!(
                "Small sample size (n={}): statistical power is limited",
                characteristics.n_observations
            ));
        }

        warnings
    }

    pub fn summarize(
        characteristics: &DataCharacteristics,
        weights: &QualityWeights,
    ) -> DataQualitySummary {
        let overall_score = Self::overall_score(characteristics, weights);

        DataQualitySummary {
            overall_score,
            grade: QualityGrade::from_score(overall_score),
            sample_size_adequacy: characteristics
                .sample_size_category
                .adequacy_label()
                .to_string(),
            completeness_score: characteristics.completeness_score,
            missing_percentage: characteristics.missing_percentage,
            duplicate_rows: characteristics.duplicate_rows,
            constant_columns: characteristics.constant_columns.clone(),
        }
    }

    fn overall_score(characteristics: &DataCharacteristics, weights: &QualityWeights) -> f64 {
        let duplicate_pct = percentage(
            characteristics.duplicate_rows,
            characteristics.n_observations,
        );
        let constant_pct = percentage(
            characteristics.constant_columns.len(),
            characteristics.n_variables,
        );

        let score = characteristics.completeness_score * weights.completeness
            + (100.0 - duplicate_pct) * weights.duplicates
            + (100.0 - constant_pct) * weights.constant_columns;

        (score.clamp(0.0, 100.0) * 100.0).round() / 100.0
    }
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiler::DataProfiler;
    use polars::prelude::*;

    fn profile(df: &DataFrame) -> DataCharacteristics {
        DataProfiler::new().profile(df, None).unwrap()
    }

    #[test]
    fn test_grade_boundaries() {
        assert_eq!(QualityGrade::from_score(90.0), QualityGrade::A);
        assert_eq!(QualityGrade::from_score(89.99), QualityGrade::B);
        assert_eq!(QualityGrade::from_score(70.0), QualityGrade::C);
        assert_eq!(QualityGrade::from_score(60.0), QualityGrade::D);
        assert_eq!(QualityGrade::from_score(59.9), QualityGrade::F);
    }

    #[test]
    fn test_clean_frame_has_no_warnings_and_grade_a() {
        let values: Vec<f64> = (0..50).map(|i| i as f64 * 1.5).collect();
        let groups: Vec<&str> = (0..50).map(|i| if i % 2 == 0 { "a" } else { "b" }).collect();
        let df = df! { "score" => values, "group" => groups }.unwrap();
        let characteristics = profile(&df);

        let warnings =
            DataQualityAnalyzer::warnings(&characteristics, &WarningThresholds::default());
        assert!(warnings.is_empty(), "unexpected warnings: {:?}", warnings);

        let summary = DataQualityAnalyzer::summarize(&characteristics, &QualityWeights::default());
        assert_eq!(summary.overall_score, 100.0);
        assert_eq!(summary.grade, QualityGrade::A);
        assert_eq!(summary.sample_size_adequacy, "limited");
    }

    #[test]
    fn test_warnings_for_small_duplicated_constant_frame() {
        let df = df! {
            "a" => &[1i64, 1, 2, 3],
            "b" => &["x", "x", "y", "z"],
            "c" => &[5i64, 5, 5, 5],
        }
        .unwrap();
        let characteristics = profile(&df);
        let warnings =
            DataQualityAnalyzer::warnings(&characteristics, &WarningThresholds::default());

        assert_eq!(warnings.len(), 3);
        assert!(warnings[0].contains("1 duplicate row"));
        assert!(warnings[1].contains("Constant columns carry no information: c"));
        assert!(warnings[2].contains("n=4"));
    }

    #[test]
    fn test_missing_warning_above_threshold() {
        let values: Vec<Option<f64>> = (0..40)
            .map(|i| if i % 2 == 0 { None } else { Some(i as f64) })
            .collect();
        let keys: Vec<f64> = (0..40).map(|i| i as f64 * 0.5).collect();
        let df = df! { "k" => keys, "v" => values }.unwrap();
        let characteristics = profile(&df);
        let warnings =
            DataQualityAnalyzer::warnings(&characteristics, &WarningThresholds::default());
        assert_eq!(warnings, vec!["High missing data: 25.0% of values are missing"]);
    }

    #[test]
    fn test_zero_rows_warning_and_score() {
        let df = df! { "a" => Vec::<f64>::new() }.unwrap();
        let characteristics = profile(&df);
        let warnings =
            DataQualityAnalyzer::warnings(&characteristics, &WarningThresholds::default());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("no observations"));

        let summary = DataQualityAnalyzer::summarize(&characteristics, &QualityWeights::default());
        assert!(summary.overall_score.is_finite());
        assert_eq!(summary.grade, QualityGrade::F);
    }
}
