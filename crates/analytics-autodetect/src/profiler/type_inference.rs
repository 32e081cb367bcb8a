//! Semantic type classification for a single column.
//!
//! Rules are evaluated in a fixed order and the first match wins. The
//! classifier never fails: anything it cannot decide becomes
//! [`SemanticType::Unknown`].

use crate::config::ClassifierConfig;
use crate::types::SemanticType;
use crate::utils::{
    is_datetime_dtype, is_integer_dtype, is_numeric_dtype, is_string_dtype, is_valid_latitude,
    is_valid_longitude, non_empty_strings, parse_coordinate_pair, parse_numeric_string,
    parses_as_date, series_to_f64, whitespace_token_count,
};
use anyhow::Result;
use once_cell::sync::Lazy;
use polars::prelude::*;
use rand::prelude::*;
use regex::Regex;
use tracing::debug;

// Value shapes that only identifiers take - compiled once at startup
static ID_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"^[A-Za-z]{0,6}[-_]?\d{2,}[A-Za-z0-9]*$").expect("Invalid regex: code"),
        Regex::new(r"^[a-fA-F0-9]{8}-[a-fA-F0-9]{4}-[a-fA-F0-9]{4}-[a-fA-F0-9]{4}-[a-fA-F0-9]{12}$")
            .expect("Invalid regex: UUID"),
        Regex::new(r"^[\w.+-]+@[\w-]+\.[\w.-]+$").expect("Invalid regex: email"),
        Regex::new(r"^[a-fA-F0-9]{16,}$").expect("Invalid regex: hex token"),
    ]
});

/// Result of classifying one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnClassification {
    pub semantic_type: SemanticType,
    /// Heuristic certainty in 0..=1; 0 means the column could not be read.
    pub confidence: f64,
}

impl ColumnClassification {
    fn new(semantic_type: SemanticType, confidence: f64) -> Self {
        Self {
            semantic_type,
            confidence,
        }
    }

    fn unknown() -> Self {
        Self::new(SemanticType::Unknown, 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GeoAxis {
    Latitude,
    Longitude,
}

/// Classify a column with the default thresholds.
pub fn classify_column(series: &Series) -> SemanticType {
    classify_column_with(series, &ClassifierConfig::default()).semantic_type
}

/// Classify a column with explicit thresholds.
pub fn classify_column_with(series: &Series, config: &ClassifierConfig) -> ColumnClassification {
    match try_classify(series, config) {
        Ok(classification) => classification,
        Err(e) => {
            debug!("Column '{}' left unclassified: {}", series.name(), e);
            ColumnClassification::unknown()
        }
    }
}

fn try_classify(series: &Series, config: &ClassifierConfig) -> Result<ColumnClassification> {
    let non_null = series.drop_nulls();
    if non_null.is_empty() {
        return Ok(ColumnClassification::unknown());
    }

    let name = series.name().to_string();
    let dtype = series.dtype();

    // Whitespace-only strings carry no information; treat them as missing.
    let strings = if is_string_dtype(dtype) {
        let values = non_empty_strings(&non_null)?;
        if values.is_empty() {
            return Ok(ColumnClassification::unknown());
        }
        Some(values)
    } else {
        None
    };

    let n = strings.as_ref().map_or(non_null.len(), Vec::len);
    let unique = match &strings {
        Some(values) => distinct_count(values),
        None => non_null.n_unique()?,
    };

    // Rule 1: identifiers
    if is_identifier_name(&name) {
        return Ok(ColumnClassification::new(SemanticType::Identifier, 0.95));
    }
    if let Some(values) = &strings
        && looks_like_identifier_values(values, unique, config)
    {
        return Ok(ColumnClassification::new(SemanticType::Identifier, 0.85));
    }

    // Rule 2: datetimes
    if is_datetime_dtype(dtype) {
        return Ok(ColumnClassification::new(SemanticType::Datetime, 1.0));
    }
    if let Some(values) = &strings {
        let ratio = date_parse_ratio(values, config.parse_sample_size);
        if ratio >= config.datetime_parse_ratio {
            return Ok(ColumnClassification::new(SemanticType::Datetime, ratio));
        }
    }

    // Rule 3: exactly two values
    if unique == 2 {
        let confidence = if dtype == &DataType::Boolean { 1.0 } else { 0.9 };
        return Ok(ColumnClassification::new(SemanticType::Binary, confidence));
    }

    // A single repeated value carries no variance; the profiler also records it as constant.
    if unique == 1 {
        return Ok(ColumnClassification::new(SemanticType::Categorical, 0.6));
    }

    // Rule 4: numbers, stored natively or as numeric strings
    let numeric_values = if is_numeric_dtype(dtype) {
        Some(series_to_f64(&non_null)?.into_iter().flatten().collect::<Vec<_>>())
    } else if let Some(values) = &strings {
        numeric_string_values(values, config)
    } else {
        None
    };

    if let Some(numbers) = numeric_values.filter(|v| !v.is_empty()) {
        if let Some(axis) = geographic_axis(&name) {
            let in_range = numbers.iter().all(|&v| match axis {
                GeoAxis::Latitude => is_valid_latitude(v),
                GeoAxis::Longitude => is_valid_longitude(v),
            });
            if in_range {
                return Ok(ColumnClassification::new(SemanticType::Geographic, 0.9));
            }
        }

        let unique_ratio = unique as f64 / n as f64;
        if unique_ratio < config.low_cardinality_ratio && unique <= config.max_coded_categories {
            return Ok(ColumnClassification::new(SemanticType::Categorical, 0.7));
        }

        let integral = is_integer_dtype(dtype) || numbers.iter().all(|v| v.fract() == 0.0);
        if integral && unique_ratio < config.low_cardinality_ratio {
            return Ok(ColumnClassification::new(SemanticType::NumericDiscrete, 0.8));
        }
        return Ok(ColumnClassification::new(SemanticType::NumericContinuous, 0.85));
    }

    if let Some(values) = &strings {
        // Rule 5: "lat, lon" pairs
        let coordinate_hits = values
            .iter()
            .filter(|v| parse_coordinate_pair(v).is_some())
            .count();
        if coordinate_hits as f64 / n as f64 >= config.datetime_parse_ratio {
            return Ok(ColumnClassification::new(SemanticType::Geographic, 0.85));
        }

        // Rule 6: free text
        let avg_length =
            values.iter().map(|v| v.chars().count()).sum::<usize>() as f64 / n as f64;
        let avg_tokens =
            values.iter().map(|v| whitespace_token_count(v)).sum::<usize>() as f64 / n as f64;
        let unique_ratio = unique as f64 / n as f64;
        if avg_length > config.text_min_avg_length
            || (avg_tokens >= config.text_min_avg_tokens
                && unique_ratio > config.text_min_unique_ratio)
        {
            return Ok(ColumnClassification::new(SemanticType::Text, 0.8));
        }

        // Rule 7: everything else that is a string
        return Ok(ColumnClassification::new(SemanticType::Categorical, 0.75));
    }

    // Rule 8: unsupported dtypes (lists, structs, binary blobs)
    Ok(ColumnClassification::unknown())
}

fn distinct_count(values: &[String]) -> usize {
    values
        .iter()
        .collect::<std::collections::HashSet<_>>()
        .len()
}

/// `id`, `respondent_id`, `Project_ID`, ...
pub(crate) fn is_identifier_name(name: &str) -> bool {
    let lower = name.trim().to_ascii_lowercase();
    lower == "id" || lower.ends_with("_id")
}

/// Every value distinct, none numeric, and shaped like a code, UUID or email.
fn looks_like_identifier_values(
    values: &[String],
    unique: usize,
    config: &ClassifierConfig,
) -> bool {
    if values.len() < 2 || unique != values.len() {
        return false;
    }

    let plausible = values.iter().all(|v| {
        v.chars().count() <= config.identifier_max_length
            && !v.contains(char::is_whitespace)
            && parse_numeric_string(v).is_none()
    });
    if !plausible {
        return false;
    }

    let pattern_hits = values
        .iter()
        .filter(|v| ID_PATTERNS.iter().any(|p| p.is_match(v)))
        .count();
    pattern_hits as f64 / values.len() as f64 >= 0.9
}

/// Share of (sampled) values that parse as dates.
fn date_parse_ratio(values: &[String], sample_size: usize) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    // Fixed seed keeps classification deterministic for a given column.
    let mut rng = StdRng::seed_from_u64(42);
    let sampled: Vec<&String> = if values.len() > sample_size {
        values.choose_multiple(&mut rng, sample_size).collect()
    } else {
        values.iter().collect()
    };

    let parsed = sampled.iter().filter(|v| parses_as_date(v)).count();
    parsed as f64 / sampled.len() as f64
}

/// Parsed numbers if enough of the strings are numeric.
fn numeric_string_values(values: &[String], config: &ClassifierConfig) -> Option<Vec<f64>> {
    let parsed: Vec<f64> = values
        .iter()
        .filter_map(|v| parse_numeric_string(v))
        .collect();
    let ratio = parsed.len() as f64 / values.len() as f64;
    (ratio >= config.numeric_parse_ratio).then_some(parsed)
}

fn geographic_axis(name: &str) -> Option<GeoAxis> {
    let lower = name.to_ascii_lowercase();
    lower
        .split(|c: char| !c.is_ascii_alphanumeric())
        .find_map(|token| match token {
            "lat" | "latitude" => Some(GeoAxis::Latitude),
            "lon" | "lng" | "longitude" => Some(GeoAxis::Longitude),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_texts(n: usize) -> Vec<String> {
        (0..n)
            .map(|i| {
                format!(
                    "Respondent {} said the onboarding process was slow and confusing at first",
                    i
                )
            })
            .collect()
    }

    // ==================== rule order ====================

    #[test]
    fn test_all_null_is_unknown() {
        let series = Series::new("col".into(), &[None::<i64>, None, None]);
        assert_eq!(classify_column(&series), SemanticType::Unknown);
        let c = classify_column_with(&series, &ClassifierConfig::default());
        assert_eq!(c.confidence, 0.0);
    }

    #[test]
    fn test_empty_column_is_unknown() {
        let series = Series::new_empty("col".into(), &DataType::Float64);
        assert_eq!(classify_column(&series), SemanticType::Unknown);
    }

    #[test]
    fn test_whitespace_strings_are_unknown() {
        let series = Series::new("notes".into(), &["  ", "", " "]);
        assert_eq!(classify_column(&series), SemanticType::Unknown);
    }

    #[test]
    fn test_identifier_by_name() {
        let series = Series::new("respondent_id".into(), &[1i64, 2, 3, 4, 5]);
        assert_eq!(classify_column(&series), SemanticType::Identifier);

        let series = Series::new("ID".into(), &["a", "b", "a"]);
        assert_eq!(classify_column(&series), SemanticType::Identifier);
    }

    #[test]
    fn test_identifier_by_unique_codes() {
        let series = Series::new("ref".into(), &["R0001", "R0002", "R0003", "R0004"]);
        assert_eq!(classify_column(&series), SemanticType::Identifier);
    }

    #[test]
    fn test_unique_words_are_not_identifiers() {
        let series = Series::new("country".into(), &["France", "Germany", "Spain", "Kenya"]);
        assert_eq!(classify_column(&series), SemanticType::Categorical);
    }

    #[test]
    fn test_datetime_strings() {
        let series = Series::new(
            "submitted".into(),
            &["2024-01-15", "2024-02-20", "2024-03-25", "2024-04-01"],
        );
        assert_eq!(classify_column(&series), SemanticType::Datetime);
    }

    #[test]
    fn test_mostly_invalid_dates_are_not_datetime() {
        let series = Series::new(
            "mixed".into(),
            &["2024-01-15", "not a date", "also not", "nope"],
        );
        assert_ne!(classify_column(&series), SemanticType::Datetime);
    }

    #[test]
    fn test_binary_native_and_strings() {
        let series = Series::new("consent".into(), &[true, false, true, true]);
        assert_eq!(classify_column(&series), SemanticType::Binary);

        let series = Series::new("smoker".into(), &["yes", "no", "no", "yes", "no"]);
        assert_eq!(classify_column(&series), SemanticType::Binary);
    }

    #[test]
    fn test_single_value_is_categorical() {
        let series = Series::new("col".into(), &[7i64; 10]);
        assert_eq!(classify_column(&series), SemanticType::Categorical);
    }

    #[test]
    fn test_numeric_continuous() {
        let values: Vec<f64> = (0..200).map(|i| i as f64 * 1.37).collect();
        let series = Series::new("income".into(), values);
        assert_eq!(classify_column(&series), SemanticType::NumericContinuous);
    }

    #[test]
    fn test_integer_ages_are_continuous_when_cardinality_is_high() {
        let values: Vec<i64> = (0..200).map(|i| 18 + (i % 73)).collect();
        let series = Series::new("age".into(), values);
        assert_eq!(classify_column(&series), SemanticType::NumericContinuous);
    }

    #[test]
    fn test_numeric_discrete_low_ratio_many_values() {
        // 30 distinct integers over 1000 rows: ratio 0.03 but too many levels for a code
        let values: Vec<i64> = (0..1000).map(|i| i % 30).collect();
        let series = Series::new("visits".into(), values);
        assert_eq!(classify_column(&series), SemanticType::NumericDiscrete);
    }

    #[test]
    fn test_numeric_coded_category() {
        // Likert 1-5 over 200 rows
        let values: Vec<i64> = (0..200).map(|i| 1 + (i % 5)).collect();
        let series = Series::new("satisfaction".into(), values);
        assert_eq!(classify_column(&series), SemanticType::Categorical);
    }

    #[test]
    fn test_numeric_strings_are_numeric() {
        let values: Vec<String> = (0..50).map(|i| format!("{}.5", i)).collect();
        let series = Series::new("amount".into(), values);
        assert_eq!(classify_column(&series), SemanticType::NumericContinuous);
    }

    #[test]
    fn test_geographic_by_name() {
        let series = Series::new("latitude".into(), &[14.5, 14.6, 14.7, 10.3]);
        assert_eq!(classify_column(&series), SemanticType::Geographic);

        let series = Series::new("home_lng".into(), &[121.0, 120.9, 123.8]);
        assert_eq!(classify_column(&series), SemanticType::Geographic);
    }

    #[test]
    fn test_out_of_range_latitude_stays_numeric() {
        let series = Series::new("lat".into(), &[14.5, 140.6, 14.7, 10.3]);
        assert_eq!(classify_column(&series), SemanticType::NumericContinuous);
    }

    #[test]
    fn test_geographic_by_value_pairs() {
        let series = Series::new(
            "location".into(),
            &["14.59, 120.98", "10.31, 123.89", "7.07, 125.61"],
        );
        assert_eq!(classify_column(&series), SemanticType::Geographic);
    }

    #[test]
    fn test_free_text() {
        let series = Series::new("comments".into(), long_texts(20));
        assert_eq!(classify_column(&series), SemanticType::Text);
    }

    #[test]
    fn test_short_strings_are_categorical() {
        let series = Series::new("department".into(), &["HR", "IT", "Sales", "HR", "Ops"]);
        assert_eq!(classify_column(&series), SemanticType::Categorical);
    }

    #[test]
    fn test_classifier_is_deterministic() {
        let values: Vec<String> = (0..1200)
            .map(|i| {
                if i % 25 == 0 {
                    "unknown".to_string()
                } else {
                    format!("2023-{:02}-{:02}", 1 + i % 12, 1 + i % 28)
                }
            })
            .collect();
        let series = Series::new("visit_date".into(), values);
        let first = classify_column(&series);
        for _ in 0..5 {
            assert_eq!(classify_column(&series), first);
        }
        assert_eq!(first, SemanticType::Datetime);
    }
}
