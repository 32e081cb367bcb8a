//! Per-column summary statistics used by the profile.

use crate::types::{CategoricalSummary, NumericSummary};
use crate::utils::{is_string_dtype, parse_numeric_string, series_to_f64, series_to_strings};
use anyhow::Result;
use polars::prelude::*;
use std::collections::HashMap;

/// Values of a numeric column as floats.
///
/// String columns classified as numeric are parsed value by value so that
/// formatted entries like `"$1,200"` still count.
pub(crate) fn numeric_values(series: &Series) -> Result<Vec<Option<f64>>> {
    if is_string_dtype(series.dtype()) {
        return Ok(series_to_strings(series)?
            .into_iter()
            .map(|v| v.and_then(|s| parse_numeric_string(&s)))
            .collect());
    }
    Ok(series_to_f64(series)?)
}

/// Summarize a numeric column. `None` when it has no usable values.
pub(crate) fn numeric_summary(values: &[Option<f64>]) -> Option<NumericSummary> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return None;
    }

    let mut sorted = present.clone();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mean = present.iter().sum::<f64>() / present.len() as f64;
    let std = calculate_std(&present, mean);

    Some(NumericSummary {
        count: present.len(),
        mean,
        std,
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        median: median_of_sorted(&sorted),
        skewness: calculate_skewness(&present, mean, std),
        has_outliers: detect_outliers(&sorted),
        missing_percentage: missing_percentage(values.len() - present.len(), values.len()),
    })
}

/// Summarize a categorical or binary column.
pub(crate) fn categorical_summary(series: &Series) -> Result<Option<CategoricalSummary>> {
    let values = series_to_strings(series)?;
    let total = values.len();

    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut missing = 0;
    for value in values {
        match value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) {
            Some(v) => *counts.entry(v).or_insert(0) += 1,
            None => missing += 1,
        }
    }

    if counts.is_empty() {
        return Ok(None);
    }

    // Highest count wins; ties go to the lexicographically smallest value.
    let (most_frequent, top_count) = counts
        .iter()
        .max_by(|(va, ca), (vb, cb)| ca.cmp(cb).then_with(|| vb.cmp(va)))
        .map(|(v, c)| (v.clone(), *c))
        .unwrap_or_default();

    let present = total - missing;
    let frequencies: Vec<f64> = counts.values().map(|&c| c as f64).collect();

    Ok(Some(CategoricalSummary {
        n_categories: counts.len(),
        most_frequent: Some(most_frequent),
        most_frequent_share: top_count as f64 / present as f64,
        balance: frequency_balance(&frequencies).to_string(),
        missing_percentage: missing_percentage(missing, total),
    }))
}

/// "balanced" when the spread of category counts stays below their mean.
fn frequency_balance(counts: &[f64]) -> &'static str {
    if counts.len() <= 1 {
        return "balanced";
    }
    let mean = counts.iter().sum::<f64>() / counts.len() as f64;
    let variance = counts.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / counts.len() as f64;
    if variance.sqrt() < mean {
        "balanced"
    } else {
        "imbalanced"
    }
}

fn missing_percentage(missing: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        missing as f64 / total as f64 * 100.0
    }
}

/// Sample standard deviation.
pub(crate) fn calculate_std(values: &[f64], mean: f64) -> f64 {
    let n = values.len() as f64;
    if n <= 1.0 {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}

pub(crate) fn calculate_skewness(values: &[f64], mean: f64, std: f64) -> f64 {
    if std == 0.0 || values.is_empty() {
        return 0.0;
    }
    let skew_sum: f64 = values.iter().map(|v| ((v - mean) / std).powi(3)).sum();
    skew_sum / values.len() as f64
}

fn median_of_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}

/// IQR rule: more than 5% of values outside 1.5 IQR of the quartiles.
pub(crate) fn detect_outliers(sorted: &[f64]) -> bool {
    let n = sorted.len();
    if n < 4 {
        return false;
    }

    let q1 = sorted[(n as f64 * 0.25) as usize];
    let q3 = sorted[(n as f64 * 0.75) as usize];
    let iqr = q3 - q1;
    let lower_bound = q1 - 1.5 * iqr;
    let upper_bound = q3 + 1.5 * iqr;

    let outlier_count = sorted
        .iter()
        .filter(|&&v| v < lower_bound || v > upper_bound)
        .count();
    outlier_count > n / 20
}
