//! Shared recommendation scoring.
//!
//! Every module declares its methods as a static slice of [`MethodSpec`]s in
//! catalog order. [`RecommendationScorer`] turns a spec into a score in
//! `[0, 1]`, and [`build_recommendation_set`] tiers the scored methods and
//! orders them by prerequisites.

use crate::config::{DetectionConfig, ScoringPolicy};
use crate::types::{
    AnalysisModule, Confidence, DataCharacteristics, MethodTier, Recommendation,
    RecommendationSet, SampleSizeCategory, UnsuitableMethod,
};
use crate::utils::round4;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use tracing::debug;

/// A method from one module's closed catalog.
pub trait CatalogMethod: Copy + Eq + fmt::Debug + 'static {
    fn name(&self) -> &'static str;
    fn tier(&self) -> MethodTier;
}

/// How strongly missing values hurt a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingSensitivity {
    None,
    Low,
    High,
}

/// Outcome of a method's hard requirement check.
#[derive(Debug, Clone, PartialEq)]
pub enum Requirement {
    Met {
        /// Columns the method would use; empty for frame-wide methods.
        variables: Vec<String>,
        /// The preferred column types are present, not just the minimum.
        type_match: bool,
        /// Short phrase describing what was found, e.g. "3 numeric columns".
        summary: String,
    },
    Unmet(String),
}

impl Requirement {
    pub fn met(variables: Vec<String>, summary: impl Into<String>) -> Self {
        Self::Met {
            variables,
            type_match: true,
            summary: summary.into(),
        }
    }

    pub fn partial(variables: Vec<String>, summary: impl Into<String>) -> Self {
        Self::Met {
            variables,
            type_match: false,
            summary: summary.into(),
        }
    }

    pub fn unmet(reason: impl Into<String>) -> Self {
        Self::Unmet(reason.into())
    }
}

/// A feature of the data that makes a method especially informative.
pub struct SpecialFeature<X: 'static> {
    pub applies: fn(&DataCharacteristics, &X) -> bool,
    pub reason: &'static str,
}

/// Static description of one catalog method.
///
/// `X` is module-specific context computed once per call (the qualitative
/// module passes its text metrics; the others use `()`).
pub struct MethodSpec<M: 'static, X: 'static> {
    pub method: M,
    pub min_sample: SampleSizeCategory,
    pub missing_sensitivity: MissingSensitivity,
    pub requirement: fn(&DataCharacteristics, &X, &DetectionConfig) -> Requirement,
    pub special_feature: Option<SpecialFeature<X>>,
    pub prerequisites: &'static [M],
    /// Words in a stated goal that this method serves.
    pub goal_keywords: &'static [&'static str],
}

/// A method after scoring.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoredMethod<M> {
    Scored {
        method: M,
        score: f64,
        rationale: String,
        variables: Vec<String>,
    },
    Unsuitable {
        method: M,
        reason: String,
    },
}

impl<M: CatalogMethod> ScoredMethod<M> {
    pub fn method(&self) -> M {
        match self {
            Self::Scored { method, .. } | Self::Unsuitable { method, .. } => *method,
        }
    }

    pub fn score(&self) -> f64 {
        match self {
            Self::Scored { score, .. } => *score,
            Self::Unsuitable { .. } => 0.0,
        }
    }
}

/// Scores methods against a profile under a [`ScoringPolicy`].
pub struct RecommendationScorer<'a> {
    config: &'a DetectionConfig,
}

impl<'a> RecommendationScorer<'a> {
    pub fn new(config: &'a DetectionConfig) -> Self {
        Self { config }
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.config.scoring
    }

    /// Missing-data penalty for a frame with `missing_pct` percent missing cells.
    ///
    /// Zero when nothing is missing; otherwise grows linearly and saturates,
    /// so the score never increases as missingness grows.
    pub fn missing_penalty(&self, sensitivity: MissingSensitivity, missing_pct: f64) -> f64 {
        if missing_pct <= 0.0 {
            return 0.0;
        }
        let policy = self.policy();
        let fraction = (missing_pct / policy.missing_penalty_saturation).min(1.0);
        let full = policy.missing_penalty_min
            + (policy.missing_penalty_max - policy.missing_penalty_min) * fraction;
        match sensitivity {
            MissingSensitivity::None => 0.0,
            MissingSensitivity::Low => full * policy.low_sensitivity_factor,
            MissingSensitivity::High => full,
        }
    }

    pub fn score<M: CatalogMethod, X>(
        &self,
        spec: &MethodSpec<M, X>,
        characteristics: &DataCharacteristics,
        context: &X,
    ) -> ScoredMethod<M> {
        if characteristics.n_observations == 0 {
            return ScoredMethod::Unsuitable {
                method: spec.method,
                reason: "insufficient data: no observations".to_string(),
            };
        }

        let (variables, type_match, summary) =
            match (spec.requirement)(characteristics, context, self.config) {
                Requirement::Met {
                    variables,
                    type_match,
                    summary,
                } => (variables, type_match, summary),
                Requirement::Unmet(reason) => {
                    debug!("{} unsuitable: {}", spec.method.name(), reason);
                    return ScoredMethod::Unsuitable {
                        method: spec.method,
                        reason,
                    };
                }
            };

        let policy = self.policy();
        let mut score = policy.base_score;
        let mut reasons = vec![summary];

        if type_match {
            score += policy.type_match_bonus;
        }

        let category = characteristics.sample_size_category;
        if category >= spec.min_sample {
            score += policy.sample_size_bonus;
            reasons.push(format!("{} sample size", category.as_str().replace('_', " ")));
        } else {
            reasons.push(format!(
                "sample size below the recommended {} minimum",
                spec.min_sample.as_str().replace('_', " ")
            ));
        }

        let penalty = self.missing_penalty(
            spec.missing_sensitivity,
            characteristics.missing_percentage,
        );
        if penalty > 0.0 {
            score -= penalty;
            reasons.push(format!(
                "{:.1}% missing data reduces reliability",
                characteristics.missing_percentage
            ));
        }

        if let Some(feature) = &spec.special_feature
            && (feature.applies)(characteristics, context)
        {
            score += policy.feature_bonus;
            reasons.push(feature.reason.to_string());
        }

        let score = round4(score.clamp(0.0, 1.0));
        debug!("{} scored {:.4}", spec.method.name(), score);

        ScoredMethod::Scored {
            method: spec.method,
            score,
            rationale: reasons.join("; "),
            variables,
        }
    }
}

/// Whether any goal mentions one of the keywords.
pub fn matches_goal(goals: Option<&[String]>, keywords: &[&str]) -> bool {
    let Some(goals) = goals else {
        return false;
    };
    goals.iter().any(|goal| {
        let goal = goal.to_lowercase();
        keywords.iter().any(|k| goal.contains(k))
    })
}

/// Score a whole catalog and assemble the module's [`RecommendationSet`].
pub fn build_recommendation_set<M: CatalogMethod, X>(
    module: AnalysisModule,
    catalog: &[MethodSpec<M, X>],
    characteristics: &DataCharacteristics,
    context: &X,
    goals: Option<&[String]>,
    config: &DetectionConfig,
    warnings: Vec<String>,
) -> RecommendationSet {
    let scorer = RecommendationScorer::new(config);
    let scored: Vec<ScoredMethod<M>> = catalog
        .iter()
        .map(|spec| scorer.score(spec, characteristics, context))
        .collect();

    let mut set = RecommendationSet::empty(module);
    set.data_quality_warnings = warnings;

    // Catalog index travels with each recommendation for tie-breaks.
    let mut recommended: Vec<(usize, Recommendation)> = Vec::new();
    for (index, (spec, outcome)) in catalog.iter().zip(scored).enumerate() {
        match outcome {
            ScoredMethod::Scored {
                method,
                score,
                mut rationale,
                variables,
            } => {
                if matches_goal(goals, spec.goal_keywords) {
                    rationale.push_str("; aligned with stated goal");
                }
                rationale.push('.');
                recommended.push((
                    index,
                    Recommendation {
                        method: method.name().to_string(),
                        score,
                        confidence: Confidence::from_score(score, &config.scoring),
                        rationale: capitalize(&rationale),
                        module,
                        required_variables: variables,
                        tier: method.tier(),
                    },
                ));
            }
            ScoredMethod::Unsuitable { method, reason } => {
                set.unsuitable_methods.push(UnsuitableMethod {
                    method: method.name().to_string(),
                    reason,
                });
            }
        }
    }

    let recommended_indices: BTreeSet<usize> = recommended.iter().map(|(i, _)| *i).collect();
    set.analysis_order = prerequisite_order(catalog, &recommended_indices)
        .into_iter()
        .map(|i| catalog[i].method.name().to_string())
        .collect();

    recommended.sort_by(|(ia, a), (ib, b)| b.score.total_cmp(&a.score).then(ia.cmp(ib)));
    for (_, rec) in recommended {
        match rec.confidence {
            Confidence::High => set.primary_recommendations.push(rec),
            Confidence::Medium => set.secondary_recommendations.push(rec),
            Confidence::Low => set.optional_analyses.push(rec),
        }
    }

    set
}

/// Kahn's algorithm over the recommended subset of a catalog.
///
/// Edges through methods that were not recommended are followed
/// transitively so `a -> b -> c` still orders `a` before `c` when `b` is
/// dropped. Ready nodes are released in catalog order.
pub fn prerequisite_order<M: CatalogMethod, X>(
    catalog: &[MethodSpec<M, X>],
    recommended: &BTreeSet<usize>,
) -> Vec<usize> {
    let index_of = |m: M| catalog.iter().position(|s| s.method == m);

    let mut edges: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); catalog.len()];
    let mut in_degree = vec![0usize; catalog.len()];

    for &node in recommended {
        let mut visited = HashSet::new();
        let mut stack: Vec<usize> = catalog[node]
            .prerequisites
            .iter()
            .filter_map(|&p| index_of(p))
            .collect();
        while let Some(prereq) = stack.pop() {
            if !visited.insert(prereq) {
                continue;
            }
            if recommended.contains(&prereq) {
                if edges[prereq].insert(node) {
                    in_degree[node] += 1;
                }
            } else {
                stack.extend(
                    catalog[prereq]
                        .prerequisites
                        .iter()
                        .filter_map(|&p| index_of(p)),
                );
            }
        }
    }

    let mut ready: BTreeSet<usize> = recommended
        .iter()
        .copied()
        .filter(|&i| in_degree[i] == 0)
        .collect();
    let mut order = Vec::with_capacity(recommended.len());

    while let Some(node) = ready.pop_first() {
        order.push(node);
        for &next in &edges[node] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.insert(next);
            }
        }
    }

    order
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
