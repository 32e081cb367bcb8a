use super::ModuleOutcome;
use super::insights::CrossModuleInsights;
use crate::types::{AnalysisModule, MethodTier, RecommendationSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One step of the merged analysis plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceStep {
    /// 1-based position in the plan.
    pub step: usize,
    pub method: String,
    pub module: AnalysisModule,
    pub tier: MethodTier,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportingStrategy {
    pub primary_narrative: String,
    pub supporting_analyses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnifiedRecommendations {
    pub immediate_actions: Vec<String>,
    pub analysis_sequence: Vec<SequenceStep>,
    pub reporting_strategy: ReportingStrategy,
    pub integration_opportunities: Vec<String>,
}

pub(super) fn synthesize(
    module_results: &BTreeMap<AnalysisModule, ModuleOutcome>,
    insights: &CrossModuleInsights,
) -> UnifiedRecommendations {
    UnifiedRecommendations {
        immediate_actions: immediate_actions(module_results),
        analysis_sequence: analysis_sequence(module_results),
        reporting_strategy: reporting_strategy(module_results),
        integration_opportunities: insights
            .pattern_convergence
            .iter()
            .map(|p| {
                format!(
                    "Combine {} ({}) with {} ({}) to corroborate {}",
                    p.methods[0], p.modules[0], p.methods[1], p.modules[1], p.pattern
                )
            })
            .collect(),
    }
}

/// Warnings of every module, first occurrence wins.
fn immediate_actions(module_results: &BTreeMap<AnalysisModule, ModuleOutcome>) -> Vec<String> {
    let mut actions: Vec<String> = Vec::new();
    for set in module_results.values().filter_map(ModuleOutcome::recommendations) {
        for warning in &set.data_quality_warnings {
            if !actions.contains(warning) {
                actions.push(warning.clone());
            }
        }
    }
    actions
}

/// Merge of the per-module orders.
///
/// Prerequisites never sit in a later tier than their dependents, so a
/// stable sort by (tier, module, position) keeps every module's order intact.
fn analysis_sequence(
    module_results: &BTreeMap<AnalysisModule, ModuleOutcome>,
) -> Vec<SequenceStep> {
    let mut entries: Vec<(MethodTier, AnalysisModule, usize, String)> = Vec::new();
    for (module, outcome) in module_results {
        let Some(set) = outcome.recommendations() else {
            continue;
        };
        for (position, method) in set.analysis_order.iter().enumerate() {
            let tier = set
                .find(method)
                .map(|r| r.tier)
                .unwrap_or(MethodTier::Exploratory);
            entries.push((tier, *module, position, method.clone()));
        }
    }
    entries.sort_by_key(|(tier, module, position, _)| (*tier, *module, *position));

    entries
        .into_iter()
        .enumerate()
        .map(|(i, (tier, module, _, method))| SequenceStep {
            step: i + 1,
            method,
            module,
            tier,
        })
        .collect()
}

/// Narrative led by the module with the most primary recommendations.
///
/// Ties go to the earlier module. Without any primary the best
/// recommendation of any tier leads and nothing supports it.
fn reporting_strategy(
    module_results: &BTreeMap<AnalysisModule, ModuleOutcome>,
) -> ReportingStrategy {
    let completed: Vec<(AnalysisModule, &RecommendationSet)> = module_results
        .iter()
        .filter_map(|(module, outcome)| outcome.recommendations().map(|set| (*module, set)))
        .collect();

    let lead_module = completed
        .iter()
        .filter(|(_, set)| !set.primary_recommendations.is_empty())
        .map(|(module, set)| (*module, set.primary_recommendations.len()))
        .reduce(|best, next| if next.1 > best.1 { next } else { best })
        .map(|(module, _)| module);

    let (lead, supporting_analyses) = match lead_module {
        Some(lead_module) => {
            let lead = completed
                .iter()
                .find(|(module, _)| *module == lead_module)
                .and_then(|(_, set)| set.primary_recommendations.first());
            let supporting = completed
                .iter()
                .filter(|(module, _)| *module != lead_module)
                .flat_map(|(_, set)| set.primary_recommendations.iter())
                .map(|r| r.method.clone())
                .collect();
            (lead, supporting)
        }
        None => {
            let best = completed
                .iter()
                .flat_map(|(_, set)| set.iter())
                .max_by(|a, b| a.score.total_cmp(&b.score).then(b.module.cmp(&a.module)));
            (best, Vec::new())
        }
    };

    let Some(lead) = lead else {
        return ReportingStrategy {
            primary_narrative: "No analysis can be recommended for this dataset; \
                                resolve the immediate actions first"
                .to_string(),
            supporting_analyses: Vec::new(),
        };
    };

    let primary_narrative = match lead.module {
        AnalysisModule::Descriptive => format!(
            "Lead with a descriptive overview of the dataset built on {}",
            lead.method
        ),
        AnalysisModule::Inferential => format!(
            "Lead with the hypothesis tests, starting from {}, and use descriptive results as context",
            lead.method
        ),
        AnalysisModule::Qualitative => format!(
            "Lead with what respondents wrote, starting from {}",
            lead.method
        ),
    };

    ReportingStrategy {
        primary_narrative,
        supporting_analyses,
    }
}
