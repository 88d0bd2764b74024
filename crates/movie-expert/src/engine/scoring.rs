use super::preferences::Preferences;
use super::ranking::{top_explanations, MAX_EXPLANATIONS};
use super::rules::{Evidence, RuleCatalog};
use crate::dataset::Fact;
use serde::Serialize;

/// One fired rule, kept for the "why recommended" surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FiredRule {
    pub rule_id: String,
    pub description: String,
    pub delta: f64,
    pub explanation: String,
    pub evidence: Evidence,
}

/// Per-candidate accumulator threaded through the catalog fold.
#[derive(Debug, Clone)]
pub struct ScoringState<'a> {
    fact: &'a Fact,
    score: f64,
    fired: Vec<FiredRule>,
}

impl<'a> ScoringState<'a> {
    pub fn new(fact: &'a Fact) -> Self {
        Self {
            fact,
            score: 0.0,
            fired: Vec::new(),
        }
    }

    pub fn fact(&self) -> &'a Fact {
        self.fact
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn record(mut self, fired: FiredRule) -> Self {
        self.score += fired.delta;
        self.fired.push(fired);
        self
    }

    pub fn finish(self) -> ScoredCandidate<'a> {
        ScoredCandidate {
            fact: self.fact,
            score: self.score,
            fired: self.fired,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate<'a> {
    pub fact: &'a Fact,
    pub score: f64,
    /// In catalog order.
    pub fired: Vec<FiredRule>,
}

impl ScoredCandidate<'_> {
    pub fn fired_count(&self) -> usize {
        self.fired.len()
    }

    /// The explanations with the largest absolute deltas.
    pub fn top_explanations(&self) -> Vec<&FiredRule> {
        top_explanations(&self.fired, MAX_EXPLANATIONS)
    }
}

pub fn score_candidate<'a>(
    fact: &'a Fact,
    preferences: &Preferences,
    catalog: &RuleCatalog,
) -> ScoredCandidate<'a> {
    catalog
        .rules()
        .iter()
        .filter(|rule| rule.matches(fact, preferences))
        .fold(ScoringState::new(fact), |state, rule| rule.apply(state))
        .finish()
}

/// Scores every candidate; candidates that match nothing stay with a zero score.
pub fn score<'a>(
    candidates: &[&'a Fact],
    preferences: &Preferences,
    catalog: &RuleCatalog,
) -> Vec<ScoredCandidate<'a>> {
    candidates
        .iter()
        .copied()
        .map(|fact| score_candidate(fact, preferences, catalog))
        .collect()
}
