//! Explainable inference over normalized facts.
//!
//! A recommendation pass runs the hard filter, folds the rule catalog over every surviving
//! candidate, and ranks the scored list. Nothing here mutates the dataset or keeps state
//! between calls, so one loaded [`Recommender`] can serve any number of requests.

pub mod filter;
pub mod preferences;
pub mod ranking;
pub mod rules;
pub mod scoring;
pub mod views;

#[cfg(test)]
mod tests;

pub use preferences::{PreferenceRequest, Preferences, YearRange};
pub use rules::{
    CatalogError, Evidence, EvidenceSource, Rule, RuleCatalog, RuleCatalogBuilder,
    RuleCondition, RuleEffect,
};
pub use scoring::{FiredRule, ScoredCandidate, ScoringState};
pub use views::{DatasetOverview, RecommendationSummary, RecommendationView, ResultView};

use crate::dataset::{Context, Dataset, Fact};
use tracing::debug;

pub const NO_CANDIDATES_MESSAGE: &str =
    "No results after hard filters. Try loosening year range, rating, or genres.";

/// Outcome of one pass. `message` is set exactly when the hard filter left nothing, in
/// which case every list is empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation<'a> {
    /// Ranked, not truncated.
    pub results: Vec<ScoredCandidate<'a>>,
    pub candidates: Vec<&'a Fact>,
    pub rules: &'a [Rule],
    pub message: Option<String>,
}

impl<'a> Recommendation<'a> {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn top(&self, k: usize) -> &[ScoredCandidate<'a>] {
        &self.results[..k.min(self.results.len())]
    }

    pub fn summary(&self, total_facts: usize) -> RecommendationSummary {
        RecommendationSummary {
            facts: total_facts,
            rules: self.rules.len(),
            candidates: self.candidates.len(),
            scored: self.results.len(),
        }
    }
}

/// Filters, scores and ranks `facts` for one request.
pub fn recommend<'a>(
    facts: &'a [Fact],
    preferences: &Preferences,
    context: &Context,
    catalog: &'a RuleCatalog,
) -> Recommendation<'a> {
    let candidates = filter::filter(facts, preferences, context);

    if candidates.is_empty() {
        debug!(facts = facts.len(), "hard filters removed every fact");
        return Recommendation {
            results: Vec::new(),
            candidates: Vec::new(),
            rules: &[],
            message: Some(NO_CANDIDATES_MESSAGE.to_string()),
        };
    }

    let mut results = scoring::score(&candidates, preferences, catalog);
    ranking::rank(&mut results);

    debug!(
        facts = facts.len(),
        candidates = candidates.len(),
        rules = catalog.len(),
        "recommendation pass complete"
    );

    Recommendation {
        results,
        candidates,
        rules: catalog.rules(),
        message: None,
    }
}

/// A loaded dataset paired with the rule catalog built for its context.
#[derive(Debug, Clone)]
pub struct Recommender {
    dataset: Dataset,
    catalog: RuleCatalog,
}

impl Recommender {
    pub fn new(dataset: Dataset) -> Result<Self, CatalogError> {
        let catalog = RuleCatalog::standard(dataset.context())?;
        Ok(Self { dataset, catalog })
    }

    pub fn with_catalog(dataset: Dataset, catalog: RuleCatalog) -> Self {
        Self { dataset, catalog }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn context(&self) -> &Context {
        self.dataset.context()
    }

    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    pub fn overview(&self) -> DatasetOverview {
        DatasetOverview::new(self.context(), self.dataset.facts().len())
    }

    pub fn recommend(&self, preferences: &Preferences) -> Recommendation<'_> {
        recommend(
            self.dataset.facts(),
            preferences,
            self.dataset.context(),
            &self.catalog,
        )
    }

    /// Clamps a raw request, runs a pass and renders the truncated view.
    pub fn respond(&self, request: PreferenceRequest) -> RecommendationView {
        let preferences = request.resolve(self.context());
        let recommendation = self.recommend(&preferences);
        RecommendationView::new(
            self.context(),
            self.dataset.facts().len(),
            &recommendation,
            preferences.top_k,
        )
    }
}
