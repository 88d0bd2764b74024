use super::scoring::{FiredRule, ScoredCandidate};
use super::Recommendation;
use crate::dataset::{
    Context, DatasetKind, Fact, PopularityBand, QualityBand, RuntimeCategory,
};
use serde::Serialize;

/// What a client needs to build a preference form for the loaded dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetOverview {
    pub ok: bool,
    pub dataset: DatasetKind,
    pub facts: usize,
    pub genres: Vec<String>,
    pub year_min: i32,
    pub year_max: i32,
    pub rating_scale_max: f64,
    pub has_runtime: bool,
    pub has_language: bool,
    pub has_popularity: bool,
}

impl DatasetOverview {
    pub fn new(context: &Context, facts: usize) -> Self {
        Self {
            ok: true,
            dataset: context.dataset,
            facts,
            genres: context.genres.clone(),
            year_min: context.year_min,
            year_max: context.year_max,
            rating_scale_max: context.rating_scale_max,
            has_runtime: context.has_runtime,
            has_language: context.has_language,
            has_popularity: context.has_popularity(),
        }
    }
}

/// Pre-truncation counts for one recommendation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecommendationSummary {
    pub facts: usize,
    pub rules: usize,
    pub candidates: usize,
    pub scored: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultView {
    pub id: String,
    pub title: String,
    pub year: Option<i32>,
    pub genres: Vec<String>,
    pub rating: f64,
    pub rating_count: u64,
    pub popularity: Option<f64>,
    pub runtime: Option<f64>,
    pub runtime_category: Option<RuntimeCategory>,
    pub language: Option<String>,
    pub quality_band: QualityBand,
    pub popularity_band: PopularityBand,
    pub score: f64,
    pub fired_count: usize,
    pub why: Vec<FiredRule>,
}

impl ResultView {
    pub fn from_scored(candidate: &ScoredCandidate<'_>) -> Self {
        let Fact {
            id,
            title,
            year,
            genres,
            rating,
            rating_count,
            popularity,
            runtime,
            language,
            quality_band,
            popularity_band,
            runtime_category,
            ..
        } = candidate.fact;

        Self {
            id: id.clone(),
            title: title.clone(),
            year: *year,
            genres: genres.clone(),
            rating: *rating,
            rating_count: *rating_count,
            popularity: *popularity,
            runtime: *runtime,
            runtime_category: *runtime_category,
            language: language.clone(),
            quality_band: *quality_band,
            popularity_band: *popularity_band,
            score: candidate.score,
            fired_count: candidate.fired_count(),
            why: candidate
                .top_explanations()
                .into_iter()
                .cloned()
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationView {
    pub ok: bool,
    pub dataset: DatasetKind,
    pub summary: RecommendationSummary,
    pub message: Option<String>,
    pub results: Vec<ResultView>,
}

impl RecommendationView {
    /// Truncates to `top_k` after ranking; the summary keeps the full counts.
    pub fn new(
        context: &Context,
        total_facts: usize,
        recommendation: &Recommendation<'_>,
        top_k: usize,
    ) -> Self {
        Self {
            ok: true,
            dataset: context.dataset,
            summary: recommendation.summary(total_facts),
            message: recommendation.message.clone(),
            results: recommendation
                .top(top_k)
                .iter()
                .map(ResultView::from_scored)
                .collect(),
        }
    }
}
