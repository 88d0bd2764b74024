use super::scoring::{FiredRule, ScoredCandidate};
use std::cmp::Ordering;

/// How many explanations each result surfaces.
pub const MAX_EXPLANATIONS: usize = 6;

/// Score, then rating, then popularity (absent counts as zero), all descending.
pub fn compare(a: &ScoredCandidate<'_>, b: &ScoredCandidate<'_>) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.fact.rating.total_cmp(&a.fact.rating))
        .then_with(|| {
            b.fact
                .popularity_or_zero()
                .total_cmp(&a.fact.popularity_or_zero())
        })
}

/// Stable, so candidates equal on every key keep their input order.
pub fn rank(scored: &mut [ScoredCandidate<'_>]) {
    scored.sort_by(compare);
}

/// Largest `|delta|` first; the stable sort leaves ties in catalog order.
pub fn top_explanations(fired: &[FiredRule], limit: usize) -> Vec<&FiredRule> {
    let mut ordered: Vec<&FiredRule> = fired.iter().collect();
    ordered.sort_by(|a, b| b.delta.abs().total_cmp(&a.delta.abs()));
    ordered.truncate(limit);
    ordered
}
