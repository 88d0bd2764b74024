//! The rule catalog: data-driven (condition, effect) pairs built once per dataset context.
//!
//! Each category lives in its own builder step, so a category can be added to or left out
//! of a catalog without touching the others. Rule order is catalog order, which is also the
//! order explanations are recorded in and the tiebreak when explanations are ranked.

use super::preferences::Preferences;
use super::scoring::{FiredRule, ScoringState};
use crate::dataset::{Context, Fact, PopularityBand, QualityBand};
use serde::Serialize;
use std::collections::HashSet;

/// Only the first genres of the sorted vocabulary get an affinity rule.
pub const GENRE_RULE_LIMIT: usize = 15;
pub const BOOSTED_DECADES: [i32; 5] = [1970, 1980, 1990, 2000, 2010];
pub const GENRE_COMBOS: [(&str, &str); 3] = [
    ("Action", "Sci-Fi"),
    ("Drama", "Romance"),
    ("Animation", "Family"),
];

const GENRE_DELTA: f64 = 1.5;
const MULTI_GENRE_DELTA: f64 = 2.0;
const EXCELLENT_DELTA: f64 = 3.0;
const GOOD_DELTA: f64 = 2.0;
const POPULAR_DELTA: f64 = 1.5;
const OBSCURE_DELTA: f64 = 1.0;
const DECADE_DELTA: f64 = 1.0;
const COMBO_DELTA: f64 = 2.5;

/// What a rule tests against a fact and the request's preferences.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleCondition {
    HasGenre(String),
    /// At least `minimum` of the fact's genres are preferred; never fires without preferences.
    PreferredGenreOverlap { minimum: usize },
    Quality(QualityBand),
    Popularity(PopularityBand),
    Decade(i32),
    GenrePair(String, String),
}

impl RuleCondition {
    pub fn matches(&self, fact: &Fact, preferences: &Preferences) -> bool {
        match self {
            RuleCondition::HasGenre(genre) => fact.has_genre(genre),
            RuleCondition::PreferredGenreOverlap { minimum } => {
                !preferences.preferred_genres.is_empty()
                    && fact.shared_genre_count(&preferences.preferred_genres) >= *minimum
            }
            RuleCondition::Quality(band) => fact.quality_band == *band,
            RuleCondition::Popularity(band) => fact.popularity_band == *band,
            RuleCondition::Decade(decade) => fact.decade == Some(*decade),
            RuleCondition::GenrePair(first, second) => {
                fact.has_genre(first) && fact.has_genre(second)
            }
        }
    }
}

/// Small payload recording what made a rule fire.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Evidence {
    Genre { genre: String },
    Genres { genres: Vec<String> },
    Rating { rating: f64 },
    Popularity { popularity: Option<f64> },
    Decade { decade: i32 },
}

/// Where a rule's evidence comes from when it fires.
#[derive(Debug, Clone, PartialEq)]
pub enum EvidenceSource {
    Fixed(Evidence),
    FactGenres,
    FactRating,
    FactPopularity,
}

impl EvidenceSource {
    fn collect(&self, fact: &Fact) -> Evidence {
        match self {
            EvidenceSource::Fixed(evidence) => evidence.clone(),
            EvidenceSource::FactGenres => Evidence::Genres {
                genres: fact.genres.clone(),
            },
            EvidenceSource::FactRating => Evidence::Rating {
                rating: fact.rating,
            },
            EvidenceSource::FactPopularity => Evidence::Popularity {
                popularity: fact.popularity,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleEffect {
    pub delta: f64,
    pub explanation: String,
    pub evidence: EvidenceSource,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub id: String,
    pub description: String,
    pub condition: RuleCondition,
    pub effect: RuleEffect,
}

impl Rule {
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        condition: RuleCondition,
        effect: RuleEffect,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            condition,
            effect,
        }
    }

    pub fn matches(&self, fact: &Fact, preferences: &Preferences) -> bool {
        self.condition.matches(fact, preferences)
    }

    /// Adds this rule's delta and explanation to the state.
    pub fn apply<'a>(&self, state: ScoringState<'a>) -> ScoringState<'a> {
        let evidence = self.effect.evidence.collect(state.fact());
        state.record(FiredRule {
            rule_id: self.id.clone(),
            description: self.description.clone(),
            delta: self.effect.delta,
            explanation: self.effect.explanation.clone(),
            evidence,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("rule id '{0}' is defined more than once")]
    DuplicateRuleId(String),
}

/// Immutable, ordered rule list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleCatalog {
    rules: Vec<Rule>,
}

impl RuleCatalog {
    pub fn builder(context: &Context) -> RuleCatalogBuilder<'_> {
        RuleCatalogBuilder {
            context,
            rules: Vec::new(),
        }
    }

    /// Every category, in the standard order.
    pub fn standard(context: &Context) -> Result<Self, CatalogError> {
        Self::builder(context)
            .genre_affinity()
            .multi_genre_match()
            .quality_bands()
            .popularity_bands()
            .decades()
            .genre_combos()
            .build()
    }

    pub fn from_rules(rules: Vec<Rule>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::with_capacity(rules.len());
        for rule in &rules {
            if !seen.insert(rule.id.as_str()) {
                return Err(CatalogError::DuplicateRuleId(rule.id.clone()));
            }
        }
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.id == id)
    }
}

pub struct RuleCatalogBuilder<'c> {
    context: &'c Context,
    rules: Vec<Rule>,
}

impl RuleCatalogBuilder<'_> {
    pub fn genre_affinity(mut self) -> Self {
        for genre in self.context.genres.iter().take(GENRE_RULE_LIMIT) {
            self.rules.push(Rule::new(
                format!("GENRE_{genre}"),
                format!("Boost for genre {genre}"),
                RuleCondition::HasGenre(genre.clone()),
                RuleEffect {
                    delta: GENRE_DELTA,
                    explanation: format!("Matches genre {genre}"),
                    evidence: EvidenceSource::Fixed(Evidence::Genre {
                        genre: genre.clone(),
                    }),
                },
            ));
        }
        self
    }

    pub fn multi_genre_match(mut self) -> Self {
        self.rules.push(Rule::new(
            "GENRE_MULTI",
            "Boost for multiple preferred genres",
            RuleCondition::PreferredGenreOverlap { minimum: 2 },
            RuleEffect {
                delta: MULTI_GENRE_DELTA,
                explanation: "Matches multiple preferred genres".to_string(),
                evidence: EvidenceSource::FactGenres,
            },
        ));
        self
    }

    pub fn quality_bands(mut self) -> Self {
        self.rules.push(Rule::new(
            "QUALITY_EXCELLENT",
            "Excellent quality",
            RuleCondition::Quality(QualityBand::Excellent),
            RuleEffect {
                delta: EXCELLENT_DELTA,
                explanation: "High quality rating".to_string(),
                evidence: EvidenceSource::FactRating,
            },
        ));
        self.rules.push(Rule::new(
            "QUALITY_GOOD",
            "Good quality",
            RuleCondition::Quality(QualityBand::Good),
            RuleEffect {
                delta: GOOD_DELTA,
                explanation: "Good rating".to_string(),
                evidence: EvidenceSource::FactRating,
            },
        ));
        self
    }

    /// Skipped entirely when the dataset has no popularity-like metric.
    pub fn popularity_bands(mut self) -> Self {
        if !self.context.has_popularity() {
            return self;
        }
        self.rules.push(Rule::new(
            "POPULARITY_POPULAR",
            "Popular title",
            RuleCondition::Popularity(PopularityBand::Popular),
            RuleEffect {
                delta: POPULAR_DELTA,
                explanation: "Popular with many ratings".to_string(),
                evidence: EvidenceSource::FactPopularity,
            },
        ));
        self.rules.push(Rule::new(
            "POPULARITY_OBSCURE",
            "Obscure gem",
            RuleCondition::Popularity(PopularityBand::Obscure),
            RuleEffect {
                delta: OBSCURE_DELTA,
                explanation: "Obscure gem".to_string(),
                evidence: EvidenceSource::FactPopularity,
            },
        ));
        self
    }

    pub fn decades(mut self) -> Self {
        for decade in BOOSTED_DECADES {
            self.rules.push(Rule::new(
                format!("DECADE_{decade}"),
                format!("Boost for {decade}s"),
                RuleCondition::Decade(decade),
                RuleEffect {
                    delta: DECADE_DELTA,
                    explanation: format!("Released in {decade}s"),
                    evidence: EvidenceSource::Fixed(Evidence::Decade { decade }),
                },
            ));
        }
        self
    }

    pub fn genre_combos(mut self) -> Self {
        for (first, second) in GENRE_COMBOS {
            self.rules.push(Rule::new(
                format!("COMBO_{first}_{second}"),
                format!("Strong combo {first}+{second}"),
                RuleCondition::GenrePair(first.to_string(), second.to_string()),
                RuleEffect {
                    delta: COMBO_DELTA,
                    explanation: format!("Strong combo: {first} + {second}"),
                    evidence: EvidenceSource::Fixed(Evidence::Genres {
                        genres: vec![first.to_string(), second.to_string()],
                    }),
                },
            ));
        }
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn build(self) -> Result<RuleCatalog, CatalogError> {
        RuleCatalog::from_rules(self.rules)
    }
}
