use super::preferences::Preferences;
use crate::dataset::{Context, Fact};

/// Keeps the facts that satisfy every non-trivial hard constraint.
pub fn filter<'a>(facts: &'a [Fact], preferences: &Preferences, context: &Context) -> Vec<&'a Fact> {
    facts
        .iter()
        .filter(|fact| passes(fact, preferences, context))
        .collect()
}

pub fn passes(fact: &Fact, preferences: &Preferences, context: &Context) -> bool {
    if let Some(year) = fact.year {
        if !preferences.year_range.contains(year) {
            return false;
        }
    }

    if !preferences.preferred_genres.is_empty()
        && !fact.shares_genre_with(&preferences.preferred_genres)
    {
        return false;
    }

    if !preferences.excluded_genres.is_empty()
        && fact.shares_genre_with(&preferences.excluded_genres)
    {
        return false;
    }

    if fact.rating < preferences.min_rating {
        return false;
    }

    if context.has_runtime && preferences.runtime_max > 0.0 {
        if let Some(runtime) = fact.runtime {
            if runtime > preferences.runtime_max {
                return false;
            }
        }
    }

    if context.has_language {
        if let Some(language) = &preferences.language {
            if fact.language.as_ref() != Some(language) {
                return false;
            }
        }
    }

    true
}
