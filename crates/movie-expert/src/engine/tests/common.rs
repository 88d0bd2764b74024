use crate::dataset::{Dataset, DatasetKind, Fact, FactRecord};
use crate::engine::{Preferences, PreferenceRequest, RuleCatalog};

pub(super) fn record(id: &str, genres: &[&str], year: Option<i32>, rating: f64) -> FactRecord {
    FactRecord {
        id: id.to_string(),
        title: format!("Movie {id}"),
        year,
        genres: genres.iter().map(|genre| genre.to_string()).collect(),
        rating,
        ..FactRecord::default()
    }
}

/// The three-movie scenario: a 1995 drama, a 2010 action sci-fi and a 1985 comedy.
pub(super) fn scenario_dataset() -> Dataset {
    Dataset::from_records(
        DatasetKind::Tmdb,
        vec![
            record("1", &["Drama"], Some(1995), 8.5),
            record("2", &["Action", "Sci-Fi"], Some(2010), 7.0),
            record("3", &["Comedy"], Some(1985), 4.0),
        ],
    )
}

/// A TMDB-shaped catalog with runtime, language and popularity populated.
pub(super) fn catalog_dataset() -> Dataset {
    let rows = [
        ("10", &["Action", "Sci-Fi"][..], Some(2009), 7.2, Some(150.4), Some(162.0), Some("en")),
        ("11", &["Drama", "Romance"][..], Some(1997), 7.5, Some(100.0), Some(194.0), Some("en")),
        ("12", &["Comedy"][..], Some(2001), 7.9, Some(20.0), Some(122.0), Some("fr")),
        ("13", &["Drama"][..], None, 6.1, Some(2.0), None, None),
        ("14", &["Animation", "Family"][..], Some(1995), 7.7, Some(60.0), Some(81.0), Some("en")),
        ("15", &["Horror"][..], Some(1980), 5.2, Some(8.0), Some(95.0), Some("en")),
        ("16", &["Action", "Thriller"][..], Some(1988), 7.1, Some(35.0), Some(132.0), Some("en")),
        ("17", &["Drama", "Romance"][..], Some(1942), 8.2, Some(4.5), Some(102.0), Some("en")),
    ];

    let records = rows
        .into_iter()
        .map(|(id, genres, year, rating, popularity, runtime, language)| FactRecord {
            popularity,
            runtime,
            language: language.map(str::to_string),
            rating_count: 100,
            ..record(id, genres, year, rating)
        })
        .collect();

    Dataset::from_records(DatasetKind::Tmdb, records)
}

pub(super) fn catalog_for(dataset: &Dataset) -> RuleCatalog {
    RuleCatalog::standard(dataset.context()).expect("standard catalog has unique ids")
}

pub(super) fn resolve(dataset: &Dataset, request: PreferenceRequest) -> Preferences {
    request.resolve(dataset.context())
}

pub(super) fn genres(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

pub(super) fn ids<'a>(facts: impl IntoIterator<Item = &'a Fact>) -> Vec<&'a str> {
    facts.into_iter().map(|fact| fact.id.as_str()).collect()
}
