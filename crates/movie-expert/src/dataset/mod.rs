//! Dataset normalization: heterogeneous movie sources in, uniform facts and context out.
//!
//! Each supported source format has its own [`DatasetNormalizer`]. The data directory is
//! sniffed once at start-up and the first normalizer that recognizes its files wins; from
//! then on the rest of the crate only sees [`Fact`]s and the capability flags on
//! [`Context`].

pub mod banding;
mod fact;
mod movielens;
mod tabular;

pub use banding::PopularityThresholds;
pub use fact::{Fact, FactRecord, PopularityBand, QualityBand, RuntimeCategory};
pub use movielens::{MovieLens100kNormalizer, MovieLensCsvNormalizer};
pub use tabular::TabularNormalizer;

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

const DEFAULT_YEAR_MIN: i32 = 1900;
const DEFAULT_YEAR_MAX: i32 = 2025;

/// Recognized source formats, in detection priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DatasetKind {
    #[serde(rename = "modern")]
    Modern,
    #[serde(rename = "tmdb")]
    Tmdb,
    #[serde(rename = "movielens-100k")]
    MovieLens100k,
    #[serde(rename = "movielens")]
    MovieLens,
}

impl DatasetKind {
    pub fn ordered() -> [DatasetKind; 4] {
        [
            DatasetKind::Modern,
            DatasetKind::Tmdb,
            DatasetKind::MovieLens100k,
            DatasetKind::MovieLens,
        ]
    }

    pub fn key(self) -> &'static str {
        match self {
            DatasetKind::Modern => "modern",
            DatasetKind::Tmdb => "tmdb",
            DatasetKind::MovieLens100k => "movielens-100k",
            DatasetKind::MovieLens => "movielens",
        }
    }

    pub fn from_key(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "modern" => Some(DatasetKind::Modern),
            "tmdb" | "tmdb-5000" => Some(DatasetKind::Tmdb),
            "movielens-100k" | "ml-100k" => Some(DatasetKind::MovieLens100k),
            "movielens" | "ml-latest" => Some(DatasetKind::MovieLens),
            _ => None,
        }
    }

    /// Static facts about what the format provides.
    pub fn profile(self) -> SourceProfile {
        match self {
            DatasetKind::Modern | DatasetKind::Tmdb => SourceProfile {
                kind: self,
                rating_scale_max: 10.0,
                rating_field: "vote_average",
                rating_count_field: "vote_count",
                popularity_field: Some("popularity"),
                has_runtime: true,
                has_language: true,
            },
            DatasetKind::MovieLens100k | DatasetKind::MovieLens => SourceProfile {
                kind: self,
                rating_scale_max: 5.0,
                rating_field: "avg_rating",
                rating_count_field: "rating_count",
                popularity_field: Some("rating_count"),
                has_runtime: false,
                has_language: false,
            },
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceProfile {
    pub kind: DatasetKind,
    pub rating_scale_max: f64,
    pub rating_field: &'static str,
    pub rating_count_field: &'static str,
    pub popularity_field: Option<&'static str>,
    pub has_runtime: bool,
    pub has_language: bool,
}

/// Dataset-wide configuration and vocabulary, fixed once the facts are loaded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    pub dataset: DatasetKind,
    pub rating_scale_max: f64,
    pub rating_field: &'static str,
    pub rating_count_field: &'static str,
    pub popularity_field: Option<&'static str>,
    pub has_runtime: bool,
    pub has_language: bool,
    pub genres: Vec<String>,
    pub year_min: i32,
    pub year_max: i32,
}

impl Context {
    pub fn derive(profile: SourceProfile, facts: &[Fact]) -> Self {
        let genres: BTreeSet<&str> = facts
            .iter()
            .flat_map(|fact| fact.genres.iter().map(String::as_str))
            .collect();
        let years = facts.iter().filter_map(|fact| fact.year);

        Self {
            dataset: profile.kind,
            rating_scale_max: profile.rating_scale_max,
            rating_field: profile.rating_field,
            rating_count_field: profile.rating_count_field,
            popularity_field: profile.popularity_field,
            has_runtime: profile.has_runtime,
            has_language: profile.has_language,
            genres: genres.into_iter().map(str::to_string).collect(),
            year_min: years.clone().min().unwrap_or(DEFAULT_YEAR_MIN),
            year_max: years.max().unwrap_or(DEFAULT_YEAR_MAX),
        }
    }

    pub fn has_popularity(&self) -> bool {
        self.popularity_field.is_some()
    }
}

/// Normalized facts plus the context describing them. Immutable once built.
#[derive(Debug, Clone)]
pub struct Dataset {
    context: Context,
    facts: Vec<Fact>,
}

impl Dataset {
    /// Bands every record against dataset-global thresholds and derives the context.
    pub fn from_records(kind: DatasetKind, records: Vec<FactRecord>) -> Self {
        let profile = kind.profile();
        let thresholds =
            PopularityThresholds::from_values(records.iter().filter_map(|record| record.popularity));
        let facts: Vec<Fact> = records
            .into_iter()
            .map(|record| record.into_fact(profile.rating_scale_max, &thresholds))
            .collect();
        let context = Context::derive(profile, &facts);

        Self { context, facts }
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn facts(&self) -> &[Fact] {
        &self.facts
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("no compatible dataset found in {}", .dir.display())]
    NoCompatibleDataset { dir: PathBuf },
    #[error("{kind} dataset files are missing from {}", .dir.display())]
    MissingFiles { kind: DatasetKind, dir: PathBuf },
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid CSV in {file}: {source}")]
    Csv {
        file: String,
        #[source]
        source: csv::Error,
    },
    #[error("malformed record in {file} at line {line}: {detail}")]
    Malformed {
        file: String,
        line: usize,
        detail: String,
    },
}

impl DatasetError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn csv(file: &str, source: csv::Error) -> Self {
        Self::Csv {
            file: file.to_string(),
            source,
        }
    }
}

/// One source format's way of producing facts and context.
pub trait DatasetNormalizer {
    fn kind(&self) -> DatasetKind;

    /// Whether the listed file names are enough for this format.
    fn recognizes(&self, files: &BTreeSet<String>) -> bool;

    fn normalize(&self, dir: &Path) -> Result<Dataset, DatasetError>;
}

pub fn normalizer_for(kind: DatasetKind) -> Box<dyn DatasetNormalizer> {
    match kind {
        DatasetKind::Modern => Box::new(TabularNormalizer::modern()),
        DatasetKind::Tmdb => Box::new(TabularNormalizer::tmdb()),
        DatasetKind::MovieLens100k => Box::new(MovieLens100kNormalizer),
        DatasetKind::MovieLens => Box::new(MovieLensCsvNormalizer),
    }
}

/// Lists plain file names in `dir`. A missing directory means no dataset, not an I/O fault.
fn list_files(dir: &Path) -> Result<BTreeSet<String>, DatasetError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(DatasetError::NoCompatibleDataset {
                dir: dir.to_path_buf(),
            })
        }
        Err(err) => return Err(DatasetError::io(dir, err)),
    };

    let mut files = BTreeSet::new();
    for entry in entries {
        let entry = entry.map_err(|err| DatasetError::io(dir, err))?;
        if let Some(name) = entry.file_name().to_str() {
            files.insert(name.to_string());
        }
    }
    Ok(files)
}

/// Picks the first format whose files are present in `dir`.
pub fn detect(dir: &Path) -> Result<DatasetKind, DatasetError> {
    let files = list_files(dir)?;
    DatasetKind::ordered()
        .into_iter()
        .find(|kind| normalizer_for(*kind).recognizes(&files))
        .ok_or_else(|| DatasetError::NoCompatibleDataset {
            dir: dir.to_path_buf(),
        })
}

/// Loads the dataset in `dir`, either the forced format or the detected one.
pub fn load(dir: &Path, forced: Option<DatasetKind>) -> Result<Dataset, DatasetError> {
    let kind = match forced {
        Some(kind) => {
            let files = list_files(dir)?;
            if !normalizer_for(kind).recognizes(&files) {
                return Err(DatasetError::MissingFiles {
                    kind,
                    dir: dir.to_path_buf(),
                });
            }
            kind
        }
        None => detect(dir)?,
    };

    let dataset = normalizer_for(kind).normalize(dir)?;
    let context = dataset.context();
    info!(
        dataset = %context.dataset,
        facts = dataset.facts().len(),
        genres = context.genres.len(),
        year_min = context.year_min,
        year_max = context.year_max,
        "dataset loaded"
    );
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, year: Option<i32>, genres: &[&str], popularity: f64) -> FactRecord {
        FactRecord {
            id: id.to_string(),
            title: format!("Movie {id}"),
            year,
            genres: genres.iter().map(|genre| genre.to_string()).collect(),
            rating: 3.0,
            rating_count: popularity as u64,
            popularity: Some(popularity),
            ..FactRecord::default()
        }
    }

    #[test]
    fn dataset_kind_keys_round_trip() {
        for kind in DatasetKind::ordered() {
            assert_eq!(DatasetKind::from_key(kind.key()), Some(kind));
        }
        assert_eq!(DatasetKind::from_key("tmdb_5000"), Some(DatasetKind::Tmdb));
        assert_eq!(DatasetKind::from_key("imdb"), None);
    }

    #[test]
    fn context_collects_sorted_genres_and_year_bounds() {
        let dataset = Dataset::from_records(
            DatasetKind::MovieLens,
            vec![
                record("1", Some(1999), &["Drama", "Comedy"], 5.0),
                record("2", None, &["Action"], 50.0),
                record("3", Some(1972), &["Drama"], 1.0),
            ],
        );

        let context = dataset.context();
        assert_eq!(context.genres, vec!["Action", "Comedy", "Drama"]);
        assert_eq!(context.year_min, 1972);
        assert_eq!(context.year_max, 1999);
        assert_eq!(context.rating_scale_max, 5.0);
        assert!(context.has_popularity());
        assert!(!context.has_runtime);
    }

    #[test]
    fn context_falls_back_to_default_year_bounds() {
        let dataset = Dataset::from_records(
            DatasetKind::Tmdb,
            vec![record("1", None, &["Drama"], 1.0)],
        );
        assert_eq!(dataset.context().year_min, DEFAULT_YEAR_MIN);
        assert_eq!(dataset.context().year_max, DEFAULT_YEAR_MAX);
    }

    #[test]
    fn popularity_bands_are_dataset_global() {
        let dataset = Dataset::from_records(
            DatasetKind::MovieLens,
            vec![
                record("1", Some(1990), &["Drama"], 1.0),
                record("2", Some(1990), &["Drama"], 10.0),
                record("3", Some(1990), &["Drama"], 20.0),
                record("4", Some(1990), &["Drama"], 100.0),
            ],
        );

        let bands: Vec<PopularityBand> = dataset
            .facts()
            .iter()
            .map(|fact| fact.popularity_band)
            .collect();
        assert_eq!(
            bands,
            vec![
                PopularityBand::Obscure,
                PopularityBand::Obscure,
                PopularityBand::Average,
                PopularityBand::Popular,
            ]
        );
    }
}
