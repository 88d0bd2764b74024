use super::banding::{clean_genres, decade_of, PopularityThresholds};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse quality bucket derived from the rating on the dataset's scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityBand {
    Excellent,
    Good,
    Average,
    Low,
    Unknown,
}

impl QualityBand {
    /// Thresholds are `[4.2, 3.5, 2.5]` on a 5-point scale and
    /// `[8.0, 7.0, 5.5]` otherwise.
    pub fn from_rating(rating: f64, scale_max: f64) -> Self {
        if rating.is_nan() {
            return Self::Unknown;
        }

        let (excellent, good, average) = if scale_max <= 5.0 {
            (4.2, 3.5, 2.5)
        } else {
            (8.0, 7.0, 5.5)
        };

        if rating >= excellent {
            Self::Excellent
        } else if rating >= good {
            Self::Good
        } else if rating >= average {
            Self::Average
        } else {
            Self::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Average => "average",
            Self::Low => "low",
            Self::Unknown => "unknown",
        }
    }
}

/// Bucket relative to the dataset-wide popularity quartiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PopularityBand {
    Popular,
    Average,
    Obscure,
    Unknown,
}

impl PopularityBand {
    pub fn label(self) -> &'static str {
        match self {
            Self::Popular => "popular",
            Self::Average => "average",
            Self::Obscure => "obscure",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeCategory {
    Short,
    Medium,
    Long,
}

impl RuntimeCategory {
    pub fn from_minutes(runtime: Option<f64>) -> Option<Self> {
        let minutes = runtime.filter(|value| !value.is_nan())?;
        Some(if minutes < 90.0 {
            Self::Short
        } else if minutes <= 120.0 {
            Self::Medium
        } else {
            Self::Long
        })
    }
}

impl fmt::Display for QualityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for PopularityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A normalized movie, identical in shape whichever source format produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Fact {
    pub id: String,
    pub title: String,
    pub year: Option<i32>,
    pub decade: Option<i32>,
    pub genres: Vec<String>,
    pub rating: f64,
    pub rating_count: u64,
    pub popularity: Option<f64>,
    pub runtime: Option<f64>,
    pub language: Option<String>,
    pub quality_band: QualityBand,
    pub popularity_band: PopularityBand,
    pub runtime_category: Option<RuntimeCategory>,
}

impl Fact {
    pub fn has_genre(&self, genre: &str) -> bool {
        self.genres.iter().any(|candidate| candidate == genre)
    }

    pub fn shares_genre_with(&self, genres: &[String]) -> bool {
        self.genres.iter().any(|genre| genres.contains(genre))
    }

    pub fn shared_genre_count(&self, genres: &[String]) -> usize {
        self.genres
            .iter()
            .filter(|genre| genres.contains(genre))
            .count()
    }

    /// Ranking key; absent popularity sorts as zero.
    pub fn popularity_or_zero(&self) -> f64 {
        self.popularity.unwrap_or(0.0)
    }
}

/// Raw per-movie values as read from a source, before banding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FactRecord {
    pub id: String,
    pub title: String,
    pub year: Option<i32>,
    pub genres: Vec<String>,
    pub rating: f64,
    pub rating_count: u64,
    pub popularity: Option<f64>,
    pub runtime: Option<f64>,
    pub language: Option<String>,
}

impl FactRecord {
    pub fn into_fact(self, rating_scale_max: f64, thresholds: &PopularityThresholds) -> Fact {
        let year = self.year.filter(|year| *year > 0);
        Fact {
            decade: decade_of(year),
            genres: clean_genres(self.genres.as_slice()),
            quality_band: QualityBand::from_rating(self.rating, rating_scale_max),
            popularity_band: thresholds.band(self.popularity),
            runtime_category: RuntimeCategory::from_minutes(self.runtime),
            id: self.id,
            title: self.title,
            year,
            rating: self.rating,
            rating_count: self.rating_count,
            popularity: self.popularity,
            runtime: self.runtime,
            language: self.language,
        }
    }
}
