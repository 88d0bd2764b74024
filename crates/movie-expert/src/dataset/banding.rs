use super::fact::PopularityBand;
use regex::Regex;
use std::sync::OnceLock;

/// Genre strings some sources use to mean "no genre".
const GENRE_PLACEHOLDERS: &[&str] = &["(no genres listed)", "unknown"];

static TITLE_YEAR: OnceLock<Regex> = OnceLock::new();

fn title_year_pattern() -> &'static Regex {
    TITLE_YEAR.get_or_init(|| Regex::new(r"\((\d{4})\)\s*$").expect("title year pattern is valid"))
}

/// Reads a trailing `(YYYY)` suffix such as `Toy Story (1995)`.
pub fn year_from_title(title: &str) -> Option<i32> {
    title_year_pattern()
        .captures(title)
        .and_then(|captures| captures.get(1))
        .and_then(|year| year.as_str().parse().ok())
}

pub fn decade_of(year: Option<i32>) -> Option<i32> {
    year.map(|year| year.div_euclid(10) * 10)
}

/// Trims, drops blanks and placeholders, and removes duplicates keeping first-seen order.
pub fn clean_genres<S: AsRef<str>>(genres: &[S]) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(genres.len());
    for genre in genres {
        let genre = genre.as_ref().trim();
        if genre.is_empty()
            || GENRE_PLACEHOLDERS
                .iter()
                .any(|placeholder| genre.eq_ignore_ascii_case(placeholder))
        {
            continue;
        }
        if !cleaned.iter().any(|existing| existing == genre) {
            cleaned.push(genre.to_string());
        }
    }
    cleaned
}

/// First and third quartile of a popularity-like metric, computed once per dataset.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PopularityThresholds {
    pub q1: f64,
    pub q3: f64,
}

impl PopularityThresholds {
    /// Takes the sorted value at `floor(n * 0.25)` and `floor(n * 0.75)`; NaNs are ignored.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let mut sorted: Vec<f64> = values.into_iter().filter(|value| !value.is_nan()).collect();
        if sorted.is_empty() {
            return Self::default();
        }
        sorted.sort_by(f64::total_cmp);

        let at = |fraction: f64| {
            let index = (sorted.len() as f64 * fraction).floor() as usize;
            sorted[index.min(sorted.len() - 1)]
        };

        Self {
            q1: at(0.25),
            q3: at(0.75),
        }
    }

    pub fn band(&self, value: Option<f64>) -> PopularityBand {
        match value {
            Some(value) if value.is_nan() => PopularityBand::Unknown,
            Some(value) if value >= self.q3 => PopularityBand::Popular,
            Some(value) if value <= self.q1 => PopularityBand::Obscure,
            Some(_) => PopularityBand::Average,
            None => PopularityBand::Unknown,
        }
    }
}
