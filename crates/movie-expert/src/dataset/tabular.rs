use super::banding::year_from_title;
use super::{Dataset, DatasetError, DatasetKind, DatasetNormalizer, FactRecord};
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;

static GENRE_NAME: OnceLock<Regex> = OnceLock::new();

/// Single-file CSV exports with vote statistics, popularity, runtime and language
/// (`modern_movies.csv` or the TMDB 5000 `tmdb_5000_movies.csv`).
#[derive(Debug, Clone, Copy)]
pub struct TabularNormalizer {
    kind: DatasetKind,
    file_name: &'static str,
}

impl TabularNormalizer {
    pub fn modern() -> Self {
        Self {
            kind: DatasetKind::Modern,
            file_name: "modern_movies.csv",
        }
    }

    pub fn tmdb() -> Self {
        Self {
            kind: DatasetKind::Tmdb,
            file_name: "tmdb_5000_movies.csv",
        }
    }

    pub fn file_name(&self) -> &'static str {
        self.file_name
    }

    pub fn from_reader<R: Read>(&self, reader: R) -> Result<Dataset, DatasetError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let mut records = Vec::new();
        for (index, row) in csv_reader.deserialize::<TabularRow>().enumerate() {
            let row = row.map_err(|source| DatasetError::csv(self.file_name, source))?;
            records.push(row.into_record(index));
        }

        debug!(dataset = %self.kind, rows = records.len(), "parsed tabular rows");
        Ok(Dataset::from_records(self.kind, records))
    }
}

impl DatasetNormalizer for TabularNormalizer {
    fn kind(&self) -> DatasetKind {
        self.kind
    }

    fn recognizes(&self, files: &BTreeSet<String>) -> bool {
        files.contains(self.file_name)
    }

    fn normalize(&self, dir: &Path) -> Result<Dataset, DatasetError> {
        let path = dir.join(self.file_name);
        let file = std::fs::File::open(&path).map_err(|err| DatasetError::io(&path, err))?;
        self.from_reader(file)
    }
}

#[derive(Debug, Deserialize)]
struct TabularRow {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    movie_id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    title: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    original_title: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    release_date: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    vote_average: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    vote_count: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    popularity: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    runtime: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    original_language: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    genres: Option<String>,
}

impl TabularRow {
    fn into_record(self, index: usize) -> FactRecord {
        let title = self
            .title
            .or(self.original_title)
            .unwrap_or_else(|| "Untitled".to_string());
        let year = self
            .release_date
            .as_deref()
            .and_then(year_from_release_date)
            .or_else(|| year_from_title(&title));

        FactRecord {
            id: self
                .id
                .or(self.movie_id)
                .unwrap_or_else(|| format!("row-{}", index + 1)),
            year,
            genres: self.genres.as_deref().map(parse_genres).unwrap_or_default(),
            rating: parse_number(self.vote_average.as_deref()).unwrap_or(0.0),
            rating_count: parse_number(self.vote_count.as_deref())
                .filter(|count| *count >= 0.0)
                .map(|count| count as u64)
                .unwrap_or(0),
            popularity: parse_number(self.popularity.as_deref()),
            runtime: parse_number(self.runtime.as_deref()).filter(|minutes| *minutes > 0.0),
            language: self.original_language,
            title,
        }
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn parse_number(value: Option<&str>) -> Option<f64> {
    value
        .and_then(|raw| raw.trim().parse::<f64>().ok())
        .filter(|number| number.is_finite())
}

fn year_from_release_date(value: &str) -> Option<i32> {
    if let Ok(date) = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d") {
        return Some(date.year());
    }
    value
        .split('-')
        .next()
        .and_then(|year| year.trim().parse::<i32>().ok())
        .filter(|year| *year > 0)
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GenreEntry {
    Named { name: String },
    Plain(String),
}

/// Genre column as a JSON list (`[{"id": 28, "name": "Action"}]` or `["Action"]`),
/// falling back to `|` or `,` separated free text.
fn parse_genres(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.starts_with('[') {
        if let Ok(entries) = serde_json::from_str::<Vec<GenreEntry>>(trimmed) {
            return entries
                .into_iter()
                .map(|entry| match entry {
                    GenreEntry::Named { name } | GenreEntry::Plain(name) => name,
                })
                .collect();
        }

        let pattern = GENRE_NAME.get_or_init(|| {
            Regex::new(r#"['"]name['"]\s*:\s*['"]([^'"]+)['"]"#).expect("genre pattern is valid")
        });
        let named: Vec<String> = pattern
            .captures_iter(trimmed)
            .filter_map(|captures| captures.get(1))
            .map(|name| name.as_str().to_string())
            .collect();
        if !named.is_empty() {
            return named;
        }

        // Single-quoted list of plain names, e.g. `['Drama', 'War']`.
        return trimmed
            .trim_start_matches('[')
            .trim_end_matches(']')
            .split(',')
            .map(|genre| genre.trim().trim_matches(|c: char| c == '\'' || c == '"').to_string())
            .collect();
    }

    let separator = if trimmed.contains('|') { '|' } else { ',' };
    trimmed
        .split(separator)
        .map(|genre| genre.trim().to_string())
        .collect()
}
