use super::banding::year_from_title;
use super::{Dataset, DatasetError, DatasetKind, DatasetNormalizer, FactRecord};
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

const GENRE_FILE: &str = "u.genre";
const ITEM_FILE: &str = "u.item";
const RATING_FILE: &str = "u.data";
const MOVIES_CSV: &str = "movies.csv";
const RATINGS_CSV: &str = "ratings.csv";

/// Running mean of the ratings one movie received.
#[derive(Debug, Default, Clone, Copy)]
struct RatingStats {
    sum: f64,
    count: u64,
}

impl RatingStats {
    fn add(&mut self, rating: f64) {
        self.sum += rating;
        self.count += 1;
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

fn apply_stats(record: &mut FactRecord, stats: Option<RatingStats>) {
    let stats = stats.unwrap_or_default();
    record.rating = stats.mean();
    record.rating_count = stats.count;
    record.popularity = Some(stats.count as f64);
}

fn read_file(path: &Path) -> Result<String, DatasetError> {
    let bytes = std::fs::read(path).map_err(|err| DatasetError::io(path, err))?;
    Ok(decode_text(bytes))
}

/// u.item ships as Latin-1. Anything that is not valid UTF-8 is decoded byte-per-char so
/// accented titles survive intact.
fn decode_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => err.into_bytes().into_iter().map(char::from).collect(),
    }
}

/// The classic GroupLens 100K layout: `u.genre`, `u.item` and `u.data`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MovieLens100kNormalizer;

impl MovieLens100kNormalizer {
    pub fn from_sources(
        genre_source: &str,
        item_source: &str,
        rating_source: &str,
    ) -> Result<Dataset, DatasetError> {
        let genre_names: Vec<&str> = genre_source
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| line.split('|').next())
            .map(str::trim)
            .collect();

        let stats = parse_rating_table(rating_source)?;

        let mut records = Vec::new();
        for (index, line) in item_source.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('|').collect();
            if fields.len() < 5 {
                warn!(line = index + 1, "skipping short u.item row");
                continue;
            }

            let id = fields[0].trim().to_string();
            let title = fields[1].trim().to_string();
            let year = year_from_title(&title).or_else(|| year_from_day_month_year(fields[2]));
            let genres = fields
                .iter()
                .skip(5)
                .enumerate()
                .filter(|(_, flag)| flag.trim() == "1")
                .filter_map(|(position, _)| genre_names.get(position))
                .map(|genre| genre.to_string())
                .collect();

            let mut record = FactRecord {
                id,
                title,
                year,
                genres,
                ..FactRecord::default()
            };
            let found = stats.get(&record.id).copied();
            apply_stats(&mut record, found);
            records.push(record);
        }

        debug!(
            items = records.len(),
            rated = stats.len(),
            "parsed movielens 100k tables"
        );
        Ok(Dataset::from_records(DatasetKind::MovieLens100k, records))
    }
}

impl DatasetNormalizer for MovieLens100kNormalizer {
    fn kind(&self) -> DatasetKind {
        DatasetKind::MovieLens100k
    }

    fn recognizes(&self, files: &BTreeSet<String>) -> bool {
        files.contains(GENRE_FILE) && files.contains(ITEM_FILE) && files.contains(RATING_FILE)
    }

    fn normalize(&self, dir: &Path) -> Result<Dataset, DatasetError> {
        let genres = read_file(&dir.join(GENRE_FILE))?;
        let items = read_file(&dir.join(ITEM_FILE))?;
        let ratings = read_file(&dir.join(RATING_FILE))?;
        Self::from_sources(&genres, &items, &ratings)
    }
}

/// `user \t item \t rating \t timestamp`, aggregated per item.
fn parse_rating_table(source: &str) -> Result<HashMap<String, RatingStats>, DatasetError> {
    let mut stats: HashMap<String, RatingStats> = HashMap::new();
    for (index, line) in source.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        let (item, raw_rating) = match fields.as_slice() {
            [_, item, rating, ..] => (*item, *rating),
            _ => {
                return Err(DatasetError::Malformed {
                    file: RATING_FILE.to_string(),
                    line: index + 1,
                    detail: "expected user, item and rating columns".to_string(),
                })
            }
        };
        let rating = raw_rating
            .parse::<f64>()
            .map_err(|err| DatasetError::Malformed {
                file: RATING_FILE.to_string(),
                line: index + 1,
                detail: format!("rating '{raw_rating}' is not a number ({err})"),
            })?;
        stats.entry(item.to_string()).or_default().add(rating);
    }
    Ok(stats)
}

/// Release dates look like `01-Jan-1995`.
fn year_from_day_month_year(value: &str) -> Option<i32> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%d-%b-%Y") {
        return Some(date.year());
    }
    trimmed
        .split('-')
        .nth(2)
        .and_then(|year| year.trim().parse::<i32>().ok())
}

/// The current GroupLens CSV layout: `movies.csv` with pipe-separated genres and
/// `ratings.csv`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MovieLensCsvNormalizer;

#[derive(Debug, Deserialize)]
struct MovieRow {
    #[serde(rename = "movieId")]
    movie_id: String,
    title: String,
    #[serde(default)]
    genres: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RatingRow {
    #[serde(rename = "movieId")]
    movie_id: String,
    rating: f64,
}

impl MovieLensCsvNormalizer {
    pub fn from_readers<M: Read, R: Read>(movies: M, ratings: R) -> Result<Dataset, DatasetError> {
        let mut stats: HashMap<String, RatingStats> = HashMap::new();
        let mut rating_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(ratings);
        for row in rating_reader.deserialize::<RatingRow>() {
            let row = row.map_err(|source| DatasetError::csv(RATINGS_CSV, source))?;
            stats.entry(row.movie_id).or_default().add(row.rating);
        }

        let mut movie_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(movies);
        let mut records = Vec::new();
        for row in movie_reader.deserialize::<MovieRow>() {
            let row = row.map_err(|source| DatasetError::csv(MOVIES_CSV, source))?;
            let mut record = FactRecord {
                year: year_from_title(&row.title),
                genres: row
                    .genres
                    .as_deref()
                    .map(|genres| genres.split('|').map(str::to_string).collect())
                    .unwrap_or_default(),
                id: row.movie_id,
                title: row.title,
                ..FactRecord::default()
            };
            let found = stats.get(&record.id).copied();
            apply_stats(&mut record, found);
            records.push(record);
        }

        debug!(
            movies = records.len(),
            rated = stats.len(),
            "parsed movielens csv tables"
        );
        Ok(Dataset::from_records(DatasetKind::MovieLens, records))
    }
}

impl DatasetNormalizer for MovieLensCsvNormalizer {
    fn kind(&self) -> DatasetKind {
        DatasetKind::MovieLens
    }

    fn recognizes(&self, files: &BTreeSet<String>) -> bool {
        files.contains(MOVIES_CSV) && files.contains(RATINGS_CSV)
    }

    fn normalize(&self, dir: &Path) -> Result<Dataset, DatasetError> {
        let open = |name: &str| {
            let path = dir.join(name);
            std::fs::File::open(&path).map_err(|err| DatasetError::io(&path, err))
        };
        Self::from_readers(open(MOVIES_CSV)?, open(RATINGS_CSV)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{PopularityBand, QualityBand};
    use std::io::Cursor;

    const GENRES: &str = "unknown|0\nAction|1\nAdventure|2\nAnimation|3\nChildren's|4\nComedy|5\n\n";
    const ITEMS: &str = "1|Toy Story (1995)|01-Jan-1995||http://example.test/toy|0|0|0|1|1|1\n\
2|GoldenEye (1995)|01-Jan-1995||http://example.test/goldeneye|0|1|1|0|0|0\n\
3|Untitled Reel|14-Mar-1997||http://example.test/reel|1|0|0|0|0|0\n\
4|Broken\n";
    const RATINGS: &str = "196\t1\t5\t881250949\n\
186\t1\t4\t891717742\n\
22\t2\t3\t878887116\n\
244\t1\t5\t880606923\n";

    #[test]
    fn aggregates_ratings_and_flags() {
        let dataset =
            MovieLens100kNormalizer::from_sources(GENRES, ITEMS, RATINGS).expect("parses");
        let facts = dataset.facts();
        assert_eq!(facts.len(), 3, "short rows are skipped");

        let toy_story = &facts[0];
        assert_eq!(toy_story.year, Some(1995));
        assert_eq!(toy_story.genres, vec!["Animation", "Children's", "Comedy"]);
        assert_eq!(toy_story.rating_count, 3);
        assert!((toy_story.rating - 14.0 / 3.0).abs() < 1e-9);
        assert_eq!(toy_story.quality_band, QualityBand::Excellent);
        assert_eq!(toy_story.popularity_band, PopularityBand::Popular);

        let reel = &facts[2];
        assert_eq!(reel.year, Some(1997), "falls back to the release date");
        assert!(reel.genres.is_empty(), "the unknown genre is a placeholder");
        assert_eq!(reel.rating, 0.0);
        assert_eq!(reel.rating_count, 0);
        assert_eq!(reel.popularity_band, PopularityBand::Obscure);
    }

    #[test]
    fn context_reflects_movielens_capabilities() {
        let dataset =
            MovieLens100kNormalizer::from_sources(GENRES, ITEMS, RATINGS).expect("parses");
        let context = dataset.context();
        assert_eq!(context.dataset, DatasetKind::MovieLens100k);
        assert_eq!(context.rating_scale_max, 5.0);
        assert_eq!(context.popularity_field, Some("rating_count"));
        assert!(!context.has_runtime);
        assert!(!context.has_language);
        assert_eq!(
            context.genres,
            vec!["Action", "Adventure", "Animation", "Children's", "Comedy"]
        );
    }

    #[test]
    fn malformed_rating_rows_are_reported() {
        let error = MovieLens100kNormalizer::from_sources(GENRES, ITEMS, "196\t1\tfive\t0\n")
            .expect_err("rating must be numeric");
        match error {
            DatasetError::Malformed { file, line, .. } => {
                assert_eq!(file, RATING_FILE);
                assert_eq!(line, 1);
            }
            other => panic!("expected malformed record, got {other:?}"),
        }
    }

    #[test]
    fn latin1_titles_keep_their_accents() {
        let latin1 = b"1|Cit\xe9 des enfants perdus, La (1995)|01-Jan-1995\n".to_vec();
        assert_eq!(
            decode_text(latin1),
            "1|Cit\u{e9} des enfants perdus, La (1995)|01-Jan-1995\n"
        );
        assert_eq!(decode_text("Amélie (2001)".as_bytes().to_vec()), "Amélie (2001)");
    }

    #[test]
    fn recognition_requires_all_three_tables() {
        let files = |names: &[&str]| -> BTreeSet<String> {
            names.iter().map(|name| name.to_string()).collect()
        };
        let normalizer = MovieLens100kNormalizer;
        assert!(normalizer.recognizes(&files(&[GENRE_FILE, ITEM_FILE, RATING_FILE])));
        assert!(!normalizer.recognizes(&files(&[ITEM_FILE, RATING_FILE])));
    }

    #[test]
    fn csv_layout_uses_title_years_and_pipe_genres() {
        let movies = "movieId,title,genres\n\
1,Toy Story (1995),Adventure|Animation|Children|Comedy|Fantasy\n\
2,Jumanji (1995),Adventure|Children|Fantasy\n\
3,Obscure Short,(no genres listed)\n";
        let ratings = "userId,movieId,rating,timestamp\n\
1,1,4.0,964982703\n\
2,1,5.0,964982703\n\
1,2,3.0,964982224\n";

        let dataset = MovieLensCsvNormalizer::from_readers(Cursor::new(movies), Cursor::new(ratings))
            .expect("parses");
        let facts = dataset.facts();

        assert_eq!(facts[0].rating, 4.5);
        assert_eq!(facts[0].rating_count, 2);
        assert_eq!(facts[0].quality_band, QualityBand::Excellent);
        assert_eq!(facts[1].genres, vec!["Adventure", "Children", "Fantasy"]);
        assert_eq!(facts[2].year, None);
        assert!(facts[2].genres.is_empty());
        assert_eq!(dataset.context().dataset, DatasetKind::MovieLens);
    }
}
