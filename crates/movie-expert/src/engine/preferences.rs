use crate::dataset::Context;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const DEFAULT_TOP_K: usize = 10;
pub const MAX_TOP_K: usize = 50;

/// Inclusive release-year window; `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearRange {
    start: i32,
    end: i32,
}

impl YearRange {
    pub fn new(a: i32, b: i32) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn end(&self) -> i32 {
        self.end
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.start..=self.end).contains(&year)
    }
}

/// One request's constraints, already clamped into range for the loaded dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub preferred_genres: Vec<String>,
    pub excluded_genres: Vec<String>,
    pub year_range: YearRange,
    pub min_rating: f64,
    /// Minutes; zero leaves runtime unconstrained.
    pub runtime_max: f64,
    pub language: Option<String>,
    pub top_k: usize,
}

impl Preferences {
    /// Accepts every fact the context describes.
    pub fn unconstrained(context: &Context) -> Self {
        PreferenceRequest::default().resolve(context)
    }
}

/// Raw request values as they arrive from the CLI or HTTP boundary.
///
/// Deserialization never fails on a wrongly typed field: the field falls back to its
/// default and `resolve` takes it from there.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreferenceRequest {
    #[serde(deserialize_with = "string_list")]
    pub preferred_genres: Vec<String>,
    #[serde(deserialize_with = "string_list")]
    pub excluded_genres: Vec<String>,
    #[serde(deserialize_with = "year_pair")]
    pub year_range: Option<[i32; 2]>,
    #[serde(deserialize_with = "number")]
    pub min_rating: Option<f64>,
    #[serde(deserialize_with = "number")]
    pub runtime_max: Option<f64>,
    #[serde(deserialize_with = "text")]
    pub language: Option<String>,
    #[serde(deserialize_with = "whole_number")]
    pub top_k: Option<i64>,
}

fn as_number(value: &Value) -> Option<f64> {
    value.as_f64().filter(|number| number.is_finite())
}

fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(value) => Some(value),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(as_number(&Value::deserialize(deserializer)?))
}

/// Fractional counts are truncated toward zero.
fn whole_number<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(as_number(&Value::deserialize(deserializer)?).map(|number| number.trunc() as i64))
}

fn year_pair<'de, D>(deserializer: D) -> Result<Option<[i32; 2]>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let years: Option<Vec<i32>> = match &value {
        Value::Array(items) => items
            .iter()
            .take(2)
            .map(|item| as_number(item).map(|year| year.trunc() as i32))
            .collect(),
        _ => None,
    };
    Ok(match years.as_deref() {
        Some([from, to]) => Some([*from, *to]),
        _ => None,
    })
}

fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(value) => Some(value),
        _ => None,
    })
}

impl PreferenceRequest {
    pub fn resolve(self, context: &Context) -> Preferences {
        let [from, to] = self
            .year_range
            .unwrap_or([context.year_min, context.year_max]);
        let clamp_year = |year: i32| year.clamp(context.year_min, context.year_max);

        let min_rating = self
            .min_rating
            .filter(|rating| !rating.is_nan())
            .unwrap_or(0.0)
            .clamp(0.0, context.rating_scale_max);

        let runtime_max = self
            .runtime_max
            .filter(|minutes| minutes.is_finite() && *minutes > 0.0)
            .unwrap_or(0.0);

        let top_k = self
            .top_k
            .unwrap_or(DEFAULT_TOP_K as i64)
            .clamp(1, MAX_TOP_K as i64) as usize;

        Preferences {
            preferred_genres: clean_list(self.preferred_genres),
            excluded_genres: clean_list(self.excluded_genres),
            year_range: YearRange::new(clamp_year(from), clamp_year(to)),
            min_rating,
            runtime_max,
            language: self
                .language
                .map(|language| language.trim().to_string())
                .filter(|language| !language.is_empty()),
            top_k,
        }
    }
}

fn clean_list(values: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let value = value.trim();
        if !value.is_empty() && !cleaned.iter().any(|existing| existing == value) {
            cleaned.push(value.to_string());
        }
    }
    cleaned
}
