use movie_expert::engine::{DatasetOverview, RecommendationView, ResultView};
use movie_expert::error::AppError;
use serde::Serialize;

pub(crate) fn print_json<T: Serialize>(payload: &T) -> Result<(), AppError> {
    let json = serde_json::to_string_pretty(payload).map_err(std::io::Error::from)?;
    println!("{json}");
    Ok(())
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

pub(crate) fn render_overview(overview: &DatasetOverview) {
    println!("Dataset: {} ({} movies)", overview.dataset, overview.facts);
    println!(
        "Years: {}-{} | Rating scale: 0-{} | Runtime: {} | Language: {} | Popularity: {}",
        overview.year_min,
        overview.year_max,
        overview.rating_scale_max,
        yes_no(overview.has_runtime),
        yes_no(overview.has_language),
        yes_no(overview.has_popularity),
    );
    println!("\nGenres ({})", overview.genres.len());
    for genre in &overview.genres {
        println!("- {}", genre);
    }
}

pub(crate) fn render_recommendations(view: &RecommendationView) {
    let summary = &view.summary;
    println!(
        "Recommendations from {} ({} facts, {} rules, {} candidates)",
        view.dataset, summary.facts, summary.rules, summary.candidates
    );

    if let Some(message) = &view.message {
        println!("\n{}", message);
        return;
    }

    for (position, result) in view.results.iter().enumerate() {
        render_result(position + 1, result);
    }
}

fn render_result(rank: usize, result: &ResultView) {
    let year = result
        .year
        .map(|year| year.to_string())
        .unwrap_or_else(|| "n/a".to_string());
    println!(
        "\n{:>2}. {} [{}] score {:.1}",
        rank, result.title, year, result.score
    );
    println!(
        "    Rating {:.2} ({} ratings, {}) | Popularity: {}",
        result.rating, result.rating_count, result.quality_band, result.popularity_band
    );
    if !result.genres.is_empty() {
        println!("    Genres: {}", result.genres.join(", "));
    }
    if let Some(runtime) = result.runtime {
        println!("    Runtime: {:.0} min", runtime);
    }

    println!(
        "    Why (top {} of {} fired rules):",
        result.why.len(),
        result.fired_count
    );
    for fired in &result.why {
        println!("    {:+.1}  {}", fired.delta, fired.explanation);
    }
}
