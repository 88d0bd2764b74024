use crate::infra::{load_config, load_recommender};
use crate::{report, server};
use clap::{Args, Parser, Subcommand};
use movie_expert::config::parse_dataset_kind;
use movie_expert::dataset::{Context, DatasetKind};
use movie_expert::engine::PreferenceRequest;
use movie_expert::error::AppError;
use movie_expert::telemetry;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Movie Expert",
    about = "Explainable rule-based movie recommendations over local datasets",
    version
)]
struct Cli {
    #[command(flatten)]
    dataset: DatasetArgs,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Describe the detected dataset: genres, year bounds and capabilities
    Dataset(OverviewArgs),
    /// Recommend movies for the given preferences
    Recommend(RecommendArgs),
}

#[derive(Args, Debug, Default, Clone)]
pub(crate) struct DatasetArgs {
    /// Directory holding the dataset files (overrides APP_DATA_DIR)
    #[arg(long, global = true)]
    pub(crate) data_dir: Option<PathBuf>,
    /// Force a dataset format: modern, tmdb, movielens-100k or movielens
    #[arg(long, global = true, value_parser = parse_kind)]
    pub(crate) dataset: Option<DatasetKind>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct OverviewArgs {
    /// Print the overview as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct RecommendArgs {
    /// Preferred genre; repeat the flag or separate with commas
    #[arg(long = "genre", value_delimiter = ',')]
    pub(crate) genres: Vec<String>,
    /// Genre to rule out; repeat the flag or separate with commas
    #[arg(long = "exclude", value_delimiter = ',')]
    pub(crate) excluded: Vec<String>,
    /// Earliest release year (defaults to the dataset minimum)
    #[arg(long)]
    pub(crate) year_from: Option<i32>,
    /// Latest release year (defaults to the dataset maximum)
    #[arg(long)]
    pub(crate) year_to: Option<i32>,
    /// Minimum rating on the dataset's own scale
    #[arg(long)]
    pub(crate) min_rating: Option<f64>,
    /// Maximum runtime in minutes; ignored for datasets without runtimes
    #[arg(long)]
    pub(crate) runtime_max: Option<f64>,
    /// Original language code, e.g. en
    #[arg(long)]
    pub(crate) language: Option<String>,
    /// Number of results to show (1-50)
    #[arg(long)]
    pub(crate) top_k: Option<i64>,
    /// Print the recommendation payload as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

impl RecommendArgs {
    /// A missing year bound falls back to the dataset's own bound.
    pub(crate) fn to_request(&self, context: &Context) -> PreferenceRequest {
        let year_range = match (self.year_from, self.year_to) {
            (None, None) => None,
            (from, to) => Some([
                from.unwrap_or(context.year_min),
                to.unwrap_or(context.year_max),
            ]),
        };

        PreferenceRequest {
            preferred_genres: self.genres.clone(),
            excluded_genres: self.excluded.clone(),
            year_range,
            min_rating: self.min_rating,
            runtime_max: self.runtime_max,
            language: self.language.clone(),
            top_k: self.top_k,
        }
    }
}

fn parse_kind(raw: &str) -> Result<DatasetKind, String> {
    parse_dataset_kind(raw).map_err(|err| err.to_string())
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(cli.dataset, args).await,
        Command::Dataset(args) => run_overview(&cli.dataset, args),
        Command::Recommend(args) => run_recommend(&cli.dataset, args),
    }
}

fn run_overview(dataset: &DatasetArgs, args: OverviewArgs) -> Result<(), AppError> {
    let config = load_config(dataset)?;
    telemetry::init(&config.telemetry)?;

    let recommender = load_recommender(&config.dataset)?;
    let overview = recommender.overview();
    if args.json {
        report::print_json(&overview)
    } else {
        report::render_overview(&overview);
        Ok(())
    }
}

fn run_recommend(dataset: &DatasetArgs, args: RecommendArgs) -> Result<(), AppError> {
    let config = load_config(dataset)?;
    telemetry::init(&config.telemetry)?;

    let recommender = load_recommender(&config.dataset)?;
    let view = recommender.respond(args.to_request(recommender.context()));
    if args.json {
        report::print_json(&view)
    } else {
        report::render_recommendations(&view);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recommend_flags_parse_into_a_request() {
        let cli = Cli::try_parse_from([
            "movie-expert-api",
            "recommend",
            "--genre",
            "Action,Sci-Fi",
            "--exclude",
            "Horror",
            "--year-from",
            "1980",
            "--top-k",
            "5",
            "--dataset",
            "ml-100k",
        ])
        .expect("valid arguments");

        assert_eq!(cli.dataset.dataset, Some(DatasetKind::MovieLens100k));
        let Some(Command::Recommend(args)) = cli.command else {
            panic!("expected the recommend command");
        };
        assert_eq!(args.genres, vec!["Action", "Sci-Fi"]);
        assert_eq!(args.excluded, vec!["Horror"]);
        assert_eq!(args.top_k, Some(5));

        let context = Context {
            dataset: DatasetKind::MovieLens100k,
            rating_scale_max: 5.0,
            rating_field: "avg_rating",
            rating_count_field: "rating_count",
            popularity_field: Some("rating_count"),
            has_runtime: false,
            has_language: false,
            genres: Vec::new(),
            year_min: 1922,
            year_max: 1998,
        };
        let request = args.to_request(&context);
        assert_eq!(request.year_range, Some([1980, 1998]));
        assert_eq!(request.preferred_genres, vec!["Action", "Sci-Fi"]);
    }

    #[test]
    fn unknown_dataset_kind_is_rejected() {
        let result = Cli::try_parse_from(["movie-expert-api", "dataset", "--dataset", "imdb"]);
        assert!(result.is_err());
    }

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["movie-expert-api"]).expect("no arguments");
        assert!(cli.command.is_none());
    }
}
