//! cinedex - search and browse TMDB movies from the terminal.

/// Application configuration (TOML).
mod config;
/// Display formatting for listings and detail pages.
mod format;
/// Terminal UI components.
mod tui;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use cinedex_api::tmdb::{MovieCredits, MovieDetails, MovieSummary, TmdbClient};
use cinedex_core::{
    FetchController, FetchState, SearchAccounting, SearchMetrics, SearchOptions, movie_credits,
    movie_details, movie_search, popular_movies,
};
use cinedex_db::{SearchMetric, SqliteSearchMetrics, load_trending, open_db};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing::instrument;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
#[cfg(not(feature = "otel"))]
use tracing_subscriber::fmt;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{API_TOKEN_ENV, AppConfig, resolve_config_path};

const APP_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (rev:",
    env!("GIT_HASH"),
    ")",
);

/// CLI argument parser.
#[derive(Parser)]
#[command(name = "cinedex", about, version = APP_VERSION)]
struct Cli {
    /// Override config/data directory.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Search movies by title.
    Search(SearchArgs),
    /// List popular movies.
    Popular(PopularArgs),
    /// Show movie details and cast.
    Movie(MovieArgs),
    /// List the most searched terms.
    Trending(TrendingArgs),
    /// Browse movies interactively via TUI.
    Browse(BrowseArgs),
    /// Show or initialize the config file.
    Config(ConfigArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

/// Arguments for the `search` subcommand.
#[derive(clap::Args)]
struct SearchArgs {
    /// Search query (e.g. "dune").
    #[arg(long, required = true)]
    query: String,
    /// Response language (default: `tmdb.language` from config).
    #[arg(long)]
    language: Option<String>,
    /// Filter by year.
    #[arg(long)]
    year: Option<u32>,
    /// Do not record this search in the metrics store.
    #[arg(long)]
    no_record: bool,
}

/// Arguments for the `popular` subcommand.
#[derive(clap::Args)]
struct PopularArgs {
    /// Response language (default: `tmdb.language` from config).
    #[arg(long)]
    language: Option<String>,
    /// Result page (1-based).
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    page: u32,
}

/// Arguments for the `movie` subcommand.
#[derive(clap::Args)]
struct MovieArgs {
    /// TMDB movie ID (e.g. 438631).
    #[arg(long, required = true)]
    id: u64,
    /// Response language (default: `tmdb.language` from config).
    #[arg(long)]
    language: Option<String>,
}

/// Arguments for the `trending` subcommand.
#[derive(clap::Args)]
struct TrendingArgs {
    /// Number of terms to list (default: `trending.limit` from config).
    #[arg(long)]
    limit: Option<u32>,
}

/// Arguments for the `browse` subcommand.
#[derive(clap::Args)]
struct BrowseArgs {
    /// Response language (default: `tmdb.language` from config).
    #[arg(long)]
    language: Option<String>,
}

/// Arguments for the `config` subcommand.
#[derive(clap::Args)]
struct ConfigArgs {
    /// Write a default config file if none exists.
    #[arg(long)]
    init: bool,
}

/// Arguments for the `completions` subcommand.
#[derive(clap::Args)]
struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum)]
    shell: Shell,
}

/// Builds a TMDB client from config and environment.
///
/// # Errors
///
/// Returns an error if no API token is available, `tmdb.base_url` is
/// invalid, or the client fails to build.
#[instrument(skip_all)]
fn build_tmdb_client(config: &AppConfig) -> Result<TmdbClient> {
    let api_token = config.api_token().with_context(|| {
        format!("{API_TOKEN_ENV} environment variable or tmdb.api_token is required")
    })?;

    let mut builder = TmdbClient::builder()
        .api_token(api_token)
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
        .min_interval(config.min_interval());
    if let Some(base_url) = config.base_url()? {
        builder = builder.base_url(base_url);
    }
    builder.build().context("failed to build TMDB client")
}

/// Returns the requested language or the configured default.
fn language_or_default(language: Option<&String>, config: &AppConfig) -> String {
    language.map_or_else(|| config.tmdb.language.clone(), Clone::clone)
}

/// Turns a settled state into its data, or its error.
fn settled_data<T>(state: FetchState<T>) -> Result<Option<T>> {
    if let Some(error) = state.error {
        return Err(error.into());
    }
    Ok(state.data)
}

/// Runs the `search` subcommand.
///
/// # Errors
///
/// Returns an error if the TMDB client fails to build or the search fails.
#[instrument(skip_all)]
async fn run_search(args: &SearchArgs, config: &AppConfig, dir: Option<&Path>) -> Result<()> {
    let client = Arc::new(build_tmdb_client(config)?);
    let options = SearchOptions {
        debounce: config.debounce(),
        language: language_or_default(args.language.as_ref(), config),
        year: args.year,
        record: config.search.record && !args.no_record,
    };

    let controller = FetchController::new(args.query.clone(), movie_search(client, &options));
    let state = controller.settled().await;

    if options.record {
        let metrics = Arc::new(SqliteSearchMetrics::new(
            open_db(dir).context("failed to open database")?,
        ));
        let accounting = SearchAccounting::new(metrics);
        if let Some(movie) = accounting.claim(&args.query, &state) {
            if let Err(e) = accounting.metrics().record_search(&args.query, &movie).await {
                tracing::warn!(error = format!("{e:#}"), "failed to record search");
            }
        }
    }

    let movies = settled_data(state)?.unwrap_or_default();
    print_search_results(&args.query, &movies);
    Ok(())
}

/// Runs the `popular` subcommand.
///
/// # Errors
///
/// Returns an error if the TMDB client fails to build or the request fails.
#[instrument(skip_all)]
async fn run_popular(args: &PopularArgs, config: &AppConfig) -> Result<()> {
    let client = Arc::new(build_tmdb_client(config)?);
    let language = language_or_default(args.language.as_ref(), config);

    let controller = FetchController::new(args.page, popular_movies(client, language));
    let movies = settled_data(controller.settled().await)?.unwrap_or_default();

    tracing::info!("Popular movies (page {}):", args.page);
    print_movie_lines(&movies);
    Ok(())
}

/// Runs the `movie` subcommand.
///
/// Details and credits are fetched concurrently by two controllers.
///
/// # Errors
///
/// Returns an error if the TMDB client fails to build or the details
/// request fails.
#[instrument(skip_all)]
async fn run_movie(args: &MovieArgs, config: &AppConfig) -> Result<()> {
    let client = Arc::new(build_tmdb_client(config)?);
    let language = language_or_default(args.language.as_ref(), config);

    let details = FetchController::new(args.id, movie_details(Arc::clone(&client), &*language));
    let credits = FetchController::new(args.id, movie_credits(client, language));
    let (details, credits) = tokio::join!(details.settled(), credits.settled());

    let Some(details) = settled_data(details)? else {
        return Ok(());
    };
    let credits = match settled_data(credits) {
        Ok(credits) => credits,
        Err(e) => {
            tracing::warn!(error = %e, "cast unavailable");
            None
        }
    };
    print_movie(&details, credits.as_ref());
    Ok(())
}

/// Runs the `trending` subcommand.
///
/// # Errors
///
/// Returns an error if DB operations fail.
#[instrument(skip_all)]
fn run_trending(args: &TrendingArgs, config: &AppConfig, dir: Option<&Path>) -> Result<()> {
    let conn = open_db(dir).context("failed to open database")?;
    let limit = args.limit.unwrap_or(config.trending.limit);
    let metrics = load_trending(&conn, limit).context("failed to load trending searches")?;
    print_trending(&metrics);
    Ok(())
}

/// Runs the `browse` subcommand.
///
/// # Errors
///
/// Returns an error if the TMDB client, the database, or the TUI fails.
#[instrument(skip_all)]
async fn run_browse(args: &BrowseArgs, config: &AppConfig, dir: Option<&Path>) -> Result<()> {
    let client = Arc::new(build_tmdb_client(config)?);
    let metrics = Arc::new(SqliteSearchMetrics::new(
        open_db(dir).context("failed to open database")?,
    ));
    let options = SearchOptions {
        debounce: config.debounce(),
        language: language_or_default(args.language.as_ref(), config),
        year: None,
        record: config.search.record,
    };

    tui::run_browser(client, metrics, &options)
        .await
        .context("movie browser TUI failed")
}

/// Runs the `config` subcommand.
///
/// # Errors
///
/// Returns an error if the config path cannot be resolved or the file
/// cannot be written or serialized.
#[instrument(skip_all)]
fn run_config(args: &ConfigArgs, config: AppConfig, path: &Path) -> Result<()> {
    if args.init {
        if path.exists() {
            tracing::info!("Config already exists: {}", path.display());
        } else {
            AppConfig::default().save(path)?;
            tracing::info!("Wrote default config to {}", path.display());
        }
        return Ok(());
    }

    let mut shown = config;
    if shown.tmdb.api_token.is_some() {
        shown.tmdb.api_token = Some(String::from("***"));
    }
    let content = toml::to_string_pretty(&shown).context("failed to serialize config to TOML")?;
    tracing::info!("Config file: {}", path.display());
    for line in content.lines() {
        tracing::info!("{line}");
    }
    Ok(())
}

/// Prints search results with a summary line.
fn print_search_results(query: &str, movies: &[MovieSummary]) {
    let query = query.trim();
    if query.is_empty() {
        return;
    }
    if movies.is_empty() {
        tracing::info!("No results found for \"{query}\".");
        return;
    }
    tracing::info!("Search results for \"{query}\": {}", movies.len());
    print_movie_lines(movies);
}

/// Prints one line per movie.
fn print_movie_lines(movies: &[MovieSummary]) {
    for movie in movies {
        tracing::info!("{}\t{}", movie.id, format::summary_line(movie));
    }
}

/// Prints a detail page and its cast.
fn print_movie(details: &MovieDetails, credits: Option<&MovieCredits>) {
    for (label, value) in format::detail_fields(details) {
        tracing::info!("{label}: {value}");
    }
    let cast = credits.map(format::cast_lines).unwrap_or_default();
    if cast.is_empty() {
        return;
    }
    tracing::info!("Cast:");
    for line in cast {
        tracing::info!("  {line}");
    }
}

/// Prints trending search terms.
fn print_trending(metrics: &[SearchMetric]) {
    if metrics.is_empty() {
        tracing::info!("No searches recorded yet.");
        return;
    }
    for (rank, metric) in (1_u32..).zip(metrics) {
        tracing::info!(
            "{rank}. {}\t{} searches\t{}",
            metric.search_term,
            metric.count,
            metric.title
        );
    }
}

/// Whether log lines may be written to the terminal.
///
/// `browse` draws on the alternate screen, so its log lines are dropped.
const fn logs_to_terminal(command: &Commands) -> bool {
    !matches!(command, Commands::Browse(_))
}

/// Returns the fmt writer for `command`.
fn log_writer(command: &Commands) -> BoxMakeWriter {
    if logs_to_terminal(command) {
        BoxMakeWriter::new(io::stdout)
    } else {
        BoxMakeWriter::new(io::sink)
    }
}

/// Entry point.
///
/// # Errors
///
/// Returns an error if subcommand execution fails.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let writer = log_writer(&cli.command);

    #[cfg(not(feature = "otel"))]
    {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .with_writer(writer)
            .init();
    }

    #[cfg(feature = "otel")]
    {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(writer);

        let otel_layer = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .and_then(|_| {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_http()
                    .build()
                    .ok()?;

                let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
                    .with_simple_exporter(exporter)
                    .build();

                let tracer = opentelemetry::trace::TracerProvider::tracer(
                    &tracer_provider,
                    env!("CARGO_PKG_NAME"),
                );
                opentelemetry::global::set_tracer_provider(tracer_provider);

                Some(tracing_opentelemetry::layer().with_tracer(tracer))
            });

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .init();
    }

    let dir = cli.dir.as_deref();

    if let Commands::Completions(args) = &cli.command {
        clap_complete::generate(args.shell, &mut Cli::command(), "cinedex", &mut io::stdout());
        return Ok(());
    }

    let config_path = resolve_config_path(dir)?;
    let config = AppConfig::load(&config_path)?;

    match cli.command {
        Commands::Search(args) => run_search(&args, &config, dir).await,
        Commands::Popular(args) => run_popular(&args, &config).await,
        Commands::Movie(args) => run_movie(&args, &config).await,
        Commands::Trending(args) => run_trending(&args, &config, dir),
        Commands::Browse(args) => run_browse(&args, &config, dir).await,
        Commands::Config(args) => run_config(&args, config, &config_path),
        Commands::Completions(_) => Ok(()),
    }
}
