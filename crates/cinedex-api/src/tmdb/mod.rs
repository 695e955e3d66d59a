//! TMDB API client module.
//!
//! Handles HTTP requests to the TMDB API v3 movie endpoints
//! and builds image URLs for the returned paths.

mod api;
mod client;
/// Image URL helpers.
pub mod images;
mod rate_limiter;
mod types;

#[allow(clippy::module_name_repetitions)]
pub use api::{LocalTmdbApi, TmdbApi};
#[allow(clippy::module_name_repetitions)]
pub use client::{TmdbClient, TmdbClientBuilder};
#[allow(clippy::module_name_repetitions)]
pub use types::{
    CastMember, CrewMember, DEFAULT_LANGUAGE, DiscoverMovieParams, MovieCredits, MovieDetails,
    MovieSummary, ProductionCompany, ProductionCountry, SearchMovieParams, SpokenLanguage,
    TmdbGenre, TmdbMovieListResponse,
};
