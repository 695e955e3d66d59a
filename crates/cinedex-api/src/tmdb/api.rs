//! `TmdbApi` trait definition.
#![allow(clippy::future_not_send)]

use anyhow::Result;

use super::types::{
    DiscoverMovieParams, MovieCredits, MovieDetails, SearchMovieParams, TmdbMovieListResponse,
};

/// TMDB API trait.
///
/// Abstracts API operations for mock substitution in tests.
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(TmdbApi: Send)]
pub trait LocalTmdbApi {
    /// Searches for movies by title.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails, the API answers with a
    /// non-2xx status, or JSON parsing fails.
    async fn search_movie(&self, params: &SearchMovieParams) -> Result<TmdbMovieListResponse>;

    /// Lists movies without a query (popular movies by default).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails, the API answers with a
    /// non-2xx status, or JSON parsing fails.
    async fn discover_movies(
        &self,
        params: &DiscoverMovieParams,
    ) -> Result<TmdbMovieListResponse>;

    /// Fetches movie details.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails, the API answers with a
    /// non-2xx status, or JSON parsing fails.
    async fn movie_details(&self, movie_id: u64, language: &str) -> Result<MovieDetails>;

    /// Fetches the cast and crew of a movie.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails, the API answers with a
    /// non-2xx status, or JSON parsing fails.
    async fn movie_credits(&self, movie_id: u64, language: &str) -> Result<MovieCredits>;
}
