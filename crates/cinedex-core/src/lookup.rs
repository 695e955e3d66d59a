//! Producers for movie listings and the movie detail page.
//!
//! Each builder returns a closure suitable for [`FetchController::new`].
//!
//! [`FetchController::new`]: crate::fetch::FetchController::new

use std::sync::Arc;

use anyhow::{Context, Result};
use cinedex_api::tmdb::{DiscoverMovieParams, MovieCredits, MovieDetails, MovieSummary, TmdbApi};
use futures::FutureExt;
use futures::future::BoxFuture;

/// Builds a producer fetching `movie/{id}` for the keyed movie ID.
pub fn movie_details<A>(
    api: Arc<A>,
    language: impl Into<String>,
) -> impl Fn(u64) -> BoxFuture<'static, Result<MovieDetails>> + Send + Sync + 'static
where
    A: TmdbApi + Send + Sync + 'static,
{
    let language = language.into();
    move |movie_id: u64| {
        let api = Arc::clone(&api);
        let language = language.clone();
        async move {
            api.movie_details(movie_id, &language)
                .await
                .with_context(|| format!("Failed to fetch movie {movie_id}"))
        }
        .boxed()
    }
}

/// Builds a producer fetching `movie/{id}/credits` for the keyed movie ID.
pub fn movie_credits<A>(
    api: Arc<A>,
    language: impl Into<String>,
) -> impl Fn(u64) -> BoxFuture<'static, Result<MovieCredits>> + Send + Sync + 'static
where
    A: TmdbApi + Send + Sync + 'static,
{
    let language = language.into();
    move |movie_id: u64| {
        let api = Arc::clone(&api);
        let language = language.clone();
        async move {
            api.movie_credits(movie_id, &language)
                .await
                .with_context(|| format!("Failed to fetch credits for movie {movie_id}"))
        }
        .boxed()
    }
}

/// Builds a producer listing popular movies for the keyed page.
pub fn popular_movies<A>(
    api: Arc<A>,
    language: impl Into<String>,
) -> impl Fn(u32) -> BoxFuture<'static, Result<Vec<MovieSummary>>> + Send + Sync + 'static
where
    A: TmdbApi + Send + Sync + 'static,
{
    let language = language.into();
    move |page: u32| {
        let api = Arc::clone(&api);
        let params = DiscoverMovieParams::default()
            .language(language.clone())
            .page(page);
        async move {
            let response = api
                .discover_movies(&params)
                .await
                .context("Failed to fetch movies")?;
            Ok(response.results)
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::sync::Mutex;

    use anyhow::bail;
    use cinedex_api::tmdb::{SearchMovieParams, TmdbMovieListResponse};

    use super::*;
    use crate::fetch::FetchController;

    /// Mock TMDB API recording the requests it receives.
    #[derive(Default)]
    struct MockApi {
        requests: Mutex<Vec<String>>,
    }

    impl MockApi {
        fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl TmdbApi for MockApi {
        async fn search_movie(&self, _params: &SearchMovieParams) -> Result<TmdbMovieListResponse> {
            bail!("not used")
        }

        async fn discover_movies(
            &self,
            params: &DiscoverMovieParams,
        ) -> Result<TmdbMovieListResponse> {
            self.requests.lock().unwrap().push(format!(
                "discover {} {} {}",
                params.sort_by, params.language, params.page
            ));
            Ok(TmdbMovieListResponse {
                page: params.page,
                results: vec![MovieSummary {
                    id: 438_631,
                    title: String::from("Dune"),
                    ..MovieSummary::default()
                }],
                total_pages: 10,
                total_results: 200,
            })
        }

        async fn movie_details(&self, movie_id: u64, language: &str) -> Result<MovieDetails> {
            self.requests
                .lock()
                .unwrap()
                .push(format!("details {movie_id} {language}"));
            let json = include_str!("../../../fixtures/tmdb/movie_details_438631.json");
            Ok(serde_json::from_str(json)?)
        }

        async fn movie_credits(&self, movie_id: u64, _language: &str) -> Result<MovieCredits> {
            self.requests
                .lock()
                .unwrap()
                .push(format!("credits {movie_id}"));
            bail!(
                "TMDB API error (HTTP 404 Not Found): \
                 The resource you requested could not be found."
            )
        }
    }

    #[tokio::test]
    async fn test_details_and_credits_controllers_share_key() {
        // Arrange
        let api = Arc::new(MockApi::default());

        // Act
        let details = FetchController::new(438_631, movie_details(Arc::clone(&api), "ja-JP"));
        let credits = FetchController::new(438_631, movie_credits(Arc::clone(&api), "ja-JP"));
        let (details, credits) = tokio::join!(details.settled(), credits.settled());

        // Assert
        assert_eq!(details.data.unwrap().runtime, Some(155));
        assert!(credits.data.is_none());
        assert_eq!(
            credits.error.unwrap().message(),
            "Failed to fetch credits for movie 438631: TMDB API error (HTTP 404 Not Found): \
             The resource you requested could not be found."
        );
        assert_eq!(
            api.requests(),
            vec![
                String::from("details 438631 ja-JP"),
                String::from("credits 438631"),
            ]
        );
    }

    #[tokio::test]
    async fn test_popular_movies_pages() {
        // Arrange
        let api = Arc::new(MockApi::default());
        let controller = FetchController::new(1, popular_movies(Arc::clone(&api), "en-US"));
        controller.settled().await;

        // Act
        controller.set_key(3);
        let state = controller.settled().await;

        // Assert
        assert_eq!(state.data.unwrap()[0].title, "Dune");
        assert_eq!(
            api.requests(),
            vec![
                String::from("discover popularity.desc en-US 1"),
                String::from("discover popularity.desc en-US 3"),
            ]
        );
    }
}
