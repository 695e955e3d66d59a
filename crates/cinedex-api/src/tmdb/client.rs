//! `TmdbClient` - TMDB API client implementation.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::Client;
use tokio::sync::Mutex;
use tracing::instrument;
use url::Url;

use super::api::TmdbApi;
use super::rate_limiter::TmdbRateLimiter;
use super::types::{
    DiscoverMovieParams, MovieCredits, MovieDetails, SearchMovieParams, TmdbErrorResponse,
    TmdbMovieListResponse,
};

/// Default base URL for TMDB API v3.
const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3/";

/// TMDB API client.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct TmdbClient {
    /// HTTP client.
    http_client: Client,
    /// Base URL for API requests.
    base_url: Url,
    /// Bearer API token.
    api_token: String,
    /// Rate limiter.
    rate_limiter: Arc<Mutex<TmdbRateLimiter>>,
}

/// Builder for `TmdbClient`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct TmdbClientBuilder {
    base_url: Option<Url>,
    api_token: Option<String>,
    user_agent: Option<String>,
    min_interval: Option<Duration>,
}

impl TmdbClientBuilder {
    /// Creates a new builder.
    const fn new() -> Self {
        Self {
            base_url: None,
            api_token: None,
            user_agent: None,
            min_interval: None,
        }
    }

    /// Overrides the base URL (for wiremock in tests).
    #[must_use]
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Sets the API bearer token (required).
    #[must_use]
    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Sets the User-Agent (required).
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Sets the minimum request interval (default: 25ms).
    #[must_use]
    pub const fn min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = Some(interval);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// - `api_token` is not set or empty.
    /// - `user_agent` is not set.
    /// - `reqwest::Client` build fails.
    pub fn build(self) -> Result<TmdbClient> {
        let api_token = self.api_token.context("api_token is required")?;
        if api_token.trim().is_empty() {
            bail!("api_token must not be empty");
        }
        let user_agent = self.user_agent.context("user_agent is required")?;

        let base_url = if let Some(url) = self.base_url {
            url
        } else {
            Url::parse(DEFAULT_BASE_URL).context("invalid default base URL")?
        };

        let rate_limiter = self
            .min_interval
            .map_or_else(TmdbRateLimiter::default_interval, TmdbRateLimiter::new);

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .gzip(true)
            .build()
            .context("failed to build HTTP client")?;

        Ok(TmdbClient {
            http_client,
            base_url,
            api_token,
            rate_limiter: Arc::new(Mutex::new(rate_limiter)),
        })
    }
}

impl TmdbClient {
    /// Creates a new builder.
    #[must_use]
    pub const fn builder() -> TmdbClientBuilder {
        TmdbClientBuilder::new()
    }

    /// Sends a GET request with Bearer auth, query params, and rate limiting.
    ///
    /// Any non-2xx status is an error. No request is retried.
    #[instrument(skip_all, fields(path = path))]
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        self.rate_limiter.lock().await.wait().await;

        let url = self
            .base_url
            .join(path)
            .with_context(|| format!("failed to join URL path: {path}"))?;

        let request = self
            .http_client
            .get(url)
            .bearer_auth(&self.api_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(query)
            .build()
            .with_context(|| format!("failed to build request: {path}"))?;

        tracing::debug!(url = %request.url(), "TMDB API request");

        let response = self
            .http_client
            .execute(request)
            .await
            .with_context(|| format!("request failed: {path}"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<failed to read body>"));
            if let Ok(error_response) = serde_json::from_str::<TmdbErrorResponse>(&body) {
                bail!(
                    "TMDB API error (HTTP {}): code={}, message={}",
                    status,
                    error_response.status_code,
                    error_response.status_message,
                );
            }
            bail!("TMDB API error (HTTP {status}): {body}");
        }

        let body = response
            .text()
            .await
            .with_context(|| format!("failed to read response body: {path}"))?;
        serde_json::from_str(&body)
            .with_context(|| format!("failed to decode JSON response: {path}"))
    }
}

impl TmdbApi for TmdbClient {
    #[instrument(skip_all)]
    async fn search_movie(&self, params: &SearchMovieParams) -> Result<TmdbMovieListResponse> {
        let mut query: Vec<(&str, String)> = vec![
            ("query", params.query.clone()),
            ("language", params.language.clone()),
            ("page", params.page.to_string()),
            ("include_adult", params.include_adult.to_string()),
        ];
        if let Some(year) = params.primary_release_year {
            query.push(("primary_release_year", year.to_string()));
        }
        if let Some(year) = params.year {
            query.push(("year", year.to_string()));
        }
        if let Some(ref region) = params.region {
            query.push(("region", region.clone()));
        }

        self.get_json("search/movie", &query).await
    }

    #[instrument(skip_all)]
    async fn discover_movies(
        &self,
        params: &DiscoverMovieParams,
    ) -> Result<TmdbMovieListResponse> {
        let query: Vec<(&str, String)> = vec![
            ("sort_by", params.sort_by.clone()),
            ("language", params.language.clone()),
            ("page", params.page.to_string()),
            ("include_adult", params.include_adult.to_string()),
        ];

        self.get_json("discover/movie", &query).await
    }

    #[instrument(skip_all)]
    async fn movie_details(&self, movie_id: u64, language: &str) -> Result<MovieDetails> {
        let path = format!("movie/{movie_id}");
        let query = [("language", String::from(language))];
        self.get_json(&path, &query).await
    }

    #[instrument(skip_all)]
    async fn movie_credits(&self, movie_id: u64, language: &str) -> Result<MovieCredits> {
        let path = format!("movie/{movie_id}/credits");
        let query = [("language", String::from(language))];
        self.get_json(&path, &query).await
    }
}
