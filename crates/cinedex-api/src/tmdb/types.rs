//! TMDB API response types and request parameters.

use serde::{Deserialize, Serialize};

// --- Movie lists (search/movie, discover/movie) ---

/// Paged response from `search/movie` and `discover/movie`.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovieListResponse {
    /// Current page number.
    pub page: u32,
    /// Movies on this page.
    pub results: Vec<MovieSummary>,
    /// Total number of pages.
    pub total_pages: u32,
    /// Total number of results.
    pub total_results: u32,
}

/// A single movie as it appears in search and discover listings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct MovieSummary {
    /// TMDB movie ID.
    pub id: u64,
    /// Localized title.
    pub title: String,
    /// Original title.
    #[serde(default)]
    pub original_title: String,
    /// Original language (ISO 639-1).
    #[serde(default)]
    pub original_language: String,
    /// Release date (YYYY-MM-DD, empty or null when unknown).
    pub release_date: Option<String>,
    /// Overview text.
    pub overview: Option<String>,
    /// Popularity score.
    #[serde(default)]
    pub popularity: f64,
    /// Vote average (0-10).
    #[serde(default)]
    pub vote_average: f64,
    /// Vote count.
    #[serde(default)]
    pub vote_count: u32,
    /// Genre IDs.
    #[serde(default)]
    pub genre_ids: Vec<u32>,
    /// Adult flag.
    #[serde(default)]
    pub adult: bool,
    /// Video flag.
    #[serde(default)]
    pub video: bool,
    /// Poster image path.
    pub poster_path: Option<String>,
    /// Backdrop image path.
    pub backdrop_path: Option<String>,
}

impl MovieSummary {
    /// Returns the release year (the part before the first `-`).
    #[must_use]
    pub fn release_year(&self) -> Option<&str> {
        release_year(self.release_date.as_deref())
    }
}

// --- Movie details ---

/// Response from `movie/{movie_id}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MovieDetails {
    /// TMDB movie ID.
    pub id: u64,
    /// Localized title.
    pub title: String,
    /// Original title.
    #[serde(default)]
    pub original_title: String,
    /// Original language (ISO 639-1).
    #[serde(default)]
    pub original_language: String,
    /// Tagline.
    pub tagline: Option<String>,
    /// Overview text.
    pub overview: Option<String>,
    /// Release date.
    pub release_date: Option<String>,
    /// Runtime in minutes.
    pub runtime: Option<u32>,
    /// Status (e.g., "Released").
    pub status: Option<String>,
    /// Budget in USD (0 when unknown).
    #[serde(default)]
    pub budget: u64,
    /// Revenue in USD (0 when unknown).
    #[serde(default)]
    pub revenue: u64,
    /// Official homepage.
    pub homepage: Option<String>,
    /// Vote average (0-10).
    #[serde(default)]
    pub vote_average: f64,
    /// Vote count.
    #[serde(default)]
    pub vote_count: u32,
    /// Genres.
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
    /// Spoken languages.
    #[serde(default)]
    pub spoken_languages: Vec<SpokenLanguage>,
    /// Production countries.
    #[serde(default)]
    pub production_countries: Vec<ProductionCountry>,
    /// Production companies.
    #[serde(default)]
    pub production_companies: Vec<ProductionCompany>,
    /// Poster image path.
    pub poster_path: Option<String>,
    /// Backdrop image path.
    pub backdrop_path: Option<String>,
}

impl MovieDetails {
    /// Returns the release year (the part before the first `-`).
    #[must_use]
    pub fn release_year(&self) -> Option<&str> {
        release_year(self.release_date.as_deref())
    }

    /// Returns the English name of the original language, falling back
    /// to the ISO 639-1 code when no spoken language matches.
    #[must_use]
    pub fn original_language_name(&self) -> &str {
        self.spoken_languages
            .iter()
            .find(|lang| lang.iso_639_1 == self.original_language)
            .map(|lang| lang.english_name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.original_language)
    }

    /// Returns the homepage when it is set and non-empty.
    #[must_use]
    pub fn homepage(&self) -> Option<&str> {
        self.homepage.as_deref().filter(|url| !url.is_empty())
    }
}

/// Genre entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TmdbGenre {
    /// Genre ID.
    pub id: u32,
    /// Genre name.
    pub name: String,
}

/// Spoken language entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SpokenLanguage {
    /// ISO 639-1 code.
    pub iso_639_1: String,
    /// English name.
    #[serde(default)]
    pub english_name: String,
    /// Native name.
    #[serde(default)]
    pub name: String,
}

/// Production country entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProductionCountry {
    /// ISO 3166-1 code.
    pub iso_3166_1: String,
    /// Country name.
    pub name: String,
}

/// Production company entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProductionCompany {
    /// TMDB company ID.
    pub id: u64,
    /// Company name.
    pub name: String,
    /// Logo image path.
    pub logo_path: Option<String>,
    /// Origin country (ISO 3166-1).
    #[serde(default)]
    pub origin_country: String,
}

// --- Movie credits ---

/// Response from `movie/{movie_id}/credits`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MovieCredits {
    /// TMDB movie ID.
    pub id: u64,
    /// Cast members in billing order.
    #[serde(default)]
    pub cast: Vec<CastMember>,
    /// Crew members.
    #[serde(default)]
    pub crew: Vec<CrewMember>,
}

/// A single cast member.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CastMember {
    /// TMDB person ID.
    pub id: u64,
    /// Person name.
    pub name: String,
    /// Character played.
    #[serde(default)]
    pub character: String,
    /// Profile image path.
    pub profile_path: Option<String>,
    /// Billing order.
    #[serde(default)]
    pub order: u32,
}

/// A single crew member.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CrewMember {
    /// TMDB person ID.
    pub id: u64,
    /// Person name.
    pub name: String,
    /// Job title (e.g., "Director").
    #[serde(default)]
    pub job: String,
    /// Department (e.g., "Directing").
    #[serde(default)]
    pub department: String,
    /// Profile image path.
    pub profile_path: Option<String>,
}

// --- Error Response ---

/// TMDB API error response body.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbErrorResponse {
    /// TMDB error code.
    pub status_code: u32,
    /// Error message.
    pub status_message: String,
    /// Success flag (always false for errors).
    #[allow(dead_code)]
    #[serde(default)]
    pub success: bool,
}

// --- Request Parameters ---

/// Parameters for `search/movie`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMovieParams {
    /// Search query (required).
    pub query: String,
    /// Response language (default: "en-US").
    pub language: String,
    /// Result page (1-500, default: 1).
    pub page: u32,
    /// Filter by primary release year.
    pub primary_release_year: Option<u32>,
    /// Filter by year.
    pub year: Option<u32>,
    /// Region filter (ISO 3166-1).
    pub region: Option<String>,
    /// Include adult content.
    pub include_adult: bool,
}

impl SearchMovieParams {
    /// Creates new search params with the given query.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            language: String::from(DEFAULT_LANGUAGE),
            page: 1,
            primary_release_year: None,
            year: None,
            region: None,
            include_adult: false,
        }
    }

    /// Sets the response language.
    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Sets the year filter.
    #[must_use]
    pub const fn year(mut self, year: u32) -> Self {
        self.year = Some(year);
        self
    }

    /// Sets the primary release year filter.
    #[must_use]
    pub const fn primary_release_year(mut self, year: u32) -> Self {
        self.primary_release_year = Some(year);
        self
    }

    /// Sets the region filter.
    #[must_use]
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }
}

/// Parameters for `discover/movie`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoverMovieParams {
    /// Sort order (default: "popularity.desc").
    pub sort_by: String,
    /// Response language (default: "en-US").
    pub language: String,
    /// Result page (1-500, default: 1).
    pub page: u32,
    /// Include adult content.
    pub include_adult: bool,
}

impl Default for DiscoverMovieParams {
    fn default() -> Self {
        Self {
            sort_by: String::from("popularity.desc"),
            language: String::from(DEFAULT_LANGUAGE),
            page: 1,
            include_adult: false,
        }
    }
}

impl DiscoverMovieParams {
    /// Sets the response language.
    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Sets the result page.
    #[must_use]
    pub const fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }
}

/// Default response language.
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// Extracts the year part of a `YYYY-MM-DD` date. Empty dates yield `None`.
fn release_year(date: Option<&str>) -> Option<&str> {
    date.and_then(|d| d.split('-').next())
        .filter(|year| !year.is_empty())
}
