//! Display formatting for movie listings and detail pages.

use cinedex_api::tmdb::{MovieCredits, MovieDetails, MovieSummary};

/// Number of cast members shown on a detail page.
pub const CAST_LIMIT: usize = 15;

/// Placeholder for missing values.
const NOT_AVAILABLE: &str = "N/A";

/// Formats a runtime in minutes as `155m`.
pub fn runtime(minutes: Option<u32>) -> String {
    minutes
        .filter(|m| *m > 0)
        .map_or_else(|| String::from(NOT_AVAILABLE), |m| format!("{m}m"))
}

/// Formats a vote average as a rounded `8/10`.
#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
pub fn rating(vote_average: f64) -> String {
    format!("{}/10", vote_average.round() as i64)
}

/// Formats a USD amount as `$165 Million`, or `N/A` when unknown.
pub fn millions(amount: u64) -> String {
    if amount == 0 {
        return String::from(NOT_AVAILABLE);
    }
    format!("${} Million", amount.saturating_add(500_000) / 1_000_000)
}

/// Formats a release year, or `N/A` when unknown.
pub fn year(year: Option<&str>) -> String {
    year.filter(|y| !y.is_empty())
        .map_or_else(|| String::from(NOT_AVAILABLE), String::from)
}

/// One-line listing entry: `Dune (2021)  8/10`.
pub fn summary_line(movie: &MovieSummary) -> String {
    format!(
        "{} ({})  {}",
        movie.title,
        year(movie.release_year()),
        rating(movie.vote_average)
    )
}

/// Labeled lines for a movie detail page.
///
/// Production countries, companies, spoken languages, tagline and
/// homepage are omitted when empty.
pub fn detail_fields(details: &MovieDetails) -> Vec<(&'static str, String)> {
    let mut fields = vec![("Title", details.title.clone())];
    if let Some(tagline) = details.tagline.as_deref().filter(|t| !t.is_empty()) {
        fields.push(("Tagline", format!("\"{tagline}\"")));
    }
    fields.push(("Released", year(details.release_year())));
    fields.push(("Runtime", runtime(details.runtime)));
    fields.push(("Rating", rating(details.vote_average)));
    if let Some(genres) = join(details.genres.iter().map(|g| g.name.as_str())) {
        fields.push(("Genres", genres));
    }
    fields.push(("Overview", or_not_available(details.overview.as_deref())));
    fields.push(("Status", or_not_available(details.status.as_deref())));
    fields.push((
        "Original Language",
        or_not_available(Some(details.original_language_name())),
    ));
    fields.push(("Budget", millions(details.budget)));
    fields.push(("Revenue", millions(details.revenue)));
    if let Some(countries) = join(details.production_countries.iter().map(|c| c.name.as_str())) {
        fields.push(("Production Countries", countries));
    }
    if let Some(companies) = join(details.production_companies.iter().map(|c| c.name.as_str())) {
        fields.push(("Production Companies", companies));
    }
    if let Some(languages) = join(
        details
            .spoken_languages
            .iter()
            .map(|l| l.english_name.as_str()),
    ) {
        fields.push(("Spoken Languages", languages));
    }
    if let Some(homepage) = details.homepage() {
        fields.push(("Homepage", String::from(homepage)));
    }
    fields
}

/// `Name as Character` lines for the first [`CAST_LIMIT`] cast members.
pub fn cast_lines(credits: &MovieCredits) -> Vec<String> {
    credits
        .cast
        .iter()
        .take(CAST_LIMIT)
        .map(|member| {
            if member.character.is_empty() {
                member.name.clone()
            } else {
                format!("{} as {}", member.name, member.character)
            }
        })
        .collect()
}

fn or_not_available(value: Option<&str>) -> String {
    value
        .filter(|v| !v.is_empty())
        .map_or_else(|| String::from(NOT_AVAILABLE), String::from)
}

/// Comma-joins non-empty names; `None` when there are none.
fn join<'a>(names: impl Iterator<Item = &'a str>) -> Option<String> {
    let names: Vec<&str> = names.filter(|n| !n.is_empty()).collect();
    if names.is_empty() {
        None
    } else {
        Some(names.join(", "))
    }
}
