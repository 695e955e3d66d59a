//! TMDB image URL construction.

/// Base URL of the TMDB image CDN.
pub const IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";

/// Placeholder used when a poster or backdrop is missing.
pub const POSTER_PLACEHOLDER: &str = "https://placehold.co/600x400/1a1a1a/ffffff.png";

/// Placeholder used when a profile picture is missing.
pub const PROFILE_PLACEHOLDER: &str =
    "https://placehold.co/200x300/1a1a1a/ffffff.png?text=No+Image";

/// Rendition sizes used by cinedex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    /// 200px wide, used for cast profiles.
    W200,
    /// 500px wide, used for posters.
    W500,
    /// Original upload, used for backdrops.
    Original,
}

impl ImageSize {
    /// Path segment for this size.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::W200 => "w200",
            Self::W500 => "w500",
            Self::Original => "original",
        }
    }
}

/// Builds an image URL, or returns `placeholder` when `path` is absent or empty.
#[must_use]
pub fn image_url(path: Option<&str>, size: ImageSize, placeholder: &str) -> String {
    match path.filter(|p| !p.is_empty()) {
        Some(p) => format!("{IMAGE_BASE_URL}/{}{p}", size.as_str()),
        None => String::from(placeholder),
    }
}

/// Poster URL (`w500`).
#[must_use]
pub fn poster_url(path: Option<&str>) -> String {
    image_url(path, ImageSize::W500, POSTER_PLACEHOLDER)
}

/// Backdrop URL (`original`).
#[must_use]
pub fn backdrop_url(path: Option<&str>) -> String {
    image_url(path, ImageSize::Original, POSTER_PLACEHOLDER)
}

/// Cast profile URL (`w200`).
#[must_use]
pub fn profile_url(path: Option<&str>) -> String {
    image_url(path, ImageSize::W200, PROFILE_PLACEHOLDER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poster_url() {
        // Arrange & Act
        let url = poster_url(Some("/d5NXSklXo0qyIYkgV94XAgMIckC.jpg"));

        // Assert
        assert_eq!(
            url,
            "https://image.tmdb.org/t/p/w500/d5NXSklXo0qyIYkgV94XAgMIckC.jpg"
        );
    }

    #[test]
    fn test_backdrop_url_uses_original_size() {
        // Arrange & Act
        let url = backdrop_url(Some("/b.jpg"));

        // Assert
        assert_eq!(url, "https://image.tmdb.org/t/p/original/b.jpg");
    }

    #[test]
    fn test_missing_path_uses_placeholder() {
        // Arrange & Act & Assert
        assert_eq!(poster_url(None), POSTER_PLACEHOLDER);
        assert_eq!(profile_url(Some("")), PROFILE_PLACEHOLDER);
    }
}
