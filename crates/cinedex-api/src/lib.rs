//! API client library for cinedex.
//!
//! Provides the client for the TMDB movie metadata API.

/// TMDB API client.
pub mod tmdb;
