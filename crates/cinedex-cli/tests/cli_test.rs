#![allow(clippy::unwrap_used)]
#![allow(missing_docs)]

use std::path::Path;

use assert_cmd::cargo_bin_cmd;
use predicates::prelude::predicate;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn write_config(dir: &Path, server: &MockServer) {
    let config = format!(
        "[tmdb]\nbase_url = \"{}/3/\"\nmin_interval_ms = 0\n",
        server.uri()
    );
    std::fs::write(dir.join("config.toml"), config).unwrap();
}

fn cinedex(dir: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("cinedex");
    cmd.arg("--dir")
        .arg(dir)
        .env("TMDB_API_TOKEN", "test-token")
        .env_remove("OTEL_EXPORTER_OTLP_ENDPOINT")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_subcommands() {
    // Arrange & Act & Assert
    let mut cmd = cargo_bin_cmd!("cinedex");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("search"))
        .stdout(predicate::str::contains("trending"))
        .stdout(predicate::str::contains("browse"));
}

#[test]
fn test_search_help() {
    // Arrange & Act & Assert
    let mut cmd = cargo_bin_cmd!("cinedex");
    cmd.args(["search", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--no-record"));
}

#[test]
fn test_search_missing_query() {
    // Arrange & Act & Assert
    let mut cmd = cargo_bin_cmd!("cinedex");
    cmd.arg("search")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--query"));
}

#[test]
fn test_popular_rejects_page_zero() {
    // Arrange & Act & Assert
    let mut cmd = cargo_bin_cmd!("cinedex");
    cmd.args(["popular", "--page", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--page"));
}

#[test]
fn test_search_requires_api_token() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();

    // Act & Assert
    let mut cmd = cargo_bin_cmd!("cinedex");
    cmd.arg("--dir")
        .arg(dir.path())
        .env_remove("TMDB_API_TOKEN")
        .args(["search", "--query", "dune"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "TMDB_API_TOKEN environment variable or tmdb.api_token is required",
        ));
}

#[test]
fn test_trending_empty_database() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();

    // Act & Assert
    cinedex(dir.path())
        .arg("trending")
        .assert()
        .success()
        .stdout(predicate::str::contains("No searches recorded yet."));
}

#[test]
fn test_config_init_writes_defaults() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();

    // Act & Assert
    cinedex(dir.path())
        .args(["config", "--init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote default config"));
    let content = std::fs::read_to_string(dir.path().join("config.toml")).unwrap();
    assert!(content.contains("debounce_ms = 500"));
}

#[test]
fn test_completions_bash() {
    // Arrange & Act & Assert
    let mut cmd = cargo_bin_cmd!("cinedex");
    cmd.args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cinedex"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_search_records_trending() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/3/search/movie"))
        .and(query_param("query", "dune"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_string(include_str!(
            "../../../fixtures/tmdb/search_movie_dune.json"
        )))
        .expect(2)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), &server);

    // Act & Assert
    cinedex(dir.path())
        .args(["search", "--query", "dune"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Search results for \"dune\": 2"))
        .stdout(predicate::str::contains("Dune (2021)  8/10"));
    cinedex(dir.path())
        .args(["search", "--query", "dune", "--no-record"])
        .assert()
        .success();
    cinedex(dir.path())
        .arg("trending")
        .assert()
        .success()
        .stdout(predicate::str::contains("1. dune\t1 searches\tDune"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_search_no_results() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/3/search/movie"))
        .respond_with(ResponseTemplate::new(200).set_body_string(include_str!(
            "../../../fixtures/tmdb/search_movie_empty.json"
        )))
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), &server);

    // Act & Assert
    cinedex(dir.path())
        .args(["search", "--query", "zzzz"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No results found for \"zzzz\"."));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_search_api_error_fails() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/3/search/movie"))
        .respond_with(ResponseTemplate::new(401).set_body_string(
            r#"{"status_code":7,"status_message":"Invalid API key: You must be granted a valid key.","success":false}"#,
        ))
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), &server);

    // Act & Assert
    cinedex(dir.path())
        .args(["search", "--query", "dune"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to fetch movies"))
        .stderr(predicate::str::contains("Invalid API key"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_movie_details_and_cast() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/3/movie/438631"))
        .respond_with(ResponseTemplate::new(200).set_body_string(include_str!(
            "../../../fixtures/tmdb/movie_details_438631.json"
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/3/movie/438631/credits"))
        .respond_with(ResponseTemplate::new(200).set_body_string(include_str!(
            "../../../fixtures/tmdb/movie_credits_438631.json"
        )))
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), &server);

    // Act & Assert
    cinedex(dir.path())
        .args(["movie", "--id", "438631"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Runtime: 155m"))
        .stdout(predicate::str::contains("Budget: $165 Million"))
        .stdout(predicate::str::contains("Timothée Chalamet as Paul Atreides"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_popular_lists_discover_results() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/3/discover/movie"))
        .and(query_param("sort_by", "popularity.desc"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(include_str!(
            "../../../fixtures/tmdb/discover_movie.json"
        )))
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), &server);

    // Act & Assert
    cinedex(dir.path())
        .arg("popular")
        .assert()
        .success()
        .stdout(predicate::str::contains("Popular movies (page 1):"))
        .stdout(predicate::str::contains("916224\tSuzume (2022)  8/10"));
}
