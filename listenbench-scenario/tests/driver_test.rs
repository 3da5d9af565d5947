//! End-to-end runs of the benchmark driver against a mocked target

use listenbench_config::BenchConfig;
use listenbench_core::ErrorKind;
use listenbench_scenario::Benchmark;
use serde_json::json;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fixtures() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let users = json!([
        {"account": "normal01", "password": "pw", "display_name": "N", "is_ban": false, "is_heavy": false},
        {"account": "heavy01", "password": "pw", "display_name": "H", "is_ban": false, "is_heavy": true},
        {"account": "banned01", "password": "pw", "display_name": "B", "is_ban": true, "is_heavy": false},
    ]);
    let songs = json!([
        {"ulid": "S1", "title": "One", "artist_name": "A", "artist_id": 1},
        {"ulid": "S2", "title": "Two", "artist_name": "B", "artist_id": 2},
    ]);
    std::fs::write(dir.path().join("users.json"), users.to_string()).unwrap();
    std::fs::write(dir.path().join("songs.json"), songs.to_string()).unwrap();
    dir
}

fn config(server: &MockServer, data: &TempDir) -> BenchConfig {
    let mut config = BenchConfig::default();
    config.target.url = server.uri();
    config.data.dir = data.path().to_path_buf();
    config.run.prepare_timeout = Duration::from_secs(10);
    config
}

#[tokio::test]
async fn test_failed_initialize_fails_prepare() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/initialize"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let data = fixtures();

    let bench = Benchmark::new(config(&server, &data));
    let report = bench.run(CancellationToken::new()).await;

    assert!(!report.prepare_passed);
    assert_eq!(report.score, 0);
    assert_eq!(report.errors.by_kind.get(&ErrorKind::Request), Some(&1));
}

#[tokio::test]
async fn test_missing_fixtures_fail_prepare() {
    let server = MockServer::start().await;
    let data = tempfile::tempdir().unwrap();

    let bench = Benchmark::new(config(&server, &data));
    let report = bench.run(CancellationToken::new()).await;

    assert!(!report.prepare_passed);
    assert_eq!(report.errors.by_kind.get(&ErrorKind::LoadJson), Some(&1));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_prepare_only_skips_load() {
    let server = MockServer::start().await;
    let data = fixtures();
    let mut config = config(&server, &data);
    config.run.skip_prepare = true;
    config.run.prepare_only = true;

    let report = Benchmark::new(config).run(CancellationToken::new()).await;

    assert!(report.prepare_passed);
    assert!(!report.aborted);
    assert_eq!(report.score, 0);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_error_budget_aborts_load() {
    // every endpoint answers 404
    let server = MockServer::start().await;
    let data = fixtures();
    let mut config = config(&server, &data);
    config.run.skip_prepare = true;
    config.run.max_errors = 1;
    config.run.load_duration = Duration::from_secs(30);

    let started = Instant::now();
    let bench = Benchmark::new(config);
    let report = bench.run(CancellationToken::new()).await;

    assert!(report.prepare_passed);
    assert!(report.aborted);
    assert!(started.elapsed() < Duration::from_secs(15));
    assert!(report.errors.total >= 1);
    assert!(bench.score().is_closed());
}

#[tokio::test]
async fn test_load_stops_after_duration() {
    let server = MockServer::start().await;
    let data = fixtures();
    let mut config = config(&server, &data);
    config.run.skip_prepare = true;
    config.run.max_errors = 1_000_000;
    config.run.load_duration = Duration::from_secs(1);

    let report = Benchmark::new(config).run(CancellationToken::new()).await;

    assert!(report.prepare_passed);
    assert!(!report.aborted);
    assert!(report.errors.total > 0);
}
