//! Agent and action tests against a mock target

use listenbench_config::{HttpConfig, TargetConfig};
use listenbench_core::{Playlist, PlaylistSong, UserProfile};
use listenbench_http::responses::{ApiResponse, BaseResponse, SinglePlaylistResponse};
use listenbench_http::{actions, Agent, AgentConfig, AgentError};
use serde_json::json;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn agent_for(server: &MockServer) -> Agent {
    let target = TargetConfig {
        url: server.uri(),
        ..Default::default()
    };
    let config = AgentConfig::new(&target, &HttpConfig::default()).unwrap();
    Agent::new(config).unwrap()
}

#[tokio::test]
async fn test_session_cookie_survives_connection_reset() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .and(body_json(json!({"user_account": "alice", "password": "secret"})))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "session=abc123; Path=/")
                .set_body_json(json!({"result": true, "status": 200})),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/playlists"))
        .and(header("cookie", "session=abc123"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("cache-control", "private")
                .set_body_json(json!({
                    "result": true,
                    "status": 200,
                    "created_playlists": [],
                    "favorited_playlists": []
                })),
        )
        .mount(&server)
        .await;

    let agent = agent_for(&server);
    let token = CancellationToken::new();

    let res = actions::login(&agent, &token, &UserProfile::new("alice", "secret"))
        .await
        .unwrap();
    assert_eq!(res.status_code(), 200);
    let base: BaseResponse = res.json().unwrap();
    assert!(base.base().result);

    agent.close_idle_connections();

    let res = actions::get_playlists(&agent, &token).await.unwrap();
    assert_eq!(res.status_code(), 200);
    assert!(res.is_cache_private());
}

#[tokio::test]
async fn test_update_sends_ordered_song_ulids() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/playlist/P1/update"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "name": "My List",
            "song_ulids": ["A", "B", "C"],
            "is_public": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": true,
            "status": 200,
            "playlist": {
                "ulid": "P1",
                "name": "My List",
                "song_count": 3,
                "is_public": true,
                "songs": [{"ulid": "A"}, {"ulid": "B"}, {"ulid": "C"}]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let agent = agent_for(&server);
    let mut playlist = Playlist::with_ulid("P1");
    playlist.name = "My List".to_string();
    playlist.is_public = true;
    playlist.songs = ["A", "B", "C"]
        .iter()
        .map(|ulid| PlaylistSong {
            ulid: ulid.to_string(),
            ..Default::default()
        })
        .collect();

    let res = actions::update_playlist(&agent, &CancellationToken::new(), &playlist)
        .await
        .unwrap();
    let detail: SinglePlaylistResponse = res.json().unwrap();
    assert_eq!(detail.playlist.song_count, 3);
    assert_eq!(detail.playlist.song_ulids(), vec!["A", "B", "C"]);
}

#[tokio::test]
async fn test_cancelled_request_returns_promptly() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/recent_playlists"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let agent = agent_for(&server);
    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let started = std::time::Instant::now();
    let err = actions::get_recent_playlists(&agent, &token).await.unwrap_err();
    assert!(err.is_cancelled());
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_timeout_is_request_kind() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let target = TargetConfig {
        url: server.uri(),
        ..Default::default()
    };
    let config = AgentConfig::new(&target, &HttpConfig::default())
        .unwrap()
        .with_timeout(Duration::from_millis(100));
    let agent = Agent::new(config).unwrap();

    let err = actions::get_root(&agent, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::Timeout(_)));
    assert_eq!(err.kind(), listenbench_core::ErrorKind::Request);
}

#[tokio::test]
async fn test_delete_and_ban_paths() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/playlist/XYZ/delete"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": true, "status": 200})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/admin/user/ban"))
        .and(body_json(json!({"user_account": "bob", "is_ban": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": true,
            "status": 200,
            "user_account": "bob",
            "display_name": "Bob",
            "is_ban": true,
            "created_at": "2022-08-01T00:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let agent = agent_for(&server);
    let token = CancellationToken::new();
    assert_eq!(
        actions::delete_playlist(&agent, &token, "XYZ").await.unwrap().status_code(),
        200
    );
    let res = actions::admin_ban(&agent, &token, "bob", true).await.unwrap();
    let ban: listenbench_http::responses::AdminBanResponse = res.json().unwrap();
    assert!(ban.is_ban);
    assert_eq!(ban.user_account, "bob");
}
