//! One function per target endpoint.
//!
//! Each action prepares its request on the given agent, encodes any body
//! through the pooled codec, and executes it under the caller's token.
//! Validation is left to the caller.

use crate::agent::{Agent, AgentResponse};
use crate::body::RequestBody;
use crate::errors::AgentError;
use listenbench_core::{random, Playlist, UserProfile};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

#[derive(Serialize)]
struct Empty {}

#[derive(Serialize)]
struct SignupRequest<'a> {
    user_account: &'a str,
    password: &'a str,
    display_name: &'a str,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    user_account: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct AddPlaylistRequest<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct UpdatePlaylistRequest<'a> {
    name: &'a str,
    song_ulids: Vec<String>,
    is_public: bool,
}

#[derive(Serialize)]
struct FavoritePlaylistRequest {
    is_favorited: bool,
}

#[derive(Serialize)]
struct AdminBanRequest<'a> {
    user_account: &'a str,
    is_ban: bool,
}

async fn post_json<T: Serialize>(
    agent: &Agent,
    token: &CancellationToken,
    path: &str,
    payload: &T,
) -> Result<AgentResponse, AgentError> {
    let body = RequestBody::encode(payload)?;
    let request = agent.post(path, Some(&body))?;
    agent.execute(token, request).await
}

async fn get(
    agent: &Agent,
    token: &CancellationToken,
    path: &str,
) -> Result<AgentResponse, AgentError> {
    let request = agent.get(path)?;
    agent.execute(token, request).await
}

/// Fresh credentials for a signup call
pub fn new_signup_profile() -> UserProfile {
    UserProfile::new(random::generate_user_account(), random::random_string(32))
        .with_display_name(random::display_name())
}

pub async fn initialize(agent: &Agent, token: &CancellationToken) -> Result<AgentResponse, AgentError> {
    post_json(agent, token, "/initialize", &Empty {}).await
}

pub async fn get_root(agent: &Agent, token: &CancellationToken) -> Result<AgentResponse, AgentError> {
    get(agent, token, "/").await
}

pub async fn signup(
    agent: &Agent,
    token: &CancellationToken,
    user: &UserProfile,
) -> Result<AgentResponse, AgentError> {
    let payload = SignupRequest {
        user_account: &user.account,
        password: &user.password,
        display_name: &user.display_name,
    };
    post_json(agent, token, "/api/signup", &payload).await
}

pub async fn login(
    agent: &Agent,
    token: &CancellationToken,
    user: &UserProfile,
) -> Result<AgentResponse, AgentError> {
    let payload = LoginRequest {
        user_account: &user.account,
        password: &user.password,
    };
    post_json(agent, token, "/api/login", &payload).await
}

pub async fn logout(agent: &Agent, token: &CancellationToken) -> Result<AgentResponse, AgentError> {
    post_json(agent, token, "/api/logout", &Empty {}).await
}

pub async fn get_playlists(agent: &Agent, token: &CancellationToken) -> Result<AgentResponse, AgentError> {
    get(agent, token, "/api/playlists").await
}

pub async fn get_recent_playlists(
    agent: &Agent,
    token: &CancellationToken,
) -> Result<AgentResponse, AgentError> {
    get(agent, token, "/api/recent_playlists").await
}

pub async fn get_popular_playlists(
    agent: &Agent,
    token: &CancellationToken,
) -> Result<AgentResponse, AgentError> {
    get(agent, token, "/api/popular_playlists").await
}

pub async fn get_playlist(
    agent: &Agent,
    token: &CancellationToken,
    ulid: &str,
) -> Result<AgentResponse, AgentError> {
    get(agent, token, &format!("/api/playlist/{}", ulid)).await
}

pub async fn add_playlist(
    agent: &Agent,
    token: &CancellationToken,
    name: &str,
) -> Result<AgentResponse, AgentError> {
    post_json(agent, token, "/api/playlist/add", &AddPlaylistRequest { name }).await
}

/// Sends the playlist's name, ordered song ULIDs and visibility
pub async fn update_playlist(
    agent: &Agent,
    token: &CancellationToken,
    playlist: &Playlist,
) -> Result<AgentResponse, AgentError> {
    let payload = UpdatePlaylistRequest {
        name: &playlist.name,
        song_ulids: playlist.song_ulids(),
        is_public: playlist.is_public,
    };
    let path = format!("/api/playlist/{}/update", playlist.ulid);
    post_json(agent, token, &path, &payload).await
}

/// Sets the session's favorite flag to `playlist.is_favorited`
pub async fn favorite_playlist(
    agent: &Agent,
    token: &CancellationToken,
    playlist: &Playlist,
) -> Result<AgentResponse, AgentError> {
    let payload = FavoritePlaylistRequest {
        is_favorited: playlist.is_favorited,
    };
    let path = format!("/api/playlist/{}/favorite", playlist.ulid);
    post_json(agent, token, &path, &payload).await
}

pub async fn delete_playlist(
    agent: &Agent,
    token: &CancellationToken,
    ulid: &str,
) -> Result<AgentResponse, AgentError> {
    let request = agent.post(&format!("/api/playlist/{}/delete", ulid), None)?;
    agent.execute(token, request).await
}

pub async fn admin_ban(
    agent: &Agent,
    token: &CancellationToken,
    user_account: &str,
    is_ban: bool,
) -> Result<AgentResponse, AgentError> {
    let payload = AdminBanRequest {
        user_account,
        is_ban,
    };
    post_json(agent, token, "/api/admin/user/ban", &payload).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_profile_shape() {
        let profile = new_signup_profile();
        assert!(profile.account.starts_with("user-"));
        assert_eq!(profile.password.len(), 32);
        assert!(!profile.display_name.is_empty());
        assert!(!profile.is_ban);
    }

    #[test]
    fn test_update_payload_keeps_song_order() {
        let mut playlist = Playlist::with_ulid("P");
        playlist.name = "My List".to_string();
        playlist.is_public = true;
        for ulid in ["A", "B", "C"] {
            playlist.songs.push(listenbench_core::PlaylistSong {
                ulid: ulid.to_string(),
                ..Default::default()
            });
        }
        let payload = UpdatePlaylistRequest {
            name: &playlist.name,
            song_ulids: playlist.song_ulids(),
            is_public: playlist.is_public,
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(json, r#"{"name":"My List","song_ulids":["A","B","C"],"is_public":true}"#);
    }
}
