//! Normal user: browse, flip favorites, then create and publish a playlist

use super::Scenario;
use crate::checks;
use crate::error::ScenarioError;
use crate::validation::Check;
use chrono::{DateTime, Utc};
use listenbench_core::{random, Playlist, PlaylistSong, ScoreTag};
use listenbench_http::actions;
use listenbench_http::responses::{
    AddPlaylistResponse, PlaylistListResponse, PlaylistsResponse, SinglePlaylistResponse,
};
use rand::Rng;
use tokio_util::sync::CancellationToken;

/// Share of fetched details whose favorite flag gets flipped
const FLIP_PERCENT: u32 = 10;

/// Upper bound (exclusive) of songs put into the new playlist
const MAX_SONGS: usize = 80;

pub(super) async fn run(s: &Scenario, token: &CancellationToken) -> Result<(), ScenarioError> {
    let Some(user) = s.normal_users.checkout(token).await else {
        return Err(ScenarioError::Cancelled);
    };
    let agent = s.agent_for(&user)?;

    let res = actions::login(&agent, token, &user.profile).await;
    s.validate("POST /api/login", &res, [Check::status(&[200]), Check::success_base()])?;
    s.credit(ScoreTag::Login);

    if s.state.should_fetch_popular() {
        let res = actions::get_popular_playlists(&agent, token).await;
        s.validate(
            "GET /api/popular_playlists",
            &res,
            [
                Check::status(&[200]),
                Check::cache_control_private(),
                Check::success(|body: PlaylistListResponse| checks::popular_list(&body.playlists, 1)),
            ],
        )?;
        s.credit(ScoreTag::GetPopularPlaylistsLogin);
    }

    let mut owned: Vec<String> = Vec::new();
    let res = actions::get_playlists(&agent, token).await;
    s.validate(
        "GET /api/playlists",
        &res,
        [
            Check::status(&[200]),
            Check::cache_control_private(),
            Check::success(|body: PlaylistsResponse| {
                owned = body.all_ulids();
                Ok(())
            }),
        ],
    )?;
    s.credit(ScoreTag::GetPlaylists);

    let mut flips: Vec<Playlist> = Vec::new();
    for ulid in random::sample(&owned, owned.len() / 4 + 1) {
        let res = actions::get_playlist(&agent, token, &ulid).await;
        s.validate(
            "GET /api/playlist/{}",
            &res,
            [
                Check::status(&[200]),
                Check::cache_control_private(),
                Check::success(|body: SinglePlaylistResponse| {
                    checks::same_ulid(&body.playlist, &ulid)?;
                    if random::chance(FLIP_PERCENT) {
                        flips.push(body.playlist);
                    }
                    Ok(())
                }),
            ],
        )?;
        s.credit(ScoreTag::GetPlaylist);
    }

    for mut playlist in flips {
        playlist.is_favorited = rand::random();
        let res = actions::favorite_playlist(&agent, token, &playlist).await;
        s.validate(
            "POST /api/playlist/{}/favorite",
            &res,
            [
                Check::status(&[200]),
                Check::cache_control_private(),
                Check::success_base(),
            ],
        )?;
        s.credit(ScoreTag::FavoritePlaylist);
    }

    let name = random::display_name();
    let mut new_ulid = String::new();
    let res = actions::add_playlist(&agent, token, &name).await;
    s.validate(
        "POST /api/playlist/add",
        &res,
        [
            Check::status(&[200]),
            Check::cache_control_private(),
            Check::success(|body: AddPlaylistResponse| {
                if body.playlist_ulid.is_empty() {
                    return Err("playlist_ulid is empty".to_string());
                }
                new_ulid = body.playlist_ulid;
                Ok(())
            }),
        ],
    )?;
    s.credit(ScoreTag::AddPlaylist);

    let res = actions::get_playlists(&agent, token).await;
    s.validate(
        "GET /api/playlists",
        &res,
        [
            Check::status(&[200]),
            Check::cache_control_private(),
            Check::success(|body: PlaylistsResponse| {
                if body.created_playlists.is_empty() {
                    return Err("created_playlists is empty after add".to_string());
                }
                match body.find_created(&new_ulid) {
                    Some(p) if p.song_count == 0 => Ok(()),
                    Some(p) => Err(format!("new playlist {} has {} songs", p.ulid, p.song_count)),
                    None => Err(format!("new playlist {} missing from created_playlists", new_ulid)),
                }
            }),
        ],
    )?;
    s.credit(ScoreTag::GetPlaylists);

    let mut playlist = Playlist::with_ulid(new_ulid.clone());
    let res = actions::get_playlist(&agent, token, &new_ulid).await;
    s.validate(
        "GET /api/playlist/{}",
        &res,
        [
            Check::status(&[200]),
            Check::cache_control_private(),
            Check::success(|body: SinglePlaylistResponse| {
                checks::same_ulid(&body.playlist, &new_ulid)?;
                playlist = body.playlist;
                Ok(())
            }),
        ],
    )?;
    s.credit(ScoreTag::GetPlaylist);

    let song_count = rand::thread_rng().gen_range(0..MAX_SONGS);
    playlist.songs = random::sample(&s.songs, song_count)
        .iter()
        .map(PlaylistSong::from)
        .collect();
    playlist.is_public = true;
    let expected = playlist.song_ulids();
    let song_count = expected.len();

    let mut created_at: Option<DateTime<Utc>> = None;
    let res = actions::update_playlist(&agent, token, &playlist).await;
    s.validate(
        "POST /api/playlist/{}/update",
        &res,
        [
            Check::status(&[200]),
            Check::cache_control_private(),
            Check::success(|body: SinglePlaylistResponse| {
                checks::same_ulid(&body.playlist, &new_ulid)?;
                checks::song_order(&body.playlist, &expected)?;
                created_at = Some(body.playlist.created_at);
                Ok(())
            }),
        ],
    )?;
    s.credit(ScoreTag::UpdatePlaylist);
    if let Some(created_at) = created_at {
        s.state.observe_public_created_at(created_at);
    }

    let res = actions::get_playlists(&agent, token).await;
    s.validate(
        "GET /api/playlists",
        &res,
        [
            Check::status(&[200]),
            Check::cache_control_private(),
            Check::success(|body: PlaylistsResponse| match body.find_created(&new_ulid) {
                Some(p) if p.song_count == song_count => Ok(()),
                Some(p) => Err(format!(
                    "playlist {} has song_count {}, expected {}",
                    p.ulid, p.song_count, song_count
                )),
                None => Err(format!("playlist {} missing from created_playlists", new_ulid)),
            }),
        ],
    )?;
    s.credit(ScoreTag::GetPlaylists);

    let res = actions::get_recent_playlists(&agent, token).await;
    s.validate(
        "GET /api/recent_playlists",
        &res,
        [
            Check::status(&[200]),
            Check::cache_control_private(),
            Check::success(|body: PlaylistListResponse| {
                checks::recent_list(&body.playlists)?;
                check_recent_contains(&body.playlists, &new_ulid, song_count, created_at)
            }),
        ],
    )?;
    s.credit(ScoreTag::GetRecentPlaylistsLogin);

    Ok(())
}

/// The freshly published playlist shows up in the recent list with the
/// right song count, unless newer playlists have already pushed it out
fn check_recent_contains(
    recent: &[Playlist],
    ulid: &str,
    song_count: usize,
    created_at: Option<DateTime<Utc>>,
) -> Result<(), String> {
    if let Some(p) = recent.iter().find(|p| p.ulid == ulid) {
        if p.song_count != song_count {
            return Err(format!(
                "recent playlist {} has song_count {}, expected {}",
                ulid, p.song_count, song_count
            ));
        }
        return Ok(());
    }
    match (recent.last(), created_at) {
        (Some(oldest), Some(created_at)) if created_at > oldest.created_at => Err(format!(
            "playlist {} created at {} is missing from recent playlists",
            ulid, created_at
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(ulid: &str, secs: i64, songs: usize) -> Playlist {
        Playlist {
            ulid: ulid.to_string(),
            song_count: songs,
            created_at: Utc.timestamp_opt(secs, 0).unwrap(),
            ..Default::default()
        }
    }

    #[test]
    fn test_recent_contains_checks_song_count() {
        let recent = vec![entry("NEW", 200, 3), entry("OLD", 100, 1)];
        assert!(check_recent_contains(&recent, "NEW", 3, None).is_ok());
        assert!(check_recent_contains(&recent, "NEW", 4, None).is_err());
    }

    #[test]
    fn test_missing_newer_playlist_is_failure() {
        let recent = vec![entry("A", 200, 0), entry("B", 100, 0)];
        let ours = Utc.timestamp_opt(150, 0).unwrap();
        assert!(check_recent_contains(&recent, "NEW", 0, Some(ours)).is_err());
    }

    #[test]
    fn test_missing_older_playlist_is_tolerated() {
        let recent = vec![entry("A", 200, 0), entry("B", 100, 0)];
        let ours = Utc.timestamp_opt(50, 0).unwrap();
        assert!(check_recent_contains(&recent, "NEW", 0, Some(ours)).is_ok());
    }
}
