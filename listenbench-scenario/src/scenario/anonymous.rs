//! Anonymous visitor: reads the public lists and a sample of details

use super::Scenario;
use crate::checks;
use crate::error::ScenarioError;
use crate::validation::Check;
use listenbench_core::{random, ScoreTag};
use listenbench_http::actions;
use listenbench_http::responses::{PlaylistListResponse, SinglePlaylistResponse};
use tokio_util::sync::CancellationToken;

/// Share of list entries whose detail is fetched
const DETAIL_PERCENT: u32 = 10;

pub(super) async fn run(s: &Scenario, token: &CancellationToken) -> Result<(), ScenarioError> {
    let agent = s.fresh_agent()?;
    let last_public = s.state.last_public_created_at();
    let mut picked: Vec<String> = Vec::new();

    let res = actions::get_recent_playlists(&agent, token).await;
    s.validate(
        "GET /api/recent_playlists",
        &res,
        [
            Check::status(&[200]),
            Check::success(|body: PlaylistListResponse| {
                checks::recent_list(&body.playlists)?;
                if let Some(top) = body.playlists.first() {
                    checks::not_stale(top, last_public)?;
                }
                checks::none_favorited(&body.playlists)?;
                pick(&body, &mut picked);
                Ok(())
            }),
        ],
    )?;
    s.credit(ScoreTag::GetRecentPlaylists);

    if s.state.should_fetch_popular() {
        let res = actions::get_popular_playlists(&agent, token).await;
        s.validate(
            "GET /api/popular_playlists",
            &res,
            [
                Check::status(&[200]),
                Check::success(|body: PlaylistListResponse| {
                    checks::popular_list(&body.playlists, 1)?;
                    checks::favorites_positive(&body.playlists)?;
                    checks::none_favorited(&body.playlists)?;
                    pick(&body, &mut picked);
                    Ok(())
                }),
            ],
        )?;
        s.credit(ScoreTag::GetPopularPlaylists);
    }

    for ulid in &picked {
        let res = actions::get_playlist(&agent, token, ulid).await;
        s.validate(
            "GET /api/playlist/{}",
            &res,
            [
                Check::status(&[200]),
                Check::success(|body: SinglePlaylistResponse| {
                    checks::same_ulid(&body.playlist, ulid)?;
                    if body.playlist.is_favorited {
                        return Err(format!("playlist {} is favorited for an anonymous user", ulid));
                    }
                    Ok(())
                }),
            ],
        )?;
        s.credit(ScoreTag::GetPlaylist);
    }

    Ok(())
}

fn pick(body: &PlaylistListResponse, picked: &mut Vec<String>) {
    for playlist in &body.playlists {
        if !picked.contains(&playlist.ulid) && random::chance(DETAIL_PERCENT) {
            picked.push(playlist.ulid.clone());
        }
    }
}
