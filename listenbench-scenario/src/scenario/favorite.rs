//! Heavy user favoriting playlists from the public lists

use super::Scenario;
use crate::checks;
use crate::error::ScenarioError;
use crate::validation::Check;
use listenbench_core::{random, Playlist, ScoreTag};
use listenbench_http::actions;
use listenbench_http::responses::PlaylistListResponse;
use tokio_util::sync::CancellationToken;

/// Share of not-yet-favorited entries that get favorited
const FAVORITE_PERCENT: u32 = 25;

pub(super) async fn run(s: &Scenario, token: &CancellationToken) -> Result<(), ScenarioError> {
    let Some(user) = s.heavy_users.checkout(token).await else {
        return Err(ScenarioError::Cancelled);
    };
    let agent = s.agent_for(&user)?;

    let res = actions::login(&agent, token, &user.profile).await;
    s.validate("POST /api/login", &res, [Check::status(&[200]), Check::success_base()])?;
    s.credit(ScoreTag::Login);

    let mut picked: Vec<Playlist> = Vec::new();

    let res = actions::get_recent_playlists(&agent, token).await;
    s.validate(
        "GET /api/recent_playlists",
        &res,
        [
            Check::status(&[200]),
            Check::success(|body: PlaylistListResponse| {
                checks::recent_list(&body.playlists)?;
                pick(body, &mut picked);
                Ok(())
            }),
        ],
    )?;
    s.credit(ScoreTag::GetRecentPlaylistsLogin);

    if s.state.should_fetch_popular() {
        let res = actions::get_popular_playlists(&agent, token).await;
        s.validate(
            "GET /api/popular_playlists",
            &res,
            [
                Check::status(&[200]),
                Check::success(|body: PlaylistListResponse| {
                    checks::popular_list(&body.playlists, 1)?;
                    pick(body, &mut picked);
                    Ok(())
                }),
            ],
        )?;
        s.credit(ScoreTag::GetPopularPlaylistsLogin);
    }

    for mut playlist in picked {
        playlist.is_favorited = true;
        let res = actions::favorite_playlist(&agent, token, &playlist).await;
        // 404: the owner was banned after the list was served
        s.validate("POST /api/playlist/{}/favorite", &res, [Check::status(&[200, 404])])?;
        s.credit(ScoreTag::FavoritePlaylist);
    }

    Ok(())
}

fn pick(body: PlaylistListResponse, picked: &mut Vec<Playlist>) {
    for playlist in body.playlists {
        if playlist.is_favorited || picked.iter().any(|p| p.ulid == playlist.ulid) {
            continue;
        }
        if random::chance(FAVORITE_PERCENT) {
            picked.push(playlist);
        }
    }
}
