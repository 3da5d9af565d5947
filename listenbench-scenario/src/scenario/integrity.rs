//! Integrity check run once during Prepare.
//!
//! Walks one fresh user through the whole playlist lifecycle, then bans and
//! unbans a second fresh user through the admin account. The first failure
//! ends the walk.

use super::{sleep, Scenario};
use crate::checks::{self, ensure};
use crate::error::ScenarioError;
use crate::validation::Check;
use listenbench_core::{random, Playlist, PlaylistSong, UserProfile};
use listenbench_http::actions;
use listenbench_http::responses::{
    AddPlaylistResponse, AdminBanResponse, PlaylistListResponse, PlaylistsResponse,
    SinglePlaylistResponse,
};
use listenbench_http::Agent;
use rand::Rng;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Minimum popular list length right after initialize
const MIN_POPULAR: usize = 50;

const LOGOUT_SETTLE: Duration = Duration::from_secs(1);
const SIGNUP_SETTLE: Duration = Duration::from_millis(100);

/// Upper bounds (exclusive) of the songs put into the checked playlists
const OWN_MAX_SONGS: usize = 4;
const VICTIM_MAX_SONGS: usize = 40;

pub(super) async fn run(s: &Scenario, token: &CancellationToken) -> Result<(), ScenarioError> {
    let agent = s.fresh_agent()?;

    let res = actions::get_root(&agent, token).await;
    s.validate("GET /", &res, [Check::status(&[200, 304])])?;

    let me = actions::new_signup_profile();
    signup_and_login(s, &agent, token, &me).await?;

    let top = popular_top(s, &agent, token).await?;
    favorite_top(s, &agent, token, &top).await?;
    popular_after_favorite(s, &agent, token, &top).await?;
    expect_playlists(s, &agent, token, &[], &[top.ulid.as_str()], &[top.ulid.as_str()]).await?;

    let own = lifecycle(s, &agent, token, &me, &top).await?;
    let other = pick_other(s, &agent, token, &me, &own).await?;

    let mut favorite = Playlist::with_ulid(other.clone());
    favorite.is_favorited = true;
    let res = actions::favorite_playlist(&agent, token, &favorite).await;
    s.validate(
        "POST /api/playlist/{}/favorite (other)",
        &res,
        [
            Check::status(&[200]),
            Check::success(|body: SinglePlaylistResponse| {
                checks::same_ulid(&body.playlist, &other)?;
                ensure(body.playlist.is_favorited, || format!("playlist {} is not favorited", other))?;
                ensure(body.playlist.favorite_count > 0, || {
                    format!("playlist {} has no favorites", other)
                })
            }),
        ],
    )?;

    logout(s, &agent, token, &other).await?;
    ban_cycle(s, &agent, token).await
}

async fn signup_and_login(
    s: &Scenario,
    agent: &Agent,
    token: &CancellationToken,
    user: &UserProfile,
) -> Result<(), ScenarioError> {
    let res = actions::signup(agent, token, user).await;
    s.validate("POST /api/signup", &res, [Check::status(&[200]), Check::success_base()])?;

    let res = actions::login(agent, token, user).await;
    s.validate("POST /api/login", &res, [Check::status(&[200]), Check::success_base()])
}

async fn popular_top(s: &Scenario, agent: &Agent, token: &CancellationToken) -> Result<Playlist, ScenarioError> {
    let mut top = Playlist::default();
    let res = actions::get_popular_playlists(agent, token).await;
    s.validate(
        "GET /api/popular_playlists",
        &res,
        [
            Check::status(&[200]),
            Check::cache_control_private(),
            Check::success(|body: PlaylistListResponse| {
                checks::popular_list(&body.playlists, MIN_POPULAR)?;
                if let Some(first) = body.playlists.into_iter().next() {
                    top = first;
                }
                Ok(())
            }),
        ],
    )?;
    Ok(top)
}

async fn favorite_top(
    s: &Scenario,
    agent: &Agent,
    token: &CancellationToken,
    top: &Playlist,
) -> Result<(), ScenarioError> {
    let mut favorite = top.clone();
    favorite.is_favorited = true;
    let res = actions::favorite_playlist(agent, token, &favorite).await;
    s.validate(
        "POST /api/playlist/{}/favorite (popular)",
        &res,
        [
            Check::status(&[200]),
            Check::cache_control_private(),
            Check::success(|body: SinglePlaylistResponse| {
                checks::same_ulid(&body.playlist, &top.ulid)?;
                ensure(body.playlist.is_favorited, || {
                    format!("playlist {} is not favorited", top.ulid)
                })?;
                ensure(body.playlist.favorite_count > 0, || {
                    format!("playlist {} has no favorites", top.ulid)
                })
            }),
        ],
    )
}

async fn popular_after_favorite(
    s: &Scenario,
    agent: &Agent,
    token: &CancellationToken,
    top: &Playlist,
) -> Result<(), ScenarioError> {
    let res = actions::get_popular_playlists(agent, token).await;
    s.validate(
        "GET /api/popular_playlists (after favorite)",
        &res,
        [
            Check::status(&[200]),
            Check::cache_control_private(),
            Check::success(|body: PlaylistListResponse| {
                checks::popular_list(&body.playlists, MIN_POPULAR)?;
                checks::favorites_positive(&body.playlists)?;
                check_favorite_counted(&body.playlists, top)
            }),
        ],
    )
}

/// `before` is the popular entry as it was prior to this user's favorite:
/// it must still be listed, flagged, and counted at least once more
fn check_favorite_counted(popular: &[Playlist], before: &Playlist) -> Result<(), String> {
    let Some(p) = popular.iter().find(|p| p.ulid == before.ulid) else {
        return Err(format!("favorited playlist {} left the popular list", before.ulid));
    };
    ensure(p.is_favorited, || format!("popular playlist {} is not favorited", p.ulid))?;
    ensure(p.favorite_count > before.favorite_count, || {
        format!(
            "popular playlist {} has {} favorites, expected at least {}",
            p.ulid,
            p.favorite_count,
            before.favorite_count + 1
        )
    })
}

/// `created` must match exactly. Favorited entries may only come from
/// `favorited_allowed` and must include `favorited_required`; fewer entries
/// than allowed are tolerated.
async fn expect_playlists(
    s: &Scenario,
    agent: &Agent,
    token: &CancellationToken,
    created: &[&str],
    favorited_allowed: &[&str],
    favorited_required: &[&str],
) -> Result<(), ScenarioError> {
    let res = actions::get_playlists(agent, token).await;
    s.validate(
        "GET /api/playlists",
        &res,
        [
            Check::status(&[200]),
            Check::cache_control_private(),
            Check::success(|body: PlaylistsResponse| {
                let actual: Vec<&str> = body.created_playlists.iter().map(|p| p.ulid.as_str()).collect();
                ensure(actual == created, || {
                    format!("created_playlists {:?}, expected {:?}", actual, created)
                })?;
                for p in &body.favorited_playlists {
                    ensure(favorited_allowed.contains(&p.ulid.as_str()), || {
                        format!("unexpected favorited playlist {}", p.ulid)
                    })?;
                }
                for ulid in favorited_required {
                    ensure(body.find_favorited(ulid).is_some(), || {
                        format!("favorited playlist {} missing", ulid)
                    })?;
                }
                Ok(())
            }),
        ],
    )
}

async fn detail(
    s: &Scenario,
    agent: &Agent,
    token: &CancellationToken,
    label: &str,
    ulid: &str,
    predicate: impl FnOnce(&Playlist) -> Result<(), String> + Send,
) -> Result<(), ScenarioError> {
    let res = actions::get_playlist(agent, token, ulid).await;
    s.validate(
        label,
        &res,
        [
            Check::status(&[200]),
            Check::cache_control_private(),
            Check::success(|body: SinglePlaylistResponse| {
                checks::same_ulid(&body.playlist, ulid)?;
                predicate(&body.playlist)
            }),
        ],
    )
}

async fn set_favorite(
    s: &Scenario,
    agent: &Agent,
    token: &CancellationToken,
    ulid: &str,
    is_favorited: bool,
) -> Result<(), ScenarioError> {
    let mut payload = Playlist::with_ulid(ulid);
    payload.is_favorited = is_favorited;
    let res = actions::favorite_playlist(agent, token, &payload).await;
    s.validate(
        "POST /api/playlist/{}/favorite (own)",
        &res,
        [
            Check::status(&[200]),
            Check::cache_control_private(),
            Check::success(|body: SinglePlaylistResponse| {
                checks::same_ulid(&body.playlist, ulid)?;
                ensure(body.playlist.is_favorited == is_favorited, || {
                    format!("is_favorited {}, expected {}", body.playlist.is_favorited, is_favorited)
                })?;
                ensure(!is_favorited || body.playlist.favorite_count > 0, || {
                    format!("playlist {} has no favorites", ulid)
                })
            }),
        ],
    )
}

/// Create, publish, favorite, unfavorite and delete one playlist.
/// Returns its ULID.
async fn lifecycle(
    s: &Scenario,
    agent: &Agent,
    token: &CancellationToken,
    me: &UserProfile,
    top: &Playlist,
) -> Result<String, ScenarioError> {
    let name = random::display_name();
    let mut own = String::new();
    let res = actions::add_playlist(agent, token, &name).await;
    s.validate(
        "POST /api/playlist/add",
        &res,
        [
            Check::status(&[200]),
            Check::success(|body: AddPlaylistResponse| {
                ensure(!body.playlist_ulid.is_empty(), || "playlist_ulid is empty".to_string())?;
                own = body.playlist_ulid;
                Ok(())
            }),
        ],
    )?;

    expect_playlists(
        s,
        agent,
        token,
        &[own.as_str()],
        &[top.ulid.as_str()],
        &[top.ulid.as_str()],
    )
    .await?;

    detail(s, agent, token, "GET /api/playlist/{} (new)", &own, |p| {
        ensure(p.song_count == 0, || format!("new playlist has {} songs", p.song_count))?;
        ensure(p.user_display_name == me.display_name, || {
            format!("user_display_name {:?}, expected {:?}", p.user_display_name, me.display_name)
        })?;
        ensure(p.name == name, || format!("name {:?}, expected {:?}", p.name, name))
    })
    .await?;

    let mut update = Playlist::with_ulid(own.clone());
    update.name = name.clone();
    update.is_public = true;
    let song_count = rand::thread_rng().gen_range(0..OWN_MAX_SONGS);
    update.songs = random::sample(&s.songs, song_count)
        .iter()
        .map(PlaylistSong::from)
        .collect();
    let expected = update.song_ulids();

    let res = actions::update_playlist(agent, token, &update).await;
    s.validate(
        "POST /api/playlist/{}/update",
        &res,
        [
            Check::status(&[200]),
            Check::cache_control_private(),
            Check::success(|body: SinglePlaylistResponse| {
                checks::same_ulid(&body.playlist, &own)?;
                checks::song_order(&body.playlist, &expected)
            }),
        ],
    )?;

    detail(s, agent, token, "GET /api/playlist/{} (updated)", &own, |p| {
        ensure(p.is_public, || format!("playlist {} is not public", p.ulid))?;
        checks::song_order(p, &expected)
    })
    .await?;

    set_favorite(s, agent, token, &own, true).await?;

    let res = actions::get_recent_playlists(agent, token).await;
    s.validate(
        "GET /api/recent_playlists (own published)",
        &res,
        [
            Check::status(&[200]),
            Check::cache_control_private(),
            Check::success(|body: PlaylistListResponse| {
                checks::recent_list(&body.playlists)?;
                for p in &body.playlists {
                    ensure(!p.is_favorited || p.ulid == own || p.ulid == top.ulid, || {
                        format!("playlist {} is favorited but was never favorited", p.ulid)
                    })?;
                }
                let Some(p) = body.playlists.iter().find(|p| p.ulid == own) else {
                    return Err(format!("published playlist {} missing from recent playlists", own));
                };
                ensure(p.song_count == expected.len(), || {
                    format!("song_count {}, expected {}", p.song_count, expected.len())
                })?;
                ensure(p.favorite_count > 0 && p.is_favorited, || {
                    format!("playlist {} is not favorited in recent playlists", own)
                })
            }),
        ],
    )?;

    expect_playlists(
        s,
        agent,
        token,
        &[own.as_str()],
        &[top.ulid.as_str(), own.as_str()],
        &[own.as_str()],
    )
    .await?;

    detail(s, agent, token, "GET /api/playlist/{} (favorited)", &own, |p| {
        ensure(p.is_favorited && p.favorite_count > 0, || {
            format!("playlist {} is not favorited", p.ulid)
        })
    })
    .await?;

    set_favorite(s, agent, token, &own, false).await?;

    detail(s, agent, token, "GET /api/playlist/{} (unfavorited)", &own, |p| {
        ensure(!p.is_favorited, || format!("playlist {} is still favorited", p.ulid))
    })
    .await?;

    let res = actions::get_playlists(agent, token).await;
    s.validate(
        "GET /api/playlists (unfavorited)",
        &res,
        [
            Check::status(&[200]),
            Check::cache_control_private(),
            Check::success(|body: PlaylistsResponse| {
                ensure(body.find_created(&own).is_some(), || {
                    format!("playlist {} missing from created_playlists", own)
                })?;
                ensure(body.find_favorited(&own).is_none(), || {
                    format!("playlist {} still in favorited_playlists", own)
                })
            }),
        ],
    )?;

    let res = actions::delete_playlist(agent, token, &own).await;
    s.validate(
        "POST /api/playlist/{}/delete",
        &res,
        [
            Check::status(&[200]),
            Check::cache_control_private(),
            Check::success_base(),
        ],
    )?;

    let res = actions::get_playlist(agent, token, &own).await;
    s.validate(
        "GET /api/playlist/{} (deleted)",
        &res,
        [Check::status(&[404]), Check::cache_control_private()],
    )?;

    let res = actions::get_playlists(agent, token).await;
    s.validate(
        "GET /api/playlists (deleted)",
        &res,
        [
            Check::status(&[200]),
            Check::cache_control_private(),
            Check::success(|body: PlaylistsResponse| {
                ensure(
                    body.find_created(&own).is_none() && body.find_favorited(&own).is_none(),
                    || format!("deleted playlist {} is still listed", own),
                )
            }),
        ],
    )?;

    Ok(own)
}

/// A recent playlist owned by someone else
async fn pick_other(
    s: &Scenario,
    agent: &Agent,
    token: &CancellationToken,
    me: &UserProfile,
    own: &str,
) -> Result<String, ScenarioError> {
    let mut other = String::new();
    let res = actions::get_recent_playlists(agent, token).await;
    s.validate(
        "GET /api/recent_playlists (own deleted)",
        &res,
        [
            Check::status(&[200]),
            Check::cache_control_private(),
            Check::success(|body: PlaylistListResponse| {
                ensure(body.playlists.iter().all(|p| p.ulid != own), || {
                    format!("deleted playlist {} still in recent playlists", own)
                })?;
                match body
                    .playlists
                    .iter()
                    .rev()
                    .find(|p| p.user_display_name != me.display_name)
                {
                    Some(p) => {
                        other = p.ulid.clone();
                        Ok(())
                    }
                    None => Err("no playlist by another user in recent playlists".to_string()),
                }
            }),
        ],
    )?;
    Ok(other)
}

/// Log out, then the session must be gone while public reads still work
async fn logout(s: &Scenario, agent: &Agent, token: &CancellationToken, other: &str) -> Result<(), ScenarioError> {
    let res = actions::logout(agent, token).await;
    s.validate("POST /api/logout", &res, [Check::status(&[200]), Check::success_base()])?;
    sleep(token, LOGOUT_SETTLE).await?;

    let res = actions::get_playlists(agent, token).await;
    s.validate("GET /api/playlists (logged out)", &res, [Check::status(&[401])])?;

    let res = actions::get_playlist(agent, token, other).await;
    s.validate(
        "GET /api/playlist/{} (logged out)",
        &res,
        [
            Check::status(&[200, 304]),
            Check::success(|body: SinglePlaylistResponse| {
                checks::same_ulid(&body.playlist, other)?;
                ensure(!body.playlist.is_favorited, || {
                    format!("playlist {} is favorited for a logged-out session", other)
                })
            }),
        ],
    )
}

/// A banned user loses session and playlists until unbanned
async fn ban_cycle(s: &Scenario, agent: &Agent, token: &CancellationToken) -> Result<(), ScenarioError> {
    let victim = actions::new_signup_profile();
    let res = actions::signup(agent, token, &victim).await;
    s.validate("POST /api/signup (victim)", &res, [Check::status(&[200]), Check::success_base()])?;

    let victim_agent = s.fresh_agent()?;
    let res = actions::login(&victim_agent, token, &victim).await;
    s.validate("POST /api/login (victim)", &res, [Check::status(&[200]), Check::success_base()])?;
    sleep(token, SIGNUP_SETTLE).await?;

    let mut victim_playlist = Playlist::default();
    let res = actions::add_playlist(&victim_agent, token, &random::display_name()).await;
    s.validate(
        "POST /api/playlist/add (victim)",
        &res,
        [
            Check::status(&[200]),
            Check::success(|body: AddPlaylistResponse| {
                ensure(!body.playlist_ulid.is_empty(), || "playlist_ulid is empty".to_string())?;
                victim_playlist = Playlist::with_ulid(body.playlist_ulid);
                Ok(())
            }),
        ],
    )?;

    victim_playlist.name = random::display_name();
    victim_playlist.is_public = true;
    let song_count = rand::thread_rng().gen_range(0..VICTIM_MAX_SONGS);
    victim_playlist.songs = random::sample(&s.songs, song_count)
        .iter()
        .map(PlaylistSong::from)
        .collect();
    let res = actions::update_playlist(&victim_agent, token, &victim_playlist).await;
    s.validate(
        "POST /api/playlist/{}/update (victim)",
        &res,
        [
            Check::status(&[200]),
            Check::cache_control_private(),
            Check::success_base(),
        ],
    )?;
    let victim_ulid = victim_playlist.ulid.as_str();

    let admin_agent = s.fresh_agent()?;
    let res = actions::login(&admin_agent, token, &s.admin.profile).await;
    s.validate("POST /api/login (admin)", &res, [Check::status(&[200]), Check::success_base()])?;

    let res = actions::get_playlist(&admin_agent, token, victim_ulid).await;
    s.validate(
        "GET /api/playlist/{} (before ban)",
        &res,
        [Check::status(&[200]), Check::cache_control_private()],
    )?;

    ban(s, &admin_agent, token, &victim.account, true).await?;
    sleep(token, s.pacing.ban_grace).await?;

    let res = actions::get_playlists(&victim_agent, token).await;
    s.validate("GET /api/playlists (banned)", &res, [Check::status(&[401])])?;

    let res = actions::get_playlist(&admin_agent, token, victim_ulid).await;
    s.validate("GET /api/playlist/{} (banned)", &res, [Check::status(&[404])])?;

    let res = actions::get_recent_playlists(&admin_agent, token).await;
    s.validate(
        "GET /api/recent_playlists (banned)",
        &res,
        [
            Check::status(&[200]),
            Check::cache_control_private(),
            Check::success(|body: PlaylistListResponse| {
                ensure(body.playlists.len() == checks::LIST_LIMIT, || {
                    format!(
                        "recent playlists: expected {} entries, got {}",
                        checks::LIST_LIMIT,
                        body.playlists.len()
                    )
                })?;
                ensure(body.playlists.iter().all(|p| p.ulid != victim_ulid), || {
                    format!("banned user's playlist {} in recent playlists", victim_ulid)
                })
            }),
        ],
    )?;

    ban(s, &admin_agent, token, &victim.account, false).await?;
    sleep(token, s.pacing.ban_grace).await?;

    let res = actions::get_playlist(&admin_agent, token, victim_ulid).await;
    s.validate(
        "GET /api/playlist/{} (unbanned)",
        &res,
        [Check::status(&[200]), Check::cache_control_private()],
    )?;

    let res = actions::login(&victim_agent, token, &victim).await;
    s.validate("POST /api/login (unbanned)", &res, [Check::status(&[200]), Check::success_base()])?;

    let res = actions::get_playlists(&victim_agent, token).await;
    s.validate(
        "GET /api/playlists (unbanned)",
        &res,
        [
            Check::status(&[200]),
            Check::cache_control_private(),
            Check::success_base(),
        ],
    )
}

async fn ban(
    s: &Scenario,
    agent: &Agent,
    token: &CancellationToken,
    account: &str,
    is_ban: bool,
) -> Result<(), ScenarioError> {
    let res = actions::admin_ban(agent, token, account, is_ban).await;
    s.validate(
        "POST /api/admin/user/ban",
        &res,
        [
            Check::status(&[200]),
            Check::cache_control_private(),
            Check::success(|body: AdminBanResponse| {
                ensure(body.user_account == account, || {
                    format!("ban response for {}, expected {}", body.user_account, account)
                })?;
                ensure(body.is_ban == is_ban, || {
                    format!("is_ban is {}, expected {}", body.is_ban, is_ban)
                })
            }),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ulid: &str, favorite_count: usize, is_favorited: bool) -> Playlist {
        Playlist {
            ulid: ulid.to_string(),
            favorite_count,
            is_favorited,
            is_public: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_favorite_must_raise_count() {
        let before = entry("TOP", 7, false);
        assert!(check_favorite_counted(&[entry("TOP", 8, true)], &before).is_ok());
        assert!(check_favorite_counted(&[entry("TOP", 9, true)], &before).is_ok());

        let err = check_favorite_counted(&[entry("TOP", 7, true)], &before).unwrap_err();
        assert!(err.contains("expected at least 8"), "{err}");
    }

    #[test]
    fn test_favorite_must_be_flagged_and_listed() {
        let before = entry("TOP", 7, false);
        assert!(check_favorite_counted(&[entry("TOP", 8, false)], &before).is_err());
        assert!(check_favorite_counted(&[entry("OTHER", 8, true)], &before).is_err());
    }
}
