//! Administrator: ban the owner of a recent playlist, then lift the ban

use super::{sleep, Scenario};
use crate::checks::LIST_LIMIT;
use crate::error::ScenarioError;
use crate::validation::Check;
use listenbench_core::{Playlist, ScoreTag};
use listenbench_http::responses::{AdminBanResponse, PlaylistListResponse};
use listenbench_http::{actions, Agent};
use rand::Rng;
use tokio_util::sync::CancellationToken;

pub(super) async fn run(s: &Scenario, token: &CancellationToken) -> Result<(), ScenarioError> {
    let agent = s.agent_for(&s.admin)?;

    let res = actions::login(&agent, token, &s.admin.profile).await;
    s.validate("POST /api/login (admin)", &res, [Check::status(&[200]), Check::success_base()])?;
    s.credit(ScoreTag::Login);

    let mut target = Playlist::default();
    let res = actions::get_recent_playlists(&agent, token).await;
    s.validate(
        "GET /api/recent_playlists",
        &res,
        [
            Check::status(&[200]),
            Check::success(|mut body: PlaylistListResponse| {
                if body.playlists.len() != LIST_LIMIT {
                    return Err(format!(
                        "recent playlists: expected {} entries, got {}",
                        LIST_LIMIT,
                        body.playlists.len()
                    ));
                }
                let index = rand::thread_rng().gen_range(0..body.playlists.len());
                target = body.playlists.swap_remove(index);
                Ok(())
            }),
        ],
    )?;

    ban(s, &agent, token, &target.user_account, true).await?;
    sleep(token, s.pacing.ban_grace).await?;

    let res = actions::get_playlist(&agent, token, &target.ulid).await;
    s.validate("GET /api/playlist/{} (owner banned)", &res, [Check::status(&[404])])?;

    ban(s, &agent, token, &target.user_account, false).await?;
    sleep(token, s.pacing.ban_grace).await?;

    let res = actions::get_playlist(&agent, token, &target.ulid).await;
    s.validate("GET /api/playlist/{} (owner unbanned)", &res, [Check::status(&[200])])?;

    Ok(())
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
            Check::success(|body: AdminBanResponse| {
                if body.user_account != account {
                    return Err(format!(
                        "ban response for {}, expected {}",
                        body.user_account, account
                    ));
                }
                if body.is_ban != is_ban {
                    return Err(format!("is_ban is {}, expected {}", body.is_ban, is_ban));
                }
                Ok(())
            }),
        ],
    )?;
    s.credit(ScoreTag::AdminBan);
    Ok(())
}
