//! Banned user: login must be refused

use super::Scenario;
use crate::error::ScenarioError;
use crate::validation::Check;
use listenbench_core::ScoreTag;
use listenbench_http::actions;
use listenbench_http::responses::BaseResponse;
use tokio_util::sync::CancellationToken;

pub(super) async fn run(s: &Scenario, token: &CancellationToken) -> Result<(), ScenarioError> {
    let Some(user) = s.banned_users.checkout(token).await else {
        return Err(ScenarioError::Cancelled);
    };
    let agent = s.agent_for(&user)?;

    let res = actions::login(&agent, token, &user.profile).await;
    s.validate(
        "POST /api/login (banned)",
        &res,
        [Check::status(&[401]), Check::error::<BaseResponse>()],
    )?;
    s.credit(ScoreTag::Login);
    Ok(())
}
