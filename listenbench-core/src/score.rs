//! Score tags credited by scenarios

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One tag per endpoint, with `(login)` variants for the list endpoints
/// fetched by authenticated personas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ScoreTag {
    GetRoot,
    Signup,
    Login,
    Logout,
    GetPlaylist,
    GetPlaylists,
    GetRecentPlaylists,
    GetPopularPlaylists,
    AddPlaylist,
    UpdatePlaylist,
    FavoritePlaylist,
    AdminBan,
    GetRecentPlaylistsLogin,
    GetPopularPlaylistsLogin,
}

impl ScoreTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreTag::GetRoot => "GET /",
            ScoreTag::Signup => "POST /api/signup",
            ScoreTag::Login => "POST /api/login",
            ScoreTag::Logout => "POST /api/logout",
            ScoreTag::GetPlaylist => "GET /api/playlist/{}",
            ScoreTag::GetPlaylists => "GET /api/playlists",
            ScoreTag::GetRecentPlaylists => "GET /api/recent_playlists",
            ScoreTag::GetPopularPlaylists => "GET /api/popular_playlists",
            ScoreTag::AddPlaylist => "POST /api/playlist/{}/add",
            ScoreTag::UpdatePlaylist => "POST /api/playlist/{}/update",
            ScoreTag::FavoritePlaylist => "POST /api/playlist/favorite",
            ScoreTag::AdminBan => "POST /api/admin/user/ban",
            ScoreTag::GetRecentPlaylistsLogin => "GET /api/recent_playlists (login)",
            ScoreTag::GetPopularPlaylistsLogin => "GET /api/popular_playlists (login)",
        }
    }

    pub fn all() -> &'static [ScoreTag] {
        &[
            ScoreTag::GetRoot,
            ScoreTag::Signup,
            ScoreTag::Login,
            ScoreTag::Logout,
            ScoreTag::GetPlaylist,
            ScoreTag::GetPlaylists,
            ScoreTag::GetRecentPlaylists,
            ScoreTag::GetPopularPlaylists,
            ScoreTag::AddPlaylist,
            ScoreTag::UpdatePlaylist,
            ScoreTag::FavoritePlaylist,
            ScoreTag::AdminBan,
            ScoreTag::GetRecentPlaylistsLogin,
            ScoreTag::GetPopularPlaylistsLogin,
        ]
    }
}

impl fmt::Display for ScoreTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScoreTag {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScoreTag::all()
            .iter()
            .find(|tag| tag.as_str() == s)
            .copied()
            .ok_or_else(|| CoreError::UnknownScoreTag(s.to_string()))
    }
}

impl TryFrom<String> for ScoreTag {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ScoreTag> for String {
    fn from(tag: ScoreTag) -> Self {
        tag.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_tag_strings_are_unique() {
        let strings: HashSet<_> = ScoreTag::all().iter().map(|t| t.as_str()).collect();
        assert_eq!(strings.len(), ScoreTag::all().len());
    }

    #[test]
    fn test_tag_from_str() {
        assert_eq!(
            "GET /api/recent_playlists (login)".parse::<ScoreTag>().unwrap(),
            ScoreTag::GetRecentPlaylistsLogin
        );
        assert!("GET /nope".parse::<ScoreTag>().is_err());
    }

    #[test]
    fn test_tag_serde_as_string() {
        let json = serde_json::to_string(&ScoreTag::AdminBan).unwrap();
        assert_eq!(json, "\"POST /api/admin/user/ban\"");
        let back: ScoreTag = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ScoreTag::AdminBan);
    }
}
