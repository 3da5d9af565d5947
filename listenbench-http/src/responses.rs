//! Typed response envelopes
//!
//! Every API response carries `{result, status, error?}`; the typed variants
//! flatten that envelope next to their payload. Unknown fields are ignored.

use chrono::{DateTime, Utc};
use listenbench_core::{null_as_default, Playlist};
use serde::Deserialize;

/// Access to the shared envelope of a typed response
pub trait ApiResponse: serde::de::DeserializeOwned {
    fn base(&self) -> &BaseResponse;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BaseResponse {
    #[serde(default)]
    pub result: bool,
    #[serde(default)]
    pub status: i64,
    #[serde(default)]
    pub error: Option<String>,
}

impl ApiResponse for BaseResponse {
    fn base(&self) -> &BaseResponse {
        self
    }
}

/// `GET /api/recent_playlists` and `GET /api/popular_playlists`
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistListResponse {
    #[serde(flatten)]
    pub base: BaseResponse,
    #[serde(default, deserialize_with = "null_as_default")]
    pub playlists: Vec<Playlist>,
}

/// `GET /api/playlists`
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistsResponse {
    #[serde(flatten)]
    pub base: BaseResponse,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_playlists: Vec<Playlist>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub favorited_playlists: Vec<Playlist>,
}

impl PlaylistsResponse {
    pub fn find_created(&self, ulid: &str) -> Option<&Playlist> {
        self.created_playlists.iter().find(|p| p.ulid == ulid)
    }

    pub fn find_favorited(&self, ulid: &str) -> Option<&Playlist> {
        self.favorited_playlists.iter().find(|p| p.ulid == ulid)
    }

    /// ULIDs of created then favorited playlists, without duplicates
    pub fn all_ulids(&self) -> Vec<String> {
        let mut ulids: Vec<String> = Vec::new();
        for p in self.created_playlists.iter().chain(&self.favorited_playlists) {
            if !ulids.contains(&p.ulid) {
                ulids.push(p.ulid.clone());
            }
        }
        ulids
    }
}

/// `POST /api/playlist/add`
#[derive(Debug, Clone, Deserialize)]
pub struct AddPlaylistResponse {
    #[serde(flatten)]
    pub base: BaseResponse,
    #[serde(default)]
    pub playlist_ulid: String,
}

/// Detail, update and favorite endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct SinglePlaylistResponse {
    #[serde(flatten)]
    pub base: BaseResponse,
    #[serde(default)]
    pub playlist: Playlist,
}

/// `POST /api/admin/user/ban`
#[derive(Debug, Clone, Deserialize)]
pub struct AdminBanResponse {
    #[serde(flatten)]
    pub base: BaseResponse,
    #[serde(default)]
    pub user_account: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub is_ban: bool,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

macro_rules! impl_api_response {
    ($($ty:ty),* $(,)?) => {
        $(impl ApiResponse for $ty {
            fn base(&self) -> &BaseResponse {
                &self.base
            }
        })*
    };
}

impl_api_response!(
    PlaylistListResponse,
    PlaylistsResponse,
    AddPlaylistResponse,
    SinglePlaylistResponse,
    AdminBanResponse,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flattened_envelope() {
        let json = r#"{"result":true,"status":200,"playlist_ulid":"01GX","extra":1}"#;
        let response: AddPlaylistResponse = serde_json::from_str(json).unwrap();
        assert!(response.base().result);
        assert_eq!(response.base().status, 200);
        assert_eq!(response.playlist_ulid, "01GX");
    }

    #[test]
    fn test_error_envelope() {
        let json = r#"{"result":false,"status":401,"error":"failed to login"}"#;
        let response: BaseResponse = serde_json::from_str(json).unwrap();
        assert!(!response.result);
        assert_eq!(response.error.as_deref(), Some("failed to login"));
    }

    #[test]
    fn test_null_lists_decode_as_empty() {
        let json = r#"{"result":true,"status":200,"created_playlists":[],"favorited_playlists":null}"#;
        let response: PlaylistsResponse = serde_json::from_str(json).unwrap();
        assert!(response.favorited_playlists.is_empty());
        assert!(response.all_ulids().is_empty());

        let json = r#"{"result":true,"status":200,"playlists":null}"#;
        let response: PlaylistListResponse = serde_json::from_str(json).unwrap();
        assert!(response.playlists.is_empty());
    }

    #[test]
    fn test_all_ulids_dedupes() {
        let json = r#"{"result":true,"status":200,
            "created_playlists":[{"ulid":"A"},{"ulid":"B"}],
            "favorited_playlists":[{"ulid":"B"},{"ulid":"C"}]}"#;
        let response: PlaylistsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.all_ulids(), vec!["A", "B", "C"]);
        assert!(response.find_created("A").is_some());
        assert!(response.find_favorited("A").is_none());
    }
}
