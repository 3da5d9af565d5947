//! Domain models as the benchmarker sees them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Decode an explicit `null` as the type's default.
///
/// `#[serde(default)]` only covers a missing field; the target sends `null`
/// for empty lists in some responses.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Account credentials and flags for a benchmark user.
///
/// Loaded once from `users.json`, or produced by a signup call. The ban flag
/// only decides which pool the user lands in; it is never written back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub account: String,
    pub password: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub is_ban: bool,
    #[serde(default)]
    pub is_heavy: bool,
}

impl UserProfile {
    pub fn new(account: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            password: password.into(),
            display_name: String::new(),
            is_ban: false,
            is_heavy: false,
        }
    }

    /// The administrator account the target seeds on initialize
    pub fn admin() -> Self {
        Self::new("adminuser", "adminpass")
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }
}

/// Song fixture record. Never mutated during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub ulid: String,
    pub title: String,
    pub artist_name: String,
    pub artist_id: i64,
}

/// Song entry inside a playlist detail response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaylistSong {
    pub ulid: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub track_number: i64,
    pub is_public: bool,
}

impl From<&Song> for PlaylistSong {
    fn from(song: &Song) -> Self {
        Self {
            ulid: song.ulid.clone(),
            title: song.title.clone(),
            artist: song.artist_name.clone(),
            ..Default::default()
        }
    }
}

/// Playlist summary or detail.
///
/// Summaries from list endpoints leave `songs` empty; detail responses carry
/// the ordered song list. Also used as the payload source for update and
/// favorite requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Playlist {
    pub ulid: String,
    pub name: String,
    pub user_display_name: String,
    pub user_account: String,
    pub song_count: usize,
    pub favorite_count: usize,
    pub is_favorited: bool,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(deserialize_with = "null_as_default")]
    pub songs: Vec<PlaylistSong>,
}

impl Playlist {
    /// Minimal payload for requests that only need the ULID
    pub fn with_ulid(ulid: impl Into<String>) -> Self {
        Self {
            ulid: ulid.into(),
            ..Default::default()
        }
    }

    /// Song ULIDs in playlist order
    pub fn song_ulids(&self) -> Vec<String> {
        self.songs.iter().map(|s| s.ulid.clone()).collect()
    }
}

/// ULIDs of a song slice, in order
pub fn song_ulids(songs: &[Song]) -> Vec<String> {
    songs.iter().map(|s| s.ulid.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playlist_summary_decodes_without_songs() {
        let json = r#"{
            "ulid": "01GAAAA",
            "name": "My List",
            "user_display_name": "alice",
            "user_account": "alice01",
            "song_count": 3,
            "favorite_count": 2,
            "is_favorited": false,
            "is_public": true,
            "created_at": "2022-08-01T10:00:00.123Z",
            "updated_at": "2022-08-01T10:00:01Z",
            "unknown_field": 42
        }"#;
        let playlist: Playlist = serde_json::from_str(json).unwrap();
        assert_eq!(playlist.ulid, "01GAAAA");
        assert_eq!(playlist.song_count, 3);
        assert!(playlist.songs.is_empty());
        assert!(playlist.is_public);
    }

    #[test]
    fn test_playlist_song_order_is_preserved() {
        let json = r#"{"ulid":"P","songs":[{"ulid":"A"},{"ulid":"B"},{"ulid":"C"}]}"#;
        let playlist: Playlist = serde_json::from_str(json).unwrap();
        assert_eq!(playlist.song_ulids(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_null_songs_decode_as_empty() {
        let playlist: Playlist = serde_json::from_str(r#"{"ulid":"P","songs":null}"#).unwrap();
        assert!(playlist.songs.is_empty());
    }

    #[test]
    fn test_user_fixture_decodes() {
        let json = r#"{"account":"u1","password":"p","display_name":"U","is_ban":true,"is_heavy":false}"#;
        let user: UserProfile = serde_json::from_str(json).unwrap();
        assert!(user.is_ban);
        assert!(!user.is_heavy);
    }

    #[test]
    fn test_admin_profile() {
        let admin = UserProfile::admin();
        assert_eq!(admin.account, "adminuser");
        assert_eq!(admin.password, "adminpass");
    }
}
