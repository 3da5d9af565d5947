//! Invariants over playlist lists and details, shared by the scenarios

use chrono::{DateTime, Duration, Utc};
use listenbench_core::Playlist;

/// Maximum length of the recent and popular lists
pub const LIST_LIMIT: usize = 100;

/// A public playlist older than this relative to the newest known public
/// playlist means the recent list is being served stale
pub fn staleness_tolerance() -> Duration {
    Duration::seconds(10)
}

pub fn recent_order(playlists: &[Playlist]) -> Result<(), String> {
    for pair in playlists.windows(2) {
        // compared at second precision
        if pair[0].created_at.timestamp() < pair[1].created_at.timestamp() {
            return Err(format!(
                "recent playlists out of order: {} ({}) before {} ({})",
                pair[0].ulid, pair[0].created_at, pair[1].ulid, pair[1].created_at
            ));
        }
    }
    Ok(())
}

pub fn popular_order(playlists: &[Playlist]) -> Result<(), String> {
    for pair in playlists.windows(2) {
        if pair[0].favorite_count < pair[1].favorite_count {
            return Err(format!(
                "popular playlists out of order: {} ({} favorites) before {} ({} favorites)",
                pair[0].ulid, pair[0].favorite_count, pair[1].ulid, pair[1].favorite_count
            ));
        }
    }
    Ok(())
}

pub fn all_public(playlists: &[Playlist]) -> Result<(), String> {
    match playlists.iter().find(|p| !p.is_public) {
        Some(p) => Err(format!("private playlist {} in public list", p.ulid)),
        None => Ok(()),
    }
}

pub fn none_favorited(playlists: &[Playlist]) -> Result<(), String> {
    match playlists.iter().find(|p| p.is_favorited) {
        Some(p) => Err(format!("playlist {} is favorited for an anonymous user", p.ulid)),
        None => Ok(()),
    }
}

pub fn favorites_positive(playlists: &[Playlist]) -> Result<(), String> {
    match playlists.iter().find(|p| p.favorite_count == 0) {
        Some(p) => Err(format!("popular playlist {} has no favorites", p.ulid)),
        None => Ok(()),
    }
}

/// Exactly [`LIST_LIMIT`] public entries, newest first
pub fn recent_list(playlists: &[Playlist]) -> Result<(), String> {
    if playlists.len() != LIST_LIMIT {
        return Err(format!(
            "recent playlists: expected {} entries, got {}",
            LIST_LIMIT,
            playlists.len()
        ));
    }
    recent_order(playlists)?;
    all_public(playlists)
}

/// Between `min` and [`LIST_LIMIT`] public entries, most favorited first
pub fn popular_list(playlists: &[Playlist], min: usize) -> Result<(), String> {
    if playlists.len() < min || playlists.len() > LIST_LIMIT {
        return Err(format!(
            "popular playlists: expected {}..={} entries, got {}",
            min,
            LIST_LIMIT,
            playlists.len()
        ));
    }
    popular_order(playlists)?;
    all_public(playlists)
}

/// The top of the recent list must not lag behind the newest public
/// playlist this run has created
pub fn not_stale(top: &Playlist, last_public: Option<DateTime<Utc>>) -> Result<(), String> {
    let Some(last_public) = last_public else {
        return Ok(());
    };
    if top.created_at < last_public - staleness_tolerance() {
        return Err(format!(
            "recent playlists are stale: newest entry created at {}, expected at or after {}",
            top.created_at,
            last_public - staleness_tolerance()
        ));
    }
    Ok(())
}

/// Song count and order of a detail match what was sent
pub fn song_order(playlist: &Playlist, expected: &[String]) -> Result<(), String> {
    if playlist.song_count != expected.len() {
        return Err(format!(
            "playlist {}: song_count {}, expected {}",
            playlist.ulid,
            playlist.song_count,
            expected.len()
        ));
    }
    let actual = playlist.song_ulids();
    if actual != expected {
        return Err(format!(
            "playlist {}: songs {:?}, expected {:?}",
            playlist.ulid, actual, expected
        ));
    }
    Ok(())
}

/// `Err(message())` unless `condition` holds
pub fn ensure(condition: bool, message: impl FnOnce() -> String) -> Result<(), String> {
    if condition {
        Ok(())
    } else {
        Err(message())
    }
}

pub fn same_ulid(playlist: &Playlist, expected: &str) -> Result<(), String> {
    if playlist.ulid != expected {
        return Err(format!("playlist ulid {}, expected {}", playlist.ulid, expected));
    }
    Ok(())
}
