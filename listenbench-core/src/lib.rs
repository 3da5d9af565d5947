//! Core domain models and types for Listenbench
//!
//! This crate contains the fundamental types shared by every other crate:
//! the playlist/song/user models as the benchmarker sees them, the closed set
//! of score tags, the error taxonomy used for aggregation, and fixture loading.

pub mod error;
pub mod fixtures;
pub mod models;
pub mod random;
pub mod score;

// Re-export commonly used types at the crate root
pub use error::{CoreError, ErrorKind, Result};
pub use fixtures::load_json_file;
pub use models::{null_as_default, song_ulids, Playlist, PlaylistSong, Song, UserProfile};
pub use score::ScoreTag;
