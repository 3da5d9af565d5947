//! Fixture location configuration

use crate::error::ConfigResult;
use crate::validation::{validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Directory holding the fixture files
    #[serde(default = "default_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_users_file")]
    pub users_file: String,

    #[serde(default = "default_songs_file")]
    pub songs_file: String,
}

impl DataConfig {
    pub fn users_path(&self) -> PathBuf {
        self.dir.join(&self.users_file)
    }

    pub fn songs_path(&self) -> PathBuf {
        self.dir.join(&self.songs_file)
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            users_file: default_users_file(),
            songs_file: default_songs_file(),
        }
    }
}

impl Validatable for DataConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.dir.as_os_str().is_empty() {
            return Err(self.validation_error("dir cannot be empty"));
        }
        validate_required_string(&self.users_file, "users_file", self.domain_name())?;
        validate_required_string(&self.songs_file, "songs_file", self.domain_name())
    }

    fn domain_name(&self) -> &'static str {
        "data"
    }
}

fn default_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_users_file() -> String {
    "users.json".to_string()
}

fn default_songs_file() -> String {
    "songs.json".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_paths() {
        let config = DataConfig {
            dir: PathBuf::from("/srv/bench"),
            ..Default::default()
        };
        assert_eq!(config.users_path(), PathBuf::from("/srv/bench/users.json"));
        assert_eq!(config.songs_path(), PathBuf::from("/srv/bench/songs.json"));
    }

    #[test]
    fn test_empty_file_name_rejected() {
        let config = DataConfig {
            songs_file: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
