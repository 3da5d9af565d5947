//! Core error types for Listenbench

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Aggregation key for every failure the benchmarker records.
///
/// The string forms are stable: they appear in the admin log breakdown and
/// in the error ledger snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Fixture read/parse failure
    #[serde(rename = "load-json")]
    LoadJson,
    /// HTTP agent construction failure
    #[serde(rename = "agent")]
    Agent,
    /// Response validation or transport failure during a scenario
    #[serde(rename = "request")]
    Request,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::LoadJson => "load-json",
            ErrorKind::Agent => "agent",
            ErrorKind::Request => "request",
        }
    }

    pub fn all() -> &'static [ErrorKind] {
        &[ErrorKind::LoadJson, ErrorKind::Agent, ErrorKind::Request]
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorKind {
    type Err = CoreError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "load-json" => Ok(ErrorKind::LoadJson),
            "agent" => Ok(ErrorKind::Agent),
            "request" => Ok(ErrorKind::Request),
            _ => Err(CoreError::UnknownErrorKind(s.to_string())),
        }
    }
}

/// Core error type
#[derive(Debug, Error)]
pub enum CoreError {
    /// Fixture file could not be opened or read
    #[error("failed to read {path}: {source}")]
    FixtureRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Fixture file is not the expected JSON array
    #[error("failed to decode json in {path}: {source}")]
    FixtureDecode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown error kind: {0}")]
    UnknownErrorKind(String),

    #[error("unknown score tag: {0}")]
    UnknownScoreTag(String),
}

impl CoreError {
    /// Taxonomy bucket this error is aggregated under
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::FixtureRead { .. } | CoreError::FixtureDecode { .. } => ErrorKind::LoadJson,
            CoreError::UnknownErrorKind(_) | CoreError::UnknownScoreTag(_) => ErrorKind::Request,
        }
    }
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_round_trip_strings() {
        for kind in ErrorKind::all() {
            assert_eq!(kind.as_str().parse::<ErrorKind>().unwrap(), *kind);
        }
        assert!("load".parse::<ErrorKind>().is_err());
    }

    #[test]
    fn test_error_kind_serde_uses_stable_names() {
        let json = serde_json::to_string(&ErrorKind::LoadJson).unwrap();
        assert_eq!(json, "\"load-json\"");
    }

    #[test]
    fn test_fixture_errors_are_load_json() {
        let err = CoreError::FixtureRead {
            path: PathBuf::from("users.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(err.kind(), ErrorKind::LoadJson);
        assert!(err.to_string().contains("users.json"));
    }
}
