//! Serde helpers shared by the domain configs

use serde::{Deserialize, Deserializer, Serializer};
use std::time::Duration;

/// Serde helper module for Duration serialization as seconds
pub mod serde_duration {
    use super::*;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seconds = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(seconds))
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use std::time::Duration;

    #[derive(Serialize, Deserialize)]
    struct Wrapper {
        #[serde(with = "super::serde_duration")]
        value: Duration,
    }

    #[test]
    fn test_duration_as_seconds() {
        let parsed: Wrapper = serde_yaml::from_str("value: 42").unwrap();
        assert_eq!(parsed.value, Duration::from_secs(42));
        let yaml = serde_yaml::to_string(&parsed).unwrap();
        assert!(yaml.contains("value: 42"));
    }
}
