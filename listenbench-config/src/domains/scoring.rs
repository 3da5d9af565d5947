//! Score weights

use crate::error::ConfigResult;
use crate::validation::Validatable;
use listenbench_core::ScoreTag;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Weight per score tag. Tags missing from the table weigh 1.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: BTreeMap<ScoreTag, i64>,
}

impl ScoringConfig {
    pub fn weight(&self, tag: ScoreTag) -> i64 {
        self.weights.get(&tag).copied().unwrap_or(1)
    }
}

impl Validatable for ScoringConfig {
    fn validate(&self) -> ConfigResult<()> {
        if let Some((tag, weight)) = self.weights.iter().find(|(_, w)| **w < 0) {
            return Err(self.validation_error(format!(
                "weight for '{}' must not be negative, got {}",
                tag, weight
            )));
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "scoring"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weight_is_one() {
        let config = ScoringConfig::default();
        for tag in ScoreTag::all() {
            assert_eq!(config.weight(*tag), 1);
        }
    }

    #[test]
    fn test_weights_from_yaml() {
        let yaml = r#"
weights:
  "POST /api/playlist/{}/add": 5
  "GET /": 0
"#;
        let config: ScoringConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.weight(ScoreTag::AddPlaylist), 5);
        assert_eq!(config.weight(ScoreTag::GetRoot), 0);
        assert_eq!(config.weight(ScoreTag::Login), 1);
    }

    #[test]
    fn test_unknown_tag_fails_to_parse() {
        let yaml = "weights:\n  \"GET /unknown\": 3\n";
        assert!(serde_yaml::from_str::<ScoringConfig>(yaml).is_err());
    }

    #[test]
    fn test_negative_weight_rejected() {
        let mut config = ScoringConfig::default();
        config.weights.insert(ScoreTag::Signup, -1);
        assert!(config.validate().is_err());
    }
}
