use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use tripweave_core::SearchConfig;
use tripweave_mdp::{DEFAULT_LOCATION, LearningConfig, MdpError, RewardWeights};

use crate::SessionError;

const DEFAULT_SESSION_CONFIG_YAML: &str = include_str!("../config/session.default.yaml");

/// Everything needed to build a [`crate::Session`] apart from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Seed of the simulator RNG; planning, training and forecasts all draw from it.
    pub seed: u64,
    pub total_budget: f64,
    pub start_location: String,
    pub reward_weights: RewardWeights,
    pub transition_history_limit: Option<usize>,
    pub observation_limit: Option<usize>,
    pub search: SearchConfig,
    pub learning: LearningConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            seed: 42,
            total_budget: 15_000.0,
            start_location: DEFAULT_LOCATION.to_string(),
            reward_weights: RewardWeights::default(),
            transition_history_limit: Some(10_000),
            observation_limit: Some(1_000),
            search: SearchConfig::default(),
            learning: LearningConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, SessionError> {
        let config: SessionConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_path(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let yaml = fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    pub fn default_yaml() -> &'static str {
        DEFAULT_SESSION_CONFIG_YAML
    }

    pub fn from_default_yaml() -> Result<Self, SessionError> {
        Self::from_yaml_str(Self::default_yaml())
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        if !self.total_budget.is_finite() || self.total_budget <= 0.0 {
            return Err(SessionError::InvalidConfig(
                "total_budget must be a positive amount".to_string(),
            ));
        }
        if self.start_location.trim().is_empty() {
            return Err(SessionError::InvalidConfig(
                "start_location must not be empty".to_string(),
            ));
        }
        self.reward_weights.validate()?;
        self.search.validate().map_err(MdpError::from)?;
        self.learning.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_yaml_matches_default() {
        let config = SessionConfig::from_default_yaml().expect("default yaml");
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let config = SessionConfig::from_yaml_str("seed: 7\nsearch:\n  iterations: 20\n")
            .expect("partial yaml");
        assert_eq!(config.seed, 7);
        assert_eq!(config.search.iterations, 20);
        assert_eq!(config.search.rollout_steps, 5);
        assert_eq!(config.total_budget, 15_000.0);
    }

    #[test]
    fn rejects_bad_nested_values() {
        let err = SessionConfig::from_yaml_str("search:\n  iterations: 0\n").expect_err("invalid");
        assert!(matches!(err, SessionError::Mdp(MdpError::SearchConfig(_))));

        let err =
            SessionConfig::from_yaml_str("learning:\n  epsilon: 2.0\n").expect_err("invalid");
        assert!(matches!(err, SessionError::Mdp(MdpError::InvalidConfig(_))));

        assert!(SessionConfig::from_yaml_str("total_budget: 0\n").is_err());
    }
}
