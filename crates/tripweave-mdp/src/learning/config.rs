use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{MdpError, io::load_yaml};

const DEFAULT_LEARNING_CONFIG_YAML: &str = include_str!("../../config/learning.default.yaml");

/// Hyperparameters of the tabular Q-learning agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    pub learning_rate: f64,
    pub discount: f64,
    /// Initial exploration rate.
    pub epsilon: f64,
    pub epsilon_decay: f64,
    pub min_epsilon: f64,
    pub max_steps: usize,
    pub terminal_day: u32,
    /// `None` keeps every state ever seen.
    pub max_table_states: Option<usize>,
    /// `None` keeps every episode and reward.
    pub history_limit: Option<usize>,
}

impl Default for LearningConfig {
    fn default() -> Self {
        LearningConfig {
            learning_rate: 0.001,
            discount: 0.99,
            epsilon: 0.1,
            epsilon_decay: 0.995,
            min_epsilon: 0.01,
            max_steps: 50,
            terminal_day: 3,
            max_table_states: Some(50_000),
            history_limit: Some(1_000),
        }
    }
}

impl LearningConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, MdpError> {
        let config: LearningConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_path(path: impl AsRef<Path>) -> Result<Self, MdpError> {
        let config: LearningConfig = load_yaml(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn default_yaml() -> &'static str {
        DEFAULT_LEARNING_CONFIG_YAML
    }

    pub fn from_default_yaml() -> Result<Self, MdpError> {
        Self::from_yaml_str(Self::default_yaml())
    }

    pub fn validate(&self) -> Result<(), MdpError> {
        let unit = |value: f64| value.is_finite() && (0.0..=1.0).contains(&value);

        if !unit(self.learning_rate) || self.learning_rate == 0.0 {
            return Err(invalid("learning_rate must be in (0, 1]"));
        }
        if !unit(self.discount) {
            return Err(invalid("discount must be in [0, 1]"));
        }
        if !unit(self.epsilon) {
            return Err(invalid("epsilon must be in [0, 1]"));
        }
        if !unit(self.epsilon_decay) || self.epsilon_decay == 0.0 {
            return Err(invalid("epsilon_decay must be in (0, 1]"));
        }
        if !unit(self.min_epsilon) || self.min_epsilon > self.epsilon {
            return Err(invalid("min_epsilon must be in [0, epsilon]"));
        }
        if self.max_steps == 0 {
            return Err(invalid("max_steps must be greater than 0"));
        }
        if self.terminal_day < 2 {
            return Err(invalid("terminal_day must be at least 2"));
        }
        if self.max_table_states == Some(0) {
            return Err(invalid("max_table_states must be greater than 0"));
        }
        if self.history_limit == Some(0) {
            return Err(invalid("history_limit must be greater than 0"));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> MdpError {
    MdpError::InvalidConfig(message.to_string())
}
