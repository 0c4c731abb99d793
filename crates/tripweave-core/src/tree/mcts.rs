use std::{fmt, fs, ops::ControlFlow, path::Path};

use serde::{Deserialize, Serialize};

use crate::tree::{
    error::TreeError,
    ids::{ActionId, NodeId},
    rollout::{ReturnType, RolloutParams, rollout},
    search_tree::Tree,
};

const DEFAULT_SEARCH_CONFIG_YAML: &str = include_str!("../../config/search.default.yaml");

/// Search configuration for MCTS iterations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Default iteration budget for one planning call.
    pub iterations: usize,
    /// Multiplier inside the UCB1 exploration square root.
    pub exploration: f64,
    pub rollout_steps: usize,
    pub return_type: ReturnType,
    pub gamma: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            iterations: 100,
            exploration: 2.0,
            rollout_steps: 5,
            return_type: ReturnType::Undiscounted,
            gamma: 1.0,
        }
    }
}

impl SearchConfig {
    /// Parse a search config from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, SearchConfigError> {
        let config: SearchConfig = serde_yaml::from_str(yaml).map_err(SearchConfigError::Yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a search config from a YAML file path.
    pub fn from_yaml_path(path: impl AsRef<Path>) -> Result<Self, SearchConfigError> {
        let yaml = fs::read_to_string(path).map_err(SearchConfigError::Io)?;
        Self::from_yaml_str(&yaml)
    }

    /// Return the default YAML config included with this crate.
    pub fn default_yaml() -> &'static str {
        DEFAULT_SEARCH_CONFIG_YAML
    }

    /// Parse the default YAML config included with this crate.
    pub fn from_default_yaml() -> Result<Self, SearchConfigError> {
        Self::from_yaml_str(Self::default_yaml())
    }

    pub fn validate(&self) -> Result<(), SearchConfigError> {
        if self.iterations == 0 {
            return Err(SearchConfigError::Invalid(
                "iterations must be greater than 0".to_string(),
            ));
        }
        if !self.exploration.is_finite() || self.exploration < 0.0 {
            return Err(SearchConfigError::Invalid(
                "exploration must be finite and >= 0".to_string(),
            ));
        }
        if self.rollout_steps == 0 {
            return Err(SearchConfigError::Invalid(
                "rollout_steps must be greater than 0".to_string(),
            ));
        }
        if !self.gamma.is_finite() || self.gamma < 0.0 {
            return Err(SearchConfigError::Invalid(
                "gamma must be finite and >= 0".to_string(),
            ));
        }
        Ok(())
    }

    fn rollout_params(&self) -> RolloutParams {
        RolloutParams {
            return_type: self.return_type,
            gamma: self.gamma,
            steps: self.rollout_steps,
        }
    }
}

/// Error type for loading and validating `SearchConfig`.
#[derive(Debug)]
pub enum SearchConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
    Invalid(String),
}

impl fmt::Display for SearchConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchConfigError::Io(err) => write!(f, "failed to read config file: {err}"),
            SearchConfigError::Yaml(err) => write!(f, "failed to parse config YAML: {err}"),
            SearchConfigError::Invalid(err) => write!(f, "invalid search config: {err}"),
        }
    }
}

impl std::error::Error for SearchConfigError {}

/// Per-iteration metrics emitted by MCTS.
#[derive(Debug, Clone, Copy)]
pub struct IterationMetrics {
    pub leaf: NodeId,
    pub path_len: usize,
    pub expanded: bool,
    pub rollout_return: f64,
}

/// Aggregate metrics for a complete search run.
#[derive(Debug, Clone)]
pub struct RunMetrics {
    pub iterations_requested: usize,
    pub iterations_completed: usize,
    pub rollout_return_sum: f64,
    pub average_rollout_return: f64,
}

impl RunMetrics {
    pub fn new(iterations_requested: usize) -> Self {
        RunMetrics {
            iterations_requested,
            iterations_completed: 0,
            rollout_return_sum: 0.0,
            average_rollout_return: 0.0,
        }
    }

    pub fn record(&mut self, metrics: &IterationMetrics) {
        self.iterations_completed += 1;
        self.rollout_return_sum += metrics.rollout_return;
        self.average_rollout_return =
            self.rollout_return_sum / self.iterations_completed as f64;
    }
}

impl<S: Clone> Tree<S> {
    /// Execute one complete MCTS iteration: selection/expansion, rollout, backpropagation.
    pub fn iterate<FNum, FStep, FPolicy>(
        &mut self,
        config: &SearchConfig,
        num_actions: &mut FNum,
        step: &mut FStep,
        rollout_policy: &mut FPolicy,
    ) -> Result<IterationMetrics, TreeError>
    where
        FNum: FnMut(&S) -> usize,
        FStep: FnMut(&S, ActionId) -> (S, f64),
        FPolicy: FnMut(&S, usize) -> ActionId,
    {
        let policy_result = self.tree_policy(config.exploration, &mut *num_actions, &mut *step)?;
        let leaf_state = self.node(policy_result.leaf)?.state().clone();
        let rollout_return = rollout(
            &leaf_state,
            &mut *num_actions,
            &mut *step,
            &mut *rollout_policy,
            config.rollout_params(),
        )?;

        self.backpropagate(policy_result.leaf, rollout_return)?;

        Ok(IterationMetrics {
            leaf: policy_result.leaf,
            path_len: policy_result.path.len(),
            expanded: policy_result.expanded,
            rollout_return,
        })
    }

    /// Run MCTS for `config.iterations`, collecting aggregate metrics.
    pub fn run<FNum, FStep, FPolicy>(
        &mut self,
        config: &SearchConfig,
        num_actions: FNum,
        step: FStep,
        rollout_policy: FPolicy,
    ) -> Result<RunMetrics, TreeError>
    where
        FNum: FnMut(&S) -> usize,
        FStep: FnMut(&S, ActionId) -> (S, f64),
        FPolicy: FnMut(&S, usize) -> ActionId,
    {
        self.run_with_hook(config, num_actions, step, rollout_policy, |_| {
            ControlFlow::Continue(())
        })
    }

    /// Run MCTS and invoke a callback after each completed iteration.
    /// The run stops early when the callback returns `ControlFlow::Break`.
    pub fn run_with_hook<FNum, FStep, FPolicy, FHook>(
        &mut self,
        config: &SearchConfig,
        mut num_actions: FNum,
        mut step: FStep,
        mut rollout_policy: FPolicy,
        mut on_iteration: FHook,
    ) -> Result<RunMetrics, TreeError>
    where
        FNum: FnMut(&S) -> usize,
        FStep: FnMut(&S, ActionId) -> (S, f64),
        FPolicy: FnMut(&S, usize) -> ActionId,
        FHook: FnMut(&IterationMetrics) -> ControlFlow<()>,
    {
        let mut metrics = RunMetrics::new(config.iterations);

        for _ in 0..config.iterations {
            let iteration_metrics =
                self.iterate(config, &mut num_actions, &mut step, &mut rollout_policy)?;

            metrics.record(&iteration_metrics);
            if on_iteration(&iteration_metrics).is_break() {
                break;
            }
        }

        Ok(metrics)
    }
}
