use thiserror::Error;
use tripweave_bayes::BayesError;
use tripweave_mdp::MdpError;

use crate::AgentStage;

#[derive(Debug, Error)]
/// Error type for itinerary generation, session setup and snapshots.
pub enum SessionError {
    #[error("invalid trip input: {0}")]
    InvalidInput(String),

    #[error("invalid session config: {0}")]
    InvalidConfig(String),

    #[error("cancelled before the {stage} stage")]
    Cancelled { stage: AgentStage },

    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to encode or decode snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Mdp(#[from] MdpError),

    #[error(transparent)]
    Bayes(#[from] BayesError),
}
