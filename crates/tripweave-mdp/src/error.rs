use thiserror::Error;
use tripweave_core::{SearchConfigError, TreeError};

#[derive(Debug, Error)]
/// Error type for config loading, action parsing and planner runs.
pub enum MdpError {
    #[error("failed to read or write file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid learning config: {0}")]
    InvalidConfig(String),

    #[error("unknown action '{name}'")]
    UnknownAction { name: String },

    #[error("action index {index} is out of range")]
    ActionOutOfRange { index: usize },

    #[error("search config rejected: {0}")]
    SearchConfig(#[from] SearchConfigError),

    #[error("tree search failed: {0}")]
    Search(#[from] TreeError),
}
