use std::fmt;

use crate::tree::ids::{ActionId, NodeId};

/// Error type for MCTS tree construction and search operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// Attempted to access a node id that does not exist in the arena.
    MissingNode { node_id: NodeId },
    /// Attempted to expand a node that already has children.
    AlreadyExpanded { node_id: NodeId },
    /// Selection stopped on a node with children but picked none of them.
    ChildSelectionFailed { node_id: NodeId },
    /// Rollout policy returned an action outside `[0, num_actions)`.
    InvalidRolloutAction {
        action_id: ActionId,
        num_actions: usize,
    },
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::MissingNode { node_id } => {
                write!(f, "missing node with id {}", node_id.index())
            }
            TreeError::AlreadyExpanded { node_id } => {
                write!(f, "node {} is already expanded", node_id.index())
            }
            TreeError::ChildSelectionFailed { node_id } => {
                write!(f, "failed to select a child of node {}", node_id.index())
            }
            TreeError::InvalidRolloutAction {
                action_id,
                num_actions,
            } => write!(
                f,
                "rollout policy selected invalid action {} with {} actions available",
                action_id.index(),
                num_actions
            ),
        }
    }
}

impl std::error::Error for TreeError {}
