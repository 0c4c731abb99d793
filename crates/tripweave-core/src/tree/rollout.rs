use serde::{Deserialize, Serialize};

use crate::tree::{error::TreeError, ids::ActionId};

/// Controls how rollout rewards are aggregated into a return.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnType {
    /// Sum raw rewards over the whole rollout.
    #[default]
    Undiscounted,
    /// Sum rewards discounted by `gamma` per step.
    Discounted,
}

/// Rollout parameters controlling return shape and length.
#[derive(Debug, Clone, Copy)]
pub struct RolloutParams {
    pub return_type: ReturnType,
    pub gamma: f64,
    pub steps: usize,
}

/// Run a default-policy rollout of at most `params.steps` steps from `start`.
///
/// The environment interface stays generic and only needs:
/// - `num_actions(state) -> usize`
/// - `step(state, action_id) -> (next_state, reward)`
/// - `rollout_policy(state, num_actions) -> action_id`
///
/// A state with no actions ends the rollout early.
pub fn rollout<S, FNum, FStep, FPolicy>(
    start: &S,
    mut num_actions: FNum,
    mut step: FStep,
    mut rollout_policy: FPolicy,
    params: RolloutParams,
) -> Result<f64, TreeError>
where
    S: Clone,
    FNum: FnMut(&S) -> usize,
    FStep: FnMut(&S, ActionId) -> (S, f64),
    FPolicy: FnMut(&S, usize) -> ActionId,
{
    let mut state = start.clone();
    let mut total_return = 0.0;
    let mut discount = 1.0;

    for _ in 0..params.steps {
        let action_count = num_actions(&state);
        if action_count == 0 {
            break;
        }

        let action_id = rollout_policy(&state, action_count);
        if action_id.index() >= action_count {
            return Err(TreeError::InvalidRolloutAction {
                action_id,
                num_actions: action_count,
            });
        }

        let (next_state, reward) = step(&state, action_id);
        match params.return_type {
            ReturnType::Undiscounted => total_return += reward,
            ReturnType::Discounted => {
                total_return += discount * reward;
                discount *= params.gamma;
            }
        }
        state = next_state;
    }

    Ok(total_return)
}
