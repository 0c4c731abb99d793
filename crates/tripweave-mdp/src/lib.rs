//! Travel-planning MDP with a seeded simulator, an MCTS planner adapter and
//! a tabular Q-learning agent.

mod cancel;
mod domain;
mod error;
pub mod io;
mod learning;
mod model;
mod planner;
mod simulator;
mod state;

pub use cancel::CancelToken;
pub use domain::MdpDomain;
pub use error::MdpError;
pub use learning::{
    AgentStats, Episode, EpisodeStep, LearningConfig, QLearningAgent, QTable, STATS_WINDOW,
    TrainingSummary,
};
pub use model::{CROWD_JITTER, Effect, RewardWeights, TravelModel, WEATHER_JITTER};
pub use planner::{ActionStats, MctsPlanner, PlanOutcome};
pub use simulator::{MdpSimulator, TransitionRecord, unix_millis};
pub use state::{Action, DEFAULT_LOCATION, MAX_CROWD, MAX_SATISFACTION, MdpState};
