mod agent;
mod config;
mod q_table;

pub use agent::{AgentStats, Episode, EpisodeStep, QLearningAgent, STATS_WINDOW, TrainingSummary};
pub use config::LearningConfig;
pub use q_table::QTable;
