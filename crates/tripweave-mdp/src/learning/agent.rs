use std::collections::VecDeque;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    Action, CancelToken, MdpSimulator, MdpState,
    learning::{config::LearningConfig, q_table::QTable},
};

/// Rewards averaged by [`QLearningAgent::stats`].
pub const STATS_WINDOW: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeStep {
    pub state: MdpState,
    pub action: Action,
    pub reward: f64,
    pub next_state: MdpState,
    /// Q-value of `(state, action)` right after the update.
    pub q_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub number: u64,
    pub steps: Vec<EpisodeStep>,
    pub total_reward: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentStats {
    pub episodes: u64,
    pub epsilon: f64,
    pub table_size: usize,
    /// Mean total reward over the most recent episodes.
    pub avg_reward: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingSummary {
    pub episodes_requested: usize,
    pub episodes_completed: usize,
    pub cancelled: bool,
    pub final_epsilon: f64,
    pub mean_reward: f64,
}

/// Epsilon-greedy tabular Q-learning over the travel MDP.
#[derive(Debug, Clone)]
pub struct QLearningAgent {
    config: LearningConfig,
    table: QTable,
    epsilon: f64,
    episode_count: u64,
    episodes: VecDeque<Episode>,
    reward_history: VecDeque<f64>,
}

impl Default for QLearningAgent {
    fn default() -> Self {
        Self::new(LearningConfig::default())
    }
}

impl QLearningAgent {
    pub fn new(config: LearningConfig) -> Self {
        QLearningAgent {
            table: QTable::new(config.max_table_states),
            epsilon: config.epsilon,
            episode_count: 0,
            episodes: VecDeque::new(),
            reward_history: VecDeque::new(),
            config,
        }
    }

    pub fn config(&self) -> &LearningConfig {
        &self.config
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn episode_count(&self) -> u64 {
        self.episode_count
    }

    pub fn table(&self) -> &QTable {
        &self.table
    }

    pub fn q_value(&self, state: &MdpState, action: Action) -> f64 {
        self.table.get(state, action)
    }

    /// With probability epsilon a uniformly random action, otherwise greedy.
    pub fn select_action<R: Rng + ?Sized>(&self, state: &MdpState, rng: &mut R) -> Action {
        if rng.gen_range(0.0..1.0) < self.epsilon {
            Action::ALL[rng.gen_range(0..Action::COUNT)]
        } else {
            self.best_action(state)
        }
    }

    /// Greedy action; unseen states return `keep_plan`.
    pub fn best_action(&self, state: &MdpState) -> Action {
        self.table.best_action(state)
    }

    /// One-step Q-learning update. Returns the new `Q(state, action)`.
    pub fn update(
        &mut self,
        state: &MdpState,
        action: Action,
        reward: f64,
        next_state: &MdpState,
    ) -> f64 {
        let current = self.table.get(state, action);
        let target = reward + self.config.discount * self.table.max_value(next_state);
        let value = current + self.config.learning_rate * (target - current);
        self.table.set(state, action, value);
        value
    }

    pub fn is_terminal(&self, state: &MdpState) -> bool {
        state.current_day >= self.config.terminal_day || state.remaining_budget <= 0.0
    }

    /// Run one episode starting from the simulator's live state.
    ///
    /// Every step goes through [`MdpSimulator::step`], so the simulator's
    /// state and history advance with the episode.
    pub fn run_episode(&mut self, sim: &mut MdpSimulator) -> Episode {
        let mut state = sim.current_state().clone();
        let mut steps = Vec::new();
        let mut total_reward = 0.0;

        for _ in 0..self.config.max_steps {
            let action = self.select_action(&state, sim.rng_mut());
            let record = sim.step(action);
            let q_value = self.update(&state, action, record.reward, &record.next_state);
            total_reward += record.reward;

            steps.push(EpisodeStep {
                state,
                action,
                reward: record.reward,
                next_state: record.next_state.clone(),
                q_value,
            });
            state = record.next_state;

            if self.is_terminal(&state) {
                break;
            }
        }

        let episode = Episode {
            number: self.episode_count,
            steps,
            total_reward,
        };
        self.episode_count += 1;
        self.push_history(episode.clone());

        tracing::debug!(
            target: "tripweave::learning",
            episode = episode.number,
            steps = episode.steps.len(),
            total_reward,
            "episode finished"
        );
        episode
    }

    /// Multiply epsilon by the decay factor, never going below the floor.
    pub fn decay_epsilon(&mut self) {
        self.epsilon = (self.epsilon * self.config.epsilon_decay).max(self.config.min_epsilon);
    }

    /// Run up to `episodes` episodes in sequence, decaying epsilon after each.
    /// The token is checked before every episode.
    pub fn train(
        &mut self,
        sim: &mut MdpSimulator,
        episodes: usize,
        cancel: &CancelToken,
    ) -> TrainingSummary {
        let mut completed = 0;
        let mut reward_sum = 0.0;
        let mut cancelled = false;

        for _ in 0..episodes {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            let episode = self.run_episode(sim);
            reward_sum += episode.total_reward;
            completed += 1;
            self.decay_epsilon();
        }

        let summary = TrainingSummary {
            episodes_requested: episodes,
            episodes_completed: completed,
            cancelled,
            final_epsilon: self.epsilon,
            mean_reward: if completed > 0 {
                reward_sum / completed as f64
            } else {
                0.0
            },
        };
        tracing::info!(
            target: "tripweave::learning",
            completed,
            cancelled,
            epsilon = self.epsilon,
            table_size = self.table.len(),
            "training finished"
        );
        summary
    }

    /// Greedy action for every state in the table, in insertion order.
    pub fn policy(&self) -> Vec<(MdpState, Action)> {
        self.table
            .states()
            .map(|state| (state.clone(), self.table.best_action(state)))
            .collect()
    }

    pub fn episodes(&self) -> impl ExactSizeIterator<Item = &Episode> {
        self.episodes.iter()
    }

    /// Total reward of each retained episode, oldest first.
    pub fn reward_history(&self) -> Vec<f64> {
        self.reward_history.iter().copied().collect()
    }

    /// Running sum of [`QLearningAgent::reward_history`].
    pub fn cumulative_rewards(&self) -> Vec<f64> {
        self.reward_history
            .iter()
            .scan(0.0, |sum, reward| {
                *sum += reward;
                Some(*sum)
            })
            .collect()
    }

    pub fn stats(&self) -> AgentStats {
        let window = self.reward_history.len().min(STATS_WINDOW);
        let avg_reward = if window == 0 {
            0.0
        } else {
            self.reward_history.iter().rev().take(window).sum::<f64>() / window as f64
        };
        AgentStats {
            episodes: self.episode_count,
            epsilon: self.epsilon,
            table_size: self.table.len(),
            avg_reward,
        }
    }

    /// Forget learned values and history; epsilon returns to its initial value.
    pub fn reset(&mut self) {
        *self = QLearningAgent::new(self.config.clone());
    }

    fn push_history(&mut self, episode: Episode) {
        self.reward_history.push_back(episode.total_reward);
        self.episodes.push_back(episode);
        if let Some(limit) = self.config.history_limit {
            while self.episodes.len() > limit {
                self.episodes.pop_front();
            }
            while self.reward_history.len() > limit {
                self.reward_history.pop_front();
            }
        }
    }
}
