use std::collections::VecDeque;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Action, MdpState, TravelModel};

/// One applied transition, as recorded in the simulator history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRecord {
    pub state: MdpState,
    pub action: Action,
    pub next_state: MdpState,
    pub reward: f64,
    /// Unix time in milliseconds.
    pub timestamp: i64,
}

/// Milliseconds since the Unix epoch.
pub fn unix_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

#[derive(Debug, Clone)]
/// Seeded simulator that owns the live trip state and its transition history.
pub struct MdpSimulator {
    model: TravelModel,
    current: MdpState,
    history: VecDeque<TransitionRecord>,
    history_limit: Option<usize>,
    rng: ChaCha8Rng,
}

impl MdpSimulator {
    /// Create a simulator with deterministic RNG seed.
    pub fn new(model: TravelModel, start: MdpState, seed: u64) -> Self {
        Self {
            model,
            current: start.clamped(),
            history: VecDeque::new(),
            history_limit: None,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Keep at most `limit` history records, dropping the oldest first.
    pub fn with_history_limit(mut self, limit: Option<usize>) -> Self {
        self.history_limit = limit;
        self.trim_history();
        self
    }

    pub fn model(&self) -> &TravelModel {
        &self.model
    }

    /// Rescale the reward and heuristics to a new trip total, keeping the
    /// weights and the live state.
    pub fn set_total_budget(&mut self, total_budget: f64) {
        self.model = TravelModel::with_weights(total_budget, self.model.weights());
    }

    pub fn current_state(&self) -> &MdpState {
        &self.current
    }

    /// Replace the live state, clamping it into range.
    pub fn set_current_state(&mut self, state: MdpState) {
        self.current = state.clamped();
    }

    pub fn history(&self) -> impl ExactSizeIterator<Item = &TransitionRecord> {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn rng_mut(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    /// Apply `action` to the live state, score the resulting state and
    /// append the transition to history.
    pub fn step(&mut self, action: Action) -> TransitionRecord {
        let (next_state, reward) = self.model.sample(&self.current, action, &mut self.rng);
        let record = TransitionRecord {
            state: self.current.clone(),
            action,
            next_state: next_state.clone(),
            reward,
            timestamp: unix_millis(),
        };

        tracing::trace!(
            target: "tripweave::mdp",
            action = %action,
            reward,
            day = next_state.current_day,
            "transition applied"
        );

        self.current = next_state;
        self.history.push_back(record.clone());
        self.trim_history();
        record
    }

    fn trim_history(&mut self) {
        if let Some(limit) = self.history_limit {
            while self.history.len() > limit {
                self.history.pop_front();
            }
        }
    }
}
