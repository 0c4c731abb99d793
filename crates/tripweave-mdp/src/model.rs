use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    MdpError,
    state::{Action, MAX_CROWD, MAX_SATISFACTION, MdpState},
};

/// Half-width of the uniform noise added to weather after every transition.
pub const WEATHER_JITTER: f64 = 0.05;
/// Half-width of the uniform noise added to crowd level after every transition.
pub const CROWD_JITTER: f64 = 5.0;

/// Weights of the four reward terms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardWeights {
    pub satisfaction: f64,
    pub budget: f64,
    pub weather: f64,
    pub crowd: f64,
}

impl Default for RewardWeights {
    fn default() -> Self {
        RewardWeights {
            satisfaction: 0.4,
            budget: 0.3,
            weather: 0.2,
            crowd: 0.1,
        }
    }
}

impl RewardWeights {
    pub fn validate(&self) -> Result<(), MdpError> {
        let all = [self.satisfaction, self.budget, self.weather, self.crowd];
        if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(MdpError::InvalidConfig(
                "reward weights must be finite and >= 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Deterministic part of an action: the delta it adds to a state.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Effect {
    pub days: u32,
    pub budget: f64,
    pub weather: f64,
    pub crowd: f64,
    pub satisfaction: f64,
}

impl Action {
    pub fn effect(self) -> Effect {
        match self {
            Action::KeepPlan => Effect {
                days: 1,
                ..Effect::default()
            },
            Action::SwapActivity => Effect {
                satisfaction: 0.2,
                ..Effect::default()
            },
            Action::ChangeTransport => Effect {
                budget: -500.0,
                satisfaction: 0.1,
                ..Effect::default()
            },
            Action::ReorderDestinations => Effect {
                weather: 0.1,
                ..Effect::default()
            },
            Action::AdjustBudget => Effect {
                budget: 200.0,
                ..Effect::default()
            },
            Action::AddContingency => Effect {
                budget: -300.0,
                crowd: -10.0,
                ..Effect::default()
            },
            Action::RemoveActivity => Effect {
                budget: 400.0,
                satisfaction: -0.3,
                ..Effect::default()
            },
        }
    }
}

/// Reward function, transition model and heuristic policy for one trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelModel {
    weights: RewardWeights,
    total_budget: f64,
}

impl TravelModel {
    pub fn new(total_budget: f64) -> Self {
        Self::with_weights(total_budget, RewardWeights::default())
    }

    pub fn with_weights(total_budget: f64, weights: RewardWeights) -> Self {
        TravelModel {
            weights,
            total_budget,
        }
    }

    pub fn weights(&self) -> RewardWeights {
        self.weights
    }

    pub fn total_budget(&self) -> f64 {
        self.total_budget
    }

    /// Score a state in `[-1, 1]`.
    ///
    /// Crowding is subtracted as a penalty. The budget term peaks when half of the total budget remains and is zero
    /// when the total budget is not positive. The action does not change the
    /// score; it is part of the signature so callers can score `(s, a)` pairs.
    pub fn reward(&self, state: &MdpState, _action: Action) -> f64 {
        let satisfaction = state.user_satisfaction / MAX_SATISFACTION;
        let budget = if self.total_budget > 0.0 {
            let half = 0.5 * self.total_budget;
            1.0 - (state.remaining_budget - half).abs() / half
        } else {
            0.0
        };
        let weather = state.weather_probability;
        let crowd_penalty = state.crowd_level / MAX_CROWD;

        let score = self.weights.satisfaction * satisfaction
            + self.weights.budget * budget
            + self.weights.weather * weather
            - self.weights.crowd * crowd_penalty;
        if score.is_nan() {
            return 0.0;
        }
        score.clamp(-1.0, 1.0)
    }

    /// Apply the deterministic effect of `action`, then clamp.
    pub fn apply_effect(&self, state: &MdpState, action: Action) -> MdpState {
        let effect = action.effect();
        MdpState {
            current_day: state.current_day.saturating_add(effect.days),
            current_location: state.current_location.clone(),
            remaining_budget: state.remaining_budget + effect.budget,
            weather_probability: state.weather_probability + effect.weather,
            crowd_level: state.crowd_level + effect.crowd,
            user_satisfaction: state.user_satisfaction + effect.satisfaction,
        }
        .clamped()
    }

    /// Add uniform noise to weather and crowd, then clamp.
    pub fn jitter<R: Rng + ?Sized>(&self, mut state: MdpState, rng: &mut R) -> MdpState {
        state.weather_probability += rng.gen_range(-WEATHER_JITTER..WEATHER_JITTER);
        state.crowd_level += rng.gen_range(-CROWD_JITTER..CROWD_JITTER);
        state.clamped()
    }

    /// Sample the successor of `(state, action)`.
    pub fn transition<R: Rng + ?Sized>(
        &self,
        state: &MdpState,
        action: Action,
        rng: &mut R,
    ) -> MdpState {
        let next = self.apply_effect(state, action);
        self.jitter(next, rng)
    }

    /// Sample a successor and score it.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        state: &MdpState,
        action: Action,
        rng: &mut R,
    ) -> (MdpState, f64) {
        let next = self.transition(state, action, rng);
        let reward = self.reward(&next, action);
        (next, reward)
    }

    /// Rule-based fallback policy. Rules are checked in priority order.
    pub fn best_action(&self, state: &MdpState) -> Action {
        if state.remaining_budget < 0.2 * self.total_budget {
            Action::AdjustBudget
        } else if state.weather_probability < 0.5 {
            Action::ReorderDestinations
        } else if state.crowd_level > 80.0 {
            Action::AddContingency
        } else if state.user_satisfaction < 3.5 {
            Action::SwapActivity
        } else {
            Action::KeepPlan
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn model() -> TravelModel {
        TravelModel::new(15_000.0)
    }

    #[test]
    fn default_state_reward_matches_weighted_terms() {
        let state = MdpState::default();
        let expected = 0.4 * (4.2 / 5.0) + 0.3 * (1.0 - 7_500.0 / 7_500.0) + 0.2 * 0.8 - 0.1 * 0.65;
        assert!((model().reward(&state, Action::KeepPlan) - expected).abs() < 1e-12);
    }

    #[test]
    fn budget_term_peaks_at_half_budget() {
        let mut state = MdpState::default();
        state.remaining_budget = 7_500.0;
        let at_half = model().reward(&state, Action::KeepPlan);
        state.remaining_budget = 9_000.0;
        let above = model().reward(&state, Action::KeepPlan);
        assert!(at_half > above);
    }

    #[test]
    fn zero_total_budget_drops_budget_term() {
        let model = TravelModel::new(0.0);
        let state = MdpState::default();
        let expected = 0.4 * (4.2 / 5.0) + 0.2 * 0.8 - 0.1 * 0.65;
        assert!((model.reward(&state, Action::KeepPlan) - expected).abs() < 1e-12);
    }

    #[test]
    fn effects_match_action_table() {
        let model = model();
        let state = MdpState::default();

        let next = model.apply_effect(&state, Action::KeepPlan);
        assert_eq!(next.current_day, 2);

        let next = model.apply_effect(&state, Action::ChangeTransport);
        assert_eq!(next.remaining_budget, 14_500.0);
        assert!((next.user_satisfaction - 4.3).abs() < 1e-12);

        let next = model.apply_effect(&state, Action::AddContingency);
        assert_eq!(next.remaining_budget, 14_700.0);
        assert_eq!(next.crowd_level, 55.0);

        let next = model.apply_effect(&state, Action::RemoveActivity);
        assert_eq!(next.remaining_budget, 15_400.0);
        assert!((next.user_satisfaction - 3.9).abs() < 1e-12);
    }

    #[test]
    fn effects_clamp_at_bounds() {
        let model = model();
        let state = MdpState {
            remaining_budget: 100.0,
            weather_probability: 0.97,
            user_satisfaction: 4.9,
            ..MdpState::default()
        };

        assert_eq!(
            model.apply_effect(&state, Action::ChangeTransport).remaining_budget,
            0.0
        );
        assert_eq!(
            model
                .apply_effect(&state, Action::ReorderDestinations)
                .weather_probability,
            1.0
        );
        assert_eq!(
            model.apply_effect(&state, Action::SwapActivity).user_satisfaction,
            5.0
        );
    }

    #[test]
    fn jitter_stays_within_half_width() {
        let model = model();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let state = MdpState::default();
        for _ in 0..200 {
            let next = model.jitter(state.clone(), &mut rng);
            assert!((next.weather_probability - 0.8).abs() <= WEATHER_JITTER + 1e-9);
            assert!((next.crowd_level - 65.0).abs() <= CROWD_JITTER + 1e-9);
        }
    }

    #[test]
    fn heuristic_rules_follow_priority() {
        let model = model();
        let base = MdpState::default();
        assert_eq!(model.best_action(&base), Action::KeepPlan);

        let low_budget = MdpState {
            remaining_budget: 1_000.0,
            weather_probability: 0.2,
            ..base.clone()
        };
        assert_eq!(model.best_action(&low_budget), Action::AdjustBudget);

        let rainy = MdpState {
            weather_probability: 0.3,
            crowd_level: 95.0,
            ..base.clone()
        };
        assert_eq!(model.best_action(&rainy), Action::ReorderDestinations);

        let crowded = MdpState {
            crowd_level: 85.0,
            ..base.clone()
        };
        assert_eq!(model.best_action(&crowded), Action::AddContingency);

        let bored = MdpState {
            user_satisfaction: 3.0,
            ..base
        };
        assert_eq!(model.best_action(&bored), Action::SwapActivity);
    }
}
