use std::{
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use tripweave_core::ActionId;

use crate::MdpError;

pub const DEFAULT_LOCATION: &str = "Jaipur";
pub const MAX_SATISFACTION: f64 = 5.0;
pub const MAX_CROWD: f64 = 100.0;

/// Snapshot of trip progress as seen by the planners.
///
/// Missing fields fall back to the default state when deserialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MdpState {
    pub current_day: u32,
    pub current_location: String,
    pub remaining_budget: f64,
    /// Probability of good weather in `[0, 1]`.
    pub weather_probability: f64,
    /// Crowd level in `[0, 100]`.
    pub crowd_level: f64,
    /// Satisfaction score in `[0, 5]`.
    pub user_satisfaction: f64,
}

impl Default for MdpState {
    fn default() -> Self {
        MdpState {
            current_day: 1,
            current_location: DEFAULT_LOCATION.to_string(),
            remaining_budget: 15_000.0,
            weather_probability: 0.8,
            crowd_level: 65.0,
            user_satisfaction: 4.2,
        }
    }
}

impl MdpState {
    /// Default state with a different starting budget.
    pub fn with_budget(remaining_budget: f64) -> Self {
        MdpState {
            remaining_budget,
            ..MdpState::default()
        }
    }

    /// Force every numeric field back into its valid range.
    /// NaN collapses to the lower bound.
    pub fn clamped(mut self) -> Self {
        self.current_day = self.current_day.max(1);
        self.remaining_budget = clamp_or_low(self.remaining_budget, 0.0, f64::INFINITY);
        self.weather_probability = clamp_or_low(self.weather_probability, 0.0, 1.0);
        self.crowd_level = clamp_or_low(self.crowd_level, 0.0, MAX_CROWD);
        self.user_satisfaction = clamp_or_low(self.user_satisfaction, 0.0, MAX_SATISFACTION);
        self
    }

    /// Whether every field already sits inside its valid range.
    pub fn is_valid(&self) -> bool {
        self.current_day >= 1
            && self.remaining_budget >= 0.0
            && (0.0..=1.0).contains(&self.weather_probability)
            && (0.0..=MAX_CROWD).contains(&self.crowd_level)
            && (0.0..=MAX_SATISFACTION).contains(&self.user_satisfaction)
    }

    fn key(&self) -> (u32, &str, [u64; 4]) {
        (
            self.current_day,
            self.current_location.as_str(),
            [
                self.remaining_budget.to_bits(),
                self.weather_probability.to_bits(),
                self.crowd_level.to_bits(),
                self.user_satisfaction.to_bits(),
            ],
        )
    }
}

fn clamp_or_low(value: f64, low: f64, high: f64) -> f64 {
    if value.is_nan() {
        low
    } else {
        value.clamp(low, high)
    }
}

// Bitwise equality so states can key the Q-table.
impl PartialEq for MdpState {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for MdpState {}

impl Hash for MdpState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

/// The seven plan adjustments available in every state.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    #[default]
    KeepPlan,
    SwapActivity,
    ChangeTransport,
    ReorderDestinations,
    AdjustBudget,
    AddContingency,
    RemoveActivity,
}

impl Action {
    pub const COUNT: usize = 7;

    /// Every action in canonical order. Tie-breaks follow this order.
    pub const ALL: [Action; Action::COUNT] = [
        Action::KeepPlan,
        Action::SwapActivity,
        Action::ChangeTransport,
        Action::ReorderDestinations,
        Action::AdjustBudget,
        Action::AddContingency,
        Action::RemoveActivity,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Action> {
        Action::ALL.get(index).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Action::KeepPlan => "keep_plan",
            Action::SwapActivity => "swap_activity",
            Action::ChangeTransport => "change_transport",
            Action::ReorderDestinations => "reorder_destinations",
            Action::AdjustBudget => "adjust_budget",
            Action::AddContingency => "add_contingency",
            Action::RemoveActivity => "remove_activity",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = MdpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| MdpError::UnknownAction {
                name: s.to_string(),
            })
    }
}

impl From<Action> for ActionId {
    fn from(action: Action) -> Self {
        ActionId::from(action.index())
    }
}

impl TryFrom<ActionId> for Action {
    type Error = MdpError;

    fn try_from(action_id: ActionId) -> Result<Self, Self::Error> {
        Action::from_index(action_id.index()).ok_or(MdpError::ActionOutOfRange {
            index: action_id.index(),
        })
    }
}
