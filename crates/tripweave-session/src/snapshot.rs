use std::collections::BTreeMap;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use tripweave_bayes::BetaBelief;

use crate::{BudgetRecord, Itinerary, SessionError};

/// A saved preference: either full Beta parameters or a bare probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SavedPreference {
    Probability(f64),
    Belief {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alpha: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        beta: Option<f64>,
    },
}

impl From<BetaBelief> for SavedPreference {
    fn from(belief: BetaBelief) -> Self {
        SavedPreference::Belief {
            alpha: Some(belief.alpha),
            beta: Some(belief.beta),
        }
    }
}

impl SavedPreference {
    /// Turn the saved value into a belief, filling gaps from `prior`.
    ///
    /// A bare probability keeps the prior's strength `alpha + beta`.
    pub fn to_belief(self, prior: BetaBelief) -> BetaBelief {
        match self {
            SavedPreference::Probability(p) => {
                let strength = prior.alpha + prior.beta;
                BetaBelief {
                    alpha: p * strength,
                    beta: (1.0 - p) * strength,
                }
            }
            SavedPreference::Belief { alpha, beta } => BetaBelief {
                alpha: alpha.unwrap_or(prior.alpha),
                beta: beta.unwrap_or(prior.beta),
            },
        }
    }
}

/// Persisted session state. Every field is optional on restore.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionSnapshot {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub preferences: BTreeMap<String, SavedPreference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<BudgetRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persona: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_itinerary: Option<Itinerary>,
}

impl SessionSnapshot {
    pub fn to_json(&self) -> Result<String, SessionError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse saved JSON. Only text that is not JSON at all is an error;
    /// fields with the wrong shape are logged and left out.
    pub fn from_json(json: &str) -> Result<Self, SessionError> {
        let value: Value = serde_json::from_str(json)?;
        Ok(Self::from_value(&value))
    }

    pub fn from_value(value: &Value) -> Self {
        let preferences = value
            .get("preferences")
            .and_then(Value::as_object)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|(category, saved)| {
                        field::<SavedPreference>(saved, category).map(|p| (category.clone(), p))
                    })
                    .collect()
            })
            .unwrap_or_default();

        SessionSnapshot {
            preferences,
            budget: value
                .get("budget")
                .and_then(|v| field::<BudgetRecord>(v, "budget")),
            persona: value
                .get("persona")
                .and_then(|v| field::<String>(v, "persona")),
            theme: value.get("theme").and_then(|v| field::<String>(v, "theme")),
            current_itinerary: value
                .get("currentItinerary")
                .and_then(|v| field::<Itinerary>(v, "currentItinerary")),
        }
    }
}

fn field<T: DeserializeOwned>(value: &Value, name: &str) -> Option<T> {
    if value.is_null() {
        return None;
    }
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            tracing::warn!(
                target: "tripweave::snapshot",
                field = name,
                error = %err,
                "ignoring unreadable snapshot field"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn probability_keeps_prior_strength() {
        let prior = BetaBelief {
            alpha: 1.0,
            beta: 3.0,
        };
        let belief = SavedPreference::Probability(0.75).to_belief(prior);
        assert_eq!(belief, BetaBelief { alpha: 3.0, beta: 1.0 });
    }

    #[test]
    fn partial_belief_fills_from_prior() {
        let prior = BetaBelief {
            alpha: 2.0,
            beta: 2.0,
        };
        let saved: SavedPreference = serde_json::from_value(json!({"alpha": 5.0})).expect("json");
        assert_eq!(saved.to_belief(prior), BetaBelief { alpha: 5.0, beta: 2.0 });
    }

    #[test]
    fn bad_fields_are_dropped_individually() {
        let snapshot = SessionSnapshot::from_value(&json!({
            "preferences": {"cultural": {"alpha": 4, "beta": 1}, "food": "lots"},
            "budget": "unknown",
            "persona": 5,
            "theme": "dark",
            "currentItinerary": null
        }));

        assert_eq!(snapshot.preferences.len(), 1);
        assert!(snapshot.preferences.contains_key("cultural"));
        assert_eq!(snapshot.budget, None);
        assert_eq!(snapshot.persona, None);
        assert_eq!(snapshot.theme.as_deref(), Some("dark"));
        assert_eq!(snapshot.current_itinerary, None);
    }

    #[test]
    fn non_object_json_restores_nothing() {
        let snapshot = SessionSnapshot::from_json("[1, 2, 3]").expect("valid json");
        assert_eq!(snapshot, SessionSnapshot::default());
        assert!(SessionSnapshot::from_json("not json").is_err());
    }

    #[test]
    fn empty_snapshot_serializes_to_empty_object() {
        let json = SessionSnapshot::default().to_json().expect("json");
        assert_eq!(json, "{}");
    }
}
