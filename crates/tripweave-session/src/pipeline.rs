//! The agent stages run by [`crate::Session::generate_itinerary`] and the
//! records they leave behind.

use std::{collections::BTreeSet, fmt};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tripweave_bayes::{Category, PreferenceModel, WeatherPrediction, predict_weather};
use tripweave_mdp::{Action, CancelToken, MdpState, PlanOutcome, unix_millis};

use crate::{BudgetRecord, Catalog, CrowdTag, Itinerary, SessionError, TripParams};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStage {
    Preference,
    Weather,
    Crowd,
    Budget,
    Planner,
    Booking,
    Explainability,
}

impl AgentStage {
    /// Stages of a full generation, in execution order.
    pub const ALL: [AgentStage; 7] = [
        AgentStage::Preference,
        AgentStage::Weather,
        AgentStage::Crowd,
        AgentStage::Budget,
        AgentStage::Planner,
        AgentStage::Booking,
        AgentStage::Explainability,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AgentStage::Preference => "preference",
            AgentStage::Weather => "weather",
            AgentStage::Crowd => "crowd",
            AgentStage::Budget => "budget",
            AgentStage::Planner => "planner",
            AgentStage::Booking => "booking",
            AgentStage::Explainability => "explainability",
        }
    }
}

impl fmt::Display for AgentStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageRecord {
    pub stage: AgentStage,
    pub started_at: i64,
    pub finished_at: i64,
}

/// Ordered log of completed stages.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StageTrace {
    records: Vec<StageRecord>,
}

impl StageTrace {
    pub fn records(&self) -> &[StageRecord] {
        &self.records
    }

    pub fn stages(&self) -> Vec<AgentStage> {
        self.records.iter().map(|r| r.stage).collect()
    }

    /// Run one stage unless the token is already cancelled.
    pub(crate) fn run<T>(
        &mut self,
        stage: AgentStage,
        cancel: &CancelToken,
        work: impl FnOnce() -> Result<T, SessionError>,
    ) -> Result<T, SessionError> {
        if cancel.is_cancelled() {
            tracing::warn!(target: "tripweave::pipeline", %stage, "cancelled before stage");
            return Err(SessionError::Cancelled { stage });
        }
        let started_at = unix_millis();
        let output = work()?;
        let finished_at = unix_millis();
        self.records.push(StageRecord {
            stage,
            started_at,
            finished_at,
        });
        tracing::debug!(
            target: "tripweave::pipeline",
            %stage,
            elapsed_ms = finished_at - started_at,
            "stage finished"
        );
        Ok(output)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RankedPreference {
    pub category: Category,
    pub probability: f64,
}

pub fn rank_preferences(model: &PreferenceModel) -> Vec<RankedPreference> {
    model
        .ranked()
        .into_iter()
        .map(|(category, probability)| RankedPreference {
            category,
            probability,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DayForecast {
    pub day: u32,
    pub prediction: WeatherPrediction,
}

pub fn forecast_days<R: Rng + ?Sized>(duration: u32, rng: &mut R) -> Vec<DayForecast> {
    (1..=duration)
        .map(|day| DayForecast {
            day,
            prediction: predict_weather(rng),
        })
        .collect()
}

/// Mean rain probability over the forecast, 0 when empty.
pub fn rain_outlook(forecast: &[DayForecast]) -> f64 {
    if forecast.is_empty() {
        return 0.0;
    }
    forecast
        .iter()
        .map(|f| f.prediction.predictions.rainy)
        .sum::<f64>()
        / forecast.len() as f64
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VenueCrowd {
    pub city: String,
    pub name: String,
    pub crowd: CrowdTag,
    pub penalty: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrowdReport {
    /// Mean venue crowd level on the 0..=100 scale.
    pub level: f64,
    pub venues: Vec<VenueCrowd>,
}

/// Crowd tags of every venue on the trip's route.
pub fn assess_crowds(catalog: &Catalog, destination: &str) -> CrowdReport {
    let mut cities: Vec<&str> = catalog
        .cities(destination)
        .map(|cities| cities.iter().map(|c| c.name.as_str()).collect())
        .unwrap_or_default();
    if cities.is_empty() {
        cities.push(catalog.default_city.as_str());
    }

    let mut seen = BTreeSet::new();
    let venues: Vec<VenueCrowd> = cities
        .into_iter()
        .filter(|city| seen.insert(*city))
        .flat_map(|city| {
            let activities = catalog
                .activities_for(city)
                .unwrap_or_else(|| catalog.default_activities());
            activities.iter().map(move |a| VenueCrowd {
                city: city.to_string(),
                name: a.name.clone(),
                crowd: a.crowd_level,
                penalty: a.crowd_level.penalty(),
            })
        })
        .collect();

    let level = if venues.is_empty() {
        MdpState::default().crowd_level
    } else {
        venues.iter().map(|v| v.crowd.level()).sum::<f64>() / venues.len() as f64
    };
    CrowdReport { level, venues }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BudgetSummary {
    pub total: f64,
    pub used: f64,
    pub remaining: f64,
}

/// Budget picture for a trip of `trip_budget` given spending so far.
pub fn summarize_budget(record: &BudgetRecord, trip_budget: f64) -> BudgetSummary {
    BudgetSummary {
        total: trip_budget,
        used: record.used,
        remaining: (trip_budget - record.used).max(0.0),
    }
}

/// Live state adjusted with the stage findings, used as the search root.
pub fn planning_root(
    live: &MdpState,
    rain: f64,
    crowd: &CrowdReport,
    budget: &BudgetSummary,
) -> MdpState {
    MdpState {
        weather_probability: 1.0 - rain,
        crowd_level: crowd.level,
        remaining_budget: budget.remaining,
        ..live.clone()
    }
    .clamped()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerDecision {
    pub root: MdpState,
    pub outcome: PlanOutcome<Action>,
    /// What the priority heuristic picks for the same root.
    pub heuristic: Action,
}

impl PlannerDecision {
    /// Fraction of root visits that went to the recommended action.
    pub fn visit_share(&self) -> f64 {
        let total: u64 = self.outcome.root_actions.iter().map(|s| s.visits).sum();
        if total == 0 {
            return 0.0;
        }
        let chosen: u64 = self
            .outcome
            .root_actions
            .iter()
            .filter(|s| s.action == self.outcome.action)
            .map(|s| s.visits)
            .sum();
        chosen as f64 / total as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stay {
    pub city: String,
    pub nights: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSummary {
    pub stays: Vec<Stay>,
    pub activity_count: usize,
    pub activities_cost: f64,
    pub within_budget: bool,
}

/// Consecutive days in one city collapse into a single stay.
pub fn summarize_bookings(itinerary: &Itinerary, budget: &BudgetSummary) -> BookingSummary {
    let mut stays: Vec<Stay> = Vec::new();
    for day in &itinerary.days {
        match stays.last_mut() {
            Some(stay) if stay.city == day.city => stay.nights += 1,
            _ => stays.push(Stay {
                city: day.city.clone(),
                nights: 1,
            }),
        }
    }
    BookingSummary {
        stays,
        activity_count: itinerary.activities().count(),
        activities_cost: itinerary.total_cost,
        within_budget: itinerary.total_cost <= budget.remaining,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Factor {
    pub name: String,
    /// In `[0, 1]`.
    pub impact: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    pub agent: String,
    pub reasoning: String,
    pub confidence: f64,
    pub factors: Vec<Factor>,
}

/// Inputs the explainability stage weighs.
pub struct ExplainInputs<'a> {
    pub params: &'a TripParams,
    pub preferences: &'a PreferenceModel,
    pub itinerary: &'a Itinerary,
    pub rain: f64,
    pub crowd: &'a CrowdReport,
    pub budget: &'a BudgetSummary,
    pub planner: &'a PlannerDecision,
}

pub fn explain(agent: &str, headline: &str, inputs: &ExplainInputs<'_>) -> Explanation {
    let requested = &inputs.params.preferences;
    let preference_fit = if requested.is_empty() {
        inputs
            .preferences
            .ranked()
            .first()
            .map(|(_, p)| *p)
            .unwrap_or(0.0)
    } else {
        requested
            .iter()
            .map(|c| inputs.preferences.probability(*c))
            .sum::<f64>()
            / requested.len() as f64
    };

    let cost = inputs.itinerary.total_cost;
    let budget_fit = if inputs.budget.total > 0.0 {
        (1.0 - cost / inputs.budget.total).clamp(0.0, 1.0)
    } else if cost > 0.0 {
        0.0
    } else {
        1.0
    };

    let factor = |name: &str, impact: f64| Factor {
        name: name.to_string(),
        impact: impact.clamp(0.0, 1.0),
    };
    let factors = vec![
        factor("User Preferences", preference_fit),
        factor("Budget Constraints", budget_fit),
        factor("Weather Conditions", 1.0 - inputs.rain),
        factor("Crowd Levels", 1.0 - inputs.crowd.level / 100.0),
    ];

    let mut route: Vec<&str> = Vec::new();
    for day in &inputs.itinerary.days {
        if route.last() != Some(&day.city.as_str()) {
            route.push(&day.city);
        }
    }
    let reasoning = format!(
        "{headline}: {} via {}; planner recommends {}, heuristic suggests {}",
        inputs.params.destination,
        route.join(" -> "),
        inputs.planner.outcome.action,
        inputs.planner.heuristic
    );

    Explanation {
        agent: agent.to_string(),
        reasoning,
        confidence: inputs.planner.visit_share(),
        factors,
    }
}

/// Why a trip is being planned again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplanReason {
    Weather,
    Budget,
    Crowd,
}

impl ReplanReason {
    /// The stage refreshed before planning again.
    pub fn stage(self) -> AgentStage {
        match self {
            ReplanReason::Weather => AgentStage::Weather,
            ReplanReason::Budget => AgentStage::Budget,
            ReplanReason::Crowd => AgentStage::Crowd,
        }
    }

    pub(crate) fn agent(self) -> &'static str {
        match self {
            ReplanReason::Weather => "Weather Risk",
            ReplanReason::Budget => "Budget Optimizer",
            ReplanReason::Crowd => "Crowd Analyzer",
        }
    }

    pub(crate) fn headline(self) -> &'static str {
        match self {
            ReplanReason::Weather => "Replanned due to adverse weather conditions",
            ReplanReason::Budget => "Adjusted itinerary to stay within budget",
            ReplanReason::Crowd => "Rescheduled to avoid peak hours",
        }
    }
}

#[cfg(test)]
mod tests {
    use tripweave_mdp::ActionStats;

    use super::*;
    use crate::assemble;

    fn catalog() -> Catalog {
        Catalog::from_default_yaml().expect("default catalog")
    }

    fn decision(stats: &[(Action, u64)], action: Action) -> PlannerDecision {
        PlannerDecision {
            root: MdpState::default(),
            outcome: PlanOutcome {
                action,
                iterations_requested: 10,
                iterations_completed: 10,
                cancelled: false,
                average_rollout_return: 0.0,
                root_actions: stats
                    .iter()
                    .map(|(action, visits)| ActionStats {
                        action: *action,
                        visits: *visits,
                        value_sum: 0.0,
                    })
                    .collect(),
            },
            heuristic: Action::KeepPlan,
        }
    }

    #[test]
    fn trace_stops_at_cancelled_stage() {
        let cancel = CancelToken::new();
        let mut trace = StageTrace::default();
        trace
            .run(AgentStage::Preference, &cancel, || Ok(()))
            .expect("first stage");
        cancel.cancel();
        let err = trace
            .run(AgentStage::Weather, &cancel, || Ok(()))
            .expect_err("cancelled");
        assert!(matches!(
            err,
            SessionError::Cancelled {
                stage: AgentStage::Weather
            }
        ));
        assert_eq!(trace.stages(), vec![AgentStage::Preference]);
    }

    #[test]
    fn crowd_report_covers_route_venues() {
        let report = assess_crowds(&catalog(), "Rajasthan, India");
        // Jaisalmer has no venues of its own and borrows Jaipur's five.
        assert_eq!(report.venues.len(), 5 + 3 + 3 + 5);
        assert!(report.level > 30.0 && report.level < 90.0);

        let fallback = assess_crowds(&catalog(), "Atlantis");
        assert_eq!(fallback.venues.len(), 5);
        assert!(fallback.venues.iter().all(|v| v.city == "Jaipur"));
    }

    #[test]
    fn planning_root_takes_stage_findings() {
        let crowd = CrowdReport {
            level: 70.0,
            venues: Vec::new(),
        };
        let budget = summarize_budget(&BudgetRecord::default(), 8_000.0);
        let root = planning_root(&MdpState::default(), 0.25, &crowd, &budget);
        assert_eq!(root.weather_probability, 0.75);
        assert_eq!(root.crowd_level, 70.0);
        assert_eq!(root.remaining_budget, 2_600.0);
        assert_eq!(root.current_day, 1);
    }

    #[test]
    fn bookings_group_consecutive_days() {
        let params = TripParams {
            destination: "Rajasthan, India".to_string(),
            duration: 6,
            budget: 15_000.0,
            preferences: vec![],
        };
        let itinerary = assemble(&catalog(), &params).expect("plan");
        let budget = summarize_budget(&BudgetRecord::default(), params.budget);
        let booking = summarize_bookings(&itinerary, &budget);

        let nights: Vec<(&str, u32)> = booking
            .stays
            .iter()
            .map(|s| (s.city.as_str(), s.nights))
            .collect();
        assert_eq!(
            nights,
            [("Jaipur", 2), ("Udaipur", 1), ("Jodhpur", 2), ("Jaisalmer", 1)]
        );
        assert_eq!(booking.activity_count, 18);
    }

    #[test]
    fn visit_share_of_chosen_action() {
        let d = decision(
            &[(Action::KeepPlan, 6), (Action::SwapActivity, 2), (Action::AdjustBudget, 2)],
            Action::KeepPlan,
        );
        assert_eq!(d.visit_share(), 0.6);
        assert_eq!(decision(&[], Action::KeepPlan).visit_share(), 0.0);
    }

    #[test]
    fn explanation_factors_stay_in_range() {
        let params = TripParams {
            destination: "Rajasthan, India".to_string(),
            duration: 3,
            budget: 1_000.0,
            preferences: vec![Category::Cultural],
        };
        let itinerary = assemble(&catalog(), &params).expect("plan");
        let preferences = PreferenceModel::new();
        let crowd = assess_crowds(&catalog(), &params.destination);
        let budget = summarize_budget(&BudgetRecord::default(), params.budget);
        let planner = decision(&[(Action::KeepPlan, 4)], Action::KeepPlan);

        let explanation = explain(
            "Planner",
            "Selected optimal route",
            &ExplainInputs {
                params: &params,
                preferences: &preferences,
                itinerary: &itinerary,
                rain: 0.3,
                crowd: &crowd,
                budget: &budget,
                planner: &planner,
            },
        );

        assert_eq!(explanation.confidence, 1.0);
        assert_eq!(explanation.factors.len(), 4);
        assert!(explanation.factors.iter().all(|f| (0.0..=1.0).contains(&f.impact)));
        assert_eq!(explanation.factors[0].impact, 0.5);
        // itinerary costs more than the trip budget
        assert_eq!(explanation.factors[1].impact, 0.0);
        assert!(explanation.reasoning.contains("Jaipur -> Udaipur -> Jodhpur"));
    }
}
