use std::str::FromStr;

use serde::Serialize;
use tripweave_bayes::{Category, PreferenceModel, WeatherPrediction, predict_weather};
use tripweave_mdp::{
    Action, AgentStats, CancelToken, Episode, MctsPlanner, MdpSimulator, MdpState, PlanOutcome,
    QLearningAgent, TrainingSummary, TravelModel,
};

use crate::{
    AgentStage, BudgetRecord, Catalog, Itinerary, SessionConfig, SessionError, SessionSnapshot,
    TripParams, assemble,
    pipeline::{
        BookingSummary, BudgetSummary, CrowdReport, DayForecast, ExplainInputs, Explanation,
        PlannerDecision, RankedPreference, ReplanReason, StageTrace, assess_crowds, explain,
        forecast_days, planning_root, rain_outlook, rank_preferences, summarize_bookings,
        summarize_budget,
    },
};

pub const DEFAULT_PERSONA: &str = "solo";
pub const DEFAULT_THEME: &str = "light";

/// Everything one full generation produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationReport {
    pub itinerary: Itinerary,
    pub trace: StageTrace,
    pub preferences: Vec<RankedPreference>,
    pub forecast: Vec<DayForecast>,
    pub crowd: CrowdReport,
    pub budget: BudgetSummary,
    pub planner: PlannerDecision,
    pub booking: BookingSummary,
    pub explanation: Explanation,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplanReport {
    pub reason: ReplanReason,
    pub itinerary: Itinerary,
    pub trace: StageTrace,
    pub planner: PlannerDecision,
    pub explanation: Explanation,
}

/// What a snapshot restore changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreReport {
    pub preferences_restored: usize,
    pub preferences_rejected: usize,
    pub unknown_categories: usize,
}

/// Stage findings of the last generation, kept for replanning.
#[derive(Debug, Clone)]
struct TripContext {
    params: TripParams,
    forecast: Vec<DayForecast>,
    crowd: CrowdReport,
    budget: BudgetSummary,
}

/// One traveller's planning context.
///
/// Owns the simulator, learner, preference store and planner so that
/// separate sessions never share state. Wrap it in a
/// [`crate::SessionHandle`] to share it between threads.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    catalog: Catalog,
    simulator: MdpSimulator,
    agent: QLearningAgent,
    preferences: PreferenceModel,
    planner: MctsPlanner,
    budget: BudgetRecord,
    persona: String,
    theme: String,
    current_itinerary: Option<Itinerary>,
    context: Option<TripContext>,
}

impl Session {
    pub fn new(config: SessionConfig, catalog: Catalog) -> Result<Self, SessionError> {
        config.validate()?;
        catalog.validate()?;

        let model = TravelModel::with_weights(config.total_budget, config.reward_weights);
        let start = MdpState {
            current_location: config.start_location.clone(),
            ..MdpState::with_budget(config.total_budget)
        };
        let simulator = MdpSimulator::new(model, start, config.seed)
            .with_history_limit(config.transition_history_limit);
        let agent = QLearningAgent::new(config.learning.clone());
        let preferences = PreferenceModel::new().with_observation_limit(config.observation_limit);
        let planner = MctsPlanner::new(config.search.clone())?;

        tracing::debug!(
            target: "tripweave::session",
            seed = config.seed,
            total_budget = config.total_budget,
            "session created"
        );

        Ok(Session {
            budget: BudgetRecord::with_total(config.total_budget),
            config,
            catalog,
            simulator,
            agent,
            preferences,
            planner,
            persona: DEFAULT_PERSONA.to_string(),
            theme: DEFAULT_THEME.to_string(),
            current_itinerary: None,
            context: None,
        })
    }

    /// Session over the bundled config and catalog.
    pub fn with_defaults() -> Result<Self, SessionError> {
        Self::new(SessionConfig::from_default_yaml()?, Catalog::from_default_yaml()?)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn simulator(&self) -> &MdpSimulator {
        &self.simulator
    }

    pub fn agent(&self) -> &QLearningAgent {
        &self.agent
    }

    pub fn preferences(&self) -> &PreferenceModel {
        &self.preferences
    }

    pub fn budget(&self) -> &BudgetRecord {
        &self.budget
    }

    /// Replace the budget record and rescale the travel model to its total.
    pub fn set_budget(&mut self, budget: BudgetRecord) -> Result<(), SessionError> {
        if !budget.is_valid() {
            return Err(SessionError::InvalidInput(format!(
                "budget amounts must be finite and >= 0, got {budget:?}"
            )));
        }
        self.apply_budget(budget);
        Ok(())
    }

    fn apply_budget(&mut self, budget: BudgetRecord) {
        self.budget = budget;
        self.simulator.set_total_budget(budget.total);
    }

    pub fn persona(&self) -> &str {
        &self.persona
    }

    pub fn set_persona(&mut self, persona: impl Into<String>) {
        self.persona = persona.into();
    }

    pub fn theme(&self) -> &str {
        &self.theme
    }

    pub fn set_theme(&mut self, theme: impl Into<String>) {
        self.theme = theme.into();
    }

    pub fn current_itinerary(&self) -> Option<&Itinerary> {
        self.current_itinerary.as_ref()
    }

    /// Run every agent stage in order and keep the resulting itinerary.
    ///
    /// Input is validated before the first stage. The token is checked before
    /// each stage and between planner iterations; a cancelled run leaves the
    /// previous itinerary in place.
    pub fn generate_itinerary(
        &mut self,
        params: &TripParams,
        cancel: &CancelToken,
    ) -> Result<GenerationReport, SessionError> {
        params.validate()?;
        let mut trace = StageTrace::default();

        let preferences = trace.run(AgentStage::Preference, cancel, || {
            Ok(rank_preferences(&self.preferences))
        })?;
        let forecast = trace.run(AgentStage::Weather, cancel, || {
            Ok(forecast_days(params.duration, self.simulator.rng_mut()))
        })?;
        let crowd = trace.run(AgentStage::Crowd, cancel, || {
            Ok(assess_crowds(&self.catalog, &params.destination))
        })?;
        let budget = trace.run(AgentStage::Budget, cancel, || {
            Ok(summarize_budget(&self.budget, params.budget))
        })?;

        let context = TripContext {
            params: params.clone(),
            forecast,
            crowd,
            budget,
        };
        let (itinerary, planner) =
            trace.run(AgentStage::Planner, cancel, || self.plan_trip(&context, cancel))?;
        let booking = trace.run(AgentStage::Booking, cancel, || {
            Ok(summarize_bookings(&itinerary, &context.budget))
        })?;
        let explanation = trace.run(AgentStage::Explainability, cancel, || {
            Ok(self.explain_plan(
                "Planner",
                "Selected optimal route",
                &context,
                &itinerary,
                &planner,
            ))
        })?;

        tracing::info!(
            target: "tripweave::session",
            destination = %params.destination,
            days = itinerary.days.len(),
            total_cost = itinerary.total_cost,
            action = %planner.outcome.action,
            "itinerary generated"
        );

        self.current_itinerary = Some(itinerary.clone());
        let report = GenerationReport {
            itinerary,
            trace,
            preferences,
            forecast: context.forecast.clone(),
            crowd: context.crowd.clone(),
            budget: context.budget,
            planner,
            booking,
            explanation,
        };
        self.context = Some(context);
        Ok(report)
    }

    /// Refresh the finding behind `reason`, then plan and explain again.
    ///
    /// Needs a previous [`Session::generate_itinerary`].
    pub fn replan(
        &mut self,
        reason: ReplanReason,
        cancel: &CancelToken,
    ) -> Result<ReplanReport, SessionError> {
        let Some(mut context) = self.context.clone() else {
            return Err(SessionError::InvalidInput(
                "no generated itinerary to replan".to_string(),
            ));
        };
        tracing::warn!(target: "tripweave::session", ?reason, "replanning");

        let mut trace = StageTrace::default();
        trace.run(reason.stage(), cancel, || {
            match reason {
                ReplanReason::Weather => {
                    context.forecast =
                        forecast_days(context.params.duration, self.simulator.rng_mut());
                }
                ReplanReason::Budget => {
                    context.budget = summarize_budget(&self.budget, context.params.budget);
                }
                ReplanReason::Crowd => {
                    context.crowd = assess_crowds(&self.catalog, &context.params.destination);
                }
            }
            Ok(())
        })?;
        let (itinerary, planner) =
            trace.run(AgentStage::Planner, cancel, || self.plan_trip(&context, cancel))?;
        let explanation = trace.run(AgentStage::Explainability, cancel, || {
            Ok(self.explain_plan(
                reason.agent(),
                reason.headline(),
                &context,
                &itinerary,
                &planner,
            ))
        })?;

        self.current_itinerary = Some(itinerary.clone());
        self.context = Some(context);
        Ok(ReplanReport {
            reason,
            itinerary,
            trace,
            planner,
            explanation,
        })
    }

    fn plan_trip(
        &mut self,
        context: &TripContext,
        cancel: &CancelToken,
    ) -> Result<(Itinerary, PlannerDecision), SessionError> {
        let itinerary = assemble(&self.catalog, &context.params)?;
        let root = planning_root(
            self.simulator.current_state(),
            rain_outlook(&context.forecast),
            &context.crowd,
            &context.budget,
        );
        let domain =
            TravelModel::with_weights(context.params.budget, self.simulator.model().weights());
        let outcome = self
            .planner
            .plan(&domain, &root, self.simulator.rng_mut(), cancel)?;
        let heuristic = domain.best_action(&root);
        Ok((
            itinerary,
            PlannerDecision {
                root,
                outcome,
                heuristic,
            },
        ))
    }

    fn explain_plan(
        &self,
        agent: &str,
        headline: &str,
        context: &TripContext,
        itinerary: &Itinerary,
        planner: &PlannerDecision,
    ) -> Explanation {
        explain(
            agent,
            headline,
            &ExplainInputs {
                params: &context.params,
                preferences: &self.preferences,
                itinerary,
                rain: rain_outlook(&context.forecast),
                crowd: &context.crowd,
                budget: &context.budget,
                planner,
            },
        )
    }

    /// Record a 1..=5 star rating for a category. Returns the new probability.
    pub fn rate_activity(&mut self, category: Category, rating: u8) -> f64 {
        self.preferences.update_preference(category, rating)
    }

    /// Rate an activity of the current itinerary by its id.
    pub fn rate_scheduled_activity(&mut self, id: &str, rating: u8) -> Result<f64, SessionError> {
        let category = self
            .current_itinerary
            .as_ref()
            .and_then(|itinerary| itinerary.activities().find(|a| a.id == id))
            .map(|scheduled| scheduled.activity.category)
            .ok_or_else(|| SessionError::InvalidInput(format!("no scheduled activity '{id}'")))?;
        Ok(self.rate_activity(category, rating))
    }

    /// One Q-learning episode from the live simulator state.
    pub fn run_episode(&mut self) -> Episode {
        self.agent.run_episode(&mut self.simulator)
    }

    /// Each episode starts from the state the previous one ended in.
    pub fn train(&mut self, episodes: usize, cancel: &CancelToken) -> TrainingSummary {
        self.agent.train(&mut self.simulator, episodes, cancel)
    }

    pub fn reward_history(&self) -> Vec<f64> {
        self.agent.reward_history()
    }

    pub fn agent_stats(&self) -> AgentStats {
        self.agent.stats()
    }

    /// MCTS from the live state. The live state and history are untouched.
    pub fn search(
        &mut self,
        iterations: usize,
        cancel: &CancelToken,
    ) -> Result<PlanOutcome<Action>, SessionError> {
        let model = self.simulator.model().clone();
        let root = self.simulator.current_state().clone();
        Ok(self
            .planner
            .search(&model, &root, iterations, self.simulator.rng_mut(), cancel)?)
    }

    pub fn predict_weather(&mut self) -> WeatherPrediction {
        predict_weather(self.simulator.rng_mut())
    }

    /// Priority-heuristic action for the live state.
    pub fn recommended_action(&self) -> Action {
        self.simulator
            .model()
            .best_action(self.simulator.current_state())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            preferences: self
                .preferences
                .beliefs()
                .iter()
                .map(|(category, belief)| (category.to_string(), (*belief).into()))
                .collect(),
            budget: Some(self.budget),
            persona: Some(self.persona.clone()),
            theme: Some(self.theme.clone()),
            current_itinerary: self.current_itinerary.clone(),
        }
    }

    /// Apply a snapshot. Absent fields keep the current values, except the
    /// itinerary, which is cleared when absent.
    pub fn restore(&mut self, snapshot: SessionSnapshot) -> RestoreReport {
        let mut report = RestoreReport::default();

        let mut beliefs = Vec::with_capacity(snapshot.preferences.len());
        for (name, saved) in snapshot.preferences {
            match Category::from_str(&name) {
                Ok(category) => beliefs.push((category, saved.to_belief(category.prior()))),
                Err(err) => {
                    report.unknown_categories += 1;
                    tracing::warn!(target: "tripweave::snapshot", error = %err, "skipping preference");
                }
            }
        }
        let offered = beliefs.len();
        report.preferences_rejected = self.preferences.restore_beliefs(beliefs);
        report.preferences_restored = offered - report.preferences_rejected;

        if let Some(budget) = snapshot.budget {
            if budget.is_valid() {
                self.apply_budget(budget);
            } else {
                tracing::warn!(target: "tripweave::snapshot", ?budget, "ignoring invalid budget");
            }
        }
        if let Some(persona) = snapshot.persona {
            self.persona = persona;
        }
        if let Some(theme) = snapshot.theme {
            self.theme = theme;
        }
        self.current_itinerary = snapshot.current_itinerary;
        self.context = None;

        tracing::info!(
            target: "tripweave::snapshot",
            restored = report.preferences_restored,
            rejected = report.preferences_rejected,
            "session restored"
        );
        report
    }

    pub fn restore_json(&mut self, json: &str) -> Result<RestoreReport, SessionError> {
        Ok(self.restore(SessionSnapshot::from_json(json)?))
    }
}
