use std::{cell::RefCell, ops::ControlFlow};

use rand::Rng;
use serde::Serialize;
use tripweave_core::{ActionId, RunMetrics, SearchConfig, Tree, TreeSnapshot};

use crate::{CancelToken, MdpDomain, MdpError};

/// Visit statistics of one root action after a search.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionStats<A> {
    pub action: A,
    pub visits: u64,
    pub value_sum: f64,
}

/// Result of one planning call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanOutcome<A> {
    /// Most visited root action, or the default action when the root
    /// was never expanded.
    pub action: A,
    pub iterations_requested: usize,
    pub iterations_completed: usize,
    pub cancelled: bool,
    pub average_rollout_return: f64,
    pub root_actions: Vec<ActionStats<A>>,
}

/// UCB1 Monte Carlo tree search over an [`MdpDomain`].
///
/// Every call builds a fresh tree from a copy of the root state, so the
/// caller's live state and history are never touched.
#[derive(Debug, Clone, Default)]
pub struct MctsPlanner {
    config: SearchConfig,
}

impl MctsPlanner {
    pub fn new(config: SearchConfig) -> Result<Self, MdpError> {
        config.validate()?;
        Ok(MctsPlanner { config })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Search with the configured iteration budget.
    pub fn plan<D, R>(
        &self,
        domain: &D,
        root: &D::State,
        rng: &mut R,
        cancel: &CancelToken,
    ) -> Result<PlanOutcome<D::Action>, MdpError>
    where
        D: MdpDomain,
        R: Rng + ?Sized,
    {
        self.search(domain, root, self.config.iterations, rng, cancel)
    }

    /// Run up to `iterations` iterations from `root` and pick the most
    /// visited root action. Zero iterations returns the default action.
    pub fn search<D, R>(
        &self,
        domain: &D,
        root: &D::State,
        iterations: usize,
        rng: &mut R,
        cancel: &CancelToken,
    ) -> Result<PlanOutcome<D::Action>, MdpError>
    where
        D: MdpDomain,
        R: Rng + ?Sized,
    {
        let (tree, outcome) = self.search_tree(domain, root, iterations, rng, cancel)?;
        tracing::debug!(
            target: "tripweave::planner",
            iterations = outcome.iterations_completed,
            nodes = tree.node_count(),
            cancelled = outcome.cancelled,
            "mcts search finished"
        );
        Ok(outcome)
    }

    /// Like [`MctsPlanner::search`] but also returns a snapshot of the tree.
    pub fn search_with_snapshot<D, R>(
        &self,
        domain: &D,
        root: &D::State,
        iterations: usize,
        rng: &mut R,
        cancel: &CancelToken,
    ) -> Result<(PlanOutcome<D::Action>, TreeSnapshot<D::State>), MdpError>
    where
        D: MdpDomain,
        R: Rng + ?Sized,
    {
        let (tree, outcome) = self.search_tree(domain, root, iterations, rng, cancel)?;
        Ok((outcome, tree.snapshot()))
    }

    fn search_tree<D, R>(
        &self,
        domain: &D,
        root: &D::State,
        iterations: usize,
        rng: &mut R,
        cancel: &CancelToken,
    ) -> Result<(Tree<D::State>, PlanOutcome<D::Action>), MdpError>
    where
        D: MdpDomain,
        R: Rng + ?Sized,
    {
        let actions = domain.actions();
        let mut tree = Tree::new(root.clone());

        // Step and rollout policy both draw from the caller's RNG.
        let rng = RefCell::new(rng);
        let num_actions = |_state: &D::State| actions.len();
        let step = |state: &D::State, action_id: ActionId| {
            let action = actions
                .get(action_id.index())
                .copied()
                .unwrap_or_default();
            domain.step(state, action, &mut **rng.borrow_mut())
        };
        let rollout_policy =
            |_state: &D::State, count: usize| ActionId::from(rng.borrow_mut().gen_range(0..count));

        let metrics = if iterations == 0 || cancel.is_cancelled() {
            RunMetrics::new(iterations)
        } else {
            let config = SearchConfig {
                iterations,
                ..self.config.clone()
            };
            tree.run_with_hook(&config, num_actions, step, rollout_policy, |_| {
                if cancel.is_cancelled() {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })?
        };
        let cancelled = metrics.iterations_completed < iterations;

        let action = tree
            .best_root_action_by_visits()?
            .and_then(|id| actions.get(id.index()).copied())
            .unwrap_or_default();

        let root_node = tree.node(tree.root_id())?;
        let mut root_actions = Vec::with_capacity(root_node.children().len());
        for &child_id in root_node.children() {
            let child = tree.node(child_id)?;
            let Some(child_action) = child.action().and_then(|id| actions.get(id.index())) else {
                continue;
            };
            root_actions.push(ActionStats {
                action: *child_action,
                visits: child.visits(),
                value_sum: child.value_sum(),
            });
        }

        let outcome = PlanOutcome {
            action,
            iterations_requested: iterations,
            iterations_completed: metrics.iterations_completed,
            cancelled,
            average_rollout_return: metrics.average_rollout_return,
            root_actions,
        };
        Ok((tree, outcome))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use tripweave_core::ReturnType;

    use super::*;
    use crate::{Action, MdpState, TravelModel};

    /// Travel model that raises the cancel flag after a fixed number of steps.
    struct CancelAfter {
        model: TravelModel,
        cancel: CancelToken,
        steps_left: Cell<usize>,
    }

    impl MdpDomain for CancelAfter {
        type State = MdpState;
        type Action = Action;

        fn actions(&self) -> &[Action] {
            self.model.actions()
        }

        fn step<R: Rng + ?Sized>(
            &self,
            state: &MdpState,
            action: Action,
            rng: &mut R,
        ) -> (MdpState, f64) {
            let left = self.steps_left.get().saturating_sub(1);
            self.steps_left.set(left);
            if left == 0 {
                self.cancel.cancel();
            }
            self.model.step(state, action, rng)
        }
    }

    #[test]
    fn zero_iterations_keeps_plan() {
        let planner = MctsPlanner::default();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let outcome = planner
            .search(
                &TravelModel::new(15_000.0),
                &MdpState::default(),
                0,
                &mut rng,
                &CancelToken::new(),
            )
            .expect("search");

        assert_eq!(outcome.action, Action::KeepPlan);
        assert_eq!(outcome.iterations_completed, 0);
        assert!(outcome.root_actions.is_empty());
    }

    #[test]
    fn cancelled_token_stops_before_first_iteration() {
        let planner = MctsPlanner::default();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let cancel = CancelToken::new();
        cancel.cancel();

        let outcome = planner
            .search(
                &TravelModel::new(15_000.0),
                &MdpState::default(),
                50,
                &mut rng,
                &cancel,
            )
            .expect("search");

        assert!(outcome.cancelled);
        assert_eq!(outcome.iterations_completed, 0);
        assert_eq!(outcome.action, Action::KeepPlan);
    }

    #[test]
    fn root_statistics_cover_every_action() {
        let planner = MctsPlanner::default();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let outcome = planner
            .search(
                &TravelModel::new(15_000.0),
                &MdpState::default(),
                30,
                &mut rng,
                &CancelToken::new(),
            )
            .expect("search");

        let listed: Vec<Action> = outcome.root_actions.iter().map(|s| s.action).collect();
        assert_eq!(listed, Action::ALL.to_vec());
        // Root absorbs the first visit; the remaining 29 land on children.
        let child_visits: u64 = outcome.root_actions.iter().map(|s| s.visits).sum();
        assert_eq!(child_visits, 29);
    }

    #[test]
    fn cancel_during_search_stops_after_the_running_iteration() {
        let planner = MctsPlanner::default();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let cancel = CancelToken::new();
        let domain = CancelAfter {
            model: TravelModel::new(15_000.0),
            cancel: cancel.clone(),
            steps_left: Cell::new(40),
        };

        let outcome = planner
            .search(&domain, &MdpState::default(), 500, &mut rng, &cancel)
            .expect("search");

        assert!(outcome.cancelled);
        assert!(outcome.iterations_completed > 0);
        assert!(outcome.iterations_completed < 500);
        let child_visits: u64 = outcome.root_actions.iter().map(|s| s.visits).sum();
        assert_eq!(child_visits as usize, outcome.iterations_completed - 1);
    }

    #[test]
    fn discounted_returns_stay_within_the_geometric_bound() {
        let config = SearchConfig {
            iterations: 40,
            rollout_steps: 5,
            return_type: ReturnType::Discounted,
            gamma: 0.5,
            ..SearchConfig::default()
        };
        let planner = MctsPlanner::new(config).expect("valid config");
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let outcome = planner
            .plan(
                &TravelModel::new(15_000.0),
                &MdpState::default(),
                &mut rng,
                &CancelToken::new(),
            )
            .expect("plan");

        // Rewards are clamped to [-1, 1]: 1 + 0.5 + 0.25 + 0.125 + 0.0625.
        assert_eq!(outcome.iterations_completed, 40);
        assert!(!outcome.cancelled);
        assert!(outcome.average_rollout_return.abs() <= 1.9375 + 1e-12);
    }
}
