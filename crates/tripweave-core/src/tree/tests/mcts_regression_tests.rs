use std::ops::ControlFlow;

use crate::{ActionId, ReturnType, SearchConfig, Tree, TreeError};

fn config(iterations: usize) -> SearchConfig {
    SearchConfig {
        iterations,
        exploration: 2.0,
        rollout_steps: 5,
        return_type: ReturnType::Undiscounted,
        gamma: 1.0,
    }
}

#[test]
fn zero_action_state_stays_a_leaf() {
    let mut tree = Tree::new(7_u64);

    let metrics = tree
        .run_with_hook(
            &config(3),
            |_state: &u64| 0,
            |state: &u64, _action: ActionId| (*state, 1.0),
            |_state: &u64, _num_actions: usize| ActionId::from(0),
            |_iter| ControlFlow::Continue(()),
        )
        .expect("run should succeed on zero-action state");

    assert_eq!(metrics.iterations_completed, 3);
    assert_eq!(metrics.rollout_return_sum, 0.0);
    assert_eq!(tree.node_count(), 1);
    assert_eq!(tree.node(tree.root_id()).expect("root").visits(), 3);
}

#[test]
fn invalid_rollout_policy_action_index_returns_error() {
    let mut tree = Tree::new(0_u64);
    let mut num_actions = |_state: &u64| 1;
    let mut step = |_state: &u64, _action: ActionId| (1_u64, 0.0);
    let mut rollout_policy = |_state: &u64, _num_actions: usize| ActionId::from(99);

    let err = tree
        .iterate(&config(1), &mut num_actions, &mut step, &mut rollout_policy)
        .expect_err("invalid rollout action should error");

    assert!(matches!(
        err,
        TreeError::InvalidRolloutAction {
            action_id,
            num_actions: 1,
        } if action_id.index() == 99
    ));
}

#[test]
fn expanding_twice_is_rejected() {
    let mut tree = Tree::new(0_u64);
    let root = tree.root_id();
    tree.expand(root, 2, |s: &u64, _a: ActionId| (*s, 0.0))
        .expect("first expansion");

    let err = tree
        .expand(root, 2, |s: &u64, _a: ActionId| (*s, 0.0))
        .expect_err("second expansion");
    assert_eq!(err, TreeError::AlreadyExpanded { node_id: root });
}

#[test]
fn hook_sees_every_iteration() {
    let mut tree = Tree::new(0_u64);
    let mut seen = 0;

    let metrics = tree
        .run_with_hook(
            &config(12),
            |_state: &u64| 2,
            |state: &u64, action: ActionId| (state * 2 + action.index() as u64, 0.1),
            |_state: &u64, n: usize| ActionId::from(n - 1),
            |_iter| {
                seen += 1;
                ControlFlow::Continue(())
            },
        )
        .expect("run should succeed");

    assert_eq!(seen, 12);
    assert_eq!(metrics.iterations_completed, 12);
    assert!((metrics.average_rollout_return - 0.5).abs() < 1e-12);
}

#[test]
fn hook_break_stops_the_run_after_recording() {
    let mut tree = Tree::new(0_u64);
    let mut seen = 0;

    let metrics = tree
        .run_with_hook(
            &config(50),
            |_state: &u64| 2,
            |state: &u64, action: ActionId| (state * 2 + action.index() as u64, 0.1),
            |_state: &u64, n: usize| ActionId::from(n - 1),
            |_iter| {
                seen += 1;
                if seen == 4 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            },
        )
        .expect("run should succeed");

    assert_eq!(seen, 4);
    assert_eq!(metrics.iterations_requested, 50);
    assert_eq!(metrics.iterations_completed, 4);
    assert_eq!(tree.node(tree.root_id()).expect("root").visits(), 4);
}

#[test]
fn root_id_is_the_first_allocated_node() {
    let tree = Tree::new(42_u64);
    let root = tree.root_id();

    assert_eq!(root.index(), 0);
    assert_eq!(tree.node_count(), 1);
    let node = tree.node(root).expect("root");
    assert_eq!(*node.state(), 42);
    assert!(node.parent().is_none());
}
