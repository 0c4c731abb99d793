use crate::tree::{
    ids::ActionId,
    rollout::{ReturnType, RolloutParams, rollout},
};

#[test]
fn return_modes_are_applied_correctly() {
    let num_actions = |state: &u32| if *state < 2 { 1 } else { 0 };
    let step = |state: &u32, _action: ActionId| match state {
        0 => (1, 2.0),
        1 => (2, 4.0),
        _ => (*state, 0.0),
    };
    let rollout_policy = |_state: &u32, _num_actions: usize| ActionId::from(0);

    let undiscounted = rollout(
        &0,
        num_actions,
        step,
        rollout_policy,
        RolloutParams {
            return_type: ReturnType::Undiscounted,
            gamma: 0.5,
            steps: 5,
        },
    )
    .expect("undiscounted rollout should succeed");
    assert!((undiscounted - 6.0).abs() < f64::EPSILON);

    let discounted = rollout(
        &0,
        num_actions,
        step,
        rollout_policy,
        RolloutParams {
            return_type: ReturnType::Discounted,
            gamma: 0.5,
            steps: 5,
        },
    )
    .expect("discounted rollout should succeed");
    assert!((discounted - 4.0).abs() < f64::EPSILON);
}

#[test]
fn rollout_length_is_capped() {
    let mut calls = 0;
    let total = rollout(
        &0_u64,
        |_state: &u64| 7,
        |state: &u64, _action: ActionId| {
            calls += 1;
            (state + 1, 1.0)
        },
        |_state: &u64, _n: usize| ActionId::from(3),
        RolloutParams {
            return_type: ReturnType::Undiscounted,
            gamma: 1.0,
            steps: 5,
        },
    )
    .expect("rollout should succeed");

    assert_eq!(calls, 5);
    assert_eq!(total, 5.0);
}
