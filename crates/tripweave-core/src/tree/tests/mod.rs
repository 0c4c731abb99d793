mod mcts_regression_tests;
mod rollout_tests;
