use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;
use tripweave_mdp::{
    CancelToken, LearningConfig, MctsPlanner, MdpSimulator, MdpState, QLearningAgent, TravelModel,
};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let budget = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse::<f64>().ok())
        .unwrap_or(15_000.0);

    let model = TravelModel::new(budget);
    let mut simulator = MdpSimulator::new(model.clone(), MdpState::with_budget(budget), 12345);
    let cancel = CancelToken::new();

    let planner = MctsPlanner::default();
    let mut rng = ChaCha8Rng::seed_from_u64(12345);
    let outcome = planner
        .plan(&model, simulator.current_state(), &mut rng, &cancel)
        .expect("MCTS run failed");

    println!(
        "mcts_action={} iterations={} heuristic_action={}",
        outcome.action,
        outcome.iterations_completed,
        model.best_action(simulator.current_state())
    );
    for stats in &outcome.root_actions {
        println!("  {:<22} visits={:<4} value_sum={:.4}", stats.action, stats.visits, stats.value_sum);
    }

    let mut agent = QLearningAgent::new(LearningConfig::default());
    let summary = agent.train(&mut simulator, 200, &cancel);
    let stats = agent.stats();
    println!(
        "q_learning episodes={} epsilon={:.4} table_size={} avg_reward={:.4}",
        summary.episodes_completed, stats.epsilon, stats.table_size, stats.avg_reward
    );
}
