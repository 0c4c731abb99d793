use tracing_subscriber::EnvFilter;
use tripweave_bayes::Category;
use tripweave_mdp::CancelToken;
use tripweave_session::{ReplanReason, Session, TripParams};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut args = std::env::args().skip(1);
    let destination = args.next().unwrap_or_else(|| "Rajasthan, India".to_string());
    let duration = args
        .next()
        .and_then(|arg| arg.parse::<u32>().ok())
        .unwrap_or(3);

    let mut session = Session::with_defaults().expect("default session");
    let cancel = CancelToken::new();
    let params = TripParams {
        destination,
        duration,
        budget: 15_000.0,
        preferences: vec![Category::Cultural, Category::Adventure],
    };

    let report = session
        .generate_itinerary(&params, &cancel)
        .expect("itinerary generation failed");
    for day in &report.itinerary.days {
        println!("day {} in {}", day.day, day.city);
        for scheduled in &day.activities {
            println!(
                "  {:>5} {:<24} {:>6.0}",
                scheduled.time, scheduled.activity.name, scheduled.activity.cost
            );
        }
    }
    println!("total_cost={:.0}", report.itinerary.total_cost);
    println!(
        "planner_action={} heuristic_action={} confidence={:.2}",
        report.planner.outcome.action, report.planner.heuristic, report.explanation.confidence
    );
    for factor in &report.explanation.factors {
        println!("  {:<20} {:.2}", factor.name, factor.impact);
    }

    session.rate_activity(Category::Food, 5);
    let replan = session
        .replan(ReplanReason::Weather, &cancel)
        .expect("replanning failed");
    println!("{}", replan.explanation.reasoning);

    let summary = session.train(100, &cancel);
    println!(
        "q_learning episodes={} mean_reward={:.4}",
        summary.episodes_completed, summary.mean_reward
    );
    println!(
        "{}",
        session.snapshot().to_json().expect("snapshot serialization failed")
    );
}
