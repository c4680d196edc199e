//! 性能基准：cargo run --release --example performance_benchmark

use json_vis::model::performance::run_performance_suite;
use tracing_subscriber::fmt::SubscriberBuilder;

fn main() -> anyhow::Result<()> {
    let _ = SubscriberBuilder::default()
        .with_max_level(tracing::Level::INFO)
        .try_init();

    let results = run_performance_suite();
    for r in &results {
        tracing::info!(
            "{:<24} {:>6}ms {} {}",
            r.operation,
            r.duration_ms,
            if r.success { "OK " } else { "ERR" },
            r.details
        );
    }

    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}
