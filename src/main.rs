//! PostgreSQL bulk insert benchmark.
//!
//! Runs five insert strategies against the target database, one after the
//! other, printing elapsed time, resident memory movement, and the final
//! row count for each.
//!
//! Usage:
//!   cargo run --release
//!
//! The target comes from `DATABASE_URL` (defaults to a local postgres);
//! the `Request` table is dropped and recreated before every run.

use std::sync::Arc;

use pg_insert_bench::{bench, config::BenchConfig, data, strategies};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pg_insert_bench=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = BenchConfig::from_env();

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║           PostgreSQL Bulk Insert Benchmark Suite             ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    info!(records = config.record_count, "generating data");
    let data = Arc::new(data::generate(config.record_count));
    info!("done generating data");

    bench::measure(
        "insert_per_row",
        &config,
        Arc::clone(&data),
        strategies::insert_per_row,
    )
    .await?;
    bench::print_separator();

    bench::measure(
        "insert_values_batched",
        &config,
        Arc::clone(&data),
        strategies::insert_values_batched,
    )
    .await?;
    bench::print_separator();

    bench::measure(
        "insert_unnest_all",
        &config,
        Arc::clone(&data),
        strategies::insert_unnest_all,
    )
    .await?;
    bench::print_separator();

    bench::measure(
        "insert_prepared_once",
        &config,
        Arc::clone(&data),
        strategies::insert_prepared_once,
    )
    .await?;
    bench::print_separator();

    bench::measure(
        "insert_prepared_batched",
        &config,
        Arc::clone(&data),
        strategies::insert_prepared_batched,
    )
    .await?;
    bench::print_separator();

    println!("\n✅ All insert benchmarks completed!");
    Ok(())
}
