//! Measurement wrapper around a single insert strategy.
//!
//! One run: settle the process, acquire a fresh pool (which resets the
//! schema), sample memory in the background while the strategy executes,
//! then report elapsed time, memory movement, and the final row count.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use sqlx::PgPool;
use tracing::info;

use crate::config::{BenchConfig, SAMPLE_INTERVAL};
use crate::data::Interval;
use crate::db;
use crate::sampler::{MemoryReport, MemorySampler};

const SETTLE_ROUNDS: u32 = 5;
const SETTLE_PAUSE: Duration = Duration::from_secs(1);

/// Everything one measured run produced.
#[derive(Debug)]
pub struct RunReport {
    pub name: String,
    pub elapsed: Duration,
    pub memory: MemoryReport,
    pub rows: i64,
}

/// Runs one strategy under measurement and prints its report.
///
/// Errors from the strategy or the database propagate unchanged; the
/// sampler is joined first so its thread never outlives the run.
pub async fn measure<F, Fut>(
    name: &str,
    config: &BenchConfig,
    data: Arc<Vec<Interval>>,
    strategy: F,
) -> Result<RunReport>
where
    F: FnOnce(PgPool, Arc<Vec<Interval>>) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    settle().await;

    info!(strategy = name, "starting run");
    let pool = db::connect(&config.database_url).await?;

    let sampler = MemorySampler::start(SAMPLE_INTERVAL)?;
    let started = Instant::now();
    let outcome = strategy(pool.clone(), data).await;
    let elapsed = started.elapsed();
    let memory = sampler.stop()?;
    outcome?;

    let rows = db::row_count(&pool).await?;

    let report = RunReport {
        name: name.to_string(),
        elapsed,
        memory,
        rows,
    };
    print_report(&report);
    Ok(report)
}

/// Lets the allocator and OS page accounting quiesce so the sampler
/// baseline is taken from an idle process.
async fn settle() {
    for _ in 0..SETTLE_ROUNDS {
        tokio::time::sleep(SETTLE_PAUSE).await;
    }
}

pub fn print_report(report: &RunReport) {
    println!(
        "  {:.<42} {:>10} | {:>14} | {} rows",
        report.name,
        format_duration(report.elapsed),
        format_ops_per_sec(report.rows, report.elapsed),
        report.rows
    );
    println!(
        "  {:.<42} {:>10} | {:>14} | {} samples",
        "memory delta (min/max)",
        format_mib(report.memory.min_delta),
        format_mib(report.memory.max_delta),
        report.memory.samples
    );
}

pub fn print_separator() {
    println!("{}", "-".repeat(80));
}

fn format_duration(d: Duration) -> String {
    if d.as_secs() > 0 {
        format!("{:.2}s", d.as_secs_f64())
    } else if d.as_millis() > 0 {
        format!("{:.2}ms", d.as_secs_f64() * 1000.0)
    } else {
        format!("{:.2}µs", d.as_secs_f64() * 1_000_000.0)
    }
}

fn format_ops_per_sec(count: i64, d: Duration) -> String {
    let ops = count as f64 / d.as_secs_f64();
    if ops >= 1_000_000.0 {
        format!("{:.2}M rows/s", ops / 1_000_000.0)
    } else if ops >= 1_000.0 {
        format!("{:.2}K rows/s", ops / 1_000.0)
    } else {
        format!("{:.2} rows/s", ops)
    }
}

fn format_mib(bytes: i64) -> String {
    format!("{:.2} MiB", bytes as f64 / (1024.0 * 1024.0))
}
