//! Resident memory sampler.
//!
//! A dedicated OS thread polls the process RSS at a fixed interval while a
//! strategy runs. The measured task shares nothing with it but an atomic
//! stop flag; the summary travels back through the join.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{anyhow, Result};
use sysinfo::{Pid, System};

/// RSS movement relative to the first sample taken.
#[derive(Debug, Clone, Copy)]
pub struct MemoryReport {
    /// RSS of the first sample, in bytes.
    pub baseline: u64,
    /// Lowest delta observed, in bytes. Negative when the process shrank.
    pub min_delta: i64,
    /// Highest delta observed, in bytes.
    pub max_delta: i64,
    /// Samples taken, the baseline included.
    pub samples: usize,
}

/// Handle to a running sampler thread.
pub struct MemorySampler {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<MemoryReport>,
}

impl MemorySampler {
    /// Spawns the sampling thread. The first sample is the baseline.
    pub fn start(interval: Duration) -> Result<Self> {
        let pid = sysinfo::get_current_pid()
            .map_err(|e| anyhow!("cannot resolve own pid: {e}"))?;
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let handle = thread::spawn(move || sample_loop(pid, interval, flag));
        Ok(Self { stop, handle })
    }

    /// Raises the stop flag and blocks until the summary is ready. The
    /// thread observes the flag within one poll interval.
    pub fn stop(self) -> Result<MemoryReport> {
        self.stop.store(true, Ordering::Release);
        self.handle
            .join()
            .map_err(|_| anyhow!("memory sampler thread panicked"))
    }
}

fn sample_loop(pid: Pid, interval: Duration, stop: Arc<AtomicBool>) -> MemoryReport {
    let mut sys = System::new();
    let baseline = rss_bytes(&mut sys, pid);
    let mut report = MemoryReport {
        baseline,
        min_delta: 0,
        max_delta: 0,
        samples: 1,
    };

    while !stop.load(Ordering::Acquire) {
        thread::sleep(interval);
        let delta = rss_bytes(&mut sys, pid) as i64 - baseline as i64;
        report.min_delta = report.min_delta.min(delta);
        report.max_delta = report.max_delta.max(delta);
        report.samples += 1;
    }

    report
}

fn rss_bytes(sys: &mut System, pid: Pid) -> u64 {
    sys.refresh_process(pid);
    sys.process(pid).map(|p| p.memory()).unwrap_or(0)
}
