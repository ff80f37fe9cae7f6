//! Periodic progress lines for long batch runs: percent, done/total, elapsed, rows/sec.

use std::time::Instant;

use tracing::info;

#[derive(Debug)]
pub struct Progress {
    label: &'static str,
    total: usize,
    step_percent: usize,
    next_percent: usize,
    started: Instant,
}

impl Progress {
    pub fn new(label: &'static str, total: usize, step_percent: usize) -> Self {
        let step_percent = step_percent.clamp(1, 100);
        Self {
            label,
            total,
            step_percent,
            next_percent: step_percent,
            started: Instant::now(),
        }
    }

    /// Number of batches that gives one report per step.
    pub fn batches(&self) -> usize {
        100 / self.step_percent
    }

    pub fn percent(&self, done: usize) -> usize {
        if self.total == 0 {
            100
        } else {
            done.min(self.total) * 100 / self.total
        }
    }

    /// Log once per crossed step; returns whether a line was emitted.
    pub fn update(&mut self, done: usize) -> bool {
        let percent = self.percent(done);
        if percent < self.next_percent && done < self.total {
            return false;
        }
        while self.next_percent <= percent {
            self.next_percent += self.step_percent;
        }
        let elapsed = self.started.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 { done as f64 / elapsed } else { 0.0 };
        info!(
            task = self.label,
            percent,
            done,
            total = self.total,
            elapsed_secs = %format!("{elapsed:.1}"),
            rows_per_sec = %format!("{rate:.1}"),
            "progress"
        );
        true
    }
}
