use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Time source for the engine
///
/// All cooldown gates and backoff waits go through a clock so that tests can
/// drive the engine with synthetic time.
pub trait Clock: Send + Sync {
    /// Monotonic time since the clock was created
    fn now(&self) -> Duration;

    /// Block the calling thread for `duration`
    fn sleep(&self, duration: Duration);
}

/// Wall clock backed by `Instant`
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Synthetic clock. Cloned handles share the same time; `sleep` advances it
/// instead of blocking.
#[derive(Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<Duration>>,
    slept: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward
    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }

    /// Jump to an absolute time
    pub fn set(&self, to: Duration) {
        *self.now.lock() = to;
    }

    /// Total time spent in `sleep`
    pub fn total_slept(&self) -> Duration {
        *self.slept.lock()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock()
    }

    fn sleep(&self, duration: Duration) {
        *self.slept.lock() += duration;
        self.advance(duration);
    }
}

/// Minimum-elapsed-time gate between two confirmed detections
///
/// A fresh cooldown is open. After `mark`, it stays closed until `window`
/// has elapsed on the caller's clock.
#[derive(Debug, Clone)]
pub struct Cooldown {
    window: Duration,
    last: Option<Duration>,
}

impl Cooldown {
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    /// Check if enough time has passed since the last mark
    pub fn is_open(&self, now: Duration) -> bool {
        match self.last {
            None => true,
            Some(last) => now.saturating_sub(last) >= self.window,
        }
    }

    /// Record a confirmed detection at `now`
    pub fn mark(&mut self, now: Duration) {
        self.last = Some(now);
    }

    /// Time left before the gate opens again
    pub fn remaining(&self, now: Duration) -> Duration {
        match self.last {
            None => Duration::ZERO,
            Some(last) => self.window.saturating_sub(now.saturating_sub(last)),
        }
    }
}

/// Simple stopwatch for per-stage timings
pub struct Timer {
    started: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    pub fn elapsed_us(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1_000_000.0
    }
}

/// Timing measurements for a single engine iteration
#[derive(Debug, Clone, Copy, Default)]
pub struct IterationTiming {
    pub acquire_us: f64,
    pub match_us: f64,
    pub dispatch_us: f64,
    pub total_us: f64,
}

impl IterationTiming {
    pub fn total_ms(&self) -> f64 {
        self.total_us / 1000.0
    }
}

/// Statistics collector for latency measurements
#[derive(Default)]
pub struct LatencyStats {
    timings: Vec<IterationTiming>,
}

impl LatencyStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, timing: IterationTiming) {
        self.timings.push(timing);
    }

    pub fn len(&self) -> usize {
        self.timings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timings.is_empty()
    }

    /// Calculate percentile from sorted data
    fn percentile(sorted: &[f64], p: f64) -> f64 {
        if sorted.is_empty() {
            return 0.0;
        }

        let idx = (p / 100.0 * (sorted.len() - 1) as f64).round() as usize;
        sorted[idx]
    }

    /// Mean, p50 and p95 for one stage
    pub fn stage_stats(&self, extract: impl Fn(&IterationTiming) -> f64) -> (f64, f64, f64) {
        if self.timings.is_empty() {
            return (0.0, 0.0, 0.0);
        }

        let mut values: Vec<f64> = self.timings.iter().map(&extract).collect();
        values.sort_by(|a, b| a.total_cmp(b));

        let mean = values.iter().sum::<f64>() / values.len() as f64;
        (
            mean,
            Self::percentile(&values, 50.0),
            Self::percentile(&values, 95.0),
        )
    }

    /// Log a per-stage latency summary
    pub fn log_report(&self) {
        if self.timings.is_empty() {
            tracing::info!("No timing data collected");
            return;
        }

        tracing::info!("Latency over {} iterations (mean / p50 / p95):", self.timings.len());
        let rows: [(&str, fn(&IterationTiming) -> f64); 4] = [
            ("acquire", |t| t.acquire_us),
            ("match", |t| t.match_us),
            ("dispatch", |t| t.dispatch_us),
            ("total", |t| t.total_us),
        ];
        for (name, extract) in rows {
            let (mean, p50, p95) = self.stage_stats(extract);
            tracing::info!(
                "  {:<9} {:>8.0} µs {:>8.0} µs {:>8.0} µs",
                name,
                mean,
                p50,
                p95
            );
        }
    }
}
