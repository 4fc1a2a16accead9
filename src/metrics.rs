//! Grounding metrics for profiling the renderers.
//!
//! When the `tracing` feature is enabled, counters are collected during
//! grounding. When disabled, every operation is a no-op.
//!
//! # Usage
//!
//! ```rust,ignore
//! use groundwork::metrics::GroundMetrics;
//!
//! let renderer = Renderer::standard();
//! // ... ground some rules ...
//! let report = renderer.metrics().report();
//! println!("{}", report);
//! ```

#[cfg(feature = "tracing")]
use std::sync::atomic::{AtomicU64, Ordering};

/// Aggregate counters, relaxed ordering throughout.
#[cfg(feature = "tracing")]
pub struct GroundMetrics {
    /// Renderer invocations
    pub runs: AtomicU64,
    /// Cartesian combinations examined by the Standard renderer
    pub combinations: AtomicU64,
    /// Merge or distinct conflicts that pruned a sub-cube
    pub conflicts: AtomicU64,
    /// Assignments rejected by check atoms
    pub check_failures: AtomicU64,
    /// Search states pushed by the Chaining renderer
    pub frames_pushed: AtomicU64,
    /// Deepest Chaining search stack observed
    pub max_depth: AtomicU64,
    /// Assignments produced
    pub results: AtomicU64,
    /// Runs that stopped on their operation budget
    pub budget_exhausted: AtomicU64,
}

#[cfg(feature = "tracing")]
impl GroundMetrics {
    pub fn new() -> Self {
        Self {
            runs: AtomicU64::new(0),
            combinations: AtomicU64::new(0),
            conflicts: AtomicU64::new(0),
            check_failures: AtomicU64::new(0),
            frames_pushed: AtomicU64::new(0),
            max_depth: AtomicU64::new(0),
            results: AtomicU64::new(0),
            budget_exhausted: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_run(&self) {
        self.runs.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_combination(&self) {
        self.combinations.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_conflict(&self) {
        self.conflicts.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_check_failure(&self) {
        self.check_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a search-state push at the given new stack depth.
    #[inline]
    pub fn record_push(&self, depth: u64) {
        self.frames_pushed.fetch_add(1, Ordering::Relaxed);
        let mut current = self.max_depth.load(Ordering::Relaxed);
        while depth > current {
            match self.max_depth.compare_exchange_weak(
                current,
                depth,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(c) => current = c,
            }
        }
    }

    #[inline]
    pub fn record_result(&self) {
        self.results.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_budget_exhausted(&self) {
        self.budget_exhausted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn report(&self) -> MetricsReport {
        MetricsReport {
            runs: self.runs.load(Ordering::Relaxed),
            combinations: self.combinations.load(Ordering::Relaxed),
            conflicts: self.conflicts.load(Ordering::Relaxed),
            check_failures: self.check_failures.load(Ordering::Relaxed),
            frames_pushed: self.frames_pushed.load(Ordering::Relaxed),
            max_depth: self.max_depth.load(Ordering::Relaxed),
            results: self.results.load(Ordering::Relaxed),
            budget_exhausted: self.budget_exhausted.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        for counter in [
            &self.runs,
            &self.combinations,
            &self.conflicts,
            &self.check_failures,
            &self.frames_pushed,
            &self.max_depth,
            &self.results,
            &self.budget_exhausted,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

#[cfg(feature = "tracing")]
impl Default for GroundMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "tracing")]
impl std::fmt::Debug for GroundMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("GroundMetrics").field(&self.report()).finish()
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsReport {
    pub runs: u64,
    pub combinations: u64,
    pub conflicts: u64,
    pub check_failures: u64,
    pub frames_pushed: u64,
    pub max_depth: u64,
    pub results: u64,
    pub budget_exhausted: u64,
}

impl MetricsReport {
    /// Fraction of examined combinations that became results.
    pub fn yield_rate(&self) -> f64 {
        if self.combinations == 0 {
            0.0
        } else {
            self.results as f64 / self.combinations as f64
        }
    }
}

impl std::fmt::Display for MetricsReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Grounding Metrics ===")?;
        writeln!(f, "Runs:               {} ({} out of budget)", self.runs, self.budget_exhausted)?;
        writeln!(
            f,
            "Combinations:       {} ({} conflicts, {:.1}% yield)",
            self.combinations,
            self.conflicts,
            self.yield_rate() * 100.0
        )?;
        writeln!(f, "Check failures:     {}", self.check_failures)?;
        writeln!(
            f,
            "Search states:      {} pushed, max depth {}",
            self.frames_pushed, self.max_depth
        )?;
        writeln!(f, "Results:            {}", self.results)?;
        Ok(())
    }
}

// No-op implementation when tracing is disabled
#[cfg(not(feature = "tracing"))]
#[derive(Debug, Default)]
pub struct GroundMetrics;

#[cfg(not(feature = "tracing"))]
impl GroundMetrics {
    #[inline]
    pub fn new() -> Self {
        GroundMetrics
    }
    #[inline]
    pub fn record_run(&self) {}
    #[inline]
    pub fn record_combination(&self) {}
    #[inline]
    pub fn record_conflict(&self) {}
    #[inline]
    pub fn record_check_failure(&self) {}
    #[inline]
    pub fn record_push(&self, _depth: u64) {}
    #[inline]
    pub fn record_result(&self) {}
    #[inline]
    pub fn record_budget_exhausted(&self) {}
    #[inline]
    pub fn report(&self) -> MetricsReport {
        MetricsReport::default()
    }
    #[inline]
    pub fn reset(&self) {}
}
