//! Operation-count budget for the grounding search.
//!
//! Counts work units (candidate combinations, search-stack steps), never
//! wall-clock time.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpLimiter {
    /// Maximum operations per run; `None` is unbounded.
    pub max: Option<u64>,
    cur: u64,
    failed: bool,
}

impl OpLimiter {
    pub fn new(max: Option<u64>) -> Self {
        Self {
            max,
            cur: 0,
            failed: false,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(None)
    }

    pub fn bounded(max: u64) -> Self {
        Self::new(Some(max))
    }

    /// Start a new run: reset the count and the failure flag.
    pub fn begin(&mut self) {
        self.cur = 0;
        self.failed = false;
    }

    /// Count one operation and report whether the budget is now exceeded.
    /// Once exceeded, the run is marked failed until the next `begin`.
    pub fn exceeded(&mut self) -> bool {
        self.cur += 1;
        if let Some(max) = self.max {
            if self.cur > max {
                self.failed = true;
            }
        }
        self.failed
    }

    /// The last run stopped because it ran out of budget.
    pub fn failed(&self) -> bool {
        self.failed
    }

    /// Operations counted since the last `begin`.
    pub fn count(&self) -> u64 {
        self.cur
    }
}

impl Default for OpLimiter {
    fn default() -> Self {
        Self::unbounded()
    }
}

#[cfg(test)]
#[path = "tests/limiter.rs"]
mod tests;
