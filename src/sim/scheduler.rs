//! Fixed-rate tick gate
//!
//! The host calls in once per display refresh; the simulation only advances
//! when a full update period of wall-clock time has passed since the last
//! step. At most one step is taken per call, so a stalled host never
//! triggers a burst of catch-up steps.

/// Decides whether a host callback is due for a simulation step
#[derive(Debug, Clone)]
pub struct TickScheduler {
    period_ms: f64,
    last_update: Option<f64>,
    steps: u64,
}

impl TickScheduler {
    pub fn new(updates_per_second: f64) -> Self {
        Self {
            period_ms: 1000.0 / updates_per_second,
            last_update: None,
            steps: 0,
        }
    }

    pub fn period_ms(&self) -> f64 {
        self.period_ms
    }

    /// Wall-clock time (ms) of the last step taken
    pub fn last_update(&self) -> Option<f64> {
        self.last_update
    }

    /// Steps taken since construction
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Whether a step is due at `now_ms` (no side effects)
    pub fn is_due(&self, now_ms: f64) -> bool {
        if !now_ms.is_finite() {
            return false;
        }
        match self.last_update {
            None => true,
            Some(last) => now_ms - last >= self.period_ms,
        }
    }

    /// Claim the step if due: advances `last_update` to `now_ms`
    pub fn try_advance(&mut self, now_ms: f64) -> bool {
        if !self.is_due(now_ms) {
            return false;
        }
        self.last_update = Some(now_ms);
        self.steps += 1;
        true
    }
}
