use std::time::Duration;

/// Hard ceiling for a single delay when no cap is configured
const DELAY_CEILING: Duration = Duration::from_secs(3600);

/// Timeout and retry schedule for one logical request
///
/// A request is attempted up to `max_retries + 1` times. After failed
/// attempt `n` (1-based) the fetcher sleeps `backoff * factor^(n-1)`,
/// capped at `max_delay` when set.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Bound on each individual attempt, not on the whole sequence
    pub timeout: Duration,
    pub max_retries: u32,
    pub backoff: Duration,
    pub factor: f64,
    pub max_delay: Option<Duration>,
}

impl RetryPolicy {
    /// Total number of attempts allowed
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay to wait after the given failed attempt (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let ceiling = self.max_delay.unwrap_or(DELAY_CEILING);
        let secs = self.backoff.as_secs_f64() * self.factor.max(1.0).powi(exponent);

        if !secs.is_finite() || secs >= ceiling.as_secs_f64() {
            return ceiling;
        }
        Duration::from_secs_f64(secs)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            max_retries: 2,
            backoff: Duration::from_secs(1),
            factor: 2.0,
            max_delay: None,
        }
    }
}
