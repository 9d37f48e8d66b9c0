use std::time::Duration;

/// Exponential backoff with a fractional growth factor and a delay ceiling.
///
/// Yields `min(base * growth^n, cap)` for attempt `n`. `tokio_retry`'s own
/// `ExponentialBackoff` only grows by integer factors, which cannot express
/// a 1.5x curve, so this is a drop-in strategy iterator for
/// [`tokio_retry::Retry`].
#[derive(Debug, Clone)]
pub struct GrowthBackoff {
    current_ms: f64,
    growth: f64,
    cap_ms: u64,
}

impl GrowthBackoff {
    /// Create a backoff starting at `base_ms`, multiplying by `growth` per
    /// attempt, never exceeding `cap_ms`.
    pub fn new(base_ms: u64, growth: f64, cap_ms: u64) -> Self {
        Self {
            current_ms: base_ms as f64,
            growth,
            cap_ms,
        }
    }
}

impl Iterator for GrowthBackoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let capped = self.current_ms.min(self.cap_ms as f64);
        // Stop growing once past the cap so the float cannot overflow.
        if self.current_ms < self.cap_ms as f64 {
            self.current_ms *= self.growth;
        }
        Some(Duration::from_millis(capped as u64))
    }
}
