//! Monotonic time source

use core::time::Duration;

/// Monotonic millisecond clock
pub trait Clock {
    /// Milliseconds since an arbitrary fixed point
    fn now_ms(&mut self) -> u64;

    /// Time elapsed since `start_ms`
    fn elapsed_since(&mut self, start_ms: u64) -> Duration {
        Duration::from_millis(self.now_ms().saturating_sub(start_ms))
    }
}
