use std::pin::Pin;
use std::time::Duration;

use tokio::time::{Instant, Sleep};

/// Fixed-delay tick source: at most one fetch per tick.
///
/// The deadline is re-armed by [`reset`](Self::reset) after every cycle, whatever
/// its outcome, so the spacing between two fetches never drops below the interval.
#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    sleep: Pin<Box<Sleep>>,
}

impl Pacer {
    /// First tick fires one interval from now. Requires a Tokio runtime.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            sleep: Box::pin(tokio::time::sleep(interval)),
        }
    }

    /// Wait for the current deadline. Returns immediately once it has passed.
    pub async fn tick(&mut self) {
        self.sleep.as_mut().await;
    }

    /// Re-arm one interval from now.
    pub fn reset(&mut self) {
        self.sleep.as_mut().reset(Instant::now() + self.interval);
    }
}
