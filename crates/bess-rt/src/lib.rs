//! ---
//! bess_section: "01-core-functionality"
//! bess_subsection: "module"
//! bess_type: "source"
//! bess_scope: "code"
//! bess_description: "Cycle scheduling helpers supporting the supervisor."
//! bess_version: "v0.0.0-prealpha"
//! bess_owner: "tbd"
//! ---
//! Fixed-period scheduling for the supervisor cycle driver.

use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};

/// Simple async rate limiter that ensures deterministic loop intervals.
///
/// A missed tick is delayed rather than burst-replayed; the supervisor must
/// never run `step()` back to back to catch up.
#[derive(Debug)]
pub struct RateLimiter {
    interval: tokio::time::Interval,
}

impl RateLimiter {
    pub fn new(period: Duration) -> Self {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }

    pub async fn tick(&mut self) -> Instant {
        self.interval.tick().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ticks_follow_the_configured_period() {
        let period = Duration::from_millis(10);
        let mut limiter = RateLimiter::new(period);

        // First tick completes immediately.
        let first = limiter.tick().await;
        let second = limiter.tick().await;
        assert!(second.duration_since(first) >= period);
    }
}
