//! ---
//! bess_section: "01-core-functionality"
//! bess_subsection: "module"
//! bess_type: "source"
//! bess_scope: "code"
//! bess_description: "Shared primitives and utilities for the supervisor runtime."
//! bess_version: "v0.0.0-prealpha"
//! bess_owner: "tbd"
//! ---
use std::time::Duration;

/// Signed difference between an observed cycle duration and the scheduled
/// period, in microseconds. Used when logging loop timing.
pub fn jitter_us(actual: Duration, expected: Duration) -> i64 {
    let actual_us = actual.as_secs_f64() * 1_000_000.0;
    let expected_us = expected.as_secs_f64() * 1_000_000.0;
    (actual_us - expected_us).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jitter_is_signed() {
        assert_eq!(
            jitter_us(Duration::from_millis(101), Duration::from_millis(100)),
            1_000
        );
        assert_eq!(
            jitter_us(Duration::from_millis(99), Duration::from_millis(100)),
            -1_000
        );
    }
}
