/*
 * Copyright 2025 Security Union LLC
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 *
 * Unless you explicitly state otherwise, any contribution intentionally
 * submitted for inclusion in the work by you, as defined in the Apache-2.0
 * license, shall be dual licensed as above, without any additional terms or
 * conditions.
 */

//! Exponential reconnection backoff with jitter.

use crate::constants::{RECONNECT_FACTOR, RECONNECT_JITTER, RECONNECT_MAX_MS, RECONNECT_MIN_MS};
use rand::Rng;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq)]
pub struct Backoff {
    min_ms: u64,
    max_ms: u64,
    factor: u32,
    jitter: f64,
    attempts: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(RECONNECT_MIN_MS, RECONNECT_MAX_MS)
    }
}

impl Backoff {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min_ms,
            max_ms: max_ms.max(min_ms),
            factor: RECONNECT_FACTOR,
            jitter: RECONNECT_JITTER,
            attempts: 0,
        }
    }

    /// Jitter is the fraction of the delay that may be added or removed,
    /// clamped to `0.0..=1.0`.
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Call once the connection is established again.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    pub fn next_delay(&mut self) -> Duration {
        self.next_delay_with(&mut rand::thread_rng())
    }

    pub fn next_delay_with<R: Rng>(&mut self, rng: &mut R) -> Duration {
        let exp = (self.factor as f64).powi(self.attempts.min(32) as i32);
        let mut ms = (self.min_ms as f64 * exp).min(self.max_ms as f64);
        self.attempts = self.attempts.saturating_add(1);

        if self.jitter > 0.0 {
            let deviation = rng.gen::<f64>() * self.jitter * ms;
            if rng.gen_bool(0.5) {
                ms -= deviation;
            } else {
                ms += deviation;
            }
        }
        Duration::from_millis(ms.clamp(0.0, self.max_ms as f64) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn doubles_up_to_the_cap_without_jitter() {
        let mut backoff = Backoff::new(1_000, 5_000).with_jitter(0.0);
        let delays: Vec<u64> = (0..5)
            .map(|_| backoff.next_delay().as_millis() as u64)
            .collect();
        assert_eq!(delays, vec![1_000, 2_000, 4_000, 5_000, 5_000]);
        assert_eq!(backoff.attempts(), 5);
    }

    #[test]
    fn reset_starts_over() {
        let mut backoff = Backoff::new(500, 8_000).with_jitter(0.0);
        backoff.next_delay();
        backoff.next_delay();
        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_millis(500));
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let mut backoff = Backoff::default();
            let first = backoff.next_delay_with(&mut rng).as_millis() as u64;
            assert!((500..=1_500).contains(&first), "first delay {first}");
            for _ in 0..10 {
                let later = backoff.next_delay_with(&mut rng).as_millis() as u64;
                assert!(later <= 5_000, "delay {later} above cap");
            }
        }
    }

    #[test]
    fn max_below_min_is_raised() {
        let mut backoff = Backoff::new(2_000, 100).with_jitter(0.0);
        assert_eq!(backoff.next_delay(), Duration::from_millis(2_000));
    }
}
