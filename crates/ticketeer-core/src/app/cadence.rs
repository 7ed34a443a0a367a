//! Tick cadence: decides the delay before the next driver tick.

use std::time::Duration;

/// Delay policy between driver ticks.
///
/// `fixed` keeps the same delay forever. `backoff` grows the delay over a run
/// of contended ticks: `base_delay * multiplier^streak`, capped at
/// `max_delay`. A successful claim resets the streak (the driver tracks it).
#[derive(Debug, Clone, PartialEq)]
pub struct TickCadence {
    pub base_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
}

impl TickCadence {
    /// Default tick delay.
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(1000);

    pub fn fixed(delay: Duration) -> Self {
        Self {
            base_delay: delay,
            multiplier: 1.0,
            max_delay: delay,
        }
    }

    /// A multiplier below 1.0 is raised to 1.0; `max_delay` never drops
    /// below `base_delay`.
    pub fn backoff(base_delay: Duration, multiplier: f64, max_delay: Duration) -> Self {
        Self {
            base_delay,
            multiplier: multiplier.max(1.0),
            max_delay: max_delay.max(base_delay),
        }
    }

    /// Delay after `streak` consecutive contended ticks.
    ///
    /// Example with base=1s, multiplier=2.0, max=5s:
    /// - streak 0: 1s
    /// - streak 1: 2s
    /// - streak 2: 4s
    /// - streak 3: 5s (capped)
    pub fn next_delay(&self, streak: u32) -> Duration {
        if streak == 0 {
            return self.base_delay;
        }
        let exponent = i32::try_from(streak).unwrap_or(i32::MAX);
        let secs = self.base_delay.as_secs_f64() * self.multiplier.powi(exponent);
        let max_secs = self.max_delay.as_secs_f64();
        if !secs.is_finite() || secs >= max_secs {
            self.max_delay
        } else {
            Duration::from_secs_f64(secs)
        }
    }
}

impl Default for TickCadence {
    fn default() -> Self {
        Self::fixed(Self::DEFAULT_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cadence_is_one_second_fixed() {
        let cadence = TickCadence::default();
        assert_eq!(cadence.next_delay(0), Duration::from_secs(1));
        assert_eq!(cadence.next_delay(7), Duration::from_secs(1));
    }

    #[test]
    fn backoff_grows_then_caps() {
        let cadence = TickCadence::backoff(Duration::from_secs(1), 2.0, Duration::from_secs(5));

        assert_eq!(cadence.next_delay(0), Duration::from_secs(1));
        assert_eq!(cadence.next_delay(1), Duration::from_secs(2));
        assert_eq!(cadence.next_delay(2), Duration::from_secs(4));
        assert_eq!(cadence.next_delay(3), Duration::from_secs(5));
        assert_eq!(cadence.next_delay(u32::MAX), Duration::from_secs(5));
    }

    #[test]
    fn backoff_sanitizes_inputs() {
        let cadence = TickCadence::backoff(Duration::from_secs(2), 0.5, Duration::from_secs(1));
        assert_eq!(cadence.multiplier, 1.0);
        assert_eq!(cadence.max_delay, Duration::from_secs(2));
        assert_eq!(cadence.next_delay(4), Duration::from_secs(2));
    }
}
