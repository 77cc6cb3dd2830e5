//! Rotation clock that derives completed revolutions from elapsed time.

use std::f64::consts::TAU;
use std::time::Duration;

use revolution_core::{RingIndex, REFERENCE_LINEAR_SPEED};

/// Angle every ring starts from: straight up, rotating clockwise.
const START_ANGLE: f64 = -std::f64::consts::FRAC_PI_2;

/// Tracks simulated time since the start of the current epoch.
///
/// Revolution counts are a pure function of the accumulated elapsed time and
/// the current speed level, so raising a speed level mid-epoch retroactively
/// counts the faster rotation for the whole epoch. Epoch resets clear the
/// accumulated time along with the per-ring counters held by the world.
#[derive(Clone, Debug)]
pub(crate) struct RotationClock {
    elapsed: Duration,
}

impl RotationClock {
    pub(crate) const fn new() -> Self {
        Self {
            elapsed: Duration::ZERO,
        }
    }

    pub(crate) fn advance(&mut self, dt: Duration) {
        self.elapsed = self.elapsed.saturating_add(dt);
    }

    pub(crate) fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
    }

    /// Whole revolutions the ring has completed since the epoch started.
    pub(crate) fn completed_revolutions(&self, ring: RingIndex, speed_level: u8) -> u64 {
        let revolutions = angular_velocity(ring, speed_level) * self.elapsed.as_secs_f64() / TAU;
        if revolutions.is_finite() && revolutions > 0.0 {
            revolutions.floor() as u64
        } else {
            0
        }
    }

    /// Current angle of the ring's moving dot in radians.
    pub(crate) fn angle(&self, ring: RingIndex, speed_level: u8) -> f64 {
        let raw = START_ANGLE + angular_velocity(ring, speed_level) * self.elapsed.as_secs_f64();
        if raw.is_finite() {
            raw.rem_euclid(TAU)
        } else {
            START_ANGLE.rem_euclid(TAU)
        }
    }
}

/// Angular velocity of a ring in radians per second.
///
/// Every ring shares the same tangential speed, so outer rings turn slower
/// for the same effective multiplier.
pub(crate) fn angular_velocity(ring: RingIndex, speed_level: u8) -> f64 {
    REFERENCE_LINEAR_SPEED * ring.effective_multiplier(speed_level) / ring.radius()
}

/// Revolutions per second of a ring at the provided speed level.
pub(crate) fn revolutions_per_second(ring: RingIndex, speed_level: u8) -> f64 {
    angular_velocity(ring, speed_level) / TAU
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(value: u8) -> RingIndex {
        RingIndex::new(value).expect("valid ring")
    }

    #[test]
    fn inner_ring_completes_one_revolution_per_spin_duration() {
        // Sample slightly past each boundary; an exact multiple of the spin
        // duration sits on the floor discontinuity.
        let mut clock = RotationClock::new();
        clock.advance(Duration::from_millis(2_100));
        assert_eq!(clock.completed_revolutions(ring(0), 0), 1);
        clock.advance(Duration::from_millis(2_000));
        assert_eq!(clock.completed_revolutions(ring(0), 0), 2);
    }

    #[test]
    fn outer_rings_do_not_spin_without_upgrades() {
        let mut clock = RotationClock::new();
        clock.advance(Duration::from_secs(600));
        for index in 1..9 {
            assert_eq!(clock.completed_revolutions(ring(index), 0), 0);
        }
    }

    #[test]
    fn speed_levels_raise_the_revolution_count() {
        let mut clock = RotationClock::new();
        clock.advance(Duration::from_millis(16_100));
        let slow = clock.completed_revolutions(ring(0), 0);
        let fast = clock.completed_revolutions(ring(0), 8);
        assert_eq!(slow, 8);
        assert_eq!(fast, 16);
    }

    #[test]
    fn reset_clears_accumulated_time() {
        let mut clock = RotationClock::new();
        clock.advance(Duration::from_secs(10));
        clock.reset();
        assert_eq!(clock.completed_revolutions(ring(0), 0), 0);
    }

    #[test]
    fn angle_stays_normalised() {
        let mut clock = RotationClock::new();
        clock.advance(Duration::from_secs(1234));
        let angle = clock.angle(ring(0), 3);
        assert!((0.0..std::f64::consts::TAU).contains(&angle));
    }
}
