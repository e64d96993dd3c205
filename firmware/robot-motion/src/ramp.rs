//! Bounded-rate ramp for the drive base.
//!
//! Each control tick the current speed moves toward the target by a
//! step drawn from an 8-entry acceleration table indexed by the current
//! speed bucket (`|current| / 32`). Small steps near standstill keep
//! the ESCs from browning out the supply, larger steps at speed keep
//! the base responsive.

use crate::clamp_speed;

/// Step size per 32-count speed bucket, tuned for a 10 ms tick.
pub const ACCEL_TABLE: [i32; 8] = [3, 5, 8, 12, 15, 20, 25, 30];

/// One acceleration-limited axis (a wheel or track).
#[derive(Debug, Clone, Copy, Default)]
pub struct RampAxis {
    current: i32,
    target: i32,
}

impl RampAxis {
    pub fn new() -> Self {
        RampAxis::default()
    }

    pub fn current(&self) -> i32 {
        self.current
    }

    pub fn target(&self) -> i32 {
        self.target
    }

    /// Accept a new target, clamped to the logical speed range.
    pub fn set_target(&mut self, v: i32) {
        self.target = clamp_speed(v);
    }

    pub fn at_target(&self) -> bool {
        self.current == self.target
    }

    fn step_size(&self) -> i32 {
        let idx = (self.current.unsigned_abs() / 32).min(7) as usize;
        ACCEL_TABLE[idx]
    }

    /// Advance one tick toward the target. Never overshoots. Returns
    /// true when `current` changed.
    pub fn tick(&mut self) -> bool {
        if self.current == self.target {
            return false;
        }
        let step = self.step_size();
        if self.current < self.target {
            self.current = (self.current + step).min(self.target);
        } else {
            self.current = (self.current - step).max(self.target);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_axis_does_not_move() {
        let mut axis = RampAxis::new();
        assert!(!axis.tick());
        assert_eq!(axis.current(), 0);
    }

    #[test]
    fn test_converges_without_overshoot() {
        let mut axis = RampAxis::new();
        axis.set_target(255);
        let mut prev_gap = 255;
        for _ in 0..200 {
            if !axis.tick() {
                break;
            }
            let gap = (axis.target() - axis.current()).abs();
            assert!(gap < prev_gap, "gap must strictly shrink");
            assert!(axis.current() <= 255);
            prev_gap = gap;
        }
        assert_eq!(axis.current(), 255);
        assert!(!axis.tick());
    }

    #[test]
    fn test_converges_downward() {
        let mut axis = RampAxis::new();
        axis.set_target(-255);
        while axis.tick() {}
        assert_eq!(axis.current(), -255);
    }

    #[test]
    fn test_step_follows_speed_bucket() {
        let mut axis = RampAxis::new();
        axis.set_target(255);
        // From standstill, bucket 0 gives a 3-count step.
        axis.tick();
        assert_eq!(axis.current(), ACCEL_TABLE[0]);
        // Ride up and check one mid-range step against its bucket.
        while axis.current() < 128 {
            axis.tick();
        }
        let at = axis.current();
        let expected = ACCEL_TABLE[(at.unsigned_abs() / 32).min(7) as usize];
        axis.tick();
        assert_eq!(axis.current() - at, expected.min(255 - at));
    }

    #[test]
    fn test_target_clamped_on_acceptance() {
        let mut axis = RampAxis::new();
        axis.set_target(1000);
        assert_eq!(axis.target(), 255);
        axis.set_target(-1000);
        assert_eq!(axis.target(), -255);
    }

    #[test]
    fn test_retarget_mid_ramp() {
        let mut axis = RampAxis::new();
        axis.set_target(200);
        for _ in 0..5 {
            axis.tick();
        }
        let mid = axis.current();
        assert!(mid > 0 && mid < 200);
        // Supersede with a reverse command; the ramp just turns around.
        axis.set_target(-100);
        while axis.tick() {}
        assert_eq!(axis.current(), -100);
    }

    #[test]
    fn test_exact_landing_near_target() {
        let mut axis = RampAxis::new();
        axis.set_target(4);
        // Bucket 0 step is 3: 0 -> 3 -> 4, clamped at the target.
        axis.tick();
        assert_eq!(axis.current(), 3);
        axis.tick();
        assert_eq!(axis.current(), 4);
        assert!(axis.at_target());
    }
}
