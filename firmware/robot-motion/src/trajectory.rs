//! Time-synchronized smoothstep interpolation for the arm joints.
//!
//! All four axes share one segment clock: the duration is set by the
//! axis with the longest travel at `MAX_SPEED_DEG_PER_SEC`, so every
//! joint arrives at the same instant. Easing is the cubic smoothstep,
//! zero velocity at both endpoints.

/// Base, shoulder, elbow, gripper.
pub const ARM_AXES: usize = 4;

pub const MAX_SPEED_DEG_PER_SEC: f32 = 120.0;

/// Floor on the segment duration so a same-pose command never produces
/// a zero-length (instant) move.
pub const MIN_MOVE_MS: u64 = 100;

fn smoothstep(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

/// Interpolator state for one synchronized multi-axis segment.
#[derive(Debug, Clone)]
pub struct ArmTrajectory {
    start: [f32; ARM_AXES],
    current: [f32; ARM_AXES],
    target: [f32; ARM_AXES],
    start_time_ms: u64,
    duration_ms: u64,
    moving: bool,
}

impl ArmTrajectory {
    pub fn new(home: [f32; ARM_AXES]) -> Self {
        ArmTrajectory {
            start: home,
            current: home,
            target: home,
            start_time_ms: 0,
            duration_ms: 0,
            moving: false,
        }
    }

    pub fn current(&self) -> [f32; ARM_AXES] {
        self.current
    }

    pub fn target(&self) -> [f32; ARM_AXES] {
        self.target
    }

    pub fn is_moving(&self) -> bool {
        self.moving
    }

    /// Begin a new segment from wherever the joints are now. A segment
    /// already in flight is simply superseded.
    pub fn begin_move(&mut self, target: [f32; ARM_AXES], now_ms: u64) {
        self.start = self.current;
        self.target = target;

        let mut max_dist = 0.0f32;
        for i in 0..ARM_AXES {
            max_dist = max_dist.max((self.target[i] - self.start[i]).abs());
        }
        let duration_ms = (max_dist / MAX_SPEED_DEG_PER_SEC * 1000.0) as u64;
        self.duration_ms = duration_ms.max(MIN_MOVE_MS);
        self.start_time_ms = now_ms;
        self.moving = true;
    }

    /// Advance to `now_ms`. Returns true while the segment is active
    /// (including the completing tick).
    pub fn tick(&mut self, now_ms: u64) -> bool {
        if !self.moving {
            return false;
        }
        let elapsed = now_ms.saturating_sub(self.start_time_ms);
        if elapsed >= self.duration_ms {
            // Snap exactly onto the target to shed interpolation error.
            self.current = self.target;
            self.moving = false;
        } else {
            let t = elapsed as f32 / self.duration_ms as f32;
            let k = smoothstep(t);
            for i in 0..ARM_AXES {
                self.current[i] = self.start[i] + (self.target[i] - self.start[i]) * k;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOME: [f32; ARM_AXES] = [0.0, 0.0, 0.0, 0.0];

    #[test]
    fn test_duration_scaled_by_longest_axis() {
        let mut traj = ArmTrajectory::new(HOME);
        traj.begin_move([12.0, -60.0, 30.0, 0.0], 1000);
        // 60° at 120°/s -> 500 ms.
        assert_eq!(traj.duration_ms, 500);
    }

    #[test]
    fn test_duration_floor() {
        let mut traj = ArmTrajectory::new(HOME);
        traj.begin_move([0.5, 0.0, 0.0, 0.0], 0);
        assert_eq!(traj.duration_ms, MIN_MOVE_MS);
    }

    #[test]
    fn test_all_axes_arrive_together_exactly() {
        let mut traj = ArmTrajectory::new(HOME);
        let target = [45.0, -30.0, 90.0, 10.0];
        traj.begin_move(target, 0);
        let d = traj.duration_ms;
        let mut now = 0;
        while traj.is_moving() {
            now += 20;
            traj.tick(now);
        }
        assert!(now >= d);
        // Exact equality: completion snaps onto the target.
        assert_eq!(traj.current(), target);
    }

    #[test]
    fn test_midpoint_strictly_between_endpoints() {
        let mut traj = ArmTrajectory::new(HOME);
        let target = [80.0, -40.0, 20.0, 5.0];
        traj.begin_move(target, 0);
        let mid = traj.duration_ms / 2;
        traj.tick(mid);
        for i in 0..ARM_AXES {
            let c = traj.current()[i];
            let (lo, hi) = if target[i] < 0.0 {
                (target[i], 0.0)
            } else {
                (0.0, target[i])
            };
            assert!(c > lo && c < hi, "axis {i} at {c} not inside ({lo}, {hi})");
        }
    }

    #[test]
    fn test_smoothstep_easing_profile() {
        assert_eq!(smoothstep(0.0), 0.0);
        assert_eq!(smoothstep(1.0), 1.0);
        assert!((smoothstep(0.5) - 0.5).abs() < 1e-6);
        // Slow near the endpoints, fast in the middle.
        assert!(smoothstep(0.1) < 0.1);
        assert!(smoothstep(0.9) > 0.9);
    }

    #[test]
    fn test_progress_monotone() {
        let mut traj = ArmTrajectory::new(HOME);
        traj.begin_move([60.0, 0.0, 0.0, 0.0], 0);
        let mut prev = 0.0;
        let mut now = 0;
        while traj.is_moving() {
            now += 10;
            traj.tick(now);
            assert!(traj.current()[0] >= prev);
            prev = traj.current()[0];
        }
    }

    #[test]
    fn test_supersede_mid_flight() {
        let mut traj = ArmTrajectory::new(HOME);
        traj.begin_move([90.0, 0.0, 0.0, 0.0], 0);
        traj.tick(200);
        let mid = traj.current()[0];
        assert!(mid > 0.0 && mid < 90.0);
        // New command restarts from the in-flight position.
        traj.begin_move([-45.0, 0.0, 0.0, 0.0], 200);
        assert_eq!(traj.start[0], mid);
        let mut now = 200;
        while traj.is_moving() {
            now += 20;
            traj.tick(now);
        }
        assert_eq!(traj.current()[0], -45.0);
    }

    #[test]
    fn test_idle_tick_is_noop() {
        let mut traj = ArmTrajectory::new(HOME);
        assert!(!traj.tick(12345));
        assert_eq!(traj.current(), HOME);
    }
}
