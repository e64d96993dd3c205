//! Platform controllers: the shared-state objects that the command
//! ingress (HTTP/UDP) and the periodic control loop both talk to.
//!
//! Ingress calls `command(...)`; the control loop calls `tick(now_ms)`
//! and applies the returned pulse widths to the PWM peripheral. A
//! `None` from `tick` means nothing changed and the peripheral is left
//! alone. Timestamps come from the caller, so tests can run the clock
//! themselves.

use log::warn;

use crate::axis::{degrees_to_pulse, AxisCalibration, DriveCalibration, PulseRange};
use crate::kinematics;
use crate::protocol::{ArmCommand, DriveCommand};
use crate::ramp::RampAxis;
use crate::trajectory::{ArmTrajectory, ARM_AXES};
use crate::watchdog::CommandWatchdog;

/// Deployment configuration for the drive base.
#[derive(Debug, Clone, Copy, Default)]
pub struct DriveConfig {
    pub pulse: PulseRange,
    pub calibration: DriveCalibration,
}

/// Differential-drive controller: two acceleration-limited axes plus
/// the command watchdog.
pub struct DriveController {
    left: RampAxis,
    right: RampAxis,
    watchdog: CommandWatchdog,
    config: DriveConfig,
    last_applied: Option<(i32, i32)>,
}

impl DriveController {
    pub fn new(config: DriveConfig) -> Self {
        DriveController {
            left: RampAxis::new(),
            right: RampAxis::new(),
            watchdog: CommandWatchdog::new(),
            config,
            last_applied: None,
        }
    }

    /// Accept a velocity command from the ingress side.
    pub fn command(&mut self, cmd: DriveCommand, now_ms: u64) {
        self.left.set_target(cmd.left);
        self.right.set_target(cmd.right);
        self.watchdog.feed(now_ms);
    }

    /// Current logical speeds, for status reporting.
    pub fn current(&self) -> (i32, i32) {
        (self.left.current(), self.right.current())
    }

    pub fn is_stopped(&self) -> bool {
        self.left.current() == 0 && self.right.current() == 0
    }

    /// Run one control tick. Returns the (left, right) pulse pair to
    /// apply, or `None` when the outputs are unchanged.
    pub fn tick(&mut self, now_ms: u64) -> Option<(u32, u32)> {
        if self.watchdog.expired(now_ms) {
            if self.left.target() != 0 || self.right.target() != 0 {
                warn!("command silence > watchdog timeout, ramping to stop");
                self.left.set_target(0);
                self.right.set_target(0);
            }
            if self.is_stopped() {
                self.watchdog.disarm();
            }
        }

        self.left.tick();
        self.right.tick();

        let speeds = (self.left.current(), self.right.current());
        if self.last_applied == Some(speeds) {
            return None;
        }
        self.last_applied = Some(speeds);
        Some(
            self.config
                .calibration
                .pulse_pair(speeds.0, speeds.1, &self.config.pulse),
        )
    }
}

/// Per-joint configuration: calibration plus the physical pulse window.
#[derive(Debug, Clone, Copy)]
pub struct ArmAxisConfig {
    pub calibration: AxisCalibration,
    pub pulse: PulseRange,
}

/// Deployment configuration for the arm. Axis order: base, shoulder,
/// elbow, gripper.
#[derive(Debug, Clone, Copy)]
pub struct ArmConfig {
    pub axes: [ArmAxisConfig; ARM_AXES],
    pub home: [f32; ARM_AXES],
}

impl Default for ArmConfig {
    fn default() -> Self {
        let joint = ArmAxisConfig {
            calibration: AxisCalibration::CENTERED,
            pulse: PulseRange::FULL,
        };
        let gripper = ArmAxisConfig {
            calibration: AxisCalibration {
                scale: 1.0,
                offset: 0.0,
                limit_min: 0.0,
                limit_max: 180.0,
            },
            pulse: PulseRange::FULL,
        };
        ArmConfig {
            axes: [joint, joint, joint, gripper],
            home: [0.0; ARM_AXES],
        }
    }
}

/// Arm controller: IK front-end, synchronized trajectory, watchdog.
pub struct ArmController {
    trajectory: ArmTrajectory,
    watchdog: CommandWatchdog,
    config: ArmConfig,
    last_applied: Option<[u32; ARM_AXES]>,
}

impl ArmController {
    pub fn new(config: ArmConfig) -> Self {
        ArmController {
            trajectory: ArmTrajectory::new(config.home),
            watchdog: CommandWatchdog::new(),
            config,
            last_applied: None,
        }
    }

    /// Joint-space targets for a decoded command, clamped to the axis
    /// limits. The wire protocol carries no gripper value, so the
    /// gripper keeps its previous target.
    fn joint_targets(&self, cmd: &ArmCommand) -> Option<[f32; ARM_AXES]> {
        let (base, shoulder, elbow) = match *cmd {
            ArmCommand::MovePose { x, y, z } => {
                let sol = kinematics::solve(x, y, z)?;
                (sol.base, sol.shoulder, sol.elbow)
            }
            ArmCommand::MoveAngles {
                base,
                shoulder,
                elbow,
            } => (base, shoulder, elbow),
        };
        let raw = [base, shoulder, elbow, self.trajectory.target()[3]];
        // NaN passes straight through f32::clamp; a non-finite angle
        // must be dropped before it can poison `current`.
        if raw.iter().any(|v| !v.is_finite()) {
            return None;
        }
        let mut clamped = [0.0; ARM_AXES];
        for i in 0..ARM_AXES {
            clamped[i] = self.config.axes[i].calibration.clamp(raw[i]);
        }
        Some(clamped)
    }

    /// Accept a decoded command. Returns false when the pose is
    /// unreachable or an angle is non-finite; the previous target is
    /// retained and the watchdog is not fed (a dropped command is not
    /// an accepted one).
    pub fn command(&mut self, cmd: ArmCommand, now_ms: u64) -> bool {
        let Some(target) = self.joint_targets(&cmd) else {
            warn!("invalid target, keeping previous one");
            return false;
        };
        self.trajectory.begin_move(target, now_ms);
        self.watchdog.feed(now_ms);
        true
    }

    /// Current joint angles in logical degrees, for status reporting.
    pub fn current(&self) -> [f32; ARM_AXES] {
        self.trajectory.current()
    }

    /// Most recently accepted joint targets.
    pub fn target(&self) -> [f32; ARM_AXES] {
        self.trajectory.target()
    }

    pub fn is_moving(&self) -> bool {
        self.trajectory.is_moving()
    }

    /// Run one control tick. Returns the pulse widths for all four
    /// joints when any output changed.
    pub fn tick(&mut self, now_ms: u64) -> Option<[u32; ARM_AXES]> {
        if self.watchdog.expired(now_ms) {
            if self.trajectory.target() != self.config.home {
                warn!("command silence > watchdog timeout, easing to home pose");
                self.trajectory.begin_move(self.config.home, now_ms);
            } else if !self.trajectory.is_moving() {
                self.watchdog.disarm();
            }
        }

        self.trajectory.tick(now_ms);

        let mut pulses = [0u32; ARM_AXES];
        let current = self.trajectory.current();
        for i in 0..ARM_AXES {
            let axis = &self.config.axes[i];
            let theta = axis.calibration.to_degrees(current[i]);
            pulses[i] = degrees_to_pulse(theta, &axis.pulse);
        }

        if self.last_applied == Some(pulses) {
            return None;
        }
        self.last_applied = Some(pulses);
        Some(pulses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watchdog::COMMAND_TIMEOUT_MS;

    const TICK: u64 = 10;

    fn run_drive(ctl: &mut DriveController, from_ms: u64, ticks: u64) -> u64 {
        let mut now = from_ms;
        for _ in 0..ticks {
            now += TICK;
            ctl.tick(now);
        }
        now
    }

    #[test]
    fn test_drive_converges_to_command() {
        let mut ctl = DriveController::new(DriveConfig::default());
        ctl.command(DriveCommand { left: 255, right: -255 }, 0);
        let mut now = 0;
        // Keep the watchdog fed while converging.
        for _ in 0..60 {
            now += TICK;
            ctl.command(DriveCommand { left: 255, right: -255 }, now);
            ctl.tick(now);
        }
        assert_eq!(ctl.current(), (255, -255));
    }

    #[test]
    fn test_drive_tick_skips_unchanged_output() {
        let mut ctl = DriveController::new(DriveConfig::default());
        ctl.command(DriveCommand { left: 30, right: 30 }, 0);
        let mut applied = 0;
        let mut now = 0;
        for _ in 0..40 {
            now += TICK;
            ctl.command(DriveCommand { left: 30, right: 30 }, now);
            if ctl.tick(now).is_some() {
                applied += 1;
            }
        }
        assert_eq!(ctl.current(), (30, 30));
        // Once settled, no further peripheral writes.
        assert!(applied < 40);
        assert_eq!(ctl.tick(now + TICK), None);
    }

    #[test]
    fn test_drive_watchdog_forces_stop() {
        let mut ctl = DriveController::new(DriveConfig::default());
        ctl.command(DriveCommand { left: 100, right: 100 }, 0);
        let now = run_drive(&mut ctl, 0, 30);
        assert_eq!(ctl.current(), (100, 100));
        // Silence past the timeout: target snaps to neutral and the
        // ramp eases down.
        let now = run_drive(&mut ctl, now, (COMMAND_TIMEOUT_MS / TICK) + 40);
        assert!(ctl.is_stopped());
        // Settled and disarmed: ticks are pure no-ops now.
        assert_eq!(ctl.tick(now + TICK), None);
    }

    #[test]
    fn test_drive_recovers_after_watchdog_stop() {
        let mut ctl = DriveController::new(DriveConfig::default());
        ctl.command(DriveCommand { left: 80, right: 80 }, 0);
        let now = run_drive(&mut ctl, 0, 200);
        assert!(ctl.is_stopped());
        // Next real command re-arms motion.
        ctl.command(DriveCommand { left: 50, right: 50 }, now);
        let mut t = now;
        for _ in 0..40 {
            t += TICK;
            ctl.command(DriveCommand { left: 50, right: 50 }, t);
            ctl.tick(t);
        }
        assert_eq!(ctl.current(), (50, 50));
    }

    #[test]
    fn test_drive_first_tick_applies_neutral() {
        let mut ctl = DriveController::new(DriveConfig::default());
        // No command yet: the first tick still emits the neutral pulse
        // pair so the ESCs see a valid stop signal at boot.
        let pulses = ctl.tick(TICK);
        assert_eq!(pulses, Some((1500, 1500)));
    }

    #[test]
    fn test_arm_pose_command_moves_all_joints() {
        let mut ctl = ArmController::new(ArmConfig::default());
        assert!(ctl.command(ArmCommand::MovePose { x: 100.0, y: 0.0, z: 0.0 }, 0));
        // 60° of travel at 120°/s: the segment ends right at 500 ms,
        // before the watchdog window closes.
        let mut now = 0;
        while ctl.is_moving() {
            now += TICK;
            ctl.tick(now);
        }
        assert_eq!(now, 500);
        let joints = ctl.current();
        assert!((joints[0] - 0.0).abs() < 1e-3);
        assert!((joints[1] - 60.0).abs() < 1e-3);
        assert!((joints[2] - 60.0).abs() < 1e-3);
    }

    #[test]
    fn test_arm_unreachable_pose_dropped() {
        let mut ctl = ArmController::new(ArmConfig::default());
        assert!(ctl.command(
            ArmCommand::MoveAngles { base: 30.0, shoulder: 20.0, elbow: 40.0 },
            0
        ));
        let before = ctl.current();
        assert!(!ctl.command(ArmCommand::MovePose { x: 250.0, y: 0.0, z: 0.0 }, 10));
        // Target untouched; motion continues toward the previous one.
        assert_eq!(ctl.current(), before);
        assert!(ctl.is_moving());
    }

    #[test]
    fn test_arm_non_finite_angles_dropped() {
        let mut ctl = ArmController::new(ArmConfig::default());
        assert!(ctl.command(
            ArmCommand::MoveAngles { base: 30.0, shoulder: 30.0, elbow: 30.0 },
            0
        ));
        let target = ctl.target();
        assert!(!ctl.command(
            ArmCommand::MoveAngles { base: f32::NAN, shoulder: 30.0, elbow: 30.0 },
            10
        ));
        assert!(!ctl.command(
            ArmCommand::MovePose { x: f32::NAN, y: 0.0, z: 0.0 },
            20
        ));
        assert_eq!(ctl.target(), target);
        // Ticking after the rejected commands never yields NaN.
        let mut now = 0;
        for _ in 0..60 {
            now += TICK;
            ctl.tick(now);
            assert!(ctl.current().iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn test_arm_angle_targets_clamped_to_limits() {
        let mut ctl = ArmController::new(ArmConfig::default());
        ctl.command(
            ArmCommand::MoveAngles { base: 400.0, shoulder: -400.0, elbow: 10.0 },
            0,
        );
        let target = ctl.target();
        assert_eq!(target[0], 90.0);
        assert_eq!(target[1], -90.0);
        assert_eq!(target[2], 10.0);
    }

    #[test]
    fn test_arm_watchdog_eases_home_and_idles() {
        let mut ctl = ArmController::new(ArmConfig::default());
        ctl.command(
            ArmCommand::MoveAngles { base: 60.0, shoulder: 30.0, elbow: 45.0 },
            0,
        );
        let mut now = 0;
        // Let the move finish, then go silent past the timeout.
        for _ in 0..300 {
            now += TICK;
            ctl.tick(now);
        }
        assert!(!ctl.is_moving());
        assert_eq!(ctl.current(), [0.0; 4]);
        // Idle: no retriggered homing, no output churn.
        assert_eq!(ctl.tick(now + TICK), None);
    }

    #[test]
    fn test_arm_tick_skips_unchanged_output() {
        let mut ctl = ArmController::new(ArmConfig::default());
        let mut now = 0;
        ctl.tick(now);
        for _ in 0..5 {
            now += TICK;
            assert_eq!(ctl.tick(now), None);
        }
    }

    #[test]
    fn test_arm_home_pulses_at_boot() {
        let mut ctl = ArmController::new(ArmConfig::default());
        let pulses = ctl.tick(TICK).unwrap();
        // Joints centred (logical 0 -> 90°), gripper at its 0° stop.
        assert_eq!(pulses, [1500, 1500, 1500, 500]);
    }
}
