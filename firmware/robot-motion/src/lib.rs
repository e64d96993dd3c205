//! Motion control core shared by the car and arm firmware.
//!
//! Everything here is hardware-free: the ramp engine, the trajectory
//! interpolator, the IK solver, the command watchdog and the wire
//! protocol all take timestamps and buffers from the caller, so the
//! whole crate builds and tests on the host. The esp-idf binary in
//! `robot-controller` owns the peripherals and feeds this crate from
//! its control loop.

pub mod axis;
pub mod controller;
pub mod kinematics;
pub mod protocol;
pub mod ramp;
pub mod trajectory;
pub mod watchdog;

pub use axis::{AxisCalibration, DriveCalibration, PulseRange};
pub use controller::{ArmConfig, ArmController, DriveConfig, DriveController};
pub use kinematics::{solve, ArmAngles};
pub use protocol::{ArmCommand, DriveCommand};
pub use watchdog::CommandWatchdog;

/// Logical speed range for the drive variant.
pub const SPEED_MIN: i32 = -255;
pub const SPEED_MAX: i32 = 255;

/// Control loop period. The ramp step table is tuned for this rate.
pub const TICK_PERIOD_MS: u64 = 10;

/// Clamp a drive speed command into the logical range.
pub fn clamp_speed(v: i32) -> i32 {
    v.clamp(SPEED_MIN, SPEED_MAX)
}
