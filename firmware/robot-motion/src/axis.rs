//! Axis calibration and pulse-width mapping.
//!
//! Logical units (speed -255..255, joint angle in degrees) go through
//! two affine steps before reaching hardware: the per-axis calibration
//! (`theta = scale * q + offset`, clamped to the axis limits) and the
//! degree/speed range to pulse-width map, clamped to the physical
//! pulse range of the servo.

use crate::{SPEED_MAX, SPEED_MIN};

/// Physical pulse-width window of a servo channel, in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseRange {
    pub min_us: u32,
    pub max_us: u32,
}

impl PulseRange {
    /// Full-travel window of the SG90-class servos and the continuous
    /// rotation drive servos used on both platforms.
    pub const FULL: PulseRange = PulseRange {
        min_us: 500,
        max_us: 2500,
    };

    pub fn clamp(&self, us: u32) -> u32 {
        us.clamp(self.min_us, self.max_us)
    }

    pub fn mid_us(&self) -> u32 {
        (self.min_us + self.max_us) / 2
    }
}

impl Default for PulseRange {
    fn default() -> Self {
        PulseRange::FULL
    }
}

/// Per-axis linear calibration: `theta = scale * q + offset` with the
/// logical limits the axis is allowed to travel. Constant for the
/// lifetime of the axis; tuned per physical build.
#[derive(Debug, Clone, Copy)]
pub struct AxisCalibration {
    pub scale: f32,
    pub offset: f32,
    pub limit_min: f32,
    pub limit_max: f32,
}

impl AxisCalibration {
    /// Identity calibration with symmetric joint limits, offset so that
    /// logical zero lands at servo mid-travel (90°).
    pub const CENTERED: AxisCalibration = AxisCalibration {
        scale: 1.0,
        offset: 90.0,
        limit_min: -90.0,
        limit_max: 90.0,
    };

    pub fn clamp(&self, q: f32) -> f32 {
        q.clamp(self.limit_min, self.limit_max)
    }

    /// Logical value to calibrated servo degrees (0..180 space).
    pub fn to_degrees(&self, q: f32) -> f32 {
        self.clamp(q) * self.scale + self.offset
    }
}

/// Map calibrated degrees (0..180) to a pulse width within `range`.
pub fn degrees_to_pulse(theta: f32, range: &PulseRange) -> u32 {
    let theta = theta.clamp(0.0, 180.0);
    let span = (range.max_us - range.min_us) as f32;
    let us = range.min_us as f32 + theta / 180.0 * span;
    range.clamp(us as u32)
}

/// Map a logical speed (-255..255) to a pulse width within `range`.
/// `reversed` flips the direction (min/max swapped), used for motors
/// mounted mirror-image on the chassis.
pub fn speed_to_pulse(v: i32, range: &PulseRange, reversed: bool) -> u32 {
    let v = v.clamp(SPEED_MIN, SPEED_MAX) as i64;
    let (out_min, out_max) = if reversed {
        (range.max_us as i64, range.min_us as i64)
    } else {
        (range.min_us as i64, range.max_us as i64)
    };
    let in_min = SPEED_MIN as i64;
    let in_max = SPEED_MAX as i64;
    let us = (v - in_min) * (out_max - out_min) / (in_max - in_min) + out_min;
    range.clamp(us as u32)
}

/// Channel/direction wiring of the drive base.
///
/// Several chassis revisions have the motor leads crossed or one motor
/// mounted mirrored. The correction lives here as deployment
/// configuration instead of being hard-coded into the mapping.
#[derive(Debug, Clone, Copy)]
pub struct DriveCalibration {
    /// Send the left command to the right channel and vice versa.
    pub swap_channels: bool,
    pub reverse_left: bool,
    pub reverse_right: bool,
}

impl Default for DriveCalibration {
    /// The shipped chassis has the motor leads crossed and the right
    /// motor mounted mirrored: the left channel carries the right
    /// command forward, the right channel the left command reversed.
    fn default() -> Self {
        DriveCalibration {
            swap_channels: true,
            reverse_left: false,
            reverse_right: true,
        }
    }
}

impl DriveCalibration {
    /// Map the logical `(left, right)` speeds to the pulse pair for the
    /// physical (left channel, right channel) outputs.
    pub fn pulse_pair(&self, left: i32, right: i32, range: &PulseRange) -> (u32, u32) {
        let (l, r) = if self.swap_channels {
            (right, left)
        } else {
            (left, right)
        };
        (
            speed_to_pulse(l, range, self.reverse_left),
            speed_to_pulse(r, range, self.reverse_right),
        )
    }
}
