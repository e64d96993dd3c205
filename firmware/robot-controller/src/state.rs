use std::sync::{Arc, Mutex};
use std::time::Instant;

#[cfg(feature = "arm")]
use robot_motion::ArmController;
#[cfg(feature = "drive")]
use robot_motion::DriveController;

/// Motion controller for the platform this binary was built for.
#[cfg(feature = "drive")]
pub type Motion = DriveController;
#[cfg(feature = "arm")]
pub type Motion = ArmController;

/// Shared between the control loop, the HTTP handlers and the UDP
/// receive thread. Locked only for the target/timestamp writes and the
/// per-tick advance, never across I/O.
pub type SharedMotion = Arc<Mutex<Motion>>;

/// Last accepted range-sensor reading, diagnostic only.
#[derive(Debug, Clone, Copy, Default)]
pub struct Telemetry {
    pub distance: f32,
}

pub type SharedTelemetry = Arc<Mutex<Telemetry>>;

/// Monotonic milliseconds since boot, the timebase for every motion
/// call.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    epoch: Instant,
}

impl Clock {
    pub fn new() -> Self {
        Clock {
            epoch: Instant::now(),
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }
}
