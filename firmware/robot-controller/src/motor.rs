//! Drive-base output stage: two continuous-rotation channels on one
//! 50 Hz LEDC timer.

use esp_idf_hal::gpio::AnyOutputPin;
use esp_idf_hal::ledc::{config::TimerConfig, LedcDriver, LedcTimerDriver, CHANNEL2, CHANNEL3, TIMER1};
use esp_idf_hal::prelude::*;
use esp_idf_sys::EspError;
use log::info;

use robot_motion::PulseRange;

/// 50 Hz servo/ESC frame.
const PERIOD_US: u32 = 20_000;

pub struct DriveMotors<'d> {
    left: LedcDriver<'d>,
    right: LedcDriver<'d>,
    max_duty: u32,
}

impl<'d> DriveMotors<'d> {
    /// Configure both channels and park them at the stop pulse. A
    /// failure here is fatal to the axis and propagated to the boot
    /// sequence.
    pub fn new(
        timer: TIMER1,
        left_channel: CHANNEL2,
        right_channel: CHANNEL3,
        left_pin: AnyOutputPin,
        right_pin: AnyOutputPin,
    ) -> Result<Self, EspError> {
        let timer = LedcTimerDriver::new(timer, &TimerConfig::default().frequency(50.Hz().into()))?;
        let left = LedcDriver::new(left_channel, &timer, left_pin)?;
        let right = LedcDriver::new(right_channel, &timer, right_pin)?;
        let max_duty = left.get_max_duty();

        let mut motors = DriveMotors {
            left,
            right,
            max_duty,
        };
        let stop = PulseRange::FULL.mid_us();
        motors.apply((stop, stop))?;
        info!("Drive outputs ready ({} duty steps)", max_duty);
        Ok(motors)
    }

    fn us_to_duty(&self, us: u32) -> u32 {
        us * self.max_duty / PERIOD_US
    }

    /// Write both pulse widths. Idempotent; the controller already
    /// skips unchanged values.
    pub fn apply(&mut self, pulses: (u32, u32)) -> Result<(), EspError> {
        self.left.set_duty(self.us_to_duty(pulses.0))?;
        self.right.set_duty(self.us_to_duty(pulses.1))?;
        Ok(())
    }
}
