//! Arm output stage: four joint servos on one 50 Hz LEDC timer.

use esp_idf_hal::gpio::AnyOutputPin;
use esp_idf_hal::ledc::{
    config::TimerConfig, LedcDriver, LedcTimerDriver, CHANNEL0, CHANNEL1, CHANNEL2, CHANNEL3,
    TIMER0,
};
use esp_idf_hal::prelude::*;
use esp_idf_sys::EspError;
use log::info;

use robot_motion::trajectory::ARM_AXES;

/// 50 Hz servo frame.
const PERIOD_US: u32 = 20_000;

pub struct ArmServos<'d> {
    channels: [LedcDriver<'d>; ARM_AXES],
    max_duty: u32,
}

impl<'d> ArmServos<'d> {
    /// Configure all four channels. Pin order: base, shoulder, elbow,
    /// gripper. Any channel failure is fatal to init.
    pub fn new(
        timer: TIMER0,
        c0: CHANNEL0,
        c1: CHANNEL1,
        c2: CHANNEL2,
        c3: CHANNEL3,
        pins: [AnyOutputPin; ARM_AXES],
    ) -> Result<Self, EspError> {
        let timer = LedcTimerDriver::new(timer, &TimerConfig::default().frequency(50.Hz().into()))?;
        let [p0, p1, p2, p3] = pins;
        let channels = [
            LedcDriver::new(c0, &timer, p0)?,
            LedcDriver::new(c1, &timer, p1)?,
            LedcDriver::new(c2, &timer, p2)?,
            LedcDriver::new(c3, &timer, p3)?,
        ];
        let max_duty = channels[0].get_max_duty();
        info!("Arm outputs ready ({} duty steps)", max_duty);
        Ok(ArmServos { channels, max_duty })
    }

    /// Write all four pulse widths within one tick so the joints stay
    /// on the shared segment clock.
    pub fn apply(&mut self, pulses: [u32; ARM_AXES]) -> Result<(), EspError> {
        let max_duty = self.max_duty;
        for (channel, us) in self.channels.iter_mut().zip(pulses) {
            channel.set_duty(us * max_duty / PERIOD_US)?;
        }
        Ok(())
    }
}
