#[cfg(all(feature = "drive", feature = "arm"))]
compile_error!("select exactly one platform: build with --no-default-features --features arm");
#[cfg(not(any(feature = "drive", feature = "arm")))]
compile_error!("select a platform feature: drive or arm");

mod http;
#[cfg(feature = "drive")]
mod motor;
#[cfg(feature = "arm")]
mod servo;
mod state;
mod udp;
mod wifi;

use std::sync::{Arc, Mutex};
use std::thread::sleep;
use std::time::Duration;

use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{error, info};

use robot_motion::TICK_PERIOD_MS;
use state::{Clock, Telemetry};

fn main() {
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init().expect("Failed to init logger");

    info!("Robot controller v{}", env!("CARGO_PKG_VERSION"));

    let peripherals = Peripherals::take().expect("Failed to take peripherals");
    let sysloop = EspSystemEventLoop::take().expect("Failed to take event loop");
    let nvs = EspDefaultNvsPartition::take().expect("Failed to init NVS");

    // The wifi handle must outlive the control loop.
    let _wifi = wifi::connect(
        peripherals.modem,
        sysloop,
        nvs,
        &wifi::WifiConfig::default(),
    )
    .expect("WiFi bring-up failed");

    let clock = Clock::new();
    let telemetry = Arc::new(Mutex::new(Telemetry::default()));

    run(peripherals, clock, telemetry);
}

/// Camera-car platform: differential drive on GPIO 21/47, lamp on
/// GPIO 48.
#[cfg(feature = "drive")]
fn run(peripherals: Peripherals, clock: Clock, telemetry: state::SharedTelemetry) {
    use esp_idf_hal::gpio::{OutputPin, PinDriver};
    use robot_motion::{DriveConfig, DriveController};

    let mut outputs = motor::DriveMotors::new(
        peripherals.ledc.timer1,
        peripherals.ledc.channel2,
        peripherals.ledc.channel3,
        peripherals.pins.gpio21.downgrade_output(),
        peripherals.pins.gpio47.downgrade_output(),
    )
    .expect("Motor PWM init failed");

    let lamp = PinDriver::output(peripherals.pins.gpio48.downgrade_output())
        .expect("Lamp GPIO init failed");
    let lamp = Arc::new(Mutex::new(lamp));

    let motion = Arc::new(Mutex::new(DriveController::new(DriveConfig::default())));

    let _server = http::start(motion.clone(), telemetry.clone(), clock, lamp)
        .expect("HTTP server start failed");
    udp::spawn(motion.clone(), telemetry, clock);

    info!("Drive platform ready");
    control_loop(motion, clock, move |pulses| outputs.apply(pulses));
}

/// Arm platform: base, shoulder, elbow, gripper servos on GPIO 4-7.
#[cfg(feature = "arm")]
fn run(peripherals: Peripherals, clock: Clock, telemetry: state::SharedTelemetry) {
    use esp_idf_hal::gpio::OutputPin;
    use robot_motion::{ArmConfig, ArmController};

    let mut outputs = servo::ArmServos::new(
        peripherals.ledc.timer0,
        peripherals.ledc.channel0,
        peripherals.ledc.channel1,
        peripherals.ledc.channel2,
        peripherals.ledc.channel3,
        [
            peripherals.pins.gpio4.downgrade_output(),
            peripherals.pins.gpio5.downgrade_output(),
            peripherals.pins.gpio6.downgrade_output(),
            peripherals.pins.gpio7.downgrade_output(),
        ],
    )
    .expect("Servo PWM init failed");

    let motion = Arc::new(Mutex::new(ArmController::new(ArmConfig::default())));

    let _server =
        http::start(motion.clone(), telemetry.clone()).expect("HTTP server start failed");
    udp::spawn(motion.clone(), telemetry, clock);

    info!("Arm platform ready");
    control_loop(motion, clock, move |pulses| outputs.apply(pulses));
}

/// Pulse update emitted by one control tick.
#[cfg(feature = "drive")]
type PulseUpdate = (u32, u32);
#[cfg(feature = "arm")]
type PulseUpdate = [u32; robot_motion::trajectory::ARM_AXES];

/// Fixed-period tick: advance the motion state, apply changed outputs,
/// sleep. Never blocks on anything but the tick timer; the lock is
/// held only for the advance itself.
fn control_loop<F>(motion: state::SharedMotion, clock: Clock, mut apply: F) -> !
where
    F: FnMut(PulseUpdate) -> Result<(), esp_idf_sys::EspError>,
{
    loop {
        let update = motion.lock().unwrap().tick(clock.now_ms());
        if let Some(pulses) = update {
            if let Err(e) = apply(pulses) {
                error!("PWM write failed: {e}");
            }
        }
        sleep(Duration::from_millis(TICK_PERIOD_MS));
    }
}
