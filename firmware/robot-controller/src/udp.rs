//! UDP ingress thread.
//!
//! The arm receives its 17-byte command frames here; the car receives
//! ASCII range-sensor telemetry on the same port layout. Malformed
//! datagrams are dropped without touching any shared state. A receive
//! error tears the socket down and rebinds after a short backoff.

use std::net::UdpSocket;
use std::thread;
use std::time::Duration;

use log::{error, info};

use crate::state::{Clock, SharedMotion, SharedTelemetry};

pub const UDP_PORT: u16 = 4211;

const REBIND_DELAY: Duration = Duration::from_secs(2);

/// Plausibility window for the range sensor, per deployment. The
/// legacy firmware accepted anything; tighten here when the sensor's
/// span is known.
#[cfg(feature = "drive")]
const DISTANCE_BOUNDS: robot_motion::protocol::TelemetryBounds =
    robot_motion::protocol::TelemetryBounds {
        min: None,
        max: None,
    };

pub fn spawn(motion: SharedMotion, telemetry: SharedTelemetry, clock: Clock) {
    thread::Builder::new()
        .name("udp_rx".into())
        .stack_size(4096)
        .spawn(move || loop {
            match UdpSocket::bind(("0.0.0.0", UDP_PORT)) {
                Ok(socket) => {
                    info!("UDP listening on port {}", UDP_PORT);
                    let mut buf = [0u8; 128];
                    loop {
                        match socket.recv_from(&mut buf) {
                            Ok((len, _peer)) => {
                                handle_datagram(&buf[..len], &motion, &telemetry, clock)
                            }
                            Err(e) => {
                                error!("recv failed: {e}, rebinding");
                                break;
                            }
                        }
                    }
                }
                Err(e) => error!("UDP bind failed: {e}"),
            }
            thread::sleep(REBIND_DELAY);
        })
        .expect("failed to spawn UDP thread");
}

#[cfg(feature = "drive")]
fn handle_datagram(buf: &[u8], _motion: &SharedMotion, telemetry: &SharedTelemetry, _clock: Clock) {
    if let Some(distance) = robot_motion::protocol::parse_distance(buf, &DISTANCE_BOUNDS) {
        telemetry.lock().unwrap().distance = distance;
    }
}

#[cfg(feature = "arm")]
fn handle_datagram(buf: &[u8], motion: &SharedMotion, _telemetry: &SharedTelemetry, clock: Clock) {
    use log::warn;
    use robot_motion::{kinematics, protocol::ArmCommand};

    let Some(cmd) = robot_motion::protocol::decode_frame(buf) else {
        return;
    };
    // IK runs here so the lock covers only the target write.
    let cmd = match cmd {
        ArmCommand::MovePose { x, y, z } => match kinematics::solve(x, y, z) {
            Some(sol) => ArmCommand::MoveAngles {
                base: sol.base,
                shoulder: sol.shoulder,
                elbow: sol.elbow,
            },
            None => {
                warn!("dropping unreachable pose ({x:.1}, {y:.1}, {z:.1})");
                return;
            }
        },
        angles => angles,
    };
    motion.lock().unwrap().command(cmd, clock.now_ms());
}
