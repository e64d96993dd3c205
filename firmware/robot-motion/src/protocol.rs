//! Wire formats for command ingress.
//!
//! The arm listens for a fixed 17-byte UDP frame:
//!
//! ```text
//! [0..2)  ASCII tag "RM"
//! [2]     command code (0x01 = move pose, 0x03 = move angles)
//! [3..15) three little-endian f32 payload values
//! [15..17) little-endian CRC-16/XMODEM over bytes [0..15)
//! ```
//!
//! The car listens for plain ASCII-float datagrams from the range
//! sensor, and takes its motion commands as HTTP query parameters.
//! Anything malformed decodes to `None` and is dropped without
//! touching the motion state.

pub const FRAME_LEN: usize = 17;
pub const FRAME_TAG: [u8; 2] = *b"RM";

pub const CMD_MOVE_POSE: u8 = 0x01;
pub const CMD_MOVE_ANGLES: u8 = 0x03;

/// Decoded arm instruction. Pose is Cartesian millimetres; angles are
/// joint degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArmCommand {
    MovePose { x: f32, y: f32, z: f32 },
    MoveAngles { base: f32, shoulder: f32, elbow: f32 },
}

/// Decoded drive instruction, already clamped to the logical range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DriveCommand {
    pub left: i32,
    pub right: i32,
}

/// CRC-16/XMODEM: poly 0x1021, init 0xFFFF, no reflection.
pub fn crc16_xmodem(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ 0x1021;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

fn read_f32_le(buf: &[u8], offset: usize) -> f32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&buf[offset..offset + 4]);
    f32::from_le_bytes(bytes)
}

/// Decode one arm frame. Short datagrams, bad tags, unknown commands,
/// CRC mismatches and non-finite payload values all yield `None`.
pub fn decode_frame(buf: &[u8]) -> Option<ArmCommand> {
    if buf.len() < FRAME_LEN {
        return None;
    }
    if buf[0..2] != FRAME_TAG {
        return None;
    }

    let rx_crc = u16::from_le_bytes([buf[15], buf[16]]);
    if rx_crc != crc16_xmodem(&buf[0..15]) {
        return None;
    }

    let a = read_f32_le(buf, 3);
    let b = read_f32_le(buf, 7);
    let c = read_f32_le(buf, 11);
    // A well-framed packet can still carry garbage floats; NaN must
    // never reach the motion state.
    if !(a.is_finite() && b.is_finite() && c.is_finite()) {
        return None;
    }

    match buf[2] {
        CMD_MOVE_POSE => Some(ArmCommand::MovePose { x: a, y: b, z: c }),
        CMD_MOVE_ANGLES => Some(ArmCommand::MoveAngles {
            base: a,
            shoulder: b,
            elbow: c,
        }),
        _ => None,
    }
}

/// Encode an arm frame; the inverse of [`decode_frame`]. Client
/// implementations and the protocol tests build frames through this.
pub fn encode_frame(cmd: &ArmCommand) -> [u8; FRAME_LEN] {
    let mut buf = [0u8; FRAME_LEN];
    buf[0..2].copy_from_slice(&FRAME_TAG);
    let (code, a, b, c) = match *cmd {
        ArmCommand::MovePose { x, y, z } => (CMD_MOVE_POSE, x, y, z),
        ArmCommand::MoveAngles {
            base,
            shoulder,
            elbow,
        } => (CMD_MOVE_ANGLES, base, shoulder, elbow),
    };
    buf[2] = code;
    buf[3..7].copy_from_slice(&a.to_le_bytes());
    buf[7..11].copy_from_slice(&b.to_le_bytes());
    buf[11..15].copy_from_slice(&c.to_le_bytes());
    let crc = crc16_xmodem(&buf[0..15]);
    buf[15..17].copy_from_slice(&crc.to_le_bytes());
    buf
}

/// Plausibility window for the range-sensor telemetry, per deployment.
/// `None` bounds accept any finite value, matching the legacy firmware.
#[derive(Debug, Clone, Copy, Default)]
pub struct TelemetryBounds {
    pub min: Option<f32>,
    pub max: Option<f32>,
}

impl TelemetryBounds {
    fn accepts(&self, v: f32) -> bool {
        v.is_finite()
            && self.min.map_or(true, |m| v >= m)
            && self.max.map_or(true, |m| v <= m)
    }
}

/// Parse an ASCII-float telemetry datagram against the configured
/// bounds. Non-UTF8, non-numeric and out-of-window readings are
/// dropped.
pub fn parse_distance(buf: &[u8], bounds: &TelemetryBounds) -> Option<f32> {
    let text = core::str::from_utf8(buf).ok()?;
    let value: f32 = text.trim().parse().ok()?;
    bounds.accepts(value).then_some(value)
}

/// Parse a `/control` query string (`left=<int>&right=<int>`). A
/// missing or unparsable parameter defaults to 0; values are clamped
/// to the logical speed range.
pub fn parse_control_query(query: &str) -> DriveCommand {
    let mut cmd = DriveCommand::default();
    for pair in query.split('&') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        let value: i32 = value.trim().parse().unwrap_or(0);
        match key {
            "left" => cmd.left = crate::clamp_speed(value),
            "right" => cmd.right = crate::clamp_speed(value),
            _ => {}
        }
    }
    cmd
}
