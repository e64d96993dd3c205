//! Two-link inverse kinematics for the arm.
//!
//! The base rotates in the XY plane; shoulder and elbow form a planar
//! two-link chain in the (reach, z) plane. Cosine arguments are clamped
//! before `acos` so floating-point overshoot at the reachability
//! boundary never turns into NaN.

/// Link lengths in millimetres.
pub const LINK1_MM: f32 = 100.0;
pub const LINK2_MM: f32 = 100.0;

/// Joint solution in degrees. `elbow` is the internal angle between
/// the two links.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArmAngles {
    pub base: f32,
    pub shoulder: f32,
    pub elbow: f32,
}

/// Targets closer to the shoulder pivot than this are degenerate: the
/// shoulder angle is unconstrained there and the law of cosines
/// divides by zero.
const MIN_REACH_MM: f32 = 1e-3;

/// Solve for the joint angles placing the wrist at `(x, y, z)` mm.
/// Returns `None` when the point lies outside the reachable sphere,
/// at the degenerate pivot, or is not finite.
pub fn solve(x: f32, y: f32, z: f32) -> Option<ArmAngles> {
    let base = y.atan2(x).to_degrees();

    let r = (x * x + y * y).sqrt();
    let c_sq = r * r + z * z;
    let c = c_sq.sqrt();

    if !c.is_finite() || c > LINK1_MM + LINK2_MM || c < MIN_REACH_MM {
        return None;
    }

    // Law of cosines for the shoulder, plus the elevation of the target.
    let cos_a1 = (LINK1_MM * LINK1_MM + c_sq - LINK2_MM * LINK2_MM) / (2.0 * LINK1_MM * c);
    let a1 = cos_a1.clamp(-1.0, 1.0).acos();
    let a2 = z.atan2(r);
    let shoulder = (a1 + a2).to_degrees();

    // Law of cosines for the internal elbow angle.
    let cos_gamma =
        (LINK1_MM * LINK1_MM + LINK2_MM * LINK2_MM - c_sq) / (2.0 * LINK1_MM * LINK2_MM);
    let elbow = cos_gamma.clamp(-1.0, 1.0).acos().to_degrees();

    Some(ArmAngles {
        base,
        shoulder,
        elbow,
    })
}
