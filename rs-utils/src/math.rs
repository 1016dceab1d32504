use bevy::prelude::Vec3;

/// Larger angles are reduced with `rem_euclid` before looping. From 2^33 up
/// subtracting 360 no longer changes an `f32`.
const CLAMP_LOOP_LIMIT: f32 = 1.0e6;

/// Brings an angle in degrees into `[0, 360)`.
///
/// Uses repeated add/subtract instead of `rem_euclid` so values already in
/// range come back bit-identical. Huge angles are reduced first.
pub fn clamp_degrees(mut degrees: f32) -> f32 {
    if !degrees.is_finite() {
        return 0.0;
    }
    if degrees.abs() > CLAMP_LOOP_LIMIT {
        degrees = degrees.rem_euclid(360.0);
    }
    while degrees >= 360.0 {
        degrees -= 360.0;
    }
    while degrees < 0.0 {
        degrees += 360.0;
    }
    // -tiny + 360.0 rounds up to exactly 360.0 in f32
    if degrees >= 360.0 { 0.0 } else { degrees }
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Interpolates two angles in degrees along the shorter arc. The result is
/// normalised into `[0, 360)`.
pub fn lerp_angle(from: f32, to: f32, t: f32) -> f32 {
    let from = clamp_degrees(from);
    let to = clamp_degrees(to);
    let mut delta = to - from;
    if delta > 180.0 {
        delta -= 360.0;
    } else if delta < -180.0 {
        delta += 360.0;
    }
    clamp_degrees(from + delta * t)
}

pub fn next_pow2(value: u32) -> u32 {
    value.max(1).next_power_of_two()
}

/// Unit look vector for a yaw/pitch pair in radians. Yaw 0 looks down -Z,
/// positive pitch looks down.
pub fn dir_vector(yaw: f32, pitch: f32) -> Vec3 {
    let (sin_yaw, cos_yaw) = yaw.sin_cos();
    let (sin_pitch, cos_pitch) = pitch.sin_cos();
    Vec3::new(cos_pitch * sin_yaw, -sin_pitch, -cos_pitch * cos_yaw)
}

pub fn rotate_x(v: Vec3, angle: f32) -> Vec3 {
    let (s, c) = angle.sin_cos();
    Vec3::new(v.x, c * v.y + s * v.z, -s * v.y + c * v.z)
}

pub fn rotate_y(v: Vec3, angle: f32) -> Vec3 {
    let (s, c) = angle.sin_cos();
    Vec3::new(c * v.x - s * v.z, v.y, s * v.x + c * v.z)
}

pub fn rotate_z(v: Vec3, angle: f32) -> Vec3 {
    let (s, c) = angle.sin_cos();
    Vec3::new(c * v.x + s * v.y, -s * v.x + c * v.y, v.z)
}
