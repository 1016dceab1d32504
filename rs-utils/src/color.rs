use serde::{Deserialize, Serialize};

/// 8-bit RGBA colour.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackedCol {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl PackedCol {
    pub const WHITE: PackedCol = PackedCol::rgb(255, 255, 255);
    pub const BLACK: PackedCol = PackedCol::rgb(0, 0, 0);
    /// Default sunlight.
    pub const SUN: PackedCol = PackedCol::rgb(255, 255, 255);
    /// Default shadow light, used under overhangs.
    pub const SHADOW: PackedCol = PackedCol::rgb(155, 155, 155);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    /// Scales RGB by `t`, leaving alpha untouched.
    pub fn scale(self, t: f32) -> Self {
        let s = |c: u8| (c as f32 * t).clamp(0.0, 255.0) as u8;
        Self::rgba(s(self.r), s(self.g), s(self.b), self.a)
    }

    pub fn lerp(self, other: PackedCol, t: f32) -> Self {
        let l = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).clamp(0.0, 255.0) as u8;
        Self::rgba(
            l(self.r, other.r),
            l(self.g, other.g),
            l(self.b, other.b),
            l(self.a, other.a),
        )
    }

    /// Parses `RRGGBB`, with or without a leading `#`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}
