use std::ops::{BitAnd, BitOr};

use bevy::prelude::Vec3;
use rs_utils::clamp_degrees;

/// Which fields of a [`LocationUpdate`] carry data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LocationFlags(u8);

impl LocationFlags {
    pub const POS: Self = Self(1 << 0);
    pub const HEAD_X: Self = Self(1 << 1);
    pub const HEAD_Y: Self = Self(1 << 2);
    pub const ROT_X: Self = Self(1 << 3);
    pub const ROT_Z: Self = Self(1 << 4);
    /// Position is a delta against the entity's current position.
    pub const REL: Self = Self(1 << 5);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }
}

impl BitOr for LocationFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitAnd for LocationFlags {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

/// A change to an entity's position and/or orientation. Receivers must
/// branch on `flags`; absent fields hold zero.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LocationUpdate {
    pub flags: LocationFlags,
    pub pos: Vec3,
    /// Head yaw in degrees, [0, 360).
    pub yaw: f32,
    /// Head pitch in degrees, [0, 360).
    pub pitch: f32,
    pub rot_x: f32,
    pub rot_z: f32,
}

impl LocationUpdate {
    pub fn make_orientation(yaw: f32, pitch: f32) -> Self {
        Self {
            flags: LocationFlags::HEAD_X | LocationFlags::HEAD_Y,
            yaw: clamp_degrees(yaw),
            pitch: clamp_degrees(pitch),
            ..Self::default()
        }
    }

    pub fn make_position(pos: Vec3, relative: bool) -> Self {
        let mut flags = LocationFlags::POS;
        if relative {
            flags.insert(LocationFlags::REL);
        }
        Self {
            flags,
            pos,
            ..Self::default()
        }
    }

    pub fn make_position_and_orientation(pos: Vec3, yaw: f32, pitch: f32, relative: bool) -> Self {
        let mut update = Self::make_position(pos, relative);
        update.flags.insert(LocationFlags::HEAD_X | LocationFlags::HEAD_Y);
        update.yaw = clamp_degrees(yaw);
        update.pitch = clamp_degrees(pitch);
        update
    }

    /// Adds model-space X/Z rotations, as sent by servers that orient
    /// whole entities.
    pub fn with_rotation(mut self, rot_x: f32, rot_z: f32) -> Self {
        self.flags.insert(LocationFlags::ROT_X | LocationFlags::ROT_Z);
        self.rot_x = clamp_degrees(rot_x);
        self.rot_z = clamp_degrees(rot_z);
        self
    }

    pub fn has(&self, flag: LocationFlags) -> bool {
        self.flags.contains(flag)
    }

    pub fn is_relative(&self) -> bool {
        self.flags.contains(LocationFlags::REL)
    }
}
