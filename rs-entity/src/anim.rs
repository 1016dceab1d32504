use std::f32::consts::PI;

use bevy::prelude::Vec3;
use rs_utils::lerp;

const ANIM_ARM_MAX: f32 = 60.0_f32 * PI / 180.0;
const ANIM_LEG_MAX: f32 = 80.0_f32 * PI / 180.0;
const ANIM_IDLE_MAX: f32 = 3.0_f32 * PI / 180.0;
const ANIM_IDLE_X_PERIOD: f32 = 2.0 * PI / 5.0;
const ANIM_IDLE_Z_PERIOD: f32 = 2.0 * PI / 3.5;
const TILT_MAX: f32 = 0.15_f32 * PI / 180.0;

/// Limb pose sampled for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AnimPose {
    pub walk_time: f32,
    pub swing: f32,
    pub bob_strength: f32,
    pub left_arm_x: f32,
    pub left_arm_z: f32,
    pub right_arm_x: f32,
    pub right_arm_z: f32,
    pub left_leg_x: f32,
    pub right_leg_x: f32,
    pub bobbing_hor: f32,
    pub bobbing_ver: f32,
    pub bobbing_model: f32,
}

/// Walk cycle and view bob, advanced once per tick from the distance moved.
#[derive(Clone, Debug, Default)]
pub struct AnimatedComp {
    walk_time_o: f32,
    walk_time_n: f32,
    swing_o: f32,
    swing_n: f32,
    bob_strength_o: f32,
    bob_strength_n: f32,
}

impl AnimatedComp {
    pub fn update(&mut self, prev: Vec3, next: Vec3, delta: f32, on_ground: bool, view_bobbing: bool) {
        self.walk_time_o = self.walk_time_n;
        self.swing_o = self.swing_n;
        let dx = next.x - prev.x;
        let dz = next.z - prev.z;
        let distance = (dx * dx + dz * dz).sqrt();

        if distance > 0.05 {
            self.walk_time_n += distance * 2.0 * (20.0 * delta);
            self.swing_n += delta * 3.0;
        } else {
            self.swing_n -= delta * 3.0;
        }
        self.swing_n = self.swing_n.clamp(0.0, 1.0);

        self.bob_strength_o = self.bob_strength_n;
        let reduce = !view_bobbing || !on_ground;
        for _ in 0..3 {
            self.bob_strength_n = do_tilt(self.bob_strength_n, reduce);
        }
    }

    pub fn current(&self, t: f32, idle_time: f32) -> AnimPose {
        let swing = lerp(self.swing_o, self.swing_n, t);
        let walk_time = lerp(self.walk_time_o, self.walk_time_n, t);
        let bob_strength = lerp(self.bob_strength_o, self.bob_strength_n, t);

        let idle_x = (idle_time * ANIM_IDLE_X_PERIOD).sin() * ANIM_IDLE_MAX;
        let idle_z = ANIM_IDLE_MAX + (idle_time * ANIM_IDLE_Z_PERIOD).cos() * ANIM_IDLE_MAX;
        let walk_cos = walk_time.cos();
        let walk_sin = walk_time.sin();

        let arm_x = walk_cos * swing * ANIM_ARM_MAX - idle_x;
        let leg_x = -(walk_cos * swing * ANIM_LEG_MAX);

        AnimPose {
            walk_time,
            swing,
            bob_strength,
            left_arm_x: arm_x,
            left_arm_z: -idle_z,
            right_arm_x: -arm_x,
            right_arm_z: idle_z,
            left_leg_x: leg_x,
            right_leg_x: -leg_x,
            bobbing_hor: walk_cos * swing * (2.5 / 16.0),
            bobbing_ver: walk_sin.abs() * swing * (2.5 / 16.0),
            bobbing_model: walk_cos.abs() * swing * (4.0 / 16.0),
        }
    }
}

fn do_tilt(value: f32, reduce: bool) -> f32 {
    let value = if reduce { value * 0.84 } else { value + 0.1 };
    value.clamp(0.0, 1.0)
}

/// Camera tilt driven by walking; fades out while floating.
#[derive(Clone, Debug)]
pub struct TiltComp {
    vel_tilt_strength_o: f32,
    vel_tilt_strength_n: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Tilt {
    pub strength: f32,
    pub tilt_x: f32,
    pub tilt_y: f32,
}

impl Default for TiltComp {
    fn default() -> Self {
        Self {
            vel_tilt_strength_o: 1.0,
            vel_tilt_strength_n: 1.0,
        }
    }
}

impl TiltComp {
    pub fn update(&mut self, floating: bool) {
        self.vel_tilt_strength_o = self.vel_tilt_strength_n;
        for _ in 0..3 {
            self.vel_tilt_strength_n = do_tilt(self.vel_tilt_strength_n, floating);
        }
    }

    pub fn current(&self, t: f32, pose: &AnimPose) -> Tilt {
        let strength = lerp(self.vel_tilt_strength_o, self.vel_tilt_strength_n, t);
        Tilt {
            strength,
            tilt_x: pose.walk_time.cos() * pose.swing * TILT_MAX,
            tilt_y: pose.walk_time.sin() * pose.swing * TILT_MAX,
        }
    }
}
