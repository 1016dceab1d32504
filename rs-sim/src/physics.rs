use bevy::prelude::Vec3;
use rs_utils::block::BLOCK_AIR;
use rs_utils::{Aabb, BlockWorld, Collide, touches_any};

use crate::body::PhysicsBody;
use crate::collision::resolve;
use crate::hacks::HacksComp;

const LIQUID_GRAVITY: f32 = 0.02;
const ROPE_GRAVITY: f32 = 0.034;
const WATER_DRAG: Vec3 = Vec3::splat(0.8);
const LAVA_DRAG: Vec3 = Vec3::splat(0.5);
const ROPE_DRAG: Vec3 = Vec3::new(0.5, 0.85, 0.5);
const MAX_HOR_SPEED: f32 = 75.0;

pub const DEFAULT_JUMP_VEL: f32 = 0.42;

/// Jump and liquid state of the local player's movement integrator.
#[derive(Clone, Debug)]
pub struct PhysicsComp {
    pub jumping: bool,
    pub can_liquid_jump: bool,
    pub use_liquid_gravity: bool,
    /// Extra jumps taken since last touching the ground.
    pub multi_jumps: i32,
    pub jump_vel: f32,
    pub user_jump_vel: f32,
    pub server_jump_vel: f32,
    pub hit_horizontal: bool,
}

impl Default for PhysicsComp {
    fn default() -> Self {
        Self {
            jumping: false,
            can_liquid_jump: true,
            use_liquid_gravity: false,
            multi_jumps: 0,
            jump_vel: DEFAULT_JUMP_VEL,
            user_jump_vel: DEFAULT_JUMP_VEL,
            server_jump_vel: DEFAULT_JUMP_VEL,
            hit_horizontal: false,
        }
    }
}

impl PhysicsComp {
    /// Applies vertical intent for this tick: flying up/down, rope and
    /// liquid climbing, or a plain jump off the ground.
    pub fn update_velocity_state<W: BlockWorld + ?Sized>(
        &mut self,
        body: &mut PhysicsBody,
        hacks: &HacksComp,
        world: &W,
    ) {
        if hacks.floating {
            body.velocity.y = 0.0;
            let dir = if hacks.flying_up || self.jumping {
                1.0
            } else if hacks.flying_down {
                -1.0
            } else {
                0.0
            };

            body.velocity.y += 0.12 * dir;
            if hacks.speeding && hacks.can_speed {
                body.velocity.y += 0.12 * dir;
            }
            if hacks.half_speeding && hacks.can_speed {
                body.velocity.y += 0.06 * dir;
            }
        } else if self.jumping && body.touches_any_rope(world) && body.velocity.y > 0.02 {
            body.velocity.y = 0.02;
        }

        if !self.jumping {
            self.can_liquid_jump = false;
            return;
        }

        let touch_water = body.touches_any_water(world);
        let touch_lava = body.touches_any_lava(world);

        if touch_water || touch_lava {
            let mut bounds = body.bounds();
            let feet_y = bounds.min.y.floor();
            let head_y = bounds.max.y.floor();
            let body_y = (feet_y + 1.0).min(head_y);

            let blocks = world.blocks();
            let is_liquid = |b| blocks.collide(b) == Collide::Liquid;

            bounds.min.y = feet_y;
            bounds.max.y = feet_y;
            let liquid_feet = touches_any(world, &bounds, is_liquid);
            bounds.min.y = body_y.min(head_y);
            bounds.max.y = body_y.max(head_y);
            let liquid_rest = touches_any(world, &bounds, is_liquid);

            let frac_y = body.position.y - body.position.y.floor();
            let past_jump_point = liquid_feet && !liquid_rest && frac_y >= 0.4;
            if !past_jump_point {
                self.can_liquid_jump = true;
                body.velocity.y += 0.04;
                if hacks.speeding && hacks.can_speed {
                    body.velocity.y += 0.04;
                }
                if hacks.half_speeding && hacks.can_speed {
                    body.velocity.y += 0.02;
                }
            } else {
                // Either climbing out onto a ledge, or bobbing at the surface.
                if self.hit_horizontal {
                    body.velocity.y += if touch_lava { 0.30 } else { 0.13 };
                } else if self.can_liquid_jump {
                    body.velocity.y += if touch_lava { 0.20 } else { 0.10 };
                }
                self.can_liquid_jump = false;
            }
        } else if self.use_liquid_gravity {
            body.velocity.y += 0.04;
            if hacks.speeding && hacks.can_speed {
                body.velocity.y += 0.04;
            }
            if hacks.half_speeding && hacks.can_speed {
                body.velocity.y += 0.02;
            }
            self.can_liquid_jump = false;
        } else if body.touches_any_rope(world) {
            body.velocity.y += if hacks.speeding && hacks.can_speed { 0.15 } else { 0.10 };
            self.can_liquid_jump = false;
        } else if body.on_ground {
            self.do_normal_jump(body, hacks);
        }
    }

    pub fn do_normal_jump(&mut self, body: &mut PhysicsBody, hacks: &HacksComp) {
        if self.jump_vel == 0.0 || hacks.max_jumps == 0 {
            return;
        }

        body.velocity.y = self.jump_vel;
        if hacks.speeding && hacks.can_speed {
            body.velocity.y += self.jump_vel;
        }
        if hacks.half_speeding && hacks.can_speed {
            body.velocity.y += self.jump_vel / 2.0;
        }
        self.can_liquid_jump = false;
    }

    /// Integrates one tick of movement along `heading` (world-space input
    /// direction, unnormalised).
    pub fn physics_tick<W: BlockWorld + ?Sized>(
        &mut self,
        body: &mut PhysicsBody,
        hacks: &HacksComp,
        world: &W,
        heading: Vec3,
    ) {
        if hacks.noclip {
            body.on_ground = false;
        }
        let base_speed = self.base_speed(body, world);
        let mut ver_speed = base_speed * (speed(hacks, 8.0) / 5.0);
        let mut hor_speed = base_speed * speed(hacks, 8.0 / 5.0) * hacks.base_hor_speed;
        hor_speed = hor_speed.clamp(-MAX_HOR_SPEED, MAX_HOR_SPEED);
        if ver_speed < base_speed {
            ver_speed = base_speed;
        }

        let wom_speed_boost = hacks.can_double_jump && hacks.wom_style_hacks;
        if !hacks.floating && wom_speed_boost {
            if self.multi_jumps == 1 {
                hor_speed *= 46.5;
                ver_speed *= 7.5;
            } else if self.multi_jumps > 1 {
                hor_speed *= 93.0;
                ver_speed *= 10.0;
            }
        }

        if !hacks.floating && body.touches_any_water(world) {
            self.move_normal(body, hacks, world, heading, 0.02 * hor_speed, WATER_DRAG, LIQUID_GRAVITY, ver_speed);
        } else if !hacks.floating && body.touches_any_lava(world) {
            self.move_normal(body, hacks, world, heading, 0.02 * hor_speed, LAVA_DRAG, LIQUID_GRAVITY, ver_speed);
        } else if !hacks.floating && body.touches_any_rope(world) {
            self.move_normal(body, hacks, world, heading, 0.02 * 1.7, ROPE_DRAG, ROPE_GRAVITY, ver_speed);
        } else {
            let factor = if hacks.floating || body.on_ground { 0.1 } else { 0.02 };
            let gravity = if self.use_liquid_gravity { LIQUID_GRAVITY } else { body.gravity };
            let drag = body.drag;

            if hacks.floating {
                self.move_flying(body, hacks, world, heading, factor * hor_speed, drag, gravity, ver_speed);
            } else {
                self.move_normal(body, hacks, world, heading, factor * hor_speed, drag, gravity, ver_speed);
            }

            if body.on_ground || hacks.flying {
                body.velocity *= body.ground_friction;
            }
        }

        if body.on_ground {
            self.multi_jumps = 0;
        }
    }

    /// Slowest block speed modifier around the body, falling back to what it
    /// stands on. Also decides whether liquid gravity applies.
    fn base_speed<W: BlockWorld + ?Sized>(&mut self, body: &PhysicsBody, world: &W) -> f32 {
        let mut bounds = body.bounds();
        self.use_liquid_gravity = false;
        let base = self.lowest_modifier(world, &bounds, false);
        bounds.min.y -= 0.5 / 16.0;
        let solid = self.lowest_modifier(world, &bounds, true);

        base.or(solid).unwrap_or(1.0)
    }

    fn lowest_modifier<W: BlockWorld + ?Sized>(
        &mut self,
        world: &W,
        bounds: &Aabb,
        check_solid: bool,
    ) -> Option<f32> {
        let blocks = world.blocks();
        let mut lowest: Option<f32> = None;
        let mut in_water = false;
        touches_any(world, bounds, |block| {
            if block == BLOCK_AIR {
                return false;
            }
            let def = blocks.get(block);
            if def.is_solid() && !check_solid {
                return false;
            }
            lowest = Some(lowest.map_or(def.speed_multiplier, |l| l.min(def.speed_multiplier)));
            if def.extended_collide == Collide::LiquidWater {
                in_water = true;
            }
            false
        });
        if in_water {
            self.use_liquid_gravity = true;
        }
        lowest
    }

    #[allow(clippy::too_many_arguments)]
    fn move_normal<W: BlockWorld + ?Sized>(
        &mut self,
        body: &mut PhysicsBody,
        hacks: &HacksComp,
        world: &W,
        heading: Vec3,
        factor: f32,
        drag: Vec3,
        gravity: f32,
        y_mul: f32,
    ) {
        move_hor(body, heading, factor);
        self.move_body(body, hacks, world, drag, gravity, y_mul);
    }

    #[allow(clippy::too_many_arguments)]
    fn move_flying<W: BlockWorld + ?Sized>(
        &mut self,
        body: &mut PhysicsBody,
        hacks: &HacksComp,
        world: &W,
        heading: Vec3,
        factor: f32,
        drag: Vec3,
        gravity: f32,
        mut y_mul: f32,
    ) {
        move_hor(body, heading, factor);
        let y_vel = (body.velocity.x * body.velocity.x + body.velocity.z * body.velocity.z).sqrt();
        // Match vertical fly speed to horizontal speed while moving.
        if (heading.x != 0.0 || heading.z != 0.0) && y_vel > 0.001 {
            body.velocity.y = 0.0;
            y_mul = 1.0;
            if hacks.flying_up || self.jumping {
                body.velocity.y += y_vel;
            }
            if hacks.flying_down {
                body.velocity.y -= y_vel;
            }
        }
        self.move_body(body, hacks, world, drag, gravity, y_mul);
    }

    fn move_body<W: BlockWorld + ?Sized>(
        &mut self,
        body: &mut PhysicsBody,
        hacks: &HacksComp,
        world: &W,
        drag: Vec3,
        gravity: f32,
        y_mul: f32,
    ) {
        body.velocity.y *= y_mul;
        if hacks.noclip {
            body.position += body.velocity;
            self.hit_horizontal = false;
        } else {
            let result = resolve(world, body);
            body.position = result.pos;
            body.velocity = result.vel;
            body.on_ground = result.on_ground;
            self.hit_horizontal = result.hit_horizontal;
        }

        body.velocity.y /= y_mul;
        body.velocity *= drag;
        body.velocity.y -= gravity;
    }
}

fn move_hor(body: &mut PhysicsBody, heading: Vec3, factor: f32) {
    let dist = (heading.x * heading.x + heading.z * heading.z).sqrt();
    if dist < 0.00001 {
        return;
    }
    let dist = dist.max(1.0);
    body.velocity += heading * (factor / dist);
}

fn speed(hacks: &HacksComp, speed_mul: f32) -> f32 {
    let factor = if hacks.floating { speed_mul } else { 1.0 };
    let mut speed = factor;
    if hacks.speeding && hacks.can_speed {
        speed += factor * hacks.speed_multiplier;
    }
    if hacks.half_speeding && hacks.can_speed {
        speed += factor * hacks.speed_multiplier / 2.0;
    }
    if hacks.can_speed { speed } else { speed.min(1.0) }
}

/// Nudges `body` away from overlapping neighbours, given as
/// `(position, size)` pairs.
pub fn do_entity_push(body: &mut PhysicsBody, others: impl IntoIterator<Item = (Vec3, Vec3)>) {
    for (other_pos, other_size) in others {
        let y_intersects = body.position.y <= other_pos.y + other_size.y
            && other_pos.y <= body.position.y + body.size.y;
        if !y_intersects {
            continue;
        }

        let dx = other_pos.x - body.position.x;
        let dz = other_pos.z - body.position.z;
        let dist = dx * dx + dz * dz;
        if !(0.002..=1.0).contains(&dist) {
            continue;
        }

        let dir = Vec3::new(dx, 0.0, dz).normalize();
        let push_strength = (1.0 - dist) / 32.0;
        body.velocity -= dir * push_strength;
    }
}

fn y_pos_at(t: f64, u: f64) -> f64 {
    // x(t, u) = sum of v(t, u) = (4 + u) * 0.98^t - 4 over each tick
    let a = (-0.0202027 * t).exp();
    a * (-49.0 * u - 196.0) - 4.0 * t + 50.0 * u + 196.0
}

/// Peak height reached by a jump with initial vertical velocity `u`.
pub fn max_height(u: f32) -> f32 {
    let u = u as f64;
    let t = 49.49831645 * (0.247483075 * u + 0.9899323).ln();
    let floor = y_pos_at(t.floor(), u);
    let ceil = y_pos_at(t.ceil(), u);
    floor.max(ceil) as f32
}

/// Smallest jump velocity (in 0.001 steps) that clears `height`.
pub fn calc_jump_velocity(height: f32) -> f32 {
    if height <= 0.0 {
        return 0.0;
    }
    if height >= 768.0 {
        return 22.5;
    }
    if height >= 512.0 {
        return 16.5;
    }
    if height >= 256.0 {
        return 10.0;
    }

    let mut jump_vel = 0.0f32;
    while max_height(jump_vel) <= height {
        jump_vel += 0.001;
    }
    jump_vel
}
