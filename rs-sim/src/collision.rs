use bevy::prelude::Vec3;
use rs_utils::{Aabb, BlockWorld};

use crate::body::PhysicsBody;

const COLLISION_EPS: f32 = 1e-5;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionResult {
    pub pos: Vec3,
    pub vel: Vec3,
    pub on_ground: bool,
    pub hit_horizontal: bool,
}

/// Solid block boxes touching `min..max`. Cells outside the map resolve
/// through [`BlockWorld::physics_block_at`], so the map edges and floor act
/// as walls.
fn collect_collision_boxes<W: BlockWorld + ?Sized>(world: &W, min: Vec3, max: Vec3) -> Vec<Aabb> {
    let (min_x, max_x) = block_range(min.x, max.x);
    let (min_y, max_y) = block_range(min.y, max.y);
    let (min_z, max_z) = block_range(min.z, max.z);
    let registry = world.blocks();

    let mut boxes = Vec::new();
    for y in min_y..=max_y {
        for z in min_z..=max_z {
            for x in min_x..=max_x {
                let def = registry.get(world.physics_block_at(x, y, z));
                if !def.is_solid() {
                    continue;
                }
                let cell = Vec3::new(x as f32, y as f32, z as f32);
                boxes.push(Aabb::new(cell + def.min_bb, cell + def.max_bb));
            }
        }
    }
    boxes
}

fn block_range(min: f32, max: f32) -> (i32, i32) {
    let min_i = (min + COLLISION_EPS).floor() as i32;
    let max_i = (max - COLLISION_EPS).floor() as i32;
    if min_i <= max_i {
        (min_i, max_i)
    } else {
        (max_i, min_i)
    }
}

/// Moves `body` by its velocity, clipping against solid blocks one axis at a
/// time (Y, X, Z). When a horizontal move is blocked while grounded the move
/// is retried from `step_size` higher and the better of the two is kept.
pub fn resolve<W: BlockWorld + ?Sized>(world: &W, body: &PhysicsBody) -> CollisionResult {
    let pos = body.position;
    let original = body.velocity;
    let mut vel = original;
    let start = body.bounds();

    let broadphase = start.add_coord(vel);
    let mut boxes = collect_collision_boxes(world, broadphase.min, broadphase.max);

    let (swept, mut x, mut y, mut z) = sweep(start, &boxes, original);
    let mut bb = swept;

    let stepped_down = original.y != y && original.y < 0.0;
    let horizontal_blocked = original.x != x || original.z != z;

    if body.step_size > 0.0 && (body.on_ground || stepped_down) && horizontal_blocked {
        let prev = (bb, x, y, z);

        let step = body.step_size;
        let query = start.add_coord(Vec3::new(original.x, step, original.z));
        boxes = collect_collision_boxes(world, query.min, query.max);

        // Candidate A: lift against the swept footprint.
        let lift_query = start.add_coord(Vec3::new(original.x, 0.0, original.z));
        let mut y_a = step;
        for block in &boxes {
            y_a = calculate_y_offset(&lift_query, block, y_a);
        }
        let (bb_a, x_a, _, z_a) = sweep_horizontal(start.offset(Vec3::Y * y_a), &boxes, original);

        // Candidate B: lift in place.
        let mut y_b = step;
        for block in &boxes {
            y_b = calculate_y_offset(&start, block, y_b);
        }
        let (bb_b, x_b, _, z_b) = sweep_horizontal(start.offset(Vec3::Y * y_b), &boxes, original);

        let dist_a = x_a * x_a + z_a * z_a;
        let dist_b = x_b * x_b + z_b * z_b;
        let (lifted_bb, lift) = if dist_a > dist_b {
            x = x_a;
            z = z_a;
            (bb_a, y_a)
        } else {
            x = x_b;
            z = z_b;
            (bb_b, y_b)
        };
        bb = lifted_bb;

        // Settle back down onto whatever is under the new footprint.
        let mut settle = -lift;
        for block in &boxes {
            settle = calculate_y_offset(&bb, block, settle);
        }
        bb = bb.offset(Vec3::Y * settle);
        y = lift + settle;

        let (prev_bb, prev_x, prev_y, prev_z) = prev;
        if prev_x * prev_x + prev_z * prev_z >= x * x + z * z {
            bb = prev_bb;
            x = prev_x;
            y = prev_y;
            z = prev_z;
        }
    }

    vel.x = if original.x != x { 0.0 } else { x };
    vel.y = if original.y != y { 0.0 } else { y };
    vel.z = if original.z != z { 0.0 } else { z };

    let moved = Vec3::new(
        (bb.min.x + bb.max.x) * 0.5,
        bb.min.y,
        (bb.min.z + bb.max.z) * 0.5,
    );
    // Keep the exact start position on untouched axes.
    let pos = Vec3::new(
        if x == 0.0 { pos.x } else { moved.x },
        if y == 0.0 { pos.y } else { moved.y },
        if z == 0.0 { pos.z } else { moved.z },
    );

    CollisionResult {
        pos,
        vel,
        on_ground: original.y != y && original.y < 0.0,
        hit_horizontal: original.x != x || original.z != z,
    }
}

fn sweep(mut bb: Aabb, boxes: &[Aabb], motion: Vec3) -> (Aabb, f32, f32, f32) {
    let mut y = motion.y;
    for block in boxes {
        y = calculate_y_offset(&bb, block, y);
    }
    bb = bb.offset(Vec3::new(0.0, y, 0.0));
    let (bb, x, _, z) = sweep_horizontal(bb, boxes, motion);
    (bb, x, y, z)
}

fn sweep_horizontal(mut bb: Aabb, boxes: &[Aabb], motion: Vec3) -> (Aabb, f32, f32, f32) {
    let mut x = motion.x;
    for block in boxes {
        x = calculate_x_offset(&bb, block, x);
    }
    bb = bb.offset(Vec3::new(x, 0.0, 0.0));

    let mut z = motion.z;
    for block in boxes {
        z = calculate_z_offset(&bb, block, z);
    }
    bb = bb.offset(Vec3::new(0.0, 0.0, z));
    (bb, x, 0.0, z)
}

fn overlap_xz(a: &Aabb, b: &Aabb) -> bool {
    a.max.x > b.min.x && a.min.x < b.max.x && a.max.z > b.min.z && a.min.z < b.max.z
}

fn overlap_yz(a: &Aabb, b: &Aabb) -> bool {
    a.max.y > b.min.y && a.min.y < b.max.y && a.max.z > b.min.z && a.min.z < b.max.z
}

fn overlap_xy(a: &Aabb, b: &Aabb) -> bool {
    a.max.x > b.min.x && a.min.x < b.max.x && a.max.y > b.min.y && a.min.y < b.max.y
}

fn calculate_y_offset(entity: &Aabb, block: &Aabb, mut dy: f32) -> f32 {
    if !overlap_xz(entity, block) {
        return dy;
    }
    if dy > 0.0 && entity.max.y <= block.min.y {
        dy = dy.min(block.min.y - entity.max.y);
    } else if dy < 0.0 && entity.min.y >= block.max.y {
        dy = dy.max(block.max.y - entity.min.y);
    }
    dy
}

fn calculate_x_offset(entity: &Aabb, block: &Aabb, mut dx: f32) -> f32 {
    if !overlap_yz(entity, block) {
        return dx;
    }
    if dx > 0.0 && entity.max.x <= block.min.x {
        dx = dx.min(block.min.x - entity.max.x);
    } else if dx < 0.0 && entity.min.x >= block.max.x {
        dx = dx.max(block.max.x - entity.min.x);
    }
    dx
}

fn calculate_z_offset(entity: &Aabb, block: &Aabb, mut dz: f32) -> f32 {
    if !overlap_xy(entity, block) {
        return dz;
    }
    if dz > 0.0 && entity.max.z <= block.min.z {
        dz = dz.min(block.min.z - entity.max.z);
    } else if dz < 0.0 && entity.min.z >= block.max.z {
        dz = dz.max(block.max.z - entity.min.z);
    }
    dz
}
