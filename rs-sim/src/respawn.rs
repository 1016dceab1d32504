use bevy::prelude::Vec3;
use rs_utils::{Aabb, BlockWorld, Collide, ENTITY_ADJUSTMENT, touches_any};

use crate::body::PhysicsBody;

/// Top of the highest solid block intersecting `bb`, or `None` when the box
/// is free.
pub fn highest_obstruction<W: BlockWorld + ?Sized>(world: &W, bb: &Aabb) -> Option<f32> {
    let registry = world.blocks();
    let min = bb.min.floor().as_ivec3();
    let max = bb.max.floor().as_ivec3();

    let mut highest: Option<f32> = None;
    for y in min.y..=max.y {
        for z in min.z..=max.z {
            for x in min.x..=max.x {
                let def = registry.get(world.physics_block_at(x, y, z));
                if def.collide != Collide::Solid {
                    continue;
                }
                let cell = Vec3::new(x as f32, y as f32, z as f32);
                let block_bb = Aabb::new(cell + def.min_bb, cell + def.max_bb);
                if !bb.intersects(&block_bb) {
                    continue;
                }
                highest = Some(highest.map_or(block_bb.max.y, |h| h.max(block_bb.max.y)));
            }
        }
    }
    highest
}

/// Walks up the spawn column from `spawn` until a body of `size` fits, then
/// rests it on whatever sits in that layer. Spawns outside the map are
/// returned unchanged.
pub fn find_spawn<W: BlockWorld + ?Sized>(world: &W, spawn: Vec3, size: Vec3) -> Vec3 {
    let cell = spawn.floor().as_ivec3();
    let mut spawn = spawn;
    if !world.contains(cell) {
        return spawn;
    }

    let registry = world.blocks();
    let mut bb = Aabb::from_feet(spawn, size);
    for y in cell.y..=world.height() {
        if highest_obstruction(world, &bb).is_none() {
            let def = registry.get(world.physics_block_at(cell.x, y, cell.z));
            let height = if def.collide == Collide::Solid { def.max_bb.y } else { 0.0 };
            spawn.y = y as f32 + height + ENTITY_ADJUSTMENT;
            break;
        }
        bb = bb.offset(Vec3::Y);
    }
    spawn
}

/// Probes a zero-height slab 0.01 below the feet for solid blocks.
pub fn probe_on_ground<W: BlockWorld + ?Sized>(world: &W, body: &PhysicsBody) -> bool {
    let mut bb = body.bounds();
    bb.min.y -= 0.01;
    bb.max.y = bb.min.y;
    let registry = world.blocks();
    touches_any(world, &bb, |b| registry.collide(b) == Collide::Solid)
}
