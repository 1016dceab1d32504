use bevy::prelude::Vec3;
use rs_utils::{Aabb, BlockWorld, Collide, touches_any};

/// Liquid checks probe slightly wider than the body on X/Z.
const LIQUID_EXPAND: Vec3 = Vec3::new(0.25 / 16.0, 0.0, 0.25 / 16.0);
/// Rope checks probe slightly above the head.
const ROPE_REACH: f32 = 0.5 / 16.0;

/// Movement state shared by every entity that goes through physics.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhysicsBody {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Collision extents; feet sit at `position`, centred on X/Z.
    pub size: Vec3,
    pub on_ground: bool,
    pub step_size: f32,
    pub gravity: f32,
    pub drag: Vec3,
    pub ground_friction: Vec3,
}

impl Default for PhysicsBody {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            size: Vec3::new(8.6 / 16.0, 28.1 / 16.0, 8.6 / 16.0),
            on_ground: false,
            step_size: 0.5,
            gravity: 0.08,
            drag: Vec3::new(0.91, 0.98, 0.91),
            ground_friction: Vec3::new(0.6, 1.0, 0.6),
        }
    }
}

impl PhysicsBody {
    pub fn bounds(&self) -> Aabb {
        Aabb::from_feet(self.position, self.size)
    }

    pub fn touches_any_rope<W: BlockWorld + ?Sized>(&self, world: &W) -> bool {
        let mut bounds = self.bounds();
        bounds.max.y += ROPE_REACH;
        let blocks = world.blocks();
        touches_any(world, &bounds, |b| blocks.extended_collide(b) == Collide::ClimbRope)
    }

    pub fn touches_any_lava<W: BlockWorld + ?Sized>(&self, world: &W) -> bool {
        let bounds = self.bounds().expand(LIQUID_EXPAND);
        let blocks = world.blocks();
        touches_any(world, &bounds, |b| blocks.extended_collide(b) == Collide::LiquidLava)
    }

    pub fn touches_any_water<W: BlockWorld + ?Sized>(&self, world: &W) -> bool {
        let bounds = self.bounds().expand(LIQUID_EXPAND);
        let blocks = world.blocks();
        touches_any(world, &bounds, |b| blocks.extended_collide(b) == Collide::LiquidWater)
    }
}
