use bevy::prelude::Vec3;
use rs_utils::{Aabb, BlockDef};

const fn px(v: f32) -> f32 {
    v / 16.0
}

const fn px3(x: f32, y: f32, z: f32) -> Vec3 {
    Vec3::new(px(x), px(y), px(z))
}

/// Static description of an entity model. Mesh data lives with the renderer;
/// this is everything the simulation needs to know.
#[derive(Debug, PartialEq)]
pub struct ModelDef {
    pub name: &'static str,
    /// Collision extents at scale 1.
    pub collision_size: Vec3,
    pub picking_min: Vec3,
    pub picking_max: Vec3,
    pub eye_y: f32,
    pub max_scale: f32,
    pub uses_skin: bool,
    /// Skin follows the 64x32 / 64x64 player layout, so the hat filter
    /// applies.
    pub uses_human_skin: bool,
    pub name_y_offset: f32,
    pub name_scale: f32,
    pub shadow_scale: f32,
    pub gravity: f32,
    pub drag: Vec3,
    pub ground_friction: Vec3,
}

const BASE: ModelDef = ModelDef {
    name: "",
    collision_size: px3(8.6, 28.1, 8.6),
    picking_min: px3(-8.0, 0.0, -4.0),
    picking_max: px3(8.0, 32.0, 4.0),
    eye_y: px(26.0),
    max_scale: 2.0,
    uses_skin: true,
    uses_human_skin: false,
    name_y_offset: px(32.5),
    name_scale: 1.0,
    shadow_scale: 1.0,
    gravity: 0.08,
    drag: Vec3::new(0.91, 0.98, 0.91),
    ground_friction: Vec3::new(0.6, 1.0, 0.6),
};

pub static HUMANOID: ModelDef = ModelDef {
    name: "humanoid",
    uses_human_skin: true,
    ..BASE
};

pub static CHIBI: ModelDef = ModelDef {
    name: "chibi",
    collision_size: px3(4.6, 20.1, 4.6),
    picking_min: px3(-4.0, 0.0, -4.0),
    picking_max: px3(4.0, 16.0, 4.0),
    eye_y: px(14.0),
    max_scale: 3.0,
    uses_human_skin: true,
    name_y_offset: px(20.2),
    shadow_scale: 0.5,
    ..BASE
};

pub static CHICKEN: ModelDef = ModelDef {
    name: "chicken",
    collision_size: px3(8.0, 12.0, 8.0),
    picking_min: px3(-4.0, 0.0, -8.0),
    picking_max: px3(4.0, 15.0, 4.0),
    eye_y: px(14.0),
    name_y_offset: px(16.0),
    shadow_scale: 0.5,
    ..BASE
};

pub static CREEPER: ModelDef = ModelDef {
    name: "creeper",
    collision_size: px3(8.0, 26.0, 8.0),
    picking_min: px3(-4.0, 0.0, -6.0),
    picking_max: px3(4.0, 26.0, 6.0),
    eye_y: px(22.0),
    name_y_offset: px(26.5),
    ..BASE
};

pub static PIG: ModelDef = ModelDef {
    name: "pig",
    collision_size: px3(14.0, 14.0, 14.0),
    picking_min: px3(-5.0, 0.0, -14.0),
    picking_max: px3(5.0, 16.0, 9.0),
    eye_y: px(12.0),
    name_y_offset: px(17.0),
    ..BASE
};

pub static SHEEP: ModelDef = ModelDef {
    name: "sheep",
    collision_size: px3(10.0, 20.0, 10.0),
    picking_min: px3(-6.0, 0.0, -13.0),
    picking_max: px3(6.0, 23.0, 10.0),
    eye_y: px(20.0),
    name_y_offset: px(24.0),
    ..BASE
};

pub static SKELETON: ModelDef = ModelDef {
    name: "skeleton",
    collision_size: px3(8.0, 28.1, 8.0),
    picking_min: px3(-4.0, 0.0, -4.0),
    picking_max: px3(4.0, 32.0, 4.0),
    ..BASE
};

pub static SPIDER: ModelDef = ModelDef {
    name: "spider",
    collision_size: px3(15.0, 12.0, 15.0),
    picking_min: px3(-5.0, 0.0, -11.0),
    picking_max: px3(5.0, 12.0, 15.0),
    eye_y: px(8.0),
    name_y_offset: px(14.0),
    ..BASE
};

pub static ZOMBIE: ModelDef = ModelDef {
    name: "zombie",
    collision_size: px3(8.0, 28.1, 8.0),
    picking_min: px3(-4.0, 0.0, -4.0),
    picking_max: px3(4.0, 32.0, 4.0),
    ..BASE
};

pub static HEAD: ModelDef = ModelDef {
    name: "head",
    collision_size: px3(7.9, 7.9, 7.9),
    picking_min: px3(-4.0, 0.0, -4.0),
    picking_max: px3(4.0, 8.0, 4.0),
    eye_y: px(6.0),
    uses_human_skin: true,
    name_y_offset: px(8.5),
    shadow_scale: 0.5,
    ..BASE
};

/// Extents are placeholders; block models take them from the bound block
/// via [`block_bounds`].
pub static BLOCK: ModelDef = ModelDef {
    name: "block",
    collision_size: px3(15.75, 15.75, 15.75),
    picking_min: px3(-8.0, 0.0, -8.0),
    picking_max: px3(8.0, 16.0, 8.0),
    eye_y: px(8.0),
    max_scale: 3.0,
    uses_skin: false,
    name_y_offset: px(16.5),
    ..BASE
};

static MODELS: [&ModelDef; 11] = [
    &HUMANOID, &CHIBI, &CHICKEN, &CREEPER, &PIG, &SHEEP, &SKELETON, &SPIDER, &ZOMBIE, &HEAD,
    &BLOCK,
];

/// Case-insensitive model lookup.
pub fn lookup(name: &str) -> Option<&'static ModelDef> {
    MODELS
        .iter()
        .copied()
        .find(|model| model.name.eq_ignore_ascii_case(name))
}

/// Collision size, picking box and eye height of a block model, centred on
/// X/Z like the other models.
pub fn block_bounds(def: &BlockDef) -> (Vec3, Aabb, f32) {
    let size = def.max_bb - def.min_bb;
    let half = Vec3::new(size.x / 2.0, 0.0, size.z / 2.0);
    let picking = Aabb::new(-half, Vec3::new(half.x, size.y, half.z));
    let collision = Vec3::new(size.x.max(px(0.5)), size.y.max(px(0.5)), size.z.max(px(0.5)));
    (collision, picking, def.min_bb.y + size.y / 2.0)
}
