pub mod aabb;
pub mod block;
pub mod color;
pub mod events;
pub mod input;
pub mod math;
pub mod settings;
pub mod text;
pub mod world;

pub use aabb::Aabb;
pub use block::{BlockDef, BlockId, BlockRegistry, Collide};
pub use color::PackedCol;
pub use events::{Chat, EntityEvent, EntityEventQueue};
pub use input::{InputState, KeyBind};
pub use math::{clamp_degrees, dir_vector, lerp, lerp_angle, next_pow2, rotate_x, rotate_y, rotate_z};
pub use settings::{ClientSettings, HacksSettings, NameMode, SettingsError, ShadowMode};
pub use text::{is_url, strip_color_codes};
pub use world::{BlockWorld, WorldMap, touches_any};

/// Offset applied to Y positions sitting exactly on a block boundary so the
/// entity does not start inside the block below.
pub const ENTITY_ADJUSTMENT: f32 = 0.001;

#[cfg(test)]
mod tests;
