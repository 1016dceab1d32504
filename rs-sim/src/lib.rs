pub mod body;
pub mod collision;
pub mod hacks;
pub mod physics;
pub mod respawn;

pub use body::PhysicsBody;
pub use collision::{CollisionResult, resolve};
pub use hacks::HacksComp;
pub use physics::{DEFAULT_JUMP_VEL, PhysicsComp, calc_jump_velocity, do_entity_push, max_height};
pub use respawn::{find_spawn, highest_obstruction, probe_on_ground};
