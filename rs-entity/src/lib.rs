pub mod anim;
pub mod entity;
pub mod interp;
pub mod location;
pub mod model;
pub mod player;
pub mod registry;
pub mod render;
pub mod skin;
pub mod tab_list;

pub use anim::{AnimPose, AnimatedComp, Tilt, TiltComp};
pub use entity::{Entity, EntityKind, SkinFetch, SkinState};
pub use interp::{InterpBase, InterpState, LocalInterpComp, NetInterpComp};
pub use location::{LocationFlags, LocationUpdate};
pub use model::ModelDef;
pub use player::{Behavior, Capability, LocalPlayer, NetPlayer, TickContext, WarnedCapabilities};
pub use registry::{Entities, EntityId, MAX_ENTITIES};
pub use render::{FrameContext, ModelDraw, NameTexture, RenderBackend, TextureId};
pub use skin::{FetchResult, SkinDownloader, SkinError, SkinSource, SkinType};
pub use tab_list::{TabEntry, TabList};

#[cfg(test)]
mod tests;
