use bevy::prelude::{Mat4, Vec2, Vec3};
use image::RgbaImage;
use rs_utils::{Aabb, BlockId, PackedCol, ShadowMode};

use crate::anim::{AnimPose, Tilt};
use crate::model::ModelDef;
use crate::skin::SkinType;

/// Opaque handle to a texture owned by the render backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NameTexture {
    pub id: TextureId,
    pub width: u32,
    pub height: u32,
}

/// Everything needed to draw one entity model for a frame.
#[derive(Clone, Debug)]
pub struct ModelDraw {
    pub entity: u8,
    pub model: &'static ModelDef,
    pub model_block: BlockId,
    pub sheep_no_fur: bool,
    pub transform: Mat4,
    pub texture: Option<TextureId>,
    pub skin_type: SkinType,
    pub uv_scale: Vec2,
    pub light: PackedCol,
    pub pose: AnimPose,
    pub tilt: Option<Tilt>,
}

/// Graphics collaborator. Textures are created and released during the
/// tick; draw calls only happen in the frame pass.
pub trait RenderBackend {
    fn create_texture(&mut self, image: &RgbaImage) -> TextureId;
    fn delete_texture(&mut self, id: TextureId);
    /// Rasterises a player name label. `None` when there is nothing to draw.
    fn make_name_texture(&mut self, name: &str) -> Option<NameTexture>;
    fn draw_model(&mut self, draw: &ModelDraw);
    fn draw_name(&mut self, texture: &NameTexture, pos: Vec3, size: Vec2);
    fn draw_shadow(&mut self, entity: u8, pos: Vec3, scale: f32, mode: ShadowMode);
    /// Frustum test for a world-space box.
    fn is_visible(&self, bounds: &Aabb) -> bool;
    /// Clip-space W of a world position, used to keep unscaled names a
    /// constant size on screen.
    fn clip_w(&self, pos: Vec3) -> f32;
}

/// Per-frame inputs shared by every render pass.
#[derive(Clone, Copy, Debug)]
pub struct FrameContext {
    /// Fraction of the way from the last tick to the next, in [0, 1).
    pub t: f32,
    pub camera_pos: Vec3,
    pub third_person: bool,
    /// Seconds since the client started; drives idle limb sway.
    pub idle_time: f32,
}
