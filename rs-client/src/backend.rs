use bevy::prelude::{Resource, Vec2, Vec3};
use image::RgbaImage;
use rs_entity::{ModelDraw, NameTexture, RenderBackend, TextureId};
use rs_utils::{Aabb, ShadowMode};
use tracing::trace;

const GLYPH_WIDTH: u32 = 8;
const GLYPH_HEIGHT: u32 = 16;

/// Counts of what one frame asked the renderer to do.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub models: usize,
    pub names: usize,
    pub shadows: usize,
}

/// Renderer stand-in for running without a window. Tracks texture handles
/// and counts draw calls.
#[derive(Debug, Default, Resource)]
pub struct HeadlessBackend {
    next_texture: u32,
    live_textures: usize,
    frame: FrameStats,
}

impl HeadlessBackend {
    fn alloc(&mut self) -> TextureId {
        self.next_texture += 1;
        self.live_textures += 1;
        TextureId(self.next_texture)
    }

    pub fn live_textures(&self) -> usize {
        self.live_textures
    }

    /// Returns the stats of the frame just drawn and starts a new one.
    pub fn end_frame(&mut self) -> FrameStats {
        std::mem::take(&mut self.frame)
    }
}

impl RenderBackend for HeadlessBackend {
    fn create_texture(&mut self, image: &RgbaImage) -> TextureId {
        let id = self.alloc();
        trace!(?id, width = image.width(), height = image.height(), "texture created");
        id
    }

    fn delete_texture(&mut self, id: TextureId) {
        self.live_textures = self.live_textures.saturating_sub(1);
        trace!(?id, "texture deleted");
    }

    fn make_name_texture(&mut self, name: &str) -> Option<NameTexture> {
        let glyphs = rs_utils::strip_color_codes(name).chars().count() as u32;
        if glyphs == 0 {
            return None;
        }
        Some(NameTexture {
            id: self.alloc(),
            width: glyphs * GLYPH_WIDTH,
            height: GLYPH_HEIGHT,
        })
    }

    fn draw_model(&mut self, draw: &ModelDraw) {
        self.frame.models += 1;
        trace!(entity = draw.entity, model = draw.model.name, "draw model");
    }

    fn draw_name(&mut self, _texture: &NameTexture, _pos: Vec3, _size: Vec2) {
        self.frame.names += 1;
    }

    fn draw_shadow(&mut self, _entity: u8, _pos: Vec3, _scale: f32, _mode: ShadowMode) {
        self.frame.shadows += 1;
    }

    fn is_visible(&self, _bounds: &Aabb) -> bool {
        true
    }

    fn clip_w(&self, _pos: Vec3) -> f32 {
        1.0
    }
}
