use bevy::prelude::{Mat4, Vec2, Vec3};
use rs_sim::PhysicsBody;
use rs_utils::block::BLOCK_AIR;
use rs_utils::{Aabb, BlockId, BlockRegistry, BlockWorld, PackedCol, is_url};
use tracing::debug;

use crate::anim::AnimatedComp;
use crate::model::{self, ModelDef};
use crate::render::{NameTexture, TextureId};
use crate::skin::SkinType;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EntityKind {
    #[default]
    Generic,
    Player,
}

/// Progress of the skin download for the current skin key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SkinFetch {
    #[default]
    NotStarted,
    Downloading,
    Completed,
}

/// Skin binding of one entity. Texture handles may be shared with every
/// other entity using the same `skin_name`.
#[derive(Clone, Debug, PartialEq)]
pub struct SkinState {
    pub skin_name: String,
    pub fetch: SkinFetch,
    pub texture: Option<TextureId>,
    /// Texture used by non-human models when the skin is a URL.
    pub mob_texture: Option<TextureId>,
    pub skin_type: SkinType,
    pub uv_scale: Vec2,
}

impl Default for SkinState {
    fn default() -> Self {
        Self {
            skin_name: String::new(),
            fetch: SkinFetch::NotStarted,
            texture: None,
            mob_texture: None,
            skin_type: SkinType::Skin64x32,
            uv_scale: Vec2::ONE,
        }
    }
}

impl SkinState {
    /// Back to the default appearance. The fetch state is kept so the key
    /// is not requested again.
    pub fn reset(&mut self) {
        self.texture = None;
        self.mob_texture = None;
        self.skin_type = SkinType::Skin64x32;
        self.uv_scale = Vec2::ONE;
    }

    /// Copies the resolved texture binding of another holder of the same key.
    pub fn apply_from(&mut self, other: &SkinState) {
        self.texture = other.texture;
        self.skin_type = other.skin_type;
        self.uv_scale = other.uv_scale;
        self.mob_texture = if is_url(&self.skin_name) {
            self.texture
        } else {
            None
        };
    }
}

/// Shared state of every entity. Variant specific state lives in the
/// registry's behavior slot.
#[derive(Clone, Debug)]
pub struct Entity {
    pub id: u8,
    pub kind: EntityKind,
    pub body: PhysicsBody,
    pub old_velocity: Vec3,
    /// Head pitch in degrees.
    pub head_x: f32,
    /// Head yaw in degrees.
    pub head_y: f32,
    pub rot_x: f32,
    /// Body yaw in degrees; trails `head_y` when interpolated.
    pub rot_y: f32,
    pub rot_z: f32,
    pub name: String,
    pub name_texture: Option<NameTexture>,
    pub skin: SkinState,
    pub model: &'static ModelDef,
    pub model_block: BlockId,
    pub model_is_sheep_no_fur: bool,
    pub anim: AnimatedComp,
    pub should_render: bool,
    model_scale: Vec3,
    model_aabb: Aabb,
    base_size: Vec3,
    base_picking: Aabb,
    base_eye_y: f32,
}

impl Entity {
    pub fn new(id: u8, kind: EntityKind) -> Self {
        let mut entity = Self {
            id,
            kind,
            body: PhysicsBody::default(),
            old_velocity: Vec3::ZERO,
            head_x: 0.0,
            head_y: 0.0,
            rot_x: 0.0,
            rot_y: 0.0,
            rot_z: 0.0,
            name: String::new(),
            name_texture: None,
            skin: SkinState::default(),
            model: &model::HUMANOID,
            model_block: BLOCK_AIR,
            model_is_sheep_no_fur: false,
            anim: AnimatedComp::default(),
            should_render: true,
            model_scale: Vec3::ONE,
            model_aabb: Aabb::new(Vec3::ZERO, Vec3::ZERO),
            base_size: Vec3::ZERO,
            base_picking: Aabb::new(Vec3::ZERO, Vec3::ZERO),
            base_eye_y: 0.0,
        };
        entity.bind_model(&model::HUMANOID, None);
        entity
    }

    pub fn position(&self) -> Vec3 {
        self.body.position
    }

    pub fn model_scale(&self) -> Vec3 {
        self.model_scale
    }

    /// Picking box relative to the entity position.
    pub fn model_aabb(&self) -> Aabb {
        self.model_aabb
    }

    pub fn eye_height(&self) -> f32 {
        self.base_eye_y * self.model_scale.y
    }

    pub fn eye_position(&self) -> Vec3 {
        self.body.position + Vec3::new(0.0, self.eye_height(), 0.0)
    }

    /// Model matrix: scale, then roll, pitch and yaw, then translate.
    pub fn transform(&self, pos: Vec3, scale: Vec3) -> Mat4 {
        Mat4::from_translation(pos)
            * Mat4::from_rotation_y(-self.rot_y.to_radians())
            * Mat4::from_rotation_x(-self.rot_x.to_radians())
            * Mat4::from_rotation_z(-self.rot_z.to_radians())
            * Mat4::from_scale(scale)
    }

    pub fn bounds(&self) -> Aabb {
        self.body.bounds()
    }

    pub fn picking_bounds(&self) -> Aabb {
        self.model_aabb.offset(self.body.position)
    }

    /// Binds a model from `name` or `name|scale`. Unknown names are tried as
    /// a block, then fall back to the humanoid model. `giant` is a humanoid
    /// at twice the size regardless of any scale suffix.
    pub fn set_model(&mut self, model: &str, blocks: &BlockRegistry) {
        let (name, scale) = match model.split_once('|') {
            Some((name, scale)) => (name, scale.trim().parse::<f32>().ok()),
            None => (model, None),
        };
        let name = name.trim();

        self.model_block = BLOCK_AIR;
        self.model_is_sheep_no_fur = name.eq_ignore_ascii_case("sheep_nofur");

        let (def, scale) = if name.eq_ignore_ascii_case("giant") {
            (&model::HUMANOID, Some(2.0))
        } else if self.model_is_sheep_no_fur {
            (&model::SHEEP, scale)
        } else if let Some(def) = model::lookup(name) {
            (def, scale)
        } else if let Some(block) = blocks.parse(name) {
            self.model_block = block;
            (&model::BLOCK, scale)
        } else {
            debug!(entity = self.id, model = name, "unknown model, using humanoid");
            (&model::HUMANOID, scale)
        };

        let block_def = (self.model_block != BLOCK_AIR).then(|| blocks.get(self.model_block));
        self.bind_model(def, block_def.map(model::block_bounds));

        self.model_scale = Vec3::ONE;
        if let Some(scale) = scale.filter(|s| s.is_finite()) {
            self.model_scale = Vec3::splat(scale.clamp(0.01, def.max_scale));
        }
        self.update_model_bounds();

        self.skin.mob_texture = if is_url(&self.skin.skin_name) {
            self.skin.texture
        } else {
            None
        };
    }

    fn bind_model(&mut self, def: &'static ModelDef, block: Option<(Vec3, Aabb, f32)>) {
        self.model = def;
        match block {
            Some((size, picking, eye_y)) => {
                self.base_size = size;
                self.base_picking = picking;
                self.base_eye_y = eye_y;
            }
            None => {
                self.base_size = def.collision_size;
                self.base_picking = Aabb::new(def.picking_min, def.picking_max);
                self.base_eye_y = def.eye_y;
            }
        }
        self.body.gravity = def.gravity;
        self.body.drag = def.drag;
        self.body.ground_friction = def.ground_friction;
        self.update_model_bounds();
    }

    /// Re-derives collision size and picking box from the bound model and
    /// the current scale.
    pub fn update_model_bounds(&mut self) {
        self.body.size = self.base_size * self.model_scale;
        self.model_aabb = self.base_picking.scaled(self.model_scale);
    }

    /// Light at the eye, or the sun colour when the eye is outside the map.
    pub fn light_color<W: BlockWorld + ?Sized>(&self, world: &W) -> PackedCol {
        let eye = self.eye_position().floor().as_ivec3();
        if world.contains(eye) {
            world.light_color(eye.x, eye.y, eye.z)
        } else {
            world.sun_color()
        }
    }

    pub fn touches_any_rope<W: BlockWorld + ?Sized>(&self, world: &W) -> bool {
        self.body.touches_any_rope(world)
    }

    pub fn touches_any_lava<W: BlockWorld + ?Sized>(&self, world: &W) -> bool {
        self.body.touches_any_lava(world)
    }

    pub fn touches_any_water<W: BlockWorld + ?Sized>(&self, world: &W) -> bool {
        self.body.touches_any_water(world)
    }
}
