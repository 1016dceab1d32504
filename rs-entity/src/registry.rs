use bevy::prelude::{Resource, Vec2, Vec3};
use rs_utils::{
    Aabb, BlockRegistry, BlockWorld, Chat, ClientSettings, EntityEvent, EntityEventQueue, KeyBind,
    NameMode, ShadowMode, dir_vector, rotate_x, rotate_y, rotate_z,
};
use tracing::{debug, warn};

use crate::entity::{Entity, EntityKind, SkinFetch, SkinState};
use crate::interp::InterpState;
use crate::location::LocationUpdate;
use crate::player::{Behavior, LocalPlayer, NetPlayer, TickContext};
use crate::render::{FrameContext, ModelDraw, RenderBackend};
use crate::skin::{SkinError, SkinSource, process_skin};

pub const MAX_ENTITIES: usize = 256;

const NAME_DISTANCE: f32 = 32.0;
const UNSCALED_NAME_DISTANCE: f32 = 8192.0;

/// Slot index into [`Entities`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u8);

impl EntityId {
    /// Slot reserved for the local player.
    pub const SELF: EntityId = EntityId(255);

    /// Panics if `id` is not a valid slot.
    pub fn new(id: usize) -> Self {
        assert!(id < MAX_ENTITIES, "entity id {id} out of range");
        Self(id as u8)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn raw(self) -> u8 {
        self.0
    }
}

impl From<u8> for EntityId {
    fn from(id: u8) -> Self {
        Self(id)
    }
}

#[derive(Debug)]
struct Slot {
    entity: Entity,
    behavior: Behavior,
}

/// Fixed-capacity table of live entities with the local player in
/// [`EntityId::SELF`].
#[derive(Resource)]
pub struct Entities {
    slots: Vec<Option<Slot>>,
    pub name_mode: NameMode,
    pub shadow_mode: ShadowMode,
    hovered: Option<EntityId>,
    /// Skin keys whose download lost its last holder.
    abandoned_skins: Vec<String>,
}

impl Entities {
    pub fn new(settings: &ClientSettings) -> Self {
        let mut slots: Vec<Option<Slot>> = (0..MAX_ENTITIES).map(|_| None).collect();
        let mut entity = Entity::new(EntityId::SELF.raw(), EntityKind::Player);
        entity.name = settings.username.clone();
        entity.skin.skin_name = settings.username.clone();
        let mut local = LocalPlayer::new(settings);
        local.interp.snap(&entity);
        slots[EntityId::SELF.index()] = Some(Slot {
            entity,
            behavior: Behavior::Local(Box::new(local)),
        });
        Self {
            slots,
            name_mode: settings.name_mode,
            shadow_mode: settings.shadow_mode,
            hovered: None,
            abandoned_skins: Vec::new(),
        }
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.slots[id.index()].as_ref().map(|slot| &slot.entity)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.slots[id.index()].as_mut().map(|slot| &mut slot.entity)
    }

    pub fn behavior(&self, id: EntityId) -> Option<&Behavior> {
        self.slots[id.index()].as_ref().map(|slot| &slot.behavior)
    }

    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(idx, _)| EntityId::new(idx))
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The local player. Its slot is filled at construction and only
    /// emptied by [`Entities::free`].
    pub fn local(&self) -> (&Entity, &LocalPlayer) {
        match self.slots[EntityId::SELF.index()].as_ref() {
            Some(Slot {
                entity,
                behavior: Behavior::Local(local),
            }) => (entity, local),
            _ => panic!("local player slot is not populated"),
        }
    }

    pub fn local_mut(&mut self) -> (&mut Entity, &mut LocalPlayer) {
        match self.slots[EntityId::SELF.index()].as_mut() {
            Some(Slot {
                entity,
                behavior: Behavior::Local(local),
            }) => (entity, local),
            _ => panic!("local player slot is not populated"),
        }
    }

    /// Spawns a network player, replacing whatever held the slot.
    pub fn spawn_player(
        &mut self,
        id: EntityId,
        name: &str,
        skin: &str,
        pos: Vec3,
        events: &mut EntityEventQueue,
        backend: &mut dyn RenderBackend,
    ) -> &mut Entity {
        let mut entity = Entity::new(id.raw(), EntityKind::Player);
        entity.name = name.to_owned();
        entity.skin.skin_name = skin.to_owned();
        self.spawn(id, entity, pos, Behavior::Network(NetPlayer::default()), events, backend)
    }

    /// Spawns an entity with no name or skin.
    pub fn spawn_generic(
        &mut self,
        id: EntityId,
        pos: Vec3,
        events: &mut EntityEventQueue,
        backend: &mut dyn RenderBackend,
    ) -> &mut Entity {
        let entity = Entity::new(id.raw(), EntityKind::Generic);
        self.spawn(id, entity, pos, Behavior::Generic(NetPlayer::default()), events, backend)
    }

    fn spawn(
        &mut self,
        id: EntityId,
        mut entity: Entity,
        pos: Vec3,
        mut behavior: Behavior,
        events: &mut EntityEventQueue,
        backend: &mut dyn RenderBackend,
    ) -> &mut Entity {
        assert!(id != EntityId::SELF, "cannot spawn over the local player");
        if self.slots[id.index()].is_some() {
            self.remove(id, events, backend);
        }
        entity.body.position = pos;
        if let Behavior::Network(net) | Behavior::Generic(net) = &mut behavior {
            net.interp.snap(&entity);
        }
        debug!(id = id.raw(), name = %entity.name, "entity spawned");
        events.push(EntityEvent::Added(id.raw()));
        let slot = self.slots[id.index()].insert(Slot { entity, behavior });
        &mut slot.entity
    }

    pub fn set_model(&mut self, id: EntityId, model: &str, blocks: &BlockRegistry) {
        if let Some(entity) = self.get_mut(id) {
            entity.set_model(model, blocks);
        }
    }

    /// Changes the skin key, releasing the old texture if nobody else uses
    /// it. The new skin is fetched on a later tick.
    pub fn set_skin(&mut self, id: EntityId, skin: &str, backend: &mut dyn RenderBackend) {
        let Some(entity) = self.get(id) else {
            return;
        };
        if entity.skin.skin_name == skin {
            return;
        }
        self.release_skin(id, backend);
        if let Some(entity) = self.get_mut(id) {
            entity.skin = SkinState {
                skin_name: skin.to_owned(),
                ..SkinState::default()
            };
        }
    }

    pub fn set_location(&mut self, id: EntityId, update: &LocationUpdate, interpolate: bool) {
        let Some(slot) = self.slots[id.index()].as_mut() else {
            return;
        };
        match &mut slot.behavior {
            Behavior::Local(local) => local.set_location(&mut slot.entity, update, interpolate),
            Behavior::Network(net) | Behavior::Generic(net) => {
                net.set_location(&mut slot.entity, update, interpolate)
            }
        }
    }

    /// Dispatches a key press to the local player.
    pub fn handle_key<W: BlockWorld + ?Sized>(
        &mut self,
        key: KeyBind,
        world: &W,
        chat: &mut Chat,
    ) -> bool {
        let (entity, local) = self.local_mut();
        local.handles_key(entity, key, world, chat)
    }

    /// Advances every entity by one tick and services player skins.
    pub fn tick<W: BlockWorld + ?Sized>(
        &mut self,
        ctx: &TickContext<'_, W>,
        skins: &mut dyn SkinSource,
        backend: &mut dyn RenderBackend,
        chat: &mut Chat,
    ) {
        self.forget_abandoned_skins(skins);
        let neighbours: Vec<(Vec3, Vec3)> = self
            .ids()
            .filter(|&id| id != EntityId::SELF)
            .filter_map(|id| self.get(id))
            .map(|e| (e.position(), e.body.size))
            .collect();

        for idx in 0..MAX_ENTITIES {
            let id = EntityId::new(idx);
            let Some(slot) = self.slots[idx].as_ref() else {
                continue;
            };
            // Network players bind new skins before moving, the local
            // player after.
            let is_network = matches!(slot.behavior, Behavior::Network(_));
            if is_network {
                self.check_skin(id, skins, backend, chat);
            }

            let Some(slot) = self.slots[idx].as_mut() else {
                continue;
            };
            match &mut slot.behavior {
                Behavior::Local(local) => {
                    local.tick(&mut slot.entity, ctx, &neighbours);
                    self.check_skin(id, skins, backend, chat);
                }
                Behavior::Network(net) | Behavior::Generic(net) => {
                    net.tick(&mut slot.entity, ctx.delta, ctx.settings.view_bobbing);
                }
            }
        }
    }

    /// Tells the skin source to drop downloads nobody holds any more.
    pub(crate) fn forget_abandoned_skins(&mut self, skins: &mut dyn SkinSource) {
        for key in std::mem::take(&mut self.abandoned_skins) {
            let held = self
                .slots
                .iter()
                .flatten()
                .any(|slot| slot.entity.skin.skin_name == key);
            if !held {
                skins.forget(&key);
            }
        }
    }

    fn first_other_with_skin(&self, id: EntityId, key: &str, fetch: SkinFetch) -> Option<EntityId> {
        self.ids().find(|&other| {
            other != id
                && self
                    .get(other)
                    .is_some_and(|e| e.skin.skin_name == key && e.skin.fetch == fetch)
        })
    }

    /// Drives the skin download of a player: shares an already fetched
    /// texture, or requests, polls and binds a new one.
    pub fn check_skin(
        &mut self,
        id: EntityId,
        skins: &mut dyn SkinSource,
        backend: &mut dyn RenderBackend,
        chat: &mut Chat,
    ) {
        let Some(entity) = self.get(id) else {
            return;
        };
        if entity.kind != EntityKind::Player || entity.skin.skin_name.is_empty() {
            return;
        }
        let key = entity.skin.skin_name.clone();

        if entity.skin.fetch == SkinFetch::NotStarted {
            if let Some(source) = self.first_other_with_skin(id, &key, SkinFetch::Completed) {
                let shared = self.get(source).map(|e| e.skin.clone());
                if let (Some(shared), Some(entity)) = (shared, self.get_mut(id)) {
                    entity.skin.apply_from(&shared);
                    entity.skin.fetch = SkinFetch::Completed;
                }
                return;
            }
            // Models drawn without a skin wait until a skinned model is set.
            if !self.get(id).is_some_and(|e| e.model.uses_skin) {
                return;
            }
            if self
                .first_other_with_skin(id, &key, SkinFetch::Downloading)
                .is_none()
            {
                debug!(skin = %key, "requesting skin");
                skins.request(&key);
            }
            if let Some(entity) = self.get_mut(id) {
                entity.skin.fetch = SkinFetch::Downloading;
            }
        }

        let Some(entity) = self.get(id) else {
            return;
        };
        if entity.skin.fetch != SkinFetch::Downloading {
            return;
        }
        let uses_human_skin = entity.model.uses_human_skin;
        let Some(result) = skins.poll(&key) else {
            return;
        };

        let Some(data) = result.data else {
            warn!(skin = %key, "skin download failed");
            self.reset_skin_all(&key, backend);
            return;
        };

        match process_skin(&data, uses_human_skin) {
            Ok(skin) => {
                self.reset_skin_all(&key, backend);
                let texture = backend.create_texture(&skin.image);
                let resolved = SkinState {
                    skin_name: key.clone(),
                    fetch: SkinFetch::Completed,
                    texture: Some(texture),
                    mob_texture: None,
                    skin_type: skin.skin_type,
                    uv_scale: skin.uv_scale,
                };
                self.for_each_holder(&key, |state| state.apply_from(&resolved));
                debug!(skin = %key, ?texture, "skin bound");
            }
            Err(err @ SkinError::InvalidLayout { .. }) => {
                warn!(skin = %key, "{err}");
                chat.add("&cEntity skin had unsupported dimensions");
                self.reset_skin_all(&key, backend);
            }
            Err(err) => {
                warn!(skin = %key, "{err}");
                self.reset_skin_all(&key, backend);
            }
        }
    }

    fn for_each_holder(&mut self, key: &str, mut f: impl FnMut(&mut SkinState)) {
        for slot in self.slots.iter_mut().flatten() {
            let skin = &mut slot.entity.skin;
            if slot.entity.kind == EntityKind::Player && skin.skin_name == key {
                f(skin);
                skin.fetch = SkinFetch::Completed;
            }
        }
    }

    /// Drops the shared texture of `key` once and resets every holder.
    fn reset_skin_all(&mut self, key: &str, backend: &mut dyn RenderBackend) {
        let mut released = None;
        self.for_each_holder(key, |state| {
            if released.is_none() {
                released = state.texture;
            }
            state.reset();
        });
        if let Some(texture) = released {
            backend.delete_texture(texture);
        }
    }

    /// Releases the entity's skin texture unless another entity still uses
    /// the same key.
    fn release_skin(&mut self, id: EntityId, backend: &mut dyn RenderBackend) {
        let Some(entity) = self.get(id) else {
            return;
        };
        let key = entity.skin.skin_name.clone();
        let shared = self.ids().any(|other| {
            other != id && self.get(other).is_some_and(|e| e.skin.skin_name == key)
        });
        if shared {
            return;
        }
        if let Some(entity) = self.get_mut(id) {
            let downloading = entity.skin.fetch == SkinFetch::Downloading;
            if let Some(texture) = entity.skin.texture.take() {
                backend.delete_texture(texture);
            }
            entity.skin.reset();
            if downloading {
                self.abandoned_skins.push(key);
            }
        }
    }

    fn despawn(&mut self, id: EntityId, backend: &mut dyn RenderBackend) {
        if self.get(id).is_some_and(|e| e.kind == EntityKind::Player) {
            self.release_skin(id, backend);
        }
        if let Some(entity) = self.get_mut(id) {
            if let Some(name) = entity.name_texture.take() {
                backend.delete_texture(name.id);
            }
        }
        self.slots[id.index()] = None;
        if self.hovered == Some(id) {
            self.hovered = None;
        }
    }

    /// Despawns a remote entity. Observers hear about it before any
    /// resources are released. The local player cannot be removed.
    pub fn remove(
        &mut self,
        id: EntityId,
        events: &mut EntityEventQueue,
        backend: &mut dyn RenderBackend,
    ) -> bool {
        if id == EntityId::SELF || self.slots[id.index()].is_none() {
            return false;
        }
        events.push(EntityEvent::Removed(id.raw()));
        self.despawn(id, backend);
        debug!(id = id.raw(), "entity removed");
        true
    }

    /// Removes every entity, the local player included. This is for
    /// shutdown: [`Entities::local`] and the passes that read the local
    /// player panic afterwards.
    pub fn free(&mut self, events: &mut EntityEventQueue, backend: &mut dyn RenderBackend) {
        for idx in 0..MAX_ENTITIES {
            let id = EntityId::new(idx);
            if self.slots[idx].is_some() {
                events.push(EntityEvent::Removed(id.raw()));
                self.despawn(id, backend);
            }
        }
        self.hovered = None;
    }

    /// Moves every entity to its frame position and draws the visible ones.
    pub fn render_models<W: BlockWorld + ?Sized>(
        &mut self,
        frame: &FrameContext,
        world: &W,
        backend: &mut dyn RenderBackend,
    ) {
        for slot in self.slots.iter_mut().flatten() {
            let entity = &mut slot.entity;
            let tilt = match &slot.behavior {
                Behavior::Local(local) => {
                    local.set_interp_position(entity, frame.t);
                    if !frame.third_person {
                        continue;
                    }
                    let pose = entity.anim.current(frame.t, frame.idle_time);
                    Some(local.tilt.current(frame.t, &pose))
                }
                Behavior::Network(net) | Behavior::Generic(net) => {
                    net.interp.base.apply(entity, frame.t);
                    entity.should_render = backend.is_visible(&entity.picking_bounds());
                    if !entity.should_render {
                        continue;
                    }
                    None
                }
            };

            let texture = if entity.model.uses_human_skin {
                entity.skin.texture
            } else {
                entity.skin.mob_texture
            };
            let draw = ModelDraw {
                entity: entity.id,
                model: entity.model,
                model_block: entity.model_block,
                sheep_no_fur: entity.model_is_sheep_no_fur,
                transform: entity.transform(entity.position(), entity.model_scale()),
                texture,
                skin_type: entity.skin.skin_type,
                uv_scale: entity.skin.uv_scale,
                light: entity.light_color(world),
                pose: entity.anim.current(frame.t, frame.idle_time),
                tilt,
            };
            backend.draw_model(&draw);
        }
    }

    /// Depth-tested name pass. Only [`NameMode::All`] draws here; the
    /// hovered entity is left to [`Entities::render_hovered_names`].
    pub fn render_names(&mut self, frame: &FrameContext, backend: &mut dyn RenderBackend) {
        if self.name_mode == NameMode::None {
            return;
        }
        self.hovered = self.get_closest(EntityId::SELF);
        let can_see_all = self.local().1.hacks.can_see_all_names;
        if !can_see_all || self.name_mode != NameMode::All {
            return;
        }
        for idx in 0..MAX_ENTITIES {
            let id = EntityId::new(idx);
            if self.slots[idx].is_some() && (Some(id) != self.hovered || id == EntityId::SELF) {
                self.render_name(id, frame, backend);
            }
        }
    }

    /// Names drawn over the world: the hovered entity, or everyone in the
    /// all-hovered modes.
    pub fn render_hovered_names(&mut self, frame: &FrameContext, backend: &mut dyn RenderBackend) {
        if self.name_mode == NameMode::None {
            return;
        }
        let can_see_all = self.local().1.hacks.can_see_all_names;
        let all_names =
            !matches!(self.name_mode, NameMode::Hovered | NameMode::All) && can_see_all;
        for idx in 0..MAX_ENTITIES {
            let id = EntityId::new(idx);
            if self.slots[idx].is_some()
                && (Some(id) == self.hovered || all_names)
                && id != EntityId::SELF
            {
                self.render_name(id, frame, backend);
            }
        }
    }

    fn render_name(&mut self, id: EntityId, frame: &FrameContext, backend: &mut dyn RenderBackend) {
        let name_mode = self.name_mode;
        let can_see_all = self.local().1.hacks.can_see_all_names;
        let Some(slot) = self.slots[id.index()].as_mut() else {
            return;
        };
        let entity = &mut slot.entity;
        match &slot.behavior {
            Behavior::Local(_) if !frame.third_person => return,
            Behavior::Local(_) => {}
            Behavior::Network(_) => {
                let limit = if name_mode == NameMode::AllUnscaled {
                    UNSCALED_NAME_DISTANCE
                } else {
                    NAME_DISTANCE
                };
                let dist = frame.camera_pos.distance_squared(entity.position());
                if !entity.should_render || dist > limit * limit {
                    return;
                }
            }
            Behavior::Generic(_) => return,
        }
        draw_name(entity, name_mode, can_see_all, backend);
    }

    /// Nearest entity hit by a ray from `source`'s eye along its look
    /// direction. Neither `source` nor the local player can be returned.
    pub fn get_closest(&self, source: EntityId) -> Option<EntityId> {
        let src = self.get(source)?;
        let eye = src.eye_position();
        let dir = dir_vector(src.head_y.to_radians(), src.head_x.to_radians());

        let mut closest: Option<(f32, EntityId)> = None;
        for id in self.ids() {
            if id == source || id == EntityId::SELF {
                continue;
            }
            let Some(target) = self.get(id) else {
                continue;
            };
            if let Some(t0) = ray_hits_rotated_box(eye, dir, target) {
                if closest.is_none_or(|(best, _)| t0 < best) {
                    closest = Some((t0, id));
                }
            }
        }
        closest.map(|(_, id)| id)
    }

    pub fn hovered(&self) -> Option<EntityId> {
        self.hovered
    }

    pub fn draw_shadows(&self, backend: &mut dyn RenderBackend) {
        if self.shadow_mode == ShadowMode::None {
            return;
        }
        let (local, _) = self.local();
        draw_shadow(local, self.shadow_mode, backend);
        if self.shadow_mode != ShadowMode::CircleAll {
            return;
        }
        for id in self.ids().filter(|&id| id != EntityId::SELF) {
            if let Some(entity) = self.get(id).filter(|e| e.should_render) {
                draw_shadow(entity, self.shadow_mode, backend);
            }
        }
    }

    /// The graphics context went away: name textures are gone with it.
    pub fn context_lost(&mut self, backend: &mut dyn RenderBackend) {
        for slot in self.slots.iter_mut().flatten() {
            if let Some(name) = slot.entity.name_texture.take() {
                backend.delete_texture(name.id);
            }
        }
    }

    pub fn context_recreated(&mut self, backend: &mut dyn RenderBackend) {
        for slot in self.slots.iter_mut().flatten() {
            update_name_texture(&mut slot.entity, backend);
        }
    }

    pub fn chat_font_changed(&mut self, backend: &mut dyn RenderBackend) {
        for slot in self.slots.iter_mut().flatten() {
            if let Some(name) = slot.entity.name_texture.take() {
                backend.delete_texture(name.id);
            }
            update_name_texture(&mut slot.entity, backend);
        }
    }

    /// Snapshot of an entity's committed tick states, for debugging and
    /// tests.
    pub fn interp_states(&self, id: EntityId) -> Option<(InterpState, InterpState)> {
        let base = match self.behavior(id)? {
            Behavior::Local(local) => &local.interp.base,
            Behavior::Network(net) | Behavior::Generic(net) => &net.interp.base,
        };
        Some((base.prev, base.next))
    }
}

fn update_name_texture(entity: &mut Entity, backend: &mut dyn RenderBackend) {
    if entity.kind != EntityKind::Player || entity.name.is_empty() {
        return;
    }
    entity.name_texture = backend.make_name_texture(&entity.name);
}

fn draw_name(
    entity: &mut Entity,
    name_mode: NameMode,
    can_see_all: bool,
    backend: &mut dyn RenderBackend,
) {
    if entity.name.is_empty() {
        return;
    }
    if entity.name_texture.is_none() {
        update_name_texture(entity, backend);
    }
    let Some(texture) = entity.name_texture else {
        return;
    };

    let transform = entity.transform(entity.position(), entity.model_scale());
    let pos = transform.transform_point3(Vec3::new(0.0, entity.model.name_y_offset, 0.0));
    let scale = entity.model.name_scale * entity.model_scale().y;
    let scale = if scale > 1.0 { 1.0 / 70.0 } else { scale / 70.0 };
    let mut size = Vec2::new(texture.width as f32, texture.height as f32) * scale;
    if name_mode == NameMode::AllUnscaled && can_see_all {
        size *= backend.clip_w(pos) * 0.2;
    }
    backend.draw_name(&texture, pos, size);
}

fn draw_shadow(entity: &Entity, mode: ShadowMode, backend: &mut dyn RenderBackend) {
    let scale = entity.model.shadow_scale * entity.model_scale().x;
    backend.draw_shadow(entity.id, entity.position(), scale, mode);
}

/// Ray test against `target`'s picking box in its own rotated frame.
/// Returns the entry distance along `dir`.
fn ray_hits_rotated_box(origin: Vec3, dir: Vec3, target: &Entity) -> Option<f32> {
    let inverse = |v: Vec3| {
        let v = rotate_y(v, -target.rot_y.to_radians());
        let v = rotate_z(v, -target.rot_z.to_radians());
        rotate_x(v, -target.rot_x.to_radians())
    };
    let local_origin = inverse(origin - target.position()) + target.position();
    let local_dir = inverse(dir);
    let bounds: Aabb = target.picking_bounds();
    bounds.ray_distance(local_origin, local_dir)
}
