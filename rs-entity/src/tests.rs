use std::collections::HashMap;
use std::io::Cursor;

use bevy::prelude::{Vec2, Vec3};
use image::{ImageFormat, Rgba, RgbaImage};
use rs_utils::block::BLOCK_STONE;
use rs_utils::{
    Aabb, BlockRegistry, Chat, ClientSettings, EntityEvent, EntityEventQueue, InputState, KeyBind,
    NameMode, ShadowMode, WorldMap,
};

use crate::interp::{LocalInterpComp, NetInterpComp};
use crate::location::{LocationFlags, LocationUpdate};
use crate::model;
use crate::render::{ModelDraw, NameTexture, RenderBackend, TextureId};
use crate::skin::{
    FetchResult, SkinDownloader, SkinSource, SkinType, clear_hat, ensure_pow2, skin_type,
};
use crate::{Entities, Entity, EntityId, EntityKind, FrameContext, SkinFetch, TabList, TickContext};

#[derive(Default)]
struct MockBackend {
    next_id: u32,
    created: Vec<TextureId>,
    deleted: Vec<TextureId>,
    names: Vec<TextureId>,
    models: Vec<u8>,
    shadows: Vec<u8>,
    hidden: bool,
}

impl MockBackend {
    fn alloc(&mut self) -> TextureId {
        self.next_id += 1;
        let id = TextureId(self.next_id);
        self.created.push(id);
        id
    }
}

impl RenderBackend for MockBackend {
    fn create_texture(&mut self, _image: &RgbaImage) -> TextureId {
        self.alloc()
    }

    fn delete_texture(&mut self, id: TextureId) {
        self.deleted.push(id);
    }

    fn make_name_texture(&mut self, name: &str) -> Option<NameTexture> {
        let id = self.alloc();
        Some(NameTexture {
            id,
            width: name.len() as u32 * 8,
            height: 16,
        })
    }

    fn draw_model(&mut self, draw: &ModelDraw) {
        self.models.push(draw.entity);
    }

    fn draw_name(&mut self, texture: &NameTexture, _pos: Vec3, _size: Vec2) {
        self.names.push(texture.id);
    }

    fn draw_shadow(&mut self, entity: u8, _pos: Vec3, _scale: f32, _mode: ShadowMode) {
        self.shadows.push(entity);
    }

    fn is_visible(&self, _bounds: &Aabb) -> bool {
        !self.hidden
    }

    fn clip_w(&self, _pos: Vec3) -> f32 {
        1.0
    }
}

#[derive(Default)]
struct MockSkins {
    requests: Vec<String>,
    ready: HashMap<String, FetchResult>,
    forgotten: Vec<String>,
}

impl MockSkins {
    fn complete(&mut self, key: &str, data: Option<Vec<u8>>) {
        self.ready.insert(
            key.to_owned(),
            FetchResult {
                key: key.to_owned(),
                data,
            },
        );
    }
}

impl SkinSource for MockSkins {
    fn request(&mut self, key: &str) {
        self.requests.push(key.to_owned());
    }

    fn poll(&mut self, key: &str) -> Option<FetchResult> {
        self.ready.remove(key)
    }

    fn forget(&mut self, key: &str) {
        self.forgotten.push(key.to_owned());
    }
}

fn png_bytes(image: &RgbaImage) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Png)
        .expect("encode png");
    out.into_inner()
}

fn opaque_skin(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba([90, 60, 30, 255]))
}

fn ground_world() -> WorldMap {
    WorldMap::flat(16, 32, 16, 5, BLOCK_STONE)
}

fn frame_at(camera_pos: Vec3) -> FrameContext {
    FrameContext {
        t: 0.0,
        camera_pos,
        third_person: false,
        idle_time: 0.0,
    }
}

struct Harness {
    entities: Entities,
    events: EntityEventQueue,
    backend: MockBackend,
    skins: MockSkins,
    chat: Chat,
}

impl Harness {
    fn new() -> Self {
        Self::with_settings(&ClientSettings::default())
    }

    fn with_settings(settings: &ClientSettings) -> Self {
        Self {
            entities: Entities::new(settings),
            events: EntityEventQueue::default(),
            backend: MockBackend::default(),
            skins: MockSkins::default(),
            chat: Chat::default(),
        }
    }

    fn spawn(&mut self, id: usize, skin: &str, pos: Vec3) -> EntityId {
        let id = EntityId::new(id);
        self.entities
            .spawn_player(id, skin, skin, pos, &mut self.events, &mut self.backend);
        id
    }

    fn check_skin(&mut self, id: EntityId) {
        self.entities
            .check_skin(id, &mut self.skins, &mut self.backend, &mut self.chat);
    }

    fn entity(&self, id: EntityId) -> &Entity {
        self.entities.get(id).expect("entity exists")
    }
}

#[test]
fn orientation_update_normalises_angles() {
    let update = LocationUpdate::make_orientation(370.0, -10.0);
    assert!(update.has(LocationFlags::HEAD_X));
    assert!(update.has(LocationFlags::HEAD_Y));
    assert!(!update.has(LocationFlags::POS));
    assert!(!update.is_relative());
    assert_eq!(update.yaw, 10.0);
    assert_eq!(update.pitch, 350.0);
}

#[test]
fn position_updates_only_set_their_flags() {
    let update = LocationUpdate::make_position(Vec3::new(1.0, 2.0, 3.0), true);
    assert_eq!(update.flags, LocationFlags::POS | LocationFlags::REL);

    let update = LocationUpdate::make_position_and_orientation(Vec3::ONE, -90.0, 720.0, false);
    assert!(update.has(LocationFlags::POS | LocationFlags::HEAD_X | LocationFlags::HEAD_Y));
    assert!(!update.is_relative());
    assert_eq!(update.yaw, 270.0);
    assert_eq!(update.pitch, 0.0);
}

#[test]
fn net_interp_blends_position_linearly() {
    let mut entity = Entity::new(1, EntityKind::Player);
    let mut interp = NetInterpComp::default();
    interp.snap(&entity);

    let update = LocationUpdate::make_position(Vec3::new(10.0, 0.0, 0.0), false);
    interp.set_location(&mut entity, &update, true);
    interp.advance_state(&mut entity);

    assert_eq!(interp.base.prev.pos.x, 0.0);
    assert_eq!(interp.base.next.pos.x, 10.0);
    assert_eq!(interp.base.current(0.5).pos.x, 5.0);
}

#[test]
fn net_interp_takes_shortest_yaw_path() {
    let mut entity = Entity::new(1, EntityKind::Player);
    entity.head_y = 350.0;
    let mut interp = NetInterpComp::default();
    interp.snap(&entity);

    interp.set_location(&mut entity, &LocationUpdate::make_orientation(10.0, 0.0), true);
    interp.advance_state(&mut entity);

    let yaw = interp.base.current(0.5).head_y;
    assert!(yaw < 1e-3 || yaw > 360.0 - 1e-3, "yaw = {yaw}");
}

#[test]
fn net_interp_queue_is_bounded_and_holds_last_state() {
    let mut entity = Entity::new(1, EntityKind::Player);
    let mut interp = NetInterpComp::default();
    interp.snap(&entity);

    for i in 1..=12 {
        let update = LocationUpdate::make_position(Vec3::new(i as f32, 0.0, 0.0), false);
        interp.set_location(&mut entity, &update, true);
    }
    assert_eq!(interp.pending_states(), 10);

    interp.advance_state(&mut entity);
    assert_eq!(interp.base.next.pos.x, 3.0);

    for _ in 0..20 {
        interp.advance_state(&mut entity);
    }
    assert_eq!(interp.pending_states(), 0);
    assert_eq!(interp.base.prev.pos.x, 12.0);
    assert_eq!(interp.base.next.pos.x, 12.0);
    assert_eq!(entity.position().x, 12.0);
}

#[test]
fn net_interp_relative_updates_build_on_latest() {
    let mut entity = Entity::new(1, EntityKind::Player);
    let mut interp = NetInterpComp::default();
    interp.snap(&entity);

    let step = LocationUpdate::make_position(Vec3::new(1.0, 0.0, 0.0), true);
    interp.set_location(&mut entity, &step, true);
    interp.set_location(&mut entity, &step, true);
    interp.advance_state(&mut entity);
    interp.advance_state(&mut entity);
    assert_eq!(interp.base.next.pos.x, 2.0);
}

#[test]
fn local_interp_teleport_snaps_both_states() {
    let mut entity = Entity::new(255, EntityKind::Player);
    let mut interp = LocalInterpComp::default();
    interp.snap(&entity);

    let update = LocationUpdate::make_position_and_orientation(Vec3::new(4.0, 7.0, 4.0), 90.0, 0.0, false);
    interp.set_location(&mut entity, &update, false);

    assert_eq!(interp.base.prev, interp.base.next);
    assert!((interp.base.next.pos.y - 7.001).abs() < 1e-4);
    assert_eq!(entity.position(), interp.base.next.pos);
    assert_eq!(entity.head_y, 90.0);
    assert_eq!(entity.rot_y, 90.0);
}

#[test]
fn local_interp_body_yaw_trails_head() {
    let mut entity = Entity::new(255, EntityKind::Player);
    let mut interp = LocalInterpComp::default();
    interp.snap(&entity);

    interp.set_location(&mut entity, &LocationUpdate::make_orientation(90.0, 0.0), true);
    assert!((interp.base.next.rot_y - 30.0).abs() < 1e-3);
    assert_eq!(entity.head_y, 0.0);

    let mut body_yaws = Vec::new();
    for _ in 0..3 {
        interp.advance_state(&mut entity);
        body_yaws.push(interp.base.next.rot_y);
    }
    assert!((body_yaws[1] - 60.0).abs() < 1e-3);
    assert!((body_yaws[2] - 90.0).abs() < 1e-3);
    assert_eq!(interp.base.pending_rot_y(), 0);
}

#[test]
fn set_model_parses_names_and_scales() {
    let blocks = BlockRegistry::default();
    let mut entity = Entity::new(1, EntityKind::Player);

    entity.set_model("giant|5", &blocks);
    assert_eq!(entity.model.name, "humanoid");
    assert_eq!(entity.model_scale(), Vec3::splat(2.0));
    assert!((entity.body.size - model::HUMANOID.collision_size * 2.0).length() < 1e-6);

    entity.set_model("chicken|100", &blocks);
    assert_eq!(entity.model.name, "chicken");
    assert_eq!(entity.model_scale(), Vec3::splat(model::CHICKEN.max_scale));

    entity.set_model("chibi|0.001", &blocks);
    assert_eq!(entity.model_scale(), Vec3::splat(0.01));

    entity.set_model("pig|abc", &blocks);
    assert_eq!(entity.model.name, "pig");
    assert_eq!(entity.model_scale(), Vec3::ONE);

    entity.set_model("stone", &blocks);
    assert_eq!(entity.model.name, "block");
    assert_eq!(entity.model_block, BLOCK_STONE);

    entity.set_model("not a model", &blocks);
    assert_eq!(entity.model.name, "humanoid");

    entity.set_model("sheep_nofur", &blocks);
    assert_eq!(entity.model.name, "sheep");
    assert!(entity.model_is_sheep_no_fur);
}

#[test]
fn model_bounds_follow_scale() {
    let blocks = BlockRegistry::default();
    let mut entity = Entity::new(1, EntityKind::Player);
    entity.set_model("humanoid|1.5", &blocks);
    let aabb = entity.model_aabb();
    assert!((aabb.max.y - model::HUMANOID.picking_max.y * 1.5).abs() < 1e-6);
    assert!((entity.eye_height() - model::HUMANOID.eye_y * 1.5).abs() < 1e-6);

    entity.body.position = Vec3::new(3.0, 4.0, 5.0);
    let eye = entity.eye_position();
    assert!((eye - Vec3::new(3.0, 4.0 + entity.eye_height(), 5.0)).length() < 1e-6);
}

#[test]
fn block_model_uses_block_extents() {
    let blocks = BlockRegistry::default();
    let mut entity = Entity::new(1, EntityKind::Generic);
    entity.set_model(&BLOCK_STONE.to_string(), &blocks);
    assert_eq!(entity.model.name, "block");
    assert!((entity.model_aabb().max.y - 1.0).abs() < 1e-6);
    assert!((entity.eye_height() - 0.5).abs() < 1e-6);
}

#[test]
fn transform_scales_then_rotates_then_translates() {
    let mut entity = Entity::new(1, EntityKind::Player);
    let pos = Vec3::new(10.0, 0.0, 0.0);
    let point = entity
        .transform(pos, Vec3::splat(2.0))
        .transform_point3(Vec3::X);
    assert!((point - Vec3::new(12.0, 0.0, 0.0)).length() < 1e-5);

    entity.rot_y = 90.0;
    let point = entity
        .transform(pos, Vec3::splat(2.0))
        .transform_point3(Vec3::X);
    assert!((point - Vec3::new(10.0, 0.0, 2.0)).length() < 1e-5, "{point}");
}

#[test]
fn light_color_falls_back_to_sun_outside_map() {
    let world = ground_world();
    let mut entity = Entity::new(1, EntityKind::Player);
    entity.body.position = Vec3::new(-5.0, 10.0, -5.0);
    assert_eq!(entity.light_color(&world), rs_utils::PackedCol::SUN);
}

#[test]
fn pow2_padding_records_uv_scale() {
    let (padded, scale) = ensure_pow2(opaque_skin(40, 40));
    assert_eq!(padded.dimensions(), (64, 64));
    assert_eq!(scale, Vec2::splat(40.0 / 64.0));
    assert_eq!(padded.get_pixel(50, 50)[3], 0);
    assert_eq!(padded.get_pixel(10, 10)[3], 255);

    let image = opaque_skin(64, 64);
    let before = image.as_raw().as_ptr();
    let (same, scale) = ensure_pow2(image);
    assert_eq!(scale, Vec2::ONE);
    assert_eq!(same.as_raw().as_ptr(), before);
}

#[test]
fn skin_layout_classification() {
    assert_eq!(skin_type(&opaque_skin(64, 32)), SkinType::Skin64x32);
    assert_eq!(skin_type(&opaque_skin(128, 64)), SkinType::Skin64x32);
    assert_eq!(skin_type(&opaque_skin(64, 64)), SkinType::Skin64x64);
    assert_eq!(skin_type(&opaque_skin(40, 30)), SkinType::Invalid);

    let mut slim = opaque_skin(64, 64);
    slim.put_pixel(54, 20, Rgba([0, 0, 0, 0]));
    assert_eq!(skin_type(&slim), SkinType::Skin64x64Slim);
}

#[test]
fn hat_filter_only_touches_fully_opaque_hats() {
    let mut skin = opaque_skin(64, 32);
    skin.put_pixel(40, 4, Rgba([255, 255, 255, 255]));
    skin.put_pixel(41, 4, Rgba([0, 0, 0, 255]));
    clear_hat(&mut skin, SkinType::Skin64x32);
    assert_eq!(skin.get_pixel(40, 4)[3], 0);
    assert_eq!(skin.get_pixel(41, 4)[3], 0);
    assert_eq!(skin.get_pixel(42, 4)[3], 255);
    // Pixels outside the hat region are kept even when white.
    let mut outside = opaque_skin(64, 32);
    outside.put_pixel(10, 4, Rgba([255, 255, 255, 255]));
    clear_hat(&mut outside, SkinType::Skin64x32);
    assert_eq!(outside.get_pixel(10, 4)[3], 255);

    let mut translucent = opaque_skin(64, 32);
    translucent.put_pixel(40, 4, Rgba([255, 255, 255, 255]));
    translucent.put_pixel(50, 8, Rgba([10, 10, 10, 100]));
    clear_hat(&mut translucent, SkinType::Skin64x32);
    assert_eq!(translucent.get_pixel(40, 4)[3], 255);
}

#[test]
fn shared_skin_is_fetched_once() {
    let mut h = Harness::new();
    let a = h.spawn(1, "alice", Vec3::ZERO);
    let b = h.spawn(2, "alice", Vec3::ZERO);

    h.check_skin(a);
    h.check_skin(b);
    assert_eq!(h.skins.requests, vec!["alice".to_string()]);

    h.skins.complete("alice", Some(png_bytes(&opaque_skin(64, 32))));
    h.check_skin(a);

    let texture = h.entity(a).skin.texture;
    assert!(texture.is_some());
    assert_eq!(h.entity(b).skin.texture, texture);
    assert_eq!(h.entity(b).skin.fetch, SkinFetch::Completed);
    assert_eq!(h.backend.created.len(), 1);

    // A later arrival copies the texture without a new request.
    let c = h.spawn(3, "alice", Vec3::ZERO);
    h.check_skin(c);
    assert_eq!(h.entity(c).skin.texture, texture);
    assert_eq!(h.skins.requests.len(), 1);
}

#[test]
fn failed_fetch_resets_every_holder_of_the_key() {
    let mut h = Harness::new();
    let a = h.spawn(1, "bob", Vec3::ZERO);
    let b = h.spawn(2, "bob", Vec3::ZERO);
    let c = h.spawn(3, "carol", Vec3::ZERO);

    for id in [a, b, c] {
        h.check_skin(id);
    }
    h.skins.complete("carol", Some(png_bytes(&opaque_skin(64, 64))));
    h.check_skin(c);
    let carol_texture = h.entity(c).skin.texture;
    assert!(carol_texture.is_some());

    h.skins.complete("bob", None);
    h.check_skin(b);
    for id in [a, b] {
        let skin = &h.entity(id).skin;
        assert_eq!(skin.texture, None);
        assert_eq!(skin.skin_type, SkinType::Skin64x32);
        assert_eq!(skin.uv_scale, Vec2::ONE);
        assert_eq!(skin.fetch, SkinFetch::Completed);
    }
    assert_eq!(h.entity(c).skin.texture, carol_texture);
    assert_eq!(h.entity(c).skin.skin_type, SkinType::Skin64x64);
}

#[test]
fn undecodable_or_invalid_skins_reset() {
    let mut h = Harness::new();
    let a = h.spawn(1, "dave", Vec3::ZERO);
    h.check_skin(a);
    h.skins.complete("dave", Some(b"not an image".to_vec()));
    h.check_skin(a);
    assert_eq!(h.entity(a).skin.texture, None);
    assert!(h.backend.created.is_empty());

    let b = h.spawn(2, "erin", Vec3::ZERO);
    h.check_skin(b);
    h.skins.complete("erin", Some(png_bytes(&opaque_skin(64, 16))));
    h.check_skin(b);
    assert_eq!(h.entity(b).skin.texture, None);
    assert_eq!(h.chat.last(), Some("&cEntity skin had unsupported dimensions"));
}

#[test]
fn padded_skin_keeps_uv_scale() {
    let mut h = Harness::new();
    let a = h.spawn(1, "http://example.com/skin.png", Vec3::ZERO);
    h.check_skin(a);
    h.skins.complete("http://example.com/skin.png", Some(png_bytes(&opaque_skin(40, 20))));
    h.check_skin(a);
    let skin = &h.entity(a).skin;
    assert!(skin.texture.is_some());
    assert_eq!(skin.uv_scale, Vec2::new(40.0 / 64.0, 20.0 / 32.0));
    assert_eq!(skin.mob_texture, skin.texture);
}

#[test]
fn despawn_keeps_texture_while_shared() {
    let mut h = Harness::new();
    let a = h.spawn(1, "frank", Vec3::ZERO);
    let b = h.spawn(2, "frank", Vec3::ZERO);
    h.check_skin(a);
    h.skins.complete("frank", Some(png_bytes(&opaque_skin(64, 32))));
    h.check_skin(a);
    let texture = h.entity(a).skin.texture.expect("texture bound");

    assert!(h.entities.remove(a, &mut h.events, &mut h.backend));
    assert!(!h.backend.deleted.contains(&texture));
    assert!(h.entities.remove(b, &mut h.events, &mut h.backend));
    assert!(h.backend.deleted.contains(&texture));
}

#[test]
fn skin_change_forgets_the_pending_download() {
    let mut h = Harness::new();
    let a = h.spawn(1, "hank", Vec3::ZERO);
    h.check_skin(a);
    assert_eq!(h.entity(a).skin.fetch, SkinFetch::Downloading);

    h.entities.set_skin(a, "ivy", &mut h.backend);
    h.entities.forget_abandoned_skins(&mut h.skins);
    assert_eq!(h.skins.forgotten, vec!["hank".to_string()]);

    // Forgotten once only.
    h.entities.forget_abandoned_skins(&mut h.skins);
    assert_eq!(h.skins.forgotten.len(), 1);
}

#[test]
fn shared_download_is_kept_until_the_last_holder_leaves() {
    let mut h = Harness::new();
    let a = h.spawn(1, "jill", Vec3::ZERO);
    let b = h.spawn(2, "jill", Vec3::ZERO);
    h.check_skin(a);
    h.check_skin(b);

    assert!(h.entities.remove(a, &mut h.events, &mut h.backend));
    h.entities.forget_abandoned_skins(&mut h.skins);
    assert!(h.skins.forgotten.is_empty());

    assert!(h.entities.remove(b, &mut h.events, &mut h.backend));
    h.entities.forget_abandoned_skins(&mut h.skins);
    assert_eq!(h.skins.forgotten, vec!["jill".to_string()]);
}

#[test]
fn rejoining_holder_keeps_the_abandoned_download() {
    let mut h = Harness::new();
    let a = h.spawn(1, "kurt", Vec3::ZERO);
    h.check_skin(a);
    assert!(h.entities.remove(a, &mut h.events, &mut h.backend));
    h.spawn(2, "kurt", Vec3::ZERO);

    h.entities.forget_abandoned_skins(&mut h.skins);
    assert!(h.skins.forgotten.is_empty());
}

#[test]
fn downloader_discards_forgotten_results() {
    let (request_tx, request_rx) = crossbeam::channel::unbounded();
    let (result_tx, result_rx) = crossbeam::channel::unbounded();
    let mut skins = SkinDownloader::from_channels(request_tx, result_rx);

    skins.request("liam");
    skins.request("liam");
    assert_eq!(request_rx.try_iter().collect::<Vec<_>>(), vec!["liam".to_string()]);

    // Forgotten while in flight.
    skins.forget("liam");
    result_tx
        .send(FetchResult {
            key: "liam".into(),
            data: Some(vec![1]),
        })
        .expect("send result");
    assert_eq!(skins.poll("liam"), None);

    // Forgotten after arrival.
    skins.request("liam");
    assert_eq!(request_rx.try_iter().count(), 1);
    result_tx
        .send(FetchResult {
            key: "liam".into(),
            data: Some(vec![2]),
        })
        .expect("send result");
    skins.forget("liam");
    assert_eq!(skins.poll("liam"), None);

    // A fresh request after forgetting is delivered normally.
    skins.request("liam");
    assert_eq!(request_rx.try_iter().count(), 1);
    let done = FetchResult {
        key: "liam".into(),
        data: Some(vec![3]),
    };
    result_tx.send(done.clone()).expect("send result");
    assert_eq!(skins.poll("liam"), Some(done));
}

#[test]
fn skinless_model_waits_before_fetching() {
    let blocks = BlockRegistry::default();
    let mut h = Harness::new();
    let a = h.spawn(1, "mona", Vec3::ZERO);
    h.entities.set_model(a, "stone", &blocks);
    h.check_skin(a);
    assert!(h.skins.requests.is_empty());
    assert_eq!(h.entity(a).skin.fetch, SkinFetch::NotStarted);

    h.entities.set_model(a, "humanoid", &blocks);
    h.check_skin(a);
    assert_eq!(h.skins.requests, vec!["mona".to_string()]);
}

#[test]
fn skinless_holder_still_receives_shared_skin() {
    let blocks = BlockRegistry::default();
    let mut h = Harness::new();
    let a = h.spawn(1, "nate", Vec3::ZERO);
    let b = h.spawn(2, "nate", Vec3::ZERO);
    h.entities.set_model(b, "stone", &blocks);
    h.check_skin(a);
    h.check_skin(b);
    assert_eq!(h.skins.requests.len(), 1);

    h.skins.complete("nate", Some(png_bytes(&opaque_skin(64, 32))));
    h.check_skin(a);
    assert!(h.entity(b).skin.texture.is_some());
    assert_eq!(h.entity(b).skin.texture, h.entity(a).skin.texture);
}

#[test]
#[should_panic(expected = "local player slot is not populated")]
fn local_player_is_gone_after_free() {
    let mut h = Harness::new();
    h.entities.free(&mut h.events, &mut h.backend);
    let _ = h.entities.local();
}

#[test]
fn remove_notifies_and_protects_local_player() {
    let mut h = Harness::new();
    let a = h.spawn(7, "gina", Vec3::ZERO);
    h.events.drain().for_each(drop);

    assert!(h.entities.remove(a, &mut h.events, &mut h.backend));
    assert_eq!(h.events.drain().collect::<Vec<_>>(), vec![EntityEvent::Removed(7)]);
    assert!(h.entities.get(a).is_none());
    assert!(!h.entities.remove(a, &mut h.events, &mut h.backend));
    assert!(!h.entities.remove(EntityId::SELF, &mut h.events, &mut h.backend));
    assert!(h.entities.get(EntityId::SELF).is_some());

    h.entities.free(&mut h.events, &mut h.backend);
    assert!(h.entities.is_empty());
}

#[test]
#[should_panic]
fn out_of_range_entity_id_panics() {
    let _ = EntityId::new(crate::MAX_ENTITIES);
}

#[test]
fn respawn_places_feet_on_ground() {
    let world = ground_world();
    let mut h = Harness::new();
    {
        let (entity, local) = h.entities.local_mut();
        local.spawn = Vec3::new(8.5, 5.0, 8.5);
        entity.body.position = Vec3::new(2.0, 20.0, 2.0);
        entity.body.velocity = Vec3::new(0.3, -1.0, 0.0);
    }
    assert!(h.entities.handle_key(KeyBind::Respawn, &world, &mut h.chat));

    let (entity, _) = h.entities.local();
    assert!((entity.position().y - 5.001).abs() < 2e-3, "y = {}", entity.position().y);
    assert_eq!(entity.body.velocity, Vec3::ZERO);
    assert!(entity.body.on_ground);
}

#[test]
fn respawn_from_inside_ground_climbs_out() {
    let world = ground_world();
    let mut h = Harness::new();
    h.entities.local_mut().1.spawn = Vec3::new(8.5, 2.0, 8.5);
    h.entities.handle_key(KeyBind::Respawn, &world, &mut h.chat);
    let (entity, _) = h.entities.local();
    assert!((entity.position().y - 5.001).abs() < 2e-3);
    assert!(entity.body.on_ground);
}

#[test]
fn set_spawn_centres_on_block() {
    let world = ground_world();
    let mut h = Harness::new();
    {
        let (entity, _) = h.entities.local_mut();
        entity.body.position = Vec3::new(3.2, 5.0, 9.9);
        entity.head_x = 20.0;
    }
    h.entities.handle_key(KeyBind::SetSpawn, &world, &mut h.chat);
    let (entity, local) = h.entities.local();
    assert_eq!(local.spawn, Vec3::new(3.5, 5.0, 9.5));
    assert_eq!(local.spawn_head_x, 20.0);
    assert!((entity.position().x - 3.5).abs() < 1e-6);
}

#[test]
fn denied_capabilities_warn_once_per_map() {
    let world = ground_world();
    let mut h = Harness::new();
    h.entities
        .local_mut()
        .1
        .apply_server_hacks("server", "-fly -respawn");

    h.entities.handle_key(KeyBind::Fly, &world, &mut h.chat);
    h.entities.handle_key(KeyBind::Fly, &world, &mut h.chat);
    h.entities.handle_key(KeyBind::Respawn, &world, &mut h.chat);
    h.entities.handle_key(KeyBind::Respawn, &world, &mut h.chat);
    assert_eq!(h.chat.len(), 2);
    assert!(!h.entities.local().1.hacks.flying);

    let (entity, local) = h.entities.local_mut();
    local.on_new_map(entity);
    h.entities.handle_key(KeyBind::Fly, &world, &mut h.chat);
    assert_eq!(h.chat.len(), 3);
    assert_eq!(h.chat.last(), Some("&cFlying is disabled in this map"));
}

#[test]
fn fly_and_noclip_toggle() {
    let world = ground_world();
    let mut h = Harness::new();
    assert!(h.entities.handle_key(KeyBind::Fly, &world, &mut h.chat));
    assert!(h.entities.local().1.hacks.flying);

    h.entities.local_mut().0.body.velocity.y = 0.5;
    h.entities.handle_key(KeyBind::NoClip, &world, &mut h.chat);
    assert!(h.entities.local().1.hacks.noclip);
    h.entities.handle_key(KeyBind::NoClip, &world, &mut h.chat);
    let (entity, local) = h.entities.local();
    assert!(!local.hacks.noclip);
    assert_eq!(entity.body.velocity.y, 0.0);

    assert!(!h.entities.handle_key(KeyBind::Forward, &world, &mut h.chat));
}

#[test]
fn wom_style_noclip_ignores_toggle_key() {
    let world = ground_world();
    let mut settings = ClientSettings::default();
    settings.hacks.wom_style_hacks = true;
    let mut h = Harness::with_settings(&settings);
    assert!(h.entities.handle_key(KeyBind::NoClip, &world, &mut h.chat));
    assert!(!h.entities.local().1.hacks.noclip);
}

#[test]
fn multi_jump_budget_allows_two_extra_jumps() {
    let world = ground_world();
    let mut h = Harness::new();
    {
        let (entity, local) = h.entities.local_mut();
        local.hacks.max_jumps = 3;
        local.hacks.can_double_jump = false;
        entity.body.on_ground = false;
    }

    let mut accepted = 0;
    for _ in 0..3 {
        h.entities.local_mut().0.body.velocity = Vec3::ZERO;
        assert!(h.entities.handle_key(KeyBind::Jump, &world, &mut h.chat));
        if h.entities.local().0.body.velocity.y > 0.0 {
            accepted += 1;
        }
    }
    assert_eq!(accepted, 2);
    assert_eq!(h.entities.local().1.physics.multi_jumps, 2);

    // Grounded jumps are left to normal movement.
    h.entities.local_mut().0.body.on_ground = true;
    assert!(!h.entities.handle_key(KeyBind::Jump, &world, &mut h.chat));
}

#[test]
fn server_jump_height_sets_jump_velocity() {
    let mut h = Harness::new();
    let (_, local) = h.entities.local_mut();
    local.apply_server_hacks("server", "jumpheight=3");
    assert!(local.jump_height() > 3.0);
    assert!(local.physics.jump_vel > 0.42);
}

#[test]
fn local_player_falls_to_ground_over_ticks() {
    let world = ground_world();
    let settings = ClientSettings::default();
    let input = InputState::default();
    let mut h = Harness::with_settings(&settings);
    h.entities.set_location(
        EntityId::SELF,
        &LocationUpdate::make_position(Vec3::new(8.5, 10.0, 8.5), false),
        false,
    );

    let ctx = TickContext {
        world: Some(&world),
        input: &input,
        settings: &settings,
        delta: 0.05,
    };
    for _ in 0..60 {
        h.entities
            .tick(&ctx, &mut h.skins, &mut h.backend, &mut h.chat);
    }
    let (prev, next) = h.entities.interp_states(EntityId::SELF).expect("local interp");
    assert!((next.pos.y - 5.0).abs() < 1e-2, "y = {}", next.pos.y);
    assert!((prev.pos.y - next.pos.y).abs() < 1e-3);
    assert!(h.entities.local().0.body.on_ground);
    assert_eq!(h.skins.requests, vec!["Player".to_string()]);
}

#[test]
fn local_player_walks_forward_and_ignores_captured_input() {
    let world = ground_world();
    let settings = ClientSettings::default();
    let mut input = InputState::default();
    input.press(KeyBind::Forward);
    let mut h = Harness::with_settings(&settings);
    h.entities.set_location(
        EntityId::SELF,
        &LocationUpdate::make_position(Vec3::new(8.5, 5.0, 8.5), false),
        false,
    );

    input.handles_all_input = true;
    let ctx = TickContext {
        world: Some(&world),
        input: &input,
        settings: &settings,
        delta: 0.05,
    };
    for _ in 0..5 {
        h.entities
            .tick(&ctx, &mut h.skins, &mut h.backend, &mut h.chat);
    }
    let (_, next) = h.entities.interp_states(EntityId::SELF).expect("local interp");
    assert!((next.pos.z - 8.5).abs() < 1e-6);

    let mut input = input.clone();
    input.handles_all_input = false;
    let ctx = TickContext {
        world: Some(&world),
        input: &input,
        settings: &settings,
        delta: 0.05,
    };
    for _ in 0..5 {
        h.entities
            .tick(&ctx, &mut h.skins, &mut h.backend, &mut h.chat);
    }
    let (_, next) = h.entities.interp_states(EntityId::SELF).expect("local interp");
    assert!(next.pos.z < 8.3, "z = {}", next.pos.z);
}

#[test]
fn tick_without_world_leaves_local_player() {
    let settings = ClientSettings::default();
    let input = InputState::default();
    let mut h = Harness::with_settings(&settings);
    h.entities.local_mut().0.body.velocity = Vec3::new(1.0, 0.0, 0.0);
    let ctx: TickContext<'_, WorldMap> = TickContext {
        world: None,
        input: &input,
        settings: &settings,
        delta: 0.05,
    };
    h.entities
        .tick(&ctx, &mut h.skins, &mut h.backend, &mut h.chat);
    assert_eq!(h.entities.local().0.position(), Vec3::ZERO);
}

fn look_north(h: &mut Harness) {
    let (entity, _) = h.entities.local_mut();
    entity.body.position = Vec3::new(8.0, 5.0, 8.0);
    entity.head_y = 0.0;
    entity.head_x = 0.0;
}

#[test]
fn closest_entity_along_look_direction() {
    let mut h = Harness::new();
    look_north(&mut h);
    let near = h.spawn(1, "near", Vec3::new(8.0, 5.0, 4.0));
    let _far = h.spawn(2, "far", Vec3::new(8.0, 5.0, 2.0));
    let _behind = h.spawn(3, "behind", Vec3::new(8.0, 5.0, 12.0));
    let _aside = h.spawn(4, "aside", Vec3::new(14.0, 5.0, 4.0));

    assert_eq!(h.entities.get_closest(EntityId::SELF), Some(near));

    h.entities.local_mut().0.head_y = 180.0;
    assert_eq!(h.entities.get_closest(EntityId::SELF), Some(EntityId::new(3)));
}

#[test]
fn hovered_mode_draws_only_the_hovered_name() {
    let mut h = Harness::new();
    look_north(&mut h);
    h.spawn(1, "near", Vec3::new(8.0, 5.0, 4.0));
    h.spawn(2, "side", Vec3::new(12.0, 5.0, 8.0));
    let frame = frame_at(Vec3::new(8.0, 6.6, 8.0));

    h.entities.name_mode = NameMode::Hovered;
    h.entities.render_names(&frame, &mut h.backend);
    assert!(h.backend.names.is_empty());
    assert_eq!(h.entities.hovered(), Some(EntityId::new(1)));
    h.entities.render_hovered_names(&frame, &mut h.backend);
    assert_eq!(h.backend.names.len(), 1);
}

#[test]
fn all_hovered_mode_draws_every_remote_name() {
    let mut h = Harness::new();
    look_north(&mut h);
    h.spawn(1, "near", Vec3::new(8.0, 5.0, 4.0));
    h.spawn(2, "side", Vec3::new(12.0, 5.0, 8.0));
    // Beyond the 32 block name range.
    h.spawn(3, "distant", Vec3::new(8.0, 5.0, 200.0));
    let frame = frame_at(Vec3::new(8.0, 6.6, 8.0));

    h.entities.name_mode = NameMode::AllHovered;
    h.entities.render_names(&frame, &mut h.backend);
    h.entities.render_hovered_names(&frame, &mut h.backend);
    assert_eq!(h.backend.names.len(), 2);

    h.backend.names.clear();
    h.entities.name_mode = NameMode::None;
    h.entities.render_hovered_names(&frame, &mut h.backend);
    assert!(h.backend.names.is_empty());
}

#[test]
fn render_models_skips_first_person_and_hidden() {
    let world = ground_world();
    let mut h = Harness::new();
    h.spawn(1, "near", Vec3::new(8.0, 5.0, 4.0));
    let frame = frame_at(Vec3::ZERO);
    h.entities.render_models(&frame, &world, &mut h.backend);
    assert_eq!(h.backend.models, vec![1]);

    h.backend.models.clear();
    h.backend.hidden = true;
    let third = FrameContext {
        third_person: true,
        ..frame
    };
    h.entities.render_models(&third, &world, &mut h.backend);
    assert_eq!(h.backend.models, vec![255]);
    assert!(!h.entities.get(EntityId::new(1)).expect("spawned").should_render);
}

#[test]
fn shadows_follow_shadow_mode() {
    let mut h = Harness::new();
    h.spawn(1, "near", Vec3::new(8.0, 5.0, 4.0));

    h.entities.draw_shadows(&mut h.backend);
    assert!(h.backend.shadows.is_empty());

    h.entities.shadow_mode = ShadowMode::Circle;
    h.entities.draw_shadows(&mut h.backend);
    assert_eq!(h.backend.shadows, vec![255]);

    h.backend.shadows.clear();
    h.entities.shadow_mode = ShadowMode::CircleAll;
    h.entities.draw_shadows(&mut h.backend);
    assert_eq!(h.backend.shadows, vec![255, 1]);
}

#[test]
fn context_loss_drops_and_rebuilds_name_textures() {
    let mut h = Harness::new();
    let a = h.spawn(1, "near", Vec3::ZERO);
    h.entities.context_recreated(&mut h.backend);
    let name = h.entity(a).name_texture.expect("name texture");

    h.entities.context_lost(&mut h.backend);
    assert!(h.backend.deleted.contains(&name.id));
    assert!(h.entity(a).name_texture.is_none());

    h.entities.chat_font_changed(&mut h.backend);
    assert!(h.entity(a).name_texture.is_some());
}

#[test]
fn tab_list_strips_colour_codes() {
    let mut tab = TabList::default();
    let id = EntityId::new(4);
    tab.set(id, "&aSteve", "&aSteve", "Players", 3);
    let entry = tab.get(id).expect("entry");
    assert_eq!(entry.player, "Steve");
    assert_eq!(entry.list, "&aSteve");
    assert_eq!(tab.iter().count(), 1);

    assert!(tab.remove(id));
    assert!(!tab.remove(id));
    tab.set(id, "Alex", "Alex", "", 0);
    tab.reset();
    assert!(tab.get(id).is_none());
}
