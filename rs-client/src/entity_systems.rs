use bevy::prelude::*;
use rs_entity::{Entities, EntityId, FrameContext, SkinDownloader, TickContext};
use rs_utils::{Chat, ClientSettings, EntityEvent, EntityEventQueue, InputState, WorldMap};
use tracing::{debug, info};

use crate::backend::HeadlessBackend;
use crate::timing::{EntityTimings, Timing};

const STATS_EVERY_FRAMES: u32 = 120;

/// Camera options the entity passes depend on.
#[derive(Debug, Default, Resource)]
pub struct CameraState {
    pub third_person: bool,
}

/// Fixed-rate simulation of every entity.
#[allow(clippy::too_many_arguments)]
pub fn entity_tick_system(
    time: Res<Time>,
    world: Res<WorldMap>,
    input: Res<InputState>,
    settings: Res<ClientSettings>,
    mut entities: ResMut<Entities>,
    mut skins: ResMut<SkinDownloader>,
    mut backend: ResMut<HeadlessBackend>,
    mut chat: ResMut<Chat>,
    mut timings: ResMut<EntityTimings>,
) {
    let timing = Timing::start();
    let ctx = TickContext {
        world: Some(&*world),
        input: &input,
        settings: &settings,
        delta: time.delta_secs(),
    };
    entities.tick(&ctx, &mut *skins, &mut *backend, &mut chat);
    timings.record_tick(timing.ms());
}

/// Per-frame pass: blends every entity between its last two ticks and
/// issues model, shadow and name draws.
#[allow(clippy::too_many_arguments)]
pub fn entity_render_system(
    fixed: Res<Time<Fixed>>,
    time: Res<Time>,
    world: Res<WorldMap>,
    camera: Res<CameraState>,
    mut entities: ResMut<Entities>,
    mut backend: ResMut<HeadlessBackend>,
    mut timings: ResMut<EntityTimings>,
    mut frames: Local<u32>,
) {
    let timing = Timing::start();
    let frame = FrameContext {
        t: fixed.overstep_fraction().clamp(0.0, 1.0),
        camera_pos: entities.local().0.eye_position(),
        third_person: camera.third_person,
        idle_time: time.elapsed_secs(),
    };

    entities.render_models(&frame, &*world, &mut *backend);
    entities.draw_shadows(&mut *backend);
    entities.render_names(&frame, &mut *backend);
    entities.render_hovered_names(&frame, &mut *backend);
    timings.record_render(timing.ms());

    let stats = backend.end_frame();
    *frames += 1;
    if *frames % STATS_EVERY_FRAMES == 0 {
        debug!(
            models = stats.models,
            names = stats.names,
            shadows = stats.shadows,
            textures = backend.live_textures(),
            hovered = ?entities.hovered().map(EntityId::raw),
            "entity frame"
        );
    }
}

pub fn entity_event_log_system(mut events: ResMut<EntityEventQueue>, entities: Res<Entities>) {
    for event in events.drain() {
        match event {
            EntityEvent::Added(id) => {
                let name = entities.get(EntityId::from(id)).map_or("", |e| e.name.as_str());
                info!(id, name, "entity added");
            }
            EntityEvent::Removed(id) => info!(id, "entity removed"),
        }
    }
}

/// Mirrors new chat lines to the log.
pub fn chat_log_system(chat: Res<Chat>, mut seen: Local<usize>) {
    let fresh = chat.total_added().saturating_sub(*seen).min(chat.len());
    for line in chat.lines().skip(chat.len() - fresh) {
        info!(target: "chat", "{}", rs_utils::strip_color_codes(line));
    }
    *seen = chat.total_added();
}
