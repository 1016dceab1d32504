use bevy::prelude::*;
use bevy::time::Fixed;
use rs_entity::{Entities, SkinDownloader, TabList};
use rs_utils::{Chat, ClientSettings, EntityEventQueue, InputState, WorldMap};

use crate::backend::HeadlessBackend;
use crate::demo;
use crate::entity_systems;
use crate::timing::EntityTimings;

/// Simulation rate of every entity, in seconds per tick.
pub const TICK_SECONDS: f64 = 0.05;

/// Entity registry, skin downloads and the tick/render passes over them.
pub struct ClientEntityPlugin {
    pub settings: ClientSettings,
    pub world: WorldMap,
}

impl Plugin for ClientEntityPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(Time::<Fixed>::from_seconds(TICK_SECONDS))
            .insert_resource(self.settings.clone())
            .insert_resource(self.world.clone())
            .insert_resource(Entities::new(&self.settings))
            .insert_resource(SkinDownloader::new(self.settings.skin_server.clone()))
            .insert_resource(HeadlessBackend::default())
            .insert_resource(InputState::default())
            .insert_resource(Chat::default())
            .insert_resource(EntityEventQueue::default())
            .insert_resource(TabList::default())
            .insert_resource(EntityTimings::default())
            .insert_resource(entity_systems::CameraState::default())
            .add_systems(FixedUpdate, entity_systems::entity_tick_system)
            .add_systems(
                Update,
                (
                    entity_systems::entity_render_system,
                    entity_systems::entity_event_log_system,
                    entity_systems::chat_log_system,
                ),
            );
    }
}

/// Scripted session driving the entity plugin without a server.
pub struct ClientDemoPlugin {
    pub config: demo::DemoConfig,
}

impl Plugin for ClientDemoPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.config.clone())
            .insert_resource(demo::DemoState::default())
            .add_systems(Startup, demo::spawn_demo_entities_system)
            .add_systems(
                FixedUpdate,
                demo::demo_driver_system.before(entity_systems::entity_tick_system),
            );
    }
}

pub struct ClientTimingPlugin;

#[cfg(feature = "perf_timing")]
impl Plugin for ClientTimingPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Last, report_timings_system);
    }
}

#[cfg(not(feature = "perf_timing"))]
impl Plugin for ClientTimingPlugin {
    fn build(&self, _app: &mut App) {}
}

#[cfg(feature = "perf_timing")]
fn report_timings_system(timings: Res<EntityTimings>, mut frames: Local<u32>) {
    *frames += 1;
    if *frames % 600 == 0 {
        tracing::debug!(
            tick_ms = timings.tick_ms,
            render_ms = timings.render_ms,
            peak_tick_ms = timings.peak_tick_ms,
            peak_render_ms = timings.peak_render_ms,
            "entity timings"
        );
    }
}
