use std::f32::consts::TAU;

use bevy::prelude::*;
use rs_entity::{Entities, EntityId, LocationUpdate, TabList};
use rs_utils::block::BLOCK_GRASS;
use rs_utils::{BlockWorld, Chat, EntityEventQueue, InputState, KeyBind, WorldMap};
use tracing::info;

use crate::backend::HeadlessBackend;
use crate::entity_systems::CameraState;

const ORBIT_RADIUS: f32 = 6.0;
const ORBIT_SPEED: f32 = 0.05;
const DEMO_MODELS: [&str; 4] = ["humanoid", "chibi", "chicken|1.5", "giant"];

/// Parameters of the scripted session.
#[derive(Debug, Clone, Resource)]
pub struct DemoConfig {
    pub players: u8,
    pub ticks: u32,
    pub server_name: String,
    pub motd: String,
}

#[derive(Debug, Default, Resource)]
pub struct DemoState {
    pub tick: u32,
}

/// A flat grass map with the surface at half height.
pub fn demo_world() -> WorldMap {
    WorldMap::flat(64, 64, 64, 32, BLOCK_GRASS)
}

fn orbit_position(world: &WorldMap, index: u8, players: u8, tick: u32) -> Vec3 {
    let centre = Vec3::new(world.width() as f32 / 2.0, 32.0, world.length() as f32 / 2.0);
    let angle = tick as f32 * ORBIT_SPEED + index as f32 * TAU / players.max(1) as f32;
    centre + Vec3::new(angle.cos(), 0.0, angle.sin()) * ORBIT_RADIUS
}

#[allow(clippy::too_many_arguments)]
pub fn spawn_demo_entities_system(
    config: Res<DemoConfig>,
    world: Res<WorldMap>,
    mut entities: ResMut<Entities>,
    mut events: ResMut<EntityEventQueue>,
    mut backend: ResMut<HeadlessBackend>,
    mut tab_list: ResMut<TabList>,
) {
    {
        let (entity, local) = entities.local_mut();
        local.apply_server_hacks(&config.server_name, &config.motd);
        local.spawn = Vec3::new(
            world.width() as f32 / 2.0 + 0.5,
            32.0,
            world.length() as f32 / 2.0 + 0.5,
        );
        local.respawn(entity, &*world);
        tab_list.set(EntityId::SELF, &entity.name, &entity.name, "Players", 0);
    }

    for i in 0..config.players {
        let id = EntityId::new(usize::from(i) + 1);
        let name = format!("Bot{}", i + 1);
        let pos = orbit_position(&world, i, config.players, 0);
        let entity = entities.spawn_player(id, &name, &name, pos, &mut events, &mut *backend);
        entity.set_model(DEMO_MODELS[usize::from(i) % DEMO_MODELS.len()], world.blocks());
        tab_list.set(id, &format!("&e{name}"), &format!("&e{name}"), "Bots", 1);
    }

    let pig = EntityId::new(usize::from(config.players) + 1);
    entities
        .spawn_generic(pig, Vec3::new(20.5, 32.0, 20.5), &mut events, &mut *backend)
        .set_model("pig", world.blocks());
    info!(players = config.players, ticks = config.ticks, "demo entities spawned");
}

/// Scripted inputs and server updates, one step per tick. Exits the app
/// once the configured tick count is reached.
#[allow(clippy::too_many_arguments)]
pub fn demo_driver_system(
    config: Res<DemoConfig>,
    world: Res<WorldMap>,
    mut state: ResMut<DemoState>,
    mut entities: ResMut<Entities>,
    mut input: ResMut<InputState>,
    mut camera: ResMut<CameraState>,
    mut chat: ResMut<Chat>,
    mut events: ResMut<EntityEventQueue>,
    mut backend: ResMut<HeadlessBackend>,
    mut tab_list: ResMut<TabList>,
    mut exit: EventWriter<AppExit>,
) {
    state.tick += 1;
    let tick = state.tick;

    for i in 0..config.players {
        let id = EntityId::new(usize::from(i) + 1);
        let pos = orbit_position(&world, i, config.players, tick);
        let yaw = (tick as f32 * ORBIT_SPEED).to_degrees() + 180.0;
        let update = LocationUpdate::make_position_and_orientation(pos, yaw, 0.0, false);
        entities.set_location(id, &update, true);
    }

    match tick {
        20 => input.press(KeyBind::Forward),
        60 => input.release(KeyBind::Forward),
        70 => {
            input.press(KeyBind::Jump);
            camera.third_person = true;
        }
        72 => input.release(KeyBind::Jump),
        80 | 100 => {
            entities.handle_key(KeyBind::Fly, &*world, &mut chat);
        }
        90 => input.press(KeyBind::FlyUp),
        95 => input.release(KeyBind::FlyUp),
        120 => {
            entities.handle_key(KeyBind::Respawn, &*world, &mut chat);
            camera.third_person = false;
        }
        _ => {}
    }

    if tick == config.ticks / 2 && config.players > 0 {
        let id = EntityId::new(1);
        if entities.remove(id, &mut events, &mut *backend) {
            tab_list.remove(id);
        }
    }

    if tick >= config.ticks {
        let (local, _) = entities.local();
        info!(tick, pos = ?local.position(), entities = entities.len(), "demo finished");
        exit.write(AppExit::Success);
    }
}
