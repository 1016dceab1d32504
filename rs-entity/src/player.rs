use std::collections::HashSet;

use bevy::prelude::Vec3;
use rs_sim::{
    DEFAULT_JUMP_VEL, HacksComp, PhysicsComp, calc_jump_velocity, do_entity_push, find_spawn,
    max_height, probe_on_ground,
};
use rs_utils::{BlockWorld, Chat, ClientSettings, InputState, KeyBind, rotate_y};
use tracing::debug;

use crate::anim::TiltComp;
use crate::entity::Entity;
use crate::interp::{LocalInterpComp, NetInterpComp};
use crate::location::LocationUpdate;

/// Per-tick inputs shared by every entity.
pub struct TickContext<'a, W: BlockWorld + ?Sized> {
    /// `None` while no map is loaded.
    pub world: Option<&'a W>,
    pub input: &'a InputState,
    pub settings: &'a ClientSettings,
    /// Tick length in seconds.
    pub delta: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    Respawn,
    Fly,
    NoClip,
}

impl Capability {
    fn denied_message(self) -> &'static str {
        match self {
            Capability::Respawn => "&cRespawning is disabled in this map",
            Capability::Fly => "&cFlying is disabled in this map",
            Capability::NoClip => "&cNoclip is disabled in this map",
        }
    }
}

/// Capabilities the user has already been told are disabled. Cleared when a
/// new map loads.
#[derive(Clone, Debug, Default)]
pub struct WarnedCapabilities(HashSet<Capability>);

impl WarnedCapabilities {
    pub fn warn_once(&mut self, capability: Capability, chat: &mut Chat) {
        if self.0.insert(capability) {
            chat.add(capability.denied_message());
        }
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.0.contains(&capability)
    }

    pub fn rearm(&mut self) {
        self.0.clear();
    }
}

/// The player this client controls.
#[derive(Clone, Debug)]
pub struct LocalPlayer {
    pub hacks: HacksComp,
    pub physics: PhysicsComp,
    pub interp: LocalInterpComp,
    pub tilt: TiltComp,
    pub spawn: Vec3,
    pub spawn_rot_y: f32,
    pub spawn_head_x: f32,
    pub warned: WarnedCapabilities,
}

impl LocalPlayer {
    pub fn new(settings: &ClientSettings) -> Self {
        let mut player = Self {
            hacks: HacksComp::default(),
            physics: PhysicsComp::default(),
            interp: LocalInterpComp::default(),
            tilt: TiltComp::default(),
            spawn: Vec3::ZERO,
            spawn_rot_y: 0.0,
            spawn_head_x: 0.0,
            warned: WarnedCapabilities::default(),
        };
        player.init(settings);
        player
    }

    /// Loads the user's hacks options. Classic mode keeps the defaults.
    pub fn init(&mut self, settings: &ClientSettings) {
        self.hacks.apply_settings(&settings.hacks, settings.classic_mode);
        if settings.classic_mode {
            return;
        }
        self.physics.user_jump_vel = settings.hacks.jump_velocity;
        self.physics.jump_vel = self.physics.user_jump_vel;
    }

    pub fn reset(&mut self, entity: &mut Entity) {
        entity.body.velocity = Vec3::ZERO;
        self.physics.jump_vel = DEFAULT_JUMP_VEL;
        self.physics.server_jump_vel = DEFAULT_JUMP_VEL;
    }

    pub fn on_new_map(&mut self, entity: &mut Entity) {
        entity.body.velocity = Vec3::ZERO;
        entity.old_velocity = Vec3::ZERO;
        self.warned.rearm();
    }

    /// Applies the server's hacks flags, including any imposed jump height.
    pub fn apply_server_hacks(&mut self, server_name: &str, motd: &str) {
        self.hacks.update_from_motd(server_name, motd);
        if let Some(height) = self.hacks.jump_height_flag {
            self.physics.server_jump_vel = calc_jump_velocity(height);
            self.physics.jump_vel = self.physics.server_jump_vel;
        }
        self.check_hacks_consistency();
    }

    pub fn check_hacks_consistency(&mut self) {
        self.hacks.check_consistency();
        if !self.hacks.can_jump_higher() {
            self.physics.jump_vel = self.physics.server_jump_vel;
        }
    }

    /// Height of a jump at the current jump velocity.
    pub fn jump_height(&self) -> f32 {
        max_height(self.physics.jump_vel)
    }

    pub fn tick<W: BlockWorld + ?Sized>(
        &mut self,
        entity: &mut Entity,
        ctx: &TickContext<'_, W>,
        neighbours: &[(Vec3, Vec3)],
    ) {
        let Some(world) = ctx.world else {
            return;
        };
        let hacks = &self.hacks;
        entity.body.step_size =
            if hacks.full_block_step && hacks.enabled && hacks.can_any_hacks && hacks.can_speed {
                1.0
            } else {
                0.5
            };
        entity.old_velocity = entity.body.velocity;
        self.interp.advance_state(entity);

        let (x_moving, z_moving) = self.handle_input(entity, ctx.input);
        self.hacks.floating = self.hacks.noclip || self.hacks.flying;
        if !self.hacks.floating && self.hacks.can_be_pushed {
            do_entity_push(&mut entity.body, neighbours.iter().copied());
        }

        if !self.hacks.noclip_slide && self.hacks.noclip && x_moving == 0.0 && z_moving == 0.0 {
            entity.body.velocity = Vec3::ZERO;
        }

        self.physics
            .update_velocity_state(&mut entity.body, &self.hacks, world);
        let heading = rotate_y(Vec3::new(x_moving, 0.0, z_moving), entity.head_y.to_radians());
        self.physics
            .physics_tick(&mut entity.body, &self.hacks, world, heading);

        // A jump impulse must not carry over into flight.
        if self.hacks.floating {
            entity.body.velocity.y = 0.0;
        }

        self.interp.base.next.pos = entity.body.position;
        entity.body.position = self.interp.base.prev.pos;
        let (prev, next) = (self.interp.base.prev.pos, self.interp.base.next.pos);
        let on_ground = entity.body.on_ground;
        entity
            .anim
            .update(prev, next, ctx.delta, on_ground, ctx.settings.view_bobbing);
        self.tilt.update(self.hacks.floating);
    }

    /// Samples movement keys into intents. Returns the local X/Z movement
    /// axes.
    fn handle_input(&mut self, entity: &mut Entity, input: &InputState) -> (f32, f32) {
        let hacks = &mut self.hacks;
        if input.handles_all_input {
            self.physics.jumping = false;
            hacks.speeding = false;
            hacks.flying_up = false;
            hacks.flying_down = false;
            return (0.0, 0.0);
        }

        let mut x = 0.0;
        let mut z = 0.0;
        if input.is_pressed(KeyBind::Forward) {
            z -= 0.98;
        }
        if input.is_pressed(KeyBind::Back) {
            z += 0.98;
        }
        if input.is_pressed(KeyBind::Left) {
            x -= 0.98;
        }
        if input.is_pressed(KeyBind::Right) {
            x += 0.98;
        }

        self.physics.jumping = input.is_pressed(KeyBind::Jump);
        hacks.speeding = hacks.enabled && input.is_pressed(KeyBind::Speed);
        hacks.half_speeding = hacks.enabled && input.is_pressed(KeyBind::HalfSpeed);
        hacks.flying_up = input.is_pressed(KeyBind::FlyUp);
        hacks.flying_down = input.is_pressed(KeyBind::FlyDown);

        // WOM-style noclip follows the held key instead of toggling.
        if hacks.wom_style_hacks && hacks.enabled && hacks.can_noclip {
            if hacks.noclip {
                entity.body.velocity = Vec3::ZERO;
            }
            hacks.noclip = input.is_pressed(KeyBind::NoClip);
        }
        (x, z)
    }

    /// Frame position. WOM-style noclip keeps the unblended position so the
    /// camera does not lag.
    pub fn set_interp_position(&self, entity: &mut Entity, t: f32) {
        if !(self.hacks.wom_style_hacks && self.hacks.noclip) {
            entity.body.position = self.interp.base.current(t).pos;
        }
        self.interp.base.lerp_angles(entity, t);
    }

    pub fn set_location(&mut self, entity: &mut Entity, update: &LocationUpdate, interpolate: bool) {
        self.interp.set_location(entity, update, interpolate);
    }

    /// Teleports to the spawn point, lifted onto the first layer the body
    /// fits in.
    pub fn respawn<W: BlockWorld + ?Sized>(&mut self, entity: &mut Entity, world: &W) {
        let spawn = find_spawn(world, self.spawn, entity.body.size);
        let update = LocationUpdate::make_position_and_orientation(
            spawn,
            self.spawn_rot_y,
            self.spawn_head_x,
            false,
        );
        self.interp.set_location(entity, &update, false);
        entity.body.velocity = Vec3::ZERO;
        entity.body.on_ground = probe_on_ground(world, &entity.body);
        debug!(pos = ?entity.body.position, on_ground = entity.body.on_ground, "respawned");
    }

    /// Handles a key press. Returns whether the key was consumed.
    pub fn handles_key<W: BlockWorld + ?Sized>(
        &mut self,
        entity: &mut Entity,
        key: KeyBind,
        world: &W,
        chat: &mut Chat,
    ) -> bool {
        match key {
            KeyBind::Respawn => {
                self.handle_respawn(entity, world, chat);
                true
            }
            KeyBind::SetSpawn => {
                if self.hacks.can_respawn {
                    let pos = entity.position();
                    self.spawn = Vec3::new(pos.x.floor() + 0.5, pos.y, pos.z.floor() + 0.5);
                    self.spawn_rot_y = entity.rot_y;
                    self.spawn_head_x = entity.head_x;
                }
                self.handle_respawn(entity, world, chat);
                true
            }
            KeyBind::Fly => {
                if self.hacks.can_fly && self.hacks.enabled {
                    self.hacks.flying = !self.hacks.flying;
                } else {
                    self.warned.warn_once(Capability::Fly, chat);
                }
                true
            }
            KeyBind::NoClip => {
                if self.hacks.can_noclip && self.hacks.enabled {
                    if self.hacks.wom_style_hacks {
                        return true;
                    }
                    if self.hacks.noclip {
                        entity.body.velocity.y = 0.0;
                    }
                    self.hacks.noclip = !self.hacks.noclip;
                } else {
                    self.warned.warn_once(Capability::NoClip, chat);
                }
                true
            }
            KeyBind::Jump if !entity.body.on_ground && !(self.hacks.flying || self.hacks.noclip) => {
                let double_jump = if self.hacks.can_double_jump && self.hacks.wom_style_hacks {
                    2
                } else {
                    0
                };
                let max_jumps = double_jump.max(self.hacks.max_jumps - 1);
                if self.physics.multi_jumps < max_jumps {
                    self.physics.do_normal_jump(&mut entity.body, &self.hacks);
                    self.physics.multi_jumps += 1;
                }
                true
            }
            _ => false,
        }
    }

    fn handle_respawn<W: BlockWorld + ?Sized>(&mut self, entity: &mut Entity, world: &W, chat: &mut Chat) {
        if self.hacks.can_respawn {
            self.respawn(entity, world);
        } else {
            self.warned.warn_once(Capability::Respawn, chat);
        }
    }
}

/// A player or entity whose movement comes from the server.
#[derive(Clone, Debug, Default)]
pub struct NetPlayer {
    pub interp: NetInterpComp,
}

impl NetPlayer {
    pub fn tick(&mut self, entity: &mut Entity, delta: f32, view_bobbing: bool) {
        self.interp.advance_state(entity);
        let (prev, next) = (self.interp.base.prev.pos, self.interp.base.next.pos);
        let on_ground = entity.body.on_ground;
        entity.anim.update(prev, next, delta, on_ground, view_bobbing);
    }

    pub fn set_location(&mut self, entity: &mut Entity, update: &LocationUpdate, interpolate: bool) {
        self.interp.set_location(entity, update, interpolate);
    }
}

/// Polymorphic entity behavior. Generic entities move like network players
/// but carry no name label or skin.
#[derive(Clone, Debug)]
pub enum Behavior {
    Local(Box<LocalPlayer>),
    Network(NetPlayer),
    Generic(NetPlayer),
}
