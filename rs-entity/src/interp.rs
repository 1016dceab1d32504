use std::collections::VecDeque;

use bevy::prelude::Vec3;
use rs_utils::{ENTITY_ADJUSTMENT, lerp_angle};

use crate::entity::Entity;
use crate::location::{LocationFlags, LocationUpdate};

const MAX_ROT_Y_STATES: usize = 15;
const MAX_NET_STATES: usize = 10;

/// One committed tick snapshot. `rot_y` is the body yaw, which lags the
/// head yaw while interpolating.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InterpState {
    pub pos: Vec3,
    pub head_x: f32,
    pub head_y: f32,
    pub rot_x: f32,
    pub rot_y: f32,
    pub rot_z: f32,
}

impl InterpState {
    pub fn of(entity: &Entity) -> Self {
        Self {
            pos: entity.position(),
            head_x: entity.head_x,
            head_y: entity.head_y,
            rot_x: entity.rot_x,
            rot_y: entity.rot_y,
            rot_z: entity.rot_z,
        }
    }

    fn apply_update(&mut self, update: &LocationUpdate) {
        if update.has(LocationFlags::POS) {
            if update.is_relative() {
                self.pos += update.pos;
            } else {
                self.pos = update.pos;
            }
        }
        if update.has(LocationFlags::HEAD_X) {
            self.head_x = update.pitch;
        }
        if update.has(LocationFlags::HEAD_Y) {
            self.head_y = update.yaw;
        }
        if update.has(LocationFlags::ROT_X) {
            self.rot_x = update.rot_x;
        }
        if update.has(LocationFlags::ROT_Z) {
            self.rot_z = update.rot_z;
        }
    }
}

/// State shared by both interpolation variants: the two committed
/// snapshots and the queue of lagging body yaw steps.
#[derive(Clone, Debug, Default)]
pub struct InterpBase {
    pub prev: InterpState,
    pub next: InterpState,
    rot_y_states: VecDeque<f32>,
}

impl InterpBase {
    fn reset_to(&mut self, state: InterpState) {
        self.prev = state;
        self.next = state;
        self.rot_y_states.clear();
    }

    /// Queues the body yaw catching up with the head over three ticks.
    fn push_rot_y_steps(&mut self, from: f32, to: f32) {
        for i in 1..=3 {
            if self.rot_y_states.len() == MAX_ROT_Y_STATES {
                self.rot_y_states.pop_front();
            }
            self.rot_y_states.push_back(lerp_angle(from, to, i as f32 / 3.0));
        }
    }

    fn advance_rot_y(&mut self) {
        if let Some(rot_y) = self.rot_y_states.pop_front() {
            self.next.rot_y = rot_y;
        }
    }

    pub fn pending_rot_y(&self) -> usize {
        self.rot_y_states.len()
    }

    /// Blend between `prev` and `next`; `t` is clamped to [0, 1].
    pub fn current(&self, t: f32) -> InterpState {
        let t = t.clamp(0.0, 1.0);
        InterpState {
            pos: self.prev.pos.lerp(self.next.pos, t),
            head_x: lerp_angle(self.prev.head_x, self.next.head_x, t),
            head_y: lerp_angle(self.prev.head_y, self.next.head_y, t),
            rot_x: lerp_angle(self.prev.rot_x, self.next.rot_x, t),
            rot_y: lerp_angle(self.prev.rot_y, self.next.rot_y, t),
            rot_z: lerp_angle(self.prev.rot_z, self.next.rot_z, t),
        }
    }

    pub fn lerp_angles(&self, entity: &mut Entity, t: f32) {
        let current = self.current(t);
        entity.head_x = current.head_x;
        entity.head_y = current.head_y;
        entity.rot_x = current.rot_x;
        entity.rot_y = current.rot_y;
        entity.rot_z = current.rot_z;
    }

    /// Writes the blended position and angles onto `entity`.
    pub fn apply(&self, entity: &mut Entity, t: f32) {
        entity.body.position = self.current(t).pos;
        self.lerp_angles(entity, t);
    }
}

/// Interpolation for the local player, whose `next` state is produced by
/// its own physics each tick.
#[derive(Clone, Debug, Default)]
pub struct LocalInterpComp {
    pub base: InterpBase,
}

impl LocalInterpComp {
    pub fn set_location(&mut self, entity: &mut Entity, update: &LocationUpdate, interpolate: bool) {
        let base = &mut self.base;
        if update.has(LocationFlags::POS) {
            let mut next = base.next;
            next.apply_update(&LocationUpdate {
                flags: update.flags & (LocationFlags::POS | LocationFlags::REL),
                ..*update
            });
            let y_offset = next.pos.y - next.pos.y.floor();
            if y_offset < ENTITY_ADJUSTMENT {
                next.pos.y += ENTITY_ADJUSTMENT;
            }
            base.next.pos = next.pos;
            if !interpolate {
                base.prev.pos = next.pos;
                entity.body.position = next.pos;
            }
        }

        let angles = LocationFlags::HEAD_X
            | LocationFlags::HEAD_Y
            | LocationFlags::ROT_X
            | LocationFlags::ROT_Z;
        let angle_update = LocationUpdate {
            flags: update.flags & angles,
            ..*update
        };
        base.next.apply_update(&angle_update);
        if !interpolate {
            base.prev.apply_update(&angle_update);
        }

        if update.has(LocationFlags::HEAD_Y) {
            if interpolate {
                let (from, to) = (base.prev.head_y, base.next.head_y);
                base.push_rot_y_steps(from, to);
                if let Some(&first) = base.rot_y_states.front() {
                    base.next.rot_y = first;
                }
            } else {
                base.prev.rot_y = base.prev.head_y;
                base.next.rot_y = base.next.head_y;
                base.rot_y_states.clear();
            }
        }

        base.lerp_angles(entity, 0.0);
    }

    pub fn advance_state(&mut self, entity: &mut Entity) {
        self.base.prev = self.base.next;
        entity.body.position = self.base.next.pos;
        self.base.advance_rot_y();
    }

    /// Places the entity at its current state with nothing pending.
    pub fn snap(&mut self, entity: &Entity) {
        self.base.reset_to(InterpState::of(entity));
    }
}

/// Interpolation for entities driven by the server: updates queue up and
/// one is consumed per tick.
#[derive(Clone, Debug, Default)]
pub struct NetInterpComp {
    pub base: InterpBase,
    /// Latest state received, which relative updates build on.
    cur: InterpState,
    states: VecDeque<InterpState>,
}

impl NetInterpComp {
    pub fn set_location(&mut self, entity: &mut Entity, update: &LocationUpdate, interpolate: bool) {
        let last = self.cur;
        self.cur.apply_update(update);

        if !interpolate {
            self.cur.rot_y = self.cur.head_y;
            self.base.reset_to(self.cur);
            self.states.clear();
            self.base.apply(entity, 0.0);
            return;
        }

        if self.states.len() == MAX_NET_STATES {
            self.states.pop_front();
        }
        self.states.push_back(self.cur);
        self.base.push_rot_y_steps(last.head_y, self.cur.head_y);
    }

    pub fn advance_state(&mut self, entity: &mut Entity) {
        self.base.prev = self.base.next;
        if let Some(mut state) = self.states.pop_front() {
            state.rot_y = self.base.next.rot_y;
            self.base.next = state;
        }
        entity.body.position = self.base.next.pos;
        self.base.advance_rot_y();
    }

    pub fn pending_states(&self) -> usize {
        self.states.len()
    }

    /// Seeds all snapshots from the entity, e.g. right after spawning.
    pub fn snap(&mut self, entity: &Entity) {
        self.cur = InterpState::of(entity);
        self.base.reset_to(self.cur);
        self.states.clear();
    }
}
