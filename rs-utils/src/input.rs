use std::collections::HashSet;

use bevy::prelude::Resource;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyBind {
    Forward,
    Back,
    Left,
    Right,
    Jump,
    Respawn,
    SetSpawn,
    Fly,
    NoClip,
    Speed,
    HalfSpeed,
    FlyUp,
    FlyDown,
}

/// Keys currently held, sampled once per tick.
#[derive(Debug, Default, Clone, Resource)]
pub struct InputState {
    held: HashSet<KeyBind>,
    /// Set while a menu or chat box owns the keyboard.
    pub handles_all_input: bool,
}

impl InputState {
    pub fn press(&mut self, key: KeyBind) {
        self.held.insert(key);
    }

    pub fn release(&mut self, key: KeyBind) {
        self.held.remove(&key);
    }

    pub fn release_all(&mut self) {
        self.held.clear();
    }

    pub fn is_pressed(&self, key: KeyBind) -> bool {
        self.held.contains(&key)
    }
}
