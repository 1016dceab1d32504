use std::collections::VecDeque;

use bevy::prelude::Resource;

const CHAT_HISTORY: usize = 100;

/// Client-side chat log. Lines keep their `&x` colour codes.
#[derive(Debug, Default, Resource)]
pub struct Chat {
    lines: VecDeque<String>,
    added: usize,
}

impl Chat {
    pub fn add(&mut self, line: impl Into<String>) {
        if self.lines.len() == CHAT_HISTORY {
            self.lines.pop_front();
        }
        self.lines.push_back(line.into());
        self.added += 1;
    }

    /// Lines added since creation, including ones already dropped from
    /// the history.
    pub fn total_added(&self) -> usize {
        self.added
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.lines.back().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityEvent {
    Added(u8),
    Removed(u8),
}

#[derive(Debug, Default, Resource)]
pub struct EntityEventQueue {
    events: VecDeque<EntityEvent>,
}

impl EntityEventQueue {
    pub fn push(&mut self, event: EntityEvent) {
        self.events.push_back(event);
    }

    pub fn drain(&mut self) -> std::collections::vec_deque::Drain<'_, EntityEvent> {
        self.events.drain(..)
    }
}
