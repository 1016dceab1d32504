use bevy::prelude::Resource;
use rs_utils::strip_color_codes;

use crate::registry::{EntityId, MAX_ENTITIES};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TabEntry {
    /// Plain player name with colour codes removed.
    pub player: String,
    /// Name as shown in the list, colour codes kept.
    pub list: String,
    pub group: String,
    pub rank: u8,
}

/// Player list entries by entity id, independent of spawned entities.
#[derive(Debug, Resource)]
pub struct TabList {
    entries: Vec<Option<TabEntry>>,
}

impl Default for TabList {
    fn default() -> Self {
        Self {
            entries: vec![None; MAX_ENTITIES],
        }
    }
}

impl TabList {
    pub fn set(&mut self, id: EntityId, player: &str, list: &str, group: &str, rank: u8) {
        self.entries[id.index()] = Some(TabEntry {
            player: strip_color_codes(player),
            list: list.to_owned(),
            group: group.to_owned(),
            rank,
        });
    }

    /// Returns whether an entry was present.
    pub fn remove(&mut self, id: EntityId) -> bool {
        self.entries[id.index()].take().is_some()
    }

    pub fn get(&self, id: EntityId) -> Option<&TabEntry> {
        self.entries[id.index()].as_ref()
    }

    pub fn reset(&mut self) {
        self.entries.iter_mut().for_each(|entry| *entry = None);
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &TabEntry)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(idx, entry)| entry.as_ref().map(|e| (EntityId::new(idx), e)))
    }
}
