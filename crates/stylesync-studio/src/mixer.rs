//! Pair browser over the studio's garments
//!
//! Steps through uppers and lowers independently, wrapping at either end.
//! Indices are taken modulo the current list length on every read, so the
//! cursor stays valid when garments are added or removed.

use crate::item::{ItemKind, WardrobeItem};
use crate::outfit::Outfit;
use crate::studio::Studio;
use stylesync_core::ItemId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Mixer {
    upper_index: usize,
    lower_index: usize,
}

impl Mixer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cursor at zero-based positions in the upper and lower lists
    pub fn at(upper_index: usize, lower_index: usize) -> Self {
        Self {
            upper_index,
            lower_index,
        }
    }

    pub fn next_upper(&mut self, studio: &Studio) {
        self.upper_index = step(self.upper_index, count(studio, ItemKind::UpperGarment), true);
    }

    pub fn prev_upper(&mut self, studio: &Studio) {
        self.upper_index = step(self.upper_index, count(studio, ItemKind::UpperGarment), false);
    }

    pub fn next_lower(&mut self, studio: &Studio) {
        self.lower_index = step(self.lower_index, count(studio, ItemKind::LowerGarment), true);
    }

    pub fn prev_lower(&mut self, studio: &Studio) {
        self.lower_index = step(self.lower_index, count(studio, ItemKind::LowerGarment), false);
    }

    /// The pair under the cursor, or `None` if either list is empty
    pub fn current<'a>(&self, studio: &'a Studio) -> Option<(&'a WardrobeItem, &'a WardrobeItem)> {
        let uppers = studio.items().uppers();
        let lowers = studio.items().lowers();
        if uppers.is_empty() || lowers.is_empty() {
            return None;
        }
        Some((
            uppers[self.upper_index % uppers.len()],
            lowers[self.lower_index % lowers.len()],
        ))
    }

    /// The first outfit already recorded for the person and the current pair
    pub fn existing_outfit<'a>(&self, studio: &'a Studio, person: &ItemId) -> Option<&'a Outfit> {
        let (upper, lower) = self.current(studio)?;
        studio.outfit_for(person, &upper.id, &lower.id)
    }
}

fn count(studio: &Studio, kind: ItemKind) -> usize {
    studio.items().of_kind(kind).count()
}

fn step(index: usize, len: usize, forward: bool) -> usize {
    if len == 0 {
        return 0;
    }
    let index = index % len;
    if forward {
        (index + 1) % len
    } else {
        (index + len - 1) % len
    }
}
