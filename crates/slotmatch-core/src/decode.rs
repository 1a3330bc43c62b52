//! Availability bitmap decoding.
//!
//! The calendar service answers a free/busy query with one fixed-alphabet
//! string per participant: one character per 30-minute grid slot, anchored
//! at the requested window start. `'0'` is free; `'1'` (tentative), `'2'`
//! (busy), `'3'` (out of office) and `'4'` (working elsewhere) are all
//! treated as not free.

use std::collections::BTreeSet;

use crate::grid::GridSlot;

/// Bitmap symbol denoting a free slot.
pub const FREE_SYMBOL: char = '0';

/// One participant's free slots within the queried window.
///
/// Produced fresh on every availability query; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantAvailability {
    /// Participant identifier (email address).
    pub participant: String,
    /// Slots where the participant is free, ordered by grid index.
    pub free: BTreeSet<GridSlot>,
}

impl ParticipantAvailability {
    /// Decodes a participant's availability bitmap.
    ///
    /// `anchor` is the grid slot of the bitmap's first character. An empty
    /// or all-busy bitmap yields an empty free-slot set, not an error; the
    /// bitmap's length is trusted.
    pub fn decode(participant: impl Into<String>, bitmap: &str, anchor: GridSlot) -> Self {
        Self {
            participant: participant.into(),
            free: decode_free_slots(bitmap, anchor),
        }
    }

    /// Returns `true` if the participant is free for every slot given.
    pub fn is_free_for(&self, mut slots: impl Iterator<Item = GridSlot>) -> bool {
        slots.all(|slot| self.free.contains(&slot))
    }
}

/// Decodes a bitmap into the set of free grid slots.
pub fn decode_free_slots(bitmap: &str, anchor: GridSlot) -> BTreeSet<GridSlot> {
    bitmap
        .chars()
        .enumerate()
        .filter(|(_, symbol)| *symbol == FREE_SYMBOL)
        .map(|(i, _)| anchor.offset(i as u32))
        .collect()
}
