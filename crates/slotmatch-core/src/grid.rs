//! Grid slot primitives.
//!
//! This module provides [`GridSlot`], the system's atomic unit of
//! availability (a half-open 30-minute interval identified by an integer
//! grid index), and [`CandidateWindow`], a contiguous run of grid slots
//! long enough to cover a requested meeting duration.
//!
//! Slot identity, ordering, and hashing are on the integer index. Indices
//! are counted in 30-minute steps from midnight of the scheduling window's
//! base date and may exceed one day's 48 slots: an index of 51 is hour
//! 25.5, i.e. 01:30 on the following day.

use serde::{Deserialize, Serialize};

/// Granularity of the availability grid, in minutes.
pub const GRID_MINUTES: u32 = 30;

/// Number of grid slots per hour.
pub const SLOTS_PER_HOUR: u32 = 60 / GRID_MINUTES;

/// Number of grid slots in one day.
pub const SLOTS_PER_DAY: u32 = 24 * SLOTS_PER_HOUR;

/// A half-open 30-minute interval `[start, start + 30min)` on the grid.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct GridSlot(u32);

impl GridSlot {
    /// Creates a grid slot from its index.
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the grid index.
    pub fn index(&self) -> u32 {
        self.0
    }

    /// Start of the slot as a float hour offset from the base date's
    /// midnight. May be >= 24 for slots rolling into following days.
    pub fn start_hour(&self) -> f64 {
        f64::from(self.0) / f64::from(SLOTS_PER_HOUR)
    }

    /// End of the slot as a float hour offset (exclusive).
    pub fn end_hour(&self) -> f64 {
        self.next().start_hour()
    }

    /// The slot immediately after this one.
    pub fn next(&self) -> GridSlot {
        GridSlot(self.0 + 1)
    }

    /// The slot `offset` steps after this one.
    pub fn offset(&self, offset: u32) -> GridSlot {
        GridSlot(self.0 + offset)
    }

    /// Returns `true` if `self` starts exactly where `prev` ends.
    pub fn follows(&self, prev: &GridSlot) -> bool {
        self.0 == prev.0 + 1
    }
}

/// A contiguous run of grid slots covering a requested duration.
///
/// Compared and deduplicated by `(start, end)`. Immutable once emitted by
/// the intersection engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateWindow {
    start: GridSlot,
    slot_count: u32,
}

impl CandidateWindow {
    /// Creates a window of `slot_count` slots starting at `start`.
    ///
    /// # Panics
    ///
    /// Panics if `slot_count` is zero.
    pub fn new(start: GridSlot, slot_count: u32) -> Self {
        assert!(slot_count > 0, "CandidateWindow must span at least one slot");
        Self { start, slot_count }
    }

    /// First slot of the window.
    pub fn start(&self) -> GridSlot {
        self.start
    }

    /// First slot past the end of the window (exclusive bound).
    pub fn end(&self) -> GridSlot {
        self.start.offset(self.slot_count)
    }

    /// Number of slots spanned.
    pub fn slot_count(&self) -> u32 {
        self.slot_count
    }

    /// Window length in minutes.
    pub fn duration_minutes(&self) -> u32 {
        self.slot_count * GRID_MINUTES
    }

    /// Start as a float hour offset from the base date's midnight.
    pub fn start_hour(&self) -> f64 {
        self.start.start_hour()
    }

    /// End as a float hour offset (exclusive).
    pub fn end_hour(&self) -> f64 {
        self.end().start_hour()
    }

    /// Iterates over every slot the window covers.
    pub fn slots(&self) -> impl Iterator<Item = GridSlot> + '_ {
        (0..self.slot_count).map(|k| self.start.offset(k))
    }
}

impl PartialOrd for CandidateWindow {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CandidateWindow {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.start, self.end()).cmp(&(other.start, other.end()))
    }
}
