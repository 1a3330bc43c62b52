//! Core types: grid slots, availability decoding, window intersection

pub mod candidate;
pub mod decode;
pub mod grid;
pub mod intersect;
pub mod timeconv;
pub mod tracing;

pub use candidate::{CandidateParseError, CandidateSlot};
pub use decode::{FREE_SYMBOL, ParticipantAvailability, decode_free_slots};
pub use grid::{CandidateWindow, GRID_MINUTES, GridSlot, SLOTS_PER_DAY, SLOTS_PER_HOUR};
pub use intersect::{QuorumWindow, find_common_windows, find_quorum_windows, required_slot_count};
pub use timeconv::{
    TimeError, float_hour_to_datetime, time_of_day_to_float_hour, time_of_day_to_grid_index,
};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
