//! Candidate window wire form.
//!
//! Requesters exchange candidate windows as
//! `"<ISO-8601 start>, <ISO-8601 end>"` strings (seconds precision, no
//! timezone suffix — the scheduling request carries its named timezone
//! separately) and the request store persists them as `[start, end]` string
//! pairs. Equality is on the decoded timestamps, never the raw strings, so
//! formatting differences between writers cannot defeat the finalization
//! purge.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::grid::CandidateWindow;
use crate::timeconv::{TimeError, float_hour_to_datetime};

/// Timestamp format used on the wire and in persisted documents.
const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Error parsing a candidate from its wire form.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CandidateParseError {
    /// Not exactly two comma-separated parts.
    #[error("candidate {input:?} is not \"<start>, <end>\"")]
    Shape { input: String },

    /// A part was not a parseable timestamp.
    #[error("candidate timestamp {part:?} is not ISO-8601")]
    Timestamp { part: String },
}

/// A concrete candidate window: a start/end timestamp pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CandidateSlot {
    /// Start of the window (inclusive).
    pub start: NaiveDateTime,
    /// End of the window (exclusive).
    pub end: NaiveDateTime,
}

impl CandidateSlot {
    /// Creates a candidate slot.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Materializes an engine window against its base date.
    ///
    /// Windows extending past midnight carry hour values >= 24 and land on
    /// the following day(s).
    pub fn from_window(base: NaiveDate, window: &CandidateWindow) -> Result<Self, TimeError> {
        Ok(Self {
            start: float_hour_to_datetime(base, window.start_hour())?,
            end: float_hour_to_datetime(base, window.end_hour())?,
        })
    }

    /// Renders a human-readable confirmation label, `M/D (Www) HH:MM~HH:MM`.
    pub fn confirmation_label(&self) -> String {
        format!(
            "{}/{} ({}) {}~{}",
            self.start.format("%-m"),
            self.start.format("%-d"),
            self.start.format("%a"),
            self.start.format("%H:%M"),
            self.end.format("%H:%M"),
        )
    }
}

impl fmt::Display for CandidateSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}",
            self.start.format(WIRE_FORMAT),
            self.end.format(WIRE_FORMAT)
        )
    }
}

impl FromStr for CandidateSlot {
    type Err = CandidateParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut parts = input.split(',');
        let (Some(start), Some(end), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(CandidateParseError::Shape {
                input: input.to_string(),
            });
        };
        Ok(Self {
            start: parse_timestamp(start)?,
            end: parse_timestamp(end)?,
        })
    }
}

fn parse_timestamp(part: &str) -> Result<NaiveDateTime, CandidateParseError> {
    NaiveDateTime::parse_from_str(part.trim(), WIRE_FORMAT).map_err(|_| {
        CandidateParseError::Timestamp {
            part: part.trim().to_string(),
        }
    })
}

// Persisted as a ["start", "end"] pair, matching the document layout the
// store query filters on.
impl Serialize for CandidateSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (
            self.start.format(WIRE_FORMAT).to_string(),
            self.end.format(WIRE_FORMAT).to_string(),
        )
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CandidateSlot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (start, end) = <(String, String)>::deserialize(deserializer)?;
        Ok(Self {
            start: parse_timestamp(&start).map_err(D::Error::custom)?,
            end: parse_timestamp(&end).map_err(D::Error::custom)?,
        })
    }
}
