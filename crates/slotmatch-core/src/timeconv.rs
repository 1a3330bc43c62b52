//! Wall-clock / grid conversions.
//!
//! Scheduling windows are expressed as `"HH:MM"` times of day plus a base
//! date. Internally everything runs on float hour offsets and integer grid
//! indices; candidate windows that extend past midnight keep hour values
//! >= 24 rather than switching date mid-computation, so the conversion back
//! to a datetime has to handle day rollover.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::grid::{GRID_MINUTES, SLOTS_PER_HOUR};

/// Errors from wall-clock parsing and grid alignment.
#[derive(Debug, Error, PartialEq)]
pub enum TimeError {
    /// Input was not a valid `"HH:MM"` time of day.
    #[error("invalid time of day {input:?}: expected \"HH:MM\" in [00:00, 24:00)")]
    InvalidTimeOfDay { input: String },

    /// Time of day does not land on a 30-minute grid boundary.
    #[error("time of day {input:?} is not aligned to the {GRID_MINUTES}-minute grid")]
    Misaligned { input: String },

    /// Computed datetime fell outside chrono's representable range.
    #[error("datetime out of range for base date {base} and hour {hour}")]
    OutOfRange { base: NaiveDate, hour: f64 },
}

fn split_time_of_day(input: &str) -> Result<(u32, u32), TimeError> {
    let invalid = || TimeError::InvalidTimeOfDay {
        input: input.to_string(),
    };
    let (hour_str, minute_str) = input.split_once(':').ok_or_else(invalid)?;
    let hour: u32 = hour_str.parse().map_err(|_| invalid())?;
    let minute: u32 = minute_str.parse().map_err(|_| invalid())?;
    if hour >= 24 || minute >= 60 {
        return Err(invalid());
    }
    Ok((hour, minute))
}

/// Converts a `"HH:MM"` time of day to a float hour.
///
/// `"17:30"` becomes `17.5`, `"09:15"` becomes `9.25`. Exact for valid
/// input (minutes are sixtieths, representable without accumulation).
pub fn time_of_day_to_float_hour(input: &str) -> Result<f64, TimeError> {
    let (hour, minute) = split_time_of_day(input)?;
    Ok(f64::from(hour) + f64::from(minute) / 60.0)
}

/// Converts a `"HH:MM"` time of day to a grid index from midnight.
///
/// The time must land on a 30-minute boundary; availability bitmaps are
/// anchored at the daily window start, so a misaligned start would shift
/// every decoded slot off the grid.
pub fn time_of_day_to_grid_index(input: &str) -> Result<u32, TimeError> {
    let (hour, minute) = split_time_of_day(input)?;
    if minute % GRID_MINUTES != 0 {
        return Err(TimeError::Misaligned {
            input: input.to_string(),
        });
    }
    Ok(hour * SLOTS_PER_HOUR + minute / GRID_MINUTES)
}

/// Converts a float hour offset against a base date to a datetime.
///
/// Supports `float_hour >= 24` by advancing the base date by
/// `floor(float_hour / 24)` days and using the remainder as the time of
/// day; the minute is the rounded fractional part. `float_hour_to_datetime`
/// of `("2025-01-10", 25.5)` is `2025-01-11T01:30:00`.
pub fn float_hour_to_datetime(base: NaiveDate, float_hour: f64) -> Result<NaiveDateTime, TimeError> {
    let out_of_range = || TimeError::OutOfRange {
        base,
        hour: float_hour,
    };

    let day_offset = (float_hour / 24.0).floor() as i64;
    let remainder = float_hour - (day_offset as f64) * 24.0;
    let mut hour = remainder.trunc() as u32;
    let mut minute = ((remainder - f64::from(hour)) * 60.0).round() as u32;
    // Rounding the fraction can carry into the next hour (e.g. 9.9999).
    if minute == 60 {
        hour += 1;
        minute = 0;
    }
    let mut date = base
        .checked_add_signed(Duration::days(day_offset))
        .ok_or_else(out_of_range)?;
    if hour == 24 {
        date = date.checked_add_signed(Duration::days(1)).ok_or_else(out_of_range)?;
        hour = 0;
    }
    date.and_hms_opt(hour, minute, 0).ok_or_else(out_of_range)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    mod float_hour {
        use super::*;

        #[test]
        fn whole_and_half_hours() {
            assert_eq!(time_of_day_to_float_hour("22:00"), Ok(22.0));
            assert_eq!(time_of_day_to_float_hour("17:30"), Ok(17.5));
            assert_eq!(time_of_day_to_float_hour("09:15"), Ok(9.25));
            assert_eq!(time_of_day_to_float_hour("00:00"), Ok(0.0));
        }

        #[test]
        fn rejects_malformed_input() {
            for input in ["", "9", "9:5:0", "24:00", "12:60", "ab:cd", "-1:00"] {
                assert!(
                    time_of_day_to_float_hour(input).is_err(),
                    "{input:?} should be rejected"
                );
            }
        }
    }

    mod grid_index {
        use super::*;

        #[test]
        fn aligned_times() {
            assert_eq!(time_of_day_to_grid_index("00:00"), Ok(0));
            assert_eq!(time_of_day_to_grid_index("09:00"), Ok(18));
            assert_eq!(time_of_day_to_grid_index("09:30"), Ok(19));
            assert_eq!(time_of_day_to_grid_index("23:30"), Ok(47));
        }

        #[test]
        fn rejects_misaligned_times() {
            assert_eq!(
                time_of_day_to_grid_index("09:15"),
                Err(TimeError::Misaligned {
                    input: "09:15".to_string()
                })
            );
        }
    }

    mod to_datetime {
        use super::*;

        #[test]
        fn same_day() {
            let dt = float_hour_to_datetime(date(2025, 1, 10), 9.5).unwrap();
            assert_eq!(dt, date(2025, 1, 10).and_hms_opt(9, 30, 0).unwrap());
        }

        #[test]
        fn rolls_over_past_midnight() {
            let dt = float_hour_to_datetime(date(2025, 1, 10), 25.5).unwrap();
            assert_eq!(dt, date(2025, 1, 11).and_hms_opt(1, 30, 0).unwrap());
        }

        #[test]
        fn rolls_over_multiple_days() {
            let dt = float_hour_to_datetime(date(2025, 1, 10), 49.0).unwrap();
            assert_eq!(dt, date(2025, 1, 12).and_hms_opt(1, 0, 0).unwrap());
        }

        #[test]
        fn round_trips_all_valid_times_of_day() {
            let base = date(2025, 3, 1);
            for hour in 0..24 {
                for minute in 0..60 {
                    let input = format!("{hour:02}:{minute:02}");
                    let float_hour = time_of_day_to_float_hour(&input).unwrap();
                    let dt = float_hour_to_datetime(base, float_hour).unwrap();
                    assert_eq!(dt.format("%H:%M").to_string(), input);
                    assert_eq!(dt.date(), base);
                }
            }
        }
    }
}
