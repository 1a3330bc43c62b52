//! Window intersection engine.
//!
//! Given participants' free grid slots, finds every candidate window of
//! the requested duration that all of them (or at least a required quorum
//! of them) can attend. Pure and synchronous; safe to call from any number
//! of concurrent requests.
//!
//! Contiguity is exact index succession: the maximal contiguous runs of a
//! sorted slot set are its maximal consecutive index ranges, discovered by
//! a single grouping pass. Within each run a window of the required slot
//! count slides across every offset, and the resulting windows are
//! deduplicated and sorted by `(start, end)`.

use std::collections::BTreeSet;

use crate::decode::ParticipantAvailability;
use crate::grid::{CandidateWindow, GRID_MINUTES, GridSlot};

/// A candidate window that meets a quorum threshold, with the participants
/// free across the whole window attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuorumWindow {
    /// The bookable window.
    pub window: CandidateWindow,
    /// Participants free for every slot of the window, sorted.
    pub participants: Vec<String>,
}

/// Number of grid slots needed to cover `duration_minutes`.
///
/// Ceiling division: a 45-minute meeting reserves two slots. Applied to
/// both the unanimous and quorum paths.
pub fn required_slot_count(duration_minutes: u32) -> u32 {
    duration_minutes.div_ceil(GRID_MINUTES)
}

/// Finds every window of `duration_minutes` free to all participants.
///
/// Returns an empty list (never an error) when there are no participants,
/// the duration needs zero slots, or no common run is long enough.
pub fn find_common_windows(
    free_sets: &[BTreeSet<GridSlot>],
    duration_minutes: u32,
) -> Vec<CandidateWindow> {
    let required_slots = required_slot_count(duration_minutes);
    if free_sets.is_empty() || required_slots == 0 {
        return Vec::new();
    }

    let mut common: BTreeSet<GridSlot> = free_sets[0].clone();
    for other in &free_sets[1..] {
        common.retain(|slot| other.contains(slot));
        if common.is_empty() {
            return Vec::new();
        }
    }

    let windows: BTreeSet<CandidateWindow> = contiguous_runs(&common)
        .into_iter()
        .flat_map(|run| slide(run, required_slots))
        .collect();
    windows.into_iter().collect()
}

/// Finds every window of `duration_minutes` free to at least
/// `required_count` participants, attaching who can attend.
///
/// A slot qualifies when enough participants are free for it; a window
/// qualifies when the participants free across *every* slot it spans still
/// meet the threshold (a window can straddle slots freed by different
/// subsets, so the per-slot count alone is not sufficient).
pub fn find_quorum_windows(
    availability: &[ParticipantAvailability],
    duration_minutes: u32,
    required_count: usize,
) -> Vec<QuorumWindow> {
    let required_slots = required_slot_count(duration_minutes);
    if availability.is_empty()
        || required_slots == 0
        || required_count == 0
        || required_count > availability.len()
    {
        return Vec::new();
    }

    let eligible: BTreeSet<GridSlot> = availability
        .iter()
        .flat_map(|p| p.free.iter().copied())
        .filter(|slot| {
            availability
                .iter()
                .filter(|p| p.free.contains(slot))
                .count()
                >= required_count
        })
        .collect();

    let mut results: Vec<QuorumWindow> = contiguous_runs(&eligible)
        .into_iter()
        .flat_map(|run| slide(run, required_slots))
        .filter_map(|window| {
            let mut participants: Vec<String> = availability
                .iter()
                .filter(|p| p.is_free_for(window.slots()))
                .map(|p| p.participant.clone())
                .collect();
            if participants.len() < required_count {
                return None;
            }
            participants.sort();
            Some(QuorumWindow {
                window,
                participants,
            })
        })
        .collect();

    results.sort_by_key(|q| q.window);
    results.dedup_by_key(|q| q.window);
    results
}

/// Groups a sorted slot set into its maximal consecutive runs.
fn contiguous_runs(slots: &BTreeSet<GridSlot>) -> Vec<Vec<GridSlot>> {
    let mut runs: Vec<Vec<GridSlot>> = Vec::new();
    for slot in slots {
        match runs.last_mut() {
            Some(run) if slot.follows(run.last().expect("runs are never empty")) => {
                run.push(*slot);
            }
            _ => runs.push(vec![*slot]),
        }
    }
    runs
}

/// Slides a `required_slots`-wide window across a contiguous run.
fn slide(run: Vec<GridSlot>, required_slots: u32) -> Vec<CandidateWindow> {
    let required = required_slots as usize;
    if run.len() < required {
        return Vec::new();
    }
    (0..=run.len() - required)
        .map(|i| CandidateWindow::new(run[i], required_slots))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slots(indices: &[u32]) -> BTreeSet<GridSlot> {
        indices.iter().copied().map(GridSlot::new).collect()
    }

    fn availability(participant: &str, indices: &[u32]) -> ParticipantAvailability {
        ParticipantAvailability {
            participant: participant.to_string(),
            free: slots(indices),
        }
    }

    fn hours(windows: &[CandidateWindow]) -> Vec<(f64, f64)> {
        windows.iter().map(|w| (w.start_hour(), w.end_hour())).collect()
    }

    mod common {
        use super::*;

        #[test]
        fn no_participants_yields_empty() {
            assert!(find_common_windows(&[], 60).is_empty());
        }

        #[test]
        fn zero_duration_yields_empty() {
            assert!(find_common_windows(&[slots(&[18, 19])], 0).is_empty());
        }

        #[test]
        fn disjoint_availability_yields_empty() {
            let free = [slots(&[18, 19]), slots(&[22, 23])];
            assert!(find_common_windows(&free, 30).is_empty());
        }

        #[test]
        fn hour_long_window_slides_across_the_run() {
            // Both free 9:00-10:30; a 60-minute window fits at 9:00 and 9:30.
            let free = [slots(&[18, 19, 20]), slots(&[18, 19, 20])];
            let windows = find_common_windows(&free, 60);
            assert_eq!(hours(&windows), vec![(9.0, 10.0), (9.5, 10.5)]);
        }

        #[test]
        fn gap_in_one_participant_breaks_the_run() {
            // B misses 9:30-10:00, so no contiguous 60 minutes remain.
            let free = [slots(&[18, 19, 20]), slots(&[18, 20])];
            assert!(find_common_windows(&free, 60).is_empty());
        }

        #[test]
        fn forty_five_minutes_reserves_two_slots() {
            let free = [slots(&[18, 19])];
            let windows = find_common_windows(&free, 45);
            assert_eq!(hours(&windows), vec![(9.0, 10.0)]);
        }

        #[test]
        fn multiple_runs_stay_sorted() {
            let free = [slots(&[18, 19, 30, 31, 32])];
            let windows = find_common_windows(&free, 60);
            assert_eq!(hours(&windows), vec![(9.0, 10.0), (15.0, 16.0), (15.5, 16.5)]);
        }

        #[test]
        fn engine_is_idempotent() {
            let free = [slots(&[18, 19, 20, 22, 23]), slots(&[18, 19, 20, 22, 23])];
            let first = find_common_windows(&free, 60);
            let second = find_common_windows(&free, 60);
            assert_eq!(first, second);
        }

        #[test]
        fn windows_past_midnight_roll_over() {
            // 23:30-01:00 expressed as hours 23.5..25.0.
            let free = [slots(&[47, 48, 49])];
            let windows = find_common_windows(&free, 60);
            assert_eq!(hours(&windows), vec![(23.5, 24.5), (24.0, 25.0)]);
        }
    }

    mod quorum {
        use super::*;

        #[test]
        fn two_of_three_share_a_slot() {
            let participants = [
                availability("a@example.com", &[18]),
                availability("b@example.com", &[18]),
                availability("c@example.com", &[30]),
            ];
            let results = find_quorum_windows(&participants, 30, 2);
            assert_eq!(results.len(), 1);
            assert_eq!(results[0].window.start_hour(), 9.0);
            assert_eq!(
                results[0].participants,
                vec!["a@example.com".to_string(), "b@example.com".to_string()]
            );

            // Raising the threshold to unanimity rejects the slot.
            assert!(find_quorum_windows(&participants, 30, 3).is_empty());
        }

        #[test]
        fn window_straddling_different_subsets_is_rejected() {
            // Slot 18 is free to a+b, slot 19 to b+c: each slot meets the
            // threshold but no two participants span both.
            let participants = [
                availability("a@example.com", &[18]),
                availability("b@example.com", &[18, 19]),
                availability("c@example.com", &[19]),
            ];
            assert!(find_quorum_windows(&participants, 60, 2).is_empty());
        }

        #[test]
        fn attaches_everyone_free_not_just_the_quorum() {
            let participants = [
                availability("a@example.com", &[18, 19]),
                availability("b@example.com", &[18, 19]),
                availability("c@example.com", &[18, 19]),
            ];
            let results = find_quorum_windows(&participants, 60, 2);
            assert_eq!(results.len(), 1);
            assert_eq!(results[0].participants.len(), 3);
        }

        #[test]
        fn threshold_edge_cases_yield_empty() {
            let participants = [availability("a@example.com", &[18, 19])];
            assert!(find_quorum_windows(&participants, 30, 0).is_empty());
            assert!(find_quorum_windows(&participants, 30, 2).is_empty());
            assert!(find_quorum_windows(&[], 30, 1).is_empty());
        }
    }
}
