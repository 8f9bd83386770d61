//! Elevator request evaluation and destination decision logic.
//!
//! This module provides helper functions for determining the next action of an elevator,
//! based on its current floor, direction and the set of floors it still has to visit.
//!
//! # Overview
//! The core functionality includes:
//! - Finding the nearest pending floor above or below the current floor.
//! - Choosing the next destination with the look-ahead rule ([`choose_destination`]).
//! - Determining whether to stop at the floor just reached ([`should_stop`]).
//!
//! # Behaviour
//! The logic is stateless and purely functional. The control loop calls it with values
//! copied out of the elevator under its lock, so two calls on the same state always
//! agree.
//!
//! # Example
//! ```
//! use std::collections::BTreeSet;
//! use elevatorsim::elevator_logic::request::choose_destination;
//! use elevatorsim::world_view::Dirn;
//!
//! let pending: BTreeSet<u8> = [3, 7, 9].into_iter().collect();
//! assert_eq!(choose_destination(5, Dirn::Up, &pending), Some(7));
//! ```

use std::collections::{BTreeSet, VecDeque};
use std::ops::Bound::{Excluded, Unbounded};

use crate::world_view::Dirn;

/// Nearest pending floor strictly above `floor`
pub fn above(floor: u8, pending: &BTreeSet<u8>) -> Option<u8> {
    pending.range((Excluded(floor), Unbounded)).next().copied()
}

/// Nearest pending floor strictly below `floor`
pub fn below(floor: u8, pending: &BTreeSet<u8>) -> Option<u8> {
    pending.range((Unbounded, Excluded(floor))).next_back().copied()
}

/// Pending floor closest to `floor` regardless of direction.
/// On a tie the lower floor wins.
fn nearest(floor: u8, pending: &BTreeSet<u8>) -> Option<u8> {
    let mut best: Option<(u8, u8)> = None;
    for &candidate in pending {
        let dist = candidate.abs_diff(floor);
        match best {
            Some((_, best_dist)) if dist >= best_dist => {}
            _ => best = Some((candidate, dist)),
        }
    }
    best.map(|(candidate, _)| candidate)
}

/// Main decision logic: the next floor to head for.
///
/// - `Dirn::Up`: the nearest pending floor above; if there is none, reverse to the
///   highest pending floor below; if neither exists the only pending floor is this one.
/// - `Dirn::Down`: symmetric.
/// - `Dirn::Idle`: the nearest pending floor in either direction.
///
/// Returns `None` when nothing is pending.
pub fn choose_destination(floor: u8, dirn: Dirn, pending: &BTreeSet<u8>) -> Option<u8> {
    if pending.is_empty() {
        return None;
    }
    match dirn {
        Dirn::Up => above(floor, pending).or_else(|| below(floor, pending)).or(Some(floor)),
        Dirn::Down => below(floor, pending).or_else(|| above(floor, pending)).or(Some(floor)),
        Dirn::Idle => nearest(floor, pending),
    }
}

/// Direction to travel from `from` to reach `to`
pub fn direction_towards(from: u8, to: u8) -> Dirn {
    if to > from {
        Dirn::Up
    } else if to < from {
        Dirn::Down
    } else {
        Dirn::Idle
    }
}

/// Next floor one step in `dirn` from `floor`, kept inside `1..=num_floors`
pub fn step_floor(floor: u8, dirn: Dirn, num_floors: u8) -> u8 {
    let next = i16::from(floor) + i16::from(dirn.step());
    next.clamp(1, i16::from(num_floors)) as u8
}

/// Determines whether the elevator should stop at the floor it just reached.
///
/// A floor is a stop when it is one of the internal targets or somebody registered
/// with this elevator is waiting there. The direction the waiting passengers want to
/// go is not considered.
pub fn should_stop(floor: u8, targets: &VecDeque<u8>, hall_floors: &BTreeSet<u8>) -> bool {
    targets.contains(&floor) || hall_floors.contains(&floor)
}

/// `true` if `floor` is inside the building
pub fn in_range(floor: u8, num_floors: u8) -> bool {
    (1..=num_floors).contains(&floor)
}
