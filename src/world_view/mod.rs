//! # World view
//!
//! The read-only picture of one elevator that the rest of the system works with.
//!
//! An [`ElevatorState`] is always a copy taken under the owning elevator's lock
//! (see [crate::elevator_logic::Elevator::snapshot]). Nobody outside the elevator
//! ever holds a reference to the live record, so a reader can never observe the
//! target list half-way through a change.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};


#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Direction an elevator is taking calls in. `Up`/`Down` double as a floor step.
pub enum Dirn {
    Down = -1,
    Idle = 0,
    Up = 1,
}

impl Dirn {
    /// Floor step of the direction: +1, -1 or 0
    pub fn step(self) -> i8 {
        self as i8
    }
}

impl fmt::Display for Dirn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Dirn::Up => "up",
            Dirn::Down => "down",
            Dirn::Idle => "-",
        };
        f.write_str(text)
    }
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// The current behaviour of an elevator.
///
/// `Idle -> Moving` when a destination is chosen, `Moving -> DoorOpen` on arrival at a
/// stop, `DoorOpen -> Idle` when the doors closed with nothing left to do, or
/// `DoorOpen -> Moving` when the next destination is already known.
pub enum ElevatorBehaviour {
    Idle,
    Moving,
    DoorOpen,
}

impl fmt::Display for ElevatorBehaviour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ElevatorBehaviour::Idle => "idle",
            ElevatorBehaviour::Moving => "moving",
            ElevatorBehaviour::DoorOpen => "door open",
        };
        f.write_str(text)
    }
}


/// Snapshot of one elevator.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ElevatorState {
    /// The floor the car is at (or last passed)
    pub current_floor: u8,

    /// [Dirn]
    pub direction: Dirn,

    /// [ElevatorBehaviour]
    pub status: ElevatorBehaviour,

    /// Internal target floors in the order they were added.
    /// The order is not the visit order, that is computed on every decision.
    pub targets: VecDeque<u8>,

    /// Passengers aboard when the snapshot was taken
    pub passengers: usize,
}

impl ElevatorState {
    /// A parked elevator with nothing to do
    pub fn idle_at(floor: u8) -> Self {
        Self {
            current_floor: floor,
            direction: Dirn::Idle,
            status: ElevatorBehaviour::Idle,
            targets: VecDeque::new(),
            passengers: 0,
        }
    }

    /// `true` if `floor` is one of the internal targets
    pub fn has_target(&self, floor: u8) -> bool {
        self.targets.contains(&floor)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dirn_steps() {
        assert_eq!(Dirn::Up.step(), 1);
        assert_eq!(Dirn::Down.step(), -1);
        assert_eq!(Dirn::Idle.step(), 0);
    }

    #[test]
    fn idle_state_has_no_work() {
        let state = ElevatorState::idle_at(3);
        assert_eq!(state.status, ElevatorBehaviour::Idle);
        assert_eq!(state.direction, Dirn::Idle);
        assert!(state.targets.is_empty());
        assert!(!state.has_target(3));
    }
}
