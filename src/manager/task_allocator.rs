//! # Task allocator
//!
//! Scores every elevator against a hall request and picks the cheapest one.
//! The functions here are pure: they work on snapshots and never touch a live elevator.
//!
//! ## Cost heuristic
//! Lower is better.
//! - Base cost is the distance in floors.
//! - Every pending target adds `1.5`.
//! - A full car adds `100`.
//! - An elevator on its way in the requested direction with the floor still ahead costs
//!   half. One travelling the other way, or past the floor, pays `40` extra. Idle
//!   elevators are judged on distance alone.
//! - Requests at the ground floor get a `0.8` discount.

use anyhow::bail;

use crate::config;
use crate::world_view::{Dirn, ElevatorBehaviour, ElevatorState};

/// Added per pending target floor
pub const TARGET_PENALTY: f64 = 1.5;

/// Added when the car has no free place
pub const FULL_PENALTY: f64 = 100.0;

/// Added when the elevator moves away from the request
pub const WRONG_DIRECTION_PENALTY: f64 = 40.0;

/// Multiplier for an elevator already heading the right way with the floor ahead
pub const ON_THE_WAY_FACTOR: f64 = 0.5;

/// Multiplier for requests at [config::GROUND_FLOOR]
pub const GROUND_FLOOR_FACTOR: f64 = 0.8;

#[derive(Debug, Clone, PartialEq)]
/// One elevator as the allocator sees it at decision time
pub struct ElevatorView {
    /// The elevators ID
    pub id: u8,
    /// Max passengers aboard
    pub capacity: usize,
    /// Snapshot taken under the elevator's lock
    pub state: ElevatorState,
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// The cost of sending one elevator to one request
pub struct ElevatorScore {
    /// The elevators ID
    pub elevator_id: u8,
    /// Cost, lower is better
    pub score: f64,
}

/// **Computes the cost of sending an elevator to a hall request**
///
/// ## Parameters
/// `state`: Snapshot of the elevator
/// `capacity`: The elevators capacity
/// `floor`: The floor of the hall request
/// `dirn`: The direction the passenger wants to go
///
/// ## Returns
/// The cost as an `f64`, lower is better. Same input, same output.
pub fn compute_score(state: &ElevatorState, capacity: usize, floor: u8, dirn: Dirn) -> f64 {
    let cur = state.current_floor;
    let mut score = cur.abs_diff(floor) as f64;

    score += TARGET_PENALTY * state.targets.len() as f64;
    if state.passengers >= capacity {
        score += FULL_PENALTY;
    }

    // Idle elevators are judged on distance alone
    if state.status != ElevatorBehaviour::Idle {
        match state.direction {
            Dirn::Up => {
                if dirn == Dirn::Up && floor >= cur {
                    score *= ON_THE_WAY_FACTOR;
                } else {
                    score += WRONG_DIRECTION_PENALTY;
                }
            }
            Dirn::Down => {
                if dirn == Dirn::Down && floor <= cur {
                    score *= ON_THE_WAY_FACTOR;
                } else {
                    score += WRONG_DIRECTION_PENALTY;
                }
            }
            Dirn::Idle => {}
        }
    }

    if floor == config::GROUND_FLOOR {
        score *= GROUND_FLOOR_FACTOR;
    }
    score
}

/// **Scores every elevator in the fleet**
///
/// ## Returns
/// One [ElevatorScore] per elevator, cheapest first. The sort is stable, so elevators
/// with equal cost keep their fleet order.
pub fn rank_fleet(fleet: &[ElevatorView], floor: u8, dirn: Dirn) -> Vec<ElevatorScore> {
    let mut scores: Vec<ElevatorScore> = fleet
        .iter()
        .map(|elev| ElevatorScore {
            elevator_id: elev.id,
            score: compute_score(&elev.state, elev.capacity, floor, dirn),
        })
        .collect();
    scores.sort_by(|a, b| a.score.total_cmp(&b.score));
    scores
}

/// **Picks the elevator to serve a hall request**
///
/// ## Returns
/// The cheapest [ElevatorScore], the earliest in fleet order on a tie.
/// An error if the fleet is empty.
pub fn choose_elevator(fleet: &[ElevatorView], floor: u8, dirn: Dirn) -> anyhow::Result<ElevatorScore> {
    match rank_fleet(fleet, floor, dirn).first() {
        Some(best) => Ok(*best),
        None => bail!("no elevator to assign the request at floor {} to", floor),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    fn state(floor: u8, dirn: Dirn, status: ElevatorBehaviour, targets: &[u8], passengers: usize) -> ElevatorState {
        ElevatorState {
            current_floor: floor,
            direction: dirn,
            status,
            targets: targets.iter().copied().collect::<VecDeque<_>>(),
            passengers,
        }
    }

    fn view(id: u8, state: ElevatorState) -> ElevatorView {
        ElevatorView { id, capacity: 8, state }
    }

    #[test]
    fn idle_elevator_costs_its_distance() {
        let idle = ElevatorState::idle_at(3);
        assert_eq!(compute_score(&idle, 8, 9, Dirn::Down), 6.0);
        assert_eq!(compute_score(&idle, 8, 3, Dirn::Up), 0.0);
    }

    #[test]
    fn targets_and_full_car_are_penalised() {
        let busy = state(3, Dirn::Idle, ElevatorBehaviour::Idle, &[7, 8], 0);
        assert_eq!(compute_score(&busy, 8, 5, Dirn::Up), 2.0 + 3.0);
        let full = state(3, Dirn::Idle, ElevatorBehaviour::Idle, &[], 8);
        assert_eq!(compute_score(&full, 8, 5, Dirn::Up), 2.0 + 100.0);
    }

    #[test]
    fn on_the_way_is_halved_otherwise_penalised() {
        let moving_up = state(4, Dirn::Up, ElevatorBehaviour::Moving, &[10], 0);
        // (2 + 1.5) * 0.5
        assert_eq!(compute_score(&moving_up, 8, 6, Dirn::Up), 1.75);
        // wrong direction
        assert_eq!(compute_score(&moving_up, 8, 6, Dirn::Down), 3.5 + 40.0);
        // already passed
        assert_eq!(compute_score(&moving_up, 8, 2, Dirn::Up), 3.5 + 40.0);

        let moving_down = state(8, Dirn::Down, ElevatorBehaviour::Moving, &[], 0);
        assert_eq!(compute_score(&moving_down, 8, 4, Dirn::Down), 2.0);
        assert_eq!(compute_score(&moving_down, 8, 9, Dirn::Down), 41.0);
    }

    #[test]
    fn ground_floor_discount_applies_last() {
        let moving_down = state(5, Dirn::Down, ElevatorBehaviour::Moving, &[], 0);
        // 4 * 0.5 * 0.8
        assert_eq!(compute_score(&moving_down, 8, 1, Dirn::Down), 1.6);
        let idle = ElevatorState::idle_at(6);
        assert_eq!(compute_score(&idle, 8, 1, Dirn::Up), 4.0);
    }

    #[test]
    fn doors_open_uses_travel_direction() {
        let serving = state(4, Dirn::Up, ElevatorBehaviour::DoorOpen, &[], 0);
        assert_eq!(compute_score(&serving, 8, 6, Dirn::Up), 1.0);
        let parked = state(4, Dirn::Idle, ElevatorBehaviour::DoorOpen, &[], 0);
        assert_eq!(compute_score(&parked, 8, 6, Dirn::Down), 2.0);
    }

    #[test]
    fn full_car_loses_to_farther_empty_one() {
        let fleet = vec![
            view(1, state(4, Dirn::Up, ElevatorBehaviour::Moving, &[], 8)),
            view(2, ElevatorState::idle_at(12)),
        ];
        let best = choose_elevator(&fleet, 6, Dirn::Up).unwrap();
        assert_eq!(best.elevator_id, 2);
        let ranked = rank_fleet(&fleet, 6, Dirn::Up);
        assert_eq!(ranked[1], ElevatorScore { elevator_id: 1, score: 51.0 });
    }

    #[test]
    fn ties_keep_fleet_order() {
        let fleet = vec![
            view(3, ElevatorState::idle_at(2)),
            view(1, ElevatorState::idle_at(6)),
            view(2, ElevatorState::idle_at(2)),
        ];
        let ranked: Vec<u8> = rank_fleet(&fleet, 4, Dirn::Up).iter().map(|s| s.elevator_id).collect();
        assert_eq!(ranked, [3, 1, 2]);
    }

    #[test]
    fn scoring_is_repeatable() {
        let fleet = vec![
            view(1, state(7, Dirn::Down, ElevatorBehaviour::Moving, &[2, 3], 5)),
            view(2, state(2, Dirn::Up, ElevatorBehaviour::Moving, &[9], 1)),
        ];
        let first = rank_fleet(&fleet, 5, Dirn::Down);
        for _ in 0..5 {
            assert_eq!(rank_fleet(&fleet, 5, Dirn::Down), first);
        }
    }

    #[test]
    fn empty_fleet_is_an_error() {
        assert!(choose_elevator(&[], 3, Dirn::Up).is_err());
    }
}
