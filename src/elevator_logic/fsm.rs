//! Elevator state machine transitions.
//!
//! [`ElevatorRecord`] is the mutable record of one elevator. It only ever lives behind
//! the elevator's lock. The functions here are the transitions the control loop
//! applies to it while holding that lock. None of them sleep, so the lock is never
//! held across a simulated delay.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::Arc;

use crate::elevator_logic::request;
use crate::requests::HallRequest;
use crate::signal::Signal;
use crate::world_view::{Dirn, ElevatorBehaviour, ElevatorState};

/// Everything about one elevator that changes while it runs
#[derive(Debug)]
pub struct ElevatorRecord {
    /// Floor the car is at
    pub current_floor: u8,
    /// Direction it is taking calls in
    pub direction: Dirn,
    /// What it is doing
    pub status: ElevatorBehaviour,
    /// Internal targets, insertion order
    pub targets: VecDeque<u8>,
    /// Passenger ids aboard
    pub boarded: HashSet<String>,
    /// Hall requests waiting for this elevator, per floor, in registration order
    pub hall_requests: BTreeMap<u8, VecDeque<Arc<HallRequest>>>,
    /// Armed arrival signal per floor. Fired and removed when the doors open there.
    pub arrivals: HashMap<u8, Signal<()>>,
    /// Max passengers aboard
    pub capacity: usize,
}

impl ElevatorRecord {
    /// A parked elevator at `floor` with room for `capacity` passengers
    pub fn new(floor: u8, capacity: usize) -> Self {
        Self {
            current_floor: floor,
            direction: Dirn::Idle,
            status: ElevatorBehaviour::Idle,
            targets: VecDeque::new(),
            boarded: HashSet::new(),
            hall_requests: BTreeMap::new(),
            arrivals: HashMap::new(),
            capacity,
        }
    }

    /// Immutable copy for readers outside the elevator
    pub fn snapshot(&self) -> ElevatorState {
        ElevatorState {
            current_floor: self.current_floor,
            direction: self.direction,
            status: self.status,
            targets: self.targets.clone(),
            passengers: self.boarded.len(),
        }
    }

    /// Floors with somebody registered and waiting
    pub fn hall_floors(&self) -> BTreeSet<u8> {
        self.hall_requests
            .iter()
            .filter(|(_, waiting)| !waiting.is_empty())
            .map(|(floor, _)| *floor)
            .collect()
    }

    /// Internal targets and waiting-passenger floors together
    pub fn pending_floors(&self) -> BTreeSet<u8> {
        let mut pending = self.hall_floors();
        pending.extend(self.targets.iter().copied());
        pending
    }

    /// `true` if nobody else fits
    pub fn is_full(&self) -> bool {
        self.boarded.len() >= self.capacity
    }

    /// Hall floors worth stopping at: none while the car is full
    fn boardable_floors(&self) -> BTreeSet<u8> {
        if self.is_full() {
            BTreeSet::new()
        } else {
            self.hall_floors()
        }
    }

    /// Floors the car has a reason to travel to right now.
    ///
    /// Same as [Self::pending_floors] except that a full car ignores waiting passengers
    /// until somebody gets off.
    pub fn destination_floors(&self) -> BTreeSet<u8> {
        let mut floors = self.boardable_floors();
        floors.extend(self.targets.iter().copied());
        floors
    }

    /// The next floor to head for, see [request::choose_destination]
    pub fn next_destination(&self) -> Option<u8> {
        request::choose_destination(self.current_floor, self.direction, &self.destination_floors())
    }

    /// `true` if the current floor is a stop
    pub fn must_stop_here(&self) -> bool {
        request::should_stop(self.current_floor, &self.targets, &self.boardable_floors())
    }

    /// The armed arrival signal of `floor`, created on first use
    pub fn arrival_signal(&mut self, floor: u8) -> Signal<()> {
        self.arrivals.entry(floor).or_default().clone()
    }
}

/// What happened while the doors were open
#[derive(Debug, Default)]
pub struct Boarding {
    /// Requests whose passengers got in, in registration order
    pub admitted: Vec<Arc<HallRequest>>,
    /// Passengers left waiting because the car was full
    pub left_waiting: usize,
    /// The floor was one of the internal targets
    pub was_target: bool,
    /// Somebody was waiting on the arrival signal of this floor
    pub arrival_released: bool,
}

/// Splits `waiting` into the ones that fit in `free` places and the rest.
/// Both keep registration order.
pub fn admit_passengers(
    mut waiting: VecDeque<Arc<HallRequest>>,
    free: usize,
) -> (Vec<Arc<HallRequest>>, VecDeque<Arc<HallRequest>>) {
    let take = free.min(waiting.len());
    let admitted = waiting.drain(..take).collect();
    (admitted, waiting)
}

/// The car heads for `dest`: direction set towards it
pub fn on_destination_chosen(record: &mut ElevatorRecord, dest: u8) {
    record.direction = request::direction_towards(record.current_floor, dest);
}

/// Nothing to do: parked
pub fn on_idle(record: &mut ElevatorRecord) {
    record.direction = Dirn::Idle;
    record.status = ElevatorBehaviour::Idle;
}

/// Leaving the current floor
pub fn on_departure(record: &mut ElevatorRecord) {
    record.status = ElevatorBehaviour::Moving;
}

/// One floor travelled. Returns the new floor and whether it is a stop.
pub fn on_floor_arrival(record: &mut ElevatorRecord, num_floors: u8) -> (u8, bool) {
    record.current_floor = request::step_floor(record.current_floor, record.direction, num_floors);
    (record.current_floor, record.must_stop_here())
}

/// Stopped: doors open
pub fn on_doors_open(record: &mut ElevatorRecord) {
    record.status = ElevatorBehaviour::DoorOpen;
}

/// Doors have been open for the hold time.
///
/// Lets waiting passengers in up to the free capacity, puts the rest back, clears the
/// floor from the targets and fires (then drops) the floor's arrival signal.
pub fn on_boarding(record: &mut ElevatorRecord) -> Boarding {
    let floor = record.current_floor;

    let waiting = record.hall_requests.remove(&floor).unwrap_or_default();
    let free = record.capacity.saturating_sub(record.boarded.len());
    let (admitted, rest) = admit_passengers(waiting, free);
    let left_waiting = rest.len();
    if !rest.is_empty() {
        record.hall_requests.insert(floor, rest);
    }
    for req in &admitted {
        record.boarded.insert(req.passenger_id.clone());
        req.picked_up.fire(());
    }

    let before = record.targets.len();
    record.targets.retain(|&target| target != floor);
    let was_target = record.targets.len() != before;

    let arrival_released = match record.arrivals.remove(&floor) {
        Some(signal) => signal.fire(()),
        None => false,
    };

    Boarding { admitted, left_waiting, was_target, arrival_released }
}

/// Doors closed. Moving on if there is somewhere else to go, otherwise idle.
pub fn on_doors_closed(record: &mut ElevatorRecord) -> Option<u8> {
    match record.next_destination() {
        Some(next) if next != record.current_floor => {
            record.status = ElevatorBehaviour::Moving;
            Some(next)
        }
        _ => {
            record.status = ElevatorBehaviour::Idle;
            None
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn hall(floor: u8, pid: &str) -> Arc<HallRequest> {
        Arc::new(HallRequest::new(floor, Dirn::Up, pid, 1))
    }

    #[test]
    fn admits_in_registration_order_up_to_free_places() {
        let waiting: VecDeque<_> = ["a", "b", "c"].iter().map(|p| hall(3, p)).collect();
        let (admitted, rest) = admit_passengers(waiting, 2);
        let ids: Vec<_> = admitted.iter().map(|r| r.passenger_id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].passenger_id, "c");
    }

    #[test]
    fn boarding_respects_capacity_and_keeps_overflow_waiting() {
        let mut record = ElevatorRecord::new(3, 3);
        record.boarded.insert("aboard".into());
        let reqs: Vec<_> = ["a", "b", "c"].iter().map(|p| hall(3, p)).collect();
        record.hall_requests.insert(3, reqs.iter().cloned().collect());

        let boarding = on_boarding(&mut record);

        assert_eq!(boarding.admitted.len(), 2);
        assert_eq!(boarding.left_waiting, 1);
        assert_eq!(record.boarded.len(), 3);
        assert!(reqs[0].picked_up.is_fired());
        assert!(reqs[1].picked_up.is_fired());
        assert!(!reqs[2].picked_up.is_fired());
        assert_eq!(record.hall_floors(), BTreeSet::from([3]));
    }

    #[test]
    fn full_car_admits_nobody() {
        let mut record = ElevatorRecord::new(2, 1);
        record.boarded.insert("x".into());
        record.hall_requests.insert(2, VecDeque::from([hall(2, "y")]));
        let boarding = on_boarding(&mut record);
        assert!(boarding.admitted.is_empty());
        assert_eq!(boarding.left_waiting, 1);
        assert_eq!(record.boarded.len(), 1);
    }

    #[test]
    fn boarding_clears_target_and_fires_arrival_once() {
        let mut record = ElevatorRecord::new(10, 8);
        record.targets.extend([10, 4, 10]);
        let arrival = record.arrival_signal(10);

        let boarding = on_boarding(&mut record);

        assert!(boarding.was_target);
        assert!(boarding.arrival_released);
        assert!(arrival.is_fired());
        assert_eq!(record.targets, VecDeque::from([4]));
        // re-armed: the next subscriber gets a fresh signal
        assert!(!record.arrival_signal(10).is_fired());
    }

    #[test]
    fn doors_closed_moves_on_or_idles() {
        let mut record = ElevatorRecord::new(5, 8);
        record.direction = Dirn::Up;
        record.status = ElevatorBehaviour::DoorOpen;
        assert_eq!(on_doors_closed(&mut record), None);
        assert_eq!(record.status, ElevatorBehaviour::Idle);

        record.status = ElevatorBehaviour::DoorOpen;
        record.targets.push_back(2);
        assert_eq!(on_doors_closed(&mut record), Some(2));
        assert_eq!(record.status, ElevatorBehaviour::Moving);
    }

    #[test]
    fn floor_arrival_detects_waiting_passengers() {
        let mut record = ElevatorRecord::new(3, 8);
        record.targets.push_back(8);
        record.hall_requests.insert(4, VecDeque::from([hall(4, "p")]));
        on_destination_chosen(&mut record, 8);
        assert_eq!(record.direction, Dirn::Up);
        assert_eq!(on_floor_arrival(&mut record, 16), (4, true));
        assert_eq!(on_floor_arrival(&mut record, 16), (5, false));
    }

    #[test]
    fn full_car_leaves_overflow_behind() {
        let mut record = ElevatorRecord::new(3, 1);
        record.hall_requests.insert(3, VecDeque::from([hall(3, "a"), hall(3, "b")]));
        on_destination_chosen(&mut record, 3);
        assert_eq!(record.direction, Dirn::Idle);

        on_boarding(&mut record);
        record.targets.push_back(8);
        assert!(record.is_full());
        assert_eq!(record.pending_floors(), BTreeSet::from([3, 8]));
        assert_eq!(record.destination_floors(), BTreeSet::from([8]));
        assert_eq!(on_doors_closed(&mut record), Some(8));

        // no stop on the way for a floor it cannot take anyone from
        record.hall_requests.insert(5, VecDeque::from([hall(5, "c")]));
        on_destination_chosen(&mut record, 8);
        assert_eq!(on_floor_arrival(&mut record, 16), (4, false));
        assert_eq!(on_floor_arrival(&mut record, 16), (5, false));

        record.boarded.clear();
        assert_eq!(record.destination_floors(), BTreeSet::from([3, 5, 8]));
    }

    #[test]
    fn snapshot_counts_passengers() {
        let mut record = ElevatorRecord::new(1, 8);
        record.boarded.insert("a".into());
        record.targets.push_back(9);
        let state = record.snapshot();
        assert_eq!(state.passengers, 1);
        assert_eq!(state.targets, VecDeque::from([9]));
        assert_eq!(record.pending_floors(), BTreeSet::from([9]));
    }
}
