//! # Requests
//!
//! The two things a passenger can ask for:
//! - [`HallRequest`]: "pick me up at this floor, I want to go this way".
//! - [`CarRequest`]: "take me to this floor", issued from inside the car after boarding.
//!
//! The data in a request never changes after creation. The only thing that happens to
//! a request afterwards is that its [`Signal`]s fire. Requests are shared as `Arc`s so
//! the journey that created one keeps its own handle to the signals while the
//! dispatcher and the elevator hold theirs.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use uuid::Uuid;

use crate::signal::Signal;
use crate::world_view::Dirn;

/// Process-wide request sequence counter
static REQUEST_NUMBER: AtomicU32 = AtomicU32::new(0);

/// Next request sequence number, starting at 1
pub fn next_request_number() -> u32 {
    REQUEST_NUMBER.fetch_add(1, Ordering::SeqCst) + 1
}

/// Short random request id: the first 8 hex characters of a v4 UUID
fn short_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Which of the two request types a [`Request`] is
pub enum RequestKind {
    Hall,
    Car,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestKind::Hall => f.write_str("hall"),
            RequestKind::Car => f.write_str("car"),
        }
    }
}

/// A passenger waiting at a floor to be picked up
#[derive(Debug)]
pub struct HallRequest {
    /// Random short id
    pub id: String,
    /// Sequence number, see [next_request_number]
    pub number: u32,
    /// When the request was created
    pub timestamp: SystemTime,
    /// Who is waiting
    pub passenger_id: String,
    /// Floor the passenger waits at
    pub floor: u8,
    /// Where the passenger wants to go from there
    pub direction: Dirn,
    /// Fires once the dispatcher has decided. `Some(id)` names the elevator,
    /// `None` means no elevator could be bound.
    pub assigned: Signal<Option<u8>>,
    /// Fires once the assigned elevator opened its doors here and let the passenger in
    pub picked_up: Signal<()>,
}

impl HallRequest {
    /// A new hall request with a fresh id, the given sequence number and unfired signals
    pub fn new(floor: u8, direction: Dirn, passenger_id: &str, number: u32) -> Self {
        Self {
            id: short_id(),
            number,
            timestamp: SystemTime::now(),
            passenger_id: passenger_id.to_string(),
            floor,
            direction,
            assigned: Signal::new(),
            picked_up: Signal::new(),
        }
    }

    /// The elevator the dispatcher bound, if it has decided and succeeded
    pub fn assigned_elevator(&self) -> Option<u8> {
        self.assigned.value().flatten()
    }
}

/// A passenger aboard asking to be taken to a floor
#[derive(Debug)]
pub struct CarRequest {
    /// Random short id
    pub id: String,
    /// Sequence number, see [next_request_number]
    pub number: u32,
    /// When the request was created
    pub timestamp: SystemTime,
    /// Who is asking
    pub passenger_id: String,
    /// The elevator the passenger is in
    pub elevator_id: u8,
    /// Where the passenger wants to get off
    pub target_floor: u8,
    /// Fires once the passenger has arrived and left the car
    pub delivered: Signal<()>,
}

impl CarRequest {
    /// A new car request with a fresh id, the given sequence number and an unfired signal
    pub fn new(elevator_id: u8, target_floor: u8, passenger_id: &str, number: u32) -> Self {
        Self {
            id: short_id(),
            number,
            timestamp: SystemTime::now(),
            passenger_id: passenger_id.to_string(),
            elevator_id,
            target_floor,
            delivered: Signal::new(),
        }
    }
}

/// Anything that can be submitted to the dispatcher
#[derive(Debug, Clone)]
pub enum Request {
    /// Wait-for-pickup request
    Hall(Arc<HallRequest>),
    /// In-car target request
    Car(Arc<CarRequest>),
}

impl Request {
    /// Which kind of request this is
    pub fn kind(&self) -> RequestKind {
        match self {
            Request::Hall(_) => RequestKind::Hall,
            Request::Car(_) => RequestKind::Car,
        }
    }

    /// Sequence number of the wrapped request
    pub fn number(&self) -> u32 {
        match self {
            Request::Hall(req) => req.number,
            Request::Car(req) => req.number,
        }
    }

    /// Passenger behind the wrapped request
    pub fn passenger_id(&self) -> &str {
        match self {
            Request::Hall(req) => &req.passenger_id,
            Request::Car(req) => &req.passenger_id,
        }
    }
}

impl From<Arc<HallRequest>> for Request {
    fn from(req: Arc<HallRequest>) -> Self {
        Request::Hall(req)
    }
}

impl From<Arc<CarRequest>> for Request {
    fn from(req: Arc<CarRequest>) -> Self {
        Request::Car(req)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_increase() {
        let a = next_request_number();
        let b = next_request_number();
        assert!(b > a);
    }

    #[test]
    fn new_hall_request_is_unassigned() {
        let req = HallRequest::new(4, Dirn::Up, "p-1", 1);
        assert_eq!(req.id.len(), 8);
        assert_eq!(req.assigned_elevator(), None);
        assert!(!req.picked_up.is_fired());

        req.assigned.fire(Some(2));
        assert_eq!(req.assigned_elevator(), Some(2));
    }

    #[test]
    fn unbound_assignment_still_counts_as_fired() {
        let req = HallRequest::new(4, Dirn::Down, "p-1", 1);
        req.assigned.fire(None);
        assert!(req.assigned.is_fired());
        assert_eq!(req.assigned_elevator(), None);
        // a late successful assignment cannot overwrite the decision
        assert!(!req.assigned.fire(Some(1)));
    }

    #[test]
    fn request_enum_exposes_common_fields() {
        let car: Request = Arc::new(CarRequest::new(1, 10, "p-9", 42)).into();
        assert_eq!(car.kind(), RequestKind::Car);
        assert_eq!(car.number(), 42);
        assert_eq!(car.passenger_id(), "p-9");
    }
}
