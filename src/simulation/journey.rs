//! One passenger's trip, from calling an elevator to getting off at the target floor.
//!
//! Every wait is bounded. A journey that runs out of time at any stage gives up,
//! logs why, and is never retried. Nothing is undone on the elevator's side.

use std::fmt;
use std::sync::Arc;

use crate::config::JourneyTimeouts;
use crate::elevator_logic::{short_pid, Elevator};
use crate::event;
use crate::manager::Dispatcher;
use crate::print::Level;
use crate::requests::{next_request_number, CarRequest, HallRequest};
use crate::signal::SignalError;
use crate::world_view::Dirn;

/// How a journey ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JourneyOutcome {
    /// Arrived at the target floor and got off
    Delivered,
    /// The dispatcher did not decide in time
    AssignmentTimeout,
    /// The dispatcher decided, but no known elevator was bound
    Unassigned,
    /// The assigned elevator did not let the passenger in in time
    PickupTimeout,
    /// The car did not reach the target floor in time
    DeliveryTimeout,
    /// Cut short: the other side of a wait went away, the journey task was aborted,
    /// or the target floor does not exist
    Cancelled,
}

impl fmt::Display for JourneyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            JourneyOutcome::Delivered => "delivered",
            JourneyOutcome::AssignmentTimeout => "assignment timeout",
            JourneyOutcome::Unassigned => "unassigned",
            JourneyOutcome::PickupTimeout => "pickup timeout",
            JourneyOutcome::DeliveryTimeout => "delivery timeout",
            JourneyOutcome::Cancelled => "cancelled",
        };
        f.write_str(text)
    }
}

/// Who travels where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Passenger {
    /// Unique id
    pub id: String,
    /// Floor the passenger starts at
    pub start: u8,
    /// Floor the passenger wants to reach, never the start floor
    pub target: u8,
}

impl Passenger {
    /// Direction of the hall call: up if the target is above the start, else down
    pub fn direction(&self) -> Dirn {
        if self.target > self.start {
            Dirn::Up
        } else {
            Dirn::Down
        }
    }
}

/// Maps a failed wait to the journey outcome of that stage
fn gave_up(err: SignalError, on_timeout: JourneyOutcome) -> JourneyOutcome {
    match err {
        SignalError::Timeout(_) => on_timeout,
        SignalError::Closed => JourneyOutcome::Cancelled,
    }
}

/// **Runs one passenger journey to the end**
///
/// ## Steps
/// 1. Submit a hall request and wait for the dispatcher (`timeouts.assign`).
/// 2. Find the bound elevator in `fleet`, give up if there is none.
/// 3. Wait to be picked up (`timeouts.pickup`).
/// 4. Subscribe to the arrival at the target floor, then submit the car request.
/// 5. Wait for the arrival (`timeouts.delivery`), get off and fire `delivered`.
///
/// ## Returns
/// The [JourneyOutcome]
pub async fn journey(
    passenger: &Passenger,
    dispatcher: &Dispatcher,
    fleet: &[Arc<Elevator>],
    timeouts: JourneyTimeouts,
) -> JourneyOutcome {
    let pid = short_pid(&passenger.id);
    event!(Level::Info, "Passenger", "passenger" => pid, "from" => passenger.start, "to" => passenger.target);

    let hall = Arc::new(HallRequest::new(
        passenger.start,
        passenger.direction(),
        &passenger.id,
        next_request_number(),
    ));
    dispatcher.submit(Arc::clone(&hall));

    let assigned = match hall.assigned.wait_timeout(timeouts.assign).await {
        Ok(assigned) => assigned,
        Err(e) => {
            event!(Level::Warn, "Assignment abandoned", "passenger" => pid, "reason" => e);
            return gave_up(e, JourneyOutcome::AssignmentTimeout);
        }
    };

    let Some(elevator) = assigned.and_then(|id| fleet.iter().find(|elev| elev.id == id)) else {
        event!(Level::Warn, "No elevator assigned", "passenger" => pid);
        return JourneyOutcome::Unassigned;
    };

    if let Err(e) = hall.picked_up.wait_timeout(timeouts.pickup).await {
        event!(Level::Warn, "Pickup abandoned", "passenger" => pid, "elevator" => elevator.id, "reason" => e);
        return gave_up(e, JourneyOutcome::PickupTimeout);
    }

    // Subscribed before the car request exists, so the arrival cannot slip past
    let arrival = match elevator.arrival_signal(passenger.target).await {
        Ok(arrival) => arrival,
        Err(e) => {
            event!(Level::Err, "Bad target floor", "passenger" => pid, "error" => e);
            return JourneyOutcome::Cancelled;
        }
    };
    let car = Arc::new(CarRequest::new(
        elevator.id,
        passenger.target,
        &passenger.id,
        next_request_number(),
    ));
    dispatcher.submit(Arc::clone(&car));

    if let Err(e) = arrival.wait_timeout(timeouts.delivery).await {
        event!(Level::Warn, "Delivery abandoned", "passenger" => pid, "elevator" => elevator.id, "reason" => e);
        return gave_up(e, JourneyOutcome::DeliveryTimeout);
    }

    elevator.passenger_exit(&passenger.id).await;
    car.delivered.fire(());
    event!(
        Level::Ok,
        "Delivered",
        "passenger" => pid,
        "elevator" => elevator.id,
        "floor" => passenger.target,
        "request" => car.number,
    );
    JourneyOutcome::Delivered
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_follows_the_target() {
        let up = Passenger { id: "a".into(), start: 2, target: 9 };
        let down = Passenger { id: "b".into(), start: 9, target: 2 };
        assert_eq!(up.direction(), Dirn::Up);
        assert_eq!(down.direction(), Dirn::Down);
    }

    #[test]
    fn closed_signal_means_cancelled() {
        let limit = std::time::Duration::from_secs(1);
        assert_eq!(gave_up(SignalError::Timeout(limit), JourneyOutcome::PickupTimeout), JourneyOutcome::PickupTimeout);
        assert_eq!(gave_up(SignalError::Closed, JourneyOutcome::PickupTimeout), JourneyOutcome::Cancelled);
    }
}
