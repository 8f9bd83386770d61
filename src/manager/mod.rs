//! # Dispatcher
//!
//! The single place where hall requests are assigned to elevators.
//!
//! ## Overview
//! Every request goes into one unbounded queue through [`Dispatcher::submit`]. One
//! consumer task ([`DispatchLoop`]) takes them out one at a time:
//! - **Hall request**: snapshot the fleet, rank it with [`task_allocator`], register the
//!   request with the cheapest elevator and fire `assigned` with its id. If anything
//!   fails `assigned` still fires, without an elevator, so nobody waits forever.
//! - **Car request**: add the target floor to the elevator named in the request.
//!   Requests for unknown elevators or floors outside the building are logged and dropped.
//!
//! Decisions are never made in parallel, so no two assignments are based on the same
//! stale view of the fleet. The dispatcher only uses the elevators' own entry points.

pub mod task_allocator;

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::elevator_logic::Elevator;
use crate::event;
use crate::print::{self, Level};
use crate::requests::{CarRequest, HallRequest, Request};

use task_allocator::ElevatorView;

/// Submit handle of the dispatcher. Cheap to clone, one per submitter.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    tx: mpsc::UnboundedSender<Request>,
}

/// The consumer side: owns the queue receiver and the fleet
#[derive(Debug)]
pub struct DispatchLoop {
    rx: mpsc::UnboundedReceiver<Request>,
    fleet: Vec<Arc<Elevator>>,
}

impl Dispatcher {
    /// Creates the queue without starting the consumer.
    ///
    /// Requests submitted before [`DispatchLoop::run`] is awaited stay queued.
    pub fn new(fleet: Vec<Arc<Elevator>>) -> (Dispatcher, DispatchLoop) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Dispatcher { tx }, DispatchLoop { rx, fleet })
    }

    /// Creates the queue and spawns the consumer loop on the runtime
    pub fn start(fleet: Vec<Arc<Elevator>>) -> Dispatcher {
        let (dispatcher, dispatch_loop) = Dispatcher::new(fleet);
        dispatch_loop.spawn();
        dispatcher
    }

    /// Queues a request. Never blocks.
    ///
    /// If the consumer loop is gone the request cannot be served; a hall request then
    /// gets its `assigned` signal fired without an elevator.
    pub fn submit(&self, request: impl Into<Request>) {
        if let Err(mpsc::error::SendError(request)) = self.tx.send(request.into()) {
            event!(Level::Err, "Dispatcher stopped", "request" => request.number(), "kind" => request.kind());
            if let Request::Hall(req) = request {
                req.assigned.fire(None);
            }
        }
    }
}

impl DispatchLoop {
    /// Consumes the queue until every [`Dispatcher`] handle is dropped
    pub async fn run(mut self) {
        print::info(format!("Dispatcher started with {} elevator(s)", self.fleet.len()));
        while let Some(request) = self.rx.recv().await {
            match request {
                Request::Hall(req) => self.handle_hall(req).await,
                Request::Car(req) => self.handle_car(req).await,
            }
        }
        print::info("Dispatcher stopped: no submitters left".to_string());
    }

    /// Spawns [`DispatchLoop::run`] on the runtime
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    fn elevator(&self, id: u8) -> Option<&Arc<Elevator>> {
        self.fleet.iter().find(|elev| elev.id == id)
    }

    /// Snapshots every elevator in fleet order
    async fn fleet_view(&self) -> Vec<ElevatorView> {
        let mut views = Vec::with_capacity(self.fleet.len());
        for elev in &self.fleet {
            views.push(ElevatorView {
                id: elev.id,
                capacity: elev.capacity,
                state: elev.snapshot().await,
            });
        }
        views
    }

    async fn handle_hall(&self, req: Arc<HallRequest>) {
        event!(
            Level::Info,
            "Hall request",
            "request" => req.number,
            "floor" => req.floor,
            "direction" => req.direction,
            "passenger" => crate::elevator_logic::short_pid(&req.passenger_id),
        );

        match self.assign(&req).await {
            Ok((elevator_id, score)) => {
                req.assigned.fire(Some(elevator_id));
                event!(
                    Level::Info,
                    "Elevator assigned",
                    "request" => req.number,
                    "elevator" => elevator_id,
                    "floor" => req.floor,
                    "score" => format!("{:.2}", score),
                );
            }
            Err(e) => {
                req.assigned.fire(None);
                event!(Level::Err, "Assignment failed", "request" => req.number, "error" => format!("{:#}", e));
            }
        }
    }

    /// Scores the fleet and binds the request to the cheapest elevator
    async fn assign(&self, req: &Arc<HallRequest>) -> anyhow::Result<(u8, f64)> {
        let views = self.fleet_view().await;
        let best = task_allocator::choose_elevator(&views, req.floor, req.direction)?;
        let elevator = self
            .elevator(best.elevator_id)
            .with_context(|| format!("elevator {} vanished from the fleet", best.elevator_id))?;
        elevator
            .register_hall_request(Arc::clone(req))
            .await
            .with_context(|| format!("could not register request {} with elevator {}", req.number, elevator.id))?;
        Ok((elevator.id, best.score))
    }

    async fn handle_car(&self, req: Arc<CarRequest>) {
        event!(
            Level::Info,
            "Car request",
            "request" => req.number,
            "elevator" => req.elevator_id,
            "floor" => req.target_floor,
        );

        let Some(elevator) = self.elevator(req.elevator_id) else {
            event!(Level::Warn, "Unknown elevator", "request" => req.number, "elevator" => req.elevator_id);
            return;
        };
        if let Err(e) = elevator.add_target(req.target_floor).await {
            event!(Level::Warn, "Car request dropped", "request" => req.number, "error" => e);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::config::SimConfig;
    use crate::world_view::Dirn;

    fn fleet(config: &SimConfig, floors: &[u8]) -> Vec<Arc<Elevator>> {
        floors
            .iter()
            .enumerate()
            .map(|(i, &floor)| Arc::new(Elevator::new(i as u8 + 1, floor, config).unwrap()))
            .collect()
    }

    #[tokio::test]
    async fn hall_request_goes_to_nearest_idle_elevator() {
        let config = SimConfig::default();
        let elevators = fleet(&config, &[1, 16, 8]);
        let dispatcher = Dispatcher::start(elevators.clone());

        let req = Arc::new(HallRequest::new(10, Dirn::Down, "p", 1));
        dispatcher.submit(Arc::clone(&req));

        let assigned = req.assigned.wait_timeout(Duration::from_secs(1)).await.unwrap();
        assert_eq!(assigned, Some(3));
        assert!(elevators[2].pending_floors().await.contains(&10));
        assert!(elevators[0].pending_floors().await.is_empty());
    }

    #[tokio::test]
    async fn empty_fleet_still_releases_the_passenger() {
        let dispatcher = Dispatcher::start(Vec::new());
        let req = Arc::new(HallRequest::new(3, Dirn::Up, "p", 1));
        dispatcher.submit(Arc::clone(&req));
        assert_eq!(req.assigned.wait_timeout(Duration::from_secs(1)).await, Ok(None));
    }

    #[tokio::test]
    async fn stopped_consumer_releases_the_passenger() {
        let (dispatcher, dispatch_loop) = Dispatcher::new(Vec::new());
        drop(dispatch_loop);
        let req = Arc::new(HallRequest::new(3, Dirn::Up, "p", 1));
        dispatcher.submit(Arc::clone(&req));
        assert!(req.assigned.is_fired());
        assert_eq!(req.assigned_elevator(), None);
    }

    #[tokio::test]
    async fn car_requests_reach_the_named_elevator_only() {
        let config = SimConfig { floors: 10, ..SimConfig::default() };
        let elevators = fleet(&config, &[1, 5]);
        let (dispatcher, dispatch_loop) = Dispatcher::new(elevators.clone());

        dispatcher.submit(Arc::new(CarRequest::new(2, 9, "p", 1)));
        dispatcher.submit(Arc::new(CarRequest::new(7, 3, "p", 2)));
        dispatcher.submit(Arc::new(CarRequest::new(1, 11, "p", 3)));
        drop(dispatcher);
        // the loop ends once the queue is drained and every handle is gone
        dispatch_loop.run().await;

        assert_eq!(elevators[1].snapshot().await.targets, [9]);
        assert!(elevators[0].snapshot().await.targets.is_empty());
    }

    #[tokio::test]
    async fn requests_are_handled_in_submission_order() {
        let config = SimConfig::default();
        let elevators = fleet(&config, &[1]);
        let (dispatcher, dispatch_loop) = Dispatcher::new(elevators.clone());

        for floor in [7, 3, 12] {
            dispatcher.submit(Arc::new(CarRequest::new(1, floor, "p", 1)));
        }
        drop(dispatcher);
        dispatch_loop.run().await;

        assert_eq!(elevators[0].snapshot().await.targets, [7, 3, 12]);
    }
}
