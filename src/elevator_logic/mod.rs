//! # Elevator control unit
//!
//! One [`Elevator`] per car. It owns the car's whole lifecycle: pick the next stop,
//! travel there a floor at a time, open and close the doors, let passengers in under
//! the capacity limit and tell waiting passengers that the car has arrived.
//!
//! ## Overview
//! - [`fsm`]: the mutable record and the transitions applied to it under the lock.
//! - [`request`]: pure look-ahead and stop decisions.
//!
//! ## Concurrency
//! The record sits behind one `tokio::sync::Mutex`. The control loop ([`Elevator::run`])
//! and the entry points called by the dispatcher and the passenger journeys all go
//! through it, and it is never held across a simulated delay. New work wakes an idle
//! loop through a `Notify`; a wake that arrives before the loop starts waiting is kept
//! as a permit, so it cannot be missed. The loop also polls on its own every
//! [crate::config::IDLE_POLL].

pub mod fsm;
pub mod request;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, ensure};
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::config::{SimConfig, Timings};
use crate::event;
use crate::print::Level;
use crate::requests::HallRequest;
use crate::signal::SignalWaiter;
use crate::world_view::ElevatorState;

use fsm::ElevatorRecord;

/// First 4 characters of a passenger id, enough to follow one passenger in the log
pub fn short_pid(passenger_id: &str) -> &str {
    match passenger_id.char_indices().nth(4) {
        Some((idx, _)) => &passenger_id[..idx],
        None => passenger_id,
    }
}

/// One elevator and its control loop
#[derive(Debug)]
pub struct Elevator {
    /// Elevator id, 1-based in fleet order
    pub id: u8,
    /// Max passengers aboard
    pub capacity: usize,
    num_floors: u8,
    timings: Timings,
    record: Mutex<ElevatorRecord>,
    wake: Notify,
}

impl Elevator {
    /// A parked elevator at `start_floor`.
    ///
    /// Fails if the start floor is outside the building or the capacity is zero.
    pub fn new(id: u8, start_floor: u8, config: &SimConfig) -> anyhow::Result<Self> {
        ensure!(config.capacity > 0, "elevator {} needs a positive capacity", id);
        if !request::in_range(start_floor, config.floors) {
            bail!("elevator {} cannot start at floor {} of 1..={}", id, start_floor, config.floors);
        }
        Ok(Self {
            id,
            capacity: config.capacity,
            num_floors: config.floors,
            timings: config.timings(),
            record: Mutex::new(ElevatorRecord::new(start_floor, config.capacity)),
            wake: Notify::new(),
        })
    }

    /// Number of floors this elevator serves
    pub fn num_floors(&self) -> u8 {
        self.num_floors
    }

    /// Point-in-time copy of the elevator's state
    pub async fn snapshot(&self) -> ElevatorState {
        self.record.lock().await.snapshot()
    }

    /// Passengers aboard right now
    pub async fn load(&self) -> usize {
        self.record.lock().await.boarded.len()
    }

    /// `true` if nobody else fits
    pub async fn is_full(&self) -> bool {
        self.record.lock().await.is_full()
    }

    /// Internal targets and waiting-passenger floors
    pub async fn pending_floors(&self) -> BTreeSet<u8> {
        self.record.lock().await.pending_floors()
    }

    fn check_floor(&self, floor: u8) -> anyhow::Result<()> {
        if !request::in_range(floor, self.num_floors) {
            bail!("floor {} is outside 1..={} (elevator {})", floor, self.num_floors, self.id);
        }
        Ok(())
    }

    /// Adds an internal target floor and wakes the control loop
    pub async fn add_target(&self, floor: u8) -> anyhow::Result<()> {
        self.check_floor(floor)?;
        self.record.lock().await.targets.push_back(floor);
        self.wake.notify_one();
        Ok(())
    }

    /// Registers a waiting passenger with this elevator and wakes the control loop.
    ///
    /// The request is served the next time the doors open at its floor, for whatever
    /// reason the car stopped there.
    pub async fn register_hall_request(&self, req: Arc<HallRequest>) -> anyhow::Result<()> {
        self.check_floor(req.floor)?;
        self.record
            .lock()
            .await
            .hall_requests
            .entry(req.floor)
            .or_default()
            .push_back(req);
        self.wake.notify_one();
        Ok(())
    }

    /// Subscribes to the next door opening at `floor`.
    ///
    /// Subscribe before asking to go there and the arrival cannot be missed.
    pub async fn arrival_signal(&self, floor: u8) -> anyhow::Result<SignalWaiter<()>> {
        self.check_floor(floor)?;
        Ok(self.record.lock().await.arrival_signal(floor).subscribe())
    }

    /// Waits (at most `limit`) for the doors to open at `floor`.
    /// Returns `false` on timeout or for a floor outside the building.
    pub async fn wait_for_arrival(&self, floor: u8, limit: Duration) -> bool {
        match self.arrival_signal(floor).await {
            Ok(waiter) => waiter.wait_timeout(limit).await.is_ok(),
            Err(_) => false,
        }
    }

    /// A passenger got off. Returns `false` if they were not aboard.
    ///
    /// Wakes the control loop, since a full car may have passengers left waiting.
    pub async fn passenger_exit(&self, passenger_id: &str) -> bool {
        let (removed, floor) = {
            let mut record = self.record.lock().await;
            (record.boarded.remove(passenger_id), record.current_floor)
        };
        if removed {
            self.wake.notify_one();
            event!(Level::Ok, "Passenger left", "elevator" => self.id, "floor" => floor, "passenger" => short_pid(passenger_id));
        }
        removed
    }

    /// Starts the control loop on the runtime
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(Arc::clone(self).run())
    }

    /// The control loop. Never returns.
    pub async fn run(self: Arc<Self>) {
        let floor = self.snapshot().await.current_floor;
        event!(Level::Info, "Elevator started", "elevator" => self.id, "floor" => floor);

        loop {
            let Some(dest) = self.head_for_next().await else {
                self.idle().await;
                continue;
            };

            let mut floor = self.snapshot().await.current_floor;
            while floor != dest {
                let (reached, stop) = self.move_one_floor().await;
                floor = reached;
                if stop {
                    break;
                }
            }

            self.serve_floor().await;
        }
    }

    /// Chooses the next destination and turns towards it
    async fn head_for_next(&self) -> Option<u8> {
        let mut record = self.record.lock().await;
        let dest = record.next_destination()?;
        fsm::on_destination_chosen(&mut record, dest);
        Some(dest)
    }

    /// Parks until woken by new work or the poll interval runs out
    async fn idle(&self) {
        {
            let mut record = self.record.lock().await;
            if record.next_destination().is_some() {
                return;
            }
            fsm::on_idle(&mut record);
        }
        tokio::select! {
            _ = self.wake.notified() => {}
            _ = sleep(self.timings.idle_poll) => {}
        }
    }

    /// Travels one floor in the current direction.
    /// Returns the floor reached and whether the car must stop there.
    async fn move_one_floor(&self) -> (u8, bool) {
        let direction = {
            let mut record = self.record.lock().await;
            fsm::on_departure(&mut record);
            record.direction
        };

        sleep(self.timings.floor_travel).await;

        let (floor, stop) = {
            let mut record = self.record.lock().await;
            fsm::on_floor_arrival(&mut record, self.num_floors)
        };
        event!(Level::Info, "Floor reached", "elevator" => self.id, "floor" => floor, "direction" => direction);
        (floor, stop)
    }

    /// Door sequence at the current floor: open, hold, board, close
    async fn serve_floor(&self) {
        let floor = {
            let mut record = self.record.lock().await;
            fsm::on_doors_open(&mut record);
            record.current_floor
        };
        event!(Level::Info, "Doors open", "elevator" => self.id, "floor" => floor);

        sleep(self.timings.door_open).await;

        let (boarding, load) = {
            let mut record = self.record.lock().await;
            let boarding = fsm::on_boarding(&mut record);
            (boarding, record.boarded.len())
        };
        for req in &boarding.admitted {
            event!(
                Level::Ok,
                "Passenger boarded",
                "elevator" => self.id,
                "floor" => floor,
                "passenger" => short_pid(&req.passenger_id),
                "request" => req.number,
                "load" => format!("{}/{}", load, self.capacity),
            );
        }
        if boarding.was_target {
            event!(Level::Info, "Target reached", "elevator" => self.id, "floor" => floor);
        }
        if boarding.left_waiting > 0 {
            event!(Level::Warn, "Car full", "elevator" => self.id, "floor" => floor, "left waiting" => boarding.left_waiting);
        }
        if boarding.arrival_released {
            event!(Level::Info, "Arrival signalled", "elevator" => self.id, "floor" => floor);
        }

        event!(Level::Info, "Doors closing", "elevator" => self.id, "floor" => floor);
        sleep(self.timings.door_close).await;

        let next = {
            let mut record = self.record.lock().await;
            fsm::on_doors_closed(&mut record)
        };
        match next {
            Some(next) => event!(Level::Info, "Doors closed", "elevator" => self.id, "floor" => floor, "next" => next),
            None => event!(Level::Info, "Doors closed", "elevator" => self.id, "floor" => floor),
        }
    }
}
