//! # Passenger simulation
//!
//! Drives the engine from the outside: creates passengers at random floors and runs
//! each one's [journey](journey::journey) as its own task.
//!
//! ## Overview
//! - [`PassengerGenerator`]: spawns `max_passengers` journeys, a random pause apart,
//!   with at most `max_active_passengers` in progress at once.
//! - [`SimulationSummary`]: how the journeys ended.

pub mod journey;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use uuid::Uuid;

use crate::config::{self, SimConfig};
use crate::elevator_logic::Elevator;
use crate::manager::Dispatcher;
use crate::print;

use journey::{JourneyOutcome, Passenger};

/// Count of journeys per outcome
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationSummary {
    counts: HashMap<JourneyOutcome, usize>,
}

impl SimulationSummary {
    /// Counts one finished journey
    pub fn record(&mut self, outcome: JourneyOutcome) {
        *self.counts.entry(outcome).or_insert(0) += 1;
    }

    /// Journeys that ended with `outcome`
    pub fn count(&self, outcome: JourneyOutcome) -> usize {
        self.counts.get(&outcome).copied().unwrap_or(0)
    }

    /// Journeys counted in total
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

impl fmt::Display for SimulationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} journeys", self.total())?;
        for outcome in [
            JourneyOutcome::Delivered,
            JourneyOutcome::AssignmentTimeout,
            JourneyOutcome::Unassigned,
            JourneyOutcome::PickupTimeout,
            JourneyOutcome::DeliveryTimeout,
            JourneyOutcome::Cancelled,
        ] {
            write!(f, " | {}: {}", outcome, self.count(outcome))?;
        }
        Ok(())
    }
}

/// A random passenger: start and target drawn uniformly from `1..=floors`, never equal
pub fn random_passenger(rng: &mut impl Rng, floors: u8) -> Passenger {
    let start = rng.random_range(1..=floors);
    // Draw from the floors left once the start is taken out
    let mut target = rng.random_range(1..floors);
    if target >= start {
        target += 1;
    }
    Passenger { id: Uuid::new_v4().to_string(), start, target }
}

/// Creates passengers and runs their journeys
#[derive(Debug)]
pub struct PassengerGenerator {
    config: SimConfig,
    dispatcher: Dispatcher,
    fleet: Arc<Vec<Arc<Elevator>>>,
}

impl PassengerGenerator {
    /// A generator submitting to `dispatcher`, its passengers riding `fleet`
    pub fn new(config: SimConfig, dispatcher: Dispatcher, fleet: Vec<Arc<Elevator>>) -> Self {
        Self { config, dispatcher, fleet: Arc::new(fleet) }
    }

    /// **Runs every journey and waits for them**
    ///
    /// ## Steps
    /// - Spawns `max_passengers` journeys. A new one starts only while fewer than
    ///   `max_active_passengers` are in progress, then the generator pauses
    ///   [config::SPAWN_DELAY_MIN]..[config::SPAWN_DELAY_MAX] seconds.
    /// - Joins every journey, each for at most [config::JOURNEY_JOIN_TIMEOUT]. Journeys
    ///   still running after that are aborted and counted as cancelled.
    ///
    /// ## Returns
    /// The [SimulationSummary]
    pub async fn run(&self) -> SimulationSummary {
        print::info(format!(
            "Generator started: {} passengers, at most {} at a time",
            self.config.max_passengers, self.config.max_active_passengers
        ));

        let active = Arc::new(Semaphore::new(self.config.max_active_passengers));
        let mut handles: Vec<JoinHandle<JourneyOutcome>> = Vec::with_capacity(self.config.max_passengers);

        for _ in 0..self.config.max_passengers {
            let Ok(permit) = Arc::clone(&active).acquire_owned().await else {
                print::err("Passenger limit closed, no more journeys".to_string());
                break;
            };
            let (passenger, pause) = {
                let mut rng = rand::rng();
                let passenger = random_passenger(&mut rng, self.config.floors);
                let pause = rng.random_range(config::SPAWN_DELAY_MIN..=config::SPAWN_DELAY_MAX);
                (passenger, pause)
            };

            {
                let dispatcher = self.dispatcher.clone();
                let fleet = Arc::clone(&self.fleet);
                let timeouts = self.config.journey_timeouts();
                handles.push(tokio::spawn(async move {
                    let outcome = journey::journey(&passenger, &dispatcher, &fleet, timeouts).await;
                    drop(permit);
                    outcome
                }));
            }

            sleep(Duration::from_secs_f64(pause)).await;
        }

        let mut summary = SimulationSummary::default();
        for mut handle in handles {
            let outcome = match timeout(config::JOURNEY_JOIN_TIMEOUT, &mut handle).await {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(e)) => {
                    if !e.is_cancelled() {
                        print::err(format!("Journey task failed: {}", e));
                    }
                    JourneyOutcome::Cancelled
                }
                Err(_) => {
                    handle.abort();
                    JourneyOutcome::Cancelled
                }
            };
            summary.record(outcome);
        }

        print::ok(format!("Simulation finished: {}", summary));
        summary
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_passengers_never_target_their_start() {
        let mut rng = rand::rng();
        for _ in 0..500 {
            let p = random_passenger(&mut rng, 4);
            assert!((1..=4).contains(&p.start));
            assert!((1..=4).contains(&p.target));
            assert_ne!(p.start, p.target);
        }
    }

    #[test]
    fn two_floor_building_always_crosses() {
        let mut rng = rand::rng();
        for _ in 0..50 {
            let p = random_passenger(&mut rng, 2);
            assert_eq!(p.start + p.target, 3);
        }
    }

    #[test]
    fn summary_counts_per_outcome() {
        let mut summary = SimulationSummary::default();
        summary.record(JourneyOutcome::Delivered);
        summary.record(JourneyOutcome::Delivered);
        summary.record(JourneyOutcome::PickupTimeout);
        assert_eq!(summary.count(JourneyOutcome::Delivered), 2);
        assert_eq!(summary.count(JourneyOutcome::Cancelled), 0);
        assert_eq!(summary.total(), 3);
        assert!(summary.to_string().starts_with("3 journeys | delivered: 2"));
    }
}
