//! # config.rs – Centralized Parameter Store
//!
//! This module holds all static simulation parameters used throughout the system,
//! plus [`SimConfig`], the bundle of values injected into the fleet, the dispatcher
//! and the passenger generator at construction time.
//!
//! The constants are the defaults. A JSON file given with `config::<path>` on the
//! command line may override any subset of them (see [crate::init::parse_args]).

use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Context};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

//
// ──────────────────────────────────────────────────────────────
//   1. BUILDING & FLEET
// ──────────────────────────────────────────────────────────────
//

/// Number of floors in the building. Floors are numbered from 1.
pub const FLOORS: u8 = 16;

/// Number of elevators in the fleet
pub const ELEVATORS: u8 = 4;

/// Max passengers aboard one elevator at a time
pub const CAPACITY: usize = 8;

/// The entry floor of the building, given a small priority discount by the dispatcher
pub const GROUND_FLOOR: u8 = 1;

//
// ──────────────────────────────────────────────────────────────
//   2. TIMING (seconds of simulated time)
// ──────────────────────────────────────────────────────────────
//

/// Time spent travelling one floor
pub const FLOOR_TRAVEL_TIME: f64 = 1.0;

/// Time the doors are held open at a stop
pub const DOOR_OPEN_TIME: f64 = 1.5;

/// Time spent closing the doors
pub const DOOR_CLOSE_TIME: f64 = 1.0;

/// Max time an idle elevator sleeps before it re-checks for work on its own
pub const IDLE_POLL: Duration = Duration::from_millis(500);

/// Pause between starting the fleet and the first passenger
pub const STARTUP_DELAY: Duration = Duration::from_secs(1);

/// How often the fleet table is printed while the simulation runs
pub const FLEET_PRINT_PERIOD: Duration = Duration::from_secs(10);

//
// ──────────────────────────────────────────────────────────────
//   3. PASSENGERS
// ──────────────────────────────────────────────────────────────
//

/// Total number of passenger journeys generated
pub const MAX_PASSENGERS: usize = 40;

/// Max number of journeys in progress at the same time
pub const MAX_ACTIVE_PASSENGERS: usize = 12;

/// Lower bound on the pause between two new passengers
pub const SPAWN_DELAY_MIN: f64 = 0.2;

/// Upper bound on the pause between two new passengers
pub const SPAWN_DELAY_MAX: f64 = 0.8;

/// How long a passenger waits for the dispatcher to assign an elevator
pub const ASSIGN_TIMEOUT: f64 = 30.0;

/// How long a passenger waits to be picked up once assigned
pub const PICKUP_TIMEOUT: f64 = 60.0;

/// How long a passenger waits aboard for the car to reach the target floor
pub const DELIVERY_TIMEOUT: f64 = 90.0;

/// How long the generator waits on each journey when shutting down
pub const JOURNEY_JOIN_TIMEOUT: Duration = Duration::from_secs(5);

//
// ──────────────────────────────────────────────────────────────
//   4. LOGGING CONFIGURATION
// ──────────────────────────────────────────────────────────────
//

/// Enable/disable printing of the fleet table
pub static PRINT_FLEET_ON: Lazy<Mutex<bool>> = Lazy::new(|| Mutex::new(true));

/// Enable/disable printing of errors
pub static PRINT_ERR_ON: Lazy<Mutex<bool>> = Lazy::new(|| Mutex::new(true));

/// Enable/disable printing of warnings
pub static PRINT_WARN_ON: Lazy<Mutex<bool>> = Lazy::new(|| Mutex::new(true));

/// Enable/disable printing of success messages
pub static PRINT_OK_ON: Lazy<Mutex<bool>> = Lazy::new(|| Mutex::new(true));

/// Enable/disable printing of general info
pub static PRINT_INFO_ON: Lazy<Mutex<bool>> = Lazy::new(|| Mutex::new(true));

/// Enable/disable printing of elevator and passenger events
pub static PRINT_EVENT_ON: Lazy<Mutex<bool>> = Lazy::new(|| Mutex::new(true));

/// Reads a print toggle. A poisoned toggle counts as enabled.
pub fn print_enabled(toggle: &Mutex<bool>) -> bool {
    match toggle.lock() {
        Ok(on) => *on,
        Err(poisoned) => *poisoned.into_inner(),
    }
}

/// Sets a print toggle
pub fn set_print(toggle: &Mutex<bool>, on: bool) {
    match toggle.lock() {
        Ok(mut guard) => *guard = on,
        Err(poisoned) => *poisoned.into_inner() = on,
    }
}

//
// ──────────────────────────────────────────────────────────────
//   5. INJECTED CONFIGURATION
// ──────────────────────────────────────────────────────────────
//

/// Simulated delays of one elevator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timings {
    /// Time to travel one floor
    pub floor_travel: Duration,
    /// Time the doors stay open
    pub door_open: Duration,
    /// Time to close the doors
    pub door_close: Duration,
    /// Upper bound on an idle sleep
    pub idle_poll: Duration,
}

/// Bounded waits of a passenger journey
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JourneyTimeouts {
    /// Wait for the `assigned` signal
    pub assign: Duration,
    /// Wait for the `picked-up` signal
    pub pickup: Duration,
    /// Wait for the arrival at the target floor
    pub delivery: Duration,
}

/// All values the simulation core consumes.
///
/// Every field falls back to the matching constant above, so a JSON file only
/// needs to list what it changes:
///
/// ```json
/// { "floors": 10, "elevators": 2, "floor_travel_time": 0.5 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Number of floors, numbered `1..=floors`
    pub floors: u8,
    /// Number of elevators, ids `1..=elevators`
    pub elevators: u8,
    /// Capacity of every elevator
    pub capacity: usize,
    /// Seconds per floor travelled
    pub floor_travel_time: f64,
    /// Seconds the doors are held open
    pub door_open_time: f64,
    /// Seconds spent closing the doors
    pub door_close_time: f64,
    /// Milliseconds an idle elevator sleeps before polling again
    pub idle_poll_ms: u64,
    /// Number of passenger journeys to generate
    pub max_passengers: usize,
    /// Max journeys in progress at once
    pub max_active_passengers: usize,
    /// Seconds a passenger waits for assignment
    pub assign_timeout: f64,
    /// Seconds a passenger waits for pickup
    pub pickup_timeout: f64,
    /// Seconds a passenger waits for delivery
    pub delivery_timeout: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            floors: FLOORS,
            elevators: ELEVATORS,
            capacity: CAPACITY,
            floor_travel_time: FLOOR_TRAVEL_TIME,
            door_open_time: DOOR_OPEN_TIME,
            door_close_time: DOOR_CLOSE_TIME,
            idle_poll_ms: IDLE_POLL.as_millis() as u64,
            max_passengers: MAX_PASSENGERS,
            max_active_passengers: MAX_ACTIVE_PASSENGERS,
            assign_timeout: ASSIGN_TIMEOUT,
            pickup_timeout: PICKUP_TIMEOUT,
            delivery_timeout: DELIVERY_TIMEOUT,
        }
    }
}

impl SimConfig {
    /// Parses a (partial) config from JSON and validates it
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let config: SimConfig = serde_json::from_str(json).context("invalid simulation config")?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON config file
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("could not read config file {}", path))?;
        Self::from_json(&json)
    }

    /// Rejects values the simulation cannot run with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.floors < 2 {
            bail!("a building needs at least 2 floors, got {}", self.floors);
        }
        if self.elevators == 0 {
            bail!("the fleet needs at least one elevator");
        }
        if self.capacity == 0 {
            bail!("elevator capacity must be positive");
        }
        if self.max_active_passengers == 0 {
            bail!("max_active_passengers must be positive");
        }
        if self.idle_poll_ms == 0 {
            bail!("idle_poll_ms must be positive");
        }
        for (name, secs) in [
            ("floor_travel_time", self.floor_travel_time),
            ("door_open_time", self.door_open_time),
            ("door_close_time", self.door_close_time),
            ("assign_timeout", self.assign_timeout),
            ("pickup_timeout", self.pickup_timeout),
            ("delivery_timeout", self.delivery_timeout),
        ] {
            if !secs.is_finite() || secs < 0.0 {
                bail!("{} must be a non-negative number of seconds, got {}", name, secs);
            }
        }
        Ok(())
    }

    /// Delays handed to every elevator
    pub fn timings(&self) -> Timings {
        Timings {
            floor_travel: Duration::from_secs_f64(self.floor_travel_time),
            door_open: Duration::from_secs_f64(self.door_open_time),
            door_close: Duration::from_secs_f64(self.door_close_time),
            idle_poll: Duration::from_millis(self.idle_poll_ms),
        }
    }

    /// Timeouts handed to every passenger journey
    pub fn journey_timeouts(&self) -> JourneyTimeouts {
        JourneyTimeouts {
            assign: Duration::from_secs_f64(self.assign_timeout),
            pickup: Duration::from_secs_f64(self.pickup_timeout),
            delivery: Duration::from_secs_f64(self.delivery_timeout),
        }
    }

    /// Start floor of the elevator with the given 1-based id.
    ///
    /// Elevator 1 waits at the ground floor, elevator 2 at the top floor and the rest
    /// in the middle of the building, so the fleet does not start bunched up.
    pub fn start_floor(&self, elevator_id: u8) -> u8 {
        match elevator_id {
            1 => GROUND_FLOOR,
            2 => self.floors,
            _ => (self.floors / 2).max(GROUND_FLOOR),
        }
    }
}
