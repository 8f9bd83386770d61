#![warn(missing_docs)]
//! # This projects library
//!
//! This library simulates a building with several elevators: a central dispatcher
//! assigns waiting passengers to elevators with a cost heuristic, and every elevator
//! runs its own pickup and delivery cycle while passenger journeys wait on it.
//!
//! ## Overview
//! - **Config**: Default parameters, print toggles and the injected [config::SimConfig].
//! - **Init**: Command line parsing and system startup.
//! - **Print**: Colour coded terminal output and structured events.
//! - **World View**: Shared elevator state types.
//! - **Signal**: One-shot signals used for every hand-off.
//! - **Requests**: Hall and car requests.
//! - **Elevator Logic**: The per-elevator state machine and control loop.
//! - **Manager**: The dispatcher and its task allocator.
//! - **Simulation**: Passenger journeys and the passenger generator.

/// Global variables
pub mod config;

/// Initialize functions
pub mod init;

/// Print functions with color coding
pub mod print;

/// Elevator state shared between the elevators, the dispatcher and the printer.
pub mod world_view;

pub mod signal;

pub mod requests;

/// Elevator control logic and state machine.
pub mod elevator_logic;

/// Request dispatching and elevator assignment.
pub mod manager;

pub mod simulation;
