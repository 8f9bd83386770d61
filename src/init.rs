//! # Startup
//!
//! Reads the command line, builds the fleet and wires fleet, dispatcher and passenger
//! generator together.

use std::env;
use std::sync::Arc;

use anyhow::{bail, Context};
use futures::future::join_all;
use tokio::time::{interval, sleep, MissedTickBehavior};

use crate::config::{self, SimConfig};
use crate::elevator_logic::Elevator;
use crate::manager::Dispatcher;
use crate::print;
use crate::simulation::{PassengerGenerator, SimulationSummary};

/// What the command line asked for
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Run a simulation with this config
    Run(SimConfig),
    /// Print the argument list and exit
    Help,
}

/// ### Reads the process arguments
///
/// See [parse_arg_list] for the accepted arguments.
pub fn parse_args() -> anyhow::Result<CliCommand> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_arg_list(&args)
}

/// ### Parses `key::value` arguments
///
/// ## Arguments
/// - `print_fleet`, `print_err`, `print_warn`, `print_ok`, `print_info`, `print_event`:
///   `true`/`false`, switches that part of the output.
/// - `debug::true`: only error messages are printed.
/// - `config::<path>`: loads a [SimConfig] from a JSON file. Applied first, so
///   `passengers` may override it regardless of order.
/// - `passengers::<n>`: number of passenger journeys.
/// - `help`: lists the arguments.
///
/// Unknown keys are ignored with a warning. Malformed values are an error.
///
/// ## Returns
/// The [CliCommand] to execute
pub fn parse_arg_list(args: &[String]) -> anyhow::Result<CliCommand> {
    let mut config_path: Option<&str> = None;
    let mut passengers: Option<usize> = None;

    for arg in args {
        let Some((key, value)) = arg.split_once("::") else {
            if arg.to_lowercase() == "help" {
                return Ok(CliCommand::Help);
            }
            print::warn(format!("Ignoring argument '{}', expected key::value", arg));
            continue;
        };
        let key = key.to_lowercase();
        let is_true = value.to_lowercase() == "true";

        match key.as_str() {
            "print_fleet" => config::set_print(&config::PRINT_FLEET_ON, is_true),
            "print_err" => config::set_print(&config::PRINT_ERR_ON, is_true),
            "print_warn" => config::set_print(&config::PRINT_WARN_ON, is_true),
            "print_ok" => config::set_print(&config::PRINT_OK_ON, is_true),
            "print_info" => config::set_print(&config::PRINT_INFO_ON, is_true),
            "print_event" => config::set_print(&config::PRINT_EVENT_ON, is_true),
            "debug" if is_true => {
                // Debug modus: kun error-meldingar
                for toggle in [
                    &config::PRINT_FLEET_ON,
                    &config::PRINT_WARN_ON,
                    &config::PRINT_OK_ON,
                    &config::PRINT_INFO_ON,
                    &config::PRINT_EVENT_ON,
                ] {
                    config::set_print(toggle, false);
                }
            }
            "debug" => {}
            "config" => config_path = Some(value),
            "passengers" => {
                let n = value
                    .parse::<usize>()
                    .with_context(|| format!("passengers::{} is not a number", value))?;
                passengers = Some(n);
            }
            _ => print::warn(format!("Unknown argument key '{}'", key)),
        }
    }

    let mut sim = match config_path {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    if let Some(n) = passengers {
        sim.max_passengers = n;
    }
    sim.validate()?;
    Ok(CliCommand::Run(sim))
}

/// Prints the accepted arguments
pub fn print_help() {
    println!("Available arguments:");
    println!("  print_fleet::true/false");
    println!("  print_err::true/false");
    println!("  print_warn::true/false");
    println!("  print_ok::true/false");
    println!("  print_info::true/false");
    println!("  print_event::true/false");
    println!("  debug::true (only errors are printed)");
    println!("  config::<path to json> (simulation parameters)");
    println!("  passengers::<n> (number of passengers)");
}

/// ### Builds the fleet and starts every control loop
///
/// Elevator ids run from 1 in fleet order. Start floors follow [SimConfig::start_floor].
///
/// ## Returns
/// The elevators in fleet order, or an error if the config is unusable.
pub fn build_fleet(config: &SimConfig) -> anyhow::Result<Vec<Arc<Elevator>>> {
    if config.elevators == 0 {
        bail!("cannot build an empty fleet");
    }
    let mut fleet = Vec::with_capacity(config.elevators as usize);
    for id in 1..=config.elevators {
        let elevator = Arc::new(Elevator::new(id, config.start_floor(id), config)?);
        elevator.spawn();
        fleet.push(elevator);
    }
    Ok(fleet)
}

/// Snapshots the whole fleet and prints it as a table
pub async fn print_fleet(fleet: &[Arc<Elevator>]) {
    let states = join_all(
        fleet
            .iter()
            .map(|elevator| async move { (elevator.id, elevator.snapshot().await) }),
    )
    .await;
    let capacity = fleet.first().map(|elevator| elevator.capacity).unwrap_or(0);
    print::fleet(&states, capacity);
}

/// ### Runs one full simulation
///
/// ## Steps
/// 1. Validate `config` and start the simulation clock.
/// 2. Build the fleet and start the dispatcher.
/// 3. Let the elevators settle for [config::STARTUP_DELAY].
/// 4. Run the passenger generator, printing the fleet every [config::FLEET_PRINT_PERIOD].
///
/// ## Returns
/// How the journeys ended
pub async fn start_simulation(config: SimConfig) -> anyhow::Result<SimulationSummary> {
    config.validate()?;
    print::start_clock();
    print::info(format!(
        "Simulation starting: {} floors, {} elevators, capacity {}",
        config.floors, config.elevators, config.capacity
    ));

    let fleet = build_fleet(&config)?;
    let dispatcher = Dispatcher::start(fleet.clone());
    sleep(config::STARTUP_DELAY).await;

    let fleet_printer_task = {
        let fleet = fleet.clone();
        tokio::spawn(async move {
            let mut ticker = interval(config::FLEET_PRINT_PERIOD);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                print_fleet(&fleet).await;
            }
        })
    };

    let generator = PassengerGenerator::new(config, dispatcher, fleet.clone());
    let summary = generator.run().await;

    fleet_printer_task.abort();
    print_fleet(&fleet).await;
    print::info("Simulation ended".to_string());
    Ok(summary)
}


#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn no_arguments_gives_defaults() {
        assert_eq!(parse_arg_list(&[]).unwrap(), CliCommand::Run(SimConfig::default()));
    }

    #[test]
    fn passengers_override() {
        let CliCommand::Run(sim) = parse_arg_list(&args(&["passengers::5"])).unwrap() else {
            panic!("expected a run command");
        };
        assert_eq!(sim.max_passengers, 5);
    }

    #[test]
    fn bad_values_are_errors() {
        assert!(parse_arg_list(&args(&["passengers::many"])).is_err());
        assert!(parse_arg_list(&args(&["config::/does/not/exist.json"])).is_err());
    }

    #[test]
    fn help_wins() {
        assert_eq!(parse_arg_list(&args(&["passengers::3", "HELP"])).unwrap(), CliCommand::Help);
    }

    #[tokio::test]
    async fn fleet_ids_and_start_floors() {
        let sim = SimConfig { elevators: 3, floors: 10, ..SimConfig::default() };
        let fleet = build_fleet(&sim).unwrap();
        let ids: Vec<u8> = fleet.iter().map(|e| e.id).collect();
        assert_eq!(ids, [1, 2, 3]);
        assert!(fleet.iter().all(|e| e.num_floors() == 10));
        assert_eq!(fleet[0].snapshot().await.current_floor, 1);
        assert_eq!(fleet[1].snapshot().await.current_floor, 10);
        assert_eq!(fleet[2].snapshot().await.current_floor, 5);
    }
}
