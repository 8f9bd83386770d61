//! ## Printing Module
//!
//! This module is the simulation's logger. Everything the core wants to tell the outside
//! world goes through here, in colours matching the situation.
//!
//! The core does not format its own log lines. It records *events*: a kind
//! (`"Doors open"`, `"Elevator assigned"`, ...) and a list of key/value attributes, using
//! [`event`] or the [`crate::event!`] macro. This module stamps them with the seconds
//! passed since the simulation started and lines the columns up.
//!
//! It also provides a table print of the whole fleet, see [`fleet`].
use std::time::Instant;

use ansi_term::Colour::{self, Cyan, Green, Purple, Red, Yellow};
use once_cell::sync::Lazy;
use prettytable::{Cell, Row, Table};
use unicode_width::UnicodeWidthStr;

use crate::config;
use crate::world_view::{Dirn, ElevatorBehaviour, ElevatorState};

/// Width of the event-kind column
const KIND_WIDTH: usize = 22;

/// The instant the simulation clock started. Forced on first use.
static START: Lazy<Instant> = Lazy::new(Instant::now);

/// Severity of a recorded event. Decides colour and which print toggle applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Normal state transitions: movement, doors, assignment
    Info,
    /// Something completed: boarding, delivery
    Ok,
    /// A request or journey was dropped or timed out
    Warn,
    /// Internal failure
    Err,
}

/// Starts the simulation clock used to timestamp every line.
///
/// Calling it more than once has no effect.
pub fn start_clock() {
    Lazy::force(&START);
}

/// Seconds passed since [`start_clock`] (or the first printed line)
pub fn elapsed() -> f64 {
    START.elapsed().as_secs_f64()
}

/// Records one structured event.
///
/// ## Parameters
/// - `level`: The [Level], picks the colour and the print toggle.
/// - `kind`: Short name of what happened, e.g. `"Doors open"`.
/// - `fields`: Key/value attributes in the order they should be shown.
///
/// ## Terminal output
/// - `   3.250s | Doors open             | elevator: 2 | floor: 5`
///
/// ## Example
/// ```
/// use elevatorsim::print::{self, Level};
///
/// print::event(Level::Info, "Doors open", &[("elevator", 2.to_string()), ("floor", 5.to_string())]);
/// ```
pub fn event(level: Level, kind: &str, fields: &[(&str, String)]) {
    let (toggle, colour) = match level {
        Level::Info => (&config::PRINT_EVENT_ON, Colour::RGB(102, 178, 255)),
        Level::Ok => (&config::PRINT_OK_ON, Green),
        Level::Warn => (&config::PRINT_WARN_ON, Yellow),
        Level::Err => (&config::PRINT_ERR_ON, Red),
    };
    if !config::print_enabled(toggle) {
        return;
    }
    let line = format_line(elapsed(), kind, fields);
    println!("{}", colour.paint(line));
}

/// Builds a `kind` + key/value list and records it with [`print::event`](event).
///
/// ```
/// use elevatorsim::event;
/// use elevatorsim::print::Level;
///
/// let floor = 5;
/// event!(Level::Info, "Doors open", "elevator" => 2, "floor" => floor);
/// event!(Level::Warn, "Dispatcher stopped");
/// ```
#[macro_export]
macro_rules! event {
    ($level:expr, $kind:expr $(, $key:literal => $val:expr)* $(,)?) => {
        $crate::print::event(
            $level,
            $kind,
            &[$(($key, ::std::string::ToString::to_string(&$val))),*],
        )
    };
}

/// Formats one event line. Separate from [`event`] so the layout can be tested.
pub fn format_line(seconds: f64, kind: &str, fields: &[(&str, String)]) -> String {
    let details = if fields.is_empty() {
        "-".to_string()
    } else {
        fields
            .iter()
            .map(|(key, value)| format!("{}: {}", key, value))
            .collect::<Vec<_>>()
            .join(" | ")
    };
    format!("{:8.3}s | {} | {}", seconds, pad_text(kind, KIND_WIDTH), details)
}

/// Prints an error message in red to the terminal.
///
/// If `PRINT_ERR_ON` is `false`, the message will not be printed.
///
/// ## Terminal output
/// - "\[ERROR\]:   {}", msg
pub fn err(msg: String) {
    if config::print_enabled(&config::PRINT_ERR_ON) {
        println!("{}{}", Red.paint("[ERROR]:   "), Red.paint(msg));
    }
}

/// Prints a warning message in yellow to the terminal.
///
/// If `PRINT_WARN_ON` is `false`, the message will not be printed.
///
/// ## Terminal output
/// - "\[WARNING\]: {}", msg
pub fn warn(msg: String) {
    if config::print_enabled(&config::PRINT_WARN_ON) {
        println!("{}{}", Yellow.paint("[WARNING]: "), Yellow.paint(msg));
    }
}

/// Prints a success message in green to the terminal.
///
/// If `PRINT_OK_ON` is `false`, the message will not be printed.
///
/// ## Terminal output
/// - "\[OK\]:      {}", msg
pub fn ok(msg: String) {
    if config::print_enabled(&config::PRINT_OK_ON) {
        println!("{}{}", Green.paint("[OK]:      "), Green.paint(msg));
    }
}

/// Prints an informational message in light blue to the terminal.
///
/// If `PRINT_INFO_ON` is `false`, the message will not be printed.
///
/// ## Terminal output
/// - "\[INFO\]:    {}", msg
pub fn info(msg: String) {
    let light_blue = Colour::RGB(102, 178, 255);
    if config::print_enabled(&config::PRINT_INFO_ON) {
        println!("{}{}", light_blue.paint("[INFO]:    "), light_blue.paint(msg));
    }
}

/// Pads the input text to a fixed display width using spaces.
///
/// Accounts for characters that may take more than one column width (e.g. Unicode symbols),
/// ensuring aligned text in terminal output.
fn pad_text(text: &str, width: usize) -> String {
    let visible_width = UnicodeWidthStr::width(text);
    let padding = width.saturating_sub(visible_width);
    format!("{}{}", text, " ".repeat(padding))
}

/// Short coloured label for an elevator's direction and behaviour
fn status_label(state: &ElevatorState) -> String {
    match (state.direction, state.status) {
        (_, ElevatorBehaviour::Idle) => Green.paint("Idle").to_string(),
        (Dirn::Up, ElevatorBehaviour::Moving) => Yellow.paint("⬆ Moving").to_string(),
        (Dirn::Down, ElevatorBehaviour::Moving) => Yellow.paint("⬇ Moving").to_string(),
        (Dirn::Idle, ElevatorBehaviour::Moving) => Yellow.paint("Not Moving").to_string(),
        (_, ElevatorBehaviour::DoorOpen) => Purple.paint("Door Open").to_string(),
    }
}

/// Prints the state of the whole fleet as a table.
///
/// One row per elevator: id, floor, status, passengers aboard and the pending
/// target floors in the order they were added.
///
/// If `PRINT_FLEET_ON` is `false`, nothing is printed.
///
/// # Notes
/// - Intended for human-readable monitoring. Printing frequency should be limited
///   (see [config::FLEET_PRINT_PERIOD]).
pub fn fleet(states: &[(u8, ElevatorState)], capacity: usize) {
    if !config::print_enabled(&config::PRINT_FLEET_ON) {
        return;
    }
    println!("{}", Cyan.bold().paint(format!("── FLEET STATUS @ {:.1}s ──", elapsed())));

    let mut table = Table::new();
    table.set_titles(Row::new(vec![
        Cell::new("ID"),
        Cell::new("Floor"),
        Cell::new("Status"),
        Cell::new("Load"),
        Cell::new("Targets"),
    ]));
    for (id, state) in states {
        let targets = if state.targets.is_empty() {
            "-".to_string()
        } else {
            state.targets.iter().map(|f| f.to_string()).collect::<Vec<_>>().join(", ")
        };
        table.add_row(Row::new(vec![
            Cell::new(&id.to_string()),
            Cell::new(&state.current_floor.to_string()),
            Cell::new(&status_label(state)),
            Cell::new(&format!("{}/{}", state.passengers, capacity)),
            Cell::new(&targets),
        ]));
    }
    table.printstd();
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_pads_kind_and_joins_fields() {
        let line = format_line(3.25, "Doors open", &[("elevator", "2".into()), ("floor", "5".into())]);
        assert_eq!(line, format!("   3.250s | Doors open{} | elevator: 2 | floor: 5", " ".repeat(12)));
    }

    #[test]
    fn line_without_fields_shows_dash() {
        let line = format_line(0.0, "Dispatcher started", &[]);
        assert!(line.ends_with("| -"));
    }

    #[test]
    fn pad_text_never_truncates() {
        assert_eq!(pad_text("abc", 2), "abc");
        assert_eq!(pad_text("ab", 4), "ab  ");
    }
}
