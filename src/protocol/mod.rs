//! Line protocol handling.
//!
//! Command parsing for the main loop, scenario loading, and the text
//! rendering of everything the engine writes back.

pub mod format;
pub mod parser;
pub mod scenario;

pub use format::{format_choice, format_feedback, format_move, format_route, format_state, unit_list};
pub use parser::{parse_command, parse_unit_list, ClickArgs, Command};
pub use scenario::{resolve_territory, Scenario, ScenarioError};
