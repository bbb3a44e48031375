//! Line protocol parser.
//!
//! Turns one line of driver input into a `Command` the main loop can
//! dispatch on. Territory names are kept as text here and resolved against
//! the loaded board by the engine.

use tracing::warn;

use crate::board::UnitId;
use crate::selection::Modifiers;

/// A click as written on the wire:
/// `click <territory> [units u1,u2] [right] [shift] [ctrl] [alt]`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClickArgs {
    pub territory: String,
    pub units: Vec<UnitId>,
    pub right: bool,
    pub modifiers: Modifiers,
}

/// A parsed driver-to-engine command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Synchronization ping; engine must reply `readyok`.
    IsReady,

    /// Load a scenario file: `load <path>`.
    Load { path: String },

    /// Set the player whose units are being moved.
    SetPlayer { name: String },

    /// Set a rules option: `setoption name <id> [value <x>]`.
    SetOption { name: String, value: Option<String> },

    Click(ClickArgs),

    /// Pointer moved over a territory.
    Hover { territory: String },

    /// Queue an answer for the next choice request. `None` cancels it.
    Choose(Option<Vec<UnitId>>),

    /// Abandon the move being built.
    Cancel,

    /// Report the current selection state.
    Status,

    /// Terminate the engine process.
    Quit,
}

/// Parses a single line of input into a `Command`.
///
/// Returns `None` for empty lines, comments starting with `#`, and
/// unrecognized commands. Malformed arguments for known commands also return
/// `None` after a warning.
pub fn parse_command(line: &str) -> Option<Command> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }

    let tokens: Vec<&str> = trimmed.split_whitespace().collect();

    match tokens[0] {
        "isready" => Some(Command::IsReady),
        "quit" => Some(Command::Quit),
        "cancel" => Some(Command::Cancel),
        "status" => Some(Command::Status),

        "load" => parse_load(&tokens, trimmed),
        "setplayer" => parse_setplayer(&tokens),
        "setoption" => parse_setoption(&tokens),
        "click" => parse_click(&tokens),
        "hover" => parse_hover(&tokens),
        "choose" => parse_choose(&tokens),

        other => {
            warn!(command = other, "unknown command");
            None
        }
    }
}

/// Parses `load <path>`. The path is the rest of the line.
fn parse_load(tokens: &[&str], line: &str) -> Option<Command> {
    if tokens.len() < 2 {
        warn!("malformed load: expected 'load <path>'");
        return None;
    }
    let path = line["load".len()..].trim().to_string();
    Some(Command::Load { path })
}

fn parse_setplayer(tokens: &[&str]) -> Option<Command> {
    if tokens.len() < 2 {
        warn!("malformed setplayer: expected 'setplayer <name>'");
        return None;
    }
    Some(Command::SetPlayer { name: tokens[1..].join(" ") })
}

/// Parses `setoption name <id> [value <x>]`.
fn parse_setoption(tokens: &[&str]) -> Option<Command> {
    if tokens.len() < 3 || tokens[1] != "name" {
        warn!("malformed setoption: expected 'setoption name <id> [value <x>]'");
        return None;
    }

    let value_idx = tokens.iter().position(|&t| t == "value");

    let (name, value) = match value_idx {
        Some(vi) => {
            let name_parts = &tokens[2..vi];
            let value_parts = &tokens[vi + 1..];
            if name_parts.is_empty() {
                warn!("malformed setoption: empty name");
                return None;
            }
            let value = if value_parts.is_empty() {
                None
            } else {
                Some(value_parts.join(" "))
            };
            (name_parts.join(" "), value)
        }
        None => (tokens[2..].join(" "), None),
    };

    Some(Command::SetOption { name, value })
}

/// Parses `click <territory> [units u1,u2] [right] [shift] [ctrl] [alt]`.
fn parse_click(tokens: &[&str]) -> Option<Command> {
    if tokens.len() < 2 {
        warn!("malformed click: expected 'click <territory> [units <ids>] [right] [shift] [ctrl] [alt]'");
        return None;
    }

    let mut args = ClickArgs {
        territory: tokens[1].to_string(),
        ..ClickArgs::default()
    };

    let mut i = 2;
    while i < tokens.len() {
        match tokens[i] {
            "units" => {
                let list = match tokens.get(i + 1) {
                    Some(list) => list,
                    None => {
                        warn!("malformed click: 'units' needs a list");
                        return None;
                    }
                };
                args.units = parse_unit_list(list)?;
                i += 1;
            }
            "right" => args.right = true,
            "shift" => args.modifiers.shift = true,
            "ctrl" => args.modifiers.ctrl = true,
            "alt" => args.modifiers.alt = true,
            other => {
                warn!(token = other, "malformed click: unknown token");
                return None;
            }
        }
        i += 1;
    }

    Some(Command::Click(args))
}

fn parse_hover(tokens: &[&str]) -> Option<Command> {
    if tokens.len() != 2 {
        warn!("malformed hover: expected 'hover <territory>'");
        return None;
    }
    Some(Command::Hover { territory: tokens[1].to_string() })
}

/// Parses `choose [u1,u2]` or `choose cancel`. A bare `choose` answers
/// with nothing picked.
fn parse_choose(tokens: &[&str]) -> Option<Command> {
    match tokens.get(1) {
        None => Some(Command::Choose(Some(Vec::new()))),
        Some(&"cancel") => Some(Command::Choose(None)),
        Some(list) => parse_unit_list(list).map(|units| Command::Choose(Some(units))),
    }
}

/// Parses a comma separated unit list such as `u1,u4,7`.
pub fn parse_unit_list(list: &str) -> Option<Vec<UnitId>> {
    let mut units = Vec::new();
    for part in list.split(',').filter(|p| !p.is_empty()) {
        match UnitId::parse(part) {
            Some(id) => units.push(id),
            None => {
                warn!(unit = part, "malformed unit id");
                return None;
            }
        }
    }
    Some(units)
}
