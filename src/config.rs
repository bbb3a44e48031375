//! Rules options for the move engine.
//!
//! Loaded from the `rules` block of a scenario file and adjustable at run
//! time with `setoption name <id> value <x>`. Every field has a default so a
//! scenario may omit the block entirely.

use serde::{Deserialize, Serialize};

use crate::pathing::PassThroughRule;

/// Errors from applying an option by name.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown option: '{0}'")]
    UnknownOption(String),

    #[error("option '{name}' expects {expected}, got '{value}'")]
    InvalidValue {
        name: String,
        value: String,
        expected: &'static str,
    },
}

/// Game rules and phase flags that change how moves are planned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesOptions {
    /// Edit mode relaxes ownership and movement checks.
    pub edit_mode: bool,
    /// Non-combat movement phase (otherwise combat movement).
    pub non_combat: bool,
    /// Units with no movement left may still be selected.
    pub selectable_zero_movement_units: bool,
    pub neutrals_impassable: bool,
    pub neutral_flyover_allowed: bool,
    /// Air transports may carry air-transportable units.
    pub paratroopers: bool,
    pub paratroopers_can_move_during_non_combat: bool,
    /// Current move is an airborne (special) move.
    pub airborne_move: bool,
    pub pass_through: PassThroughRule,
}

impl Default for RulesOptions {
    fn default() -> Self {
        Self {
            edit_mode: false,
            non_combat: false,
            selectable_zero_movement_units: false,
            neutrals_impassable: false,
            neutral_flyover_allowed: true,
            paratroopers: false,
            paratroopers_can_move_during_non_combat: false,
            airborne_move: false,
            pass_through: PassThroughRule::StopAtHostile,
        }
    }
}

impl RulesOptions {
    /// Sets one option from its protocol name. A missing value on a boolean
    /// option means `true`.
    pub fn apply_option(&mut self, name: &str, value: Option<&str>) -> Result<(), ConfigError> {
        let key = name.to_ascii_lowercase().replace(['-', ' '], "_");
        if key == "pass_through" {
            let raw = value.unwrap_or("");
            self.pass_through = PassThroughRule::from_name(raw).ok_or_else(|| ConfigError::InvalidValue {
                name: name.to_string(),
                value: raw.to_string(),
                expected: "stopathostile, blitz or freepassage",
            })?;
            return Ok(());
        }

        let flag = match key.as_str() {
            "edit_mode" => &mut self.edit_mode,
            "non_combat" => &mut self.non_combat,
            "selectable_zero_movement_units" => &mut self.selectable_zero_movement_units,
            "neutrals_impassable" => &mut self.neutrals_impassable,
            "neutral_flyover_allowed" => &mut self.neutral_flyover_allowed,
            "paratroopers" => &mut self.paratroopers,
            "paratroopers_can_move_during_non_combat" => {
                &mut self.paratroopers_can_move_during_non_combat
            }
            "airborne_move" => &mut self.airborne_move,
            _ => return Err(ConfigError::UnknownOption(name.to_string())),
        };
        *flag = parse_bool(name, value)?;
        Ok(())
    }

    /// True when air transports may load units in the current phase.
    pub fn air_transport_loading_allowed(&self) -> bool {
        self.paratroopers && (!self.non_combat || self.paratroopers_can_move_during_non_combat)
    }
}

fn parse_bool(name: &str, value: Option<&str>) -> Result<bool, ConfigError> {
    match value.map(|v| v.to_ascii_lowercase()) {
        None => Ok(true),
        Some(v) => match v.as_str() {
            "true" | "on" | "1" | "yes" => Ok(true),
            "false" | "off" | "0" | "no" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                name: name.to_string(),
                value: v,
                expected: "a boolean",
            }),
        },
    }
}
