//! Scenario files.
//!
//! A scenario is a JSON document describing players, unit types, the map
//! and the units on it, plus the rules block and any moves already made this
//! turn. Loading builds a fresh `BoardState`; units are placed in file order
//! so the n-th unit in the file gets `UnitId(n)`.

use std::fs;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::board::{BoardState, Domain, PlayerId, TerritoryId, UnitId, UnitType};
use crate::config::RulesOptions;
use crate::filter::PriorMove;

/// Errors that can occur while loading a scenario.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("cannot read scenario: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid scenario: {0}")]
    Json(#[from] serde_json::Error),

    #[error("duplicate territory '{0}'")]
    DuplicateTerritory(String),

    #[error("unknown territory '{0}'")]
    UnknownTerritory(String),

    #[error("unknown player '{0}'")]
    UnknownPlayer(String),

    #[error("unknown unit type '{0}'")]
    UnknownUnitType(String),

    #[error("unit index {0} is out of range")]
    UnknownUnit(usize),

    #[error("unit {cargo} cannot ride unit {carrier}")]
    InvalidCargo { carrier: usize, cargo: usize },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScenarioFile {
    /// Player to move. Defaults to the first player.
    #[serde(default)]
    player: Option<String>,
    players: Vec<String>,
    #[serde(default)]
    alliances: Vec<(String, String)>,
    unit_types: Vec<UnitTypeSpec>,
    territories: Vec<TerritorySpec>,
    #[serde(default)]
    units: Vec<UnitSpec>,
    #[serde(default)]
    rules: RulesOptions,
    #[serde(default)]
    prior_moves: Vec<PriorMoveSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct UnitTypeSpec {
    name: String,
    domain: Domain,
    movement: Decimal,
    #[serde(default)]
    transport_cost: Option<u32>,
    #[serde(default)]
    capacity: Option<u32>,
    #[serde(default)]
    air_transport: bool,
    #[serde(default)]
    air_transportable: bool,
    #[serde(default)]
    can_not_move_during_combat_move: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct TerritorySpec {
    name: String,
    #[serde(default)]
    water: bool,
    #[serde(default)]
    owner: Option<String>,
    #[serde(default)]
    neighbors: Vec<String>,
    #[serde(default)]
    impassable: bool,
    #[serde(default)]
    entry_cost: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct UnitSpec {
    #[serde(rename = "type")]
    unit_type: String,
    owner: String,
    territory: String,
    #[serde(default)]
    movement_left: Option<Decimal>,
    #[serde(default)]
    hits: u32,
    /// Index of the carrier in the `units` list.
    #[serde(default)]
    transported_by: Option<usize>,
    /// Indices of cargo this carrier already dropped off this turn.
    #[serde(default)]
    unloaded: Vec<usize>,
    #[serde(default)]
    unloaded_in_combat_phase: bool,
    #[serde(default)]
    unload_restricted_to: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct PriorMoveSpec {
    units: Vec<usize>,
    end: String,
    #[serde(default)]
    started_battle: bool,
}

/// A loaded scenario, ready to drive the selection machine.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub board: BoardState,
    pub rules: RulesOptions,
    pub player: Option<PlayerId>,
    pub prior_moves: Vec<PriorMove>,
}

impl Scenario {
    /// Reads and builds a scenario from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Scenario, ScenarioError> {
        let text = fs::read_to_string(path)?;
        Scenario::from_json(&text)
    }

    /// Builds a scenario from JSON text.
    pub fn from_json(text: &str) -> Result<Scenario, ScenarioError> {
        let file: ScenarioFile = serde_json::from_str(text)?;
        build(file)
    }
}

fn build(file: ScenarioFile) -> Result<Scenario, ScenarioError> {
    let mut board = BoardState::new();

    for name in &file.players {
        board.add_player(name);
    }
    let player_id = |board: &BoardState, name: &str| {
        board
            .player_by_name(name)
            .ok_or_else(|| ScenarioError::UnknownPlayer(name.to_string()))
    };
    for (a, b) in &file.alliances {
        let (a, b) = (player_id(&board, a)?, player_id(&board, b)?);
        board.ally(a, b);
    }

    for spec in file.unit_types {
        let mut unit_type = UnitType::new(&spec.name, spec.domain, 0);
        unit_type.movement = spec.movement;
        unit_type.transport_cost = spec.transport_cost;
        unit_type.transport_capacity = spec.capacity;
        unit_type.air_transport = spec.air_transport;
        unit_type.air_transportable = spec.air_transportable;
        unit_type.can_not_move_during_combat_move = spec.can_not_move_during_combat_move;
        board.add_unit_type(unit_type);
    }

    for spec in &file.territories {
        if board.territory_by_name(&spec.name).is_some() {
            return Err(ScenarioError::DuplicateTerritory(spec.name.clone()));
        }
        let id = board.add_territory(&spec.name, spec.water);
        if let Some(owner) = &spec.owner {
            let owner = player_id(&board, owner)?;
            board.set_owner(id, Some(owner));
        }
        board.set_impassable(id, spec.impassable);
        if let Some(cost) = spec.entry_cost {
            board.set_entry_cost(id, cost);
        }
    }
    for spec in &file.territories {
        let from = territory_id(&board, &spec.name)?;
        for neighbor in &spec.neighbors {
            let to = territory_id(&board, neighbor)?;
            board.connect(from, to);
        }
    }

    let mut ids = Vec::with_capacity(file.units.len());
    for spec in &file.units {
        let unit_type = board
            .unit_type_by_name(&spec.unit_type)
            .ok_or_else(|| ScenarioError::UnknownUnitType(spec.unit_type.clone()))?;
        let owner = player_id(&board, &spec.owner)?;
        let territory = territory_id(&board, &spec.territory)?;
        let id = board.place_unit(unit_type, owner, territory);

        let restricted = match &spec.unload_restricted_to {
            Some(name) => Some(territory_id(&board, name)?),
            None => None,
        };
        let unit = board.unit_mut(id);
        if let Some(left) = spec.movement_left {
            unit.movement_left = left;
        }
        unit.hits = spec.hits;
        unit.unloaded_in_combat_phase = spec.unloaded_in_combat_phase;
        unit.unload_restricted_to = restricted;
        ids.push(id);
    }

    let unit_at = |index: usize| ids.get(index).copied().ok_or(ScenarioError::UnknownUnit(index));
    for (cargo_index, spec) in file.units.iter().enumerate() {
        if let Some(carrier_index) = spec.transported_by {
            let carrier = unit_at(carrier_index)?;
            if !board.load(carrier, ids[cargo_index]) {
                return Err(ScenarioError::InvalidCargo { carrier: carrier_index, cargo: cargo_index });
            }
        }
        for &dropped in &spec.unloaded {
            let dropped = unit_at(dropped)?;
            board.unit_mut(ids[cargo_index]).unloaded.push(dropped);
        }
    }

    let player = match &file.player {
        Some(name) => Some(player_id(&board, name)?),
        None => board.players().first().map(|p| p.id),
    };

    let mut prior_moves = Vec::with_capacity(file.prior_moves.len());
    for spec in &file.prior_moves {
        let units = spec
            .units
            .iter()
            .map(|&i| unit_at(i))
            .collect::<Result<Vec<UnitId>, _>>()?;
        prior_moves.push(PriorMove {
            units,
            end: territory_id(&board, &spec.end)?,
            started_battle: spec.started_battle,
        });
    }

    debug!(
        territories = board.territories().len(),
        units = board.units().len(),
        "scenario built"
    );

    Ok(Scenario { board, rules: file.rules, player, prior_moves })
}

fn territory_id(board: &BoardState, name: &str) -> Result<TerritoryId, ScenarioError> {
    board
        .territory_by_name(name)
        .ok_or_else(|| ScenarioError::UnknownTerritory(name.to_string()))
}

/// Resolves a territory as written on the wire: its name (ignoring case,
/// with `_` standing in for spaces) or its `t<n>` id.
pub fn resolve_territory(board: &BoardState, text: &str) -> Option<TerritoryId> {
    if let Some(id) = board.territory_by_name(text) {
        return Some(id);
    }
    if text.contains('_') {
        if let Some(id) = board.territory_by_name(&text.replace('_', " ")) {
            return Some(id);
        }
    }
    let index: u32 = text.strip_prefix('t')?.parse().ok()?;
    let id = TerritoryId(index);
    board.get_territory(id).map(|t| t.id)
}
