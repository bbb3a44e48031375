//! Unit types and unit instances.
//!
//! A `UnitType` holds the static rules data shared by every unit of that
//! type (domain, base movement, transport cost and capacity). A `Unit` is a
//! single piece on the board: its owner, location, remaining movement and
//! cargo bookkeeping.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::player::PlayerId;
use super::territory::TerritoryId;

/// Stable index of a unit in the board arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(pub u32);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "u{}", self.0)
    }
}

impl UnitId {
    /// Parses the `u<n>` notation used by the line protocol. A bare number is accepted too.
    pub fn parse(s: &str) -> Option<UnitId> {
        let digits = s.strip_prefix('u').unwrap_or(s);
        digits.parse::<u32>().ok().map(UnitId)
    }
}

/// Stable index of a unit type in the board arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitTypeId(pub u16);

/// The movement domain of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Land,
    Sea,
    Air,
}

impl Domain {
    /// Parses a domain from its lowercase name.
    pub fn from_name(s: &str) -> Option<Domain> {
        match s {
            "land" => Some(Domain::Land),
            "sea" => Some(Domain::Sea),
            "air" => Some(Domain::Air),
            _ => None,
        }
    }
}

/// Rules data shared by every unit of a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitType {
    pub name: String,
    pub domain: Domain,
    /// Movement allowance at the start of a turn.
    pub movement: Decimal,
    /// Capacity this unit consumes aboard a carrier. `None` means it cannot be carried.
    pub transport_cost: Option<u32>,
    /// Cargo capacity. `None` means the unit is not a carrier.
    pub transport_capacity: Option<u32>,
    /// Carries air-transportable units (paratroopers) instead of sea cargo.
    pub air_transport: bool,
    pub air_transportable: bool,
    pub can_not_move_during_combat_move: bool,
}

impl UnitType {
    /// Creates a plain unit type with no transport abilities.
    pub fn new(name: &str, domain: Domain, movement: u32) -> Self {
        UnitType {
            name: name.to_string(),
            domain,
            movement: Decimal::from(movement),
            transport_cost: None,
            transport_capacity: None,
            air_transport: false,
            air_transportable: false,
            can_not_move_during_combat_move: false,
        }
    }

    /// Sets the capacity this type consumes aboard a carrier.
    pub fn with_transport_cost(mut self, cost: u32) -> Self {
        self.transport_cost = Some(cost);
        self
    }

    /// Sets the cargo capacity of this type.
    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.transport_capacity = Some(capacity);
        self
    }

    /// Marks this type as an air transport.
    pub fn with_air_transport(mut self) -> Self {
        self.air_transport = true;
        self
    }

    /// Marks this type as loadable onto air transports.
    pub fn with_air_transportable(mut self) -> Self {
        self.air_transportable = true;
        self
    }

    /// Marks this type as unable to move during combat movement.
    pub fn immobile_in_combat(mut self) -> Self {
        self.can_not_move_during_combat_move = true;
        self
    }

    pub fn is_land(&self) -> bool {
        self.domain == Domain::Land
    }

    pub fn is_sea(&self) -> bool {
        self.domain == Domain::Sea
    }

    pub fn is_air(&self) -> bool {
        self.domain == Domain::Air
    }

    /// A sea unit with cargo capacity for land units.
    pub fn is_sea_transport(&self) -> bool {
        self.is_sea() && !self.air_transport && self.transport_capacity.is_some()
    }

    /// An air unit that can carry air-transportable units.
    pub fn is_air_transport(&self) -> bool {
        self.is_air() && self.air_transport
    }
}

/// A single unit on the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    pub id: UnitId,
    pub unit_type: UnitTypeId,
    pub owner: PlayerId,
    pub territory: TerritoryId,
    pub movement_left: Decimal,
    pub hits: u32,
    /// Cargo currently aboard, in load order.
    pub transporting: Vec<UnitId>,
    /// Cargo already dropped off this turn; still counts against capacity.
    pub unloaded: Vec<UnitId>,
    pub transported_by: Option<UnitId>,
    pub unloaded_in_combat_phase: bool,
    /// Set once a carrier has unloaded somewhere it is not allowed to leave this turn.
    pub unload_restricted_to: Option<TerritoryId>,
}

impl Unit {
    /// Creates a fresh unit with its full movement allowance.
    pub fn new(
        id: UnitId,
        unit_type: UnitTypeId,
        owner: PlayerId,
        territory: TerritoryId,
        movement: Decimal,
    ) -> Self {
        Unit {
            id,
            unit_type,
            owner,
            territory,
            movement_left: movement,
            hits: 0,
            transporting: Vec::new(),
            unloaded: Vec::new(),
            transported_by: None,
            unloaded_in_combat_phase: false,
            unload_restricted_to: None,
        }
    }

    pub fn is_transported(&self) -> bool {
        self.transported_by.is_some()
    }
}
