//! Territories: land regions and sea zones.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::player::PlayerId;
use super::unit::UnitId;

/// Stable index of a territory in the board arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TerritoryId(pub u32);

impl fmt::Display for TerritoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// A land region or sea zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Territory {
    pub id: TerritoryId,
    pub name: String,
    pub water: bool,
    /// `None` for sea zones and neutral land.
    pub owner: Option<PlayerId>,
    pub neighbors: Vec<TerritoryId>,
    pub impassable: bool,
    /// Movement spent by a unit entering this territory.
    pub entry_cost: Decimal,
    /// Units present, in placement order.
    pub units: Vec<UnitId>,
}

impl Territory {
    /// Creates an unowned, passable territory with an entry cost of one.
    pub fn new(id: TerritoryId, name: &str, water: bool) -> Self {
        Territory {
            id,
            name: name.to_string(),
            water,
            owner: None,
            neighbors: Vec::new(),
            impassable: false,
            entry_cost: Decimal::ONE,
            units: Vec::new(),
        }
    }

    pub fn is_land(&self) -> bool {
        !self.water
    }

    /// Land that nobody owns.
    pub fn is_neutral(&self) -> bool {
        !self.water && self.owner.is_none()
    }

    pub fn is_adjacent(&self, other: TerritoryId) -> bool {
        self.neighbors.contains(&other)
    }
}
