//! Unit categories: grouping interchangeable units.
//!
//! Two units are in the same category when a player could not tell them
//! apart for the purpose of a choice: same type, owner and damage, and
//! optionally the same movement left, transport cost and cargo.

use indexmap::IndexMap;
use rust_decimal::Decimal;

use super::dependents::DependentMap;
use super::player::PlayerId;
use super::state::BoardState;
use super::unit::{UnitId, UnitTypeId};

/// The identity of a group of interchangeable units.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnitCategory {
    pub unit_type: UnitTypeId,
    pub owner: PlayerId,
    pub hits: u32,
    pub movement: Option<Decimal>,
    pub transport_cost: Option<u32>,
    /// Sorted types of the cargo travelling with the unit.
    pub dependents: Option<Vec<UnitTypeId>>,
}

/// Which optional fields take part in the comparison.
#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryKeys<'a> {
    pub movement: bool,
    pub transport_cost: bool,
    pub dependents: Option<&'a DependentMap>,
}

/// A category and its members, in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryGroup {
    pub category: UnitCategory,
    pub units: Vec<UnitId>,
}

impl UnitCategory {
    /// Computes the category of one unit.
    pub fn of(board: &BoardState, unit: UnitId, keys: &CategoryKeys<'_>) -> UnitCategory {
        let u = board.unit(unit);
        let dependents = keys.dependents.map(|map| {
            let mut types: Vec<UnitTypeId> = u
                .transporting
                .iter()
                .chain(map.cargo_of(unit))
                .map(|&c| board.unit(c).unit_type)
                .collect();
            types.sort();
            types
        });
        UnitCategory {
            unit_type: u.unit_type,
            owner: u.owner,
            hits: u.hits,
            movement: keys.movement.then_some(u.movement_left),
            transport_cost: if keys.transport_cost {
                board.type_of(unit).transport_cost
            } else {
                None
            },
            dependents,
        }
    }
}

/// Groups `units` into categories, preserving first-appearance order.
pub fn categorize(board: &BoardState, units: &[UnitId], keys: &CategoryKeys<'_>) -> Vec<CategoryGroup> {
    let mut groups: IndexMap<UnitCategory, Vec<UnitId>> = IndexMap::new();
    for &unit in units {
        groups
            .entry(UnitCategory::of(board, unit, keys))
            .or_default()
            .push(unit);
    }
    groups
        .into_iter()
        .map(|(category, units)| CategoryGroup { category, units })
        .collect()
}

/// True if every unit falls into a single category (vacuously true when empty).
pub fn all_same_category(board: &BoardState, units: &[UnitId], keys: &CategoryKeys<'_>) -> bool {
    categorize(board, units, keys).len() <= 1
}

/// Type, owner and damage match. The comparison used when pairing cargo
/// aboard a carrier with a requested unit.
pub fn same_kind(board: &BoardState, a: UnitId, b: UnitId) -> bool {
    let (ua, ub) = (board.unit(a), board.unit(b));
    ua.unit_type == ub.unit_type && ua.owner == ub.owner && ua.hits == ub.hits
}
