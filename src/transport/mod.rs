//! Transport assignment: putting units on carriers.
//!
//! Three problems share the machinery here: land units boarding sea
//! transports (`load`), cargo going ashore (`unload`) and paratroopers
//! boarding air transports (`air`). The default assignment is a greedy
//! first fit; user overrides are checked with an exact search.

pub mod air;
pub mod load;
pub mod unload;

use std::collections::BTreeMap;

use indexmap::IndexMap;

use crate::board::{BoardState, Route, UnitId};

pub use air::{air_transport_dependents, air_transportable_units, air_transports_to_load, AirLoadPlan};
pub use load::{plan_load, sea_transport_candidates, validate_carrier_selection, CarrierTier, LoadPlan};
pub use unload::{
    choose_units_to_unload, find_min_transports_to_unload, is_feasible_unload_selection, plan_unload,
    UnloadPlan,
};

/// Errors from assigning units to carriers.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum AssignmentError {
    #[error("selected carriers cannot carry the units: need {needed}, have {available}")]
    InfeasibleSelection { needed: u32, available: u32 },

    #[error("too many carriers selected: {selected} (at most {limit})")]
    TooManyCarriers { selected: usize, limit: usize },

    #[error("{0} is not a candidate carrier")]
    UnknownCarrier(UnitId),

    #[error("no carrier selected")]
    NoCarrierSelected,

    #[error("{0} cannot be carried")]
    NotTransportable(UnitId),
}

/// A unit to carrier mapping plus the units left over.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignment {
    pub mapping: IndexMap<UnitId, UnitId>,
    pub unassigned: Vec<UnitId>,
}

impl Assignment {
    /// True when every unit found a carrier.
    pub fn is_complete(&self) -> bool {
        self.unassigned.is_empty()
    }

    /// Carriers that received at least one unit, in first-use order.
    pub fn carriers_used(&self) -> Vec<UnitId> {
        let mut used = Vec::new();
        for &carrier in self.mapping.values() {
            if !used.contains(&carrier) {
                used.push(carrier);
            }
        }
        used
    }

    /// Units placed on `carrier`, in assignment order.
    pub fn cargo_of(&self, carrier: UnitId) -> Vec<UnitId> {
        self.mapping
            .iter()
            .filter(|(_, &c)| c == carrier)
            .map(|(&u, _)| u)
            .collect()
    }
}

/// Units sorted by descending transport cost; equal costs keep their order.
fn by_descending_cost(board: &BoardState, units: &[UnitId]) -> Vec<UnitId> {
    let mut sorted = units.to_vec();
    sorted.sort_by_key(|&u| std::cmp::Reverse(board.transport_cost(u)));
    sorted
}

/// Carriers sorted by ascending available capacity; ties keep their order.
pub fn by_ascending_capacity(board: &BoardState, carriers: &[UnitId]) -> Vec<UnitId> {
    let mut sorted = carriers.to_vec();
    sorted.sort_by_key(|&c| board.available_capacity(c));
    sorted
}

/// Greedy first fit: each unit, largest first, goes to the first carrier in
/// `carriers` order with room left. Carrier order is the caller's preference.
/// Units that cannot be carried stay unassigned.
pub fn first_fit(board: &BoardState, units: &[UnitId], carriers: &[UnitId]) -> Assignment {
    let mut room: Vec<u32> = carriers.iter().map(|&c| board.available_capacity(c)).collect();
    let mut assignment = Assignment::default();
    for unit in by_descending_cost(board, units) {
        let cost = match board.transport_cost(unit) {
            Some(cost) => cost,
            None => {
                assignment.unassigned.push(unit);
                continue;
            }
        };
        match room.iter().position(|&r| r >= cost) {
            Some(i) => {
                room[i] -= cost;
                assignment.mapping.insert(unit, carriers[i]);
            }
            None => assignment.unassigned.push(unit),
        }
    }
    assignment
}

/// Finds a complete assignment of `units` onto `carriers` if one exists.
///
/// Tries first fit, then a backtracking search over the carriers. The
/// number of units in one move is small, so the search stays cheap.
pub fn exact_fit(board: &BoardState, units: &[UnitId], carriers: &[UnitId]) -> Option<Assignment> {
    let greedy = first_fit(board, units, carriers);
    if greedy.is_complete() {
        return Some(greedy);
    }

    let ordered = by_descending_cost(board, units);
    let costs: Vec<u32> = ordered
        .iter()
        .map(|&u| board.transport_cost(u))
        .collect::<Option<_>>()?;
    let mut room: Vec<u32> = carriers.iter().map(|&c| board.available_capacity(c)).collect();
    let mut slots = vec![0usize; ordered.len()];
    if !place(&costs, 0, &mut room, &mut slots) {
        return None;
    }
    let mapping = ordered
        .iter()
        .zip(&slots)
        .map(|(&u, &i)| (u, carriers[i]))
        .collect();
    Some(Assignment { mapping, unassigned: Vec::new() })
}

fn place(costs: &[u32], next: usize, room: &mut [u32], slots: &mut [usize]) -> bool {
    if next == costs.len() {
        return true;
    }
    let cost = costs[next];
    for i in 0..room.len() {
        // Carriers with identical room left are interchangeable.
        if room[..i].contains(&room[i]) || room[i] < cost {
            continue;
        }
        room[i] -= cost;
        slots[next] = i;
        if place(costs, next + 1, room, slots) {
            return true;
        }
        room[i] += cost;
    }
    false
}

/// The final land unit to sea transport map for a move description.
///
/// On a load route the planned assignment decides; otherwise cargo keeps
/// the carrier it is already aboard.
pub fn map_transports(
    board: &BoardState,
    units: &[UnitId],
    route: &Route,
    planned: &Assignment,
) -> BTreeMap<UnitId, UnitId> {
    let mut out = BTreeMap::new();
    for &unit in units {
        if !board.type_of(unit).is_land() {
            continue;
        }
        let carrier = if route.is_load() {
            planned.mapping.get(&unit).copied()
        } else {
            None
        };
        if let Some(c) = carrier.or(board.unit(unit).transported_by) {
            out.insert(unit, c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Domain, PlayerId, TerritoryId, UnitType};

    fn board_with(capacities: &[u32], costs: &[u32]) -> (BoardState, Vec<UnitId>, Vec<UnitId>, TerritoryId) {
        let mut board = BoardState::new();
        let p: PlayerId = board.add_player("Me");
        let sea = board.add_territory("Sea", true);
        let mut carriers = Vec::new();
        for (i, &cap) in capacities.iter().enumerate() {
            let ty = board.add_unit_type(UnitType::new(&format!("carrier{}", i), Domain::Sea, 2).with_capacity(cap));
            carriers.push(board.place_unit(ty, p, sea));
        }
        let mut units = Vec::new();
        for (i, &cost) in costs.iter().enumerate() {
            let ty = board.add_unit_type(UnitType::new(&format!("cargo{}", i), Domain::Land, 1).with_transport_cost(cost));
            units.push(board.place_unit(ty, p, sea));
        }
        (board, carriers, units, sea)
    }

    #[test]
    fn first_fit_places_large_units_first() {
        let (board, carriers, units, _) = board_with(&[2, 3], &[1, 3, 1]);
        let a = first_fit(&board, &units, &carriers);
        assert!(a.is_complete());
        assert_eq!(a.mapping[&units[1]], carriers[1]);
        assert_eq!(a.cargo_of(carriers[0]), vec![units[0], units[2]]);
    }

    #[test]
    fn first_fit_reports_leftovers() {
        let (board, carriers, units, _) = board_with(&[2], &[2, 1]);
        let a = first_fit(&board, &units, &carriers);
        assert_eq!(a.unassigned, vec![units[1]]);
        assert_eq!(a.carriers_used(), vec![carriers[0]]);
    }

    #[test]
    fn exact_fit_finds_what_greedy_misses() {
        // First fit strands the last 2; 5+3+2 / 4+4+2 works.
        let (board, carriers, units, _) = board_with(&[10, 10], &[5, 4, 4, 3, 2, 2]);
        assert!(!first_fit(&board, &units, &carriers).is_complete());
        let exact = exact_fit(&board, &units, &carriers).unwrap();
        assert!(exact.is_complete());
        for &c in &carriers {
            let load = board.transport_cost_of(&exact.cargo_of(c));
            assert!(load <= board.available_capacity(c));
        }
    }

    #[test]
    fn exact_fit_rejects_impossible() {
        let (board, carriers, units, _) = board_with(&[2, 2], &[3]);
        assert!(exact_fit(&board, &units, &carriers).is_none());
    }

    #[test]
    fn uncarriable_units_never_board() {
        let (mut board, carriers, mut units, sea) = board_with(&[4], &[1]);
        let p = board.unit(units[0]).owner;
        let gun = board.add_unit_type(UnitType::new("gun", Domain::Land, 1));
        units.push(board.place_unit(gun, p, sea));

        let a = first_fit(&board, &units, &carriers);
        assert_eq!(a.mapping.len(), 1);
        assert_eq!(a.unassigned, vec![units[1]]);
        assert!(exact_fit(&board, &units, &carriers).is_none());
    }

    #[test]
    fn by_ascending_capacity_is_stable() {
        let (board, carriers, _, _) = board_with(&[3, 1, 3, 2], &[]);
        let sorted = by_ascending_capacity(&board, &carriers);
        assert_eq!(sorted, vec![carriers[1], carriers[3], carriers[0], carriers[2]]);
    }
}
