//! Paratroopers boarding air transports.
//!
//! Only unmoved air transports in the selection can take cargo, and only
//! unmoved air-transportable units of the moving player can board. The
//! pairing uses the same first fit as sea loading.

use super::{by_ascending_capacity, first_fit, Assignment};
use crate::board::{BoardState, DependentMap, PlayerId, TerritoryId, UnitId};

/// Air transports and the units that could board them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AirLoadPlan {
    pub transports: Vec<UnitId>,
    pub candidates: Vec<UnitId>,
}

impl AirLoadPlan {
    /// Gathers the loadable transports from `selection` and the boarding
    /// candidates in `territory`. Empty when either side is empty.
    pub fn gather(
        board: &BoardState,
        selection: &[UnitId],
        territory: TerritoryId,
        player: PlayerId,
        dependents: &DependentMap,
    ) -> AirLoadPlan {
        let transports = air_transports_to_load(board, selection);
        if transports.is_empty() {
            return AirLoadPlan::default();
        }
        let candidates = air_transportable_units(board, territory, player, dependents);
        if candidates.is_empty() {
            return AirLoadPlan::default();
        }
        AirLoadPlan { transports, candidates }
    }

    pub fn is_empty(&self) -> bool {
        self.transports.is_empty() || self.candidates.is_empty()
    }
}

/// Unmoved air transports in `selection` with room to spare.
pub fn air_transports_to_load(board: &BoardState, selection: &[UnitId]) -> Vec<UnitId> {
    selection
        .iter()
        .copied()
        .filter(|&u| {
            board.type_of(u).is_air_transport() && !board.has_moved(u) && board.available_capacity(u) > 0
        })
        .collect()
}

/// Unmoved air-transportable units of `player` in `territory` that are not
/// already riding something.
pub fn air_transportable_units(
    board: &BoardState,
    territory: TerritoryId,
    player: PlayerId,
    dependents: &DependentMap,
) -> Vec<UnitId> {
    board
        .units_in(territory)
        .iter()
        .copied()
        .filter(|&u| {
            let unit = board.unit(u);
            unit.owner == player
                && board.type_of(u).air_transportable
                && board.is_transportable(u)
                && !board.has_moved(u)
                && !unit.is_transported()
                && !dependents.is_cargo(u)
        })
        .collect()
}

/// Maps `units` onto `transports`. Transports too small for even the
/// cheapest unit are skipped; the rest fill tightest first.
pub fn air_transport_dependents(board: &BoardState, transports: &[UnitId], units: &[UnitId]) -> Assignment {
    let min_cost = units.iter().filter_map(|&u| board.transport_cost(u)).min().unwrap_or(0);
    let usable: Vec<UnitId> = transports
        .iter()
        .copied()
        .filter(|&t| board.available_capacity(t) >= min_cost)
        .collect();
    first_fit(board, units, &by_ascending_capacity(board, &usable))
}
