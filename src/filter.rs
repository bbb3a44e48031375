//! Movable-unit filter.
//!
//! Given a route and a candidate unit set, decides which units may legally
//! walk the route this turn and adds the units that must travel with them.
//! Pure: the same inputs always give the same result.

use rust_decimal::Decimal;

use crate::board::{must_move_with, BoardState, DependentMap, PlayerId, Route, TerritoryId, UnitId, UnitTypeId};

/// Kind of move being planned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MoveType {
    #[default]
    Default,
    /// Airborne move: air-transportable units ride aircraft and spend no
    /// movement of their own.
    Special,
}

/// A move already committed earlier this turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorMove {
    pub units: Vec<UnitId>,
    pub end: TerritoryId,
    /// The move ended in a territory where it started a battle.
    pub started_battle: bool,
}

/// Everything about the current move that affects legality.
#[derive(Debug, Clone, Copy)]
pub struct MoveContext<'a> {
    pub player: PlayerId,
    pub non_combat: bool,
    pub edit_mode: bool,
    pub selectable_zero_movement_units: bool,
    pub move_type: MoveType,
    pub prior_moves: &'a [PriorMove],
    pub dependents: &'a DependentMap,
}

/// How many of the requested units can move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterStatus {
    NoUnitsCanMove,
    SomeUnitsCanMove,
    AllUnitsCanMove,
}

/// Outcome of filtering a unit set against a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterResult {
    pub status: FilterStatus,
    /// Passing units followed by the dependents they bring along.
    pub units: Vec<UnitId>,
    pub message: Option<String>,
}

impl MoveContext<'_> {
    fn committed_to_battle(&self, unit: UnitId) -> bool {
        !self.non_combat
            && self
                .prior_moves
                .iter()
                .any(|m| m.started_battle && m.units.contains(&unit))
    }
}

/// The per-unit legality predicate.
///
/// With `route == None` only the route-independent checks apply, which is
/// what selecting units before a destination is known needs. A non-empty
/// `like` restricts candidates to the unit types present in it, and in edit
/// mode to the owner of its first unit.
pub fn can_move(
    board: &BoardState,
    unit: UnitId,
    route: Option<&Route>,
    ctx: &MoveContext<'_>,
    like: &[UnitId],
) -> bool {
    let u = board.unit(unit);
    let ty = board.type_of(unit);

    if ctx.edit_mode {
        if let Some(&first) = like.first() {
            if board.unit(first).owner != u.owner {
                return false;
            }
        }
    } else {
        if u.owner != ctx.player {
            return false;
        }
        if u.movement_left <= Decimal::ZERO && !ctx.selectable_zero_movement_units {
            return false;
        }
    }

    // Cargo already at sea may still go ashore during combat.
    let unloading = u.is_transported() && route.map_or(true, Route::is_unload);
    if !ctx.non_combat && ty.can_not_move_during_combat_move && !unloading {
        return false;
    }
    if ctx.committed_to_battle(unit) {
        return false;
    }

    if !like.is_empty() {
        let types: Vec<UnitTypeId> = like.iter().map(|&l| board.unit(l).unit_type).collect();
        if !types.contains(&u.unit_type) {
            return false;
        }
    }

    let route = match route {
        Some(r) => r,
        None => return true,
    };

    if !ctx.edit_mode {
        let rides = (route.is_unload() && ty.is_land())
            || (ctx.move_type == MoveType::Special && ty.air_transportable);
        if !rides && u.movement_left < route.movement_cost(board, ty) {
            return false;
        }
    }
    if route.is_end_water() && !route.is_load() && ty.is_land() {
        return false;
    }
    if !route.is_end_water() && ty.is_sea() {
        return false;
    }
    true
}

/// Partitions `units` against `route` and adds their dependents.
pub fn filter_movable(
    board: &BoardState,
    units: &[UnitId],
    route: &Route,
    ctx: &MoveContext<'_>,
) -> FilterResult {
    let mut passing: Vec<UnitId> = units
        .iter()
        .copied()
        .filter(|&u| can_move(board, u, Some(route), ctx, &[]))
        .collect();

    let carriers = passing.clone();
    for carrier in carriers {
        for dep in must_move_with(board, carrier, ctx.dependents) {
            if !passing.contains(&dep) {
                passing.push(dep);
            }
        }
    }

    let moving = units.iter().filter(|u| passing.contains(u)).count();
    let destination = &board.territory(route.end()).name;
    let (status, message) = if moving == 0 {
        (
            FilterStatus::NoUnitsCanMove,
            Some(format!("No selected units can move to {}", destination)),
        )
    } else if moving < units.len() {
        (
            FilterStatus::SomeUnitsCanMove,
            Some(format!(
                "{} of {} selected units cannot move to {}",
                units.len() - moving,
                units.len(),
                destination
            )),
        )
    } else {
        (FilterStatus::AllUnitsCanMove, None)
    };

    FilterResult { status, units: passing, message }
}

/// Units in `territory` that pass `can_move` for `route`, in board order.
pub fn movable_in(
    board: &BoardState,
    territory: TerritoryId,
    route: Option<&Route>,
    ctx: &MoveContext<'_>,
    like: &[UnitId],
) -> Vec<UnitId> {
    board
        .units_in(territory)
        .iter()
        .copied()
        .filter(|&u| can_move(board, u, route, ctx, like))
        .collect()
}
