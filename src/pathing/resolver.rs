//! Route resolution for a stack of units.
//!
//! `best_route` picks one legal path between two territories for a given
//! unit set; `resolve_route` strings best routes together through the
//! player's forced waypoints.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::debug;

use super::policy::PassThroughPolicy;
use super::search::find_route;
use crate::board::{step_cost, BoardState, PlayerId, Route, TerritoryId, UnitId};
use crate::config::RulesOptions;

/// The unit set and move context a route is resolved for.
#[derive(Debug, Clone, Copy)]
pub struct RouteRequest<'a> {
    pub player: PlayerId,
    pub units: &'a [UnitId],
    pub non_combat: bool,
    /// Airborne moves skip the neutral flyover check and never force a
    /// land-only or water-only route.
    pub skip_airborne_check: bool,
}

/// Extra restriction layered on the hard constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Terrain {
    Any,
    LandOnly,
    WaterOnly,
}

/// Soft preference on the territories a route passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Preference {
    NoEnemyUnitsNotEnemyOwned,
    NoEnemyUnits,
}

#[derive(Debug, Clone, Copy, Default)]
struct Composition {
    land: bool,
    sea: bool,
    air: bool,
}

/// Resolves routes against one board snapshot.
#[derive(Debug)]
pub struct RouteResolver<'a> {
    board: &'a BoardState,
    options: &'a RulesOptions,
    policy: &'a dyn PassThroughPolicy,
}

impl<'a> RouteResolver<'a> {
    pub fn new(
        board: &'a BoardState,
        options: &'a RulesOptions,
        policy: &'a dyn PassThroughPolicy,
    ) -> Self {
        Self { board, options, policy }
    }

    /// Resolver using the pass-through rule named in `options`.
    pub fn with_configured_policy(board: &'a BoardState, options: &'a RulesOptions) -> Self {
        Self::new(board, options, options.pass_through.policy())
    }

    /// Resolves a route through `waypoints` in order, then to `end`.
    ///
    /// When a leg cannot be resolved or joined, the route through the last
    /// reachable waypoint is returned instead. With no waypoints this is
    /// `best_route`.
    pub fn resolve_route(
        &self,
        start: TerritoryId,
        end: TerritoryId,
        request: &RouteRequest<'_>,
        waypoints: &[TerritoryId],
    ) -> Option<Route> {
        if waypoints.is_empty() {
            return self.best_route(start, end, request);
        }

        let mut total = Route::at(self.board, start);
        for &target in waypoints.iter().chain(std::iter::once(&end)) {
            let leg = self.best_route(total.end(), target, request);
            match leg.and_then(|leg| total.join(&leg)) {
                Some(joined) => total = joined,
                None => {
                    debug!(
                        at = %self.board.territory(total.end()).name,
                        target = %self.board.territory(target).name,
                        "waypoint unreachable, keeping prefix"
                    );
                    return Some(total);
                }
            }
        }
        Some(total)
    }

    /// Finds the preferred legal route between two territories for the
    /// request's units, or `None` if there is none.
    pub fn best_route(
        &self,
        start: TerritoryId,
        end: TerritoryId,
        request: &RouteRequest<'_>,
    ) -> Option<Route> {
        if start == end {
            return Some(Route::at(self.board, start));
        }
        let mix = self.composition(request.units);

        let mut route = self.search(start, end, request, mix, Terrain::Any, None)?;
        let mut terrain = Terrain::Any;
        let force = !request.skip_airborne_check;

        let start_land = self.board.territory(start).is_land();
        let end_land = self.board.territory(end).is_land();
        if start_land && end_land {
            if let Some(land) = self.search(start, end, request, mix, Terrain::LandOnly, None) {
                let free_land_unit = request.units.iter().any(|&u| {
                    self.board.type_of(u).is_land() && !self.board.unit(u).is_transported()
                });
                if land.number_of_steps() <= route.number_of_steps() || (force && free_land_unit) {
                    route = land;
                    terrain = Terrain::LandOnly;
                }
            }
        } else if !start_land && !end_land {
            if let Some(water) = self.search(start, end, request, mix, Terrain::WaterOnly, None) {
                if water.number_of_steps() <= route.number_of_steps() || (force && mix.sea) {
                    route = water;
                    terrain = Terrain::WaterOnly;
                }
            }
        }

        let max_steps = if request.non_combat {
            route.number_of_steps().max(self.max_land_movement(request.units))
        } else {
            route.number_of_steps()
        };
        for pref in [Preference::NoEnemyUnitsNotEnemyOwned, Preference::NoEnemyUnits] {
            if let Some(preferred) = self.search(start, end, request, mix, terrain, Some(pref)) {
                if preferred.number_of_steps() <= max_steps {
                    return Some(preferred);
                }
            }
        }
        Some(route)
    }

    fn composition(&self, units: &[UnitId]) -> Composition {
        let mut mix = Composition::default();
        for &u in units {
            let ty = self.board.type_of(u);
            mix.land |= ty.is_land();
            mix.sea |= ty.is_sea();
            mix.air |= ty.is_air();
        }
        mix
    }

    /// Largest base movement among land units, in whole steps.
    fn max_land_movement(&self, units: &[UnitId]) -> usize {
        units
            .iter()
            .map(|&u| self.board.type_of(u))
            .filter(|ty| ty.is_land())
            .map(|ty| ty.movement.trunc().to_usize().unwrap_or(0))
            .max()
            .unwrap_or(0)
    }

    fn search(
        &self,
        start: TerritoryId,
        end: TerritoryId,
        request: &RouteRequest<'_>,
        mix: Composition,
        terrain: Terrain,
        pref: Option<Preference>,
    ) -> Option<Route> {
        let board = self.board;
        let can_enter = |from: TerritoryId, to: TerritoryId| {
            self.can_enter(start, end, from, to, request, mix)
                && match terrain {
                    Terrain::Any => true,
                    Terrain::LandOnly => board.territory(to).is_land(),
                    Terrain::WaterOnly => board.territory(to).water,
                }
                && (to == end || self.preferred(to, request.player, pref))
        };
        let cost = |to: TerritoryId| {
            request
                .units
                .iter()
                .map(|&u| step_cost(board, board.type_of(u), to))
                .max()
                .unwrap_or(board.territory(to).entry_cost)
        };
        find_route(board, start, end, can_enter, cost)
    }

    fn preferred(&self, t: TerritoryId, player: PlayerId, pref: Option<Preference>) -> bool {
        match pref {
            None => true,
            Some(Preference::NoEnemyUnits) => !self.board.has_enemy_units(t, player),
            Some(Preference::NoEnemyUnitsNotEnemyOwned) => {
                !self.board.has_enemy_units(t, player) && !self.board.is_enemy_owned(t, player)
            }
        }
    }

    /// Hard constraints on one edge of a route.
    fn can_enter(
        &self,
        start: TerritoryId,
        end: TerritoryId,
        from: TerritoryId,
        to: TerritoryId,
        request: &RouteRequest<'_>,
        mix: Composition,
    ) -> bool {
        let target = self.board.territory(to);
        if target.impassable {
            return false;
        }

        // Domain legality.
        if mix.sea && !target.water {
            return false;
        }
        if mix.land && !mix.sea {
            let from_water = self.board.territory(from).water;
            let boarding = target.water && to == end && from == start && !from_water;
            let landing = !target.water && from_water && from == start;
            let walking = !target.water && !from_water;
            if !(boarding || landing || walking) {
                return false;
            }
        }

        if target.is_neutral() {
            if self.options.neutrals_impassable {
                return false;
            }
            if mix.air && !request.skip_airborne_check && !self.options.neutral_flyover_allowed {
                return false;
            }
        }

        to == end || self.policy.can_pass_through(self.board, request.player, to, request.units)
    }
}

/// Movement the most constrained unit spends on `route`.
pub fn max_movement_cost(board: &BoardState, route: &Route, units: &[UnitId]) -> Decimal {
    units
        .iter()
        .map(|&u| route.movement_cost(board, board.type_of(u)))
        .max()
        .unwrap_or(Decimal::ZERO)
}
