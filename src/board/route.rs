//! Routes: an ordered walk over adjacent territories.
//!
//! A `Route` is built fresh on every recomputation and never mutated in
//! place. It remembers whether its first and last territories are water so
//! the load/unload predicates do not need the board.

use rust_decimal::Decimal;
use serde::Serialize;

use super::state::BoardState;
use super::territory::TerritoryId;
use super::unit::UnitType;

/// A start territory followed by zero or more steps.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Route {
    start: TerritoryId,
    steps: Vec<TerritoryId>,
    #[serde(skip)]
    start_water: bool,
    #[serde(skip)]
    end_water: bool,
}

impl Route {
    /// A zero-length route sitting on `start`.
    pub fn at(board: &BoardState, start: TerritoryId) -> Route {
        let water = board.territory(start).water;
        Route {
            start,
            steps: Vec::new(),
            start_water: water,
            end_water: water,
        }
    }

    /// Builds a route from a start and its steps.
    ///
    /// Returns `None` if consecutive territories are not adjacent or any
    /// territory appears twice.
    pub fn new(board: &BoardState, start: TerritoryId, steps: Vec<TerritoryId>) -> Option<Route> {
        let mut prev = start;
        let mut seen = vec![start];
        for &step in &steps {
            if !board.territory(prev).is_adjacent(step) || seen.contains(&step) {
                return None;
            }
            seen.push(step);
            prev = step;
        }
        Some(Route {
            start,
            start_water: board.territory(start).water,
            end_water: board.territory(prev).water,
            steps,
        })
    }

    /// Appends `other` to this route.
    ///
    /// Returns `None` when `other` does not start where this route ends, or
    /// the joined walk would visit a territory twice.
    pub fn join(&self, other: &Route) -> Option<Route> {
        if other.start != self.end() {
            return None;
        }
        let mut visited: Vec<TerritoryId> = self.all_territories();
        for &step in &other.steps {
            if visited.contains(&step) {
                return None;
            }
            visited.push(step);
        }
        let mut steps = self.steps.clone();
        steps.extend_from_slice(&other.steps);
        Some(Route {
            start: self.start,
            steps,
            start_water: self.start_water,
            end_water: other.end_water,
        })
    }

    pub fn start(&self) -> TerritoryId {
        self.start
    }

    pub fn end(&self) -> TerritoryId {
        self.steps.last().copied().unwrap_or(self.start)
    }

    pub fn steps(&self) -> &[TerritoryId] {
        &self.steps
    }

    /// Start followed by every step.
    pub fn all_territories(&self) -> Vec<TerritoryId> {
        let mut all = Vec::with_capacity(self.steps.len() + 1);
        all.push(self.start);
        all.extend_from_slice(&self.steps);
        all
    }

    /// Steps strictly between start and end.
    pub fn middle_steps(&self) -> &[TerritoryId] {
        match self.steps.len() {
            0 => &[],
            n => &self.steps[..n - 1],
        }
    }

    pub fn number_of_steps(&self) -> usize {
        self.steps.len()
    }

    pub fn has_steps(&self) -> bool {
        !self.steps.is_empty()
    }

    pub fn has_no_steps(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn is_start_water(&self) -> bool {
        self.start_water
    }

    pub fn is_end_water(&self) -> bool {
        self.end_water
    }

    /// Land start, water end: land units are boarding carriers.
    pub fn is_load(&self) -> bool {
        self.has_steps() && !self.start_water && self.end_water
    }

    /// Water start, land end: cargo is going ashore.
    pub fn is_unload(&self) -> bool {
        self.has_steps() && self.start_water && !self.end_water
    }

    /// Movement a unit of `unit_type` spends walking this route.
    pub fn movement_cost(&self, board: &BoardState, unit_type: &UnitType) -> Decimal {
        self.steps
            .iter()
            .map(|&t| step_cost(board, unit_type, t))
            .sum()
    }
}

/// Movement spent by a unit of `unit_type` entering `territory`. Aircraft
/// ignore terrain and always pay one.
pub fn step_cost(board: &BoardState, unit_type: &UnitType, territory: TerritoryId) -> Decimal {
    if unit_type.is_air() {
        Decimal::ONE
    } else {
        board.territory(territory).entry_cost
    }
}
