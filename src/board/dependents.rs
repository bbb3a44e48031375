//! The dependent map: cargo provisionally riding a carrier for the move
//! being built.
//!
//! Keyed by carrier id and holding cargo ids, so carriers and cargo never
//! reference each other directly. Cargo already aboard from an earlier move
//! lives on the `Unit` itself, not here.

use indexmap::IndexMap;

use super::state::BoardState;
use super::territory::TerritoryId;
use super::unit::UnitId;

/// Carrier id to the ordered cargo it is carrying for this move.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependentMap {
    entries: IndexMap<UnitId, Vec<UnitId>>,
}

impl DependentMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `cargo` riding `carrier`. Cargo moves from any previous carrier.
    pub fn add(&mut self, carrier: UnitId, cargo: UnitId) {
        self.remove_cargo(cargo);
        let list = self.entries.entry(carrier).or_default();
        list.push(cargo);
    }

    /// Replaces the cargo list of `carrier`. An empty list drops the entry.
    pub fn set(&mut self, carrier: UnitId, cargo: Vec<UnitId>) {
        if cargo.is_empty() {
            self.entries.shift_remove(&carrier);
        } else {
            self.entries.insert(carrier, cargo);
        }
    }

    /// Cargo currently recorded under `carrier`.
    pub fn cargo_of(&self, carrier: UnitId) -> &[UnitId] {
        self.entries.get(&carrier).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The carrier `cargo` is recorded under, if any.
    pub fn carrier_of(&self, cargo: UnitId) -> Option<UnitId> {
        self.entries
            .iter()
            .find(|(_, list)| list.contains(&cargo))
            .map(|(&carrier, _)| carrier)
    }

    /// True if `unit` appears as a carrier or as cargo.
    pub fn references(&self, unit: UnitId) -> bool {
        self.entries.contains_key(&unit) || self.carrier_of(unit).is_some()
    }

    pub fn is_cargo(&self, unit: UnitId) -> bool {
        self.carrier_of(unit).is_some()
    }

    fn remove_cargo(&mut self, cargo: UnitId) {
        for list in self.entries.values_mut() {
            list.retain(|&c| c != cargo);
        }
        self.entries.retain(|_, list| !list.is_empty());
    }

    /// Drops every reference to `unit`, as carrier or as cargo.
    pub fn remove_unit(&mut self, unit: UnitId) {
        self.entries.shift_remove(&unit);
        self.remove_cargo(unit);
    }

    /// Keeps only carriers for which `keep` returns true.
    pub fn retain_carriers(&mut self, mut keep: impl FnMut(UnitId) -> bool) {
        self.entries.retain(|&carrier, _| keep(carrier));
    }

    /// True if every carrier and every cargo unit is in `selection`.
    pub fn is_consistent_with(&self, selection: &[UnitId]) -> bool {
        self.entries.iter().all(|(carrier, cargo)| {
            selection.contains(carrier) && cargo.iter().all(|c| selection.contains(c))
        })
    }

    /// The first carrier or cargo unit missing from `selection`.
    pub fn first_stray(&self, selection: &[UnitId]) -> Option<UnitId> {
        self.entries
            .iter()
            .flat_map(|(carrier, cargo)| std::iter::once(carrier).chain(cargo))
            .copied()
            .find(|u| !selection.contains(u))
    }

    /// All cargo across every carrier.
    pub fn all_cargo(&self) -> Vec<UnitId> {
        self.entries.values().flatten().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (UnitId, &[UnitId])> {
        self.entries.iter().map(|(&k, v)| (k, v.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Units that must travel with `unit`: cargo already aboard
/// it plus anything the dependent map puts on it.
pub fn must_move_with(board: &BoardState, unit: UnitId, dependents: &DependentMap) -> Vec<UnitId> {
    let mut out: Vec<UnitId> = board.unit(unit).transporting.clone();
    for &cargo in dependents.cargo_of(unit) {
        if !out.contains(&cargo) {
            out.push(cargo);
        }
    }
    out
}

/// Every unit in `territory` with its carried units, keyed by carrier.
/// Carriers with nothing aboard are left out.
pub fn dependents_in(
    board: &BoardState,
    territory: TerritoryId,
    dependents: &DependentMap,
) -> IndexMap<UnitId, Vec<UnitId>> {
    board
        .units_in(territory)
        .iter()
        .filter_map(|&u| {
            let carried = must_move_with(board, u, dependents);
            (!carried.is_empty()).then_some((u, carried))
        })
        .collect()
}
