//! Land units boarding sea transports.
//!
//! The candidates are the allied transports in the sea zone at the end of
//! a load route. They are ranked in tiers (owned, allied, then incapable),
//! by ascending free capacity inside a tier, and the default assignment is
//! a first fit over that order.

use tracing::debug;

use super::{by_ascending_capacity, exact_fit, first_fit, Assignment, AssignmentError};
use crate::board::{categorize, BoardState, CategoryKeys, DependentMap, PlayerId, Route, UnitId};

/// Lowest transport cost worth considering when pruning carriers. A carrier
/// with at least this much room is always a candidate.
pub const MIN_TRANSPORT_COST_CEILING: u32 = 5;

/// Preference tier of a candidate carrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CarrierTier {
    OwnedCapable,
    AlliedCapable,
    /// Could load, but would be unable to unload afterwards.
    Incapable,
}

/// A carrier that may take part in a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarrierCandidate {
    pub unit: UnitId,
    pub tier: CarrierTier,
    pub available: u32,
}

/// The default answer to "which transports take these units".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadPlan {
    /// Every candidate, in preference order.
    pub candidates: Vec<CarrierCandidate>,
    /// Carriers used by the default assignment.
    pub default_selection: Vec<UnitId>,
    pub assignment: Assignment,
    pub uses_allied: bool,
    /// The player must confirm or override the default.
    pub needs_confirmation: bool,
}

impl LoadPlan {
    pub fn candidate_units(&self) -> Vec<UnitId> {
        self.candidates.iter().map(|c| c.unit).collect()
    }

    /// Largest number of carriers an override may select.
    pub fn selection_limit(&self, units_to_load: usize) -> usize {
        units_to_load.min(self.candidates.len())
    }

    /// The default assignment puts units on carriers that cannot unload them.
    pub fn uses_incapable(&self) -> bool {
        self.candidates
            .iter()
            .any(|c| c.tier == CarrierTier::Incapable && self.default_selection.contains(&c.unit))
    }
}

/// Smallest transport cost among the carriable `units`, capped at the ceiling.
pub fn min_transport_cost(board: &BoardState, units: &[UnitId]) -> u32 {
    units
        .iter()
        .filter_map(|&u| board.transport_cost(u))
        .fold(MIN_TRANSPORT_COST_CEILING, u32::min)
}

/// Ranked candidate transports in the sea zone at the end of `route`.
///
/// Incapable transports are listed last while no endpoint is fixed, and
/// dropped once it is.
pub fn sea_transport_candidates(
    board: &BoardState,
    route: &Route,
    player: PlayerId,
    units_to_load: &[UnitId],
    endpoint_fixed: bool,
    non_combat: bool,
) -> Vec<CarrierCandidate> {
    let zone = route.end();
    let min_cost = min_transport_cost(board, units_to_load);
    let mut candidates: Vec<CarrierCandidate> = board
        .units_in(zone)
        .iter()
        .copied()
        .filter(|&u| {
            let unit = board.unit(u);
            board.type_of(u).is_sea_transport()
                && board.is_allied(unit.owner, player)
                && board.available_capacity(u) >= min_cost
        })
        .filter_map(|u| {
            let tier = if board.transport_cannot_unload(u, zone, non_combat) {
                CarrierTier::Incapable
            } else if board.unit(u).owner == player {
                CarrierTier::OwnedCapable
            } else {
                CarrierTier::AlliedCapable
            };
            if endpoint_fixed && tier == CarrierTier::Incapable {
                return None;
            }
            Some(CarrierCandidate { unit: u, tier, available: board.available_capacity(u) })
        })
        .collect();
    // Stable: same tier and room keeps board order.
    candidates.sort_by_key(|c| (c.tier, c.available));
    candidates
}

/// Computes the default carrier assignment for a load.
///
/// Incapable carriers only receive units once the capable tiers are full.
/// Units that cannot be carried end up in the assignment's leftovers.
/// `dependents` tells carriers apart by the cargo they will hold.
pub fn plan_load(
    board: &BoardState,
    route: &Route,
    player: PlayerId,
    units_to_load: &[UnitId],
    endpoint_fixed: bool,
    non_combat: bool,
    dependents: &DependentMap,
) -> LoadPlan {
    let candidates = sea_transport_candidates(board, route, player, units_to_load, endpoint_fixed, non_combat);
    let order: Vec<UnitId> = candidates.iter().map(|c| c.unit).collect();
    let assignment = first_fit(board, units_to_load, &order);
    let default_selection = assignment.carriers_used();

    let tier_of = |u: UnitId| candidates.iter().find(|c| c.unit == u).map(|c| c.tier);
    let uses_allied = default_selection
        .iter()
        .any(|&c| tier_of(c) == Some(CarrierTier::AlliedCapable));

    let keys = CategoryKeys { movement: true, dependents: Some(dependents), ..CategoryKeys::default() };
    let single_category = categorize(board, &order, &keys).len() == 1;
    let obvious = candidates.len() == 1
        || (single_category && units_to_load.len() == 1)
        || default_selection.len() == candidates.len();
    let needs_confirmation = uses_allied || !obvious;

    debug!(
        units = units_to_load.len(),
        candidates = candidates.len(),
        used = default_selection.len(),
        unassigned = assignment.unassigned.len(),
        needs_confirmation,
        "load plan"
    );

    LoadPlan {
        candidates,
        default_selection,
        assignment,
        uses_allied,
        needs_confirmation,
    }
}

/// Checks a player's carrier override and assigns the units onto it.
///
/// The selection must come from the plan's candidates, may hold at most
/// `min(units, candidates)` carriers, and must be able to carry every unit.
pub fn validate_carrier_selection(
    board: &BoardState,
    plan: &LoadPlan,
    units_to_load: &[UnitId],
    selected: &[UnitId],
) -> Result<Assignment, AssignmentError> {
    if selected.is_empty() {
        return Err(AssignmentError::NoCarrierSelected);
    }
    let limit = plan.selection_limit(units_to_load.len());
    if selected.len() > limit {
        return Err(AssignmentError::TooManyCarriers { selected: selected.len(), limit });
    }
    if let Some(&stranger) = selected.iter().find(|c| !plan.candidates.iter().any(|k| k.unit == **c)) {
        return Err(AssignmentError::UnknownCarrier(stranger));
    }

    let needed = board.transport_cost_of(units_to_load);
    let available: u32 = selected.iter().map(|&c| board.available_capacity(c)).sum();
    let ordered = by_ascending_capacity(board, selected);
    match exact_fit(board, units_to_load, &ordered) {
        Some(assignment) if needed <= available => Ok(assignment),
        _ => Err(AssignmentError::InfeasibleSelection { needed, available }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Domain, TerritoryId, UnitType, UnitTypeId};

    struct Harbor {
        board: BoardState,
        me: PlayerId,
        friend: PlayerId,
        port: TerritoryId,
        sea: TerritoryId,
        infantry: UnitTypeId,
        transport: UnitTypeId,
    }

    fn harbor() -> Harbor {
        let mut board = BoardState::new();
        let me = board.add_player("Me");
        let friend = board.add_player("Friend");
        board.ally(me, friend);
        let port = board.add_territory("Port", false);
        let sea = board.add_territory("Sea", true);
        board.connect(port, sea);
        let infantry = board.add_unit_type(UnitType::new("infantry", Domain::Land, 1).with_transport_cost(1));
        let transport = board.add_unit_type(UnitType::new("transport", Domain::Sea, 2).with_capacity(3));
        Harbor { board, me, friend, port, sea, infantry, transport }
    }

    fn infantry(h: &mut Harbor, n: usize) -> Vec<UnitId> {
        (0..n).map(|_| h.board.place_unit(h.infantry, h.me, h.port)).collect()
    }

    fn transport(h: &mut Harbor, owner: PlayerId, capacity: u32) -> UnitId {
        let name = format!("transport{}", capacity);
        let ty = match h.board.unit_type_by_name(&name) {
            Some(ty) => ty,
            None => h.board.add_unit_type(UnitType::new(&name, Domain::Sea, 2).with_capacity(capacity)),
        };
        h.board.place_unit(ty, owner, h.sea)
    }

    #[test]
    fn single_transport_takes_everyone_without_asking() {
        let mut h = harbor();
        let inf = infantry(&mut h, 3);
        let t = h.board.place_unit(h.transport, h.me, h.sea);
        let route = Route::new(&h.board, h.port, vec![h.sea]).unwrap();

        let plan = plan_load(&h.board, &route, h.me, &inf, true, false, &DependentMap::new());
        assert!(plan.assignment.is_complete());
        assert!(inf.iter().all(|u| plan.assignment.mapping[u] == t));
        assert!(!plan.needs_confirmation);
    }

    #[test]
    fn tightest_fit_first() {
        let mut h = harbor();
        let me = h.me;
        let inf = infantry(&mut h, 3);
        let big = transport(&mut h, me, 2);
        let small = transport(&mut h, me, 1);
        let route = Route::new(&h.board, h.port, vec![h.sea]).unwrap();

        let plan = plan_load(&h.board, &route, h.me, &inf, true, false, &DependentMap::new());
        assert_eq!(plan.assignment.cargo_of(small).len(), 1);
        assert_eq!(plan.assignment.cargo_of(big).len(), 2);
        assert_eq!(plan.candidate_units(), vec![small, big]);
    }

    #[test]
    fn owned_exact_fit_beats_allied_room() {
        let mut h = harbor();
        let (me, friend) = (h.me, h.friend);
        let inf = infantry(&mut h, 2);
        let allied = transport(&mut h, friend, 4);
        let owned = transport(&mut h, me, 2);
        let route = Route::new(&h.board, h.port, vec![h.sea]).unwrap();

        let plan = plan_load(&h.board, &route, h.me, &inf, true, false, &DependentMap::new());
        assert_eq!(plan.default_selection, vec![owned]);
        assert!(!plan.uses_allied);
        assert_eq!(plan.candidates[1].unit, allied);
        assert_eq!(plan.candidates[1].tier, CarrierTier::AlliedCapable);
    }

    #[test]
    fn allied_carrier_forces_confirmation() {
        let mut h = harbor();
        let friend = h.friend;
        let inf = infantry(&mut h, 1);
        transport(&mut h, friend, 2);
        let route = Route::new(&h.board, h.port, vec![h.sea]).unwrap();
        let plan = plan_load(&h.board, &route, h.me, &inf, true, false, &DependentMap::new());
        assert!(plan.uses_allied);
        assert!(plan.needs_confirmation);
    }

    #[test]
    fn incapable_carriers_only_before_endpoint() {
        let mut h = harbor();
        let me = h.me;
        let inf = infantry(&mut h, 1);
        let stuck = transport(&mut h, me, 2);
        let elsewhere = h.board.add_territory("Elsewhere", false);
        h.board.unit_mut(stuck).unload_restricted_to = Some(elsewhere);
        let route = Route::new(&h.board, h.port, vec![h.sea]).unwrap();

        let open = sea_transport_candidates(&h.board, &route, h.me, &inf, false, false);
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].tier, CarrierTier::Incapable);
        assert!(sea_transport_candidates(&h.board, &route, h.me, &inf, true, false).is_empty());
    }

    #[test]
    fn full_and_enemy_transports_are_not_candidates() {
        let mut h = harbor();
        let me = h.me;
        let enemy = h.board.add_player("Enemy");
        let inf = infantry(&mut h, 1);
        transport(&mut h, enemy, 3);
        let full = transport(&mut h, me, 1);
        let rider = h.board.place_unit(h.infantry, h.me, h.sea);
        assert!(h.board.load(full, rider));
        let route = Route::new(&h.board, h.port, vec![h.sea]).unwrap();
        assert!(sea_transport_candidates(&h.board, &route, h.me, &inf, true, false).is_empty());
    }

    #[test]
    fn override_is_validated() {
        let mut h = harbor();
        let me = h.me;
        let inf = infantry(&mut h, 3);
        let a = transport(&mut h, me, 1);
        let b = transport(&mut h, me, 2);
        let c = transport(&mut h, me, 5);
        let route = Route::new(&h.board, h.port, vec![h.sea]).unwrap();
        let plan = plan_load(&h.board, &route, h.me, &inf, true, false, &DependentMap::new());

        let ok = validate_carrier_selection(&h.board, &plan, &inf, &[c]).unwrap();
        assert!(inf.iter().all(|u| ok.mapping[u] == c));

        assert_eq!(
            validate_carrier_selection(&h.board, &plan, &inf, &[b]),
            Err(AssignmentError::InfeasibleSelection { needed: 3, available: 2 })
        );
        assert!(validate_carrier_selection(&h.board, &plan, &inf, &[a, b]).is_ok());
        assert_eq!(
            validate_carrier_selection(&h.board, &plan, &inf[..1], &[a, b]),
            Err(AssignmentError::TooManyCarriers { selected: 2, limit: 1 })
        );
        assert_eq!(
            validate_carrier_selection(&h.board, &plan, &inf, &[inf[0]]),
            Err(AssignmentError::UnknownCarrier(inf[0]))
        );
        assert_eq!(
            validate_carrier_selection(&h.board, &plan, &inf, &[]),
            Err(AssignmentError::NoCarrierSelected)
        );
    }

    #[test]
    fn uncarriable_units_are_left_over() {
        let mut h = harbor();
        let me = h.me;
        let inf = infantry(&mut h, 1);
        let gun_ty = h.board.add_unit_type(UnitType::new("gun", Domain::Land, 1));
        let gun = h.board.place_unit(gun_ty, me, h.port);
        let t = transport(&mut h, me, 1);
        let route = Route::new(&h.board, h.port, vec![h.sea]).unwrap();

        assert_eq!(min_transport_cost(&h.board, &[gun, inf[0]]), 1);
        let plan = plan_load(&h.board, &route, h.me, &[gun, inf[0]], true, false, &DependentMap::new());
        assert_eq!(plan.assignment.mapping[&inf[0]], t);
        assert_eq!(plan.assignment.unassigned, vec![gun]);
    }

    #[test]
    fn cargo_aboard_tells_carriers_apart() {
        let mut h = harbor();
        let me = h.me;
        let inf = infantry(&mut h, 1);
        let empty = transport(&mut h, me, 3);
        let laden = transport(&mut h, me, 3);
        let route = Route::new(&h.board, h.port, vec![h.sea]).unwrap();

        let plan = plan_load(&h.board, &route, h.me, &inf, true, false, &DependentMap::new());
        assert!(!plan.needs_confirmation);

        let rider = h.board.place_unit(h.infantry, me, h.sea);
        assert!(h.board.load(laden, rider));
        let plan = plan_load(&h.board, &route, h.me, &inf, true, false, &DependentMap::new());
        assert_eq!(plan.default_selection, vec![laden]);
        assert_eq!(plan.candidate_units(), vec![laden, empty]);
        assert!(plan.needs_confirmation);
    }

    #[test]
    fn incapable_default_is_flagged() {
        let mut h = harbor();
        let me = h.me;
        let inf = infantry(&mut h, 1);
        let stuck = transport(&mut h, me, 2);
        let elsewhere = h.board.add_territory("Elsewhere", false);
        h.board.unit_mut(stuck).unload_restricted_to = Some(elsewhere);
        let route = Route::new(&h.board, h.port, vec![h.sea]).unwrap();

        let plan = plan_load(&h.board, &route, h.me, &inf, false, false, &DependentMap::new());
        assert_eq!(plan.default_selection, vec![stuck]);
        assert!(plan.uses_incapable());
    }

    #[test]
    fn min_transport_cost_is_capped() {
        let mut h = harbor();
        let inf = infantry(&mut h, 2);
        assert_eq!(min_transport_cost(&h.board, &inf), 1);
        assert_eq!(min_transport_cost(&h.board, &[]), MIN_TRANSPORT_COST_CEILING);
    }
}
