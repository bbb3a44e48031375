//! Cargo going ashore.
//!
//! The player names cargo to unload; the question is which transports give
//! it up. A transport is only emptied when at least one of its units is
//! actually wanted, so transports carrying none of the requested kinds keep
//! their cargo.

use super::by_ascending_capacity;
use crate::board::{categorize, same_kind, BoardState, CategoryKeys, DependentMap, Route, UnitId};

/// What an unload will do by default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnloadPlan {
    /// Capable transports carrying requested kinds, by ascending free capacity.
    pub transports: Vec<UnitId>,
    /// Transports emptied by the default choice.
    pub default_transports: Vec<UnitId>,
    /// Cargo unloaded under the default choice.
    pub units: Vec<UnitId>,
    /// The transports differ, so the player should pick which to empty.
    pub needs_choice: bool,
}

/// Works out the default unload for `requested` cargo along `route`.
///
/// `candidates` are the unloadable units in the start zone that match the
/// requested types. When every candidate was requested they all go ashore.
pub fn plan_unload(
    board: &BoardState,
    route: &Route,
    requested: &[UnitId],
    candidates: &[UnitId],
    non_combat: bool,
    dependents: &DependentMap,
) -> UnloadPlan {
    if requested.len() == candidates.len() {
        return UnloadPlan {
            transports: Vec::new(),
            default_transports: Vec::new(),
            units: requested.to_vec(),
            needs_choice: false,
        };
    }

    let carrying: Vec<UnitId> = board
        .units_in(route.start())
        .iter()
        .copied()
        .filter(|&t| {
            board.type_of(t).is_sea_transport()
                && board
                    .unit(t)
                    .transporting
                    .iter()
                    .any(|&cargo| candidates.iter().any(|&c| same_kind(board, cargo, c)))
                && !board.transport_cannot_unload(t, route.end(), non_combat)
        })
        .collect();
    if carrying.is_empty() {
        return UnloadPlan {
            transports: Vec::new(),
            default_transports: Vec::new(),
            units: Vec::new(),
            needs_choice: false,
        };
    }

    let transports = by_ascending_capacity(board, &carrying);
    let keys = CategoryKeys { movement: true, transport_cost: false, dependents: Some(dependents) };
    let needs_choice = transports.len() > 1 && categorize(board, &transports, &keys).len() > 1;

    let default_transports = if needs_choice {
        find_min_transports_to_unload(board, requested, &transports)
    } else {
        transports.clone()
    };
    let units = choose_units_to_unload(board, requested, candidates, &default_transports);

    UnloadPlan { transports, default_transports, units, needs_choice }
}

/// Pairs requested units with transports, one per transport per pass, and
/// returns the transports that gave up at least one unit.
pub fn find_min_transports_to_unload(
    board: &BoardState,
    requested: &[UnitId],
    transports: &[UnitId],
) -> Vec<UnitId> {
    let (matched, _) = match_passes(board, requested, transports);
    by_ascending_capacity(board, transports)
        .into_iter()
        .filter(|t| matched.contains(t))
        .collect()
}

/// True when every transport in `selected` is needed: each one gives up a
/// requested unit before the matching runs dry.
pub fn is_feasible_unload_selection(board: &BoardState, requested: &[UnitId], selected: &[UnitId]) -> bool {
    let transports: Vec<UnitId> = selected
        .iter()
        .copied()
        .filter(|&t| board.type_of(t).is_sea_transport())
        .collect();
    let (_, unmatched) = match_passes(board, requested, &transports);
    unmatched.is_empty()
}

/// Repeated passes over transports in ascending free capacity. Each pass
/// takes at most one requested unit per transport; a transport leaves the
/// pool once it has matched. Returns the matched and unmatched transports.
fn match_passes(board: &BoardState, requested: &[UnitId], transports: &[UnitId]) -> (Vec<UnitId>, Vec<UnitId>) {
    let mut pool = by_ascending_capacity(board, transports);
    let mut wanted: Vec<UnitId> = requested.to_vec();
    let mut matched = Vec::new();

    loop {
        let mut changed = false;
        let mut i = 0;
        while i < pool.len() {
            let transport = pool[i];
            let cargo = &board.unit(transport).transporting;
            let hit = wanted
                .iter()
                .position(|&w| cargo.iter().any(|&c| same_kind(board, c, w)));
            match hit {
                Some(w) => {
                    wanted.remove(w);
                    matched.push(pool.remove(i));
                    changed = true;
                }
                None => i += 1,
            }
        }
        if !changed || wanted.is_empty() {
            break;
        }
    }
    (matched, pool)
}

/// Picks the concrete cargo to unload from `transports`.
///
/// First one matching unit from each transport in ascending free capacity,
/// then the remaining requests from whatever matching cargo is left.
pub fn choose_units_to_unload(
    board: &BoardState,
    requested: &[UnitId],
    candidates: &[UnitId],
    transports: &[UnitId],
) -> Vec<UnitId> {
    let sorted = by_ascending_capacity(board, transports);
    let mut pool: Vec<UnitId> = sorted
        .iter()
        .flat_map(|&t| board.unit(t).transporting.iter().copied())
        .filter(|u| candidates.contains(u))
        .collect();
    let mut wanted: Vec<UnitId> = requested.to_vec();
    let mut chosen = Vec::new();

    for &transport in &sorted {
        let aboard = &board.unit(transport).transporting;
        let pick = wanted.iter().enumerate().find_map(|(wi, &w)| {
            aboard
                .iter()
                .copied()
                .find(|&c| pool.contains(&c) && same_kind(board, c, w))
                .map(|c| (wi, c))
        });
        if let Some((wi, cargo)) = pick {
            wanted.remove(wi);
            pool.retain(|&p| p != cargo);
            chosen.push(cargo);
        }
    }

    for w in wanted {
        if let Some(pos) = pool.iter().position(|&c| same_kind(board, c, w)) {
            chosen.push(pool.remove(pos));
        }
    }
    chosen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Domain, PlayerId, TerritoryId, UnitType, UnitTypeId};

    struct Beach {
        board: BoardState,
        me: PlayerId,
        sea: TerritoryId,
        shore: TerritoryId,
        infantry: UnitTypeId,
        artillery: UnitTypeId,
        transport: UnitTypeId,
    }

    fn beach() -> Beach {
        let mut board = BoardState::new();
        let me = board.add_player("Me");
        let sea = board.add_territory("Sea", true);
        let shore = board.add_territory("Shore", false);
        board.connect(sea, shore);
        let infantry = board.add_unit_type(UnitType::new("infantry", Domain::Land, 1).with_transport_cost(1));
        let artillery = board.add_unit_type(UnitType::new("artillery", Domain::Land, 1).with_transport_cost(1));
        let transport = board.add_unit_type(UnitType::new("transport", Domain::Sea, 2).with_capacity(3));
        Beach { board, me, sea, shore, infantry, artillery, transport }
    }

    fn loaded(b: &mut Beach, cargo: &[&str]) -> (UnitId, Vec<UnitId>) {
        let t = b.board.place_unit(b.transport, b.me, b.sea);
        let units: Vec<UnitId> = cargo
            .iter()
            .map(|&name| {
                let ty = if name == "artillery" { b.artillery } else { b.infantry };
                let u = b.board.place_unit(ty, b.me, b.sea);
                b.board.load(t, u);
                u
            })
            .collect();
        (t, units)
    }

    #[test]
    fn requesting_every_candidate_unloads_them_all() {
        let mut b = beach();
        let (_, cargo) = loaded(&mut b, &["infantry", "infantry", "artillery"]);
        let route = Route::new(&b.board, b.sea, vec![b.shore]).unwrap();
        let art = [cargo[2]];
        // Only the artillery matches the requested type.
        let plan = plan_unload(&b.board, &route, &art, &art, false, &DependentMap::new());
        assert_eq!(plan.units, vec![cargo[2]]);
        assert!(!plan.needs_choice);
    }

    #[test]
    fn partial_request_picks_one_transport() {
        let mut b = beach();
        let (t1, c1) = loaded(&mut b, &["infantry", "infantry"]);
        let (t2, c2) = loaded(&mut b, &["infantry", "artillery"]);
        let route = Route::new(&b.board, b.sea, vec![b.shore]).unwrap();
        let candidates = [c1[0], c1[1], c2[0]];

        let plan = plan_unload(&b.board, &route, &[c2[0]], &candidates, false, &DependentMap::new());
        // Transports carry different cargo, so the player is asked.
        assert!(plan.needs_choice);
        assert_eq!(plan.transports.len(), 2);
        assert_eq!(plan.default_transports.len(), 1);
        assert_eq!(plan.units.len(), 1);
        assert!(plan.default_transports[0] == t1 || plan.default_transports[0] == t2);
    }

    #[test]
    fn restricted_transports_are_skipped() {
        let mut b = beach();
        let (t1, c1) = loaded(&mut b, &["infantry"]);
        let (_, c2) = loaded(&mut b, &["infantry"]);
        let other = b.board.add_territory("Other", false);
        b.board.unit_mut(t1).unload_restricted_to = Some(other);
        let route = Route::new(&b.board, b.sea, vec![b.shore]).unwrap();
        let candidates = [c1[0], c2[0]];

        let plan = plan_unload(&b.board, &route, &[c1[0]], &candidates, false, &DependentMap::new());
        assert!(!plan.needs_choice);
        // The equivalent unit on the capable transport goes instead.
        assert_eq!(plan.units, vec![c2[0]]);
    }

    #[test]
    fn choose_substitutes_same_kind() {
        let mut b = beach();
        let (t1, c1) = loaded(&mut b, &["infantry", "infantry"]);
        let (_, c2) = loaded(&mut b, &["infantry"]);
        let candidates = [c1[0], c1[1], c2[0]];
        // Asking for the unit on the other transport, but only t1 is chosen.
        let chosen = choose_units_to_unload(&b.board, &[c2[0]], &candidates, &[t1]);
        assert_eq!(chosen, vec![c1[0]]);
    }

    #[test]
    fn choose_takes_one_per_transport_first() {
        let mut b = beach();
        let (t1, c1) = loaded(&mut b, &["infantry", "infantry"]);
        let (t2, c2) = loaded(&mut b, &["infantry", "infantry"]);
        let candidates = [c1[0], c1[1], c2[0], c2[1]];
        let chosen = choose_units_to_unload(&b.board, &[c1[0], c1[1]], &candidates, &[t1, t2]);
        assert_eq!(chosen, vec![c1[0], c2[0]]);
    }

    #[test]
    fn feasibility_requires_every_transport_to_contribute() {
        let mut b = beach();
        let (t1, c1) = loaded(&mut b, &["infantry"]);
        let (t2, _) = loaded(&mut b, &["artillery"]);
        let (t3, c3) = loaded(&mut b, &["infantry"]);

        assert!(is_feasible_unload_selection(&b.board, &[c1[0]], &[t1]));
        assert!(is_feasible_unload_selection(&b.board, &[c1[0], c3[0]], &[t1, t3]));
        // t2 carries no infantry, so selecting it is pointless.
        assert!(!is_feasible_unload_selection(&b.board, &[c1[0]], &[t1, t2]));
        // Two transports for one unit: one of them is left over.
        assert!(!is_feasible_unload_selection(&b.board, &[c1[0]], &[t1, t3]));
    }

    #[test]
    fn min_transports_leaves_unwanted_cargo_aboard() {
        let mut b = beach();
        let (t1, _) = loaded(&mut b, &["infantry", "infantry"]);
        let (t2, c2) = loaded(&mut b, &["artillery"]);
        let chosen = find_min_transports_to_unload(&b.board, &[c2[0]], &[t1, t2]);
        assert_eq!(chosen, vec![t2]);
    }
}
