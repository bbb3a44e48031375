//! Pass-through legality for territories holding hostile forces.
//!
//! Rule editions disagree on when a moving stack may continue past a
//! hostile territory, so the resolver takes the rule as a trait object.
//! The end of a route is never subject to the policy: moving into a hostile
//! territory is always a legal way to stop.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::board::{BoardState, PlayerId, TerritoryId, UnitId};

/// Decides whether `units` may move through `territory` and keep going.
pub trait PassThroughPolicy: fmt::Debug {
    fn can_pass_through(
        &self,
        board: &BoardState,
        player: PlayerId,
        territory: TerritoryId,
        units: &[UnitId],
    ) -> bool;
}

fn all_air(board: &BoardState, units: &[UnitId]) -> bool {
    units.iter().all(|&u| board.type_of(u).is_air())
}

/// Hostile territories may only be the last step. Aircraft fly over.
#[derive(Debug, Clone, Copy, Default)]
pub struct StopAtHostile;

impl PassThroughPolicy for StopAtHostile {
    fn can_pass_through(
        &self,
        board: &BoardState,
        player: PlayerId,
        territory: TerritoryId,
        units: &[UnitId],
    ) -> bool {
        all_air(board, units)
            || (!board.has_enemy_units(territory, player) && !board.is_enemy_owned(territory, player))
    }
}

/// Enemy-owned territory may be crossed when it holds no enemy units.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blitz;

impl PassThroughPolicy for Blitz {
    fn can_pass_through(
        &self,
        board: &BoardState,
        player: PlayerId,
        territory: TerritoryId,
        units: &[UnitId],
    ) -> bool {
        all_air(board, units) || !board.has_enemy_units(territory, player)
    }
}

/// No hostile restriction at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct FreePassage;

impl PassThroughPolicy for FreePassage {
    fn can_pass_through(&self, _: &BoardState, _: PlayerId, _: TerritoryId, _: &[UnitId]) -> bool {
        true
    }
}

/// Configurable choice among the built-in policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassThroughRule {
    #[default]
    StopAtHostile,
    Blitz,
    FreePassage,
}

impl PassThroughRule {
    /// Parses a rule name, ignoring case and underscores.
    pub fn from_name(s: &str) -> Option<PassThroughRule> {
        match s.to_ascii_lowercase().replace('_', "").as_str() {
            "stopathostile" => Some(PassThroughRule::StopAtHostile),
            "blitz" => Some(PassThroughRule::Blitz),
            "freepassage" => Some(PassThroughRule::FreePassage),
            _ => None,
        }
    }

    /// The policy object implementing this rule.
    pub fn policy(self) -> &'static dyn PassThroughPolicy {
        match self {
            PassThroughRule::StopAtHostile => &StopAtHostile,
            PassThroughRule::Blitz => &Blitz,
            PassThroughRule::FreePassage => &FreePassage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Domain, UnitType};

    struct Fixture {
        board: BoardState,
        me: PlayerId,
        owned_empty: TerritoryId,
        occupied: TerritoryId,
        tank: UnitId,
        plane: UnitId,
    }

    fn fixture() -> Fixture {
        let mut board = BoardState::new();
        let me = board.add_player("Me");
        let enemy = board.add_player("Enemy");
        let home = board.add_territory("Home", false);
        let owned_empty = board.add_territory("Empty", false);
        let occupied = board.add_territory("Fort", false);
        board.set_owner(home, Some(me));
        board.set_owner(owned_empty, Some(enemy));
        board.set_owner(occupied, Some(enemy));
        let armour = board.add_unit_type(UnitType::new("armour", Domain::Land, 2));
        let fighter = board.add_unit_type(UnitType::new("fighter", Domain::Air, 4));
        board.place_unit(armour, enemy, occupied);
        let tank = board.place_unit(armour, me, home);
        let plane = board.place_unit(fighter, me, home);
        Fixture { board, me, owned_empty, occupied, tank, plane }
    }

    #[test]
    fn stop_at_hostile_blocks_enemy_territory_for_ground_units() {
        let f = fixture();
        let p = StopAtHostile;
        assert!(!p.can_pass_through(&f.board, f.me, f.owned_empty, &[f.tank]));
        assert!(!p.can_pass_through(&f.board, f.me, f.occupied, &[f.tank]));
        assert!(p.can_pass_through(&f.board, f.me, f.occupied, &[f.plane]));
        assert!(!p.can_pass_through(&f.board, f.me, f.occupied, &[f.plane, f.tank]));
    }

    #[test]
    fn blitz_allows_empty_enemy_territory() {
        let f = fixture();
        let p = Blitz;
        assert!(p.can_pass_through(&f.board, f.me, f.owned_empty, &[f.tank]));
        assert!(!p.can_pass_through(&f.board, f.me, f.occupied, &[f.tank]));
    }

    #[test]
    fn free_passage_allows_everything() {
        let f = fixture();
        assert!(FreePassage.can_pass_through(&f.board, f.me, f.occupied, &[f.tank]));
    }

    #[test]
    fn rule_names() {
        assert_eq!(PassThroughRule::from_name("Stop_At_Hostile"), Some(PassThroughRule::StopAtHostile));
        assert_eq!(PassThroughRule::from_name("FREEPASSAGE"), Some(PassThroughRule::FreePassage));
        assert_eq!(PassThroughRule::from_name("wander"), None);
    }
}
