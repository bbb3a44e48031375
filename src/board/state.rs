//! Board state: the arena that owns every territory, unit and player.
//!
//! All cross references are stable ids indexing into the arena vectors, so
//! carriers and cargo point at each other by `UnitId` instead of holding
//! references. The move engine only ever reads a `BoardState`; committing a
//! move is somebody else's job.

use rust_decimal::Decimal;

use super::player::{Alliances, Player, PlayerId};
use super::territory::{Territory, TerritoryId};
use super::unit::{Unit, UnitId, UnitType, UnitTypeId};

/// Complete board snapshot used by the move engine.
#[derive(Debug, Clone, Default)]
pub struct BoardState {
    territories: Vec<Territory>,
    units: Vec<Unit>,
    unit_types: Vec<UnitType>,
    players: Vec<Player>,
    alliances: Alliances,
}

impl BoardState {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    // ---------------------------------------------------------------------
    // Construction
    // ---------------------------------------------------------------------

    /// Registers a player and returns its id.
    pub fn add_player(&mut self, name: &str) -> PlayerId {
        let id = PlayerId(self.players.len() as u16);
        self.players.push(Player { id, name: name.to_string() });
        id
    }

    /// Records an alliance between two players.
    pub fn ally(&mut self, a: PlayerId, b: PlayerId) {
        self.alliances.ally(a, b);
    }

    /// Registers a unit type and returns its id.
    pub fn add_unit_type(&mut self, unit_type: UnitType) -> UnitTypeId {
        let id = UnitTypeId(self.unit_types.len() as u16);
        self.unit_types.push(unit_type);
        id
    }

    /// Adds a land territory (`water == false`) or sea zone and returns its id.
    pub fn add_territory(&mut self, name: &str, water: bool) -> TerritoryId {
        let id = TerritoryId(self.territories.len() as u32);
        self.territories.push(Territory::new(id, name, water));
        id
    }

    /// Connects two territories in both directions. Duplicate edges are ignored.
    pub fn connect(&mut self, a: TerritoryId, b: TerritoryId) {
        if a == b {
            return;
        }
        if !self.territories[a.0 as usize].neighbors.contains(&b) {
            self.territories[a.0 as usize].neighbors.push(b);
        }
        if !self.territories[b.0 as usize].neighbors.contains(&a) {
            self.territories[b.0 as usize].neighbors.push(a);
        }
    }

    pub fn set_owner(&mut self, territory: TerritoryId, owner: Option<PlayerId>) {
        self.territories[territory.0 as usize].owner = owner;
    }

    pub fn set_impassable(&mut self, territory: TerritoryId, impassable: bool) {
        self.territories[territory.0 as usize].impassable = impassable;
    }

    pub fn set_entry_cost(&mut self, territory: TerritoryId, cost: Decimal) {
        self.territories[territory.0 as usize].entry_cost = cost;
    }

    /// Places a new unit with its full movement allowance and returns its id.
    pub fn place_unit(
        &mut self,
        unit_type: UnitTypeId,
        owner: PlayerId,
        territory: TerritoryId,
    ) -> UnitId {
        let id = UnitId(self.units.len() as u32);
        let movement = self.unit_types[unit_type.0 as usize].movement;
        self.units.push(Unit::new(id, unit_type, owner, territory, movement));
        self.territories[territory.0 as usize].units.push(id);
        id
    }

    /// Puts `cargo` aboard `carrier`. Both must share a territory and the cargo
    /// must not already be aboard something. Returns false if rejected.
    pub fn load(&mut self, carrier: UnitId, cargo: UnitId) -> bool {
        if carrier == cargo {
            return false;
        }
        let same_place = self.unit(carrier).territory == self.unit(cargo).territory;
        if !same_place || self.unit(cargo).is_transported() {
            return false;
        }
        self.units[carrier.0 as usize].transporting.push(cargo);
        self.units[cargo.0 as usize].transported_by = Some(carrier);
        true
    }

    /// Mutable access for scenario setup (movement spent, hits, unload history).
    pub fn unit_mut(&mut self, id: UnitId) -> &mut Unit {
        &mut self.units[id.0 as usize]
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    /// Returns the unit with the given id. Ids always come from this board.
    pub fn unit(&self, id: UnitId) -> &Unit {
        &self.units[id.0 as usize]
    }

    pub fn get_unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(id.0 as usize)
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn unit_type(&self, id: UnitTypeId) -> &UnitType {
        &self.unit_types[id.0 as usize]
    }

    /// The rules data for a unit.
    pub fn type_of(&self, unit: UnitId) -> &UnitType {
        self.unit_type(self.unit(unit).unit_type)
    }

    pub fn unit_type_by_name(&self, name: &str) -> Option<UnitTypeId> {
        self.unit_types
            .iter()
            .position(|t| t.name == name)
            .map(|i| UnitTypeId(i as u16))
    }

    pub fn territory(&self, id: TerritoryId) -> &Territory {
        &self.territories[id.0 as usize]
    }

    pub fn get_territory(&self, id: TerritoryId) -> Option<&Territory> {
        self.territories.get(id.0 as usize)
    }

    pub fn territories(&self) -> &[Territory] {
        &self.territories
    }

    /// Looks a territory up by name, ignoring ASCII case.
    pub fn territory_by_name(&self, name: &str) -> Option<TerritoryId> {
        self.territories
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
            .map(|t| t.id)
    }

    /// Units located in a territory, in placement order.
    pub fn units_in(&self, territory: TerritoryId) -> &[UnitId] {
        &self.territory(territory).units
    }

    pub fn player(&self, id: PlayerId) -> &Player {
        &self.players[id.0 as usize]
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Looks a player up by name, ignoring ASCII case.
    pub fn player_by_name(&self, name: &str) -> Option<PlayerId> {
        self.players
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .map(|p| p.id)
    }

    pub fn is_allied(&self, a: PlayerId, b: PlayerId) -> bool {
        self.alliances.is_allied(a, b)
    }

    // ---------------------------------------------------------------------
    // Rules helpers
    // ---------------------------------------------------------------------

    /// True once the unit has spent any of its movement this turn.
    pub fn has_moved(&self, unit: UnitId) -> bool {
        self.unit(unit).movement_left < self.type_of(unit).movement
    }

    /// Capacity a unit consumes aboard a carrier, `None` if it cannot be carried.
    pub fn transport_cost(&self, unit: UnitId) -> Option<u32> {
        self.type_of(unit).transport_cost
    }

    pub fn is_transportable(&self, unit: UnitId) -> bool {
        self.transport_cost(unit).is_some()
    }

    /// Total carrier capacity consumed by a group of units. Units that cannot
    /// be carried add nothing.
    pub fn transport_cost_of(&self, units: &[UnitId]) -> u32 {
        units.iter().filter_map(|&u| self.transport_cost(u)).sum()
    }

    /// Capacity still free on a carrier, counting cargo aboard and cargo already
    /// unloaded this turn. Zero for non-carriers.
    pub fn available_capacity(&self, carrier: UnitId) -> u32 {
        let capacity = match self.type_of(carrier).transport_capacity {
            Some(c) => c,
            None => return 0,
        };
        let unit = self.unit(carrier);
        let used = self.transport_cost_of(&unit.transporting);
        let unloaded = self.transport_cost_of(&unit.unloaded);
        capacity.saturating_sub(used + unloaded)
    }

    /// True if a carrier may not unload into `territory` this phase: it already
    /// unloaded during combat and this is non-combat movement, or its unloading
    /// is restricted to a different territory.
    pub fn transport_cannot_unload(
        &self,
        carrier: UnitId,
        territory: TerritoryId,
        non_combat: bool,
    ) -> bool {
        let unit = self.unit(carrier);
        if non_combat
            && unit
                .unloaded
                .iter()
                .any(|&u| self.unit(u).unloaded_in_combat_phase)
        {
            return true;
        }
        matches!(unit.unload_restricted_to, Some(t) if t != territory)
    }

    /// True if the territory holds any unit not allied with `player`.
    pub fn has_enemy_units(&self, territory: TerritoryId, player: PlayerId) -> bool {
        self.units_in(territory)
            .iter()
            .any(|&u| !self.is_allied(self.unit(u).owner, player))
    }

    /// True if the territory is owned by a player not allied with `player`.
    pub fn is_enemy_owned(&self, territory: TerritoryId, player: PlayerId) -> bool {
        match self.territory(territory).owner {
            Some(owner) => !self.is_allied(owner, player),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::unit::Domain;

    fn two_zone_board() -> (BoardState, PlayerId, TerritoryId, TerritoryId) {
        let mut board = BoardState::new();
        let p = board.add_player("Germans");
        let land = board.add_territory("Kiel", false);
        let sea = board.add_territory("Baltic", true);
        board.connect(land, sea);
        (board, p, land, sea)
    }

    #[test]
    fn connect_is_symmetric_and_deduplicated() {
        let (mut board, _, land, sea) = two_zone_board();
        board.connect(sea, land);
        assert_eq!(board.territory(land).neighbors, vec![sea]);
        assert_eq!(board.territory(sea).neighbors, vec![land]);
    }

    #[test]
    fn place_unit_records_location_and_full_movement() {
        let (mut board, p, land, _) = two_zone_board();
        let inf = board.add_unit_type(UnitType::new("infantry", Domain::Land, 1));
        let u = board.place_unit(inf, p, land);
        assert_eq!(board.units_in(land), &[u]);
        assert_eq!(board.unit(u).movement_left, Decimal::ONE);
        assert!(!board.has_moved(u));

        board.unit_mut(u).movement_left = Decimal::ZERO;
        assert!(board.has_moved(u));
    }

    #[test]
    fn available_capacity_counts_cargo_and_unloaded() {
        let (mut board, p, _, sea) = two_zone_board();
        let transport = board.add_unit_type(UnitType::new("transport", Domain::Sea, 2).with_capacity(3));
        let inf = board.add_unit_type(UnitType::new("infantry", Domain::Land, 1).with_transport_cost(1));
        let t = board.place_unit(transport, p, sea);
        let a = board.place_unit(inf, p, sea);
        let b = board.place_unit(inf, p, sea);

        assert_eq!(board.available_capacity(t), 3);
        assert!(board.load(t, a));
        assert_eq!(board.available_capacity(t), 2);
        board.unit_mut(t).unloaded.push(b);
        assert_eq!(board.available_capacity(t), 1);
    }

    #[test]
    fn load_rejects_cargo_elsewhere_or_already_aboard() {
        let (mut board, p, land, sea) = two_zone_board();
        let transport = board.add_unit_type(UnitType::new("transport", Domain::Sea, 2).with_capacity(2));
        let inf = board.add_unit_type(UnitType::new("infantry", Domain::Land, 1).with_transport_cost(1));
        let t1 = board.place_unit(transport, p, sea);
        let t2 = board.place_unit(transport, p, sea);
        let ashore = board.place_unit(inf, p, land);
        let aboard = board.place_unit(inf, p, sea);

        assert!(!board.load(t1, ashore));
        assert!(board.load(t1, aboard));
        assert!(!board.load(t2, aboard));
    }

    #[test]
    fn transport_cannot_unload_rules() {
        let (mut board, p, land, sea) = two_zone_board();
        let other = board.add_territory("Denmark", false);
        let transport = board.add_unit_type(UnitType::new("transport", Domain::Sea, 2).with_capacity(2));
        let inf = board.add_unit_type(UnitType::new("infantry", Domain::Land, 1).with_transport_cost(1));
        let t = board.place_unit(transport, p, sea);
        let dropped = board.place_unit(inf, p, land);

        assert!(!board.transport_cannot_unload(t, land, false));

        board.unit_mut(t).unload_restricted_to = Some(land);
        assert!(!board.transport_cannot_unload(t, land, false));
        assert!(board.transport_cannot_unload(t, other, false));

        board.unit_mut(t).unload_restricted_to = None;
        board.unit_mut(t).unloaded.push(dropped);
        board.unit_mut(dropped).unloaded_in_combat_phase = true;
        assert!(!board.transport_cannot_unload(t, land, false));
        assert!(board.transport_cannot_unload(t, land, true));
    }

    #[test]
    fn enemy_queries_respect_alliances() {
        let (mut board, p, land, _) = two_zone_board();
        let ally = board.add_player("Italians");
        let enemy = board.add_player("Russians");
        board.ally(p, ally);
        let inf = board.add_unit_type(UnitType::new("infantry", Domain::Land, 1));

        board.set_owner(land, Some(ally));
        board.place_unit(inf, ally, land);
        assert!(!board.is_enemy_owned(land, p));
        assert!(!board.has_enemy_units(land, p));

        board.place_unit(inf, enemy, land);
        assert!(board.has_enemy_units(land, p));
        board.set_owner(land, Some(enemy));
        assert!(board.is_enemy_owned(land, p));
    }

    #[test]
    fn lookups_by_name() {
        let (mut board, p, land, _) = two_zone_board();
        let inf = board.add_unit_type(UnitType::new("infantry", Domain::Land, 1));
        assert_eq!(board.territory_by_name("kiel"), Some(land));
        assert_eq!(board.player_by_name("GERMANS"), Some(p));
        assert_eq!(board.unit_type_by_name("infantry"), Some(inf));
        assert_eq!(board.territory_by_name("atlantis"), None);
    }
}
