//! Memo for the most recently resolved route.
//!
//! Hovering over the same territory repeatedly asks for the same route, so
//! the last answer is kept under its full input key. Any mutation of the
//! selection or the waypoints invalidates it; a miss just resolves again.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::board::{Route, TerritoryId, UnitId};

/// Everything a resolved route depends on besides the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteKey {
    pub start: TerritoryId,
    pub end: TerritoryId,
    pub units: u64,
    pub waypoints: Vec<TerritoryId>,
}

impl RouteKey {
    pub fn new(start: TerritoryId, end: TerritoryId, units: &[UnitId], waypoints: &[TerritoryId]) -> Self {
        Self {
            start,
            end,
            units: unit_set_hash(units),
            waypoints: waypoints.to_vec(),
        }
    }
}

/// Order-independent hash of a unit set.
pub fn unit_set_hash(units: &[UnitId]) -> u64 {
    let mut sorted = units.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    let mut hasher = DefaultHasher::new();
    sorted.hash(&mut hasher);
    hasher.finish()
}

/// Single-entry route memo.
#[derive(Debug, Clone, Default)]
pub struct RouteCache {
    last: Option<(RouteKey, Option<Route>)>,
    hits: u64,
}

impl RouteCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the memoized route for `key`, resolving with `resolve` on a miss.
    pub fn get_or_resolve(&mut self, key: RouteKey, resolve: impl FnOnce() -> Option<Route>) -> Option<Route> {
        if let Some((cached_key, route)) = &self.last {
            if *cached_key == key {
                self.hits += 1;
                return route.clone();
            }
        }
        let route = resolve();
        self.last = Some((key, route.clone()));
        route
    }

    pub fn invalidate(&mut self) {
        self.last = None;
    }

    pub fn is_empty(&self) -> bool {
        self.last.is_none()
    }

    /// Key of the memoized route, if any.
    pub fn last_key(&self) -> Option<&RouteKey> {
        self.last.as_ref().map(|(key, _)| key)
    }

    /// Lookups answered from the memo since creation.
    pub fn hits(&self) -> u64 {
        self.hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BoardState;

    fn board() -> (BoardState, TerritoryId, TerritoryId) {
        let mut board = BoardState::new();
        let a = board.add_territory("A", false);
        let b = board.add_territory("B", false);
        board.connect(a, b);
        (board, a, b)
    }

    #[test]
    fn unit_set_hash_ignores_order() {
        let a = unit_set_hash(&[UnitId(3), UnitId(1)]);
        let b = unit_set_hash(&[UnitId(1), UnitId(3)]);
        assert_eq!(a, b);
        assert_ne!(a, unit_set_hash(&[UnitId(1)]));
    }

    #[test]
    fn hit_skips_resolution() {
        let (board, a, b) = board();
        let mut cache = RouteCache::new();
        let key = RouteKey::new(a, b, &[UnitId(0)], &[]);
        let first = cache.get_or_resolve(key.clone(), || Route::new(&board, a, vec![b]));
        let second = cache.get_or_resolve(key, || panic!("should be cached"));
        assert_eq!(first, second);
        assert_eq!(cache.hits(), 1);
    }

    #[test]
    fn different_key_or_invalidation_resolves_again() {
        let (board, a, b) = board();
        let mut cache = RouteCache::new();
        cache.get_or_resolve(RouteKey::new(a, b, &[UnitId(0)], &[]), || Route::new(&board, a, vec![b]));

        let mut calls = 0;
        cache.get_or_resolve(RouteKey::new(a, b, &[UnitId(1)], &[]), || {
            calls += 1;
            None
        });
        cache.invalidate();
        assert!(cache.is_empty());
        cache.get_or_resolve(RouteKey::new(a, b, &[UnitId(1)], &[]), || {
            calls += 1;
            None
        });
        assert_eq!(calls, 2);
    }
}
