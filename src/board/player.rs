//! Players and the alliance relation between them.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable index of a player in the board arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u16);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// A player taking part in the game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
}

/// Symmetric alliance relation. Every player is allied with itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Alliances {
    pairs: HashSet<(PlayerId, PlayerId)>,
}

impl Alliances {
    /// Records an alliance between two players.
    pub fn ally(&mut self, a: PlayerId, b: PlayerId) {
        self.pairs.insert(ordered(a, b));
    }

    /// Breaks an alliance. Does nothing if the players were not allied.
    pub fn break_alliance(&mut self, a: PlayerId, b: PlayerId) {
        self.pairs.remove(&ordered(a, b));
    }

    pub fn is_allied(&self, a: PlayerId, b: PlayerId) -> bool {
        a == b || self.pairs.contains(&ordered(a, b))
    }
}

fn ordered(a: PlayerId, b: PlayerId) -> (PlayerId, PlayerId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alliance_is_symmetric_and_reflexive() {
        let mut alliances = Alliances::default();
        let (a, b, c) = (PlayerId(0), PlayerId(1), PlayerId(2));
        alliances.ally(b, a);

        assert!(alliances.is_allied(a, a));
        assert!(alliances.is_allied(a, b));
        assert!(alliances.is_allied(b, a));
        assert!(!alliances.is_allied(a, c));
    }

    #[test]
    fn break_alliance_removes_pair() {
        let mut alliances = Alliances::default();
        alliances.ally(PlayerId(0), PlayerId(1));
        alliances.break_alliance(PlayerId(1), PlayerId(0));
        assert!(!alliances.is_allied(PlayerId(0), PlayerId(1)));
    }
}
