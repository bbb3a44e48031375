//! Input events fed to the selection machine.

use crate::board::{TerritoryId, UnitId};

/// Units added or removed by one alt-modified click.
pub const MULTI_SELECT_COUNT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    /// All movable units in the territory.
    pub shift: bool,
    /// The whole clicked stack, or a waypoint when clicking elsewhere.
    pub ctrl: bool,
    /// Ten units at a time.
    pub alt: bool,
}

impl Modifiers {
    /// How many units a plain or alt click adds or removes.
    pub fn count(&self) -> usize {
        if self.alt {
            MULTI_SELECT_COUNT
        } else {
            1
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseButton {
    #[default]
    Left,
    Right,
}

/// A click on a territory, optionally on a unit stack inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickEvent {
    pub territory: TerritoryId,
    pub units: Vec<UnitId>,
    pub button: MouseButton,
    pub modifiers: Modifiers,
}

impl ClickEvent {
    /// A plain left click on empty ground.
    pub fn left(territory: TerritoryId) -> Self {
        Self {
            territory,
            units: Vec::new(),
            button: MouseButton::Left,
            modifiers: Modifiers::default(),
        }
    }

    pub fn right(territory: TerritoryId) -> Self {
        Self { button: MouseButton::Right, ..Self::left(territory) }
    }

    pub fn on_units(mut self, units: &[UnitId]) -> Self {
        self.units = units.to_vec();
        self
    }

    pub fn with_shift(mut self) -> Self {
        self.modifiers.shift = true;
        self
    }

    pub fn with_ctrl(mut self) -> Self {
        self.modifiers.ctrl = true;
        self
    }

    pub fn with_alt(mut self) -> Self {
        self.modifiers.alt = true;
        self
    }
}
