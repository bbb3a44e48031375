//! Board model: the arena of territories, units and players the move
//! engine reads from.
//!
//! Contains the id types, unit and territory data, routes, unit categories
//! and the dependent map for cargo riding carriers.

pub mod category;
pub mod dependents;
pub mod player;
pub mod route;
pub mod state;
pub mod territory;
pub mod unit;

pub use category::{all_same_category, categorize, same_kind, CategoryGroup, CategoryKeys, UnitCategory};
pub use dependents::{dependents_in, must_move_with, DependentMap};
pub use player::{Alliances, Player, PlayerId};
pub use route::{step_cost, Route};
pub use state::BoardState;
pub use territory::{Territory, TerritoryId};
pub use unit::{Domain, Unit, UnitId, UnitType, UnitTypeId};

/// Movement points. Fractional costs are allowed.
pub type Movement = rust_decimal::Decimal;
