//! Route resolution.
//!
//! Path search over the territory graph, the pass-through policies for
//! hostile territory, the staged best-route resolver and its memo.

pub mod cache;
pub mod policy;
pub mod resolver;
pub mod search;

pub use cache::{unit_set_hash, RouteCache, RouteKey};
pub use policy::{Blitz, FreePassage, PassThroughPolicy, PassThroughRule, StopAtHostile};
pub use resolver::{max_movement_cost, RouteRequest, RouteResolver};
pub use search::find_route;
