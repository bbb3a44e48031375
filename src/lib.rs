//! Landfall move planning library.
//!
//! Exposes the board model, route resolver, movable-unit filter, transport
//! assignment, the selection state machine and the line protocol for use by
//! integration tests and the binary entry point.

pub mod board;
pub mod config;
pub mod engine;
pub mod filter;
pub mod pathing;
pub mod protocol;
pub mod selection;
pub mod transport;
