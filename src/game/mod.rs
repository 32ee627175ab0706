//! Game Logic
//!
//! The authoritative model: state types, the action set, the pure
//! transition function, schema migration, and derived statistics. Nothing
//! in this module touches a clock, a network, or storage; timestamps are
//! injected by callers.

pub mod action;
pub mod migrate;
pub mod reduce;
pub mod state;
pub mod stats;
