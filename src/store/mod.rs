//! Canonical object stores.
//!
//! Every tournament-scoped object the client hands out lives in exactly one
//! place. The stores below key those canonical instances and hand out shared
//! handles, so two callers asking for the same tournament, pair or hand
//! always observe each other's writes.

pub mod movement;
pub mod tournament;

pub use movement::MovementStore;
pub use tournament::TournamentStore;
