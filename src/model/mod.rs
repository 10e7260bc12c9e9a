//! Domain model: tournaments, movements, hands and their shared handles.
//!
//! Model objects are handed out as `Arc<RwLock<_>>` handles so every caller
//! observes the same instance; the stores in [`crate::store`] guarantee one
//! canonical object per identity.

pub mod movement;
pub mod status;
pub mod tournament;

pub use movement::{
    Call, ChangeRecord, Hand, HandResult, HandScore, Movement, MovementRound, Position, Score,
    ScoreAdjustment, SeatCall, SeatedRound, SharedHand, SharedMovement, Side,
};
pub use status::{HandStatusEntry, RoundStatus, SharedStatus, TournamentStatus};
pub use tournament::{
    HandNo, MAX_PAIRS, PairNo, PlayerRequest, PlayerUpdate, SharedHeader, SharedPair,
    SharedTournament, Tournament, TournamentHeader, TournamentId, TournamentPair,
    TournamentPlayer, TournamentRequest,
};
