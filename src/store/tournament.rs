//! Canonical cache of tournament-scoped objects.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::RwLock;

use crate::model::{
    PairNo, SharedHeader, SharedPair, SharedStatus, SharedTournament, Tournament,
    TournamentHeader, TournamentId, TournamentPair, TournamentStatus,
};

/// Keeper of the canonical tournament objects.
///
/// Lookups are get-or-create: asking for an object that has not been seen
/// yet materializes an empty placeholder under the shared handle, which
/// later fetches then fill in. Callers holding a handle across a refresh
/// keep observing the same object.
#[derive(Debug, Default)]
pub struct TournamentStore {
    headers: DashMap<TournamentId, SharedHeader>,
    pairs: DashMap<(TournamentId, PairNo), SharedPair>,
    tournaments: DashMap<TournamentId, SharedTournament>,
    statuses: DashMap<TournamentId, SharedStatus>,
}

impl TournamentStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical header handle for a tournament.
    pub fn header(&self, id: &TournamentId) -> SharedHeader {
        self.headers
            .entry(id.clone())
            .or_insert_with(|| Arc::new(RwLock::new(TournamentHeader::new(id.clone()))))
            .clone()
    }

    /// Canonical handle for one pair of a tournament.
    ///
    /// Pair handles are keyed independently of the tournament object, so a
    /// pair fetched through a movement stays canonical even when the full
    /// tournament was never loaded, and survives the tournament's deletion.
    pub fn pair(&self, id: &TournamentId, pair_no: PairNo) -> SharedPair {
        self.pairs
            .entry((id.clone(), pair_no))
            .or_insert_with(|| Arc::new(RwLock::new(TournamentPair::new(pair_no))))
            .clone()
    }

    /// Canonical handle for a full tournament.
    ///
    /// The placeholder is built around the canonical header handle, so
    /// renames propagate between the list view and the detail view.
    pub fn tournament(&self, id: &TournamentId) -> SharedTournament {
        self.tournaments
            .entry(id.clone())
            .or_insert_with(|| Arc::new(RwLock::new(Tournament::new(self.header(id)))))
            .clone()
    }

    /// Whether a full tournament object has been handed out for this id.
    pub fn has_tournament(&self, id: &TournamentId) -> bool {
        self.tournaments.contains_key(id)
    }

    /// Canonical scoring-progress handle for a tournament.
    pub fn status(&self, id: &TournamentId) -> SharedStatus {
        self.statuses
            .entry(id.clone())
            .or_insert_with(|| Arc::new(RwLock::new(TournamentStatus::default())))
            .clone()
    }

    /// Whether a scoring-progress object has been handed out for this id.
    pub fn has_status(&self, id: &TournamentId) -> bool {
        self.statuses.contains_key(id)
    }

    /// Drop the canonical tournament and header for a deleted tournament.
    ///
    /// Pair and status handles stay cached; movements fetched with a pair
    /// code keep working against them after a director deletes and
    /// recreates a tournament under the same id.
    pub fn delete_tournament(&self, id: &TournamentId) {
        self.tournaments.remove(id);
        self.headers.remove(id);
    }
}
