//! Canonical cache of movements and the hands they share.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::RwLock;

use crate::model::{Hand, HandNo, Movement, PairNo, SharedHand, SharedMovement, TournamentId};

use super::TournamentStore;

type HandKey = (TournamentId, PairNo, PairNo, HandNo);

/// Keeper of the canonical movement and hand objects.
///
/// Hands are keyed by their full matchup, so the two pairs that played a
/// board share one object and a score recorded through one movement is
/// visible through the other.
#[derive(Debug)]
pub struct MovementStore {
    tournaments: Arc<TournamentStore>,
    movements: DashMap<(TournamentId, PairNo), SharedMovement>,
    hands: DashMap<HandKey, SharedHand>,
}

impl MovementStore {
    /// Empty store sharing the given tournament cache.
    pub fn new(tournaments: Arc<TournamentStore>) -> Self {
        Self {
            tournaments,
            movements: DashMap::new(),
            hands: DashMap::new(),
        }
    }

    /// The tournament cache movements draw their header and pair handles from.
    pub fn tournaments(&self) -> &Arc<TournamentStore> {
        &self.tournaments
    }

    /// Canonical movement handle for one pair of a tournament.
    ///
    /// The placeholder ties together the canonical header and pair handles
    /// so the tournament views and the movement view stay in sync.
    pub fn movement(&self, id: &TournamentId, pair_no: PairNo) -> SharedMovement {
        self.movements
            .entry((id.clone(), pair_no))
            .or_insert_with(|| {
                let header = self.tournaments.header(id);
                let pair = self.tournaments.pair(id, pair_no);
                Arc::new(RwLock::new(Movement::new(header, pair)))
            })
            .clone()
    }

    /// Whether a movement has been handed out for this pair.
    pub fn has_movement(&self, id: &TournamentId, pair_no: PairNo) -> bool {
        self.movements.contains_key(&(id.clone(), pair_no))
    }

    /// Canonical handle for one board played between two specific pairs.
    pub fn hand(
        &self,
        id: &TournamentId,
        ns_pair: PairNo,
        ew_pair: PairNo,
        hand_no: HandNo,
    ) -> SharedHand {
        self.hands
            .entry((id.clone(), ns_pair, ew_pair, hand_no))
            .or_insert_with(|| Arc::new(RwLock::new(Hand::new(ns_pair, ew_pair, hand_no))))
            .clone()
    }
}
