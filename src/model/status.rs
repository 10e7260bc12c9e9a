//! Director-facing scoring progress of a tournament.

use std::sync::Arc;

use tokio::sync::RwLock;

use super::tournament::{HandNo, PairNo};

/// Shared handle to a [`TournamentStatus`].
pub type SharedStatus = Arc<RwLock<TournamentStatus>>;

/// One hand as listed in the scoring-progress report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandStatusEntry {
    /// Board number.
    pub hand_no: HandNo,
    /// Pair playing north-south.
    pub ns_pair: PairNo,
    /// Pair playing east-west.
    pub ew_pair: PairNo,
    /// Table the hand is played at.
    pub table_no: u32,
}

impl HandStatusEntry {
    fn is_for(&self, hand_no: HandNo, ns_pair: PairNo, ew_pair: PairNo) -> bool {
        self.hand_no == hand_no && self.ns_pair == ns_pair && self.ew_pair == ew_pair
    }
}

/// Scoring progress of a single round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundStatus {
    /// 1-indexed round number.
    pub round_no: u32,
    /// Hands with a recorded score, ordered by board then table.
    pub scored_hands: Vec<HandStatusEntry>,
    /// Hands still awaiting a score, ordered by board then table.
    pub unscored_hands: Vec<HandStatusEntry>,
}

/// Per-round scoring progress across a whole tournament.
///
/// The default value is the empty placeholder handed out before the first
/// status fetch completes; refreshes overwrite it in place so every holder
/// of the shared handle observes the update.
#[derive(Debug, Default)]
pub struct TournamentStatus {
    /// Rounds in play order.
    pub rounds: Vec<RoundStatus>,
}

impl TournamentStatus {
    /// Move a hand from the unscored to the scored list of its round.
    ///
    /// The first entry matching the matchup is moved and re-inserted in
    /// board-then-table order. An unknown matchup changes nothing.
    pub fn mark_scored(&mut self, hand_no: HandNo, ns_pair: PairNo, ew_pair: PairNo) {
        for round in &mut self.rounds {
            if let Some(at) = round
                .unscored_hands
                .iter()
                .position(|entry| entry.is_for(hand_no, ns_pair, ew_pair))
            {
                let entry = round.unscored_hands.remove(at);
                insert_ordered(&mut round.scored_hands, entry);
                return;
            }
        }
    }

    /// Move a hand from the scored back to the unscored list of its round.
    ///
    /// Mirror of [`mark_scored`](Self::mark_scored), used when a score is
    /// deleted.
    pub fn mark_unscored(&mut self, hand_no: HandNo, ns_pair: PairNo, ew_pair: PairNo) {
        for round in &mut self.rounds {
            if let Some(at) = round
                .scored_hands
                .iter()
                .position(|entry| entry.is_for(hand_no, ns_pair, ew_pair))
            {
                let entry = round.scored_hands.remove(at);
                insert_ordered(&mut round.unscored_hands, entry);
                return;
            }
        }
    }
}

fn insert_ordered(hands: &mut Vec<HandStatusEntry>, entry: HandStatusEntry) {
    let key = (entry.hand_no, entry.table_no);
    let at = hands.partition_point(|existing| (existing.hand_no, existing.table_no) < key);
    hands.insert(at, entry);
}
