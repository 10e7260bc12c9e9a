//! Tournament-side model objects: headers, players, pairs and tournaments.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

/// Name given to a header before the server has told us the real one.
const UNNAMED_TOURNAMENT: &str = "Unnamed Tournament";
/// Name given to a player slot before the server has told us the real one.
const UNNAMED_PLAYER: &str = "Player";
/// Largest pair count a tournament is allowed to declare.
pub const MAX_PAIRS: u32 = 10;

/// 1-indexed number of a pair within a tournament.
pub type PairNo = u32;
/// 1-indexed number of a board within a tournament.
pub type HandNo = u32;

/// Opaque server-assigned tournament identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TournamentId(String);

impl TournamentId {
    /// Wrap a raw identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier, as used in API paths.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TournamentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TournamentId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TournamentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Shared handle to a [`TournamentHeader`].
pub type SharedHeader = Arc<RwLock<TournamentHeader>>;
/// Shared handle to a [`TournamentPair`].
pub type SharedPair = Arc<RwLock<TournamentPair>>;
/// Shared handle to a [`Tournament`].
pub type SharedTournament = Arc<RwLock<Tournament>>;

/// Identity and display name of a tournament.
///
/// The same header instance backs the tournament list, the tournament detail
/// and every movement of that tournament, so a name learned anywhere shows up
/// everywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TournamentHeader {
    id: TournamentId,
    /// Display name; starts as a placeholder until a fetch fills it in.
    pub name: String,
}

impl TournamentHeader {
    /// Fresh header with the placeholder name.
    pub fn new(id: TournamentId) -> Self {
        Self {
            id,
            name: UNNAMED_TOURNAMENT.to_owned(),
        }
    }

    /// Tournament this header identifies.
    pub fn id(&self) -> &TournamentId {
        &self.id
    }
}

/// One registered player of a pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TournamentPlayer {
    /// Display name; a placeholder until the server supplies one.
    pub name: String,
    /// Contact address, when the director registered one.
    pub email: Option<String>,
}

impl Default for TournamentPlayer {
    fn default() -> Self {
        Self {
            name: UNNAMED_PLAYER.to_owned(),
            email: None,
        }
    }
}

/// Incoming player fields applied to a pair in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerUpdate {
    /// New display name; `None` falls back to the placeholder.
    pub name: Option<String>,
    /// New contact address, if any.
    pub email: Option<String>,
}

/// One pair (team of up to two players) in a tournament.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TournamentPair {
    pair_no: PairNo,
    /// Per-pair score-entry code, empty until learned from the server.
    pub pair_id: String,
    /// Players registered for this pair, at most two.
    pub players: Vec<TournamentPlayer>,
}

impl TournamentPair {
    /// Fresh pair with no players registered.
    pub fn new(pair_no: PairNo) -> Self {
        Self {
            pair_no,
            pair_id: String::new(),
            players: Vec::new(),
        }
    }

    /// 1-indexed number of this pair; fixed for its lifetime.
    pub fn pair_no(&self) -> PairNo {
        self.pair_no
    }

    /// Replace the player list in place, reusing existing player objects.
    ///
    /// The list is resized to match and each slot is overwritten, so handles
    /// already looking at this pair observe the update.
    pub fn set_players(&mut self, players: &[PlayerUpdate]) {
        self.players.resize_with(players.len(), Default::default);
        for (slot, update) in self.players.iter_mut().zip(players) {
            slot.name = update
                .name
                .clone()
                .unwrap_or_else(|| UNNAMED_PLAYER.to_owned());
            slot.email = update.email.clone();
        }
    }
}

/// A tournament as the client knows it: shared header plus pair roster.
#[derive(Debug)]
pub struct Tournament {
    header: SharedHeader,
    /// Number of boards played over the course of the tournament.
    pub no_boards: u32,
    /// Shared pair handles, index 0 holding pair number 1.
    pub pairs: Vec<SharedPair>,
    /// Whether any hand of this tournament has already been scored.
    pub has_scored_hands: bool,
}

impl Tournament {
    /// Fresh tournament around the given shared header.
    pub fn new(header: SharedHeader) -> Self {
        Self {
            header,
            no_boards: 0,
            pairs: Vec::new(),
            has_scored_hands: false,
        }
    }

    /// Handle to the shared header this tournament is identified by.
    pub fn header(&self) -> SharedHeader {
        Arc::clone(&self.header)
    }

    /// Number of pairs currently registered.
    pub fn no_pairs(&self) -> u32 {
        self.pairs.len() as u32
    }

    /// Resize the pair roster in place.
    ///
    /// Surplus handles are dropped from the tail; missing ones are obtained
    /// from `make_pair` (1-indexed), letting the store keep pair handles
    /// canonical across tournaments and movements.
    pub fn set_no_pairs(&mut self, no_pairs: u32, mut make_pair: impl FnMut(PairNo) -> SharedPair) {
        let target = no_pairs as usize;
        if self.pairs.len() > target {
            self.pairs.truncate(target);
        } else {
            while self.pairs.len() < target {
                let pair_no = self.pairs.len() as PairNo + 1;
                self.pairs.push(make_pair(pair_no));
            }
        }
    }
}

/// Outbound player entry of a [`TournamentRequest`].
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PlayerRequest {
    /// Pair this player belongs to.
    pub pair_no: PairNo,
    /// Player name, omitted from the payload when not set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Contact address, omitted from the payload when not set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Outbound payload used to create or edit a tournament.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TournamentRequest {
    /// Display name of the tournament.
    pub name: String,
    /// Number of participating pairs.
    pub no_pairs: u32,
    /// Number of boards to be played.
    pub no_boards: u32,
    /// Player registrations, grouped by their `pair_no`.
    pub players: Vec<PlayerRequest>,
    /// Whether score submissions may overwrite existing scores.
    pub allow_score_overwrites: bool,
}
