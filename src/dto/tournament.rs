//! Payloads of the tournament, status, pair-id and pair-code endpoints.

use serde::Deserialize;

use crate::error::ShapeError;
use crate::model::{HandStatusEntry, MAX_PAIRS, PlayerUpdate, RoundStatus, TournamentId};

/// Body of `GET /api/tournaments`.
#[derive(Debug, Deserialize)]
pub(crate) struct TournamentsListDto {
    pub tournaments: Vec<HeaderDto>,
}

/// One entry of the tournament list.
#[derive(Debug, Deserialize)]
pub(crate) struct HeaderDto {
    pub id: String,
    pub name: String,
}

/// Body of `GET /api/tournaments/{id}`.
#[derive(Debug, Deserialize)]
pub(crate) struct TournamentDetailDto {
    pub name: String,
    pub no_pairs: u32,
    pub no_boards: u32,
    /// Flat player list; each entry names its pair. Absent when no players
    /// were registered.
    #[serde(default)]
    pub players: Option<Vec<PlayerDetailDto>>,
    /// Scored hands; only the count matters to the client.
    #[serde(default)]
    pub hands: Vec<serde_json::Value>,
}

/// One entry of a tournament detail's `players` array.
#[derive(Debug, Deserialize)]
pub(crate) struct PlayerDetailDto {
    pub pair_no: u32,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Tournament detail after validation, grouped the way the model wants it.
#[derive(Debug)]
pub(crate) struct ParsedTournament {
    pub name: String,
    pub no_pairs: u32,
    pub no_boards: u32,
    /// Player updates indexed by pair (index 0 is pair 1); pairs without
    /// players get an empty list so stale players are cleared.
    pub players_by_pair: Vec<Vec<PlayerUpdate>>,
    pub has_scored_hands: bool,
}

impl TournamentDetailDto {
    /// Validate the pair count and distribute players to their pairs.
    pub fn to_parsed(&self) -> Result<ParsedTournament, ShapeError> {
        if self.no_pairs > MAX_PAIRS {
            return Err(ShapeError::new(
                "tournament pair count",
                format!("must be an integer >= 0 and <= {MAX_PAIRS}"),
            ));
        }
        let mut players_by_pair = vec![Vec::new(); self.no_pairs as usize];
        if let Some(players) = &self.players {
            for (index, player) in players.iter().enumerate() {
                if player.pair_no == 0 || player.pair_no > self.no_pairs {
                    return Err(ShapeError::new(
                        format!("players[{index}] pair number"),
                        format!("({}) was not an integer in the legal range", player.pair_no),
                    ));
                }
                players_by_pair[(player.pair_no - 1) as usize].push(PlayerUpdate {
                    name: Some(player.name.clone()),
                    email: player.email.clone().filter(|email| !email.is_empty()),
                });
            }
        }
        Ok(ParsedTournament {
            name: self.name.clone(),
            no_pairs: self.no_pairs,
            no_boards: self.no_boards,
            players_by_pair,
            has_scored_hands: !self.hands.is_empty(),
        })
    }
}

/// Body of `POST /api/tournaments` on success.
#[derive(Debug, Deserialize)]
pub(crate) struct CreatedDto {
    pub id: String,
}

/// Body of `GET /api/tournaments/{id}/handStatus`.
#[derive(Debug, Deserialize)]
pub(crate) struct StatusDto {
    pub rounds: Vec<RoundStatusDto>,
}

impl StatusDto {
    /// Round statuses with both hand lists sorted by board then table.
    pub fn to_rounds(&self) -> Vec<RoundStatus> {
        self.rounds.iter().map(RoundStatusDto::to_round).collect()
    }
}

/// Scoring progress of one round.
#[derive(Debug, Deserialize)]
pub(crate) struct RoundStatusDto {
    pub round: u32,
    pub scored_hands: Vec<HandEntryDto>,
    pub unscored_hands: Vec<HandEntryDto>,
}

impl RoundStatusDto {
    fn to_round(&self) -> RoundStatus {
        RoundStatus {
            round_no: self.round,
            scored_hands: sorted_entries(&self.scored_hands),
            unscored_hands: sorted_entries(&self.unscored_hands),
        }
    }
}

fn sorted_entries(entries: &[HandEntryDto]) -> Vec<HandStatusEntry> {
    let mut entries: Vec<_> = entries
        .iter()
        .map(|entry| HandStatusEntry {
            hand_no: entry.hand,
            ns_pair: entry.ns_pair,
            ew_pair: entry.ew_pair,
            table_no: entry.table,
        })
        .collect();
    entries.sort_by_key(|entry| (entry.hand_no, entry.table_no));
    entries
}

/// One hand in a status round's scored or unscored list.
#[derive(Debug, Deserialize)]
pub(crate) struct HandEntryDto {
    pub hand: u32,
    pub ns_pair: u32,
    pub ew_pair: u32,
    pub table: u32,
}

/// Body of `GET /api/tournaments/{id}/pairids`.
#[derive(Debug, Deserialize)]
pub(crate) struct PairIdsDto {
    /// Codes in pair order; index 0 belongs to pair 1.
    pub pair_ids: Vec<String>,
}

/// Body of `GET /api/tournaments/{id}/pairids/{pair_no}`.
#[derive(Debug, Deserialize)]
pub(crate) struct PairIdDto {
    pub pair_id: String,
}

/// Body of `GET /api/tournaments/pairno/{code}`.
#[derive(Debug, Deserialize)]
pub(crate) struct TournamentInfosDto {
    pub tournament_infos: Vec<TournamentInfoDto>,
}

/// One tournament a pair code belongs to.
#[derive(Debug, Deserialize)]
pub(crate) struct TournamentInfoDto {
    pub tournament_id: String,
    pub pair_no: u32,
}

impl TournamentInfoDto {
    pub fn tournament_id(&self) -> TournamentId {
        TournamentId::from(self.tournament_id.as_str())
    }
}
