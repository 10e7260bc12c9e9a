//! Payloads of the movement, hand-score, change-log and hand-results
//! endpoints.

use serde::{Deserialize, Serialize};

use crate::error::ShapeError;
use crate::model::{
    Call, ChangeRecord, HandNo, HandResult, HandScore, PairNo, PlayerUpdate, Position, Score,
    ScoreAdjustment, SeatCall, Side,
};

/// Body of `GET /api/tournaments/{id}/movement/{pair_no}`.
#[derive(Debug, Deserialize)]
pub(crate) struct MovementDto {
    /// Tournament name, merged into the shared header.
    pub name: String,
    /// Players of the requesting pair, when the server knows them.
    #[serde(default)]
    pub players: Option<Vec<PlayerDto>>,
    /// Rounds in play order.
    pub movement: Vec<RoundDto>,
    /// Whether score submissions may overwrite existing scores.
    #[serde(default)]
    pub allow_score_overwrites: bool,
}

impl MovementDto {
    /// Validate every round, keeping the payload order.
    pub fn parsed_rounds(&self) -> Result<Vec<ParsedRound>, ShapeError> {
        self.movement
            .iter()
            .enumerate()
            .map(|(index, round)| round.to_parsed(index))
            .collect()
    }

    /// Player list normalized for [`TournamentPair::set_players`].
    ///
    /// [`TournamentPair::set_players`]: crate::model::TournamentPair::set_players
    pub fn player_updates(&self) -> Option<Vec<PlayerUpdate>> {
        self.players.as_ref().map(|players| {
            players
                .iter()
                .map(|player| PlayerUpdate {
                    name: player.name.clone().filter(|name| !name.is_empty()),
                    email: player.email.clone().filter(|email| !email.is_empty()),
                })
                .collect()
        })
    }
}

/// One entry of a movement's `players` array; both fields are nullable.
#[derive(Debug, Deserialize)]
pub(crate) struct PlayerDto {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// One entry of a movement's `movement` array.
///
/// Only `round` and `opponent` decide the round's shape: a null or missing
/// opponent is a sit-out and the seating fields are not even looked at.
#[derive(Debug, Deserialize)]
pub(crate) struct RoundDto {
    pub round: u32,
    #[serde(default)]
    pub opponent: Option<u32>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub relay_table: Option<bool>,
    #[serde(default)]
    pub hands: Option<Vec<HandDto>>,
}

impl RoundDto {
    fn to_parsed(&self, index: usize) -> Result<ParsedRound, ShapeError> {
        let context = format!("movement round[{index}]");
        let Some(opponent) = self.opponent else {
            return Ok(ParsedRound {
                round_no: self.round,
                seating: None,
            });
        };
        if opponent == 0 {
            return Err(ShapeError::new(
                format!("{context} opponent"),
                "was not a positive integer",
            ));
        }

        let position = self.position.as_deref().ok_or_else(|| {
            ShapeError::wrong_type(format!("{context} position"), "string", "missing")
        })?;
        let mut chars = position.chars();
        let Some(side_letter) = chars.next_back() else {
            return Err(ShapeError::new(format!("{context} position"), "was too short"));
        };
        let table = chars.as_str();
        if table.is_empty() {
            return Err(ShapeError::new(format!("{context} position"), "was too short"));
        }
        let side = Side::from_letter(side_letter).ok_or_else(|| {
            ShapeError::new(
                format!("{context} position"),
                "didn't end in a valid side",
            )
        })?;

        let is_relay_table = self.relay_table.ok_or_else(|| {
            ShapeError::wrong_type(format!("{context} relay table"), "boolean", "missing")
        })?;
        let hands = self.hands.as_deref().ok_or_else(|| {
            ShapeError::wrong_type(format!("{context} hands"), "array", "missing")
        })?;
        let hands = hands
            .iter()
            .enumerate()
            .map(|(hand_index, hand)| hand.to_parsed(&context, hand_index))
            .collect::<Result<_, _>>()?;

        Ok(ParsedRound {
            round_no: self.round,
            seating: Some(ParsedSeating {
                table: table.to_owned(),
                is_relay_table,
                side,
                opponent,
                hands,
            }),
        })
    }
}

/// One entry of a round's `hands` array.
#[derive(Debug, Deserialize)]
pub(crate) struct HandDto {
    pub hand_no: u32,
    #[serde(default)]
    pub score: Option<HandScoreDto>,
}

impl HandDto {
    fn to_parsed(&self, round_context: &str, index: usize) -> Result<ParsedHand, ShapeError> {
        let context = format!("{round_context} hand[{index}]");
        if self.hand_no == 0 {
            return Err(ShapeError::new(
                format!("{context} hand number"),
                "was not a positive integer",
            ));
        }
        let score = self
            .score
            .as_ref()
            .map(|score| score.to_model(&context))
            .transpose()?;
        Ok(ParsedHand {
            hand_no: self.hand_no,
            score,
        })
    }
}

/// Validated round, ready to be merged into the canonical movement.
#[derive(Debug)]
pub(crate) struct ParsedRound {
    pub round_no: u32,
    pub seating: Option<ParsedSeating>,
}

/// Validated seating of a played round.
#[derive(Debug)]
pub(crate) struct ParsedSeating {
    pub table: String,
    pub is_relay_table: bool,
    pub side: Side,
    pub opponent: PairNo,
    pub hands: Vec<ParsedHand>,
}

/// Validated hand entry; the score is already in model form.
#[derive(Debug)]
pub(crate) struct ParsedHand {
    pub hand_no: HandNo,
    pub score: Option<HandScore>,
}

/// Score of one side of a hand: a point total or an `AVG`-family award.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum ScoreDto {
    Points(i32),
    Adjusted(String),
}

impl ScoreDto {
    fn to_score(&self, context: &str) -> Result<Score, ShapeError> {
        match self {
            ScoreDto::Points(points) => Ok(Score::Points(*points)),
            ScoreDto::Adjusted(text) => ScoreAdjustment::from_wire(text)
                .map(Score::Adjusted)
                .ok_or_else(|| ShapeError::new(context, "was not a valid score")),
        }
    }
}

impl From<Score> for ScoreDto {
    fn from(score: Score) -> Self {
        match score {
            Score::Points(points) => ScoreDto::Points(points),
            Score::Adjusted(adjustment) => ScoreDto::Adjusted(adjustment.as_str().to_owned()),
        }
    }
}

/// The `calls` map: seat name to call string, empty string meaning no call.
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct CallsDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub north: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub east: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub west: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub south: Option<String>,
}

impl CallsDto {
    fn get(&self, seat: Position) -> Option<&str> {
        match seat {
            Position::North => self.north.as_deref(),
            Position::East => self.east.as_deref(),
            Position::West => self.west.as_deref(),
            Position::South => self.south.as_deref(),
        }
    }

    fn set(&mut self, seat: Position, call: Call) {
        let slot = match seat {
            Position::North => &mut self.north,
            Position::East => &mut self.east,
            Position::West => &mut self.west,
            Position::South => &mut self.south,
        };
        *slot = Some(call.as_str().to_owned());
    }

    /// Convert to seat calls; an empty string means the seat made no call.
    fn to_seat_calls(&self, context: &str) -> Result<Vec<SeatCall>, ShapeError> {
        let mut calls = Vec::new();
        for seat in Position::ALL {
            let Some(text) = self.get(seat) else {
                continue;
            };
            if text.is_empty() {
                continue;
            }
            let call = Call::from_wire(text).ok_or_else(|| {
                ShapeError::new(format!("{context} {seat} call"), "was not a valid call")
            })?;
            calls.push(SeatCall { seat, call });
        }
        Ok(calls)
    }
}

/// A hand score as the server sends and accepts it.
///
/// Doubles as the `PUT` body when recording a score; the server wants the
/// `calls` object present even when empty and `notes` spelled out as null.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct HandScoreDto {
    #[serde(default)]
    pub calls: Option<CallsDto>,
    pub ns_score: ScoreDto,
    pub ew_score: ScoreDto,
    #[serde(default)]
    pub notes: Option<String>,
}

impl HandScoreDto {
    /// Validate into a model score; `context` names the hand for the logs.
    pub fn to_model(&self, context: &str) -> Result<HandScore, ShapeError> {
        let calls = match &self.calls {
            Some(calls) => calls.to_seat_calls(context)?,
            None => Vec::new(),
        };
        Ok(HandScore {
            calls,
            ns_score: self
                .ns_score
                .to_score(&format!("{context} north/south score"))?,
            ew_score: self
                .ew_score
                .to_score(&format!("{context} east/west score"))?,
            notes: self.notes.clone().filter(|notes| !notes.is_empty()),
        })
    }
}

impl From<&HandScore> for HandScoreDto {
    fn from(score: &HandScore) -> Self {
        let mut calls = CallsDto::default();
        for seat_call in &score.calls {
            calls.set(seat_call.seat, seat_call.call);
        }
        HandScoreDto {
            calls: Some(calls),
            ns_score: ScoreDto::from(score.ns_score),
            ew_score: ScoreDto::from(score.ew_score),
            notes: score.notes.clone(),
        }
    }
}

/// Body of the change-log endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct ChangeLogDto {
    pub changes: Vec<ChangeDto>,
}

impl ChangeLogDto {
    /// Validate every entry, keeping the server's newest-first order.
    pub fn to_records(&self) -> Result<Vec<ChangeRecord>, ShapeError> {
        self.changes
            .iter()
            .enumerate()
            .map(|(index, change)| change.to_record(index))
            .collect()
    }
}

/// One change-log entry; the snapshot has null scores when the change was a
/// deletion.
#[derive(Debug, Deserialize)]
pub(crate) struct ChangeDto {
    pub changed_by: u32,
    #[serde(default)]
    pub change: Option<ChangeStateDto>,
    pub timestamp_sec: TimestampDto,
}

impl ChangeDto {
    fn to_record(&self, index: usize) -> Result<ChangeRecord, ShapeError> {
        let context = format!("change[{index}]");
        let score = match &self.change {
            Some(state) => state.to_score(&context)?,
            None => None,
        };
        Ok(ChangeRecord {
            changed_by: self.changed_by,
            score,
            timestamp_sec: self.timestamp_sec.to_seconds(&context)?,
        })
    }
}

/// Hand-state snapshot inside a change-log entry.
#[derive(Debug, Deserialize)]
pub(crate) struct ChangeStateDto {
    #[serde(default)]
    pub calls: Option<CallsDto>,
    #[serde(default)]
    pub ns_score: Option<ScoreDto>,
    #[serde(default)]
    pub ew_score: Option<ScoreDto>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ChangeStateDto {
    fn to_score(&self, context: &str) -> Result<Option<HandScore>, ShapeError> {
        let (Some(ns_score), Some(ew_score)) = (&self.ns_score, &self.ew_score) else {
            return Ok(None);
        };
        let calls = match &self.calls {
            Some(calls) => calls.to_seat_calls(context)?,
            None => Vec::new(),
        };
        Ok(Some(HandScore {
            calls,
            ns_score: ns_score.to_score(&format!("{context} north/south score"))?,
            ew_score: ew_score.to_score(&format!("{context} east/west score"))?,
            notes: self.notes.clone().filter(|notes| !notes.is_empty()),
        }))
    }
}

/// The change-log timestamp arrives as a string of epoch seconds, but a
/// plain number is accepted too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum TimestampDto {
    Seconds(f64),
    Text(String),
}

impl TimestampDto {
    fn to_seconds(&self, context: &str) -> Result<f64, ShapeError> {
        match self {
            TimestampDto::Seconds(seconds) => Ok(*seconds),
            TimestampDto::Text(text) => text.parse().map_err(|_| {
                ShapeError::new(format!("{context} timestamp"), "was not a valid timestamp")
            }),
        }
    }
}

/// Body of the hand-results endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct HandResultsDto {
    pub results: Vec<HandResultDto>,
}

impl HandResultsDto {
    /// Validate every result, keeping the server's score-sorted order.
    pub fn to_results(&self) -> Result<Vec<HandResult>, ShapeError> {
        self.results
            .iter()
            .enumerate()
            .map(|(index, result)| result.to_result(index))
            .collect()
    }
}

/// One scored matchup as listed by the hand-results endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct HandResultDto {
    pub ns_pair: u32,
    pub ew_pair: u32,
    #[serde(default)]
    pub calls: Option<CallsDto>,
    pub ns_score: ScoreDto,
    pub ew_score: ScoreDto,
}

impl HandResultDto {
    fn to_result(&self, index: usize) -> Result<HandResult, ShapeError> {
        let context = format!("result[{index}]");
        let calls = match &self.calls {
            Some(calls) => calls.to_seat_calls(&context)?,
            None => Vec::new(),
        };
        Ok(HandResult {
            ns_pair: self.ns_pair,
            ew_pair: self.ew_pair,
            calls,
            ns_score: self.ns_score.to_score(&format!("{context} north/south score"))?,
            ew_score: self.ew_score.to_score(&format!("{context} east/west score"))?,
        })
    }
}
