//! Movement-side model objects: rounds, hands, scores and calls.

use std::fmt;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::tournament::{HandNo, PairNo, SharedHeader, SharedPair};

/// Shared handle to a [`Hand`].
pub type SharedHand = Arc<RwLock<Hand>>;
/// Shared handle to a [`Movement`].
pub type SharedMovement = Arc<RwLock<Movement>>;

/// Seat of one player around the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
    /// Seat to the north.
    North,
    /// Seat to the east.
    East,
    /// Seat to the west.
    West,
    /// Seat to the south.
    South,
}

impl Position {
    /// All seats, in the order payloads enumerate them.
    pub const ALL: [Position; 4] = [
        Position::North,
        Position::East,
        Position::West,
        Position::South,
    ];

    /// Wire name of the seat.
    pub fn as_str(self) -> &'static str {
        match self {
            Position::North => "north",
            Position::East => "east",
            Position::West => "west",
            Position::South => "south",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two sides of a table a pair can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// North-south side, `N` on the wire.
    NorthSouth,
    /// East-west side, `E` on the wire.
    EastWest,
}

impl Side {
    /// Wire letter of the side.
    pub fn letter(self) -> char {
        match self {
            Side::NorthSouth => 'N',
            Side::EastWest => 'E',
        }
    }

    /// Interpret a side letter as it appears at the end of a position string.
    pub fn from_letter(letter: char) -> Option<Side> {
        match letter {
            'N' => Some(Side::NorthSouth),
            'E' => Some(Side::EastWest),
            _ => None,
        }
    }
}

/// A Tichu declaration made before play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Call {
    /// An ordinary Tichu, `T` on the wire.
    Tichu,
    /// A Grand Tichu, `GT` on the wire.
    GrandTichu,
}

impl Call {
    /// Wire spelling of the call.
    pub fn as_str(self) -> &'static str {
        match self {
            Call::Tichu => "T",
            Call::GrandTichu => "GT",
        }
    }

    /// Interpret a wire call string.
    pub fn from_wire(value: &str) -> Option<Call> {
        match value {
            "T" => Some(Call::Tichu),
            "GT" => Some(Call::GrandTichu),
            _ => None,
        }
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Director-assigned award standing in for a numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreAdjustment {
    /// `AVG` on the wire.
    Average,
    /// `AVG+` on the wire.
    AveragePlus,
    /// `AVG++` on the wire.
    AveragePlusPlus,
    /// `AVG-` on the wire.
    AverageMinus,
    /// `AVG--` on the wire.
    AverageMinusMinus,
}

impl ScoreAdjustment {
    /// Wire spelling of the adjustment.
    pub fn as_str(self) -> &'static str {
        match self {
            ScoreAdjustment::Average => "AVG",
            ScoreAdjustment::AveragePlus => "AVG+",
            ScoreAdjustment::AveragePlusPlus => "AVG++",
            ScoreAdjustment::AverageMinus => "AVG-",
            ScoreAdjustment::AverageMinusMinus => "AVG--",
        }
    }

    /// Interpret a wire adjustment string.
    pub fn from_wire(value: &str) -> Option<ScoreAdjustment> {
        match value {
            "AVG" => Some(ScoreAdjustment::Average),
            "AVG+" => Some(ScoreAdjustment::AveragePlus),
            "AVG++" => Some(ScoreAdjustment::AveragePlusPlus),
            "AVG-" => Some(ScoreAdjustment::AverageMinus),
            "AVG--" => Some(ScoreAdjustment::AverageMinusMinus),
            _ => None,
        }
    }
}

impl fmt::Display for ScoreAdjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score awarded to one side of a hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    /// Regular point total.
    Points(i32),
    /// Director-assigned adjustment.
    Adjusted(ScoreAdjustment),
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Points(points) => write!(f, "{points}"),
            Score::Adjusted(adjustment) => write!(f, "{adjustment}"),
        }
    }
}

/// A call made from one seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatCall {
    /// Seat the call was made from.
    pub seat: Position,
    /// The declaration itself.
    pub call: Call,
}

/// Full scoring record of one played hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandScore {
    /// Calls made before play, at most one per seat.
    pub calls: Vec<SeatCall>,
    /// Score awarded to the north-south pair.
    pub ns_score: Score,
    /// Score awarded to the east-west pair.
    pub ew_score: Score,
    /// Free-form scoring notes, when any were recorded.
    pub notes: Option<String>,
}

/// One board as played between two specific pairs.
///
/// There is exactly one instance per (tournament, NS pair, EW pair, board)
/// combination; both pairs' movements hold the same handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hand {
    ns_pair: PairNo,
    ew_pair: PairNo,
    hand_no: HandNo,
    /// Scoring record, `None` while the hand is unscored.
    pub score: Option<HandScore>,
}

impl Hand {
    /// Fresh unscored hand for the given matchup.
    pub fn new(ns_pair: PairNo, ew_pair: PairNo, hand_no: HandNo) -> Self {
        Self {
            ns_pair,
            ew_pair,
            hand_no,
            score: None,
        }
    }

    /// Pair playing north-south.
    pub fn ns_pair(&self) -> PairNo {
        self.ns_pair
    }

    /// Pair playing east-west.
    pub fn ew_pair(&self) -> PairNo {
        self.ew_pair
    }

    /// Board number.
    pub fn hand_no(&self) -> HandNo {
        self.hand_no
    }
}

/// Seating details of a round actually played (i.e. not a sit-out).
#[derive(Debug)]
pub struct SeatedRound {
    /// Table label shown to players, e.g. `3` in position `3N`.
    pub table: String,
    /// Whether this table shares boards with another table.
    pub is_relay_table: bool,
    /// Side the pair plays this round.
    pub side: Side,
    /// Opposing pair number.
    pub opponent: PairNo,
    /// Boards played this round, as shared canonical hand handles.
    pub hands: Vec<SharedHand>,
}

/// One round of a pair's movement.
#[derive(Debug)]
pub struct MovementRound {
    /// 1-indexed round number.
    pub round_no: u32,
    /// Seating for the round; `None` when the pair sits out.
    pub seating: Option<SeatedRound>,
}

impl MovementRound {
    /// Whether the pair does not play this round.
    pub fn is_sit_out(&self) -> bool {
        self.seating.is_none()
    }
}

/// The personal schedule of one pair across a tournament.
#[derive(Debug)]
pub struct Movement {
    header: SharedHeader,
    pair: SharedPair,
    /// Whether the server lets score submissions overwrite existing scores.
    pub allow_score_overwrites: bool,
    /// Rounds in play order.
    pub rounds: Vec<MovementRound>,
}

impl Movement {
    /// Fresh movement tying together the shared header and pair handles.
    pub fn new(header: SharedHeader, pair: SharedPair) -> Self {
        Self {
            header,
            pair,
            allow_score_overwrites: false,
            rounds: Vec::new(),
        }
    }

    /// Handle to the header of the tournament this movement belongs to.
    pub fn header(&self) -> SharedHeader {
        Arc::clone(&self.header)
    }

    /// Handle to the pair this movement is for.
    pub fn pair(&self) -> SharedPair {
        Arc::clone(&self.pair)
    }
}

/// One entry of a hand's change log.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeRecord {
    /// Pair that submitted the change; `0` when the director did.
    pub changed_by: PairNo,
    /// Score as of this change; `None` records a deletion.
    pub score: Option<HandScore>,
    /// Seconds since the Unix epoch at which the change was stored.
    pub timestamp_sec: f64,
}

/// A scored matchup for one board, as returned by the hand-results endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandResult {
    /// Pair that played north-south.
    pub ns_pair: PairNo,
    /// Pair that played east-west.
    pub ew_pair: PairNo,
    /// Calls made before play.
    pub calls: Vec<SeatCall>,
    /// Score awarded to the north-south pair.
    pub ns_score: Score,
    /// Score awarded to the east-west pair.
    pub ew_score: Score,
}
