//! Fetching movements and recording hand scores.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tracing::debug;

use crate::dto::movement::{ChangeLogDto, HandResultsDto, HandScoreDto, MovementDto};
use crate::error::{ApiError, ClientResult, ForbiddenHandling, Rejection};
use crate::model::{
    ChangeRecord, HandNo, HandResult, HandScore, MovementRound, PairNo, SeatedRound, SharedHand,
    SharedMovement, Side, TournamentId,
};
use crate::store::MovementStore;

use super::transport::Transport;

/// Detail shown when a movement payload fails validation.
const MALFORMED_MOVEMENT: &str = "The movement... wasn't.";
/// Detail shown when a hand payload fails validation.
const MALFORMED_HAND: &str = "The hand... wasn't.";
/// Detail shown when a change-log payload fails validation.
const MALFORMED_CHANGE_LOG: &str = "The change log... wasn't.";
/// Detail shown when a hand-results payload fails validation.
const MALFORMED_HAND_RESULTS: &str = "The hand results... weren't.";

type FetchKey = (TournamentId, PairNo, Option<String>);
type SharedFetch = Shared<BoxFuture<'static, ClientResult<SharedMovement>>>;

/// Client of the movement and hand-score endpoints.
///
/// Identical concurrent movement fetches are deduplicated: every caller
/// awaits the same shared future and resolves with the same handle, and the
/// in-flight entry is dropped when the request completes so failures are
/// never cached.
pub struct MovementService {
    transport: Transport,
    store: Arc<MovementStore>,
    in_flight: DashMap<FetchKey, SharedFetch>,
}

impl MovementService {
    pub(crate) fn new(transport: Transport, store: Arc<MovementStore>) -> Self {
        Self {
            transport,
            store,
            in_flight: DashMap::new(),
        }
    }

    /// The movement of one pair, from cache when available.
    ///
    /// A cached movement resolves immediately, even when the supplied pair
    /// code differs from the one it was fetched with; `refresh` forces a new
    /// request. The pair-code header is sent iff a code is supplied here or
    /// configured as the default.
    pub async fn movement(
        &self,
        tournament_id: &TournamentId,
        pair_no: PairNo,
        pair_code: Option<&str>,
        refresh: bool,
    ) -> ClientResult<SharedMovement> {
        if !refresh && self.store.has_movement(tournament_id, pair_no) {
            return Ok(self.store.movement(tournament_id, pair_no));
        }

        let pair_code = self
            .transport
            .effective_pair_code(pair_code)
            .map(str::to_owned);
        let key = (tournament_id.clone(), pair_no, pair_code.clone());
        let fetch = match self.in_flight.entry(key.clone()) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => {
                let fetch = fetch_movement(
                    self.transport.clone(),
                    Arc::clone(&self.store),
                    tournament_id.clone(),
                    pair_no,
                    pair_code,
                )
                .boxed()
                .shared();
                entry.insert(fetch.clone());
                fetch
            }
        };

        let outcome = fetch.clone().await;
        self.in_flight
            .remove_if(&key, |_, pending| pending.ptr_eq(&fetch));
        outcome
    }

    /// Record a score for one hand and propagate it into the caches.
    ///
    /// On success the canonical hand carries the new score and, when a
    /// status object is cached for the tournament, its entry moves to the
    /// scored list. Resolves with the canonical hand handle.
    pub async fn record_score(
        &self,
        tournament_id: &TournamentId,
        ns_pair: PairNo,
        ew_pair: PairNo,
        hand_no: HandNo,
        score: &HandScore,
        pair_code: Option<&str>,
    ) -> ClientResult<SharedHand> {
        let hand_segment = hand_no.to_string();
        let ns_segment = ns_pair.to_string();
        let ew_segment = ew_pair.to_string();
        let segments = [
            "api",
            "tournaments",
            tournament_id.as_str(),
            "hands",
            hand_segment.as_str(),
            ns_segment.as_str(),
            ew_segment.as_str(),
        ];
        self.transport
            .put_no_content(
                &segments,
                &HandScoreDto::from(score),
                self.transport.effective_pair_code(pair_code),
            )
            .await
            .map_err(|err| Rejection::from_api(err, ForbiddenHandling::Surface, MALFORMED_HAND))?;

        let hand = self.store.hand(tournament_id, ns_pair, ew_pair, hand_no);
        hand.write().await.score = Some(score.clone());
        self.move_status_entry(tournament_id, hand_no, ns_pair, ew_pair, true)
            .await;
        Ok(hand)
    }

    /// Delete the score of one hand and propagate the deletion.
    ///
    /// Mirror of [`record_score`](Self::record_score): the canonical hand
    /// loses its score and a cached status entry moves back to the unscored
    /// list.
    pub async fn clear_score(
        &self,
        tournament_id: &TournamentId,
        ns_pair: PairNo,
        ew_pair: PairNo,
        hand_no: HandNo,
        pair_code: Option<&str>,
    ) -> ClientResult<SharedHand> {
        let hand_segment = hand_no.to_string();
        let ns_segment = ns_pair.to_string();
        let ew_segment = ew_pair.to_string();
        let segments = [
            "api",
            "tournaments",
            tournament_id.as_str(),
            "hands",
            hand_segment.as_str(),
            ns_segment.as_str(),
            ew_segment.as_str(),
        ];
        self.transport
            .delete_no_content(&segments, self.transport.effective_pair_code(pair_code))
            .await
            .map_err(|err| Rejection::from_api(err, ForbiddenHandling::Surface, MALFORMED_HAND))?;

        let hand = self.store.hand(tournament_id, ns_pair, ew_pair, hand_no);
        hand.write().await.score = None;
        self.move_status_entry(tournament_id, hand_no, ns_pair, ew_pair, false)
            .await;
        Ok(hand)
    }

    /// Fetch one hand's current score into the canonical hand.
    ///
    /// A 204 response means the hand is unscored and clears any cached
    /// score. Resolves with the canonical hand handle.
    pub async fn hand(
        &self,
        tournament_id: &TournamentId,
        ns_pair: PairNo,
        ew_pair: PairNo,
        hand_no: HandNo,
        pair_code: Option<&str>,
    ) -> ClientResult<SharedHand> {
        let hand_segment = hand_no.to_string();
        let ns_segment = ns_pair.to_string();
        let ew_segment = ew_pair.to_string();
        let segments = [
            "api",
            "tournaments",
            tournament_id.as_str(),
            "hands",
            hand_segment.as_str(),
            ns_segment.as_str(),
            ew_segment.as_str(),
        ];
        let reject =
            |err| Rejection::from_api(err, ForbiddenHandling::Surface, MALFORMED_HAND);

        let body: Option<HandScoreDto> = self
            .transport
            .get_optional(&segments, self.transport.effective_pair_code(pair_code))
            .await
            .map_err(reject)?;
        let score = body
            .map(|dto| dto.to_model("hand"))
            .transpose()
            .map_err(|source| {
                reject(ApiError::Shape {
                    path: self.transport.path_for(&segments),
                    source,
                })
            })?;

        let hand = self.store.hand(tournament_id, ns_pair, ew_pair, hand_no);
        hand.write().await.score = score;
        Ok(hand)
    }

    /// Full change history of one hand, newest first. Director only.
    pub async fn change_log(
        &self,
        tournament_id: &TournamentId,
        hand_no: HandNo,
        ns_pair: PairNo,
        ew_pair: PairNo,
    ) -> ClientResult<Vec<ChangeRecord>> {
        let hand_segment = hand_no.to_string();
        let ns_segment = ns_pair.to_string();
        let ew_segment = ew_pair.to_string();
        let segments = [
            "api",
            "tournaments",
            tournament_id.as_str(),
            "hands",
            "changelog",
            hand_segment.as_str(),
            ns_segment.as_str(),
            ew_segment.as_str(),
        ];
        let reject =
            |err| Rejection::from_api(err, ForbiddenHandling::Redirect, MALFORMED_CHANGE_LOG);

        let dto: ChangeLogDto = self.transport.get(&segments, None).await.map_err(reject)?;
        dto.to_records().map_err(|source| {
            reject(ApiError::Shape {
                path: self.transport.path_for(&segments),
                source,
            })
        })
    }

    /// Every scored result of one board, in the server's score order.
    pub async fn hand_results(
        &self,
        tournament_id: &TournamentId,
        hand_no: HandNo,
        pair_code: Option<&str>,
    ) -> ClientResult<Vec<HandResult>> {
        let hand_segment = hand_no.to_string();
        let segments = [
            "api",
            "tournaments",
            tournament_id.as_str(),
            "handresults",
            hand_segment.as_str(),
        ];
        let reject =
            |err| Rejection::from_api(err, ForbiddenHandling::Surface, MALFORMED_HAND_RESULTS);

        let dto: HandResultsDto = self
            .transport
            .get(&segments, self.transport.effective_pair_code(pair_code))
            .await
            .map_err(reject)?;
        dto.to_results().map_err(|source| {
            reject(ApiError::Shape {
                path: self.transport.path_for(&segments),
                source,
            })
        })
    }

    /// Move a hand between the scored and unscored lists of a cached status.
    ///
    /// Tournaments whose status was never fetched have nothing to update;
    /// that is not an error.
    async fn move_status_entry(
        &self,
        tournament_id: &TournamentId,
        hand_no: HandNo,
        ns_pair: PairNo,
        ew_pair: PairNo,
        scored: bool,
    ) {
        let tournaments = self.store.tournaments();
        if !tournaments.has_status(tournament_id) {
            return;
        }
        let status = tournaments.status(tournament_id);
        let mut guard = status.write().await;
        if scored {
            guard.mark_scored(hand_no, ns_pair, ew_pair);
        } else {
            guard.mark_unscored(hand_no, ns_pair, ew_pair);
        }
    }
}

/// Fetch, validate and merge one movement.
///
/// Owns its arguments so the future can sit in the in-flight table. Nothing
/// is written to the stores until the whole payload has validated.
async fn fetch_movement(
    transport: Transport,
    store: Arc<MovementStore>,
    tournament_id: TournamentId,
    pair_no: PairNo,
    pair_code: Option<String>,
) -> ClientResult<SharedMovement> {
    let pair_segment = pair_no.to_string();
    let segments = [
        "api",
        "tournaments",
        tournament_id.as_str(),
        "movement",
        pair_segment.as_str(),
    ];
    let reject = |err| Rejection::from_api(err, ForbiddenHandling::Surface, MALFORMED_MOVEMENT);
    debug!(tournament = %tournament_id, pair = pair_no, "fetching movement");

    let dto: MovementDto = transport
        .get(&segments, pair_code.as_deref())
        .await
        .map_err(reject)?;
    let rounds = dto.parsed_rounds().map_err(|source| {
        reject(ApiError::Shape {
            path: transport.path_for(&segments),
            source,
        })
    })?;

    let movement = store.movement(&tournament_id, pair_no);
    let header = movement.read().await.header();
    header.write().await.name = dto.name.clone();
    // A payload without players empties the roster rather than keeping a
    // stale one, same as the tournament detail path.
    let players = dto.player_updates().unwrap_or_default();
    let pair = movement.read().await.pair();
    pair.write().await.set_players(&players);

    let mut merged = Vec::with_capacity(rounds.len());
    for round in rounds {
        let seating = match round.seating {
            None => None,
            Some(parsed) => {
                let (ns_pair, ew_pair) = match parsed.side {
                    Side::NorthSouth => (pair_no, parsed.opponent),
                    Side::EastWest => (parsed.opponent, pair_no),
                };
                let mut hands = Vec::with_capacity(parsed.hands.len());
                for parsed_hand in parsed.hands {
                    let hand = store.hand(&tournament_id, ns_pair, ew_pair, parsed_hand.hand_no);
                    hand.write().await.score = parsed_hand.score;
                    hands.push(hand);
                }
                Some(SeatedRound {
                    table: parsed.table,
                    is_relay_table: parsed.is_relay_table,
                    side: parsed.side,
                    opponent: parsed.opponent,
                    hands,
                })
            }
        };
        merged.push(MovementRound {
            round_no: round.round_no,
            seating,
        });
    }

    let mut guard = movement.write().await;
    guard.allow_score_overwrites = dto.allow_score_overwrites;
    guard.rounds = merged;
    drop(guard);
    Ok(movement)
}
