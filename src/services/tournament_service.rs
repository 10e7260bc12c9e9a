//! Tournament list, detail and lifecycle operations.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::dto::tournament::{
    CreatedDto, PairIdDto, PairIdsDto, StatusDto, TournamentDetailDto, TournamentsListDto,
};
use crate::error::{ApiError, ClientResult, ForbiddenHandling, Rejection};
use crate::model::{
    PairNo, PlayerUpdate, SharedHeader, SharedStatus, SharedTournament, TournamentId,
    TournamentRequest,
};
use crate::store::TournamentStore;

use super::transport::Transport;

/// Detail shown when the tournament list fails validation.
const MALFORMED_LIST: &str = "The list of tournaments... wasn't.";
/// Detail shown when a tournament payload fails validation.
const MALFORMED_TOURNAMENT: &str = "The tournament... wasn't.";
/// Detail shown when a hand-status payload fails validation.
const MALFORMED_STATUS: &str = "The tournament status... wasn't.";
/// Detail shown when a pair-code listing fails validation.
const MALFORMED_PAIR_IDS: &str = "The pair codes... weren't.";
/// Detail shown when a single pair code fails validation.
const MALFORMED_PAIR_ID: &str = "The pair code... wasn't.";

type SharedList = Arc<RwLock<Option<Vec<SharedHeader>>>>;
type ListFetch = Shared<BoxFuture<'static, ClientResult<Vec<SharedHeader>>>>;
type DetailFetch = Shared<BoxFuture<'static, ClientResult<SharedTournament>>>;

/// Client of the tournament endpoints. Director only.
///
/// The tournament list is fetched once and then served from cache; detail
/// fetches are deduplicated per tournament the same way movement fetches
/// are. Failed fetches are never cached.
pub struct TournamentService {
    transport: Transport,
    store: Arc<TournamentStore>,
    list: SharedList,
    list_fetch: Mutex<Option<ListFetch>>,
    in_flight: DashMap<TournamentId, DetailFetch>,
}

impl TournamentService {
    pub(crate) fn new(transport: Transport, store: Arc<TournamentStore>) -> Self {
        Self {
            transport,
            store,
            list: Arc::new(RwLock::new(None)),
            list_fetch: Mutex::new(None),
            in_flight: DashMap::new(),
        }
    }

    /// Every tournament the signed-in director owns, as shared headers.
    ///
    /// The list is fetched once; later calls resolve from cache without
    /// HTTP. Concurrent first calls share one request.
    pub async fn tournaments(&self) -> ClientResult<Vec<SharedHeader>> {
        if let Some(cached) = self.list.read().await.as_ref() {
            return Ok(cached.clone());
        }

        let fetch = {
            let mut slot = self.list_fetch.lock().await;
            // A fetch that completed while we waited has cached the list.
            if let Some(cached) = self.list.read().await.as_ref() {
                return Ok(cached.clone());
            }
            match slot.as_ref() {
                Some(pending) => pending.clone(),
                None => {
                    let fetch = fetch_tournaments(
                        self.transport.clone(),
                        Arc::clone(&self.store),
                        Arc::clone(&self.list),
                    )
                    .boxed()
                    .shared();
                    *slot = Some(fetch.clone());
                    fetch
                }
            }
        };

        let outcome = fetch.clone().await;
        let mut slot = self.list_fetch.lock().await;
        if slot.as_ref().is_some_and(|pending| pending.ptr_eq(&fetch)) {
            *slot = None;
        }
        drop(slot);
        outcome
    }

    /// One tournament in full, from cache when available.
    ///
    /// `refresh` forces a new request; concurrent fetches of the same
    /// tournament share one request.
    pub async fn tournament(
        &self,
        id: &TournamentId,
        refresh: bool,
    ) -> ClientResult<SharedTournament> {
        if !refresh && self.store.has_tournament(id) {
            return Ok(self.store.tournament(id));
        }

        let fetch = match self.in_flight.entry(id.clone()) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => {
                let fetch =
                    fetch_tournament(self.transport.clone(), Arc::clone(&self.store), id.clone())
                        .boxed()
                        .shared();
                entry.insert(fetch.clone());
                fetch
            }
        };

        let outcome = fetch.clone().await;
        self.in_flight
            .remove_if(id, |_, pending| pending.ptr_eq(&fetch));
        outcome
    }

    /// Scoring progress of every round, refreshed on every call.
    ///
    /// The shared status object is updated in place, so handles obtained
    /// earlier observe the new lists.
    pub async fn tournament_status(&self, id: &TournamentId) -> ClientResult<SharedStatus> {
        let segments = ["api", "tournaments", id.as_str(), "handStatus"];
        let dto: StatusDto = self
            .transport
            .get(&segments, None)
            .await
            .map_err(|err| Rejection::from_api(err, ForbiddenHandling::Redirect, MALFORMED_STATUS))?;

        let status = self.store.status(id);
        status.write().await.rounds = dto.to_rounds();
        Ok(status)
    }

    /// Create a tournament and seed the caches from the request.
    ///
    /// When the tournament list is already cached, the new header is
    /// appended to it.
    pub async fn create_tournament(
        &self,
        request: &TournamentRequest,
    ) -> ClientResult<SharedTournament> {
        let segments = ["api", "tournaments"];
        let created: CreatedDto = self.transport.post(&segments, request).await.map_err(|err| {
            Rejection::from_api(err, ForbiddenHandling::Redirect, MALFORMED_TOURNAMENT)
        })?;
        let id = TournamentId::from(created.id);
        debug!(tournament = %id, "created tournament");

        let tournament = self.store.tournament(&id);
        self.apply_request(&tournament, &id, request).await;
        let header = tournament.read().await.header();
        if let Some(list) = self.list.write().await.as_mut() {
            list.push(header);
        }
        Ok(tournament)
    }

    /// Edit a tournament and apply the request to the cached objects.
    ///
    /// The server refuses edits once hands have been scored; that surfaces
    /// as an ordinary server rejection and the caches stay untouched.
    pub async fn update_tournament(
        &self,
        id: &TournamentId,
        request: &TournamentRequest,
    ) -> ClientResult<SharedTournament> {
        let segments = ["api", "tournaments", id.as_str()];
        self.transport
            .put_no_content(&segments, request, None)
            .await
            .map_err(|err| {
                Rejection::from_api(err, ForbiddenHandling::Redirect, MALFORMED_TOURNAMENT)
            })?;

        let tournament = self.store.tournament(id);
        self.apply_request(&tournament, id, request).await;
        Ok(tournament)
    }

    /// Delete a tournament and evict it from the caches.
    ///
    /// The header is dropped from the cached list by identity; pair and
    /// status handles stay valid for anyone still holding them.
    pub async fn delete_tournament(&self, id: &TournamentId) -> ClientResult<()> {
        let segments = ["api", "tournaments", id.as_str()];
        self.transport
            .delete_no_content(&segments, None)
            .await
            .map_err(|err| {
                Rejection::from_api(err, ForbiddenHandling::Redirect, MALFORMED_TOURNAMENT)
            })?;

        let header = self.store.header(id);
        if let Some(list) = self.list.write().await.as_mut() {
            list.retain(|entry| !Arc::ptr_eq(entry, &header));
        }
        self.store.delete_tournament(id);
        Ok(())
    }

    /// Score-entry codes of every pair, in pair order.
    ///
    /// The codes are also written onto the canonical pair objects.
    pub async fn pair_ids(&self, id: &TournamentId) -> ClientResult<Vec<String>> {
        let segments = ["api", "tournaments", id.as_str(), "pairids"];
        let dto: PairIdsDto = self.transport.get(&segments, None).await.map_err(|err| {
            Rejection::from_api(err, ForbiddenHandling::Redirect, MALFORMED_PAIR_IDS)
        })?;

        for (index, code) in dto.pair_ids.iter().enumerate() {
            let pair = self.store.pair(id, index as PairNo + 1);
            pair.write().await.pair_id = code.clone();
        }
        Ok(dto.pair_ids)
    }

    /// Score-entry code of one pair, also written onto the canonical pair.
    pub async fn pair_id(&self, id: &TournamentId, pair_no: PairNo) -> ClientResult<String> {
        let pair_segment = pair_no.to_string();
        let segments = ["api", "tournaments", id.as_str(), "pairids", pair_segment.as_str()];
        let dto: PairIdDto = self.transport.get(&segments, None).await.map_err(|err| {
            Rejection::from_api(err, ForbiddenHandling::Redirect, MALFORMED_PAIR_ID)
        })?;

        let pair = self.store.pair(id, pair_no);
        pair.write().await.pair_id = dto.pair_id.clone();
        Ok(dto.pair_id)
    }

    /// Write a create or edit request onto the canonical objects.
    ///
    /// Players are grouped by their `pair_no`; entries naming a pair outside
    /// `1..=no_pairs` are skipped, matching what the server would have
    /// ignored.
    async fn apply_request(
        &self,
        tournament: &SharedTournament,
        id: &TournamentId,
        request: &TournamentRequest,
    ) {
        let header = tournament.read().await.header();
        header.write().await.name = request.name.clone();

        let pairs = {
            let mut guard = tournament.write().await;
            guard.no_boards = request.no_boards;
            guard.set_no_pairs(request.no_pairs, |pair_no| self.store.pair(id, pair_no));
            guard.pairs.clone()
        };

        let mut players_by_pair = vec![Vec::new(); pairs.len()];
        for player in &request.players {
            let Some(index) = (player.pair_no as usize).checked_sub(1) else {
                continue;
            };
            if let Some(bucket) = players_by_pair.get_mut(index) {
                bucket.push(PlayerUpdate {
                    name: player.name.clone(),
                    email: player.email.clone(),
                });
            }
        }
        for (pair, players) in pairs.iter().zip(&players_by_pair) {
            pair.write().await.set_players(players);
        }
    }
}

/// Fetch the tournament list, refresh the shared headers and cache it.
async fn fetch_tournaments(
    transport: Transport,
    store: Arc<TournamentStore>,
    list: SharedList,
) -> ClientResult<Vec<SharedHeader>> {
    let segments = ["api", "tournaments"];
    debug!("fetching tournament list");

    let dto: TournamentsListDto = transport
        .get(&segments, None)
        .await
        .map_err(|err| Rejection::from_api(err, ForbiddenHandling::Redirect, MALFORMED_LIST))?;

    let mut headers = Vec::with_capacity(dto.tournaments.len());
    for entry in &dto.tournaments {
        let id = TournamentId::from(entry.id.as_str());
        let header = store.header(&id);
        header.write().await.name = entry.name.clone();
        headers.push(header);
    }
    *list.write().await = Some(headers.clone());
    Ok(headers)
}

/// Fetch, validate and merge one tournament detail.
async fn fetch_tournament(
    transport: Transport,
    store: Arc<TournamentStore>,
    id: TournamentId,
) -> ClientResult<SharedTournament> {
    let segments = ["api", "tournaments", id.as_str()];
    let reject = |err| Rejection::from_api(err, ForbiddenHandling::Redirect, MALFORMED_TOURNAMENT);
    debug!(tournament = %id, "fetching tournament detail");

    let dto: TournamentDetailDto = transport.get(&segments, None).await.map_err(reject)?;
    let parsed = dto.to_parsed().map_err(|source| {
        reject(ApiError::Shape {
            path: transport.path_for(&segments),
            source,
        })
    })?;

    let tournament = store.tournament(&id);
    let header = tournament.read().await.header();
    header.write().await.name = parsed.name;

    let pairs = {
        let mut guard = tournament.write().await;
        guard.no_boards = parsed.no_boards;
        guard.has_scored_hands = parsed.has_scored_hands;
        guard.set_no_pairs(parsed.no_pairs, |pair_no| store.pair(&id, pair_no));
        guard.pairs.clone()
    };
    for (pair, players) in pairs.iter().zip(&parsed.players_by_pair) {
        pair.write().await.set_players(players);
    }
    Ok(tournament)
}
