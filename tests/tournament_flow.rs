//! Tournament list, detail and lifecycle flows against a scripted fake API.

mod support;

use std::sync::Arc;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;
use tichu_tournament_client::model::{PlayerRequest, TournamentId, TournamentRequest};
use tichu_tournament_client::{ClientConfig, TichuClient};

use support::FakeApi;

fn client(api: &FakeApi) -> Result<TichuClient> {
    Ok(TichuClient::new(&ClientConfig::new(api.base_url.as_str()))?)
}

fn list_payload() -> serde_json::Value {
    json!({
        "tournaments": [
            {"id": "111", "name": "Spring Fling"},
            {"id": "222", "name": "Winter Warmup"},
        ],
    })
}

fn detail_payload() -> serde_json::Value {
    json!({
        "name": "Spring Fling",
        "no_pairs": 2,
        "no_boards": 12,
        "players": [
            {"pair_no": 1, "name": "Ann", "email": "ann@example.com"},
            {"pair_no": 1, "name": "Bea", "email": ""},
            {"pair_no": 2, "name": "Cid"},
        ],
        "hands": [{"hand_no": 1}],
    })
}

fn movement_payload(name: &str) -> serde_json::Value {
    json!({
        "name": name,
        "movement": [
            {"round": 1, "position": "1N", "opponent": 2, "relay_table": false, "hands": []},
        ],
    })
}

#[tokio::test]
async fn tournament_list_is_fetched_once_and_cached() -> Result<()> {
    let mut api = FakeApi::spawn().await?;
    let client = client(&api)?;

    api.enqueue_json(StatusCode::OK, list_payload()).await;
    let list = client.tournaments().tournaments().await?;

    let request = api.next_request().await;
    assert_eq!(request.method, "GET");
    assert_eq!(request.path, "/api/tournaments");
    assert_eq!(request.pair_code, None);

    assert_eq!(list.len(), 2);
    assert_eq!(list[0].read().await.name, "Spring Fling");
    assert_eq!(list[1].read().await.name, "Winter Warmup");
    assert!(Arc::ptr_eq(
        &list[0],
        &client.tournament_store().header(&TournamentId::new("111")),
    ));

    let again = client.tournaments().tournaments().await?;
    assert_eq!(api.hits(), 1);
    assert!(Arc::ptr_eq(&list[0], &again[0]));
    assert!(Arc::ptr_eq(&list[1], &again[1]));
    Ok(())
}

#[tokio::test]
async fn concurrent_list_fetches_share_one_request() -> Result<()> {
    let mut api = FakeApi::spawn().await?;
    let client = Arc::new(client(&api)?);

    api.hold();
    api.enqueue_json(StatusCode::OK, list_payload()).await;

    let first = tokio::spawn({
        let client = Arc::clone(&client);
        async move { client.tournaments().tournaments().await }
    });
    assert_eq!(api.next_request().await.path, "/api/tournaments");

    let second = tokio::spawn({
        let client = Arc::clone(&client);
        async move { client.tournaments().tournaments().await }
    });

    api.release();
    let first = first.await.expect("join first")?;
    let second = second.await.expect("join second")?;
    assert_eq!(api.hits(), 1);
    assert!(Arc::ptr_eq(&first[0], &second[0]));
    Ok(())
}

#[tokio::test]
async fn list_failure_is_retried_on_the_next_call() -> Result<()> {
    let api = FakeApi::spawn().await?;
    let client = client(&api)?;

    api.enqueue_text(StatusCode::INTERNAL_SERVER_ERROR, "nope")
        .await;
    let rejection = client.tournaments().tournaments().await.unwrap_err();
    assert_eq!(rejection.error, "Internal Server Error (500)");

    api.enqueue_json(StatusCode::OK, list_payload()).await;
    let list = client.tournaments().tournaments().await?;
    assert_eq!(list.len(), 2);
    assert_eq!(api.hits(), 2);
    Ok(())
}

#[tokio::test]
async fn tournament_detail_merges_into_canonical_objects() -> Result<()> {
    let mut api = FakeApi::spawn().await?;
    let client = client(&api)?;
    let id = TournamentId::new("111");

    api.enqueue_json(StatusCode::OK, detail_payload()).await;
    let tournament = client.tournaments().tournament(&id, false).await?;
    assert_eq!(api.next_request().await.path, "/api/tournaments/111");

    {
        let guard = tournament.read().await;
        assert_eq!(guard.header().read().await.name, "Spring Fling");
        assert_eq!(guard.no_pairs(), 2);
        assert_eq!(guard.no_boards, 12);
        assert!(guard.has_scored_hands);
        assert!(Arc::ptr_eq(
            &guard.pairs[0],
            &client.tournament_store().pair(&id, 1),
        ));
        let first = guard.pairs[0].read().await;
        assert_eq!(first.players.len(), 2);
        assert_eq!(first.players[0].name, "Ann");
        assert_eq!(first.players[0].email.as_deref(), Some("ann@example.com"));
        assert_eq!(first.players[1].name, "Bea");
        assert_eq!(first.players[1].email, None);
        let second = guard.pairs[1].read().await;
        assert_eq!(second.players.len(), 1);
        assert_eq!(second.players[0].name, "Cid");
    }

    let cached = client.tournaments().tournament(&id, false).await?;
    assert!(Arc::ptr_eq(&tournament, &cached));
    assert_eq!(api.hits(), 1);

    api.enqueue_json(StatusCode::OK, detail_payload()).await;
    let refreshed = client.tournaments().tournament(&id, true).await?;
    assert!(Arc::ptr_eq(&tournament, &refreshed));
    assert_eq!(api.hits(), 2);
    Ok(())
}

#[tokio::test]
async fn refresh_without_players_clears_stale_players() -> Result<()> {
    let api = FakeApi::spawn().await?;
    let client = client(&api)?;
    let id = TournamentId::new("111");

    api.enqueue_json(StatusCode::OK, detail_payload()).await;
    let tournament = client.tournaments().tournament(&id, false).await?;

    let mut stripped = detail_payload();
    stripped
        .as_object_mut()
        .expect("payload is an object")
        .remove("players");
    api.enqueue_json(StatusCode::OK, stripped).await;
    client.tournaments().tournament(&id, true).await?;

    let guard = tournament.read().await;
    assert!(guard.pairs[0].read().await.players.is_empty());
    assert!(guard.pairs[1].read().await.players.is_empty());
    Ok(())
}

#[tokio::test]
async fn movement_fetch_then_list_shares_the_header() -> Result<()> {
    let api = FakeApi::spawn().await?;
    let client = client(&api)?;
    let id = TournamentId::new("111");

    api.enqueue_json(StatusCode::OK, movement_payload("Old Name"))
        .await;
    let movement = client.movements().movement(&id, 1, Some("CODE"), false).await?;
    let header = movement.read().await.header();
    assert_eq!(header.read().await.name, "Old Name");

    api.enqueue_json(StatusCode::OK, list_payload()).await;
    let list = client.tournaments().tournaments().await?;
    assert!(Arc::ptr_eq(&header, &list[0]));
    assert_eq!(header.read().await.name, "Spring Fling");
    Ok(())
}

#[tokio::test]
async fn list_then_movement_fetch_shares_the_header() -> Result<()> {
    let api = FakeApi::spawn().await?;
    let client = client(&api)?;
    let id = TournamentId::new("111");

    api.enqueue_json(StatusCode::OK, list_payload()).await;
    let list = client.tournaments().tournaments().await?;

    api.enqueue_json(StatusCode::OK, movement_payload("Renamed"))
        .await;
    let movement = client.movements().movement(&id, 1, Some("CODE"), false).await?;
    assert!(Arc::ptr_eq(&movement.read().await.header(), &list[0]));
    assert_eq!(list[0].read().await.name, "Renamed");
    Ok(())
}

#[tokio::test]
async fn tournament_status_is_sorted_and_updated_in_place() -> Result<()> {
    let api = FakeApi::spawn().await?;
    let client = client(&api)?;
    let id = TournamentId::new("111");

    api.enqueue_json(
        StatusCode::OK,
        json!({
            "rounds": [
                {
                    "round": 1,
                    "scored_hands": [],
                    "unscored_hands": [
                        {"hand": 2, "ns_pair": 1, "ew_pair": 2, "table": 2},
                        {"hand": 1, "ns_pair": 3, "ew_pair": 4, "table": 1},
                        {"hand": 1, "ns_pair": 5, "ew_pair": 6, "table": 3},
                    ],
                },
            ],
        }),
    )
    .await;
    let status = client.tournaments().tournament_status(&id).await?;
    assert!(Arc::ptr_eq(&status, &client.tournament_store().status(&id)));
    {
        let guard = status.read().await;
        let order: Vec<_> = guard.rounds[0]
            .unscored_hands
            .iter()
            .map(|entry| (entry.hand_no, entry.table_no))
            .collect();
        assert_eq!(order, vec![(1, 1), (1, 3), (2, 2)]);
    }

    api.enqueue_json(
        StatusCode::OK,
        json!({"rounds": [{"round": 1, "scored_hands": [], "unscored_hands": []}]}),
    )
    .await;
    let again = client.tournaments().tournament_status(&id).await?;
    assert!(Arc::ptr_eq(&status, &again));
    assert!(status.read().await.rounds[0].unscored_hands.is_empty());
    Ok(())
}

#[tokio::test]
async fn create_tournament_seeds_caches_and_cached_list() -> Result<()> {
    let mut api = FakeApi::spawn().await?;
    let client = client(&api)?;

    api.enqueue_json(StatusCode::OK, list_payload()).await;
    client.tournaments().tournaments().await?;
    api.next_request().await;

    api.enqueue_json(StatusCode::CREATED, json!({"id": "333"})).await;
    let create = TournamentRequest {
        name: "Fresh Cup".to_owned(),
        no_pairs: 2,
        no_boards: 8,
        players: vec![PlayerRequest {
            pair_no: 1,
            name: Some("Ann".to_owned()),
            email: None,
        }],
        allow_score_overwrites: false,
    };
    let tournament = client.tournaments().create_tournament(&create).await?;

    let request = api.next_request().await;
    assert_eq!(request.method, "POST");
    assert_eq!(request.path, "/api/tournaments");
    assert_eq!(
        request.body.expect("POST carries a body"),
        json!({
            "name": "Fresh Cup",
            "no_pairs": 2,
            "no_boards": 8,
            "players": [{"pair_no": 1, "name": "Ann"}],
            "allow_score_overwrites": false,
        }),
    );

    let id = TournamentId::new("333");
    assert!(client.tournament_store().has_tournament(&id));
    {
        let guard = tournament.read().await;
        assert_eq!(guard.header().read().await.name, "Fresh Cup");
        assert_eq!(guard.no_pairs(), 2);
        assert_eq!(guard.pairs[0].read().await.players[0].name, "Ann");
    }

    // The cached list picked up the new header without another request.
    let list = client.tournaments().tournaments().await?;
    assert_eq!(list.len(), 3);
    assert_eq!(list[2].read().await.name, "Fresh Cup");
    assert_eq!(api.hits(), 2);
    Ok(())
}

#[tokio::test]
async fn update_tournament_applies_the_request() -> Result<()> {
    let mut api = FakeApi::spawn().await?;
    let client = client(&api)?;
    let id = TournamentId::new("111");

    api.enqueue_empty(StatusCode::NO_CONTENT).await;
    let update = TournamentRequest {
        name: "Renamed Cup".to_owned(),
        no_pairs: 1,
        no_boards: 6,
        players: Vec::new(),
        allow_score_overwrites: true,
    };
    let tournament = client.tournaments().update_tournament(&id, &update).await?;

    let request = api.next_request().await;
    assert_eq!(request.method, "PUT");
    assert_eq!(request.path, "/api/tournaments/111");

    let guard = tournament.read().await;
    assert_eq!(guard.header().read().await.name, "Renamed Cup");
    assert_eq!(guard.no_pairs(), 1);
    assert_eq!(guard.no_boards, 6);
    Ok(())
}

#[tokio::test]
async fn delete_tournament_evicts_and_recreates_fresh() -> Result<()> {
    let mut api = FakeApi::spawn().await?;
    let client = client(&api)?;
    let id = TournamentId::new("111");

    api.enqueue_json(StatusCode::OK, list_payload()).await;
    client.tournaments().tournaments().await?;
    let old_header = client.tournament_store().header(&id);

    api.enqueue_empty(StatusCode::NO_CONTENT).await;
    client.tournaments().delete_tournament(&id).await?;
    api.next_request().await;
    let request = api.next_request().await;
    assert_eq!(request.method, "DELETE");
    assert_eq!(request.path, "/api/tournaments/111");

    assert!(!client.tournament_store().has_tournament(&id));
    let list = client.tournaments().tournaments().await?;
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].read().await.name, "Winter Warmup");
    assert_eq!(api.hits(), 2);

    // Recreation starts from a fresh object.
    assert!(!Arc::ptr_eq(
        &old_header,
        &client.tournament_store().header(&id),
    ));
    Ok(())
}

#[tokio::test]
async fn pair_codes_are_returned_and_written_back() -> Result<()> {
    let mut api = FakeApi::spawn().await?;
    let client = client(&api)?;
    let id = TournamentId::new("111");

    api.enqueue_json(StatusCode::OK, json!({"pair_ids": ["AAA", "BBB"]}))
        .await;
    let codes = client.tournaments().pair_ids(&id).await?;
    assert_eq!(api.next_request().await.path, "/api/tournaments/111/pairids");
    assert_eq!(codes, vec!["AAA".to_owned(), "BBB".to_owned()]);
    assert_eq!(
        client.tournament_store().pair(&id, 1).read().await.pair_id,
        "AAA",
    );
    assert_eq!(
        client.tournament_store().pair(&id, 2).read().await.pair_id,
        "BBB",
    );

    api.enqueue_json(StatusCode::OK, json!({"pair_id": "CCC"})).await;
    let code = client.tournaments().pair_id(&id, 3).await?;
    assert_eq!(
        api.next_request().await.path,
        "/api/tournaments/111/pairids/3",
    );
    assert_eq!(code, "CCC");
    assert_eq!(
        client.tournament_store().pair(&id, 3).read().await.pair_id,
        "CCC",
    );
    Ok(())
}
