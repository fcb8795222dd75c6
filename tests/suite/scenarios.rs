//! End-to-end exploration runs against file-backed stores and mock upstreams.

use std::time::{Duration, Instant};

use craftmap_engine::{ExploreError, ExploreState, Explorer, ScriptedPairs, UniformPairs};
use craftmap_store::ItemStore;
use craftmap_types::OrderedPair;
use craftmap_upstream::{ClientConfig, CombineClient, CombineError};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{StoreDir, budget, client_for, discovery, endpoint, mount_pair};

fn water_fire() -> OrderedPair {
    OrderedPair::new("Water", "Fire")
}

#[tokio::test]
async fn seeded_store_records_first_discovery() {
    let server = MockServer::start().await;
    mount_pair(&server, "Water", "Fire", discovery("Steam", "💨", false), 1).await;

    let dir = StoreDir::new();
    let store = ItemStore::open(dir.db_path()).unwrap();
    let mut explorer = Explorer::with_selector(
        store,
        client_for(&server),
        budget(1, 10),
        ScriptedPairs::new([water_fire()]),
    )
    .unwrap();

    let report = explorer.run().await.unwrap();
    assert!(report.state.is_exhausted());
    assert_eq!(report.successes, 1);
    drop(explorer);

    // Everything is durable across a reopen.
    let store = ItemStore::open(dir.db_path()).unwrap();
    assert_eq!(store.total_entry_count().unwrap(), 5);
    let steam = store.get_entry("Steam").unwrap().unwrap();
    assert_eq!((steam.glyph.as_str(), steam.is_new), ("💨", false));
    let combos = store.all_combinations().unwrap();
    assert_eq!(combos.len(), 1);
    assert_eq!(combos[0].pair, water_fire());
    assert_eq!(combos[0].result, "Steam");
}

#[tokio::test]
async fn throttled_call_waits_and_records_only_second_answer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "1"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_pair(&server, "Water", "Fire", discovery("Steam", "💨", true), 1).await;

    let dir = StoreDir::new();
    let store = ItemStore::open(dir.db_path()).unwrap();
    // Restore the production one second pad on top of Retry-After.
    let client = CombineClient::new(ClientConfig::with_endpoint(endpoint(&server))).unwrap();
    let mut explorer = Explorer::with_selector(
        store,
        client,
        budget(1, 1),
        ScriptedPairs::new([water_fire()]),
    )
    .unwrap();

    let started = Instant::now();
    let report = explorer.run().await.unwrap();

    assert!(started.elapsed() >= Duration::from_secs(2));
    assert_eq!((report.successes, report.attempts), (1, 1));
    assert_eq!(explorer.store().total_combination_count().unwrap(), 1);
    assert!(explorer.store().get_entry("Steam").unwrap().unwrap().is_new);
}

#[tokio::test]
async fn recorded_pair_is_never_requested_again() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(discovery("Steam", "💨", false))
        .expect(0)
        .mount(&server)
        .await;

    let dir = StoreDir::new();
    {
        let mut store = ItemStore::open(dir.db_path()).unwrap();
        store.upsert_entry("Steam", "💨", false).unwrap();
        store.insert_combination(&water_fire(), "Steam").unwrap();
    }

    let store = ItemStore::open(dir.db_path()).unwrap();
    let mut explorer = Explorer::with_selector(
        store,
        client_for(&server),
        budget(5, 3),
        ScriptedPairs::new([water_fire(), water_fire(), water_fire()]),
    )
    .unwrap();

    let report = explorer.run().await.unwrap();
    assert_eq!((report.successes, report.attempts), (0, 3));
}

#[tokio::test]
async fn server_failure_aborts_without_partial_combination() {
    let server = MockServer::start().await;
    mount_pair(&server, "Water", "Fire", discovery("Steam", "💨", false), 1).await;
    mount_pair(&server, "Steam", "Wind", ResponseTemplate::new(500), 1).await;

    let dir = StoreDir::new();
    let store = ItemStore::open(dir.db_path()).unwrap();
    let mut explorer = Explorer::with_selector(
        store,
        client_for(&server),
        budget(10, 10),
        ScriptedPairs::new([water_fire(), OrderedPair::new("Steam", "Wind")]),
    )
    .unwrap();

    let err = explorer.run().await.unwrap_err();
    assert!(matches!(
        err,
        ExploreError::Upstream {
            source: CombineError::ServerError { .. },
            ..
        }
    ));
    drop(explorer);

    let store = ItemStore::open(dir.db_path()).unwrap();
    assert!(store.get_entry("Steam").unwrap().is_some());
    assert!(!store.combination_exists(&OrderedPair::new("Steam", "Wind")).unwrap());
    assert_eq!(store.total_combination_count().unwrap(), 1);
}

#[tokio::test]
async fn uniform_run_keeps_cache_and_store_in_step() {
    let server = MockServer::start().await;
    // Every pair of seeds combines into the same thing.
    Mock::given(method("GET"))
        .respond_with(discovery("Mud", "🟫", false))
        .mount(&server)
        .await;

    let dir = StoreDir::new();
    let store = ItemStore::open(dir.db_path()).unwrap();
    let mut explorer =
        Explorer::with_selector(store, client_for(&server), budget(3, 500), UniformPairs).unwrap();

    let report = explorer.run().await.unwrap();

    assert!(report.state.is_exhausted());
    assert_eq!(report.successes, 3);
    let store = explorer.store();
    assert_eq!(store.total_combination_count().unwrap(), 3);
    let names = store.load_all_entries().unwrap();
    assert_eq!(names.len(), explorer.working_set().len());
    for (name, glyph) in &names {
        assert_eq!(explorer.working_set().glyph(name), Some(glyph.as_str()));
    }
}

#[tokio::test]
async fn run_without_pairs_aborts_cleanly() {
    let server = MockServer::start().await;
    let dir = StoreDir::new();
    let store = ItemStore::open(dir.db_path()).unwrap();
    let mut explorer = Explorer::with_selector(
        store,
        client_for(&server),
        budget(10, 10),
        ScriptedPairs::default(),
    )
    .unwrap();

    let report = explorer.run().await.unwrap();
    assert!(matches!(report.state, ExploreState::Aborted(_)));
    assert_eq!(report.attempts, 0);
}
