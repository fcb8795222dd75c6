//! Drives the `craftmap` binary as a subprocess.

use std::path::Path;
use std::process::{Command, Output};

use craftmap_store::ItemStore;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{PAIR_PATH, StoreDir, discovery, endpoint};

fn craftmap(dir: &StoreDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_craftmap"))
        .args(args)
        .current_dir(dir.dir.path())
        // Keep a developer's own config out of the run.
        .env("CRAFTMAP_CONFIG", dir.file("absent-by-default.toml"))
        .env("RUST_LOG", "warn")
        .output()
        .expect("run craftmap")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn write_config(dir: &StoreDir, body: &str) -> String {
    let path = dir.file("config.toml");
    std::fs::write(&path, body).expect("write config");
    path.display().to_string()
}

fn path_str(path: &Path) -> String {
    path.display().to_string()
}

#[test]
fn count_reads_existing_store() {
    let dir = StoreDir::new();
    drop(ItemStore::open(dir.db_path()).unwrap());
    let config = write_config(&dir, "");
    let store = path_str(&dir.db_path());

    let output = craftmap(&dir, &["--config", &config, "--store", &store, "count"]);

    assert!(output.status.success(), "{output:?}");
    assert_eq!(stdout(&output), "4");
}

#[test]
fn read_commands_refuse_missing_store() {
    let dir = StoreDir::new();
    let config = write_config(&dir, "");
    let typo = dir.file("typo.db");
    let out = dir.file("snapshot.json");

    let count = craftmap(&dir, &["--config", &config, "--store", &path_str(&typo), "count"]);
    let export = craftmap(
        &dir,
        &["--config", &config, "--store", &path_str(&typo), "export", "--out", &path_str(&out)],
    );

    assert!(!count.status.success(), "{count:?}");
    assert!(!export.status.success(), "{export:?}");
    assert!(stdout(&count).is_empty());
    // The diagnostic is reported once, not logged and then printed again.
    let stderr = String::from_utf8_lossy(&count.stderr);
    assert_eq!(stderr.matches("no item store at").count(), 1, "{stderr}");
    assert!(!typo.exists());
    assert!(!out.exists());
}

#[test]
fn export_writes_elements_snapshot() {
    let dir = StoreDir::new();
    {
        let mut store = ItemStore::open(dir.db_path()).unwrap();
        store.upsert_entry("Steam", "💨", true).unwrap();
    }
    let config = write_config(
        &dir,
        &format!("[store]\npath = {:?}\n", path_str(&dir.db_path())),
    );
    let out = dir.file("snapshot.json");

    let output = craftmap(&dir, &["--config", &config, "export", "--out", &path_str(&out)]);

    assert!(output.status.success(), "{output:?}");
    assert_eq!(stdout(&output), "5");
    let json: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&out).unwrap()).unwrap();
    let elements = json["elements"].as_array().unwrap();
    assert_eq!(elements.len(), 5);
    assert_eq!(
        elements[4],
        serde_json::json!({"text": "Steam", "emoji": "💨", "discovered": true})
    );
}

#[test]
fn unreadable_explicit_config_fails() {
    let dir = StoreDir::new();
    let missing = path_str(&dir.file("nope.toml"));

    let output = craftmap(&dir, &["--config", &missing, "count"]);

    assert!(!output.status.success());
}

#[tokio::test]
async fn explore_against_mock_upstream() {
    let server = MockServer::start().await;
    // Whatever pair gets drawn, it combines into Mud.
    Mock::given(method("GET"))
        .and(path(PAIR_PATH))
        .respond_with(discovery("Mud", "🟫", false))
        .expect(1)
        .mount(&server)
        .await;

    let dir = StoreDir::new();
    let config = write_config(
        &dir,
        &format!(
            "[store]\npath = {:?}\n[explore]\npacing_ms = 0\n[upstream]\nendpoint = {:?}\n",
            path_str(&dir.db_path()),
            endpoint(&server),
        ),
    );

    let (dir, output) = tokio::task::spawn_blocking(move || {
        let output = craftmap(
            &dir,
            &["--config", &config, "explore", "--max-successes", "1", "--max-attempts", "5"],
        );
        (dir, output)
    })
    .await
    .unwrap();

    assert!(output.status.success(), "{output:?}");
    assert_eq!(stdout(&output), "successes: 1, attempts: 1, entries: 5");
    let store = ItemStore::open(dir.db_path()).unwrap();
    assert_eq!(store.total_combination_count().unwrap(), 1);
}

#[tokio::test]
async fn explore_exits_nonzero_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let dir = StoreDir::new();
    let config = write_config(
        &dir,
        &format!(
            "[store]\npath = {:?}\n[explore]\npacing_ms = 0\n[upstream]\nendpoint = {:?}\n",
            path_str(&dir.db_path()),
            endpoint(&server),
        ),
    );

    let (dir, output) = tokio::task::spawn_blocking(move || {
        let output = craftmap(&dir, &["--config", &config, "explore"]);
        (dir, output)
    })
    .await
    .unwrap();

    assert!(!output.status.success());
    let store = ItemStore::open(dir.db_path()).unwrap();
    assert_eq!(store.total_combination_count().unwrap(), 0);
}
