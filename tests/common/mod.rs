//! Shared test utilities and fixtures
//!
//! Mock combine endpoints and throwaway stores for integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use craftmap_engine::ExploreBudget;
use craftmap_upstream::{ClientConfig, CombineClient, RateLimitPolicy};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const PAIR_PATH: &str = "/api/infinite-craft/pair";

/// Endpoint URL of the mock combine API.
pub fn endpoint(server: &MockServer) -> String {
    format!("{}{PAIR_PATH}", server.uri())
}

/// Client against `server` that never pads 429 waits.
pub fn client_for(server: &MockServer) -> CombineClient {
    CombineClient::new(ClientConfig {
        rate_limit: RateLimitPolicy {
            padding: Duration::ZERO,
            ..RateLimitPolicy::default()
        },
        ..ClientConfig::with_endpoint(endpoint(server))
    })
    .expect("build client")
}

pub fn budget(max_successes: u64, max_attempts: u64) -> ExploreBudget {
    ExploreBudget {
        max_successes,
        max_attempts,
        pacing: Duration::ZERO,
    }
}

pub fn discovery(result: &str, emoji: &str, is_new: bool) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "result": result,
        "emoji": emoji,
        "isNew": is_new,
    }))
}

/// Answer `first + second` with `response`, asserting the number of calls.
pub async fn mount_pair(
    server: &MockServer,
    first: &str,
    second: &str,
    response: ResponseTemplate,
    calls: u64,
) {
    Mock::given(method("GET"))
        .and(path(PAIR_PATH))
        .and(query_param("first", first))
        .and(query_param("second", second))
        .respond_with(response)
        .expect(calls)
        .mount(server)
        .await;
}

/// Temp directory holding a not-yet-created store file.
pub struct StoreDir {
    pub dir: TempDir,
}

impl StoreDir {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.dir.path().join("items.db")
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}
