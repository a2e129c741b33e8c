//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, Bytes};
use http::{HeaderMap, Request, StatusCode};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use seedbox_api::AppState;
use seedbox_auth::JwtEncoder;
use seedbox_core::config::AppConfig;
use seedbox_core::types::UserId;
use seedbox_database::MemoryAccountStore;
use seedbox_engine::SimulatedEngine;

/// A valid magnet for a 40-hex info-hash.
pub const HASH: &str = "c12fe1c06bba254a9dc9f519b335aa7c1367a88a";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Handles shared with the router
    pub state: AppState,
    /// Engine driven by hand from tests
    pub engine: SimulatedEngine,
    /// Account store backing the quota guard
    pub accounts: Arc<MemoryAccountStore>,
    /// Application config
    pub config: AppConfig,
    _root: TempDir,
}

impl TestApp {
    /// Create a new test application with a generous default quota.
    pub fn new() -> Self {
        Self::with_quota(1 << 30)
    }

    /// Create a new test application whose users get `quota` bytes.
    pub fn with_quota(quota: u64) -> Self {
        let root = tempfile::tempdir().expect("Failed to create sandbox root");

        let mut config = AppConfig::default();
        config.storage.root_path = root.path().to_string_lossy().into_owned();
        config.storage.default_quota_bytes = quota;
        config.auth.jwt_secret = "integration-secret".to_string();
        config.engine.trackers = vec!["udp://tracker.test:1337".to_string()];

        let accounts = Arc::new(MemoryAccountStore::new(quota));
        let engine = SimulatedEngine::new(config.engine.event_buffer);

        let state = seedbox_api::build_state(config.clone(), accounts.clone(), Arc::new(engine.clone()));
        let router = seedbox_api::build_app(state.clone());

        Self {
            router,
            state,
            engine,
            accounts,
            config,
            _root: root,
        }
    }

    /// Login token for a fresh user.
    pub fn login(&self, username: &str) -> (UserId, String) {
        let user = UserId::new();
        (user, self.token_for(user, username))
    }

    /// Login token for `user`.
    pub fn token_for(&self, user: UserId, username: &str) -> String {
        JwtEncoder::new(&self.config.auth)
            .generate_access_token(user, username)
            .expect("Failed to sign login token")
            .0
    }

    /// Where `user`'s sandbox lives.
    pub fn user_dir(&self, user: UserId) -> PathBuf {
        PathBuf::from(&self.config.storage.root_path)
            .join(&self.config.storage.users_dir)
            .join(user.to_string())
    }

    /// Write `data` to `relative` inside `user`'s sandbox.
    pub async fn seed_file(&self, user: UserId, relative: &str, data: &[u8]) {
        let path = self.user_dir(user).join(relative);
        tokio::fs::create_dir_all(path.parent().expect("file has a parent"))
            .await
            .expect("Failed to create directories");
        tokio::fs::write(path, data).await.expect("Failed to seed file");
    }

    /// Make a JSON request to the test app.
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Host", "seedbox.test")
            .header("Content-Type", "application/json");

        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }

        let req = req.body(Body::from(body_str)).expect("Failed to build request");
        let raw = self.send(req).await;
        let body: Value = serde_json::from_slice(&raw.body).unwrap_or(Value::Null);

        TestResponse {
            status: raw.status,
            body,
        }
    }

    /// GET `path` and keep the raw bytes and headers.
    pub async fn get_raw(&self, path: &str, token: Option<&str>, range: Option<&str>) -> RawResponse {
        let mut req = Request::builder()
            .method("GET")
            .uri(path)
            .header("Host", "seedbox.test");
        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }
        if let Some(range) = range {
            req = req.header("Range", range);
        }
        self.send(req.body(Body::empty()).expect("Failed to build request"))
            .await
    }

    async fn send(&self, req: Request<Body>) -> RawResponse {
        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), 16 * 1024 * 1024)
            .await
            .expect("Failed to read body");

        RawResponse { status, headers, body }
    }
}

/// Poll `check` until it holds, yielding to background tasks in between.
pub async fn eventually(mut check: impl FnMut() -> bool) {
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}

/// Response from a JSON request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}

/// Response with raw body bytes
#[derive(Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Strip the scheme and host from an absolute link so it can be routed.
pub fn path_of(url: &str) -> String {
    url.strip_prefix("http://seedbox.test")
        .unwrap_or(url)
        .to_string()
}
