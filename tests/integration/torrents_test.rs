//! Integration tests for transfer admission, polling, and termination.

mod helpers;

use http::StatusCode;
use serde_json::json;

use seedbox_core::types::TransferId;
use seedbox_engine::EngineFile;

use helpers::{HASH, TestApp, eventually, path_of};

fn magnet() -> String {
    format!("magnet:?xt=urn:btih:{HASH}&dn=demo&tr=udp%3A%2F%2Fextra.test%3A80")
}

fn files(length: u64) -> Vec<EngineFile> {
    vec![EngineFile {
        name: "demo.mkv".to_string(),
        path: "demo/demo.mkv".to_string(),
        length,
    }]
}

/// Admit the demo magnet for a fresh user and wait for registration.
async fn admitted(app: &TestApp) -> (seedbox_core::types::UserId, String) {
    let (user, token) = app.login("alice");
    let response = app
        .request("POST", "/torrents", Some(json!({ "magnet": magnet() })), Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::ACCEPTED);
    assert_eq!(response.body["status"], "accepted");
    eventually(|| app.state.registry.len() == 1).await;
    (user, token)
}

#[tokio::test]
async fn test_create_requires_login_and_magnet() {
    let app = TestApp::new();
    let response = app
        .request("POST", "/torrents", Some(json!({ "magnet": magnet() })), None)
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let (_, token) = app.login("alice");
    let missing = app.request("POST", "/torrents", Some(json!({})), Some(&token)).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.body["message"], "magnet is required");

    let bogus = app
        .request("POST", "/torrents", Some(json!({ "magnet": "http://not-a-magnet" })), Some(&token))
        .await;
    assert_eq!(bogus.status, StatusCode::BAD_REQUEST);
    assert!(app.state.registry.is_empty());
}

#[tokio::test]
async fn test_create_with_non_ascii_magnet_is_a_validation_error() {
    let app = TestApp::new();
    let (_, token) = app.login("alice");

    for magnet in ["magnet:\u{e9}xt=1", "magnet:?xt=urn:btia%C3%A9aaaa"] {
        let response = app
            .request("POST", "/torrents", Some(json!({ "magnet": magnet })), Some(&token))
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body["error"], "VALIDATION");
    }
    assert!(app.state.registry.is_empty());
}

#[tokio::test]
async fn test_create_over_quota_is_refused_synchronously() {
    let app = TestApp::with_quota(100);
    let (user, token) = app.login("alice");
    app.seed_file(user, "old.bin", &[0u8; 80]).await;

    let response = app
        .request(
            "POST",
            "/torrents",
            Some(json!({ "magnet": magnet(), "torrentSize": 30 })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.body["error"], "QUOTA_EXCEEDED");
    let details = &response.body["details"];
    assert_eq!(details["required"], "30 B");
    assert_eq!(details["available"], "20 B");
    assert_eq!(details["currentUsage"], "80 B");
    assert_eq!(details["quota"], "100 B");

    tokio::task::yield_now().await;
    assert!(app.state.registry.is_empty());
}

#[tokio::test]
async fn test_admission_registers_with_engine() {
    let app = TestApp::new();
    let (_, token) = admitted(&app).await;

    let sim = app.engine.simulated(&TransferId::new(HASH)).expect("engine holds transfer");
    let trackers = sim.trackers();
    assert!(trackers.contains(&"udp://tracker.test:1337".to_string()));
    assert!(trackers.contains(&"udp://extra.test:80".to_string()));

    let list = app.request("GET", "/torrents", None, Some(&token)).await;
    assert_eq!(list.status, StatusCode::OK);
    let items = list.body.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], HASH);
    assert_eq!(items[0]["state"], "initializing");
    assert_eq!(items[0]["done"], false);
}

#[tokio::test]
async fn test_detail_lists_artifacts_with_links() {
    let app = TestApp::new();
    let (_, token) = admitted(&app).await;
    let id = TransferId::new(HASH);
    let data: Vec<u8> = (0..1000u32).map(|i| (i % 251) as u8).collect();

    app.engine.resolve_metadata(&id, "demo", files(1000)).await.unwrap();
    app.engine.write_piece(&id, 0, &data[..500]).await.unwrap();

    let detail = app
        .request("GET", &format!("/torrents/{HASH}"), None, Some(&token))
        .await;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(detail.body["name"], "demo");
    assert_eq!(detail.body["state"], "active");
    assert_eq!(detail.body["progress"], 50.0);

    let file = &detail.body["files"][0];
    assert_eq!(file["index"], 0);
    assert_eq!(file["length"], 1000);
    assert_eq!(
        file["streamUrl"],
        format!("http://seedbox.test/torrents/{HASH}/files/0/stream")
    );
    assert_eq!(
        file["downloadUrl"],
        format!("http://seedbox.test/torrents/{HASH}/files/0/download")
    );

    let stream = app
        .get_raw(&path_of(file["streamUrl"].as_str().unwrap()), Some(&token), Some("bytes=100-199"))
        .await;
    assert_eq!(stream.status, StatusCode::PARTIAL_CONTENT);
    assert_eq!(stream.headers["content-range"], "bytes 100-199/500");
    assert_eq!(&stream.body[..], &data[100..200]);

    let direct = app
        .get_raw(&path_of(file["directDownloadUrl"].as_str().unwrap()), None, None)
        .await;
    assert_eq!(direct.status, StatusCode::OK);
    assert_eq!(
        direct.headers["content-disposition"],
        "attachment; filename*=UTF-8''demo.mkv"
    );

    let missing = app
        .get_raw(&format!("/torrents/{HASH}/files/3/stream"), Some(&token), None)
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_foreign_session_looks_missing() {
    let app = TestApp::new();
    admitted(&app).await;
    let (_, bob) = app.login("bob");

    let foreign = app
        .request("GET", &format!("/torrents/{HASH}"), None, Some(&bob))
        .await;
    let missing = app
        .request("GET", "/torrents/nonexistent-id", None, Some(&bob))
        .await;
    assert_eq!(foreign.status, StatusCode::NOT_FOUND);
    assert_eq!(foreign.status, missing.status);
    assert_eq!(foreign.body, missing.body);

    let list = app.request("GET", "/torrents", None, Some(&bob)).await;
    assert_eq!(list.body, json!([]));

    let stop = app
        .request("PUT", &format!("/torrents/{HASH}/stop"), None, Some(&bob))
        .await;
    assert_eq!(stop.status, StatusCode::NOT_FOUND);
    assert_eq!(app.state.registry.len(), 1);
}

#[tokio::test]
async fn test_stop_keeps_files_and_deregisters() {
    let app = TestApp::new();
    let (user, token) = admitted(&app).await;
    let id = TransferId::new(HASH);
    app.engine.resolve_metadata(&id, "demo", files(10)).await.unwrap();
    app.engine.write_piece(&id, 0, b"01234").await.unwrap();

    let stop = app
        .request("PUT", &format!("/torrents/{HASH}/stop"), None, Some(&token))
        .await;
    assert_eq!(stop.status, StatusCode::OK);
    assert_eq!(stop.body, json!({ "stopped": true, "id": HASH }));

    assert!(app.state.registry.is_empty());
    assert!(app.engine.simulated(&id).is_none());
    assert!(app.user_dir(user).join("demo/demo.mkv").exists());

    let show = app
        .request("GET", &format!("/torrents/{HASH}"), None, Some(&token))
        .await;
    assert_eq!(show.status, StatusCode::NOT_FOUND);

    let destroy = app
        .request("DELETE", &format!("/torrents/{HASH}"), None, Some(&token))
        .await;
    assert_eq!(destroy.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_destroy_is_the_same_terminal_transition() {
    let app = TestApp::new();
    let (_, token) = admitted(&app).await;

    let destroy = app
        .request("DELETE", &format!("/torrents/{HASH}"), None, Some(&token))
        .await;
    assert_eq!(destroy.status, StatusCode::OK);
    assert_eq!(destroy.body["removed"], true);
    assert!(app.state.registry.is_empty());
}

#[tokio::test]
async fn test_completion_deregisters_and_updates_usage() {
    let app = TestApp::new();
    let (_, token) = admitted(&app).await;
    let id = TransferId::new(HASH);

    app.engine.resolve_metadata(&id, "demo", files(10)).await.unwrap();
    app.engine.write_piece(&id, 0, b"0123456789").await.unwrap();
    app.engine.complete(&id).await.unwrap();

    eventually(|| app.state.registry.is_empty()).await;
    assert!(app.engine.simulated(&id).is_none());

    let usage = app.request("GET", "/storage/usage", None, Some(&token)).await;
    assert_eq!(usage.body["usedBytes"], 10);

    let browse = app
        .request("GET", "/files/browse?path=demo", None, Some(&token))
        .await;
    assert_eq!(browse.body["files"][0]["name"], "demo.mkv");
}

#[tokio::test]
async fn test_engine_errors_surface_through_polling() {
    let app = TestApp::new();
    let (_, token) = admitted(&app).await;
    let id = TransferId::new(HASH);

    app.engine.fail(&id, "no peers").await.unwrap();
    eventually(|| {
        app.state
            .registry
            .get(&id, None)
            .map(|s| s.error.is_some())
            .unwrap_or(false)
    })
    .await;

    let list = app.request("GET", "/torrents", None, Some(&token)).await;
    assert_eq!(list.body[0]["error"], "no peers");
}
