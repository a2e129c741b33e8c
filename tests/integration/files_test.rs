//! Integration tests for sandbox browsing, delivery, and deletion.

mod helpers;

use http::StatusCode;
use serde_json::json;

use helpers::{TestApp, path_of};

fn blob() -> Vec<u8> {
    (0..1000u32).map(|i| (i % 251) as u8).collect()
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let response = app.request("GET", "/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({ "ok": true }));
}

#[tokio::test]
async fn test_browse_unauthenticated() {
    let app = TestApp::new();
    let response = app.request("GET", "/files/browse", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app.request("GET", "/files/browse", None, Some("garbage")).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_browse_lists_directory_with_links() {
    let app = TestApp::new();
    let (user, token) = app.login("alice");
    app.seed_file(user, "movies/b.mkv", b"bb").await;
    app.seed_file(user, "movies/a b.mkv", b"a").await;
    app.seed_file(user, "movies/extras/x.txt", b"x").await;

    let response = app
        .request("GET", "/files/browse?path=movies", None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let body = &response.body;
    assert_eq!(body["cwd"], "movies");
    assert_eq!(body["parent"], "");
    assert_eq!(body["dirs"], json!([{ "name": "extras", "path": "movies/extras" }]));

    let files = body["files"].as_array().unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0]["name"], "a b.mkv");
    assert_eq!(files[0]["size"], 1);
    assert_eq!(files[0]["mime"], "video/x-matroska");
    assert_eq!(
        files[0]["streamUrl"],
        "http://seedbox.test/files/stream?path=movies%2Fa%20b.mkv"
    );
    assert_eq!(
        files[0]["downloadUrl"],
        "http://seedbox.test/files/download?path=movies%2Fa%20b.mkv"
    );
    assert!(files[0]["directUrl"]
        .as_str()
        .unwrap()
        .starts_with("http://seedbox.test/files/direct/"));
}

#[tokio::test]
async fn test_browse_root_of_new_user_is_empty() {
    let app = TestApp::new();
    let (_, token) = app.login("fresh");

    let response = app.request("GET", "/files/browse", None, Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["cwd"], "");
    assert!(response.body["parent"].is_null());
    assert_eq!(response.body["files"], json!([]));
}

#[tokio::test]
async fn test_browse_missing_and_non_directory() {
    let app = TestApp::new();
    let (user, token) = app.login("alice");
    app.seed_file(user, "clip.mp4", b"1").await;

    let missing = app
        .request("GET", "/files/browse?path=nope", None, Some(&token))
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let file = app
        .request("GET", "/files/browse?path=clip.mp4", None, Some(&token))
        .await;
    assert_eq!(file.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stream_honors_single_range() {
    let app = TestApp::new();
    let (user, token) = app.login("alice");
    let data = blob();
    app.seed_file(user, "video.mp4", &data).await;

    let partial = app
        .get_raw("/files/stream?path=video.mp4", Some(&token), Some("bytes=200-299"))
        .await;
    assert_eq!(partial.status, StatusCode::PARTIAL_CONTENT);
    assert_eq!(partial.headers["content-range"], "bytes 200-299/1000");
    assert_eq!(partial.headers["content-length"], "100");
    assert_eq!(partial.headers["accept-ranges"], "bytes");
    assert_eq!(partial.headers["content-type"], "video/mp4");
    assert!(partial.headers.get("content-disposition").is_none());
    assert_eq!(&partial.body[..], &data[200..300]);

    let full = app.get_raw("/files/stream?path=video.mp4", Some(&token), None).await;
    assert_eq!(full.status, StatusCode::OK);
    assert_eq!(full.headers["content-length"], "1000");
    assert_eq!(&full.body[..], &data[..]);
}

#[tokio::test]
async fn test_unusable_range_serves_full_content() {
    let app = TestApp::new();
    let (user, token) = app.login("alice");
    app.seed_file(user, "video.mp4", &blob()).await;

    for range in ["bytes=0-10,20-30", "bytes=5000-", "lines=1-2", "bytes=x-y"] {
        let response = app
            .get_raw("/files/stream?path=video.mp4", Some(&token), Some(range))
            .await;
        assert_eq!(response.status, StatusCode::OK, "{range}");
        assert_eq!(response.headers["content-length"], "1000", "{range}");
        assert!(response.headers.get("content-range").is_none(), "{range}");
    }
}

#[tokio::test]
async fn test_download_forces_attachment() {
    let app = TestApp::new();
    let (user, token) = app.login("alice");
    app.seed_file(user, "docs/Résumé final.pdf", b"%PDF").await;

    let response = app
        .get_raw(
            "/files/download?path=docs%2FR%C3%A9sum%C3%A9%20final.pdf",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.headers["content-disposition"],
        "attachment; filename*=UTF-8''R%C3%A9sum%C3%A9%20final.pdf"
    );
    assert_eq!(&response.body[..], b"%PDF");
}

#[tokio::test]
async fn test_stream_requires_path() {
    let app = TestApp::new();
    let (_, token) = app.login("alice");

    let response = app.request("GET", "/files/stream", None, Some(&token)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app.request("GET", "/files/stream?path=", None, Some(&token)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_traversal_is_rejected() {
    let app = TestApp::new();
    let (_, token) = app.login("alice");

    for path in [
        "/files/stream?path=a%2F..%2F..%2Fetc%2Fpasswd",
        "/files/browse?path=..",
        "/files/download?path=..%2F..%2F..%2Fetc%2Fpasswd",
    ] {
        let response = app.request("GET", path, None, Some(&token)).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{path}");
        assert_eq!(response.body["error"], "PATH_TRAVERSAL", "{path}");
    }
}

#[tokio::test]
async fn test_users_cannot_reach_each_other() {
    let app = TestApp::new();
    let (alice, _) = app.login("alice");
    let (_, bob_token) = app.login("bob");
    app.seed_file(alice, "secret.mkv", b"private").await;

    let response = app
        .request("GET", "/files/stream?path=secret.mkv", None, Some(&bob_token))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let escape = format!("/files/stream?path=..%2F{alice}%2Fsecret.mkv");
    let response = app.request("GET", &escape, None, Some(&bob_token)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_browse_direct_link_plays_without_login() {
    let app = TestApp::new();
    let (user, token) = app.login("alice");
    app.seed_file(user, "clip.mp4", &blob()).await;

    let listing = app.request("GET", "/files/browse", None, Some(&token)).await;
    let direct = path_of(listing.body["files"][0]["directUrl"].as_str().unwrap());

    let response = app.get_raw(&direct, None, Some("bytes=0-9")).await;
    assert_eq!(response.status, StatusCode::PARTIAL_CONTENT);
    assert_eq!(response.headers["content-range"], "bytes 0-9/1000");
    assert!(response.headers.get("content-disposition").is_none());
}

#[tokio::test]
async fn test_delete_file_and_directory() {
    let app = TestApp::new();
    let (user, token) = app.login("alice");
    app.seed_file(user, "season/ep1.mkv", b"one").await;
    app.seed_file(user, "season/ep2.mkv", b"two").await;
    app.seed_file(user, "keep/k.bin", b"k").await;

    let response = app
        .request("DELETE", "/files/delete", Some(json!({ "path": "season/ep1.mkv" })), Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["deleted"], true);
    assert!(!app.user_dir(user).join("season/ep1.mkv").exists());
    assert!(app.user_dir(user).join("season/ep2.mkv").exists());

    let response = app
        .request("DELETE", "/files/delete", Some(json!({ "path": "season" })), Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(!app.user_dir(user).join("season").exists());

    let again = app
        .request("DELETE", "/files/delete", Some(json!({ "path": "season" })), Some(&token))
        .await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);

    let root = app
        .request("DELETE", "/files/delete", Some(json!({ "path": "/" })), Some(&token))
        .await;
    assert_eq!(root.status, StatusCode::BAD_REQUEST);
    assert!(app.user_dir(user).join("keep/k.bin").exists());

    let empty = app
        .request("DELETE", "/files/delete", Some(json!({})), Some(&token))
        .await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_storage_usage_walks_sandbox() {
    let app = TestApp::with_quota(10_000);
    let (user, token) = app.login("alice");
    app.seed_file(user, "a.bin", &[0u8; 300]).await;
    app.seed_file(user, "nested/b.bin", &[0u8; 200]).await;

    let response = app.request("GET", "/storage/usage", None, Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["usedBytes"], 500);
    assert_eq!(response.body["quotaBytes"], 10_000);
    assert_eq!(response.body["availableBytes"], 9_500);
    assert_eq!(response.body["used"], "500 B");
}
