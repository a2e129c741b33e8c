//! Integration tests for capability links redeemed without a login.

mod helpers;

use chrono::Utc;
use http::StatusCode;
use serde_json::json;

use seedbox_auth::{CapabilityPayload, CapabilityResource};
use seedbox_core::types::{TransferId, UserId};
use seedbox_engine::EngineFile;
use seedbox_entity::delivery::Disposition;

use helpers::{HASH, TestApp, eventually};

fn sign(app: &TestApp, resource: CapabilityResource, disposition: Disposition, owner: Option<UserId>) -> String {
    let payload = CapabilityPayload {
        resource,
        disposition,
        owner,
    };
    app.state.capabilities.issue(&payload, 3600).unwrap().token
}

fn file(path: &str) -> CapabilityResource {
    CapabilityResource::File {
        path: path.to_string(),
    }
}

fn artifact(index: usize) -> CapabilityResource {
    CapabilityResource::Artifact {
        session: TransferId::new(HASH),
        index,
    }
}

async fn live_session(app: &TestApp) -> (UserId, String) {
    let (user, token) = app.login("alice");
    let magnet = format!("magnet:?xt=urn:btih:{HASH}");
    let response = app
        .request("POST", "/torrents", Some(json!({ "magnet": magnet })), Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::ACCEPTED);
    eventually(|| app.state.registry.len() == 1).await;

    let id = TransferId::new(HASH);
    let files = vec![EngineFile {
        name: "movie.mp4".to_string(),
        path: "movie/movie.mp4".to_string(),
        length: 8,
    }];
    app.engine.resolve_metadata(&id, "movie", files).await.unwrap();
    app.engine.write_piece(&id, 0, b"abcdefgh").await.unwrap();
    (user, token)
}

#[tokio::test]
async fn test_garbage_and_tampered_tokens_are_invalid() {
    let app = TestApp::new();
    let (user, _) = app.login("alice");
    app.seed_file(user, "a.mp4", b"data").await;

    let garbage = app.request("GET", "/files/direct/not-a-token", None, None).await;
    assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);
    assert_eq!(garbage.body["error"], "TOKEN_INVALID");

    let token = sign(&app, file("a.mp4"), Disposition::Stream, Some(user));
    let at = token.find('.').unwrap() + 5;
    let mut tampered = token.into_bytes();
    tampered[at] = if tampered[at] == b'x' { b'y' } else { b'x' };
    let tampered = String::from_utf8(tampered).unwrap();

    let response = app
        .request("GET", &format!("/files/direct/{tampered}"), None, None)
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"], "TOKEN_INVALID");
}

#[tokio::test]
async fn test_expired_token() {
    let app = TestApp::new();
    let (user, _) = app.login("alice");
    app.seed_file(user, "a.mp4", b"data").await;

    let payload = CapabilityPayload {
        resource: file("a.mp4"),
        disposition: Disposition::Stream,
        owner: Some(user),
    };
    let issued = app
        .state
        .capabilities
        .issue_at(&payload, 60, Utc::now().timestamp() - 120)
        .unwrap();

    let response = app
        .request("GET", &format!("/files/direct/{}", issued.token), None, None)
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"], "TOKEN_EXPIRED");
}

#[tokio::test]
async fn test_file_token_delivers_per_disposition() {
    let app = TestApp::new();
    let (user, _) = app.login("alice");
    app.seed_file(user, "clips/a b.mp4", b"0123456789").await;

    let stream = sign(&app, file("clips/a b.mp4"), Disposition::Stream, Some(user));
    let response = app
        .get_raw(&format!("/files/direct/{stream}"), None, Some("bytes=2-4"))
        .await;
    assert_eq!(response.status, StatusCode::PARTIAL_CONTENT);
    assert_eq!(&response.body[..], b"234");
    assert!(response.headers.get("content-disposition").is_none());

    let download = sign(&app, file("clips/a b.mp4"), Disposition::Attachment, Some(user));
    let response = app.get_raw(&format!("/files/direct/{download}"), None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.headers["content-disposition"],
        "attachment; filename*=UTF-8''a%20b.mp4"
    );
}

#[tokio::test]
async fn test_file_token_cannot_escape_sandbox() {
    let app = TestApp::new();
    let (alice, _) = app.login("alice");
    let (bob, _) = app.login("bob");
    app.seed_file(alice, "private.mp4", b"secret").await;

    let token = sign(
        &app,
        file(&format!("../{alice}/private.mp4")),
        Disposition::Stream,
        Some(bob),
    );
    let response = app.request("GET", &format!("/files/direct/{token}"), None, None).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "PATH_TRAVERSAL");
}

#[tokio::test]
async fn test_ownerless_file_token_is_rejected() {
    let app = TestApp::new();
    let token = sign(&app, file("a.mp4"), Disposition::Stream, None);
    let response = app.request("GET", &format!("/files/direct/{token}"), None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"], "TOKEN_INVALID");
}

#[tokio::test]
async fn test_artifact_token_follows_session_ownership() {
    let app = TestApp::new();
    let (alice, _) = live_session(&app).await;
    let (bob, _) = app.login("bob");

    let own = sign(&app, artifact(0), Disposition::Stream, Some(alice));
    let response = app.get_raw(&format!("/files/direct/{own}"), None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(&response.body[..], b"abcdefgh");

    let public = sign(&app, artifact(0), Disposition::Stream, None);
    let response = app.get_raw(&format!("/files/direct/{public}"), None, None).await;
    assert_eq!(response.status, StatusCode::OK);

    let foreign = sign(&app, artifact(0), Disposition::Stream, Some(bob));
    let response = app.request("GET", &format!("/files/direct/{foreign}"), None, None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let out_of_range = sign(&app, artifact(5), Disposition::Stream, Some(alice));
    let response = app
        .request("GET", &format!("/files/direct/{out_of_range}"), None, None)
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_artifact_token_ends_with_session() {
    let app = TestApp::new();
    let (alice, token) = live_session(&app).await;
    let link = sign(&app, artifact(0), Disposition::Attachment, Some(alice));

    let stop = app
        .request("PUT", &format!("/torrents/{HASH}/stop"), None, Some(&token))
        .await;
    assert_eq!(stop.status, StatusCode::OK);

    let response = app.request("GET", &format!("/files/direct/{link}"), None, None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    // The bytes are still reachable as a sandbox file.
    let file_link = sign(&app, file("movie/movie.mp4"), Disposition::Stream, Some(alice));
    let response = app.get_raw(&format!("/files/direct/{file_link}"), None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(&response.body[..], b"abcdefgh");
}
