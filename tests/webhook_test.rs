//! Webhook decisions, both through the provider and over HTTP.

mod common;

use anibridge_library::{Error, LibraryProvider, WebhookOutcome, WebhookRequest};
use common::JellyfinMock;
use serde_json::json;

fn json_request(value: serde_json::Value) -> WebhookRequest {
    WebhookRequest::json(value.to_string())
}

#[tokio::test]
async fn playback_by_provider_user_syncs_series() {
    let mock = JellyfinMock::start().await;
    let provider = mock.provider().await;

    let outcome = provider
        .parse_webhook(&json_request(json!({
            "NotificationType": "PlaybackStop",
            "ItemType": "Episode",
            "ItemId": "episode-1",
            "SeriesId": "show-1",
            "NotificationUsername": "Demo",
        })))
        .await
        .unwrap();
    assert_eq!(outcome, WebhookOutcome::sync(vec!["show-1".into()]));
}

#[tokio::test]
async fn user_matches_by_id_ignoring_dashes_and_case() {
    let mock = JellyfinMock::start().await;
    let provider = mock.provider().await;

    let outcome = provider
        .parse_webhook(&json_request(json!({
            "NotificationType": "UserDataSaved",
            "ItemType": "Movie",
            "ItemId": "movie-1",
            "UserId": "USER1",
        })))
        .await
        .unwrap();
    assert_eq!(outcome, WebhookOutcome::sync(vec!["movie-1".into()]));
}

#[tokio::test]
async fn other_users_are_ignored() {
    let mock = JellyfinMock::start().await;
    let provider = mock.provider().await;

    let outcome = provider
        .parse_webhook(&json_request(json!({
            "NotificationType": "PlaybackStop",
            "ItemType": "Movie",
            "ItemId": "movie-1",
            "UserId": "user-2",
            "NotificationUsername": "Other",
        })))
        .await
        .unwrap();
    assert_eq!(outcome, WebhookOutcome::ignored());
}

#[tokio::test]
async fn item_added_ignores_user() {
    let mock = JellyfinMock::start().await;
    let provider = mock.provider().await;

    let outcome = provider
        .parse_webhook(&json_request(json!({
            "NotificationType": "ItemAdded",
            "ItemType": "Season",
            "ItemId": "season-1",
            "SeriesId": "show-1",
            "NotificationUsername": "Other",
        })))
        .await
        .unwrap();
    assert_eq!(outcome, WebhookOutcome::sync(vec!["show-1".into()]));
}

#[tokio::test]
async fn unrelated_events_are_ignored() {
    let mock = JellyfinMock::start().await;
    let provider = mock.provider().await;

    for event in ["PlaybackStart", "SessionStart", "ItemDeleted"] {
        let outcome = provider
            .parse_webhook(&json_request(json!({
                "NotificationType": event,
                "ItemId": "movie-1",
                "NotificationUsername": "Demo",
            })))
            .await
            .unwrap();
        assert!(!outcome.matched, "{event} should be ignored");
    }
}

#[tokio::test]
async fn series_id_alone_identifies_episode() {
    let mock = JellyfinMock::start().await;
    let provider = mock.provider().await;

    let outcome = provider
        .parse_webhook(&json_request(json!({
            "NotificationType": "ItemAdded",
            "ItemType": "Episode",
            "SeriesId": "show-1",
        })))
        .await
        .unwrap();
    assert_eq!(outcome, WebhookOutcome::sync(vec!["show-1".into()]));

    let outcome = provider
        .parse_webhook(&json_request(json!({
            "NotificationType": "PlaybackStop",
            "ItemType": "Episode",
            "SeriesId": "show-1",
            "NotificationUsername": "Demo",
        })))
        .await
        .unwrap();
    assert_eq!(outcome, WebhookOutcome::sync(vec!["show-1".into()]));
}

#[tokio::test]
async fn missing_fields_are_errors() {
    let mock = JellyfinMock::start().await;
    let provider = mock.provider().await;

    for payload in [
        json!({ "ItemId": "movie-1" }),
        json!({ "NotificationType": "ItemAdded", "ItemId": "  " }),
    ] {
        let err = provider
            .parse_webhook(&json_request(payload))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Webhook(_)));
    }
}

#[tokio::test]
async fn listener_accepts_form_payload() {
    let mock = JellyfinMock::start().await;
    let addr = mock.with_listener().await;

    let payload = json!({
        "NotificationType": "PlaybackStop",
        "ItemType": "Movie",
        "ItemId": "movie-1",
        "NotificationUsername": "demo",
    })
    .to_string();

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/webhook"))
        .form(&[("payload", payload.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let outcome: WebhookOutcome = resp.json().await.unwrap();
    assert_eq!(outcome, WebhookOutcome::sync(vec!["movie-1".into()]));
}

#[tokio::test]
async fn listener_rejects_invalid_json() {
    let mock = JellyfinMock::start().await;
    let addr = mock.with_listener().await;

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/webhook"))
        .header("Content-Type", "application/json")
        .body("[not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "invalid_webhook");
}
