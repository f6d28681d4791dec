// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::create_test_app;
use axum::http::StatusCode;
use serde_json::{json, Value};
use std::future::IntoFuture;
use ticketrs::domain::services::ticket_service::TicketFilters;

/// 测试相同幂等键的重复创建只执行一次
///
/// 第二次请求即使请求体不同也重放第一次的响应。
#[tokio::test]
async fn test_create_replays_first_response() {
    let app = create_test_app().await;

    let first = app
        .server
        .post("/api/tickets")
        .add_header("Authorization", app.alice.bearer())
        .add_header("Idempotency-Key", "create-1")
        .json(&json!({ "title": "Printer error", "priority": "high" }))
        .await;
    assert_eq!(first.status_code(), StatusCode::CREATED);
    assert!(first.maybe_header("idempotency-replayed").is_none());

    let second = app
        .server
        .post("/api/tickets")
        .add_header("Authorization", app.alice.bearer())
        .add_header("Idempotency-Key", "create-1")
        .json(&json!({ "title": "Something else" }))
        .await;
    assert_eq!(second.status_code(), StatusCode::CREATED);
    assert_eq!(second.header("idempotency-replayed"), "true");
    assert_eq!(second.header("etag"), "\"1\"");
    assert_eq!(second.json::<Value>(), first.json::<Value>());

    let page = app
        .state
        .ticket_service
        .list_tickets(&app.admin.actor(), TicketFilters::default(), 10, 0)
        .await
        .unwrap();
    assert_eq!(page.total, 1);
}

/// 测试同一幂等键的并发请求只产生一个工单
#[tokio::test]
async fn test_concurrent_same_key_creates_once() {
    let app = create_test_app().await;

    let request = |title: &str| {
        app.server
            .post("/api/tickets")
            .add_header("Authorization", app.alice.bearer())
            .add_header("Idempotency-Key", "race-key")
            .json(&json!({ "title": title }))
            .into_future()
    };

    let (a, b) = futures::future::join(request("A"), request("B")).await;
    assert_eq!(a.status_code(), StatusCode::CREATED);
    assert_eq!(b.status_code(), StatusCode::CREATED);
    assert_eq!(a.json::<Value>(), b.json::<Value>());

    let page = app
        .state
        .ticket_service
        .list_tickets(&app.admin.actor(), TicketFilters::default(), 10, 0)
        .await
        .unwrap();
    assert_eq!(page.total, 1);
}

/// 测试错误结果同样被缓存
///
/// 首次因缺少标题失败后，带同一键的合法请求仍得到原来的 400。
#[tokio::test]
async fn test_error_outcome_is_cached() {
    let app = create_test_app().await;

    let first = app
        .server
        .post("/api/tickets")
        .add_header("Authorization", app.alice.bearer())
        .add_header("Idempotency-Key", "bad-create")
        .json(&json!({}))
        .await;
    assert_eq!(first.status_code(), StatusCode::BAD_REQUEST);

    let retry = app
        .server
        .post("/api/tickets")
        .add_header("Authorization", app.alice.bearer())
        .add_header("Idempotency-Key", "bad-create")
        .json(&json!({ "title": "Now valid" }))
        .await;
    assert_eq!(retry.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(retry.header("idempotency-replayed"), "true");
    assert_eq!(retry.json::<Value>()["error"]["code"], "FIELD_REQUIRED");
}

/// 测试修改与评论的重放
///
/// 重放的修改不会再次递增版本；不带键的请求不受影响。
#[tokio::test]
async fn test_update_and_comment_replay() {
    let app = create_test_app().await;

    let ticket: Value = app
        .server
        .post("/api/tickets")
        .add_header("Authorization", app.alice.bearer())
        .json(&json!({ "title": "Replay me" }))
        .await
        .json();
    let path = format!("/api/tickets/{}", ticket["id"].as_str().unwrap());

    for _ in 0..2 {
        let response = app
            .server
            .patch(&path)
            .add_header("Authorization", app.alice.bearer())
            .add_header("If-Match", "1")
            .add_header("Idempotency-Key", "patch-1")
            .json(&json!({ "priority": "urgent" }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.json::<Value>()["version"], 2);
    }

    for _ in 0..2 {
        let response = app
            .server
            .post(&format!("{}/comments", path))
            .add_header("Authorization", app.alice.bearer())
            .add_header("Idempotency-Key", "comment-1")
            .json(&json!({ "text": "Once only" }))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
    }

    let detail: Value = app
        .server
        .get(&path)
        .add_header("Authorization", app.alice.bearer())
        .add_header("Idempotency-Key", "patch-1")
        .await
        .json();
    assert_eq!(detail["ticket"]["version"], 2);
    assert_eq!(detail["ticket"]["priority"], "urgent");
    assert_eq!(detail["comments"].as_array().unwrap().len(), 1);
    assert_eq!(detail["audit_logs"].as_array().unwrap().len(), 3);
}

/// 测试未认证的请求不会占用幂等键
#[tokio::test]
async fn test_unauthorized_request_does_not_consume_key() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/api/tickets")
        .add_header("Idempotency-Key", "auth-first")
        .json(&json!({ "title": "No key" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let response = app
        .server
        .post("/api/tickets")
        .add_header("Authorization", app.alice.bearer())
        .add_header("Idempotency-Key", "auth-first")
        .json(&json!({ "title": "With key" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    assert!(response.maybe_header("idempotency-replayed").is_none());
}
