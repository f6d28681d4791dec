// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::Json;
use serde_json::{json, Value};

const SERVICE_NAME: &str = "ticketrs";
const SERVICE_DESCRIPTION: &str = "Ticketing service with SLA tracking and threaded comments";

/// 对外公开的接口列表：(方法, 路径)
const ENDPOINTS: [(&str, &str); 6] = [
    ("POST", "/api/auth/register"),
    ("POST", "/api/tickets"),
    ("GET", "/api/tickets"),
    ("GET", "/api/tickets/{id}"),
    ("PATCH", "/api/tickets/{id}"),
    ("POST", "/api/tickets/{id}/comments"),
];

/// 健康检查端点
pub async fn health_check() -> Json<Value> {
    Json(json!({ "ok": true }))
}

/// 服务元信息端点
pub async fn meta() -> Json<Value> {
    let endpoints: Vec<String> = ENDPOINTS
        .iter()
        .map(|(method, path)| format!("{} {}", method, path))
        .chain(["GET /api/health".to_string(), "GET /api/_meta".to_string()])
        .collect();

    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "description": SERVICE_DESCRIPTION,
        "endpoints": endpoints,
    }))
}

/// 服务清单端点
pub async fn hackathon_manifest() -> Json<Value> {
    let endpoints: Vec<Value> = ENDPOINTS
        .iter()
        .map(|(method, path)| {
            json!({
                "method": method,
                "path": path.trim_start_matches("/api"),
            })
        })
        .collect();

    Json(json!({
        "name": SERVICE_NAME,
        "description": SERVICE_DESCRIPTION,
        "version": env!("CARGO_PKG_VERSION"),
        "api": {
            "base_url": "/api",
            "endpoints": endpoints,
        },
        "features": [
            "API key authentication",
            "User registration",
            "Role-based access control",
            "SLA tracking",
            "Threaded comments",
            "Audit logs",
            "Pagination",
            "Idempotency",
            "Optimistic locking",
            "Rate limiting",
        ],
    }))
}
