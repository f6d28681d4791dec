// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::infrastructure::cache::idempotency_cache::{CachedResponse, IdempotencyCache};
use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, error};

/// 客户端提供的幂等键请求头
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";
/// 响应来自缓存时附加的头
pub const IDEMPOTENCY_REPLAYED_HEADER: &str = "idempotency-replayed";

/// 幂等中间件
///
/// 对带 `Idempotency-Key` 的修改类请求（POST/PUT/PATCH/DELETE），同一个键只执行一次，
/// 之后的请求原样重放第一次的状态码、头部与响应体，与请求体无关。
/// 同一键的并发请求等待首个请求完成后重放其结果。
pub async fn idempotency_middleware(
    State(cache): State<Arc<IdempotencyCache>>,
    req: Request,
    next: Next,
) -> Response {
    if !is_mutating(req.method()) {
        return next.run(req).await;
    }

    let key = match req
        .headers()
        .get(IDEMPOTENCY_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|key| !key.is_empty())
    {
        Some(key) => key.to_string(),
        None => return next.run(req).await,
    };

    let outcome = cache
        .get_or_execute(&key, || async move {
            let response = next.run(req).await;
            capture_response(response).await
        })
        .await;

    if outcome.replayed {
        metrics::counter!("idempotency_replays_total").increment(1);
        debug!(idempotency_key = %key, status = outcome.response.status, "Replaying cached response");
    }

    let mut response = restore_response(&outcome.response);
    if outcome.replayed {
        response.headers_mut().insert(
            HeaderName::from_static(IDEMPOTENCY_REPLAYED_HEADER),
            HeaderValue::from_static("true"),
        );
    }
    response
}

fn is_mutating(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

async fn capture_response(response: Response) -> CachedResponse {
    let (parts, body) = response.into_parts();

    let headers = parts
        .headers
        .iter()
        .filter(|(name, _)| *name != header::CONTENT_LENGTH)
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();

    match to_bytes(body, usize::MAX).await {
        Ok(bytes) => CachedResponse {
            status: parts.status.as_u16(),
            headers,
            body: bytes.to_vec(),
        },
        Err(e) => {
            error!("Failed to buffer response body for idempotency cache: {}", e);
            CachedResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                headers: vec![(
                    header::CONTENT_TYPE.as_str().to_string(),
                    "application/json".to_string(),
                )],
                body: br#"{"error":{"code":"INTERNAL","message":"Internal server error"}}"#
                    .to_vec(),
            }
        }
    }
}

fn restore_response(cached: &CachedResponse) -> Response {
    let mut response = Response::new(Body::from(cached.body.clone()));
    *response.status_mut() =
        StatusCode::from_u16(cached.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let headers = response.headers_mut();
    for (name, value) in &cached.headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            headers.append(name, value);
        }
    }
    response
}
