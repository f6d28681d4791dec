// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::ticket_request::{
    CreateCommentRequestDto, CreateTicketRequestDto, ListTicketsQueryDto, UpdateTicketRequestDto,
};
use crate::application::dto::ticket_response::{
    TicketDetailResponseDto, TicketListResponseDto, TicketResponseDto,
};
use crate::domain::models::ticket::Ticket;
use crate::domain::models::user::Actor;
use crate::domain::services::ticket_service::{ExpectedVersion, TicketService};
use crate::presentation::errors::{ApiError, AppError};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Extension, Path, Query,
    },
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// 审计记录写入失败时附加在响应上的头
pub const AUDIT_RECORDED_HEADER: &str = "x-audit-recorded";

/// 创建工单
///
/// `POST /api/tickets`，成功返回 201
pub async fn create_ticket(
    Extension(service): Extension<Arc<TicketService>>,
    Extension(actor): Extension<Actor>,
    payload: Result<Json<CreateTicketRequestDto>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(payload) = payload.map_err(|e| ApiError::invalid_body(e.body_text()))?;
    let input = payload.into_input()?;

    let mutation = service.create_ticket(&actor, input).await?;
    let etag = etag_for(&mutation.value);

    Ok(with_mutation_headers(
        (
            StatusCode::CREATED,
            Json(TicketResponseDto::from(mutation.value)),
        )
            .into_response(),
        Some(etag),
        mutation.audit_recorded,
    ))
}

/// 分页列出当前调用者可见的工单
///
/// `GET /api/tickets?limit&offset&q&status`
pub async fn list_tickets(
    Extension(service): Extension<Arc<TicketService>>,
    Extension(actor): Extension<Actor>,
    query: Result<Query<ListTicketsQueryDto>, QueryRejection>,
) -> Result<Json<TicketListResponseDto>, AppError> {
    let Query(query) = query.map_err(|e| ApiError::invalid_body(e.body_text()))?;

    if let Err(errors) = query.validate() {
        let field = errors
            .field_errors()
            .keys()
            .next()
            .map(|field| field.to_string())
            .unwrap_or_default();
        return Err(ApiError::invalid_field(field, errors.to_string()).into());
    }

    let filters = query.filters()?;
    let page = service
        .list_tickets(&actor, filters, query.limit(), query.offset())
        .await?;

    Ok(Json(page.into()))
}

/// 读取工单、评论与审计历史
///
/// `GET /api/tickets/{id}`
pub async fn get_ticket(
    Extension(service): Extension<Arc<TicketService>>,
    Extension(actor): Extension<Actor>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Response, AppError> {
    let ticket_id = parse_ticket_id(path)?;

    let history = service.get_ticket_with_history(&actor, ticket_id).await?;
    let etag = etag_for(&history.ticket);

    let mut response = Json(TicketDetailResponseDto::from(history)).into_response();
    response.headers_mut().insert(header::ETAG, etag);
    Ok(response)
}

/// 在 `If-Match` 版本门控下修改工单
///
/// `PATCH /api/tickets/{id}`
pub async fn update_ticket(
    Extension(service): Extension<Arc<TicketService>>,
    Extension(actor): Extension<Actor>,
    headers: HeaderMap,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<UpdateTicketRequestDto>, JsonRejection>,
) -> Result<Response, AppError> {
    let ticket_id = parse_ticket_id(path)?;
    let expected_version = ExpectedVersion::from_if_match(
        headers
            .get(header::IF_MATCH)
            .and_then(|value| value.to_str().ok()),
    );
    let Json(payload) = payload.map_err(|e| ApiError::invalid_body(e.body_text()))?;
    let patch = payload.into_patch()?;

    let mutation = service
        .update_ticket(&actor, ticket_id, expected_version, patch)
        .await?;
    let etag = etag_for(&mutation.value);

    Ok(with_mutation_headers(
        Json(TicketResponseDto::from(mutation.value)).into_response(),
        Some(etag),
        mutation.audit_recorded,
    ))
}

/// 添加评论
///
/// `POST /api/tickets/{id}/comments`，成功返回 201
pub async fn add_comment(
    Extension(service): Extension<Arc<TicketService>>,
    Extension(actor): Extension<Actor>,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<CreateCommentRequestDto>, JsonRejection>,
) -> Result<Response, AppError> {
    let ticket_id = parse_ticket_id(path)?;
    let Json(payload) = payload.map_err(|e| ApiError::invalid_body(e.body_text()))?;

    let mutation = service
        .add_comment(&actor, ticket_id, payload.text, payload.parent_id)
        .await?;

    Ok(with_mutation_headers(
        (StatusCode::CREATED, Json(mutation.value)).into_response(),
        None,
        mutation.audit_recorded,
    ))
}

fn parse_ticket_id(path: Result<Path<String>, PathRejection>) -> Result<Uuid, ApiError> {
    let Path(raw) = path.map_err(|e| ApiError::invalid_field("id", e.body_text()))?;
    Uuid::parse_str(&raw)
        .map_err(|_| ApiError::invalid_field("id", format!("Invalid ticket id: {}", raw)))
}

fn etag_for(ticket: &Ticket) -> HeaderValue {
    // 由数字组成，必然是合法的头部值
    HeaderValue::from_str(&format!("\"{}\"", ticket.version))
        .unwrap_or_else(|_| HeaderValue::from_static("\"0\""))
}

fn with_mutation_headers(
    mut response: Response,
    etag: Option<HeaderValue>,
    audit_recorded: bool,
) -> Response {
    let headers = response.headers_mut();
    if let Some(etag) = etag {
        headers.insert(header::ETAG, etag);
    }
    if !audit_recorded {
        headers.insert(
            HeaderName::from_static(AUDIT_RECORDED_HEADER),
            HeaderValue::from_static("false"),
        );
    }
    response
}
