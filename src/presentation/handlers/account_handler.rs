// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::account_request::RegisterRequestDto;
use crate::domain::services::account_service::AccountService;
use crate::presentation::errors::{ApiError, AppError};
use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

/// 注册用户
///
/// `POST /api/auth/register`，成功返回 201 与新签发的 API Key，
/// 邮箱已存在返回 409 `DUPLICATE_EMAIL`
pub async fn register(
    Extension(service): Extension<Arc<AccountService>>,
    payload: Result<Json<RegisterRequestDto>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(payload) = payload.map_err(|e| ApiError::invalid_body(e.body_text()))?;
    let input = payload.into_input()?;

    let registration = service.register(input).await?;

    Ok((StatusCode::CREATED, Json(registration)).into_response())
}
