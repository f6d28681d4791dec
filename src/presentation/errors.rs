// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::domain::repositories::ticket_repository::RepositoryError;
use crate::domain::services::account_service::AccountError;
use crate::domain::services::ticket_service::TicketError;

/// 接口层错误
///
/// 身份、限流与请求格式相关的错误，不属于领域规则。
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Missing or invalid API key")]
    Unauthorized,
    #[error("Too many requests")]
    RateLimited,
    #[error("{message}")]
    InvalidField {
        field: Option<String>,
        message: String,
    },
}

impl ApiError {
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::InvalidField {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    pub fn invalid_body(message: impl Into<String>) -> Self {
        ApiError::InvalidField {
            field: None,
            message: message.into(),
        }
    }
}

/// 应用错误类型
///
/// 封装所有可能的应用层错误，按具体错误类型选择状态码与错误码
#[derive(Debug)]
pub struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(err) = self.0.downcast_ref::<TicketError>() {
            let status = match err {
                TicketError::FieldRequired { .. }
                | TicketError::InvalidField { .. }
                | TicketError::VersionRequired => StatusCode::BAD_REQUEST,
                TicketError::VersionMismatch => StatusCode::CONFLICT,
                TicketError::Forbidden => StatusCode::FORBIDDEN,
                TicketError::NotFound => StatusCode::NOT_FOUND,
                TicketError::Repository(e) => return internal_error(e),
            };
            return error_response(status, err.code(), &err.to_string(), err.field());
        }

        if let Some(err) = self.0.downcast_ref::<AccountError>() {
            let status = match err {
                AccountError::FieldRequired { .. } | AccountError::InvalidField { .. } => {
                    StatusCode::BAD_REQUEST
                }
                AccountError::DuplicateEmail => StatusCode::CONFLICT,
                AccountError::Repository(e) => return internal_error(e),
            };
            return error_response(status, err.code(), &err.to_string(), err.field());
        }

        if let Some(err) = self.0.downcast_ref::<ApiError>() {
            return match err {
                ApiError::Unauthorized => {
                    error_response(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", &err.to_string(), None)
                }
                ApiError::RateLimited => error_response(
                    StatusCode::TOO_MANY_REQUESTS,
                    "RATE_LIMIT",
                    &err.to_string(),
                    None,
                ),
                ApiError::InvalidField { field, message } => error_response(
                    StatusCode::BAD_REQUEST,
                    "INVALID_FIELD",
                    message,
                    field.as_deref(),
                ),
            };
        }

        if let Some(RepositoryError::NotFound) = self.0.downcast_ref::<RepositoryError>() {
            return error_response(StatusCode::NOT_FOUND, "NOT_FOUND", "Record not found", None);
        }

        internal_error(&self.0)
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

/// 构造统一格式的错误响应：`{"error": {"code", "message", "field"?}}`
pub fn error_response(
    status: StatusCode,
    code: &str,
    message: &str,
    field: Option<&str>,
) -> Response {
    let mut error = Map::new();
    error.insert("code".to_string(), Value::from(code));
    error.insert("message".to_string(), Value::from(message));
    if let Some(field) = field {
        error.insert("field".to_string(), Value::from(field));
    }

    (status, Json(json!({ "error": error }))).into_response()
}

fn internal_error(err: &dyn std::fmt::Display) -> Response {
    tracing::error!("Internal error: {}", err);
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL",
        "Internal server error",
        None,
    )
}
