// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::domain::models::user::{Role, User};
use crate::domain::repositories::ticket_repository::RepositoryError;
use crate::domain::repositories::user_repository::UserRepository;

/// 账号操作错误
#[derive(Error, Debug)]
pub enum AccountError {
    #[error("{field} is required")]
    FieldRequired { field: &'static str },
    #[error("{message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },
    #[error("Email already exists")]
    DuplicateEmail,
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl AccountError {
    pub fn code(&self) -> &'static str {
        match self {
            AccountError::FieldRequired { .. } => "FIELD_REQUIRED",
            AccountError::InvalidField { .. } => "INVALID_FIELD",
            AccountError::DuplicateEmail => "DUPLICATE_EMAIL",
            AccountError::Repository(_) => "INTERNAL",
        }
    }

    pub fn field(&self) -> Option<&'static str> {
        match self {
            AccountError::FieldRequired { field } | AccountError::InvalidField { field, .. } => {
                Some(*field)
            }
            AccountError::DuplicateEmail => Some("email"),
            AccountError::Repository(_) => None,
        }
    }
}

/// 注册输入
#[derive(Debug, Clone, Default)]
pub struct RegisterInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
}

/// 注册结果：新用户与其首个 API Key
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    #[serde(flatten)]
    pub user: User,
    pub api_key: String,
}

/// 账号服务
pub struct AccountService {
    users: Arc<dyn UserRepository>,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// 注册新用户并签发 API Key
    ///
    /// 角色缺省为 `user`。邮箱唯一，重复时返回 `DuplicateEmail`，
    /// 并发注册同一邮箱由数据库唯一约束裁决。
    pub async fn register(&self, input: RegisterInput) -> Result<Registration, AccountError> {
        let email = required(input.email, "email")?;
        let name = required(input.name, "name")?;
        let role = input.role.unwrap_or_default();

        let user = match self.users.create(&name, &email, role).await {
            Ok(user) => user,
            Err(RepositoryError::Duplicate(_)) => {
                tracing::debug!(email = %email, "Registration rejected, email taken");
                return Err(AccountError::DuplicateEmail);
            }
            Err(e) => return Err(e.into()),
        };
        let api_key = self.users.issue_api_key(user.id).await?;

        metrics::counter!("users_registered_total").increment(1);
        tracing::info!(user_id = %user.id, role = %user.role, "User registered");

        Ok(Registration { user, api_key })
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, AccountError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AccountError::FieldRequired { field }),
    }
}
