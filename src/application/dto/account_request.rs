// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::Deserialize;
use validator::ValidateEmail;

use crate::domain::models::user::Role;
use crate::domain::services::account_service::{AccountError, RegisterInput};

/// 注册请求DTO
#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequestDto {
    pub name: Option<String>,
    pub email: Option<String>,
    /// `user`、`agent` 或 `admin`，缺省为 `user`
    pub role: Option<String>,
}

impl RegisterRequestDto {
    /// 校验格式并转换为领域输入
    ///
    /// 空白字段留给领域层报告为 FIELD_REQUIRED。
    pub fn into_input(self) -> Result<RegisterInput, AccountError> {
        let role = self
            .role
            .as_deref()
            .map(|raw| {
                raw.parse::<Role>().map_err(|_| AccountError::InvalidField {
                    field: "role",
                    message: format!("Unknown role: {}", raw),
                })
            })
            .transpose()?;

        if let Some(email) = self.email.as_deref().map(str::trim) {
            if !email.is_empty() && !email.validate_email() {
                return Err(AccountError::InvalidField {
                    field: "email",
                    message: format!("Invalid email: {}", email),
                });
            }
        }

        Ok(RegisterInput {
            name: self.name,
            email: self.email,
            role,
        })
    }
}
