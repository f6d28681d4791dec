// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::repositories::user_repository::UserRepository;
use crate::presentation::errors::{ApiError, AppError};
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// 认证状态
#[derive(Clone)]
pub struct AuthState {
    /// 用户仓库，用于按 API Key 查找调用者
    pub users: Arc<dyn UserRepository>,
}

/// 认证中间件
///
/// 验证 `Authorization: Bearer <key>` 并把调用者 `Actor` 注入请求扩展
///
/// # 参数
///
/// * `state` - 认证状态
/// * `req` - HTTP请求
/// * `next` - 下一个中间件
///
/// # 返回值
///
/// * `Ok(Response)` - 认证成功的响应
/// * `Err(AppError)` - 缺少或无效的 Key 返回 401，查询失败返回 500
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(ApiError::Unauthorized)?
        .to_string();

    match state.users.find_by_api_key(&token).await? {
        Some(user) => {
            debug!(user_id = %user.id, role = %user.role, "Request authenticated");
            req.extensions_mut().insert(user.as_actor());
            Ok(next.run(req).await)
        }
        None => {
            warn!(path = %req.uri().path(), "Unknown API key presented");
            Err(ApiError::Unauthorized.into())
        }
    }
}

#[cfg(test)]
#[path = "auth_middleware_test.rs"]
mod tests;
