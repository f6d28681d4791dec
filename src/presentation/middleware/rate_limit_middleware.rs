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

use crate::domain::models::user::Actor;
use crate::presentation::errors::{ApiError, AppError};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// 速率限制器
///
/// 按调用者 ID 分桶的进程内令牌桶，每分钟补满 `default_limit_per_minute` 个请求
pub struct ActorRateLimiter {
    limiter: DefaultKeyedRateLimiter<Uuid>,
    default_limit_per_minute: u32,
}

impl ActorRateLimiter {
    /// 创建新的速率限制器实例
    ///
    /// # 参数
    ///
    /// * `default_limit_per_minute` - 每分钟请求数限制，0 按 1 处理
    pub fn new(default_limit_per_minute: u32) -> Self {
        let rpm = NonZeroU32::new(default_limit_per_minute).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: RateLimiter::keyed(Quota::per_minute(rpm)),
            default_limit_per_minute: rpm.get(),
        }
    }

    /// 检查调用者的请求速率是否超出限制
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 请求未超出限制
    /// * `Err(ApiError::RateLimited)` - 请求超出限制
    pub fn check(&self, actor_id: &Uuid) -> Result<(), ApiError> {
        self.limiter
            .check_key(actor_id)
            .map_err(|_| ApiError::RateLimited)
    }

    pub fn limit_per_minute(&self) -> u32 {
        self.default_limit_per_minute
    }

    /// 清理长时间未使用的调用者桶
    pub fn retain_recent(&self) {
        self.limiter.retain_recent();
    }
}

/// 速率限制中间件
///
/// 需要在认证中间件之后运行，未认证的请求直接放行
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<ActorRateLimiter>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(actor) = req.extensions().get::<Actor>() {
        if let Err(e) = limiter.check(&actor.id) {
            warn!(
                actor_id = %actor.id,
                limit = limiter.limit_per_minute(),
                "Rate limit exceeded"
            );
            return Err(e.into());
        }
    }

    Ok(next.run(req).await)
}
