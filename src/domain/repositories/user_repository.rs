// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::user::{Role, User};
use crate::domain::repositories::ticket_repository::RepositoryError;
use async_trait::async_trait;
use uuid::Uuid;

/// 用户仓库特质
///
/// 身份子系统的最小边界：按 API 密钥解析用户，以及创建用户和签发密钥。
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 根据 API 密钥查找用户
    async fn find_by_api_key(&self, key: &str) -> Result<Option<User>, RepositoryError>;
    /// 根据邮箱查找用户
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;
    /// 创建用户
    async fn create(&self, name: &str, email: &str, role: Role) -> Result<User, RepositoryError>;
    /// 为用户签发新的 API 密钥
    async fn issue_api_key(&self, user_id: Uuid) -> Result<String, RepositoryError>;
}
