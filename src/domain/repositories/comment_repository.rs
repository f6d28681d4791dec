// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::comment::{Comment, NewComment};
use crate::domain::repositories::ticket_repository::RepositoryError;
use async_trait::async_trait;
use uuid::Uuid;

/// 评论仓库特质
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// 追加一条评论
    async fn create(&self, comment: NewComment) -> Result<Comment, RepositoryError>;
    /// 根据ID查找评论
    async fn find_by_id(&self, id: i32) -> Result<Option<Comment>, RepositoryError>;
    /// 按创建顺序列出工单的全部评论
    async fn find_by_ticket(&self, ticket_id: Uuid) -> Result<Vec<Comment>, RepositoryError>;
}
