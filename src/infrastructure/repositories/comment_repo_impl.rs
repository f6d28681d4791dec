// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::comment::{Comment, NewComment};
use crate::domain::repositories::comment_repository::CommentRepository;
use crate::domain::repositories::ticket_repository::RepositoryError;
use crate::infrastructure::database::entities::comment as comment_entity;
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;
use uuid::Uuid;

/// 评论仓库实现
#[derive(Clone)]
pub struct CommentRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl CommentRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<comment_entity::Model> for Comment {
    fn from(model: comment_entity::Model) -> Self {
        Self {
            id: model.id,
            ticket_id: model.ticket_id,
            parent_id: model.parent_id,
            author_id: model.author_id,
            text: model.text,
            created_at: model.created_at,
        }
    }
}

#[async_trait]
impl CommentRepository for CommentRepositoryImpl {
    async fn create(&self, comment: NewComment) -> Result<Comment, RepositoryError> {
        let model = comment_entity::ActiveModel {
            id: NotSet,
            ticket_id: Set(comment.ticket_id),
            parent_id: Set(comment.parent_id),
            author_id: Set(comment.author_id),
            text: Set(comment.text),
            created_at: Set(comment.created_at),
        };

        let saved = model.insert(self.db.as_ref()).await?;
        Ok(saved.into())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Comment>, RepositoryError> {
        let model = comment_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;

        Ok(model.map(Into::into))
    }

    async fn find_by_ticket(&self, ticket_id: Uuid) -> Result<Vec<Comment>, RepositoryError> {
        let models = comment_entity::Entity::find()
            .filter(comment_entity::Column::TicketId.eq(ticket_id))
            .order_by_asc(comment_entity::Column::CreatedAt)
            .order_by_asc(comment_entity::Column::Id)
            .all(self.db.as_ref())
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }
}
