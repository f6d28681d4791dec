// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::audit_log::{AuditLogEntry, NewAuditLogEntry};
use crate::domain::repositories::audit_log_repository::AuditLogRepository;
use crate::domain::repositories::ticket_repository::RepositoryError;
use crate::infrastructure::database::entities::audit_log as audit_log_entity;
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, NotSet, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;
use uuid::Uuid;

/// 审计日志仓库实现
///
/// 只追加，按 (created_at, id) 升序读取。
#[derive(Clone)]
pub struct AuditLogRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl AuditLogRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl TryFrom<audit_log_entity::Model> for AuditLogEntry {
    type Error = RepositoryError;

    fn try_from(model: audit_log_entity::Model) -> Result<Self, Self::Error> {
        let action = model.action.parse().map_err(|_| {
            RepositoryError::Database(DbErr::Type(format!(
                "unknown audit action: {}",
                model.action
            )))
        })?;

        Ok(Self {
            id: model.id,
            ticket_id: model.ticket_id,
            actor_id: model.actor_id,
            action,
            meta: model.meta,
            created_at: model.created_at,
        })
    }
}

#[async_trait]
impl AuditLogRepository for AuditLogRepositoryImpl {
    async fn append(&self, entry: NewAuditLogEntry) -> Result<AuditLogEntry, RepositoryError> {
        let model = audit_log_entity::ActiveModel {
            id: NotSet,
            ticket_id: Set(entry.ticket_id),
            actor_id: Set(entry.actor_id),
            action: Set(entry.action.to_string()),
            meta: Set(entry.meta),
            created_at: Set(entry.created_at),
        };

        let saved = model.insert(self.db.as_ref()).await?;
        saved.try_into()
    }

    async fn find_by_ticket(
        &self,
        ticket_id: Uuid,
    ) -> Result<Vec<AuditLogEntry>, RepositoryError> {
        let models = audit_log_entity::Entity::find()
            .filter(audit_log_entity::Column::TicketId.eq(ticket_id))
            .order_by_asc(audit_log_entity::Column::CreatedAt)
            .order_by_asc(audit_log_entity::Column::Id)
            .all(self.db.as_ref())
            .await?;

        models.into_iter().map(TryInto::try_into).collect()
    }
}
