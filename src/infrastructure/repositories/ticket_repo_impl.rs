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

use crate::domain::models::ticket::{Ticket, TicketPatch, TicketStatus};
use crate::domain::repositories::ticket_repository::{
    ConditionalUpdate, RepositoryError, TicketQueryParams, TicketRepository, TicketScope,
};
use crate::infrastructure::database::entities::comment as comment_entity;
use crate::infrastructure::database::entities::ticket as ticket_entity;
use async_trait::async_trait;
use sea_orm::{
    sea_query::{Expr, Query},
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;
use uuid::Uuid;

/// 工单仓库实现
///
/// 基于SeaORM实现的工单数据访问层。修改只通过版本门控的条件更新完成。
#[derive(Clone)]
pub struct TicketRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl TicketRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<ticket_entity::Model> for Ticket {
    fn from(model: ticket_entity::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            status: model.status.parse().unwrap_or_default(),
            priority: model.priority.parse().unwrap_or_default(),
            created_by: model.created_by,
            assigned_to: model.assigned_to,
            sla_seconds: model.sla_seconds,
            sla_due_at: model.sla_due_at,
            version: model.version,
            created_at: model.created_at,
        }
    }
}

impl From<Ticket> for ticket_entity::ActiveModel {
    fn from(ticket: Ticket) -> Self {
        Self {
            id: Set(ticket.id),
            title: Set(ticket.title),
            description: Set(ticket.description),
            status: Set(ticket.status.to_string()),
            priority: Set(ticket.priority.to_string()),
            created_by: Set(ticket.created_by),
            assigned_to: Set(ticket.assigned_to),
            sla_seconds: Set(ticket.sla_seconds),
            sla_due_at: Set(ticket.sla_due_at),
            version: Set(ticket.version),
            created_at: Set(ticket.created_at),
        }
    }
}

#[async_trait]
impl TicketRepository for TicketRepositoryImpl {
    async fn create(&self, ticket: &Ticket) -> Result<Ticket, RepositoryError> {
        let model: ticket_entity::ActiveModel = ticket.clone().into();

        let saved = model.insert(self.db.as_ref()).await?;
        Ok(saved.into())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Ticket>, RepositoryError> {
        let model = ticket_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;

        Ok(model.map(Into::into))
    }

    async fn update_if_version(
        &self,
        id: Uuid,
        expected_version: i64,
        patch: &TicketPatch,
    ) -> Result<ConditionalUpdate, RepositoryError> {
        let mut update = ticket_entity::Entity::update_many().col_expr(
            ticket_entity::Column::Version,
            Expr::col(ticket_entity::Column::Version).add(1),
        );

        if let Some(status) = patch.status {
            update = update.col_expr(
                ticket_entity::Column::Status,
                Expr::value(status.to_string()),
            );
        }
        if let Some(priority) = patch.priority {
            update = update.col_expr(
                ticket_entity::Column::Priority,
                Expr::value(priority.to_string()),
            );
        }
        if let Some(assigned_to) = patch.assigned_to {
            update = update.col_expr(ticket_entity::Column::AssignedTo, Expr::value(assigned_to));
        }

        // 单条 UPDATE 完成比较与写入
        let result = update
            .filter(ticket_entity::Column::Id.eq(id))
            .filter(ticket_entity::Column::Version.eq(expected_version))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 1 {
            Ok(ConditionalUpdate::Applied)
        } else {
            Ok(ConditionalUpdate::NotApplied)
        }
    }

    async fn query_tickets(
        &self,
        params: TicketQueryParams,
    ) -> Result<(Vec<Ticket>, u64), RepositoryError> {
        let mut query = ticket_entity::Entity::find();

        match params.scope {
            TicketScope::All => {}
            TicketScope::CreatedBy(user_id) => {
                query = query.filter(ticket_entity::Column::CreatedBy.eq(user_id));
            }
            TicketScope::AssignedTo(user_id) => {
                query = query.filter(ticket_entity::Column::AssignedTo.eq(user_id));
            }
        }

        if let Some(status) = params.status {
            query = query.filter(ticket_entity::Column::Status.eq(status.to_string()));
        }

        if let Some(now) = params.breached_at {
            query = query
                .filter(ticket_entity::Column::SlaDueAt.lt(now))
                .filter(ticket_entity::Column::Status.ne(TicketStatus::Closed.to_string()));
        }

        if let Some(search) = params.search.as_deref() {
            let commented = Query::select()
                .column(comment_entity::Column::TicketId)
                .from(comment_entity::Entity)
                .and_where(comment_entity::Column::Text.contains(search))
                .to_owned();

            query = query.filter(
                Condition::any()
                    .add(ticket_entity::Column::Title.contains(search))
                    .add(ticket_entity::Column::Description.contains(search))
                    .add(ticket_entity::Column::Id.in_subquery(commented)),
            );
        }

        let total = query.clone().count(self.db.as_ref()).await?;

        let models = query
            .order_by_desc(ticket_entity::Column::CreatedAt)
            .order_by_desc(ticket_entity::Column::Id)
            .offset(params.offset as u64)
            .limit(params.limit as u64)
            .all(self.db.as_ref())
            .await?;

        Ok((models.into_iter().map(Into::into).collect(), total))
    }
}
