// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::user::{Role, User};
use crate::domain::repositories::ticket_repository::RepositoryError;
use crate::domain::repositories::user_repository::UserRepository;
use crate::infrastructure::database::entities::{api_key, user as user_entity};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, SqlErr,
};
use std::sync::Arc;
use uuid::Uuid;

/// 用户与 API Key 仓库实现
#[derive(Clone)]
pub struct UserRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl UserRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<user_entity::Model> for User {
    fn from(model: user_entity::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            // 无法识别的角色按最低权限处理
            role: model.role.parse().unwrap_or_default(),
            created_at: model.created_at,
        }
    }
}

#[async_trait]
impl UserRepository for UserRepositoryImpl {
    async fn find_by_api_key(&self, key: &str) -> Result<Option<User>, RepositoryError> {
        let found = api_key::Entity::find_by_id(key.to_string())
            .find_also_related(user_entity::Entity)
            .one(self.db.as_ref())
            .await?;

        Ok(found.and_then(|(_, user)| user).map(Into::into))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let model = user_entity::Entity::find()
            .filter(user_entity::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await?;

        Ok(model.map(Into::into))
    }

    async fn create(&self, name: &str, email: &str, role: Role) -> Result<User, RepositoryError> {
        let model = user_entity::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            email: Set(email.to_string()),
            role: Set(role.to_string()),
            created_at: Set(Utc::now().fixed_offset()),
        };

        let saved = model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(detail)) => {
                    RepositoryError::Duplicate(detail)
                }
                _ => RepositoryError::Database(e),
            })?;
        Ok(saved.into())
    }

    async fn issue_api_key(&self, user_id: Uuid) -> Result<String, RepositoryError> {
        let key = format!("tk_{}", Uuid::new_v4().simple());

        let model = api_key::ActiveModel {
            key: Set(key.clone()),
            user_id: Set(user_id),
            created_at: Set(Utc::now().fixed_offset()),
        };
        model.insert(self.db.as_ref()).await?;

        Ok(key)
    }
}
