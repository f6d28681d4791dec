// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum_test::TestServer;
use migration::{Migrator, MigratorTrait};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use ticketrs::config::settings::Settings;
use ticketrs::domain::models::user::{Actor, Role};
use ticketrs::domain::repositories::user_repository::UserRepository;
use ticketrs::infrastructure::database::connection;
use ticketrs::infrastructure::repositories::user_repo_impl::UserRepositoryImpl;
use ticketrs::presentation::routes::{self, AppState};
use uuid::Uuid;

/// 测试用户及其 API Key
#[derive(Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub role: Role,
    pub api_key: String,
}

impl TestUser {
    pub fn actor(&self) -> Actor {
        Actor::new(self.id, self.role)
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.api_key)
    }
}

#[allow(dead_code)]
pub struct TestApp {
    pub server: TestServer,
    pub db_pool: Arc<DatabaseConnection>,
    pub state: AppState,
    pub alice: TestUser,
    pub bob: TestUser,
    pub agent: TestUser,
    pub other_agent: TestUser,
    pub admin: TestUser,
}

pub fn test_settings(rate_limit_rpm: Option<u32>) -> Settings {
    let mut builder = Settings::with_defaults()
        .unwrap()
        .set_override("database.url", "sqlite::memory:")
        .unwrap()
        .set_override("rate_limiting.enabled", rate_limit_rpm.is_some())
        .unwrap();

    if let Some(rpm) = rate_limit_rpm {
        builder = builder
            .set_override("rate_limiting.default_rpm", rpm as i64)
            .unwrap();
    }

    builder.build().unwrap().try_deserialize().unwrap()
}

/// 创建连接到全新内存数据库并已执行迁移的连接
pub async fn create_test_db() -> Arc<DatabaseConnection> {
    let settings = test_settings(None);
    let db = connection::create_pool(&settings.database)
        .await
        .expect("Failed to connect to in-memory sqlite");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    Arc::new(db)
}

pub async fn create_user(
    users: &dyn UserRepository,
    name: &str,
    role: Role,
) -> TestUser {
    let email = format!("{}-{}@example.com", name.to_lowercase(), Uuid::new_v4().simple());
    let user = users.create(name, &email, role).await.unwrap();
    let api_key = users.issue_api_key(user.id).await.unwrap();
    TestUser {
        id: user.id,
        role,
        api_key,
    }
}

pub async fn create_test_app() -> TestApp {
    create_test_app_with_rate_limit(None).await
}

pub async fn create_test_app_with_rate_limit(rate_limit_rpm: Option<u32>) -> TestApp {
    let settings = test_settings(rate_limit_rpm);
    let db_pool = create_test_db().await;

    let users = UserRepositoryImpl::new(db_pool.clone());
    let alice = create_user(&users, "Alice", Role::User).await;
    let bob = create_user(&users, "Bob", Role::User).await;
    let agent = create_user(&users, "Agent", Role::Agent).await;
    let other_agent = create_user(&users, "Other", Role::Agent).await;
    let admin = create_user(&users, "Admin", Role::Admin).await;

    let state = AppState::new(db_pool.clone(), &settings);
    let server = TestServer::new(routes::routes(state.clone())).unwrap();

    TestApp {
        server,
        db_pool,
        state,
        alice,
        bob,
        agent,
        other_agent,
        admin,
    }
}
