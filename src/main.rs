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

use migration::{Migrator, MigratorTrait};
use std::sync::Arc;
use std::time::Duration;
use ticketrs::config::settings::Settings;
use ticketrs::domain::models::user::Role;
use ticketrs::infrastructure::database::{connection, seed};
use ticketrs::infrastructure::repositories::comment_repo_impl::CommentRepositoryImpl;
use ticketrs::infrastructure::repositories::ticket_repo_impl::TicketRepositoryImpl;
use ticketrs::presentation::routes::{self, AppState};
use ticketrs::utils::telemetry;
use tokio::net::TcpListener;
use tracing::info;

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting ticketrs...");

    // 2. Load configuration
    let settings = Arc::new(Settings::new()?);
    info!("Configuration loaded");

    // Initialize Prometheus Metrics
    ticketrs::infrastructure::metrics::init_metrics(&settings.metrics);

    // 3. Connect to database
    let db = connection::create_pool(&settings.database).await?;
    let db = Arc::new(db);
    info!("Database connection established");

    info!("Running database migrations...");
    Migrator::up(db.as_ref(), None).await?;
    info!("Database migrations applied");

    // 4. Wire components
    let state = AppState::new(db.clone(), &settings);

    if settings.seed.demo_users {
        let seeded = seed::seed_demo_users(state.users.as_ref()).await?;
        info!("Seeded {} demo users", seeded.len());

        let creator = seeded.iter().find(|(user, _)| user.role == Role::User);
        let assignee = seeded.iter().find(|(user, _)| user.role == Role::Agent);
        if let (Some((creator, _)), Some((assignee, _))) = (creator, assignee) {
            seed::seed_demo_tickets(
                &TicketRepositoryImpl::new(db.clone()),
                &CommentRepositoryImpl::new(db.clone()),
                creator,
                assignee,
            )
            .await?;
        }
    }

    // 5. Background housekeeping
    let sweep_interval = Duration::from_secs(settings.idempotency.sweep_interval_seconds.max(1));
    state
        .idempotency_cache
        .clone()
        .spawn_sweeper(sweep_interval);

    if let Some(limiter) = state.rate_limiter.clone() {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(60));
            loop {
                ticker.tick().await;
                limiter.retain_recent();
            }
        });
    }

    // 6. Start HTTP server
    let app = routes::routes(state);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
