// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::Settings;
use crate::domain::repositories::user_repository::UserRepository;
use crate::domain::services::account_service::AccountService;
use crate::domain::services::audit_trail::AuditTrail;
use crate::domain::services::ticket_service::TicketService;
use crate::infrastructure::cache::idempotency_cache::IdempotencyCache;
use crate::infrastructure::repositories::audit_log_repo_impl::AuditLogRepositoryImpl;
use crate::infrastructure::repositories::comment_repo_impl::CommentRepositoryImpl;
use crate::infrastructure::repositories::ticket_repo_impl::TicketRepositoryImpl;
use crate::infrastructure::repositories::user_repo_impl::UserRepositoryImpl;
use crate::presentation::handlers::{account_handler, meta_handler, ticket_handler};
use crate::presentation::middleware::auth_middleware::{auth_middleware, AuthState};
use crate::presentation::middleware::idempotency_middleware::idempotency_middleware;
use crate::presentation::middleware::rate_limit_middleware::{
    rate_limit_middleware, ActorRateLimiter,
};
use axum::{
    middleware,
    routing::{get, post},
    Extension, Router,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// 路由所需的共享组件
#[derive(Clone)]
pub struct AppState {
    pub ticket_service: Arc<TicketService>,
    pub account_service: Arc<AccountService>,
    pub users: Arc<dyn UserRepository>,
    pub idempotency_cache: Arc<IdempotencyCache>,
    /// 为 `None` 时不做速率限制
    pub rate_limiter: Option<Arc<ActorRateLimiter>>,
}

impl AppState {
    /// 基于数据库连接与配置组装全部组件
    pub fn new(db: Arc<DatabaseConnection>, settings: &Settings) -> Self {
        let ticket_repo = Arc::new(TicketRepositoryImpl::new(db.clone()));
        let comment_repo = Arc::new(CommentRepositoryImpl::new(db.clone()));
        let audit_repo = Arc::new(AuditLogRepositoryImpl::new(db.clone()));
        let users: Arc<dyn UserRepository> = Arc::new(UserRepositoryImpl::new(db));

        let ticket_service = Arc::new(TicketService::new(
            ticket_repo,
            comment_repo,
            AuditTrail::new(audit_repo),
        ));

        let rate_limiter = settings
            .rate_limiting
            .enabled
            .then(|| Arc::new(ActorRateLimiter::new(settings.rate_limiting.default_rpm)));

        Self {
            ticket_service,
            account_service: Arc::new(AccountService::new(users.clone())),
            users,
            idempotency_cache: Arc::new(IdempotencyCache::from_settings(&settings.idempotency)),
            rate_limiter,
        }
    }
}

/// 创建应用路由
///
/// 受保护路由的中间件顺序（由外到内）：认证 → 速率限制 → 幂等重放 → 处理器
///
/// # 返回值
///
/// 返回配置好的路由
pub fn routes(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/health", get(meta_handler::health_check))
        .route("/api/auth/register", post(account_handler::register))
        .route("/api/_meta", get(meta_handler::meta))
        .route(
            "/.well-known/hackathon.json",
            get(meta_handler::hackathon_manifest),
        );

    let mut protected_routes = Router::new()
        .route(
            "/api/tickets",
            post(ticket_handler::create_ticket).get(ticket_handler::list_tickets),
        )
        .route(
            "/api/tickets/{id}",
            get(ticket_handler::get_ticket).patch(ticket_handler::update_ticket),
        )
        .route(
            "/api/tickets/{id}/comments",
            post(ticket_handler::add_comment),
        )
        .layer(middleware::from_fn_with_state(
            state.idempotency_cache.clone(),
            idempotency_middleware,
        ));

    if let Some(limiter) = state.rate_limiter.clone() {
        protected_routes = protected_routes.layer(middleware::from_fn_with_state(
            limiter,
            rate_limit_middleware,
        ));
    }

    let protected_routes = protected_routes
        .layer(middleware::from_fn_with_state(
            AuthState {
                users: state.users.clone(),
            },
            auth_middleware,
        ))
        .layer(Extension(state.ticket_service.clone()));

    let public_routes = public_routes.layer(Extension(state.account_service.clone()));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
}
