// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use axum::http::StatusCode;
use axum_test::TestServer;
use sea_orm::DbErr;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use ticketrs::domain::models::audit_log::{AuditLogEntry, NewAuditLogEntry};
use ticketrs::domain::models::comment::{Comment, NewComment};
use ticketrs::domain::models::ticket::{Ticket, TicketPatch, TicketStatus};
use ticketrs::domain::models::user::{Actor, Role, User};
use ticketrs::domain::repositories::audit_log_repository::AuditLogRepository;
use ticketrs::domain::repositories::comment_repository::CommentRepository;
use ticketrs::domain::repositories::ticket_repository::{
    ConditionalUpdate, RepositoryError, TicketQueryParams, TicketRepository,
};
use ticketrs::domain::repositories::user_repository::UserRepository;
use ticketrs::domain::services::account_service::AccountService;
use ticketrs::domain::services::audit_trail::AuditTrail;
use ticketrs::domain::services::ticket_service::{
    ExpectedVersion, NewTicketInput, TicketService,
};
use ticketrs::infrastructure::cache::idempotency_cache::IdempotencyCache;
use ticketrs::presentation::routes::{self, AppState};
use uuid::Uuid;

#[derive(Default)]
struct InMemoryTicketRepo {
    tickets: Mutex<HashMap<Uuid, Ticket>>,
}

#[async_trait]
impl TicketRepository for InMemoryTicketRepo {
    async fn create(&self, ticket: &Ticket) -> Result<Ticket, RepositoryError> {
        self.tickets
            .lock()
            .unwrap()
            .insert(ticket.id, ticket.clone());
        Ok(ticket.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Ticket>, RepositoryError> {
        Ok(self.tickets.lock().unwrap().get(&id).cloned())
    }

    async fn update_if_version(
        &self,
        id: Uuid,
        expected_version: i64,
        patch: &TicketPatch,
    ) -> Result<ConditionalUpdate, RepositoryError> {
        let mut tickets = self.tickets.lock().unwrap();
        match tickets.get_mut(&id) {
            Some(ticket) if ticket.version == expected_version => {
                *ticket = patch.apply_to(ticket);
                Ok(ConditionalUpdate::Applied)
            }
            _ => Ok(ConditionalUpdate::NotApplied),
        }
    }

    async fn query_tickets(
        &self,
        _params: TicketQueryParams,
    ) -> Result<(Vec<Ticket>, u64), RepositoryError> {
        let items: Vec<Ticket> = self.tickets.lock().unwrap().values().cloned().collect();
        let total = items.len() as u64;
        Ok((items, total))
    }
}

#[derive(Default)]
struct InMemoryCommentRepo {
    comments: Mutex<Vec<Comment>>,
}

#[async_trait]
impl CommentRepository for InMemoryCommentRepo {
    async fn create(&self, comment: NewComment) -> Result<Comment, RepositoryError> {
        let mut comments = self.comments.lock().unwrap();
        let saved = Comment {
            id: comments.len() as i32 + 1,
            ticket_id: comment.ticket_id,
            parent_id: comment.parent_id,
            author_id: comment.author_id,
            text: comment.text,
            created_at: comment.created_at,
        };
        comments.push(saved.clone());
        Ok(saved)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Comment>, RepositoryError> {
        Ok(self
            .comments
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn find_by_ticket(&self, ticket_id: Uuid) -> Result<Vec<Comment>, RepositoryError> {
        Ok(self
            .comments
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.ticket_id == ticket_id)
            .cloned()
            .collect())
    }
}

/// 写入总是失败的审计仓库
struct FailingAuditRepo;

#[async_trait]
impl AuditLogRepository for FailingAuditRepo {
    async fn append(&self, _entry: NewAuditLogEntry) -> Result<AuditLogEntry, RepositoryError> {
        Err(RepositoryError::Database(DbErr::Custom(
            "audit table unavailable".to_string(),
        )))
    }

    async fn find_by_ticket(
        &self,
        _ticket_id: Uuid,
    ) -> Result<Vec<AuditLogEntry>, RepositoryError> {
        Ok(Vec::new())
    }
}

struct StaticUserRepo {
    user: User,
    api_key: String,
}

#[async_trait]
impl UserRepository for StaticUserRepo {
    async fn find_by_api_key(&self, key: &str) -> Result<Option<User>, RepositoryError> {
        Ok((key == self.api_key).then(|| self.user.clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        Ok((email == self.user.email).then(|| self.user.clone()))
    }

    async fn create(&self, _name: &str, _email: &str, _role: Role) -> Result<User, RepositoryError> {
        Err(RepositoryError::Database(DbErr::Custom("read only".to_string())))
    }

    async fn issue_api_key(&self, _user_id: Uuid) -> Result<String, RepositoryError> {
        Ok(self.api_key.clone())
    }
}

fn service_with_failing_audit() -> (Arc<TicketService>, Arc<InMemoryTicketRepo>) {
    let tickets = Arc::new(InMemoryTicketRepo::default());
    let service = Arc::new(TicketService::new(
        tickets.clone(),
        Arc::new(InMemoryCommentRepo::default()),
        AuditTrail::new(Arc::new(FailingAuditRepo)),
    ));
    (service, tickets)
}

/// 测试审计写入失败不影响已提交的修改
///
/// 创建、修改与评论都应成功，只是 `audit_recorded` 为 false。
#[tokio::test]
async fn test_mutations_survive_audit_failure() {
    let (service, tickets) = service_with_failing_audit();
    let actor = Actor::new(Uuid::new_v4(), Role::User);

    let created = service
        .create_ticket(
            &actor,
            NewTicketInput {
                title: Some("Audit down".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(!created.audit_recorded);
    let ticket_id = created.value.id;

    let updated = service
        .update_ticket(
            &actor,
            ticket_id,
            ExpectedVersion::Exact(1),
            TicketPatch {
                status: Some(TicketStatus::Closed),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(!updated.audit_recorded);

    let stored = tickets.find_by_id(ticket_id).await.unwrap().unwrap();
    assert_eq!(stored.version, 2);
    assert_eq!(stored.status, TicketStatus::Closed);

    let comment = service
        .add_comment(&actor, ticket_id, Some("still saved".to_string()), None)
        .await
        .unwrap();
    assert!(!comment.audit_recorded);

    let history = service
        .get_ticket_with_history(&actor, ticket_id)
        .await
        .unwrap();
    assert_eq!(history.comments.len(), 1);
    assert!(history.audit_logs.is_empty());
}

/// 测试审计失败时响应带上 `x-audit-recorded: false`
#[tokio::test]
async fn test_audit_failure_header() {
    let (service, _) = service_with_failing_audit();
    let user = User {
        id: Uuid::new_v4(),
        name: "Alice".to_string(),
        email: "alice@example.com".to_string(),
        role: Role::User,
        created_at: chrono::Utc::now().fixed_offset(),
    };
    let users = Arc::new(StaticUserRepo {
        user,
        api_key: "tk_static".to_string(),
    });

    let state = AppState {
        ticket_service: service,
        account_service: Arc::new(AccountService::new(users.clone())),
        users,
        idempotency_cache: Arc::new(IdempotencyCache::new(Duration::from_secs(60), 100)),
        rate_limiter: None,
    };
    let server = TestServer::new(routes::routes(state)).unwrap();

    let response = server
        .post("/api/tickets")
        .add_header("Authorization", "Bearer tk_static")
        .json(&json!({ "title": "Audit down" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    assert_eq!(response.header("x-audit-recorded"), "false");

    let ticket: Value = response.json();
    let response = server
        .patch(&format!("/api/tickets/{}", ticket["id"].as_str().unwrap()))
        .add_header("Authorization", "Bearer tk_static")
        .add_header("If-Match", "\"1\"")
        .json(&json!({ "priority": "low" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.header("x-audit-recorded"), "false");
    assert_eq!(response.json::<Value>()["version"], 2);
}
