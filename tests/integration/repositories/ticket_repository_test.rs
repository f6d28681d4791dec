// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::super::helpers::create_test_db;
use chrono::Utc;
use ticketrs::domain::models::ticket::{Ticket, TicketPatch, TicketPriority, TicketStatus};
use ticketrs::domain::repositories::ticket_repository::{
    ConditionalUpdate, TicketQueryParams, TicketRepository, TicketScope,
};
use ticketrs::domain::services::sla_clock;
use ticketrs::infrastructure::repositories::ticket_repo_impl::TicketRepositoryImpl;
use uuid::Uuid;

fn new_ticket(title: &str, created_by: Uuid) -> Ticket {
    let now = Utc::now().fixed_offset();
    let sla = sla_clock::compute_due_at(now, Some(TicketPriority::Normal), None).unwrap();
    Ticket::new(
        title.to_string(),
        None,
        TicketPriority::Normal,
        created_by,
        now,
        sla,
    )
}

/// 测试条件更新只在版本匹配时生效
///
/// 验证同一个期望版本只能命中一次，第二次写入不会覆盖第一次。
#[tokio::test]
async fn test_update_if_version_applies_once() {
    let db = create_test_db().await;
    let repo = TicketRepositoryImpl::new(db);
    let ticket = repo.create(&new_ticket("Conditional", Uuid::new_v4())).await.unwrap();

    let patch = TicketPatch {
        status: Some(TicketStatus::Resolved),
        assigned_to: Some(Some(Uuid::new_v4())),
        ..Default::default()
    };

    let first = repo.update_if_version(ticket.id, 1, &patch).await.unwrap();
    assert_eq!(first, ConditionalUpdate::Applied);

    let second = repo
        .update_if_version(ticket.id, 1, &TicketPatch::default())
        .await
        .unwrap();
    assert_eq!(second, ConditionalUpdate::NotApplied);

    let stored = repo.find_by_id(ticket.id).await.unwrap().unwrap();
    assert_eq!(stored.version, 2);
    assert_eq!(stored.status, TicketStatus::Resolved);
    assert_eq!(stored.assigned_to, patch.assigned_to.unwrap());
    assert_eq!(stored, patch.apply_to(&ticket));
}

/// 测试对不存在的工单做条件更新
#[tokio::test]
async fn test_update_if_version_missing_ticket() {
    let db = create_test_db().await;
    let repo = TicketRepositoryImpl::new(db);

    let outcome = repo
        .update_if_version(Uuid::new_v4(), 1, &TicketPatch::default())
        .await
        .unwrap();
    assert_eq!(outcome, ConditionalUpdate::NotApplied);
    assert!(repo.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
}

/// 测试取消指派写入 NULL
#[tokio::test]
async fn test_unassign_writes_null() {
    let db = create_test_db().await;
    let repo = TicketRepositoryImpl::new(db);
    let ticket = repo.create(&new_ticket("Assign", Uuid::new_v4())).await.unwrap();

    let assign = TicketPatch {
        assigned_to: Some(Some(Uuid::new_v4())),
        ..Default::default()
    };
    repo.update_if_version(ticket.id, 1, &assign).await.unwrap();

    let unassign = TicketPatch {
        assigned_to: Some(None),
        ..Default::default()
    };
    let outcome = repo.update_if_version(ticket.id, 2, &unassign).await.unwrap();
    assert_eq!(outcome, ConditionalUpdate::Applied);

    let stored = repo.find_by_id(ticket.id).await.unwrap().unwrap();
    assert_eq!(stored.assigned_to, None);
    assert_eq!(stored.version, 3);
}

/// 测试查询的可见范围与分页
#[tokio::test]
async fn test_query_scope_and_paging() {
    let db = create_test_db().await;
    let repo = TicketRepositoryImpl::new(db);
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    for i in 0..3 {
        repo.create(&new_ticket(&format!("Alice {}", i), alice))
            .await
            .unwrap();
    }
    let bobs = repo.create(&new_ticket("Bob", bob)).await.unwrap();

    let (items, total) = repo
        .query_tickets(TicketQueryParams {
            scope: TicketScope::CreatedBy(alice),
            limit: 2,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(total, 3);
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|t| t.created_by == alice));

    let (items, total) = repo
        .query_tickets(TicketQueryParams {
            scope: TicketScope::All,
            offset: 3,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(total, 4);
    assert_eq!(items.len(), 1);

    let (items, _) = repo
        .query_tickets(TicketQueryParams {
            search: Some("Bob".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, bobs.id);

    let (_, total) = repo
        .query_tickets(TicketQueryParams {
            scope: TicketScope::AssignedTo(alice),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(total, 0);
}
