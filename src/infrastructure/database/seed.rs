// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{Duration, Utc};
use tracing::info;

use crate::domain::models::comment::NewComment;
use crate::domain::models::ticket::{Ticket, TicketPriority, TicketStatus};
use crate::domain::models::user::{Role, User};
use crate::domain::repositories::comment_repository::CommentRepository;
use crate::domain::repositories::ticket_repository::{
    RepositoryError, TicketQueryParams, TicketRepository, TicketScope,
};
use crate::domain::repositories::user_repository::UserRepository;
use crate::domain::services::sla_clock::SlaWindow;

/// 演示用户：(名称, 邮箱, 角色)
const DEMO_USERS: [(&str, &str, Role); 3] = [
    ("Alice", "alice@example.com", Role::User),
    ("Agent", "agent@help.com", Role::Agent),
    ("Admin", "admin@help.com", Role::Admin),
];

/// 演示工单：(标题, 描述, 状态, 优先级, SLA 秒数)
const DEMO_TICKETS: [(&str, &str, TicketStatus, TicketPriority, i64); 2] = [
    (
        "Printer error",
        "Printer not working",
        TicketStatus::Open,
        TicketPriority::High,
        3600,
    ),
    (
        "VPN issue",
        "Cannot connect to VPN",
        TicketStatus::InProgress,
        TicketPriority::Normal,
        7200,
    ),
];

const DEMO_COMMENT: &str = "Reboot printer and check again";

/// 创建演示用户并为每个用户签发新的 API Key
///
/// 已存在的用户不会重复创建，但每次启动都会签发新 Key 并打印到日志。
pub async fn seed_demo_users(
    users: &dyn UserRepository,
) -> Result<Vec<(User, String)>, RepositoryError> {
    let mut seeded = Vec::with_capacity(DEMO_USERS.len());

    for (name, email, role) in DEMO_USERS {
        let user = match users.find_by_email(email).await? {
            Some(existing) => existing,
            None => users.create(name, email, role).await?,
        };
        let key = users.issue_api_key(user.id).await?;

        info!(
            user_id = %user.id,
            email = %user.email,
            role = %user.role,
            "Demo user ready, api key: {}",
            key
        );
        seeded.push((user, key));
    }

    Ok(seeded)
}

/// 创建演示工单
///
/// 两张由 `creator` 提交、指派给 `assignee` 的工单，第一张附带一条
/// `assignee` 的评论。`creator` 已有工单时跳过，返回新建的工单。
pub async fn seed_demo_tickets(
    tickets: &dyn TicketRepository,
    comments: &dyn CommentRepository,
    creator: &User,
    assignee: &User,
) -> Result<Vec<Ticket>, RepositoryError> {
    let (_, existing) = tickets
        .query_tickets(TicketQueryParams {
            scope: TicketScope::CreatedBy(creator.id),
            limit: 1,
            ..Default::default()
        })
        .await?;
    if existing > 0 {
        info!(user_id = %creator.id, "Demo tickets already present, skipping");
        return Ok(Vec::new());
    }

    let now = Utc::now().fixed_offset();
    let mut seeded = Vec::with_capacity(DEMO_TICKETS.len());

    for (title, description, status, priority, sla_seconds) in DEMO_TICKETS {
        let mut ticket = Ticket::new(
            title.to_string(),
            Some(description.to_string()),
            priority,
            creator.id,
            now,
            SlaWindow {
                sla_seconds,
                due_at: now + Duration::seconds(sla_seconds),
            },
        );
        ticket.status = status;
        ticket.assigned_to = Some(assignee.id);
        seeded.push(tickets.create(&ticket).await?);
    }

    if let Some(first) = seeded.first() {
        comments
            .create(NewComment {
                ticket_id: first.id,
                parent_id: None,
                author_id: assignee.id,
                text: DEMO_COMMENT.to_string(),
                created_at: now,
            })
            .await?;
    }

    info!(count = seeded.len(), "Demo tickets seeded");
    Ok(seeded)
}
