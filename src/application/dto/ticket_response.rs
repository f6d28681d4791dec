// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::Utc;
use serde::Serialize;

use crate::domain::models::audit_log::AuditLogEntry;
use crate::domain::models::comment::Comment;
use crate::domain::models::ticket::Ticket;
use crate::domain::services::ticket_service::{TicketHistory, TicketPage};

/// 工单响应DTO，附带当前的 SLA 违约状态
#[derive(Debug, Serialize)]
pub struct TicketResponseDto {
    #[serde(flatten)]
    pub ticket: Ticket,
    pub breached: bool,
}

impl From<Ticket> for TicketResponseDto {
    fn from(ticket: Ticket) -> Self {
        let breached = ticket.is_breached_at(Utc::now());
        Self { ticket, breached }
    }
}

/// 工单详情响应DTO
///
/// 形如 `{ "ticket": {...}, "comments": [...], "audit_logs": [...] }`
#[derive(Debug, Serialize)]
pub struct TicketDetailResponseDto {
    pub ticket: TicketResponseDto,
    pub comments: Vec<Comment>,
    pub audit_logs: Vec<AuditLogEntry>,
}

impl From<TicketHistory> for TicketDetailResponseDto {
    fn from(history: TicketHistory) -> Self {
        Self {
            ticket: history.ticket.into(),
            comments: history.comments,
            audit_logs: history.audit_logs,
        }
    }
}

/// 工单列表响应DTO
#[derive(Debug, Serialize)]
pub struct TicketListResponseDto {
    pub items: Vec<TicketResponseDto>,
    pub total: u64,
    pub next_offset: Option<u32>,
}

impl From<TicketPage> for TicketListResponseDto {
    fn from(page: TicketPage) -> Self {
        Self {
            items: page.items.into_iter().map(Into::into).collect(),
            total: page.total,
            next_offset: page.next_offset,
        }
    }
}
