// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::models::audit_log::{AuditAction, AuditLogEntry};
use crate::domain::models::comment::{Comment, NewComment};
use crate::domain::models::ticket::{Ticket, TicketPatch, TicketPriority, TicketStatus};
use crate::domain::models::user::Actor;
use crate::domain::repositories::comment_repository::CommentRepository;
use crate::domain::repositories::ticket_repository::{
    ConditionalUpdate, RepositoryError, TicketQueryParams, TicketRepository,
};
use crate::domain::services::access_policy::{self, TicketOperation};
use crate::domain::services::audit_trail::AuditTrail;
use crate::domain::services::sla_clock;

/// 审计元数据中评论摘要的最大字符数
const COMMENT_EXCERPT_CHARS: usize = 50;

/// 工单操作错误
#[derive(Error, Debug)]
pub enum TicketError {
    #[error("{field} is required")]
    FieldRequired { field: &'static str },
    #[error("{message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },
    #[error("If-Match header required")]
    VersionRequired,
    #[error("Ticket was modified")]
    VersionMismatch,
    #[error("Access denied")]
    Forbidden,
    #[error("Ticket not found")]
    NotFound,
    #[error("Repository error: {0}")]
    Repository(RepositoryError),
}

impl TicketError {
    /// 稳定的错误码
    pub fn code(&self) -> &'static str {
        match self {
            TicketError::FieldRequired { .. } => "FIELD_REQUIRED",
            TicketError::InvalidField { .. } => "INVALID_FIELD",
            TicketError::VersionRequired => "VERSION_REQUIRED",
            TicketError::VersionMismatch => "VERSION_MISMATCH",
            TicketError::Forbidden => "FORBIDDEN",
            TicketError::NotFound => "NOT_FOUND",
            TicketError::Repository(_) => "INTERNAL",
        }
    }

    /// 出错的字段名
    pub fn field(&self) -> Option<&'static str> {
        match self {
            TicketError::FieldRequired { field } | TicketError::InvalidField { field, .. } => {
                Some(*field)
            }
            _ => None,
        }
    }
}

impl From<RepositoryError> for TicketError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => TicketError::NotFound,
            other => TicketError::Repository(other),
        }
    }
}

/// 调用方提供的版本令牌
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// 未提供
    Missing,
    /// 提供了但无法解析，永远不会匹配
    Unparsable,
    Exact(i64),
}

impl ExpectedVersion {
    /// 解析 `If-Match` 头的值
    ///
    /// 接受 `3`、`"3"` 与 `W/"3"` 三种写法。
    pub fn from_if_match(value: Option<&str>) -> Self {
        let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return ExpectedVersion::Missing;
        };

        let unquoted = raw.strip_prefix("W/").unwrap_or(raw);
        let unquoted = unquoted
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(unquoted);

        match unquoted.parse::<i64>() {
            Ok(version) => ExpectedVersion::Exact(version),
            Err(_) => ExpectedVersion::Unparsable,
        }
    }

    fn matches(self, current: i64) -> bool {
        matches!(self, ExpectedVersion::Exact(v) if v == current)
    }
}

/// 修改结果，附带审计是否写入成功
#[derive(Debug, Clone)]
pub struct Mutation<T> {
    pub value: T,
    pub audit_recorded: bool,
}

/// 创建工单的输入
#[derive(Debug, Clone, Default)]
pub struct NewTicketInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<TicketPriority>,
    pub sla_seconds: Option<i64>,
}

/// 工单详情与历史
#[derive(Debug, Clone, Serialize)]
pub struct TicketHistory {
    pub ticket: Ticket,
    pub comments: Vec<Comment>,
    pub audit_logs: Vec<AuditLogEntry>,
}

/// 列表过滤条件
#[derive(Debug, Clone, Default)]
pub struct TicketFilters {
    pub status: Option<TicketStatus>,
    pub breached: bool,
    pub q: Option<String>,
}

/// 分页结果
#[derive(Debug, Clone, Serialize)]
pub struct TicketPage {
    pub items: Vec<Ticket>,
    pub total: u64,
    pub next_offset: Option<u32>,
}

/// 工单服务
///
/// 以版本号做乐观并发控制，所有写路径都经过访问判定，
/// 提交后追加一条审计记录。
pub struct TicketService {
    ticket_repo: Arc<dyn TicketRepository>,
    comment_repo: Arc<dyn CommentRepository>,
    audit_trail: AuditTrail,
}

impl TicketService {
    pub fn new(
        ticket_repo: Arc<dyn TicketRepository>,
        comment_repo: Arc<dyn CommentRepository>,
        audit_trail: AuditTrail,
    ) -> Self {
        Self {
            ticket_repo,
            comment_repo,
            audit_trail,
        }
    }

    /// 创建工单
    ///
    /// # 参数
    ///
    /// * `actor` - 发起者，成为工单创建者
    /// * `input` - 标题、描述、优先级与可选的 SLA 时长
    ///
    /// # 返回值
    ///
    /// * `Ok(Mutation<Ticket>)` - 新工单，状态 open，版本 1
    /// * `Err(TicketError)` - 标题为空或持久化失败
    pub async fn create_ticket(
        &self,
        actor: &Actor,
        input: NewTicketInput,
    ) -> Result<Mutation<Ticket>, TicketError> {
        let title = match input.title {
            Some(title) if !title.trim().is_empty() => title,
            _ => return Err(TicketError::FieldRequired { field: "title" }),
        };

        let created_at = Utc::now().fixed_offset();
        let priority = input.priority.unwrap_or_default();
        let sla = sla_clock::compute_due_at(created_at, Some(priority), input.sla_seconds)
            .map_err(|e| TicketError::InvalidField {
                field: "sla_seconds",
                message: e.to_string(),
            })?;

        let ticket = Ticket::new(
            title,
            input.description,
            priority,
            actor.id,
            created_at,
            sla,
        );
        let ticket = self.ticket_repo.create(&ticket).await?;

        metrics::counter!("tickets_created_total").increment(1);
        tracing::info!(
            ticket_id = %ticket.id,
            actor_id = %actor.id,
            priority = %ticket.priority,
            sla_seconds = ticket.sla_seconds,
            "Ticket created"
        );

        let audit_recorded = self
            .audit_trail
            .append(
                Some(ticket.id),
                actor.id,
                AuditAction::Created,
                json!({ "title": ticket.title, "priority": ticket.priority }),
            )
            .await;

        Ok(Mutation {
            value: ticket,
            audit_recorded,
        })
    }

    /// 在版本门控下修改工单
    ///
    /// 顺序：版本令牌 → 加载 → 版本比较 → 访问判定 → 条件写入 → 审计。
    /// 条件写入未命中时重新加载以区分工单不存在与并发写者抢先。
    pub async fn update_ticket(
        &self,
        actor: &Actor,
        ticket_id: Uuid,
        expected_version: ExpectedVersion,
        patch: TicketPatch,
    ) -> Result<Mutation<Ticket>, TicketError> {
        if expected_version == ExpectedVersion::Missing {
            return Err(TicketError::VersionRequired);
        }

        let current = self
            .ticket_repo
            .find_by_id(ticket_id)
            .await?
            .ok_or(TicketError::NotFound)?;

        if !expected_version.matches(current.version) {
            metrics::counter!("ticket_version_conflicts_total").increment(1);
            tracing::debug!(
                ticket_id = %ticket_id,
                current_version = current.version,
                expected = ?expected_version,
                "Rejected stale ticket update"
            );
            return Err(TicketError::VersionMismatch);
        }

        if !access_policy::allowed(actor, &current, TicketOperation::Update) {
            return Err(TicketError::Forbidden);
        }

        match self
            .ticket_repo
            .update_if_version(ticket_id, current.version, &patch)
            .await?
        {
            ConditionalUpdate::Applied => {}
            ConditionalUpdate::NotApplied => {
                return match self.ticket_repo.find_by_id(ticket_id).await? {
                    None => Err(TicketError::NotFound),
                    Some(_) => {
                        metrics::counter!("ticket_version_conflicts_total").increment(1);
                        tracing::debug!(
                            ticket_id = %ticket_id,
                            "Concurrent writer won the version race"
                        );
                        Err(TicketError::VersionMismatch)
                    }
                };
            }
        }

        let updated = patch.apply_to(&current);
        metrics::counter!("ticket_updates_total").increment(1);
        tracing::info!(
            ticket_id = %ticket_id,
            actor_id = %actor.id,
            version = updated.version,
            "Ticket updated"
        );

        let meta = serde_json::to_value(&patch).unwrap_or_else(|_| json!({}));
        let audit_recorded = self
            .audit_trail
            .append(Some(ticket_id), actor.id, AuditAction::Updated, meta)
            .await;

        Ok(Mutation {
            value: updated,
            audit_recorded,
        })
    }

    /// 添加评论
    ///
    /// `parent_id` 必须指向同一工单上已存在的评论。
    pub async fn add_comment(
        &self,
        actor: &Actor,
        ticket_id: Uuid,
        text: Option<String>,
        parent_id: Option<i32>,
    ) -> Result<Mutation<Comment>, TicketError> {
        let text = match text {
            Some(text) if !text.trim().is_empty() => text,
            _ => return Err(TicketError::FieldRequired { field: "text" }),
        };

        let ticket = self
            .ticket_repo
            .find_by_id(ticket_id)
            .await?
            .ok_or(TicketError::NotFound)?;

        if !access_policy::allowed(actor, &ticket, TicketOperation::Comment) {
            return Err(TicketError::Forbidden);
        }

        if let Some(parent_id) = parent_id {
            let parent = self.comment_repo.find_by_id(parent_id).await?;
            if !matches!(parent, Some(ref p) if p.ticket_id == ticket_id) {
                return Err(TicketError::InvalidField {
                    field: "parent_id",
                    message: "parent_id must reference a comment on the same ticket".to_string(),
                });
            }
        }

        let comment = self
            .comment_repo
            .create(NewComment {
                ticket_id,
                parent_id,
                author_id: actor.id,
                text,
                created_at: Utc::now().fixed_offset(),
            })
            .await?;

        metrics::counter!("comments_created_total").increment(1);
        tracing::info!(
            ticket_id = %ticket_id,
            comment_id = comment.id,
            actor_id = %actor.id,
            "Comment added"
        );

        let excerpt: String = comment.text.chars().take(COMMENT_EXCERPT_CHARS).collect();
        let audit_recorded = self
            .audit_trail
            .append(
                Some(ticket_id),
                actor.id,
                AuditAction::Commented,
                json!({ "comment_id": comment.id, "text": excerpt }),
            )
            .await;

        Ok(Mutation {
            value: comment,
            audit_recorded,
        })
    }

    /// 读取工单及其评论与审计历史
    pub async fn get_ticket_with_history(
        &self,
        actor: &Actor,
        ticket_id: Uuid,
    ) -> Result<TicketHistory, TicketError> {
        let ticket = self
            .ticket_repo
            .find_by_id(ticket_id)
            .await?
            .ok_or(TicketError::NotFound)?;

        if !access_policy::allowed(actor, &ticket, TicketOperation::Read) {
            return Err(TicketError::Forbidden);
        }

        let comments = self.comment_repo.find_by_ticket(ticket_id).await?;
        let audit_logs = self.audit_trail.history(ticket_id).await?;

        Ok(TicketHistory {
            ticket,
            comments,
            audit_logs,
        })
    }

    /// 按发起者可见范围分页列出工单，最新的在前
    pub async fn list_tickets(
        &self,
        actor: &Actor,
        filters: TicketFilters,
        limit: u32,
        offset: u32,
    ) -> Result<TicketPage, TicketError> {
        let params = TicketQueryParams {
            scope: access_policy::list_scope(actor),
            status: filters.status,
            breached_at: filters.breached.then(|| Utc::now().fixed_offset()),
            search: filters.q.filter(|q| !q.trim().is_empty()),
            limit,
            offset,
        };

        let (items, total) = self.ticket_repo.query_tickets(params).await?;
        let next_offset = next_offset(offset, limit, items.len(), total);

        Ok(TicketPage {
            items,
            total,
            next_offset,
        })
    }
}

fn next_offset(offset: u32, limit: u32, returned: usize, total: u64) -> Option<u32> {
    if (offset as u64) + (returned as u64) < total {
        Some(offset.saturating_add(limit))
    } else {
        None
    }
}
