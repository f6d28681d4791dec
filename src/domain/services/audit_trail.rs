// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::models::audit_log::{AuditAction, AuditLogEntry, NewAuditLogEntry};
use crate::domain::repositories::audit_log_repository::AuditLogRepository;
use crate::domain::repositories::ticket_repository::RepositoryError;

/// 审计轨迹
///
/// 只追加的工单操作记录。写入失败不会回滚已提交的业务修改，
/// 只记录错误日志并累加 `audit_write_failures_total` 计数，
/// 由调用方通过返回值决定如何告知客户端。
#[derive(Clone)]
pub struct AuditTrail {
    repo: Arc<dyn AuditLogRepository>,
}

impl AuditTrail {
    pub fn new(repo: Arc<dyn AuditLogRepository>) -> Self {
        Self { repo }
    }

    /// 追加一条审计记录
    ///
    /// # 返回值
    ///
    /// 写入成功返回 `true`，失败返回 `false`
    pub async fn append(
        &self,
        ticket_id: Option<Uuid>,
        actor_id: Uuid,
        action: AuditAction,
        meta: Value,
    ) -> bool {
        let entry = NewAuditLogEntry {
            ticket_id,
            actor_id,
            action,
            meta,
            created_at: Utc::now().fixed_offset(),
        };

        match self.repo.append(entry).await {
            Ok(saved) => {
                tracing::debug!(
                    audit_id = saved.id,
                    ticket_id = ?ticket_id,
                    action = %action,
                    "Audit entry recorded"
                );
                true
            }
            Err(e) => {
                tracing::error!(
                    ticket_id = ?ticket_id,
                    actor_id = %actor_id,
                    action = %action,
                    "Failed to record audit entry: {}",
                    e
                );
                metrics::counter!("audit_write_failures_total").increment(1);
                false
            }
        }
    }

    /// 按创建顺序返回工单的全部审计记录
    pub async fn history(&self, ticket_id: Uuid) -> Result<Vec<AuditLogEntry>, RepositoryError> {
        self.repo.find_by_ticket(ticket_id).await
    }
}
