// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::audit_log::{AuditLogEntry, NewAuditLogEntry};
use crate::domain::repositories::ticket_repository::RepositoryError;
use async_trait::async_trait;
use uuid::Uuid;

/// 审计日志仓库特质
///
/// 只支持追加与按工单顺序读取。
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// 追加一条审计记录
    async fn append(&self, entry: NewAuditLogEntry) -> Result<AuditLogEntry, RepositoryError>;
    /// 按创建顺序列出工单的全部审计记录
    async fn find_by_ticket(&self, ticket_id: Uuid)
        -> Result<Vec<AuditLogEntry>, RepositoryError>;
}
