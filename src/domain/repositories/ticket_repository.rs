// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::ticket::{Ticket, TicketPatch, TicketStatus};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// 记录未找到
    #[error("Record not found")]
    NotFound,
    /// 违反唯一约束
    #[error("Duplicate record: {0}")]
    Duplicate(String),
}

/// 列表查询的角色范围
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TicketScope {
    /// 全部工单
    #[default]
    All,
    /// 指定用户创建的工单
    CreatedBy(Uuid),
    /// 指派给指定用户的工单
    AssignedTo(Uuid),
}

/// 工单查询参数
#[derive(Debug, Clone)]
pub struct TicketQueryParams {
    pub scope: TicketScope,
    pub status: Option<TicketStatus>,
    /// 只返回在该时刻已违反 SLA 的工单
    pub breached_at: Option<DateTime<FixedOffset>>,
    /// 在标题、描述和评论内容中做子串匹配
    pub search: Option<String>,
    pub limit: u32,
    pub offset: u32,
}

impl Default for TicketQueryParams {
    fn default() -> Self {
        Self {
            scope: TicketScope::All,
            status: None,
            breached_at: None,
            search: None,
            limit: 10,
            offset: 0,
        }
    }
}

/// 版本门控写入的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionalUpdate {
    /// 恰好一行被更新
    Applied,
    /// 没有匹配 id 与版本的行
    NotApplied,
}

/// 工单仓库特质
///
/// 定义工单数据访问接口。唯一的修改路径是 `update_if_version`，
/// 它必须是一次原子的比较并写入。
#[async_trait]
pub trait TicketRepository: Send + Sync {
    /// 创建新工单
    async fn create(&self, ticket: &Ticket) -> Result<Ticket, RepositoryError>;
    /// 根据ID查找工单
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Ticket>, RepositoryError>;
    /// 仅当当前版本等于 `expected_version` 时应用补丁并将版本加一
    async fn update_if_version(
        &self,
        id: Uuid,
        expected_version: i64,
        patch: &TicketPatch,
    ) -> Result<ConditionalUpdate, RepositoryError>;
    /// 分页查询，返回当前页与总数
    async fn query_tickets(
        &self,
        params: TicketQueryParams,
    ) -> Result<(Vec<Ticket>, u64), RepositoryError>;
}
