// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::services::sla_clock::SlaWindow;

/// 工单实体
///
/// 表示一个支持工单。`version` 是乐观并发控制的版本令牌，
/// 创建时为 1，每次被接受的修改严格加 1。
/// `sla_seconds` 与 `sla_due_at` 在创建时确定，之后不再变化。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    /// 工单唯一标识符
    pub id: Uuid,
    /// 标题
    pub title: String,
    /// 描述
    pub description: Option<String>,
    /// 当前状态
    pub status: TicketStatus,
    /// 优先级
    pub priority: TicketPriority,
    /// 创建者用户ID，不可变
    pub created_by: Uuid,
    /// 指派的处理人
    pub assigned_to: Option<Uuid>,
    /// SLA 时长（秒）
    pub sla_seconds: i64,
    /// SLA 截止时间
    pub sla_due_at: DateTime<FixedOffset>,
    /// 版本号
    pub version: i64,
    /// 创建时间
    pub created_at: DateTime<FixedOffset>,
}

/// 工单状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    /// 新建
    #[default]
    Open,
    /// 处理中
    InProgress,
    /// 已解决
    Resolved,
    /// 已关闭
    Closed,
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TicketStatus::Open => write!(f, "open"),
            TicketStatus::InProgress => write!(f, "in_progress"),
            TicketStatus::Resolved => write!(f, "resolved"),
            TicketStatus::Closed => write!(f, "closed"),
        }
    }
}

impl FromStr for TicketStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(TicketStatus::Open),
            "in_progress" => Ok(TicketStatus::InProgress),
            "resolved" => Ok(TicketStatus::Resolved),
            "closed" => Ok(TicketStatus::Closed),
            _ => Err(()),
        }
    }
}

/// 工单优先级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl TicketPriority {
    /// 该优先级对应的默认 SLA 时长（秒）
    pub const fn default_sla_seconds(self) -> i64 {
        match self {
            TicketPriority::Low => 7200,
            TicketPriority::Normal => 3600,
            TicketPriority::High => 1800,
            TicketPriority::Urgent => 900,
        }
    }
}

impl fmt::Display for TicketPriority {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TicketPriority::Low => write!(f, "low"),
            TicketPriority::Normal => write!(f, "normal"),
            TicketPriority::High => write!(f, "high"),
            TicketPriority::Urgent => write!(f, "urgent"),
        }
    }
}

impl FromStr for TicketPriority {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(TicketPriority::Low),
            "normal" => Ok(TicketPriority::Normal),
            "high" => Ok(TicketPriority::High),
            "urgent" => Ok(TicketPriority::Urgent),
            _ => Err(()),
        }
    }
}

/// 工单修改补丁
///
/// 只有出现的字段会被应用。`assigned_to` 为 `Some(None)` 表示取消指派。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TicketPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TicketStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<TicketPriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<Option<Uuid>>,
}

impl TicketPatch {
    /// 将补丁应用到工单快照上并递增版本号
    ///
    /// 返回的工单与版本门控写入后存储中的状态一致。
    /// 优先级变化不会重新计算 SLA 截止时间。
    pub fn apply_to(&self, ticket: &Ticket) -> Ticket {
        let mut next = ticket.clone();
        if let Some(status) = self.status {
            next.status = status;
        }
        if let Some(priority) = self.priority {
            next.priority = priority;
        }
        if let Some(assigned_to) = self.assigned_to {
            next.assigned_to = assigned_to;
        }
        next.version = ticket.version + 1;
        next
    }
}

impl Ticket {
    /// 创建一个新的工单
    ///
    /// # 参数
    ///
    /// * `title` - 标题
    /// * `description` - 描述
    /// * `priority` - 优先级
    /// * `created_by` - 创建者
    /// * `created_at` - 创建时间
    /// * `sla` - 由 SLA 时钟计算出的时限
    ///
    /// # 返回值
    ///
    /// 返回状态为 open、版本为 1 的工单
    pub fn new(
        title: String,
        description: Option<String>,
        priority: TicketPriority,
        created_by: Uuid,
        created_at: DateTime<FixedOffset>,
        sla: SlaWindow,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            description,
            status: TicketStatus::Open,
            priority,
            created_by,
            assigned_to: None,
            sla_seconds: sla.sla_seconds,
            sla_due_at: sla.due_at,
            version: 1,
            created_at,
        }
    }

    /// 工单在给定时刻是否已违反 SLA
    pub fn is_breached_at(&self, now: DateTime<Utc>) -> bool {
        crate::domain::services::sla_clock::is_breached(self, now)
    }
}
