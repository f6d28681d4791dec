// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 审计动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Created,
    Updated,
    Commented,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AuditAction::Created => write!(f, "created"),
            AuditAction::Updated => write!(f, "updated"),
            AuditAction::Commented => write!(f, "commented"),
        }
    }
}

impl FromStr for AuditAction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(AuditAction::Created),
            "updated" => Ok(AuditAction::Updated),
            "commented" => Ok(AuditAction::Commented),
            _ => Err(()),
        }
    }
}

/// 审计日志条目
///
/// 只追加。同一工单内按 `created_at` 排序，时间相同时按自增 `id` 排序。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: i32,
    /// 与工单无关的动作为空
    pub ticket_id: Option<Uuid>,
    pub actor_id: Uuid,
    pub action: AuditAction,
    /// 描述变更内容的结构化负载
    pub meta: serde_json::Value,
    pub created_at: DateTime<FixedOffset>,
}

/// 待写入的审计条目
#[derive(Debug, Clone)]
pub struct NewAuditLogEntry {
    pub ticket_id: Option<Uuid>,
    pub actor_id: Uuid,
    pub action: AuditAction,
    pub meta: serde_json::Value,
    pub created_at: DateTime<FixedOffset>,
}
