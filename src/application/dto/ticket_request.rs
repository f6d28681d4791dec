// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Deserializer};
use uuid::Uuid;
use validator::Validate;

use crate::domain::models::ticket::{TicketPatch, TicketPriority, TicketStatus};
use crate::domain::services::ticket_service::{NewTicketInput, TicketError, TicketFilters};

/// 列表查询中选择 SLA 违约过滤的特殊状态值
pub const BREACHED_STATUS_FILTER: &str = "breached";

const DEFAULT_PAGE_LIMIT: u32 = 10;

/// 创建工单请求DTO
#[derive(Debug, Default, Deserialize)]
pub struct CreateTicketRequestDto {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    /// 显式 SLA 时长（秒），非正数时忽略
    pub sla_seconds: Option<i64>,
}

impl CreateTicketRequestDto {
    pub fn into_input(self) -> Result<NewTicketInput, TicketError> {
        let priority = self
            .priority
            .as_deref()
            .map(parse_priority)
            .transpose()?;

        Ok(NewTicketInput {
            title: self.title,
            description: self.description,
            priority,
            sla_seconds: self.sla_seconds,
        })
    }
}

/// 修改工单请求DTO
///
/// `assigned_to` 区分"未提供"与显式 `null`（取消指派）。
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTicketRequestDto {
    pub status: Option<String>,
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub assigned_to: Option<Option<String>>,
}

impl UpdateTicketRequestDto {
    pub fn into_patch(self) -> Result<TicketPatch, TicketError> {
        let status = self
            .status
            .as_deref()
            .map(|s| {
                s.parse::<TicketStatus>().map_err(|_| TicketError::InvalidField {
                    field: "status",
                    message: format!("Unknown status: {}", s),
                })
            })
            .transpose()?;

        let priority = self
            .priority
            .as_deref()
            .map(parse_priority)
            .transpose()?;

        let assigned_to = match self.assigned_to {
            None => None,
            Some(None) => Some(None),
            Some(Some(raw)) => {
                let id = Uuid::parse_str(&raw).map_err(|_| TicketError::InvalidField {
                    field: "assigned_to",
                    message: format!("assigned_to is not a valid user id: {}", raw),
                })?;
                Some(Some(id))
            }
        };

        Ok(TicketPatch {
            status,
            priority,
            assigned_to,
        })
    }
}

/// 添加评论请求DTO
#[derive(Debug, Default, Deserialize)]
pub struct CreateCommentRequestDto {
    pub text: Option<String>,
    pub parent_id: Option<i32>,
}

/// 工单列表查询DTO
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ListTicketsQueryDto {
    /// 每页数量
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u32>,

    /// 分页偏移
    pub offset: Option<u32>,

    /// 标题、描述或评论中的子串
    #[validate(length(max = 200))]
    pub q: Option<String>,

    /// 状态过滤，`breached` 表示 SLA 违约
    pub status: Option<String>,
}

impl ListTicketsQueryDto {
    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_PAGE_LIMIT)
    }

    pub fn offset(&self) -> u32 {
        self.offset.unwrap_or(0)
    }

    pub fn filters(&self) -> Result<TicketFilters, TicketError> {
        let mut filters = TicketFilters {
            q: self.q.clone(),
            ..Default::default()
        };

        match self.status.as_deref().map(str::trim) {
            None | Some("") => {}
            Some(BREACHED_STATUS_FILTER) => filters.breached = true,
            Some(other) => {
                let status = other.parse::<TicketStatus>().map_err(|_| TicketError::InvalidField {
                    field: "status",
                    message: format!("Unknown status filter: {}", other),
                })?;
                filters.status = Some(status);
            }
        }

        Ok(filters)
    }
}

fn parse_priority(raw: &str) -> Result<TicketPriority, TicketError> {
    raw.parse::<TicketPriority>()
        .map_err(|_| TicketError::InvalidField {
            field: "priority",
            message: format!("Unknown priority: {}", raw),
        })
}

/// 字段出现时（即使为 null）包一层 `Some`
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}
