// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Duration, FixedOffset, Utc};
use thiserror::Error;

use crate::domain::models::ticket::{Ticket, TicketPriority, TicketStatus};

/// 没有可识别优先级时使用的 SLA 时长（秒）
pub const FALLBACK_SLA_SECONDS: i64 = 3600;

/// 允许的最大显式 SLA 时长（秒），约十年
pub const MAX_SLA_SECONDS: i64 = 10 * 366 * 24 * 3600;

/// SLA 计算错误
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlaError {
    #[error("sla_seconds must not exceed {max}")]
    OutOfRange { max: i64 },
}

/// SLA 时限
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlaWindow {
    pub sla_seconds: i64,
    pub due_at: DateTime<FixedOffset>,
}

/// 计算 SLA 截止时间
///
/// 显式提供且为正数的 `explicit_sla_seconds` 优先，否则按优先级取默认值。
///
/// # 参数
///
/// * `created_at` - 工单创建时间
/// * `priority` - 优先级
/// * `explicit_sla_seconds` - 调用方指定的 SLA 时长
///
/// # 返回值
///
/// * `Ok(SlaWindow)` - SLA 时长与截止时间
/// * `Err(SlaError)` - 显式时长超过 [`MAX_SLA_SECONDS`] 或截止时间超出可表示范围
pub fn compute_due_at(
    created_at: DateTime<FixedOffset>,
    priority: Option<TicketPriority>,
    explicit_sla_seconds: Option<i64>,
) -> Result<SlaWindow, SlaError> {
    let out_of_range = SlaError::OutOfRange {
        max: MAX_SLA_SECONDS,
    };

    let sla_seconds = match explicit_sla_seconds {
        Some(seconds) if seconds > MAX_SLA_SECONDS => return Err(out_of_range),
        Some(seconds) if seconds > 0 => seconds,
        _ => priority
            .map(TicketPriority::default_sla_seconds)
            .unwrap_or(FALLBACK_SLA_SECONDS),
    };

    let due_at = Duration::try_seconds(sla_seconds)
        .and_then(|window| created_at.checked_add_signed(window))
        .ok_or(out_of_range)?;

    Ok(SlaWindow {
        sla_seconds,
        due_at,
    })
}

/// 工单在 `now` 时刻是否已违反 SLA
///
/// 截止时间已过且工单未关闭即视为违反。无副作用，不加锁。
pub fn is_breached(ticket: &Ticket, now: DateTime<Utc>) -> bool {
    now > ticket.sla_due_at && ticket.status != TicketStatus::Closed
}
