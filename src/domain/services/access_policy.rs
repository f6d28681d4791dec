// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

use crate::domain::models::ticket::Ticket;
use crate::domain::models::user::{Actor, Role};
use crate::domain::repositories::ticket_repository::TicketScope;

/// 工单上的操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketOperation {
    Read,
    Comment,
    Update,
}

/// 判断发起者能否在工单上执行操作
///
/// 对任意 (角色, 工单, 操作) 组合都给出确定的结果：
/// - 管理员：全部允许
/// - 客服：指派给自己时可读、评论、更新；仅为创建者时只能读和评论
/// - 普通用户：仅限自己创建的工单
pub fn allowed(actor: &Actor, ticket: &Ticket, operation: TicketOperation) -> bool {
    let is_creator = ticket.created_by == actor.id;
    let is_assignee = ticket.assigned_to == Some(actor.id);

    match actor.role {
        Role::Admin => true,
        Role::Agent => match operation {
            TicketOperation::Read | TicketOperation::Comment => is_assignee || is_creator,
            TicketOperation::Update => is_assignee,
        },
        Role::User => is_creator,
    }
}

/// 列表查询时发起者可见的工单范围
pub fn list_scope(actor: &Actor) -> TicketScope {
    match actor.role {
        Role::Admin => TicketScope::All,
        Role::Agent => TicketScope::AssignedTo(actor.id),
        Role::User => TicketScope::CreatedBy(actor.id),
    }
}
