// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 工单（ticket）：带版本令牌与 SLA 时限的支持工单
/// - 评论（comment）：工单下只追加的回复树
/// - 审计日志（audit_log）：工单上每次状态变化的记录
/// - 用户（user）：身份、角色与请求发起者
pub mod audit_log;
pub mod comment;
pub mod ticket;
pub mod user;
