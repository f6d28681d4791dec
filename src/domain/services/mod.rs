// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含的服务：
/// - 账号服务（account_service）：用户注册与 API Key 签发
/// - 访问判定（access_policy）：角色与工单关系到允许操作的纯函数
/// - 审计轨迹（audit_trail）：只追加的操作记录
/// - SLA 时钟（sla_clock）：截止时间计算与违约判断
/// - 工单服务（ticket_service）：版本门控的读改写流程
pub mod access_policy;
pub mod account_service;
pub mod audit_trail;
pub mod sla_clock;
pub mod ticket_service;
