// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 该模块定义了领域层的仓库接口，遵循依赖倒置原则。
/// 仓库接口定义了数据持久化的抽象契约，具体实现由基础设施层提供。
///
/// 包含的仓库接口：
/// - 审计日志仓库（audit_log_repository）：只追加的审计记录
/// - 评论仓库（comment_repository）：工单评论的追加与读取
/// - 工单仓库（ticket_repository）：工单的创建、版本门控更新与查询
/// - 用户仓库（user_repository）：API 密钥到用户身份的解析
pub mod audit_log_repository;
pub mod comment_repository;
pub mod ticket_repository;
pub mod user_repository;
