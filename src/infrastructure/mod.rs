// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 该模块包含系统的技术实现细节，负责与数据库和监控系统交互。
///
/// 包含的子模块：
/// - 缓存（cache）：进程内幂等响应缓存
/// - 数据库（database）：数据库连接、实体映射与演示数据
/// - 指标（metrics）：Prometheus 指标导出
/// - 仓库实现（repositories）：领域仓库接口的具体实现
///
/// 基础设施层依赖于领域层的抽象接口，
/// 确保领域层保持纯粹的业务逻辑，不受技术实现的影响。
pub mod cache;
pub mod database;
pub mod metrics;
pub mod repositories;
