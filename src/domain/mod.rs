// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务逻辑，包括：
/// - 领域模型（models）：机构、检查点、进度和数据源描述
/// - 仓库接口（repositories）：机构表、联系人表和检查点的持久化抽象
/// - 服务（services）：采集编排、去重、持久化和邮箱抓取
///
/// 领域层只依赖仓库接口，具体存储由基础设施层提供。
pub mod models;
pub mod repositories;
pub mod services;
