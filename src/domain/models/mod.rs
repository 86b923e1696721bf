// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了采集流程的核心数据结构，包括：
/// - 机构（organization）：采集到的机构记录、表格行和邮箱抓取目标
/// - 数据源（source）：数据源描述、适配器类型和认证配置
/// - 检查点（checkpoint）：可续传数据源的分页进度
/// - 进度（progress）：推送给界面层的进度快照和日志
pub mod checkpoint;
pub mod organization;
pub mod progress;
pub mod source;
