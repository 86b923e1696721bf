// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 该模块包含采集流水线的核心业务逻辑，协调数据源适配器、
/// 代理网关和仓库来完成两个阶段的工作。
///
/// 包含的服务：
/// - 采集服务（collection_service）：按区域编排采集、去重和入库
/// - 去重服务（dedup_service）：以规范化名称为键的内存索引
/// - 持久化服务（persistence_service）：机构表与联系人表的批量追加
/// - 邮箱提取（email_extractor）：从页面中提取并过滤邮箱
/// - 邮箱服务（email_service）：逐个访问主页抓取邮箱并回写状态
/// - 报告器（reporter）：进度回调、日志缓冲和回调隔离
pub mod collection_service;
pub mod dedup_service;
pub mod email_extractor;
pub mod email_service;
pub mod persistence_service;
pub mod reporter;
