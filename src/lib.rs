// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含核心业务实体、服务和仓库接口
pub mod domain;

/// 引擎模块
///
/// 直连与中继传输引擎，以及按顺序回退的代理网关
pub mod engines;

/// 基础设施模块
///
/// 提供仓库接口的内存实现和本地文件实现
pub mod infrastructure;

/// 数据源模块
///
/// 区域枚举表、三种数据源适配器和数据源注册表
pub mod sources;

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
pub mod utils;
