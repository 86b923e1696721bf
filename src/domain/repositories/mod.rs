// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 该模块定义了领域层的仓库接口，遵循依赖倒置原则。
/// 具体实现由基础设施层提供（内存实现和本地文件实现）。
///
/// 包含的仓库接口：
/// - 机构仓库（organization_repository）：只追加的机构表及邮箱状态回写
/// - 联系人仓库（contact_repository）：只追加的联系人表
/// - 检查点仓库（checkpoint_repository）：可续传数据源的分页进度
pub mod checkpoint_repository;
pub mod contact_repository;
pub mod organization_repository;
