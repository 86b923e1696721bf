// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::organization::{CrawlTarget, EmailStatus, OrganizationRow};
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;

/// 机构表仓库特质
///
/// 只追加的外部表格。行号从0开始，按追加顺序分配，追加后不会改变。
#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    /// 读取所有已入库机构的名称，用于初始化去重索引
    ///
    /// # 返回值
    ///
    /// * `Ok(Vec<String>)` - 原始名称列表（未规范化）
    /// * `Err(RepositoryError)` - 读取失败
    async fn existing_names(&self) -> Result<Vec<String>, RepositoryError>;

    /// 批量追加行
    ///
    /// # 参数
    ///
    /// * `rows` - 按固定列顺序的机构行
    ///
    /// # 返回值
    ///
    /// * `Ok(usize)` - 实际写入的行数
    /// * `Err(RepositoryError)` - 写入失败
    async fn append(&self, rows: &[OrganizationRow]) -> Result<usize, RepositoryError>;

    /// 查询待抓取邮箱的目标（状态为 `N` 且有主页）
    ///
    /// # 参数
    ///
    /// * `category` - 可选的类别过滤
    async fn pending_targets(
        &self,
        category: Option<&str>,
    ) -> Result<Vec<CrawlTarget>, RepositoryError>;

    /// 按行号回写邮箱状态
    async fn update_email_status(
        &self,
        row_index: usize,
        status: EmailStatus,
    ) -> Result<(), RepositoryError>;
}
