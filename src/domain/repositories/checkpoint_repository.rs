// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::checkpoint::CrawlCheckpoint;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;

/// 检查点仓库特质
///
/// 以 (数据源, 区域) 为键保存分页进度
#[async_trait]
pub trait CheckpointRepository: Send + Sync {
    /// 查询检查点
    ///
    /// # 返回值
    ///
    /// * `Ok(Some(CrawlCheckpoint))` - 存在检查点
    /// * `Ok(None)` - 不存在，应从第1页开始
    /// * `Err(RepositoryError)` - 查询失败
    async fn get(
        &self,
        source_id: &str,
        region: &str,
    ) -> Result<Option<CrawlCheckpoint>, RepositoryError>;

    /// 保存（覆盖）检查点
    async fn save(&self, checkpoint: &CrawlCheckpoint) -> Result<(), RepositoryError>;

    /// 删除检查点，不存在时也返回成功
    async fn clear(&self, source_id: &str, region: &str) -> Result<(), RepositoryError>;
}
