// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::organization::ContactRow;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;

/// 联系人表仓库特质
///
/// 只追加，行结构为名称、邮箱、类别
#[async_trait]
pub trait ContactRepository: Send + Sync {
    /// 批量追加联系人，返回写入的行数
    async fn append(&self, rows: &[ContactRow]) -> Result<usize, RepositoryError>;
}
