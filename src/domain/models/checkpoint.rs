// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 抓取检查点
///
/// 仅可续传的数据源使用。`last_page` 是下次运行应当请求的页码：
/// 每成功处理一页推进为 `page + 1`，取消或传输失败时记录为当前页，
/// 区域自然结束时删除。不存在检查点即从第1页开始。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlCheckpoint {
    /// 数据源ID
    pub source_id: String,
    /// 区域代码
    pub region: String,
    /// 下次开始的页码
    pub last_page: u32,
    /// 最后更新时间
    pub last_updated_at: DateTime<Utc>,
}

impl CrawlCheckpoint {
    pub fn new(source_id: impl Into<String>, region: impl Into<String>, last_page: u32) -> Self {
        Self {
            source_id: source_id.into(),
            region: region.into(),
            last_page,
            last_updated_at: Utc::now(),
        }
    }
}
