// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 数据源模块
///
/// 统一的区域抓取接口及其三种实现：
/// - 分页API（paged_api）：按区县请求固定大小的页
/// - 全量过滤（bulk_filter）：无区域参数，抓取全部后按地址过滤
/// - HTML名录（html_scrape）：经中继逐页抓取并解析，支持检查点续传
pub mod bulk_filter;
pub mod html_scrape;
pub mod json_records;
pub mod paged_api;
pub mod regions;
pub mod registry;

use crate::domain::models::organization::CollectedOrganization;
use crate::utils::errors::SourceError;
use async_trait::async_trait;
use regions::Region;
use tokio_util::sync::CancellationToken;

/// 抓取过滤条件
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchFilters {
    /// 仅保留私立机构
    pub private_only: bool,
}

/// 区域抓取的结束方式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchEnd {
    /// 数据自然结束
    Exhausted,
    /// 被取消，结果为部分数据
    Cancelled,
    /// 部分页面无法获取，结果为部分数据
    Interrupted(String),
}

/// 一页在结果中的起点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSpan {
    /// 页码
    pub page: u32,
    /// 该页第一条机构在 `organizations` 中的下标
    pub start: usize,
}

/// 区域抓取结果
#[derive(Debug, Clone)]
pub struct RegionFetch {
    /// 按抓取顺序排列的机构
    pub organizations: Vec<CollectedOrganization>,
    pub end: FetchEnd,
    /// 可续传适配器记录的页起点，按页码递增；其他适配器为空
    pub pages: Vec<PageSpan>,
}

impl RegionFetch {
    pub fn new(organizations: Vec<CollectedOrganization>, end: FetchEnd) -> Self {
        Self {
            organizations,
            end,
            pages: Vec::new(),
        }
    }

    pub fn exhausted(organizations: Vec<CollectedOrganization>) -> Self {
        Self::new(organizations, FetchEnd::Exhausted)
    }

    pub fn cancelled(organizations: Vec<CollectedOrganization>) -> Self {
        Self::new(organizations, FetchEnd::Cancelled)
    }

    pub fn with_pages(mut self, pages: Vec<PageSpan>) -> Self {
        self.pages = pages;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.end == FetchEnd::Cancelled
    }

    /// 第 `index` 条机构所在的页码，没有页信息时为 `None`
    pub fn page_of(&self, index: usize) -> Option<u32> {
        self.pages
            .iter()
            .take_while(|span| span.start <= index)
            .last()
            .map(|span| span.page)
    }
}

/// 数据源适配器特质
///
/// 每个实现自行负责分页与终止规则。良构响应中的零结果视为分页结束，不是错误。
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// 抓取一个区域
    ///
    /// # 参数
    ///
    /// * `region` - 区域
    /// * `filters` - 过滤条件
    /// * `cancel` - 取消令牌
    ///
    /// # 返回值
    ///
    /// * `Ok(RegionFetch)` - 区域结果（可能是取消或中断后的部分结果）
    /// * `Err(SourceError)` - 区域级错误，编排器记录后跳过该区域
    async fn fetch_region(
        &self,
        region: &Region,
        filters: &FetchFilters,
        cancel: &CancellationToken,
    ) -> Result<RegionFetch, SourceError>;

    /// 适配器名称
    fn name(&self) -> &str;

    /// 可续传能力探测
    fn as_resumable(&self) -> Option<&dyn Resumable> {
        None
    }
}

/// 可续传能力
///
/// 适配器每处理完一页就推进检查点。编排器没能写入全部结果时
/// （预算截断或写入失败）用 `rewind` 把检查点退回第一条未写入记录所在的页。
#[async_trait]
pub trait Resumable: Send + Sync {
    /// 区域下次开始的页码，无检查点时为 `None`
    async fn resume_page(&self, region: &Region) -> Result<Option<u32>, SourceError>;

    /// 把区域的检查点设为 `page`
    async fn rewind(&self, region: &Region, page: u32) -> Result<(), SourceError>;

    /// 清除区域的检查点
    async fn reset(&self, region: &Region) -> Result<(), SourceError>;
}
