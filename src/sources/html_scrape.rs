// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::checkpoint::CrawlCheckpoint;
use crate::domain::models::organization::CollectedOrganization;
use crate::domain::repositories::checkpoint_repository::CheckpointRepository;
use crate::engines::gateway::ProxyGateway;
use crate::engines::validators::PayloadKind;
use crate::sources::regions::Region;
use crate::sources::{FetchEnd, FetchFilters, PageSpan, RegionFetch, Resumable, SourceAdapter};
use crate::utils::errors::SourceError;
use crate::utils::pacing::pause;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// 名录中的一个条目块
///
/// 首行五个 `rowspan` 单元格（名称、类型、负责人、地区标签、地址）加电话，
/// 其后三行依次是主页、传真、邮箱
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub org_type: String,
    pub representative: String,
    pub region_label: String,
    pub address: String,
    pub phone: String,
    pub homepage: String,
    pub fax: String,
    pub email: String,
}

impl ListingEntry {
    fn into_organization(self, region: &str) -> Option<CollectedOrganization> {
        if self.name.is_empty() {
            return None;
        }
        let mut org = CollectedOrganization::new(self.name, region);
        org.org_type = self.org_type;
        org.representative = self.representative;
        org.address = self.address;
        org.phone = self.phone;
        org.homepage = self.homepage;
        org.email = Some(self.email).filter(|e| e.contains('@'));
        Some(org)
    }
}

// Cell content may hold nested markup but never a closing `</td>` or `</tr>`
const CELL_BODY: &str = r"((?:[^<]|<[^/]|</[^t])*)";

static BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    let lead = format!(r"<td[^>]*rowspan[^>]*>{CELL_BODY}</td>\s*");
    let satellite = format!(r"<tr[^>]*>\s*<td[^>]*>{CELL_BODY}</td>\s*</tr>\s*");
    let pattern = format!(
        r"(?is)<tr[^>]*>\s*{lead}{lead}{lead}{lead}{lead}<td[^>]*>{CELL_BODY}</td>\s*</tr>\s*{satellite}{satellite}{satellite}"
    );
    Regex::new(&pattern).expect("Failed to compile block regex")
});

static ROW_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<tr[^>]*>(.*?)</tr>").expect("Failed to compile row regex"));

static CELL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<t[dh]([^>]*)>(.*?)</t[dh]>").expect("Failed to compile cell regex")
});

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]+>").expect("Failed to compile HTML clean regex"));

static PAGE_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[?&;]page=(\d+)").expect("Failed to compile page link regex"));

/// 去掉标签、解码实体并折叠空白
fn clean_cell(raw: &str) -> String {
    let text = TAG_RE.replace_all(raw, " ");
    let decoded = html_escape::decode_html_entities(&text);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 解析名录页面
///
/// 先用结构化正则匹配完整条目块；匹配数为零时退回逐行遍历，
/// 容忍缺失的附属行。标记漂移时返回空列表，不报错。
pub fn parse_listing(html: &str) -> Vec<ListingEntry> {
    let entries: Vec<ListingEntry> = BLOCK_RE
        .captures_iter(html)
        .map(|caps| {
            let cell = |i: usize| caps.get(i).map(|m| clean_cell(m.as_str())).unwrap_or_default();
            ListingEntry {
                name: cell(1),
                org_type: cell(2),
                representative: cell(3),
                region_label: cell(4),
                address: cell(5),
                phone: cell(6),
                homepage: cell(7),
                fax: cell(8),
                email: cell(9),
            }
        })
        .filter(|entry| !entry.name.is_empty())
        .collect();

    if !entries.is_empty() {
        return entries;
    }

    let fallback = walk_rows(html);
    if !fallback.is_empty() {
        debug!("Structured match failed, row walker found {} entries", fallback.len());
    }
    fallback
}

/// 逐行遍历：六个及以上单元格且首格带 `rowspan` 的行开始一个条目，
/// 紧随其后的单格行依次作为主页、传真、邮箱
fn walk_rows(html: &str) -> Vec<ListingEntry> {
    let rows: Vec<Vec<(bool, String)>> = ROW_RE
        .captures_iter(html)
        .map(|row| {
            let body = row.get(1).map(|m| m.as_str()).unwrap_or_default();
            CELL_RE
                .captures_iter(body)
                .map(|cell| {
                    let attrs = cell.get(1).map(|m| m.as_str()).unwrap_or_default();
                    let text = cell.get(2).map(|m| clean_cell(m.as_str())).unwrap_or_default();
                    (attrs.to_ascii_lowercase().contains("rowspan"), text)
                })
                .collect()
        })
        .collect();

    let mut entries = Vec::new();
    let mut i = 0;
    while i < rows.len() {
        let row = &rows[i];
        i += 1;
        if row.len() < 6 || !row[0].0 || row[0].1.is_empty() {
            continue;
        }

        let mut entry = ListingEntry {
            name: row[0].1.clone(),
            org_type: row[1].1.clone(),
            representative: row[2].1.clone(),
            region_label: row[3].1.clone(),
            address: row[4].1.clone(),
            phone: row[5].1.clone(),
            ..Default::default()
        };

        let mut satellites = Vec::new();
        while satellites.len() < 3 && i < rows.len() && rows[i].len() == 1 {
            satellites.push(rows[i][0].1.clone());
            i += 1;
        }
        let mut satellites = satellites.into_iter();
        entry.homepage = satellites.next().unwrap_or_default();
        entry.fax = satellites.next().unwrap_or_default();
        entry.email = satellites.next().unwrap_or_default();
        entries.push(entry);
    }
    entries
}

/// 页面中是否存在指向下一页的链接
pub fn has_next_page(html: &str, page: u32) -> bool {
    let next = page.saturating_add(1);
    PAGE_LINK_RE
        .captures_iter(html)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<u32>().ok())
        .any(|p| p == next)
}

/// HTML名录适配器
///
/// 经网关逐页抓取，以区域简称为关键字搜索。每处理完一页把下一页页码写入检查点，
/// 取消或传输失败时记录当前页，自然结束时清除检查点。
pub struct HtmlScrapeAdapter {
    name: String,
    endpoint: String,
    gateway: Arc<ProxyGateway>,
    checkpoints: Arc<dyn CheckpointRepository>,
    page_delay: Duration,
}

impl HtmlScrapeAdapter {
    /// 创建适配器
    ///
    /// # 参数
    ///
    /// * `name` - 数据源ID，同时是检查点的键
    /// * `endpoint` - 地址模板，包含 `{keyword}` 和 `{page}`
    /// * `gateway` - 代理网关
    /// * `checkpoints` - 检查点仓库
    /// * `page_delay` - 页间隔
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        gateway: Arc<ProxyGateway>,
        checkpoints: Arc<dyn CheckpointRepository>,
        page_delay: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            gateway,
            checkpoints,
            page_delay,
        }
    }

    pub fn page_url(&self, region: &Region, page: u32) -> String {
        self.endpoint
            .replace("{keyword}", &urlencoding::encode(region.keyword()))
            .replace("{page}", &page.to_string())
    }

    async fn save_page(&self, region: &Region, page: u32) -> Result<(), SourceError> {
        let checkpoint = CrawlCheckpoint::new(&self.name, &region.code, page);
        self.checkpoints.save(&checkpoint).await?;
        Ok(())
    }

    /// 区域自然结束时清除检查点，清除失败时按中断返回
    async fn finish(&self, region: &Region) -> FetchEnd {
        match self.checkpoints.clear(&self.name, &region.code).await {
            Ok(()) => FetchEnd::Exhausted,
            Err(e) => {
                warn!("{}: failed to clear checkpoint for {}: {}", self.name, region.name, e);
                FetchEnd::Interrupted(format!("검사점 삭제 실패: {}", e))
            }
        }
    }

    /// 中断路径上保存检查点，失败只记录警告
    async fn save_on_interrupt(&self, region: &Region, page: u32) {
        if let Err(e) = self.save_page(region, page).await {
            warn!("{}: failed to save checkpoint for {}: {}", self.name, region.name, e);
        }
    }
}

#[async_trait]
impl SourceAdapter for HtmlScrapeAdapter {
    async fn fetch_region(
        &self,
        region: &Region,
        _filters: &FetchFilters,
        cancel: &CancellationToken,
    ) -> Result<RegionFetch, SourceError> {
        let start = self.resume_page(region).await?.unwrap_or(1).max(1);
        if start > 1 {
            info!("{}: resuming {} from page {}", self.name, region.name, start);
        }

        let mut organizations = Vec::new();
        let mut pages = Vec::new();
        let mut page = start;

        loop {
            if page > start && !pause(self.page_delay, cancel).await {
                self.save_on_interrupt(region, page).await;
                return Ok(RegionFetch::cancelled(organizations).with_pages(pages));
            }

            let url = self.page_url(region, page);
            let html = match self.gateway.fetch(&url, PayloadKind::Html, cancel).await {
                Err(_) => {
                    self.save_on_interrupt(region, page).await;
                    return Ok(RegionFetch::cancelled(organizations).with_pages(pages));
                }
                Ok(None) => {
                    self.save_on_interrupt(region, page).await;
                    let end = FetchEnd::Interrupted(format!("{}페이지 수집 실패", page));
                    return Ok(RegionFetch::new(organizations, end).with_pages(pages));
                }
                Ok(Some(html)) => html,
            };

            let entries = parse_listing(&html);
            debug!("{}: {} page {} yielded {} entries", self.name, region.name, page, entries.len());

            if entries.is_empty() {
                let end = self.finish(region).await;
                return Ok(RegionFetch::new(organizations, end).with_pages(pages));
            }

            pages.push(PageSpan {
                page,
                start: organizations.len(),
            });
            organizations.extend(
                entries
                    .into_iter()
                    .filter_map(|entry| entry.into_organization(&region.name)),
            );

            if !has_next_page(&html, page) {
                let end = self.finish(region).await;
                return Ok(RegionFetch::new(organizations, end).with_pages(pages));
            }

            // Pages already parsed are returned even when the checkpoint cannot move
            if let Err(e) = self.save_page(region, page + 1).await {
                warn!("{}: failed to save checkpoint for {}: {}", self.name, region.name, e);
                let end = FetchEnd::Interrupted(format!("검사점 저장 실패: {}", e));
                return Ok(RegionFetch::new(organizations, end).with_pages(pages));
            }
            page += 1;
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn as_resumable(&self) -> Option<&dyn Resumable> {
        Some(self)
    }
}

#[async_trait]
impl Resumable for HtmlScrapeAdapter {
    async fn resume_page(&self, region: &Region) -> Result<Option<u32>, SourceError> {
        let checkpoint = self.checkpoints.get(&self.name, &region.code).await?;
        Ok(checkpoint.map(|c| c.last_page))
    }

    async fn rewind(&self, region: &Region, page: u32) -> Result<(), SourceError> {
        self.save_page(region, page.max(1)).await
    }

    async fn reset(&self, region: &Region) -> Result<(), SourceError> {
        self.checkpoints.clear(&self.name, &region.code).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "html_scrape_test.rs"]
mod tests;
