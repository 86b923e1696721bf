// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::models::organization::CollectedOrganization;
use crate::domain::models::progress::{
    CollectionLog, CollectionProgress, LogSeverity, ProgressStatus, RunStatus,
};
use crate::domain::models::source::SourceDescriptor;
use crate::domain::repositories::checkpoint_repository::CheckpointRepository;
use crate::domain::repositories::contact_repository::ContactRepository;
use crate::domain::repositories::organization_repository::OrganizationRepository;
use crate::domain::services::dedup_service::DedupIndex;
use crate::domain::services::persistence_service::PersistenceSink;
use crate::domain::services::reporter::Reporter;
use crate::engines::gateway::ProxyGateway;
use crate::sources::regions::Region;
use crate::sources::registry::SourceRegistry;
use crate::sources::{FetchEnd, FetchFilters, RegionFetch, SourceAdapter};
use crate::utils::errors::CollectionError;
use crate::utils::pacing::pause;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// 采集选项
#[derive(Debug, Clone)]
pub struct CollectionOptions {
    /// 本次运行最多新增的机构数
    pub max_items: Option<usize>,
    pub filters: FetchFilters,
    /// 仅采集这些区域代码，为空表示全部
    pub regions: Vec<String>,
    /// 运行前清除可续传数据源的检查点
    pub restart: bool,
    pub region_delay: Duration,
    pub page_delay: Duration,
}

impl Default for CollectionOptions {
    fn default() -> Self {
        Self {
            max_items: None,
            filters: FetchFilters::default(),
            regions: Vec::new(),
            restart: false,
            region_delay: Duration::from_millis(1000),
            page_delay: Duration::from_millis(300),
        }
    }
}

/// 采集运行摘要
///
/// 无论正常结束还是被取消都会返回
#[derive(Debug, Clone, Serialize)]
pub struct CollectionSummary {
    pub source_id: String,
    pub status: RunStatus,
    pub regions_total: usize,
    pub regions_processed: usize,
    /// 抓取或保存失败的区域名称
    pub failed_regions: Vec<String>,
    /// 去重后新增的机构数
    pub collected: usize,
    /// 实际写入机构表的行数
    pub persisted: usize,
    pub skipped_duplicates: usize,
    /// 本次新增的机构，按采集顺序
    pub organizations: Vec<CollectedOrganization>,
    pub logs: Vec<CollectionLog>,
}

/// 区域处理结果
struct RegionOutcome {
    fresh: Vec<CollectedOrganization>,
    persisted: usize,
    duplicates: usize,
    failed: bool,
    cancelled: bool,
}

/// 采集编排服务
///
/// 按区域表顺序逐个调用适配器，过滤重复后分批写入机构表。
/// 状态流转：`idle → collecting → {saving → collecting}* → done | aborted`。
pub struct CollectionService {
    registry: Arc<SourceRegistry>,
    gateway: Arc<ProxyGateway>,
    organizations: Arc<dyn OrganizationRepository>,
    sink: PersistenceSink,
    checkpoints: Arc<dyn CheckpointRepository>,
}

impl CollectionService {
    /// 创建新的采集服务
    ///
    /// # 参数
    ///
    /// * `registry` - 数据源注册表
    /// * `gateway` - 代理网关
    /// * `organizations` - 机构表仓库
    /// * `contacts` - 联系人表仓库
    /// * `checkpoints` - 检查点仓库
    pub fn new(
        registry: Arc<SourceRegistry>,
        gateway: Arc<ProxyGateway>,
        organizations: Arc<dyn OrganizationRepository>,
        contacts: Arc<dyn ContactRepository>,
        checkpoints: Arc<dyn CheckpointRepository>,
    ) -> Self {
        Self {
            registry,
            gateway,
            sink: PersistenceSink::new(organizations.clone(), contacts),
            organizations,
            checkpoints,
        }
    }

    /// 采集一个数据源
    ///
    /// # 参数
    ///
    /// * `source_id` - 数据源ID
    /// * `options` - 采集选项
    /// * `reporter` - 进度报告器
    /// * `cancel` - 取消令牌
    ///
    /// # 返回值
    ///
    /// * `Ok(CollectionSummary)` - 运行摘要（包括被取消的运行）
    /// * `Err(CollectionError)` - 配置错误或去重索引加载失败，发生在任何网络访问之前
    pub async fn collect(
        &self,
        source_id: &str,
        options: &CollectionOptions,
        reporter: &Reporter,
        cancel: &CancellationToken,
    ) -> Result<CollectionSummary, CollectionError> {
        let descriptor = self.registry.descriptor(source_id)?;
        SourceRegistry::validate(descriptor)?;

        let adapter = SourceRegistry::adapter_for(
            descriptor,
            self.gateway.clone(),
            self.checkpoints.clone(),
            options.page_delay,
        );
        self.run(descriptor, adapter.as_ref(), options, reporter, cancel)
            .await
    }

    /// 用给定的适配器执行采集
    pub async fn run(
        &self,
        descriptor: &SourceDescriptor,
        adapter: &dyn SourceAdapter,
        options: &CollectionOptions,
        reporter: &Reporter,
        cancel: &CancellationToken,
    ) -> Result<CollectionSummary, CollectionError> {
        let mark = reporter.log_count();
        let regions = select_regions(descriptor, &options.regions)?;
        let mut index = DedupIndex::load(self.organizations.as_ref()).await?;
        debug!("Dedup index seeded with {} names", index.len());

        let mut summary = CollectionSummary {
            source_id: descriptor.id.clone(),
            status: RunStatus::Done,
            regions_total: regions.len(),
            regions_processed: 0,
            failed_regions: Vec::new(),
            collected: 0,
            persisted: 0,
            skipped_duplicates: 0,
            organizations: Vec::new(),
            logs: Vec::new(),
        };

        if options.restart {
            self.reset_checkpoints(adapter, &regions, reporter).await;
        }

        reporter.info(format!(
            "{} 수집 시작: {}개 지역 ({})",
            descriptor.display_name,
            regions.len(),
            adapter.name()
        ));

        for (position, region) in regions.iter().enumerate() {
            if cancel.is_cancelled() {
                summary.status = RunStatus::Aborted;
                break;
            }
            let budget = remaining_budget(options.max_items, summary.collected);
            if budget == Some(0) {
                break;
            }

            reporter.progress(CollectionProgress::new(
                ProgressStatus::Collecting,
                &region.name,
                summary.collected,
                summary.regions_total,
                format!("{} 수집 중 ({}/{})", region.name, position + 1, regions.len()),
            ));

            let outcome = self
                .process_region(descriptor, adapter, region, options, budget, &mut index, reporter, cancel)
                .await;

            summary.regions_processed += 1;
            summary.collected += outcome.fresh.len();
            summary.persisted += outcome.persisted;
            summary.skipped_duplicates += outcome.duplicates;
            summary.organizations.extend(outcome.fresh);
            if outcome.failed {
                summary.failed_regions.push(region.name.clone());
            }
            if outcome.cancelled {
                summary.status = RunStatus::Aborted;
                break;
            }

            if remaining_budget(options.max_items, summary.collected) == Some(0) {
                info!("Reached max_items after {}", region.name);
                break;
            }

            let is_last = position + 1 == regions.len();
            if !is_last && !pause(options.region_delay, cancel).await {
                summary.status = RunStatus::Aborted;
                break;
            }
        }

        let (severity, verdict) = match summary.status {
            RunStatus::Done => (LogSeverity::Success, "수집 완료"),
            RunStatus::Aborted => (LogSeverity::Warning, "수집 중단"),
        };
        reporter.log(CollectionLog::new(
            severity,
            format!(
                "{}: {}개 지역 처리, {}건 신규, 중복 {}건",
                verdict, summary.regions_processed, summary.collected, summary.skipped_duplicates
            ),
        ));
        reporter.progress(CollectionProgress::new(
            ProgressStatus::Done,
            "",
            summary.collected,
            summary.regions_total,
            verdict,
        ));

        summary.logs = reporter.logs_since(mark);
        Ok(summary)
    }

    #[allow(clippy::too_many_arguments)]
    async fn process_region(
        &self,
        descriptor: &SourceDescriptor,
        adapter: &dyn SourceAdapter,
        region: &Region,
        options: &CollectionOptions,
        budget: Option<usize>,
        index: &mut DedupIndex,
        reporter: &Reporter,
        cancel: &CancellationToken,
    ) -> RegionOutcome {
        let mut outcome = RegionOutcome {
            fresh: Vec::new(),
            persisted: 0,
            duplicates: 0,
            failed: false,
            cancelled: false,
        };

        if let Some(resumable) = adapter.as_resumable() {
            if let Ok(Some(page)) = resumable.resume_page(region).await {
                info!("{}: resuming {} at page {}", adapter.name(), region.name, page);
            }
        }

        let mut fetch = match adapter.fetch_region(region, &options.filters, cancel).await {
            Ok(fetch) => fetch,
            Err(e) => {
                outcome.failed = true;
                reporter.log(
                    CollectionLog::new(LogSeverity::Error, format!("{} 수집 실패: {}", region.name, e))
                        .with_details(&region.code),
                );
                return outcome;
            }
        };

        let received = fetch.organizations.len();
        let mut consumed = received;
        let mut batch = index.batch();
        for (position, org) in std::mem::take(&mut fetch.organizations).into_iter().enumerate() {
            if budget.is_some_and(|b| outcome.fresh.len() >= b) {
                consumed = position;
                break;
            }
            if !org.has_name() {
                continue;
            }
            if batch.accept(&org) {
                outcome.fresh.push(org);
            } else {
                outcome.duplicates += 1;
            }
        }
        let keys = batch.into_keys();
        outcome.cancelled = fetch.is_cancelled();

        if !outcome.fresh.is_empty() {
            reporter.progress(CollectionProgress::new(
                ProgressStatus::Saving,
                &region.name,
                outcome.fresh.len(),
                received,
                format!("{} {}건 저장 중", region.name, outcome.fresh.len()),
            ));
            match self.sink.append(&outcome.fresh, &descriptor.category).await {
                Ok(written) => {
                    outcome.persisted = written;
                    index.commit(keys);
                }
                Err(e) => {
                    outcome.failed = true;
                    outcome.fresh.clear();
                    self.rewind(adapter, region, &fetch, 0).await;
                    reporter.log(
                        CollectionLog::new(
                            LogSeverity::Error,
                            format!("{} 저장 실패: {}", region.name, e),
                        )
                        .with_details(&region.code),
                    );
                    return outcome;
                }
            }
        }

        if consumed < received {
            self.rewind(adapter, region, &fetch, consumed).await;
        }

        let line = match &fetch.end {
            FetchEnd::Exhausted => CollectionLog::new(
                LogSeverity::Success,
                format!(
                    "{}: {}건 수신, {}건 저장, 중복 {}건",
                    region.name, received, outcome.persisted, outcome.duplicates
                ),
            ),
            FetchEnd::Interrupted(reason) => CollectionLog::new(
                LogSeverity::Warning,
                format!(
                    "{}: 일부만 수집됨 ({}), {}건 저장",
                    region.name, reason, outcome.persisted
                ),
            ),
            FetchEnd::Cancelled => CollectionLog::new(
                LogSeverity::Warning,
                format!("{}: 중단됨, {}건 저장", region.name, outcome.persisted),
            ),
        };
        reporter.log(line.with_details(&region.code));
        outcome
    }

    /// 把可续传适配器的检查点退回第 `index` 条记录所在的页
    async fn rewind(
        &self,
        adapter: &dyn SourceAdapter,
        region: &Region,
        fetch: &RegionFetch,
        index: usize,
    ) {
        let (Some(resumable), Some(page)) = (adapter.as_resumable(), fetch.page_of(index)) else {
            return;
        };
        match resumable.rewind(region, page).await {
            Ok(()) => info!(
                "{}: checkpoint for {} moved back to page {}",
                adapter.name(),
                region.name,
                page
            ),
            Err(e) => warn!("Failed to rewind checkpoint for {}: {}", region.name, e),
        }
    }

    async fn reset_checkpoints(
        &self,
        adapter: &dyn SourceAdapter,
        regions: &[&Region],
        reporter: &Reporter,
    ) {
        let Some(resumable) = adapter.as_resumable() else {
            return;
        };
        for region in regions {
            if let Err(e) = resumable.reset(region).await {
                warn!("Failed to reset checkpoint for {}: {}", region.name, e);
            }
        }
        reporter.info(format!("{}개 지역의 검사점을 초기화했습니다", regions.len()));
    }
}

fn remaining_budget(max_items: Option<usize>, collected: usize) -> Option<usize> {
    max_items.map(|max| max.saturating_sub(collected))
}

/// 按区域表顺序选出要采集的区域
fn select_regions<'a>(
    descriptor: &'a SourceDescriptor,
    codes: &[String],
) -> Result<Vec<&'a Region>, CollectionError> {
    if codes.is_empty() {
        return Ok(descriptor.regions.regions().iter().collect());
    }

    if let Some(unknown) = codes.iter().find(|c| descriptor.regions.find(c).is_none()) {
        return Err(CollectionError::Configuration(format!(
            "数据源 {} 没有区域代码 {}",
            descriptor.display_name, unknown
        )));
    }

    Ok(descriptor
        .regions
        .regions()
        .iter()
        .filter(|r| codes.iter().any(|c| c == &r.code))
        .collect())
}

#[cfg(test)]
#[path = "collection_service_test.rs"]
mod tests;
