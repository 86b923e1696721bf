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

use crate::domain::models::organization::{ContactRow, CrawlTarget, EmailStatus};
use crate::domain::models::progress::{
    CollectionLog, CollectionProgress, LogSeverity, ProgressStatus, RunStatus,
};
use crate::domain::repositories::contact_repository::ContactRepository;
use crate::domain::repositories::organization_repository::OrganizationRepository;
use crate::domain::services::email_extractor::extract_emails;
use crate::domain::services::persistence_service::PersistenceSink;
use crate::domain::services::reporter::Reporter;
use crate::engines::gateway::{Cancelled, ProxyGateway};
use crate::engines::validators::PayloadKind;
use crate::utils::errors::{CollectionError, RepositoryError};
use crate::utils::pacing::pause;
use crate::utils::url_utils::normalize_homepage;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// 邮箱抓取选项
#[derive(Debug, Clone)]
pub struct ExtractionOptions {
    /// 仅处理该类别的目标
    pub category: Option<String>,
    /// 目标间隔
    pub target_delay: Duration,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            category: None,
            target_delay: Duration::from_millis(500),
        }
    }
}

/// 邮箱抓取摘要
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionSummary {
    pub status: RunStatus,
    /// 目标总数
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    /// 本次写入联系人表的记录
    pub emails: Vec<ContactRow>,
}

/// 单个目标的抓取结果
enum TargetResult {
    Found(String),
    NotFound,
    Unreachable,
    InvalidUrl,
}

/// 邮箱抓取服务
///
/// 逐个访问机构表中待抓取（状态 `N` 且有主页）的主页，
/// 提取到邮箱则写入联系人表并标记 `Y`，否则标记 `F`
pub struct EmailExtractionService {
    gateway: Arc<ProxyGateway>,
    organizations: Arc<dyn OrganizationRepository>,
    sink: PersistenceSink,
}

impl EmailExtractionService {
    pub fn new(
        gateway: Arc<ProxyGateway>,
        organizations: Arc<dyn OrganizationRepository>,
        contacts: Arc<dyn ContactRepository>,
    ) -> Self {
        Self {
            gateway,
            sink: PersistenceSink::new(organizations.clone(), contacts),
            organizations,
        }
    }

    /// 执行邮箱抓取
    ///
    /// # 参数
    ///
    /// * `options` - 抓取选项
    /// * `reporter` - 进度报告器
    /// * `cancel` - 取消令牌
    ///
    /// # 返回值
    ///
    /// * `Ok(ExtractionSummary)` - 运行摘要（包括被取消的运行）
    /// * `Err(CollectionError)` - 读取目标列表失败
    pub async fn extract(
        &self,
        options: &ExtractionOptions,
        reporter: &Reporter,
        cancel: &CancellationToken,
    ) -> Result<ExtractionSummary, CollectionError> {
        let targets = self
            .organizations
            .pending_targets(options.category.as_deref())
            .await?;

        let mut summary = ExtractionSummary {
            status: RunStatus::Done,
            total: targets.len(),
            success: 0,
            failed: 0,
            emails: Vec::new(),
        };

        reporter.info(format!("이메일 수집 시작: {}개 대상", targets.len()));
        reporter.progress(CollectionProgress::new(
            ProgressStatus::Collecting,
            "",
            0,
            summary.total,
            "이메일 수집 시작",
        ));

        for (position, target) in targets.iter().enumerate() {
            if cancel.is_cancelled() {
                summary.status = RunStatus::Aborted;
                break;
            }

            reporter.progress(CollectionProgress::new(
                ProgressStatus::Collecting,
                &target.name,
                summary.success,
                summary.total,
                format!("{} ({}/{})", target.name, position + 1, summary.total),
            ));

            let result = match self.resolve(target, cancel).await {
                Ok(result) => result,
                Err(Cancelled) => {
                    summary.status = RunStatus::Aborted;
                    break;
                }
            };

            match result {
                TargetResult::Found(email) => match self.record_hit(target, &email).await {
                    Ok(contact) => {
                        summary.success += 1;
                        summary.emails.push(contact);
                        reporter.log(
                            CollectionLog::new(
                                LogSeverity::Success,
                                format!("{}: {}", target.name, email),
                            )
                            .with_details(&target.homepage),
                        );
                    }
                    Err(e) => {
                        self.mark_failed(target).await;
                        summary.failed += 1;
                        reporter.log(
                            CollectionLog::new(
                                LogSeverity::Error,
                                format!("{}: 저장 실패 ({})", target.name, e),
                            )
                            .with_details(&target.homepage),
                        );
                    }
                },
                miss => {
                    self.mark_failed(target).await;
                    summary.failed += 1;
                    let reason = match miss {
                        TargetResult::Unreachable => "접속 실패",
                        TargetResult::InvalidUrl => "잘못된 주소",
                        _ => "이메일 없음",
                    };
                    reporter.log(
                        CollectionLog::new(
                            LogSeverity::Warning,
                            format!("{}: {}", target.name, reason),
                        )
                        .with_details(&target.homepage),
                    );
                }
            }

            let is_last = position + 1 == targets.len();
            if !is_last && !pause(options.target_delay, cancel).await {
                summary.status = RunStatus::Aborted;
                break;
            }
        }

        let verdict = match summary.status {
            RunStatus::Done => "이메일 수집 완료",
            RunStatus::Aborted => "이메일 수집 중단",
        };
        reporter.info(format!(
            "{}: 성공 {}건, 실패 {}건 / 전체 {}건",
            verdict, summary.success, summary.failed, summary.total
        ));
        reporter.progress(CollectionProgress::new(
            ProgressStatus::Done,
            "",
            summary.success,
            summary.total,
            verdict,
        ));

        Ok(summary)
    }

    async fn resolve(
        &self,
        target: &CrawlTarget,
        cancel: &CancellationToken,
    ) -> Result<TargetResult, Cancelled> {
        let Some(url) = normalize_homepage(&target.homepage) else {
            return Ok(TargetResult::InvalidUrl);
        };

        let Some(html) = self.gateway.fetch(&url, PayloadKind::Html, cancel).await? else {
            return Ok(TargetResult::Unreachable);
        };

        let emails = extract_emails(&html);
        debug!("{}: found {} candidate emails", url, emails.len());
        Ok(emails
            .into_iter()
            .next()
            .map(TargetResult::Found)
            .unwrap_or(TargetResult::NotFound))
    }

    async fn record_hit(
        &self,
        target: &CrawlTarget,
        email: &str,
    ) -> Result<ContactRow, RepositoryError> {
        let contact = ContactRow {
            name: target.name.clone(),
            email: email.to_string(),
            category: target.category.clone(),
        };
        self.sink.append_contact(contact.clone()).await?;
        self.organizations
            .update_email_status(target.row_index, EmailStatus::Resolved)
            .await?;
        Ok(contact)
    }

    async fn mark_failed(&self, target: &CrawlTarget) {
        if let Err(e) = self
            .organizations
            .update_email_status(target.row_index, EmailStatus::Failed)
            .await
        {
            warn!("Failed to mark row {} as failed: {}", target.row_index, e);
        }
    }
}
