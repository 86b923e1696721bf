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

use regcrawl::config::settings::Settings;
use regcrawl::domain::services::collection_service::{CollectionOptions, CollectionService};
use regcrawl::domain::services::email_service::{EmailExtractionService, ExtractionOptions};
use regcrawl::domain::services::reporter::Reporter;
use regcrawl::engines::gateway::ProxyGateway;
use regcrawl::infrastructure::storage::create_stores;
use regcrawl::sources::registry::SourceRegistry;
use regcrawl::sources::FetchFilters;
use regcrawl::utils::telemetry;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并按 `run.mode` 执行一次采集或邮箱抓取
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting regcrawl...");

    // 2. Load configuration
    let settings = Settings::new()?;
    settings.validate()?;

    // 3. Stores and gateway
    let stores = create_stores(&settings.storage)?;
    let gateway = Arc::new(ProxyGateway::from_settings(&settings.gateway)?);
    info!(
        engines = gateway.engine_count(),
        storage = %settings.storage.storage_type,
        "Gateway and stores initialized"
    );

    // 4. Ctrl-C stops the run at the next checkpoint
    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current step");
            shutdown.cancel();
        }
    });

    let reporter = Reporter::silent();

    match settings.run.mode.as_str() {
        "collect" => {
            let registry = Arc::new(SourceRegistry::from_settings(&settings.sources));
            let service = CollectionService::new(
                registry,
                gateway.clone(),
                stores.organizations,
                stores.contacts,
                stores.checkpoints,
            );
            let options = CollectionOptions {
                max_items: settings.collection.max_items,
                filters: FetchFilters {
                    private_only: settings.run.private_only,
                },
                regions: settings.run.regions.clone(),
                restart: settings.run.restart,
                region_delay: Duration::from_millis(settings.collection.region_delay_ms),
                page_delay: Duration::from_millis(settings.collection.page_delay_ms),
            };

            let summary = service
                .collect(&settings.run.source, &options, &reporter, &cancel)
                .await?;
            info!(
                source = %summary.source_id,
                status = ?summary.status,
                regions = summary.regions_processed,
                collected = summary.collected,
                duplicates = summary.skipped_duplicates,
                failed_regions = summary.failed_regions.len(),
                "Collection finished"
            );
        }
        "extract" => {
            let service = EmailExtractionService::new(
                gateway.clone(),
                stores.organizations,
                stores.contacts,
            );
            let options = ExtractionOptions {
                category: settings.run.category.clone(),
                target_delay: Duration::from_millis(settings.extraction.target_delay_ms),
            };

            let summary = service.extract(&options, &reporter, &cancel).await?;
            info!(
                status = ?summary.status,
                total = summary.total,
                success = summary.success,
                failed = summary.failed,
                "Email extraction finished"
            );
        }
        other => anyhow::bail!("unsupported run mode: {}", other),
    }

    for (engine, stats) in gateway.get_engine_stats() {
        info!(
            engine = %engine,
            success = stats.success_count,
            failure = stats.failure_count,
            "Engine stats"
        );
    }

    Ok(())
}
