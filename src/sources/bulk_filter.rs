// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::source::{ApiSchema, AuthConfig, QueryParams};
use crate::engines::gateway::ProxyGateway;
use crate::engines::validators::PayloadKind;
use crate::sources::json_records::{
    parse_page, passes_private_filter, to_organization, value_to_string,
};
use crate::sources::regions::Region;
use crate::sources::{FetchFilters, RegionFetch, SourceAdapter};
use crate::utils::errors::SourceError;
use crate::utils::pacing::pause;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

/// 全量数据集的最大页数
const MAX_PAGES: u32 = 10_000;

/// 全量数据集的下载结果
enum Download {
    Complete(Vec<Value>),
    Cancelled,
}

/// 全量过滤适配器
///
/// 接口不支持区域参数：首次调用时分页下载全部记录并缓存在实例中，
/// 之后每个区域只在缓存上按自由文本字段过滤
pub struct BulkFilterAdapter {
    name: String,
    endpoint: String,
    page_size: u32,
    params: QueryParams,
    schema: ApiSchema,
    region_field: String,
    auth: AuthConfig,
    gateway: Arc<ProxyGateway>,
    page_delay: Duration,
    dataset: Mutex<Option<Arc<Vec<Value>>>>,
}

impl BulkFilterAdapter {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        page_size: u32,
        params: QueryParams,
        schema: ApiSchema,
        region_field: impl Into<String>,
        auth: AuthConfig,
        gateway: Arc<ProxyGateway>,
        page_delay: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            page_size: page_size.max(1),
            params,
            schema,
            region_field: region_field.into(),
            auth,
            gateway,
            page_delay,
            dataset: Mutex::new(None),
        }
    }

    fn page_url(&self, page: u32) -> Result<String, SourceError> {
        let mut url = Url::parse(&self.endpoint)
            .map_err(|e| SourceError::Unavailable(format!("无效的接口地址 {}: {}", self.endpoint, e)))?;

        {
            let mut query = url.query_pairs_mut();
            if let Some(key) = self.auth.api_key.as_deref() {
                if !self.auth.key_param.is_empty() {
                    query.append_pair(&self.auth.key_param, key);
                }
            }
            query.append_pair(&self.params.page, &page.to_string());
            query.append_pair(&self.params.page_size, &self.page_size.to_string());
            for (key, value) in &self.params.extra {
                query.append_pair(key, value);
            }
        }

        Ok(url.to_string())
    }

    async fn download(&self, cancel: &CancellationToken) -> Result<Download, SourceError> {
        let mut records = Vec::new();

        for page in 1..=MAX_PAGES {
            if page > 1 && !pause(self.page_delay, cancel).await {
                return Ok(Download::Cancelled);
            }

            let url = self.page_url(page)?;
            let body = match self.gateway.fetch(&url, PayloadKind::Json, cancel).await {
                Err(_) => return Ok(Download::Cancelled),
                Ok(Some(body)) => body,
                Ok(None) => {
                    return Err(SourceError::Unavailable(format!(
                        "{} 第{}页无法获取",
                        self.name, page
                    )))
                }
            };

            let parsed = match parse_page(&body, &self.schema) {
                Ok(parsed) => parsed,
                Err(e) => {
                    debug!("{}: unparseable page {}: {}", self.name, page, e);
                    break;
                }
            };

            let received = parsed.records.len();
            records.extend(parsed.records);
            debug!("{}: page {} returned {} records", self.name, page, received);

            if !parsed.accepted || received < self.page_size as usize {
                break;
            }
        }

        Ok(Download::Complete(records))
    }

    /// 获取缓存的数据集，首次调用时下载
    ///
    /// 下载失败或被取消时不缓存，下一个区域会重新尝试
    async fn dataset(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Option<Arc<Vec<Value>>>, SourceError> {
        let mut cached = self.dataset.lock().await;
        if let Some(dataset) = cached.as_ref() {
            return Ok(Some(Arc::clone(dataset)));
        }

        match self.download(cancel).await? {
            Download::Cancelled => Ok(None),
            Download::Complete(records) => {
                info!("{}: downloaded {} records", self.name, records.len());
                let dataset = Arc::new(records);
                *cached = Some(Arc::clone(&dataset));
                Ok(Some(dataset))
            }
        }
    }
}

#[async_trait]
impl SourceAdapter for BulkFilterAdapter {
    async fn fetch_region(
        &self,
        region: &Region,
        filters: &FetchFilters,
        cancel: &CancellationToken,
    ) -> Result<RegionFetch, SourceError> {
        let Some(dataset) = self.dataset(cancel).await? else {
            return Ok(RegionFetch::cancelled(Vec::new()));
        };

        let marker = if filters.private_only {
            self.schema.private_marker.as_deref()
        } else {
            None
        };

        let organizations = dataset
            .iter()
            .filter(|record| {
                record
                    .get(&self.region_field)
                    .map(value_to_string)
                    .is_some_and(|text| region.matches_text(&text))
            })
            .filter_map(|record| to_organization(record, &self.schema.fields, &region.name))
            .filter(|org| passes_private_filter(org, marker))
            .collect();

        Ok(RegionFetch::exhausted(organizations))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
