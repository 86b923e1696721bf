// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::organization::CollectedOrganization;
use crate::domain::models::source::{ApiSchema, AuthConfig, QueryParams};
use crate::engines::gateway::ProxyGateway;
use crate::engines::validators::PayloadKind;
use crate::sources::json_records::{parse_page, passes_private_filter, to_organization};
use crate::sources::regions::{Region, SubRegion};
use crate::sources::{FetchEnd, FetchFilters, RegionFetch, SourceAdapter};
use crate::utils::errors::SourceError;
use crate::utils::pacing::pause;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

/// 单个区县的最大页数，防止接口忽略分页参数时无限循环
const MAX_PAGES: u32 = 1000;

/// 分页API适配器
///
/// 对区域下的每个区县依次请求固定大小的页，返回记录数少于页大小即结束
pub struct PagedApiAdapter {
    name: String,
    endpoint: String,
    page_size: u32,
    params: QueryParams,
    schema: ApiSchema,
    auth: AuthConfig,
    gateway: Arc<ProxyGateway>,
    page_delay: Duration,
}

impl PagedApiAdapter {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        page_size: u32,
        params: QueryParams,
        schema: ApiSchema,
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
            auth,
            gateway,
            page_delay,
        }
    }

    /// 构造某一页的请求地址
    pub fn page_url(
        &self,
        region: &Region,
        sub_region: Option<&SubRegion>,
        page: u32,
    ) -> Result<String, SourceError> {
        let mut url = Url::parse(&self.endpoint)
            .map_err(|e| SourceError::Unavailable(format!("无效的接口地址 {}: {}", self.endpoint, e)))?;

        {
            let mut query = url.query_pairs_mut();
            if let Some(key) = self.auth.api_key.as_deref() {
                if !self.auth.key_param.is_empty() {
                    query.append_pair(&self.auth.key_param, key);
                }
            }
            if let Some(param) = self.params.region.as_deref() {
                query.append_pair(param, &region.code);
            }
            if let (Some(param), Some(sub)) = (self.params.sub_region.as_deref(), sub_region) {
                query.append_pair(param, &sub.code);
            }
            query.append_pair(&self.params.page_size, &self.page_size.to_string());
            query.append_pair(&self.params.page, &page.to_string());
            for (key, value) in &self.params.extra {
                query.append_pair(key, value);
            }
        }

        Ok(url.to_string())
    }

    fn region_label(region: &Region, sub_region: Option<&SubRegion>) -> String {
        match sub_region {
            Some(sub) => format!("{} {}", region.name, sub.name),
            None => region.name.clone(),
        }
    }
}

#[async_trait]
impl SourceAdapter for PagedApiAdapter {
    async fn fetch_region(
        &self,
        region: &Region,
        filters: &FetchFilters,
        cancel: &CancellationToken,
    ) -> Result<RegionFetch, SourceError> {
        let sub_regions: Vec<Option<&SubRegion>> = if region.sub_regions.is_empty() {
            vec![None]
        } else {
            region.sub_regions.iter().map(Some).collect()
        };

        let marker = if filters.private_only {
            self.schema.private_marker.as_deref()
        } else {
            None
        };

        let mut organizations: Vec<CollectedOrganization> = Vec::new();
        let mut cut_short: Vec<String> = Vec::new();
        let mut first_request = true;

        for sub_region in sub_regions {
            let label = Self::region_label(region, sub_region);
            let mut page = 1;

            while page <= MAX_PAGES {
                if !first_request && !pause(self.page_delay, cancel).await {
                    return Ok(RegionFetch::cancelled(organizations));
                }
                first_request = false;

                let url = self.page_url(region, sub_region, page)?;
                let body = match self.gateway.fetch(&url, PayloadKind::Json, cancel).await {
                    Err(_) => return Ok(RegionFetch::cancelled(organizations)),
                    Ok(Some(body)) => body,
                    Ok(None) => {
                        warn!("{}: page {} unavailable for {}", self.name, page, label);
                        cut_short.push(label.clone());
                        break;
                    }
                };

                let parsed = match parse_page(&body, &self.schema) {
                    Ok(parsed) => parsed,
                    Err(e) => {
                        // Malformed body is treated as end of pagination
                        debug!("{}: unparseable page {} for {}: {}", self.name, page, label, e);
                        break;
                    }
                };

                let received = parsed.records.len();
                organizations.extend(
                    parsed
                        .records
                        .iter()
                        .filter_map(|record| to_organization(record, &self.schema.fields, &label))
                        .filter(|org| passes_private_filter(org, marker)),
                );

                debug!("{}: {} page {} returned {} records", self.name, label, page, received);

                if !parsed.accepted || received < self.page_size as usize {
                    break;
                }
                page += 1;
            }
        }

        if cut_short.is_empty() {
            Ok(RegionFetch::exhausted(organizations))
        } else {
            Ok(RegionFetch::new(
                organizations,
                FetchEnd::Interrupted(format!("未完成的区县: {}", cut_short.join(", "))),
            ))
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
#[path = "paged_api_test.rs"]
mod tests;
