// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::SourcesSettings;
use crate::domain::models::source::{
    AdapterKind, ApiSchema, AuthConfig, FieldMap, QueryParams, SourceDescriptor,
};
use crate::domain::repositories::checkpoint_repository::CheckpointRepository;
use crate::engines::gateway::ProxyGateway;
use crate::sources::bulk_filter::BulkFilterAdapter;
use crate::sources::html_scrape::HtmlScrapeAdapter;
use crate::sources::paged_api::PagedApiAdapter;
use crate::sources::regions::RegionTable;
use crate::sources::SourceAdapter;
use crate::utils::errors::CollectionError;
use std::sync::Arc;
use std::time::Duration;

/// 数据源注册表
///
/// 启动时根据配置构建一次，按ID查找描述并创建适配器
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    descriptors: Vec<SourceDescriptor>,
}

impl SourceRegistry {
    pub fn new(descriptors: Vec<SourceDescriptor>) -> Self {
        Self { descriptors }
    }

    /// 内置数据源：幼儿园（分页API）、学院（全量过滤）、教会（HTML名录）
    pub fn from_settings(sources: &SourcesSettings) -> Self {
        Self::new(vec![
            kindergarten(sources),
            academy(sources),
            church(sources),
        ])
    }

    /// 已注册的数据源ID
    pub fn ids(&self) -> Vec<&str> {
        self.descriptors.iter().map(|d| d.id.as_str()).collect()
    }

    /// 按ID查找数据源描述
    pub fn descriptor(&self, id: &str) -> Result<&SourceDescriptor, CollectionError> {
        self.descriptors
            .iter()
            .find(|d| d.id == id)
            .ok_or_else(|| CollectionError::UnknownSource(id.to_string()))
    }

    /// 检查数据源配置，必须在任何网络访问之前调用
    pub fn validate(descriptor: &SourceDescriptor) -> Result<(), CollectionError> {
        if !descriptor.auth.is_satisfied() {
            return Err(CollectionError::Configuration(format!(
                "数据源 {} 缺少API密钥 (sources.{}.api_key)",
                descriptor.display_name, descriptor.id
            )));
        }
        if descriptor.regions.is_empty() {
            return Err(CollectionError::Configuration(format!(
                "数据源 {} 没有可采集的区域",
                descriptor.display_name
            )));
        }
        if let AdapterKind::HtmlScrape { endpoint } = &descriptor.kind {
            if !endpoint.contains("{page}") {
                return Err(CollectionError::Configuration(format!(
                    "数据源 {} 的地址模板缺少 {{page}} 占位符",
                    descriptor.display_name
                )));
            }
        }
        Ok(())
    }

    /// 为数据源创建适配器
    ///
    /// # 参数
    ///
    /// * `descriptor` - 数据源描述
    /// * `gateway` - 代理网关
    /// * `checkpoints` - 检查点仓库，仅HTML名录使用
    /// * `page_delay` - 分页间隔
    pub fn adapter_for(
        descriptor: &SourceDescriptor,
        gateway: Arc<ProxyGateway>,
        checkpoints: Arc<dyn CheckpointRepository>,
        page_delay: Duration,
    ) -> Box<dyn SourceAdapter> {
        match &descriptor.kind {
            AdapterKind::PagedApi {
                endpoint,
                page_size,
                params,
                schema,
            } => Box::new(PagedApiAdapter::new(
                descriptor.id.clone(),
                endpoint.clone(),
                *page_size,
                params.clone(),
                schema.clone(),
                descriptor.auth.clone(),
                gateway,
                page_delay,
            )),
            AdapterKind::BulkFilter {
                endpoint,
                page_size,
                params,
                schema,
                region_field,
            } => Box::new(BulkFilterAdapter::new(
                descriptor.id.clone(),
                endpoint.clone(),
                *page_size,
                params.clone(),
                schema.clone(),
                region_field.clone(),
                descriptor.auth.clone(),
                gateway,
                page_delay,
            )),
            AdapterKind::HtmlScrape { endpoint } => Box::new(HtmlScrapeAdapter::new(
                descriptor.id.clone(),
                endpoint.clone(),
                gateway,
                checkpoints,
                page_delay,
            )),
        }
    }
}

fn kindergarten(sources: &SourcesSettings) -> SourceDescriptor {
    let settings = &sources.kindergarten;
    SourceDescriptor {
        id: "kindergarten".to_string(),
        display_name: "유치원".to_string(),
        category: "kindergarten".to_string(),
        kind: AdapterKind::PagedApi {
            endpoint: settings.endpoint.clone(),
            page_size: settings.page_size,
            params: QueryParams {
                page: "currentPage".to_string(),
                page_size: "pageCnt".to_string(),
                region: Some("sidoCode".to_string()),
                sub_region: Some("sggCode".to_string()),
                extra: Vec::new(),
            },
            schema: ApiSchema {
                records_pointer: "/kinderInfo".to_string(),
                status_pointer: Some("/status".to_string()),
                success_values: vec!["SUCCESS".to_string()],
                fields: FieldMap {
                    name: "kindername".to_string(),
                    org_type: "establish".to_string(),
                    address: "addr".to_string(),
                    phone: "telno".to_string(),
                    homepage: "hpaddr".to_string(),
                    representative: "rppnname".to_string(),
                    email: None,
                },
                private_marker: Some("사립".to_string()),
            },
        },
        auth: AuthConfig::api_key("key", settings.api_key.clone()),
        regions: RegionTable::korea_districts(),
    }
}

fn academy(sources: &SourcesSettings) -> SourceDescriptor {
    let settings = &sources.academy;
    SourceDescriptor {
        id: "academy".to_string(),
        display_name: "학원".to_string(),
        category: "academy".to_string(),
        kind: AdapterKind::BulkFilter {
            endpoint: settings.endpoint.clone(),
            page_size: settings.page_size,
            params: QueryParams {
                page: "pageNo".to_string(),
                page_size: "numOfRows".to_string(),
                region: None,
                sub_region: None,
                extra: vec![("type".to_string(), "json".to_string())],
            },
            schema: ApiSchema {
                records_pointer: "/response/body/items".to_string(),
                status_pointer: Some("/response/header/resultCode".to_string()),
                success_values: vec!["00".to_string()],
                fields: FieldMap {
                    name: "acdmyNm".to_string(),
                    org_type: "realmScNm".to_string(),
                    address: "rdnmadr".to_string(),
                    phone: "phoneNumber".to_string(),
                    homepage: "homepageUrl".to_string(),
                    representative: "rprsntvNm".to_string(),
                    email: None,
                },
                private_marker: None,
            },
            region_field: "rdnmadr".to_string(),
        },
        auth: AuthConfig::api_key("serviceKey", settings.api_key.clone()),
        regions: RegionTable::korea_provinces(),
    }
}

fn church(sources: &SourcesSettings) -> SourceDescriptor {
    SourceDescriptor {
        id: "church".to_string(),
        display_name: "교회".to_string(),
        category: "church".to_string(),
        kind: AdapterKind::HtmlScrape {
            endpoint: sources.church.endpoint.clone(),
        },
        auth: AuthConfig::none(),
        regions: RegionTable::korea_provinces(),
    }
}
