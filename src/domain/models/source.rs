// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::sources::regions::RegionTable;
use serde::{Deserialize, Serialize};
use std::fmt;

/// JSON字段映射
///
/// 每个字段是上游记录中对应的键名，缺失的键视为空字符串
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMap {
    pub name: String,
    pub org_type: String,
    pub address: String,
    pub phone: String,
    pub homepage: String,
    pub representative: String,
    /// 部分数据源直接提供邮箱
    #[serde(default)]
    pub email: Option<String>,
}

/// JSON接口的响应结构描述
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSchema {
    /// 记录数组的JSON指针 (RFC 6901)，如 `/kinderInfo`
    pub records_pointer: String,
    /// 状态字段的JSON指针，不设置则不检查状态
    #[serde(default)]
    pub status_pointer: Option<String>,
    /// 视为成功的状态值
    #[serde(default)]
    pub success_values: Vec<String>,
    pub fields: FieldMap,
    /// “仅私立”过滤时，类型字段必须包含的标记
    #[serde(default)]
    pub private_marker: Option<String>,
}

/// 请求参数命名
///
/// 不同接口对页码、页大小和区域参数的命名各不相同
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParams {
    /// 页码参数名（从1开始）
    pub page: String,
    /// 页大小参数名
    pub page_size: String,
    /// 一级区域代码参数名
    #[serde(default)]
    pub region: Option<String>,
    /// 二级区域代码参数名
    #[serde(default)]
    pub sub_region: Option<String>,
    /// 固定附加参数，如 `type=json`
    #[serde(default)]
    pub extra: Vec<(String, String)>,
}

/// 适配器类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterKind {
    /// 按区县分页的JSON接口
    PagedApi {
        endpoint: String,
        page_size: u32,
        params: QueryParams,
        schema: ApiSchema,
    },
    /// 无区域参数的全量接口，抓取后按自由文本字段过滤
    BulkFilter {
        endpoint: String,
        page_size: u32,
        params: QueryParams,
        schema: ApiSchema,
        /// 用于区域匹配的记录字段（通常是地址）
        region_field: String,
    },
    /// 分页HTML名录，`endpoint` 包含 `{keyword}` 和 `{page}` 占位符
    HtmlScrape { endpoint: String },
}

impl AdapterKind {
    pub fn label(&self) -> &'static str {
        match self {
            AdapterKind::PagedApi { .. } => "paged_api",
            AdapterKind::BulkFilter { .. } => "bulk_filter",
            AdapterKind::HtmlScrape { .. } => "html_scrape",
        }
    }
}

/// 认证配置
#[derive(Clone, PartialEq, Eq, Default)]
pub struct AuthConfig {
    /// API密钥的查询参数名
    pub key_param: String,
    pub api_key: Option<String>,
    /// 是否必须提供密钥
    pub required: bool,
}

impl AuthConfig {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn api_key(key_param: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            key_param: key_param.into(),
            api_key,
            required: true,
        }
    }

    /// 必需的密钥是否已配置
    pub fn is_satisfied(&self) -> bool {
        !self.required || self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

// Keep secrets out of logs
impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("key_param", &self.key_param)
            .field("api_key", &self.api_key.as_ref().map(|_| "[SET]"))
            .field("required", &self.required)
            .finish()
    }
}

/// 数据源描述
///
/// 启动时构建一次，运行期间不可变
#[derive(Debug, Clone)]
pub struct SourceDescriptor {
    pub id: String,
    pub display_name: String,
    /// 入库时写入的类别
    pub category: String,
    pub kind: AdapterKind,
    pub auth: AuthConfig,
    pub regions: RegionTable,
}
