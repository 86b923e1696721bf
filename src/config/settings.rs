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

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// 应用程序配置设置
///
/// 包含存储、代理网关、采集节奏、邮箱抓取、数据源凭据和运行参数
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 存储配置
    pub storage: StorageSettings,
    /// 代理网关配置
    pub gateway: GatewaySettings,
    /// 采集阶段配置
    pub collection: CollectionSettings,
    /// 邮箱抓取阶段配置
    pub extraction: ExtractionSettings,
    /// 数据源配置
    pub sources: SourcesSettings,
    /// 本次运行参数
    pub run: RunSettings,
}

/// 存储配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// 存储类型 (local, memory)
    pub storage_type: String,
    /// 本地存储目录 (当 type=local 时使用)
    pub local_path: Option<String>,
}

/// 代理网关配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct GatewaySettings {
    /// 单次尝试超时（秒）
    pub timeout_secs: u64,
    /// HTML内容最小长度，短于此视为中继错误页
    pub min_html_length: usize,
    /// 是否先尝试直连
    pub direct_first: bool,
    /// 中继模板列表，`{url}` 为URL编码后的目标地址
    pub relays: Vec<String>,
}

/// 采集阶段配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionSettings {
    /// 区域间隔（毫秒）
    pub region_delay_ms: u64,
    /// 分页间隔（毫秒）
    pub page_delay_ms: u64,
    /// 单次运行最多新增的机构数
    pub max_items: Option<usize>,
}

/// 邮箱抓取阶段配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionSettings {
    /// 目标间隔（毫秒）
    pub target_delay_ms: u64,
}

/// 数据源配置
#[derive(Debug, Clone, Deserialize)]
pub struct SourcesSettings {
    /// 幼儿园信息公开接口（按区县分页）
    pub kindergarten: ApiSourceSettings,
    /// 全国学院标准数据接口（全量抓取后按地址过滤）
    pub academy: ApiSourceSettings,
    /// 教团教会名录（HTML分页）
    pub church: ScrapeSourceSettings,
}

/// JSON接口数据源配置
#[derive(Debug, Clone, Deserialize)]
pub struct ApiSourceSettings {
    /// 接口地址
    pub endpoint: String,
    /// API密钥
    pub api_key: Option<String>,
    /// 每页记录数
    pub page_size: u32,
}

/// HTML名录数据源配置
#[derive(Debug, Clone, Deserialize)]
pub struct ScrapeSourceSettings {
    /// 名录地址模板，包含 `{keyword}` 和 `{page}` 占位符
    pub endpoint: String,
}

/// 运行参数
#[derive(Debug, Clone, Deserialize)]
pub struct RunSettings {
    /// 运行模式 (collect, extract)
    pub mode: String,
    /// 采集的数据源ID
    pub source: String,
    /// 邮箱抓取的类别过滤
    pub category: Option<String>,
    /// 仅采集私立机构
    pub private_only: bool,
    /// 清除检查点后从头开始
    pub restart: bool,
    /// 仅采集指定区域代码，为空表示全部
    pub regions: Vec<String>,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次叠加内置默认值、`config/default`、`config/{APP_ENVIRONMENT}`
    /// 和 `REGCRAWL__` 前缀的环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("REGCRAWL")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("gateway.relays")
                    .with_list_parse_key("run.regions")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// 检查配置取值
    ///
    /// 数据源密钥是否齐全由注册表在采集前按数据源检查，这里只检查
    /// 与数据源无关的取值
    ///
    /// # Returns
    ///
    /// * `Ok(())` - 配置有效
    /// * `Err(ConfigError::Message)` - 第一个无效项
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.run.mode.as_str(), "collect" | "extract") {
            return Err(ConfigError::Message(format!(
                "run.mode 必须是 collect 或 extract: {}",
                self.run.mode
            )));
        }
        if !matches!(self.storage.storage_type.as_str(), "local" | "memory") {
            return Err(ConfigError::Message(format!(
                "storage.storage_type 必须是 local 或 memory: {}",
                self.storage.storage_type
            )));
        }
        if !self.gateway.direct_first && self.gateway.relays.is_empty() {
            return Err(ConfigError::Message(
                "gateway 至少需要直连或一个中继".to_string(),
            ));
        }
        if let Some(template) = self.gateway.relays.iter().find(|r| !r.contains("{url}")) {
            return Err(ConfigError::Message(format!(
                "中继模板缺少 {{url}} 占位符: {}",
                template
            )));
        }
        if self.sources.kindergarten.page_size == 0 || self.sources.academy.page_size == 0 {
            return Err(ConfigError::Message(
                "sources.*.page_size 必须大于0".to_string(),
            ));
        }
        Ok(())
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            // Default Storage settings
            .set_default("storage.storage_type", "local")?
            .set_default("storage.local_path", "./data")?
            // Default Gateway settings
            .set_default("gateway.timeout_secs", 15)?
            .set_default("gateway.min_html_length", 200)?
            .set_default("gateway.direct_first", true)?
            .set_default(
                "gateway.relays",
                vec![
                    "https://api.allorigins.win/raw?url={url}",
                    "https://corsproxy.io/?url={url}",
                    "https://api.codetabs.com/v1/proxy?quest={url}",
                ],
            )?
            // Default Collection settings
            .set_default("collection.region_delay_ms", 1000)?
            .set_default("collection.page_delay_ms", 300)?
            // Default Extraction settings
            .set_default("extraction.target_delay_ms", 500)?
            // Default Source settings
            .set_default(
                "sources.kindergarten.endpoint",
                "https://e-childschoolinfo.moe.go.kr/api/notice/basicInfo2.do",
            )?
            .set_default("sources.kindergarten.page_size", 100)?
            .set_default(
                "sources.academy.endpoint",
                "https://api.data.go.kr/openapi/tn_pubr_public_acdmy_api",
            )?
            .set_default("sources.academy.page_size", 1000)?
            .set_default(
                "sources.church.endpoint",
                "https://www.pck.or.kr/church/search.php?keyword={keyword}&page={page}",
            )?
            // Default Run settings
            .set_default("run.mode", "collect")?
            .set_default("run.source", "kindergarten")?
            .set_default("run.private_only", false)?
            .set_default("run.restart", false)?
            .set_default("run.regions", Vec::<String>::new())
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
