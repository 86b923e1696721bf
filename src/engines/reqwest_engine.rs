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

use crate::engines::traits::{EngineError, FetchRequest, FetchResponse, TransportEngine};
use crate::utils::url_utils::fill_relay_template;
use async_trait::async_trait;
use std::time::Instant;

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// 构建共享的HTTP客户端
pub fn build_client() -> Result<reqwest::Client, EngineError> {
    Ok(reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .cookie_store(true)
        .build()?)
}

async fn execute(
    client: &reqwest::Client,
    url: &str,
    request: &FetchRequest,
) -> Result<FetchResponse, EngineError> {
    let start = Instant::now();
    let response = client
        .get(url)
        .timeout(request.timeout)
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                EngineError::Timeout
            } else {
                EngineError::RequestFailed(e)
            }
        })?;

    let status_code = response.status().as_u16();
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("text/html")
        .to_string();

    let content = response.text().await?;

    Ok(FetchResponse {
        status_code,
        content,
        content_type,
        response_time_ms: start.elapsed().as_millis() as u64,
    })
}

/// 直连引擎
///
/// 基于reqwest直接请求目标地址
pub struct DirectEngine {
    client: reqwest::Client,
}

impl DirectEngine {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TransportEngine for DirectEngine {
    /// 执行HTTP抓取
    ///
    /// # 参数
    ///
    /// * `request` - 抓取请求
    ///
    /// # 返回值
    ///
    /// * `Ok(FetchResponse)` - 抓取响应（状态码由网关判断）
    /// * `Err(EngineError)` - 网络层错误
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, EngineError> {
        execute(&self.client, &request.url, request).await
    }

    fn name(&self) -> &str {
        "direct"
    }
}

/// 中继引擎
///
/// 将目标地址URL编码后填入中继模板，中继原样返回目标响应体
pub struct RelayEngine {
    client: reqwest::Client,
    template: String,
    name: String,
}

impl RelayEngine {
    /// 创建中继引擎
    ///
    /// # 参数
    ///
    /// * `client` - 共享HTTP客户端
    /// * `template` - 中继URL模板，`{url}` 为目标地址占位符
    pub fn new(client: reqwest::Client, template: impl Into<String>) -> Self {
        let template = template.into();
        let name = url::Url::parse(&template)
            .ok()
            .and_then(|u| u.host_str().map(|h| format!("relay:{}", h)))
            .unwrap_or_else(|| "relay".to_string());
        Self {
            client,
            template,
            name,
        }
    }

    pub fn relay_url(&self, target: &str) -> String {
        fill_relay_template(&self.template, target)
    }
}

#[async_trait]
impl TransportEngine for RelayEngine {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, EngineError> {
        let relay_url = self.relay_url(&request.url);
        execute(&self.client, &relay_url, request).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
#[path = "reqwest_engine_test.rs"]
mod tests;
