// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::GatewaySettings;
use crate::engines::reqwest_engine::{build_client, DirectEngine, RelayEngine};
use crate::engines::traits::{EngineError, FetchRequest, TransportEngine};
use crate::engines::validators::{validate_payload, PayloadKind};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// 取消信号
///
/// 网关在令牌已触发时立即返回，不再尝试任何策略
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("operation cancelled")]
pub struct Cancelled;

/// 引擎统计
#[derive(Debug, Clone, Default)]
pub struct EngineStats {
    /// 返回有效内容的次数
    pub success_count: u64,
    /// 失败次数（网络错误、超时、非成功状态、内容无效）
    pub failure_count: u64,
    /// 最近一次响应时间
    pub last_response_time: Option<Duration>,
}

/// 代理网关
///
/// 按顺序尝试各传输策略（直连 + N个中继），返回第一个有效内容。
/// 所有策略都失败是软失败，返回 `Ok(None)`，由调用方决定后果。
pub struct ProxyGateway {
    /// 引擎列表，按尝试顺序
    engines: Vec<Arc<dyn TransportEngine>>,
    /// 单次尝试超时
    timeout: Duration,
    /// HTML内容最小长度
    min_html_length: usize,
    /// 引擎统计
    engine_stats: parking_lot::RwLock<HashMap<String, EngineStats>>,
}

impl ProxyGateway {
    /// 创建新的代理网关
    ///
    /// # 参数
    ///
    /// * `engines` - 按尝试顺序排列的传输引擎
    /// * `timeout` - 单次尝试超时
    /// * `min_html_length` - HTML内容最小长度
    pub fn new(
        engines: Vec<Arc<dyn TransportEngine>>,
        timeout: Duration,
        min_html_length: usize,
    ) -> Self {
        let engine_stats = engines
            .iter()
            .map(|e| (e.name().to_string(), EngineStats::default()))
            .collect();

        Self {
            engines,
            timeout,
            min_html_length,
            engine_stats: parking_lot::RwLock::new(engine_stats),
        }
    }

    /// 根据配置创建：直连在前，中继模板按配置顺序在后
    pub fn from_settings(settings: &GatewaySettings) -> Result<Self, EngineError> {
        let client = build_client()?;
        let mut engines: Vec<Arc<dyn TransportEngine>> = Vec::new();
        if settings.direct_first {
            engines.push(Arc::new(DirectEngine::new(client.clone())));
        }
        for template in &settings.relays {
            engines.push(Arc::new(RelayEngine::new(client.clone(), template.clone())));
        }

        Ok(Self::new(
            engines,
            Duration::from_secs(settings.timeout_secs),
            settings.min_html_length,
        ))
    }

    /// 引擎数量
    pub fn engine_count(&self) -> usize {
        self.engines.len()
    }

    fn min_length(&self, kind: PayloadKind) -> usize {
        match kind {
            PayloadKind::Json => 2,
            PayloadKind::Html => self.min_html_length,
        }
    }

    /// 抓取URL
    ///
    /// # 参数
    ///
    /// * `url` - 目标地址
    /// * `kind` - 期望的内容类型
    /// * `cancel` - 取消令牌
    ///
    /// # 返回值
    ///
    /// * `Ok(Some(String))` - 第一个有效内容
    /// * `Ok(None)` - 所有策略都失败
    /// * `Err(Cancelled)` - 令牌已触发
    pub async fn fetch(
        &self,
        url: &str,
        kind: PayloadKind,
        cancel: &CancellationToken,
    ) -> Result<Option<String>, Cancelled> {
        let request = FetchRequest::new(url, self.timeout);
        let min_length = self.min_length(kind);

        for engine in &self.engines {
            if cancel.is_cancelled() {
                return Err(Cancelled);
            }

            let engine_name = engine.name();
            let started = Instant::now();
            let attempt = tokio::time::timeout(self.timeout, engine.fetch(&request));

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Cancelled),
                result = attempt => result,
            };

            let result = match outcome {
                Err(_) => Err(EngineError::Timeout),
                Ok(Err(e)) => Err(e),
                Ok(Ok(response)) if !response.is_success() => {
                    Err(EngineError::Status(response.status_code))
                }
                Ok(Ok(response)) => {
                    validate_payload(kind, &response.content, min_length).map(|_| response.content)
                }
            };

            match result {
                Ok(content) => {
                    self.update_engine_stats(engine_name, true, started.elapsed());
                    debug!(
                        "Engine {} returned {} bytes for {} in {:?}",
                        engine_name,
                        content.len(),
                        url,
                        started.elapsed()
                    );
                    return Ok(Some(content));
                }
                Err(e) => {
                    self.update_engine_stats(engine_name, false, started.elapsed());
                    warn!("Engine {} failed for {}: {}, trying next engine", engine_name, url, e);
                }
            }
        }

        info!("All {} engines failed for {}", self.engines.len(), url);
        Ok(None)
    }

    fn update_engine_stats(&self, engine_name: &str, success: bool, response_time: Duration) {
        let mut stats = self.engine_stats.write();
        let stat = stats.entry(engine_name.to_string()).or_default();
        if success {
            stat.success_count += 1;
        } else {
            stat.failure_count += 1;
        }
        stat.last_response_time = Some(response_time);
    }

    /// 获取引擎统计信息
    pub fn get_engine_stats(&self) -> HashMap<String, EngineStats> {
        self.engine_stats.read().clone()
    }
}
