// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 采集进度状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    /// 采集中
    Collecting,
    /// 保存中
    Saving,
    /// 已结束
    Done,
}

/// 采集进度快照
///
/// 瞬时数据，不持久化，仅推送给界面层
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionProgress {
    pub status: ProgressStatus,
    /// 当前处理的区域名称
    pub current_region: String,
    /// 已采集（去重后）数量
    pub collected: usize,
    /// 总数：采集阶段为区域数，邮箱阶段为目标数
    pub total: usize,
    pub message: String,
}

impl CollectionProgress {
    pub fn new(
        status: ProgressStatus,
        current_region: impl Into<String>,
        collected: usize,
        total: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            current_region: current_region.into(),
            collected,
            total,
            message: message.into(),
        }
    }
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogSeverity {
    Info,
    Success,
    Warning,
    Error,
    Saving,
}

impl fmt::Display for LogSeverity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LogSeverity::Info => write!(f, "info"),
            LogSeverity::Success => write!(f, "success"),
            LogSeverity::Warning => write!(f, "warning"),
            LogSeverity::Error => write!(f, "error"),
            LogSeverity::Saving => write!(f, "saving"),
        }
    }
}

/// 采集日志条目
///
/// 单次运行内只追加
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionLog {
    pub timestamp: DateTime<Utc>,
    pub severity: LogSeverity,
    pub message: String,
    pub details: Option<String>,
}

impl CollectionLog {
    pub fn new(severity: LogSeverity, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            severity,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// 运行终态
///
/// 取消是正常终态，不是错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Done,
    Aborted,
}
