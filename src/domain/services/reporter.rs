// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::progress::{CollectionLog, CollectionProgress, LogSeverity};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// 进度回调特质
///
/// 界面层实现此特质接收进度快照和日志。回调在采集任务内同步调用，
/// 实现应当尽快返回。
pub trait ProgressReporter: Send + Sync {
    fn on_progress(&self, _progress: &CollectionProgress) {}

    fn on_log(&self, _log: &CollectionLog) {}
}

/// 不做任何事的回调
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {}

/// 回调事件
#[derive(Debug, Clone, PartialEq)]
pub enum ReportEvent {
    Progress(CollectionProgress),
    Log(CollectionLog),
}

/// 把事件转发到无界通道的回调
///
/// 接收端被丢弃后事件会被静默丢弃
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    sender: mpsc::UnboundedSender<ReportEvent>,
}

impl ChannelReporter {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ReportEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl ProgressReporter for ChannelReporter {
    fn on_progress(&self, progress: &CollectionProgress) {
        let _ = self.sender.send(ReportEvent::Progress(progress.clone()));
    }

    fn on_log(&self, log: &CollectionLog) {
        let _ = self.sender.send(ReportEvent::Log(log.clone()));
    }
}

/// 进度与日志报告器
///
/// 包装可选的回调：隔离回调中的panic，把每条日志同步写入 `tracing`，
/// 并保留日志缓冲区供运行摘要使用
pub struct Reporter {
    sink: Option<Arc<dyn ProgressReporter>>,
    logs: parking_lot::Mutex<Vec<CollectionLog>>,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::silent()
    }
}

impl Reporter {
    pub fn new(sink: Arc<dyn ProgressReporter>) -> Self {
        Self {
            sink: Some(sink),
            logs: parking_lot::Mutex::new(Vec::new()),
        }
    }

    /// 没有回调，只写 `tracing` 和缓冲区
    pub fn silent() -> Self {
        Self {
            sink: None,
            logs: parking_lot::Mutex::new(Vec::new()),
        }
    }

    /// 推送进度快照
    pub fn progress(&self, progress: CollectionProgress) {
        if let Some(sink) = &self.sink {
            if catch_unwind(AssertUnwindSafe(|| sink.on_progress(&progress))).is_err() {
                warn!("Progress callback panicked, event dropped");
            }
        }
    }

    /// 记录一条日志
    pub fn log(&self, log: CollectionLog) {
        let details = log.details.as_deref().unwrap_or_default();
        match log.severity {
            LogSeverity::Warning => warn!(severity = %log.severity, details, "{}", log.message),
            LogSeverity::Error => error!(severity = %log.severity, details, "{}", log.message),
            _ => info!(severity = %log.severity, details, "{}", log.message),
        }

        if let Some(sink) = &self.sink {
            if catch_unwind(AssertUnwindSafe(|| sink.on_log(&log))).is_err() {
                warn!("Log callback panicked, event dropped");
            }
        }
        self.logs.lock().push(log);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(CollectionLog::new(LogSeverity::Info, message));
    }

    pub fn success(&self, message: impl Into<String>) {
        self.log(CollectionLog::new(LogSeverity::Success, message));
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.log(CollectionLog::new(LogSeverity::Warning, message));
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(CollectionLog::new(LogSeverity::Error, message));
    }

    pub fn saving(&self, message: impl Into<String>) {
        self.log(CollectionLog::new(LogSeverity::Saving, message));
    }

    /// 缓冲区中的日志条数，作为一次运行的起点标记
    pub fn log_count(&self) -> usize {
        self.logs.lock().len()
    }

    /// 从标记开始的日志
    pub fn logs_since(&self, mark: usize) -> Vec<CollectionLog> {
        self.logs.lock().iter().skip(mark).cloned().collect()
    }

    /// 全部日志
    pub fn logs(&self) -> Vec<CollectionLog> {
        self.logs.lock().clone()
    }
}
