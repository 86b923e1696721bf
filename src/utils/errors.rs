// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;

/// 仓库层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("存储错误: {0}")]
    StorageError(String),

    #[error("序列化错误: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("未找到数据: {0}")]
    NotFound(String),

    #[error("无效参数: {0}")]
    InvalidParameter(String),
}

/// 数据源错误类型
///
/// 单个区域抓取失败时返回，编排器记录后跳过该区域
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("数据源不可用: {0}")]
    Unavailable(String),

    #[error("响应格式错误: {0}")]
    Malformed(String),

    #[error("检查点错误: {0}")]
    Checkpoint(#[from] RepositoryError),
}

/// 采集流程错误类型
///
/// 仅配置/认证类错误会中止整个运行，且必须在任何网络访问之前抛出
#[derive(Error, Debug)]
pub enum CollectionError {
    #[error("配置错误: {0}")]
    Configuration(String),

    #[error("未知数据源: {0}")]
    UnknownSource(String),

    #[error("仓库错误: {0}")]
    Repository(#[from] RepositoryError),
}
