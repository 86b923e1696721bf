// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::traits::EngineError;

/// 期望的响应类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    /// API数据源，必须能解析为JSON
    Json,
    /// 网页，必须包含HTML标记
    Html,
}

const HTML_MARKERS: &[&str] = &["<html", "<body", "<table", "<div", "<head", "<!doctype"];

/// 校验响应内容是否可用
///
/// 拒绝空内容、短于 `min_length` 的内容以及形状不符的内容。
/// 中继在失败时常返回200加一段错误文字，所以不能只看状态码。
pub fn validate_payload(
    kind: PayloadKind,
    content: &str,
    min_length: usize,
) -> Result<(), EngineError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidPayload("empty body".to_string()));
    }
    if trimmed.len() < min_length {
        return Err(EngineError::InvalidPayload(format!(
            "body too short ({} bytes)",
            trimmed.len()
        )));
    }

    match kind {
        PayloadKind::Json => serde_json::from_str::<serde_json::Value>(trimmed)
            .map(|_| ())
            .map_err(|e| EngineError::InvalidPayload(format!("not JSON: {}", e))),
        PayloadKind::Html => {
            // Only the head of the document is inspected
            let head: String = trimmed.chars().take(4096).collect::<String>().to_lowercase();
            if HTML_MARKERS.iter().any(|m| head.contains(m)) {
                Ok(())
            } else {
                Err(EngineError::InvalidPayload("no HTML markers".to_string()))
            }
        }
    }
}
