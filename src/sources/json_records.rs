// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::organization::CollectedOrganization;
use crate::domain::models::source::{ApiSchema, FieldMap};
use crate::utils::errors::SourceError;
use serde_json::Value;

/// 一页JSON响应
#[derive(Debug, Clone)]
pub struct JsonPage {
    /// 状态字段表示成功（或未配置状态字段）
    pub accepted: bool,
    /// 原始记录
    pub records: Vec<Value>,
}

/// 解析一页JSON响应
///
/// 状态不在成功值列表中、记录数组缺失或为 `null` 都视为空页。
/// 只有一个元素时部分接口直接返回对象而不是数组，这里统一成数组。
pub fn parse_page(body: &str, schema: &ApiSchema) -> Result<JsonPage, SourceError> {
    let root: Value =
        serde_json::from_str(body).map_err(|e| SourceError::Malformed(e.to_string()))?;

    if let Some(pointer) = &schema.status_pointer {
        if let Some(status) = root.pointer(pointer) {
            let status = value_to_string(status);
            if !schema.success_values.is_empty()
                && !schema.success_values.iter().any(|v| v == &status)
            {
                return Ok(JsonPage {
                    accepted: false,
                    records: Vec::new(),
                });
            }
        }
    }

    let records = match root.pointer(&schema.records_pointer) {
        Some(Value::Array(items)) => items.clone(),
        Some(single @ Value::Object(_)) => vec![single.clone()],
        _ => Vec::new(),
    };

    Ok(JsonPage {
        accepted: true,
        records,
    })
}

/// 将JSON值转换为去除首尾空白的字符串
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => html_escape::decode_html_entities(s.trim()).into_owned(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

fn field(record: &Value, key: &str) -> String {
    if key.is_empty() {
        return String::new();
    }
    record.get(key).map(value_to_string).unwrap_or_default()
}

/// 按字段映射把记录转换为机构，名称为空时返回 `None`
pub fn to_organization(
    record: &Value,
    fields: &FieldMap,
    region: &str,
) -> Option<CollectedOrganization> {
    let name = field(record, &fields.name);
    if name.is_empty() {
        return None;
    }

    let mut org = CollectedOrganization::new(name, region);
    org.org_type = field(record, &fields.org_type);
    org.address = field(record, &fields.address);
    org.phone = field(record, &fields.phone);
    org.homepage = field(record, &fields.homepage);
    org.representative = field(record, &fields.representative);
    org.email = fields
        .email
        .as_deref()
        .map(|key| field(record, key))
        .filter(|e| e.contains('@'));
    Some(org)
}

/// 私立过滤：未配置标记时全部保留
pub fn passes_private_filter(org: &CollectedOrganization, marker: Option<&str>) -> bool {
    match marker {
        Some(marker) => org.org_type.contains(marker),
        None => true,
    }
}
