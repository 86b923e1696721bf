// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 规范化主页地址
///
/// 去除首尾空白，缺少协议时补全为 `http://`。空字符串返回 `None`。
pub fn normalize_homepage(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "-" {
        return None;
    }

    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Some(trimmed.to_string());
    }

    // Protocol-relative links ("//host/path") keep their host part
    let without_slashes = trimmed.trim_start_matches('/');
    Some(format!("http://{}", without_slashes))
}

/// 将目标地址填入中继模板
///
/// 模板中的 `{url}` 占位符会被替换为URL编码后的目标地址；
/// 没有占位符的模板直接在末尾拼接编码后的地址。
pub fn fill_relay_template(template: &str, target: &str) -> String {
    let encoded = urlencoding::encode(target);
    if template.contains("{url}") {
        template.replace("{url}", &encoded)
    } else {
        format!("{}{}", template, encoded)
    }
}
