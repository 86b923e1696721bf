// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;

static EMAIL_LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href^='mailto:']").expect("Failed to compile mailto selector"));

static BODY_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("body").expect("Failed to compile body selector"));

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[a-z0-9._%+\-]+@[a-z0-9.\-]+\.[a-z]{2,}").expect("Failed to compile email regex")
});

const EXCLUDED_LOCAL_PARTS: &[&str] = &[
    "admin",
    "noreply",
    "no-reply",
    "webmaster",
    "postmaster",
    "mailer-daemon",
];

const EXCLUDED_DOMAIN_PATTERNS: &[&str] = &["example.", "test.", "localhost", "domain.com"];

const EXCLUDED_SUFFIXES: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp", ".bmp"];

const MAX_EMAIL_LENGTH: usize = 254;

/// 从页面中提取邮箱
///
/// 先收集 `mailto:` 链接，再用正则扫描正文文本和整个文档源码。结果统一小写，
/// 按首次出现顺序去重，并过滤掉占位/系统地址和无效地址。
///
/// # 参数
///
/// * `html` - 页面HTML
///
/// # 返回值
///
/// 有效邮箱列表，可能为空
pub fn extract_emails(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut candidates: Vec<String> = Vec::new();

    for element in document.select(&EMAIL_LINK_SELECTOR) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(target) = href.strip_prefix("mailto:") else {
            continue;
        };
        let target = target.split('?').next().unwrap_or_default();
        let decoded = urlencoding::decode(target)
            .map(|d| d.into_owned())
            .unwrap_or_else(|_| target.to_string());
        candidates.extend(
            decoded
                .split(',')
                .map(|email| email.trim().to_lowercase())
                .filter(|email| !email.is_empty()),
        );
    }

    let mut text_content = String::new();
    let text_root = document
        .select(&BODY_SELECTOR)
        .next()
        .unwrap_or_else(|| document.root_element());
    for fragment in text_root.text() {
        text_content.push_str(fragment.trim());
        text_content.push(' ');
    }
    candidates.extend(
        EMAIL_RE
            .find_iter(&text_content)
            .map(|m| m.as_str().to_lowercase()),
    );
    // Raw markup also reaches <head> and attribute values
    candidates.extend(
        EMAIL_RE
            .find_iter(html)
            .map(|m| m.as_str().to_lowercase()),
    );

    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|email| is_valid_email(email) && !is_excluded(email))
        .filter(|email| seen.insert(email.clone()))
        .collect()
}

/// 是否是占位、系统或图片文件名形式的地址
pub fn is_excluded(email: &str) -> bool {
    let email = email.to_lowercase();
    if EXCLUDED_SUFFIXES.iter().any(|suffix| email.ends_with(suffix)) {
        return true;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return true;
    };
    EXCLUDED_LOCAL_PARTS.contains(&local)
        || EXCLUDED_DOMAIN_PATTERNS
            .iter()
            .any(|pattern| domain.contains(pattern))
}

/// 结构校验：恰好一个 `@`，本地部分非空，域名至少3个字符且包含 `.`，总长不超过254
pub fn is_valid_email(email: &str) -> bool {
    if email.len() > MAX_EMAIL_LENGTH || email.matches('@').count() != 1 {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.len() >= 3 && domain.contains('.'),
        None => false,
    }
}
