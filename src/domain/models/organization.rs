// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 采集到的机构实体
///
/// 所有数据源（分页API、全量接口、HTML名录）都会被转换成这一统一结构。
/// 去重身份只取规范化后的名称，见 [`CollectedOrganization::dedup_key`]。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectedOrganization {
    /// 机构名称，持久化前必须非空
    pub name: String,
    /// 机构类型（设立类别、所属教区等）
    pub org_type: String,
    /// 地址
    pub address: String,
    /// 电话
    pub phone: String,
    /// 主页
    pub homepage: String,
    /// 代表人
    pub representative: String,
    /// 所属区域名称
    pub region: String,
    /// 采集时已知的邮箱
    pub email: Option<String>,
    /// 采集时间
    pub collected_at: DateTime<Utc>,
}

impl CollectedOrganization {
    /// 以名称和区域创建一条空白记录，其余字段留空
    pub fn new(name: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            org_type: String::new(),
            address: String::new(),
            phone: String::new(),
            homepage: String::new(),
            representative: String::new(),
            region: region.into(),
            email: None,
            collected_at: Utc::now(),
        }
    }

    /// 去重键
    pub fn dedup_key(&self) -> String {
        normalize_name(&self.name)
    }

    /// 名称是否有效（去除空白后非空）
    pub fn has_name(&self) -> bool {
        !self.name.trim().is_empty()
    }

    /// 采集时的邮箱状态
    ///
    /// 已有邮箱为 `Y`，有主页待抓取为 `N`，两者都没有为 `-`
    pub fn initial_email_status(&self) -> EmailStatus {
        if self.email.as_deref().is_some_and(|e| !e.trim().is_empty()) {
            EmailStatus::Resolved
        } else if !matches!(self.homepage.trim(), "" | "-") {
            EmailStatus::Pending
        } else {
            EmailStatus::NoHomepage
        }
    }
}

/// 规范化机构名称：去除首尾空白、合并内部空白、转小写
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// 邮箱状态标记
///
/// 对应机构表最后一列的单字符标记
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmailStatus {
    /// 已获取邮箱
    #[serde(rename = "Y")]
    Resolved,
    /// 待抓取
    #[serde(rename = "N")]
    Pending,
    /// 无主页，无需抓取
    #[serde(rename = "-")]
    NoHomepage,
    /// 抓取失败
    #[serde(rename = "F")]
    Failed,
}

impl EmailStatus {
    pub fn as_flag(&self) -> &'static str {
        match self {
            EmailStatus::Resolved => "Y",
            EmailStatus::Pending => "N",
            EmailStatus::NoHomepage => "-",
            EmailStatus::Failed => "F",
        }
    }
}

impl fmt::Display for EmailStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_flag())
    }
}

impl FromStr for EmailStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Y" => Ok(EmailStatus::Resolved),
            "N" => Ok(EmailStatus::Pending),
            "-" => Ok(EmailStatus::NoHomepage),
            "F" => Ok(EmailStatus::Failed),
            _ => Err(()),
        }
    }
}

/// 机构表中的一行
///
/// 列顺序固定：名称、类型、地址、电话、主页、代表人、区域、类别、采集日期、邮箱状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationRow {
    pub name: String,
    pub org_type: String,
    pub address: String,
    pub phone: String,
    pub homepage: String,
    pub representative: String,
    pub region: String,
    pub category: String,
    /// 采集日期 (YYYY-MM-DD)
    pub collection_date: String,
    pub email_status: EmailStatus,
}

impl OrganizationRow {
    pub fn from_organization(org: &CollectedOrganization, category: &str) -> Self {
        Self {
            name: org.name.trim().to_string(),
            org_type: org.org_type.clone(),
            address: org.address.clone(),
            phone: org.phone.clone(),
            homepage: org.homepage.clone(),
            representative: org.representative.clone(),
            region: org.region.clone(),
            category: category.to_string(),
            collection_date: org.collected_at.format("%Y-%m-%d").to_string(),
            email_status: org.initial_email_status(),
        }
    }

    /// 按固定列顺序输出单元格
    pub fn to_cells(&self) -> [String; 10] {
        [
            self.name.clone(),
            self.org_type.clone(),
            self.address.clone(),
            self.phone.clone(),
            self.homepage.clone(),
            self.representative.clone(),
            self.region.clone(),
            self.category.clone(),
            self.collection_date.clone(),
            self.email_status.as_flag().to_string(),
        ]
    }
}

/// 联系人表中的一行：名称、邮箱、类别
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRow {
    pub name: String,
    pub email: String,
    pub category: String,
}

/// 邮箱抓取目标
///
/// 已入库、有主页但尚未解析出邮箱的机构
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    pub name: String,
    pub homepage: String,
    pub category: String,
    /// 在机构表中的行号，用于回写状态
    pub row_index: usize,
}
