// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::organization::{normalize_name, CollectedOrganization};
use crate::domain::repositories::organization_repository::OrganizationRepository;
use crate::utils::errors::RepositoryError;
use std::collections::HashSet;

/// 去重索引
///
/// 以规范化名称为键的内存集合，只在一次编排运行内有效。
/// 运行开始时由机构表已有名称初始化。编排器按批暂存新键，写入成功后再提交。
#[derive(Debug, Default, Clone)]
pub struct DedupIndex {
    keys: HashSet<String>,
}

impl DedupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从机构表加载已有名称
    ///
    /// # 参数
    ///
    /// * `repo` - 机构表仓库
    ///
    /// # 返回值
    ///
    /// * `Ok(DedupIndex)` - 包含所有已入库名称的索引
    /// * `Err(RepositoryError)` - 读取失败
    pub async fn load(repo: &dyn OrganizationRepository) -> Result<Self, RepositoryError> {
        let names = repo.existing_names().await?;
        Ok(names.iter().map(String::as_str).collect())
    }

    /// 检查并插入
    ///
    /// 名称为空或已存在时返回 `false`，否则记录该键并返回 `true`
    pub fn accept(&mut self, org: &CollectedOrganization) -> bool {
        let key = org.dedup_key();
        !key.is_empty() && self.keys.insert(key)
    }

    /// 开始一批检查，批内接受的键在 `commit` 之前不进入索引
    pub fn batch(&self) -> DedupBatch<'_> {
        DedupBatch {
            index: self,
            keys: HashSet::new(),
        }
    }

    /// 写入成功后提交一批键
    pub fn commit(&mut self, keys: HashSet<String>) {
        self.keys.extend(keys);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.keys.contains(&normalize_name(name))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// 一批暂存的键
///
/// 同时对照索引和批内已接受的键去重
#[derive(Debug)]
pub struct DedupBatch<'a> {
    index: &'a DedupIndex,
    keys: HashSet<String>,
}

impl DedupBatch<'_> {
    /// 检查并暂存，名称为空或已在索引/批内时返回 `false`
    pub fn accept(&mut self, org: &CollectedOrganization) -> bool {
        let key = org.dedup_key();
        !key.is_empty() && !self.index.keys.contains(&key) && self.keys.insert(key)
    }

    pub fn into_keys(self) -> HashSet<String> {
        self.keys
    }
}

impl<'a> FromIterator<&'a str> for DedupIndex {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let keys = iter
            .into_iter()
            .map(normalize_name)
            .filter(|key| !key.is_empty())
            .collect();
        Self { keys }
    }
}
