// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::organization::{CollectedOrganization, ContactRow, OrganizationRow};
use crate::domain::repositories::contact_repository::ContactRepository;
use crate::domain::repositories::organization_repository::OrganizationRepository;
use crate::utils::errors::RepositoryError;
use std::sync::Arc;
use tracing::debug;

/// 持久化服务
///
/// 把一批机构写入机构表；采集时已知邮箱的机构同时写入联系人表
pub struct PersistenceSink {
    organizations: Arc<dyn OrganizationRepository>,
    contacts: Arc<dyn ContactRepository>,
}

impl PersistenceSink {
    pub fn new(
        organizations: Arc<dyn OrganizationRepository>,
        contacts: Arc<dyn ContactRepository>,
    ) -> Self {
        Self {
            organizations,
            contacts,
        }
    }

    /// 追加一批机构
    ///
    /// # 参数
    ///
    /// * `organizations` - 待写入的机构，名称为空的会被跳过
    /// * `category` - 写入类别列的值
    ///
    /// # 返回值
    ///
    /// * `Ok(usize)` - 写入机构表的行数
    /// * `Err(RepositoryError)` - 写入失败
    pub async fn append(
        &self,
        organizations: &[CollectedOrganization],
        category: &str,
    ) -> Result<usize, RepositoryError> {
        let named: Vec<&CollectedOrganization> =
            organizations.iter().filter(|org| org.has_name()).collect();
        if named.is_empty() {
            return Ok(0);
        }

        let rows: Vec<OrganizationRow> = named
            .iter()
            .map(|org| OrganizationRow::from_organization(org, category))
            .collect();
        let contacts: Vec<ContactRow> = named
            .iter()
            .filter_map(|org| {
                let email = org.email.as_deref()?.trim();
                (!email.is_empty()).then(|| ContactRow {
                    name: org.name.trim().to_string(),
                    email: email.to_lowercase(),
                    category: category.to_string(),
                })
            })
            .collect();

        let written = self.organizations.append(&rows).await?;
        if !contacts.is_empty() {
            self.contacts.append(&contacts).await?;
        }

        debug!(
            "Persisted {} organizations and {} contacts for {}",
            written,
            contacts.len(),
            category
        );
        Ok(written)
    }

    /// 写入单个联系人（邮箱抓取阶段使用）
    pub async fn append_contact(&self, contact: ContactRow) -> Result<usize, RepositoryError> {
        self.contacts.append(&[contact]).await
    }
}
