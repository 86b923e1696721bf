// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::config::settings::StorageSettings;
use crate::domain::models::checkpoint::CrawlCheckpoint;
use crate::domain::models::organization::{ContactRow, CrawlTarget, EmailStatus, OrganizationRow};
use crate::domain::repositories::checkpoint_repository::CheckpointRepository;
use crate::domain::repositories::contact_repository::ContactRepository;
use crate::domain::repositories::organization_repository::OrganizationRepository;
use crate::utils::errors::RepositoryError;

const ORGANIZATIONS_FILE: &str = "organizations.jsonl";
const CONTACTS_FILE: &str = "contacts.jsonl";
const CHECKPOINTS_FILE: &str = "checkpoints.json";

/// 行是否是邮箱抓取目标
fn is_target(row: &OrganizationRow, category: Option<&str>) -> bool {
    let homepage = row.homepage.trim();
    row.email_status == EmailStatus::Pending
        && !homepage.is_empty()
        && homepage != "-"
        && category.map_or(true, |c| row.category == c)
}

fn collect_targets<'a>(
    rows: impl Iterator<Item = &'a OrganizationRow>,
    category: Option<&str>,
) -> Vec<CrawlTarget> {
    rows.enumerate()
        .filter(|(_, row)| is_target(row, category))
        .map(|(row_index, row)| CrawlTarget {
            name: row.name.clone(),
            homepage: row.homepage.trim().to_string(),
            category: row.category.clone(),
            row_index,
        })
        .collect()
}

fn checkpoint_key(source_id: &str, region: &str) -> String {
    format!("{}/{}", source_id, region)
}

#[derive(Default)]
struct MemoryState {
    organizations: Vec<OrganizationRow>,
    contacts: Vec<ContactRow>,
    checkpoints: HashMap<String, CrawlCheckpoint>,
}

/// 内存存储实现
///
/// 同时实现三个仓库接口，用于测试和一次性运行
#[derive(Default)]
pub struct MemoryStore {
    state: parking_lot::RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 机构表快照
    pub fn organizations(&self) -> Vec<OrganizationRow> {
        self.state.read().organizations.clone()
    }

    /// 联系人表快照
    pub fn contacts(&self) -> Vec<ContactRow> {
        self.state.read().contacts.clone()
    }
}

#[async_trait]
impl OrganizationRepository for MemoryStore {
    async fn existing_names(&self) -> Result<Vec<String>, RepositoryError> {
        Ok(self
            .state
            .read()
            .organizations
            .iter()
            .map(|row| row.name.clone())
            .collect())
    }

    async fn append(&self, rows: &[OrganizationRow]) -> Result<usize, RepositoryError> {
        self.state.write().organizations.extend_from_slice(rows);
        Ok(rows.len())
    }

    async fn pending_targets(
        &self,
        category: Option<&str>,
    ) -> Result<Vec<CrawlTarget>, RepositoryError> {
        Ok(collect_targets(self.state.read().organizations.iter(), category))
    }

    async fn update_email_status(
        &self,
        row_index: usize,
        status: EmailStatus,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.write();
        let row = state
            .organizations
            .get_mut(row_index)
            .ok_or_else(|| RepositoryError::NotFound(format!("机构行 {}", row_index)))?;
        row.email_status = status;
        Ok(())
    }
}

#[async_trait]
impl ContactRepository for MemoryStore {
    async fn append(&self, rows: &[ContactRow]) -> Result<usize, RepositoryError> {
        self.state.write().contacts.extend_from_slice(rows);
        Ok(rows.len())
    }
}

#[async_trait]
impl CheckpointRepository for MemoryStore {
    async fn get(
        &self,
        source_id: &str,
        region: &str,
    ) -> Result<Option<CrawlCheckpoint>, RepositoryError> {
        Ok(self
            .state
            .read()
            .checkpoints
            .get(&checkpoint_key(source_id, region))
            .cloned())
    }

    async fn save(&self, checkpoint: &CrawlCheckpoint) -> Result<(), RepositoryError> {
        self.state.write().checkpoints.insert(
            checkpoint_key(&checkpoint.source_id, &checkpoint.region),
            checkpoint.clone(),
        );
        Ok(())
    }

    async fn clear(&self, source_id: &str, region: &str) -> Result<(), RepositoryError> {
        self.state
            .write()
            .checkpoints
            .remove(&checkpoint_key(source_id, region));
        Ok(())
    }
}

/// 本地文件系统存储实现
///
/// 机构表和联系人表是 JSON Lines 文件，一行一条记录，行号即追加顺序；
/// 检查点是一个 JSON 对象文件。所有写操作经同一把锁串行化。
pub struct LocalStore {
    base_path: PathBuf,
    write_lock: Mutex<()>,
}

impl LocalStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn get_full_path(&self, name: &str) -> PathBuf {
        self.base_path.join(name)
    }

    async fn ensure_dir(&self) -> Result<(), RepositoryError> {
        fs::create_dir_all(&self.base_path).await?;
        Ok(())
    }

    async fn read_lines<T: DeserializeOwned>(&self, name: &str) -> Result<Vec<T>, RepositoryError> {
        let content = match fs::read_to_string(self.get_full_path(name)).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(RepositoryError::Io(e)),
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(RepositoryError::from))
            .collect()
    }

    async fn append_lines<T: Serialize>(&self, name: &str, rows: &[T]) -> Result<usize, RepositoryError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut buffer = String::new();
        for row in rows {
            buffer.push_str(&serde_json::to_string(row)?);
            buffer.push('\n');
        }

        let _guard = self.write_lock.lock().await;
        self.ensure_dir().await?;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.get_full_path(name))
            .await?;
        file.write_all(buffer.as_bytes()).await?;
        file.flush().await?;

        Ok(rows.len())
    }

    /// 先写临时文件再重命名，避免中途失败留下半个文件
    async fn replace_file(&self, path: &Path, content: &[u8]) -> Result<(), RepositoryError> {
        self.ensure_dir().await?;
        let tmp = path.with_extension("tmp");
        let mut file = fs::File::create(&tmp).await?;
        file.write_all(content).await?;
        file.flush().await?;
        drop(file);
        fs::rename(&tmp, path).await?;
        Ok(())
    }

    async fn read_checkpoints(&self) -> Result<HashMap<String, CrawlCheckpoint>, RepositoryError> {
        match fs::read(self.get_full_path(CHECKPOINTS_FILE)).await {
            Ok(data) => Ok(serde_json::from_slice(&data)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(RepositoryError::Io(e)),
        }
    }

    async fn write_checkpoints(
        &self,
        checkpoints: &HashMap<String, CrawlCheckpoint>,
    ) -> Result<(), RepositoryError> {
        let data = serde_json::to_vec_pretty(checkpoints)?;
        self.replace_file(&self.get_full_path(CHECKPOINTS_FILE), &data)
            .await
    }
}

#[async_trait]
impl OrganizationRepository for LocalStore {
    async fn existing_names(&self) -> Result<Vec<String>, RepositoryError> {
        let rows: Vec<OrganizationRow> = self.read_lines(ORGANIZATIONS_FILE).await?;
        Ok(rows.into_iter().map(|row| row.name).collect())
    }

    async fn append(&self, rows: &[OrganizationRow]) -> Result<usize, RepositoryError> {
        self.append_lines(ORGANIZATIONS_FILE, rows).await
    }

    async fn pending_targets(
        &self,
        category: Option<&str>,
    ) -> Result<Vec<CrawlTarget>, RepositoryError> {
        let rows: Vec<OrganizationRow> = self.read_lines(ORGANIZATIONS_FILE).await?;
        Ok(collect_targets(rows.iter(), category))
    }

    async fn update_email_status(
        &self,
        row_index: usize,
        status: EmailStatus,
    ) -> Result<(), RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let mut rows: Vec<OrganizationRow> = self.read_lines(ORGANIZATIONS_FILE).await?;
        let row = rows
            .get_mut(row_index)
            .ok_or_else(|| RepositoryError::NotFound(format!("机构行 {}", row_index)))?;
        row.email_status = status;

        let mut buffer = String::new();
        for row in &rows {
            buffer.push_str(&serde_json::to_string(row)?);
            buffer.push('\n');
        }
        self.replace_file(&self.get_full_path(ORGANIZATIONS_FILE), buffer.as_bytes())
            .await
    }
}

#[async_trait]
impl ContactRepository for LocalStore {
    async fn append(&self, rows: &[ContactRow]) -> Result<usize, RepositoryError> {
        self.append_lines(CONTACTS_FILE, rows).await
    }
}

#[async_trait]
impl CheckpointRepository for LocalStore {
    async fn get(
        &self,
        source_id: &str,
        region: &str,
    ) -> Result<Option<CrawlCheckpoint>, RepositoryError> {
        let mut checkpoints = self.read_checkpoints().await?;
        Ok(checkpoints.remove(&checkpoint_key(source_id, region)))
    }

    async fn save(&self, checkpoint: &CrawlCheckpoint) -> Result<(), RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let mut checkpoints = self.read_checkpoints().await?;
        checkpoints.insert(
            checkpoint_key(&checkpoint.source_id, &checkpoint.region),
            checkpoint.clone(),
        );
        self.write_checkpoints(&checkpoints).await
    }

    async fn clear(&self, source_id: &str, region: &str) -> Result<(), RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let mut checkpoints = self.read_checkpoints().await?;
        if checkpoints.remove(&checkpoint_key(source_id, region)).is_some() {
            self.write_checkpoints(&checkpoints).await?;
        }
        Ok(())
    }
}

/// 同一存储后端的三个仓库视图
#[derive(Clone)]
pub struct Stores {
    pub organizations: Arc<dyn OrganizationRepository>,
    pub contacts: Arc<dyn ContactRepository>,
    pub checkpoints: Arc<dyn CheckpointRepository>,
}

impl Stores {
    pub fn from_backend<S>(backend: Arc<S>) -> Self
    where
        S: OrganizationRepository + ContactRepository + CheckpointRepository + 'static,
    {
        Self {
            organizations: backend.clone(),
            contacts: backend.clone(),
            checkpoints: backend,
        }
    }
}

/// 存储工厂函数
pub fn create_stores(settings: &StorageSettings) -> Result<Stores, RepositoryError> {
    match settings.storage_type.as_str() {
        "local" => {
            let base_path = settings
                .local_path
                .as_ref()
                .cloned()
                .unwrap_or_else(|| "./data".to_string());
            Ok(Stores::from_backend(Arc::new(LocalStore::new(base_path))))
        }
        "memory" => Ok(Stores::from_backend(Arc::new(MemoryStore::new()))),
        other => Err(RepositoryError::InvalidParameter(format!(
            "不支持的存储类型: {}",
            other
        ))),
    }
}
