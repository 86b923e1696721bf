// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

#[cfg(test)]
mod tests {
    use crate::domain::models::checkpoint::CrawlCheckpoint;
    use crate::domain::repositories::checkpoint_repository::CheckpointRepository;
    use crate::engines::gateway::ProxyGateway;
    use crate::engines::traits::{EngineError, FetchRequest, FetchResponse, TransportEngine};
    use crate::infrastructure::storage::MemoryStore;
    use crate::sources::html_scrape::{has_next_page, parse_listing, HtmlScrapeAdapter};
    use crate::sources::regions::RegionTable;
    use crate::domain::models::progress::RunStatus;
    use crate::domain::models::source::{AdapterKind, AuthConfig, SourceDescriptor};
    use crate::domain::services::collection_service::{CollectionOptions, CollectionService};
    use crate::domain::services::reporter::Reporter;
    use crate::sources::registry::SourceRegistry;
    use crate::sources::{FetchEnd, FetchFilters, PageSpan, SourceAdapter};
    use crate::utils::errors::RepositoryError;
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    fn block(name: &str, homepage: &str, email: &str) -> String {
        format!(
            r#"<tr class="row">
  <td rowspan="4">{name}</td>
  <td rowspan="4">서울노회</td>
  <td rowspan="4">홍길동</td>
  <td rowspan="4">서울</td>
  <td rowspan="4">서울특별시 종로구 1</td>
  <td>02-123-4567</td>
</tr>
<tr><td><a href="{homepage}">{homepage}</a></td></tr>
<tr><td>02-765-4321</td></tr>
<tr><td>{email}</td></tr>
"#
        )
    }

    fn listing(names: &[&str], next: Option<u32>) -> String {
        let blocks: String = names
            .iter()
            .map(|name| block(name, "http://church.kr", "-"))
            .collect();
        let pager = next
            .map(|n| format!(r#"<a href="/church/search.php?keyword=%EC%84%9C%EC%9A%B8&amp;page={n}">{n}</a>"#))
            .unwrap_or_default();
        format!(
            "<html><body><table><tr><th>교회명</th></tr>{}</table><div class=\"paging\">{}</div></body></html>",
            blocks, pager
        )
    }

    #[test]
    fn test_parse_listing_primary_blocks() {
        let html = format!(
            "<table>{}{}</table>",
            block("새빛&amp;교회", "http://newlight.kr", "info@newlight.kr"),
            block("은혜교회", "-", "-")
        );

        let entries = parse_listing(&html);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "새빛&교회");
        assert_eq!(entries[0].org_type, "서울노회");
        assert_eq!(entries[0].representative, "홍길동");
        assert_eq!(entries[0].region_label, "서울");
        assert_eq!(entries[0].address, "서울특별시 종로구 1");
        assert_eq!(entries[0].phone, "02-123-4567");
        assert_eq!(entries[0].homepage, "http://newlight.kr");
        assert_eq!(entries[0].fax, "02-765-4321");
        assert_eq!(entries[0].email, "info@newlight.kr");
        assert_eq!(entries[1].name, "은혜교회");
    }

    #[test]
    fn test_parse_listing_falls_back_to_row_walker() {
        // Satellite rows missing entirely, so the structured pattern never matches
        let html = r#"<table>
            <tr><td rowspan="1">소망교회</td><td rowspan="1">부산노회</td><td rowspan="1">김</td>
                <td rowspan="1">부산</td><td rowspan="1">부산 해운대구</td><td>051-1</td></tr>
            <tr><td rowspan="2">사랑교회</td><td rowspan="2">부산노회</td><td rowspan="2">이</td>
                <td rowspan="2">부산</td><td rowspan="2">부산 수영구</td><td>051-2</td></tr>
            <tr><td>http://love.kr</td></tr>
        </table>"#;

        let entries = parse_listing(html);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "소망교회");
        assert_eq!(entries[0].homepage, "");
        assert_eq!(entries[1].name, "사랑교회");
        assert_eq!(entries[1].homepage, "http://love.kr");
    }

    #[test]
    fn test_parse_listing_drifted_markup_is_empty() {
        assert!(parse_listing("<html><body><p>점검 중입니다</p></body></html>").is_empty());
        assert!(parse_listing("").is_empty());
    }

    #[test]
    fn test_has_next_page() {
        let html = listing(&["가"], Some(3));
        assert!(has_next_page(&html, 2));
        assert!(!has_next_page(&html, 3));
        assert!(!has_next_page(&listing(&["가"], None), 1));
    }

    /// 按页码返回预设页面的引擎，可在指定页之后触发取消或在指定页失败
    struct ScriptedEngine {
        pages: HashMap<u32, String>,
        failing: HashSet<u32>,
        cancel_after: Option<(u32, CancellationToken)>,
        requested: parking_lot::Mutex<Vec<u32>>,
    }

    impl ScriptedEngine {
        fn new(pages: HashMap<u32, String>) -> Self {
            Self {
                pages,
                failing: HashSet::new(),
                cancel_after: None,
                requested: parking_lot::Mutex::new(Vec::new()),
            }
        }

        fn requested(&self) -> Vec<u32> {
            self.requested.lock().clone()
        }
    }

    fn page_of(url: &str) -> u32 {
        url::Url::parse(url)
            .ok()
            .and_then(|u| {
                u.query_pairs()
                    .find(|(k, _)| k == "page")
                    .and_then(|(_, v)| v.parse().ok())
            })
            .unwrap_or(0)
    }

    #[async_trait]
    impl TransportEngine for ScriptedEngine {
        async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, EngineError> {
            let page = page_of(&request.url);
            self.requested.lock().push(page);

            if self.failing.contains(&page) {
                return Err(EngineError::Other("connection reset".to_string()));
            }
            if let Some((after, token)) = &self.cancel_after {
                if *after == page {
                    token.cancel();
                }
            }
            self.pages
                .get(&page)
                .map(|html| FetchResponse::ok(html.clone()))
                .ok_or(EngineError::Status(404))
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn three_pages() -> HashMap<u32, String> {
        HashMap::from([
            (1, listing(&["교회1", "교회2"], Some(2))),
            (2, listing(&["교회3"], Some(3))),
            (3, listing(&["교회4"], None)),
        ])
    }

    fn adapter(engine: Arc<ScriptedEngine>, store: Arc<MemoryStore>) -> HtmlScrapeAdapter {
        let engine: Arc<dyn TransportEngine> = engine;
        let gateway = Arc::new(ProxyGateway::new(vec![engine], Duration::from_secs(5), 10));
        HtmlScrapeAdapter::new(
            "church",
            "https://directory.test/church/search.php?keyword={keyword}&page={page}",
            gateway,
            store,
            Duration::ZERO,
        )
    }

    #[test]
    fn test_page_url_encodes_keyword() {
        let engine = Arc::new(ScriptedEngine::new(HashMap::new()));
        let adapter = adapter(engine, Arc::new(MemoryStore::new()));
        let table = RegionTable::korea_provinces();
        let url = adapter.page_url(table.find("11").unwrap(), 4);
        assert_eq!(
            url,
            "https://directory.test/church/search.php?keyword=%EC%84%9C%EC%9A%B8&page=4"
        );
    }

    #[tokio::test]
    async fn test_full_run_clears_checkpoint() {
        let engine = Arc::new(ScriptedEngine::new(three_pages()));
        let store = Arc::new(MemoryStore::new());
        let adapter = adapter(engine.clone(), store.clone());
        let table = RegionTable::korea_provinces();
        let seoul = table.find("11").unwrap();
        store.save(&CrawlCheckpoint::new("church", "11", 1)).await.unwrap();

        let result = adapter
            .fetch_region(seoul, &FetchFilters::default(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.end, FetchEnd::Exhausted);
        let names: Vec<_> = result.organizations.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["교회1", "교회2", "교회3", "교회4"]);
        assert_eq!(result.organizations[0].region, "서울특별시");
        assert_eq!(result.organizations[0].homepage, "http://church.kr");
        assert!(result.organizations[0].email.is_none());
        assert_eq!(engine.requested(), vec![1, 2, 3]);
        assert!(store.get("church", "11").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cancel_then_resume_never_repeats_processed_pages() {
        let cancel = CancellationToken::new();
        let mut first = ScriptedEngine::new(three_pages());
        first.cancel_after = Some((2, cancel.clone()));
        let first = Arc::new(first);
        let store = Arc::new(MemoryStore::new());
        let table = RegionTable::korea_provinces();
        let seoul = table.find("11").unwrap();

        let result = adapter(first.clone(), store.clone())
            .fetch_region(seoul, &FetchFilters::default(), &cancel)
            .await
            .unwrap();

        assert!(result.is_cancelled());
        assert_eq!(result.organizations.len(), 3);
        assert_eq!(
            result.pages,
            vec![PageSpan { page: 1, start: 0 }, PageSpan { page: 2, start: 2 }]
        );
        assert_eq!(result.page_of(1), Some(1));
        assert_eq!(result.page_of(2), Some(2));
        assert_eq!(first.requested(), vec![1, 2]);
        assert_eq!(store.get("church", "11").await.unwrap().unwrap().last_page, 3);

        let second = Arc::new(ScriptedEngine::new(three_pages()));
        let resumed = adapter(second.clone(), store.clone());
        assert_eq!(
            resumed.as_resumable().unwrap().resume_page(seoul).await.unwrap(),
            Some(3)
        );

        let result = resumed
            .fetch_region(seoul, &FetchFilters::default(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.end, FetchEnd::Exhausted);
        assert_eq!(second.requested(), vec![3]);
        assert_eq!(result.organizations[0].name, "교회4");
        assert!(store.get("church", "11").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_transport_failure_keeps_current_page() {
        let mut engine = ScriptedEngine::new(three_pages());
        engine.failing.insert(2);
        let engine = Arc::new(engine);
        let store = Arc::new(MemoryStore::new());
        let table = RegionTable::korea_provinces();
        let seoul = table.find("11").unwrap();

        let result = adapter(engine, store.clone())
            .fetch_region(seoul, &FetchFilters::default(), &CancellationToken::new())
            .await
            .unwrap();

        assert!(matches!(result.end, FetchEnd::Interrupted(_)));
        assert_eq!(result.organizations.len(), 2);
        assert_eq!(store.get("church", "11").await.unwrap().unwrap().last_page, 2);
    }

    #[tokio::test]
    async fn test_reset_clears_checkpoint() {
        let store = Arc::new(MemoryStore::new());
        store.save(&CrawlCheckpoint::new("church", "26", 5)).await.unwrap();
        let adapter = adapter(Arc::new(ScriptedEngine::new(HashMap::new())), store.clone());
        let table = RegionTable::korea_provinces();
        let busan = table.find("26").unwrap();

        let resumable = adapter.as_resumable().unwrap();
        assert_eq!(resumable.resume_page(busan).await.unwrap(), Some(5));
        resumable.reset(busan).await.unwrap();
        assert_eq!(resumable.resume_page(busan).await.unwrap(), None);
    }

    struct BrokenCheckpoints;

    #[async_trait]
    impl CheckpointRepository for BrokenCheckpoints {
        async fn get(
            &self,
            _source_id: &str,
            _region: &str,
        ) -> Result<Option<CrawlCheckpoint>, RepositoryError> {
            Ok(None)
        }

        async fn save(&self, _checkpoint: &CrawlCheckpoint) -> Result<(), RepositoryError> {
            Err(RepositoryError::StorageError("disk full".to_string()))
        }

        async fn clear(&self, _source_id: &str, _region: &str) -> Result<(), RepositoryError> {
            Err(RepositoryError::StorageError("disk full".to_string()))
        }
    }

    #[tokio::test]
    async fn test_checkpoint_write_failure_keeps_parsed_pages() {
        let table = RegionTable::korea_provinces();
        let seoul = table.find("11").unwrap();
        let broken = |pages: HashMap<u32, String>| {
            let engine: Arc<dyn TransportEngine> = Arc::new(ScriptedEngine::new(pages));
            HtmlScrapeAdapter::new(
                "church",
                "https://directory.test/church/search.php?keyword={keyword}&page={page}",
                Arc::new(ProxyGateway::new(vec![engine], Duration::from_secs(5), 10)),
                Arc::new(BrokenCheckpoints),
                Duration::ZERO,
            )
        };

        let result = broken(three_pages())
            .fetch_region(seoul, &FetchFilters::default(), &CancellationToken::new())
            .await
            .unwrap();
        assert!(matches!(result.end, FetchEnd::Interrupted(_)));
        assert_eq!(result.organizations.len(), 2);

        let single = HashMap::from([(1, listing(&["교회1"], None))]);
        let result = broken(single)
            .fetch_region(seoul, &FetchFilters::default(), &CancellationToken::new())
            .await
            .unwrap();
        assert!(matches!(result.end, FetchEnd::Interrupted(_)));
        assert_eq!(result.organizations.len(), 1);
    }

    fn church_descriptor() -> SourceDescriptor {
        SourceDescriptor {
            id: "church".to_string(),
            display_name: "교회".to_string(),
            category: "church".to_string(),
            kind: AdapterKind::HtmlScrape {
                endpoint: "https://directory.test/church/search.php?keyword={keyword}&page={page}"
                    .to_string(),
            },
            auth: AuthConfig::none(),
            regions: RegionTable::korea_provinces(),
        }
    }

    #[tokio::test]
    async fn test_budget_cut_then_resume_collects_every_record() {
        let store = Arc::new(MemoryStore::new());
        let service = CollectionService::new(
            Arc::new(SourceRegistry::new(vec![church_descriptor()])),
            Arc::new(ProxyGateway::new(Vec::new(), Duration::from_secs(1), 10)),
            store.clone(),
            store.clone(),
            store.clone(),
        );
        let options = CollectionOptions {
            regions: vec!["11".to_string()],
            region_delay: Duration::ZERO,
            page_delay: Duration::ZERO,
            ..Default::default()
        };

        let cancel = CancellationToken::new();
        let mut first = ScriptedEngine::new(three_pages());
        first.cancel_after = Some((2, cancel.clone()));
        let budgeted = CollectionOptions {
            max_items: Some(1),
            ..options.clone()
        };
        let summary = service
            .run(
                &church_descriptor(),
                &adapter(Arc::new(first), store.clone()),
                &budgeted,
                &Reporter::silent(),
                &cancel,
            )
            .await
            .unwrap();

        assert_eq!(summary.status, RunStatus::Aborted);
        assert_eq!(summary.collected, 1);
        // 교회2 was cut by the budget, so page 1 is fetched again
        assert_eq!(store.get("church", "11").await.unwrap().unwrap().last_page, 1);

        let second = Arc::new(ScriptedEngine::new(three_pages()));
        let summary = service
            .run(
                &church_descriptor(),
                &adapter(second.clone(), store.clone()),
                &options,
                &Reporter::silent(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(summary.status, RunStatus::Done);
        assert_eq!(second.requested(), vec![1, 2, 3]);
        assert_eq!(summary.skipped_duplicates, 1);
        let names: Vec<_> = store.organizations().into_iter().map(|row| row.name).collect();
        assert_eq!(names, vec!["교회1", "교회2", "교회3", "교회4"]);
        assert!(store.get("church", "11").await.unwrap().is_none());
    }
}
