// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{church_listing, direct_gateway, sources_settings};
use regcrawl::domain::models::organization::EmailStatus;
use regcrawl::domain::models::progress::{LogSeverity, RunStatus};
use regcrawl::domain::repositories::checkpoint_repository::CheckpointRepository;
use regcrawl::domain::services::collection_service::{CollectionOptions, CollectionService};
use regcrawl::domain::services::reporter::{ChannelReporter, ReportEvent, Reporter};
use regcrawl::infrastructure::storage::MemoryStore;
use regcrawl::sources::registry::SourceRegistry;
use regcrawl::sources::FetchFilters;
use regcrawl::utils::errors::CollectionError;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn service(server: &MockServer, store: Arc<MemoryStore>, api_key: Option<&str>) -> CollectionService {
    let registry = SourceRegistry::from_settings(&sources_settings(&server.uri(), api_key));
    CollectionService::new(
        Arc::new(registry),
        direct_gateway(),
        store.clone(),
        store.clone(),
        store,
    )
}

fn options(regions: &[&str]) -> CollectionOptions {
    CollectionOptions {
        regions: regions.iter().map(|r| r.to_string()).collect(),
        region_delay: Duration::ZERO,
        page_delay: Duration::ZERO,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_church_collection_resumes_from_checkpoint() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryStore::new());

    Mock::given(method("GET"))
        .and(path("/church/search.php"))
        .and(query_param("keyword", "서울"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(church_listing(&["서울중앙교회", "명동교회"], Some(2))),
        )
        .expect(1)
        .mount(&server)
        .await;
    // First request for page 2 fails, the retry in the next run succeeds
    Mock::given(method("GET"))
        .and(path("/church/search.php"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/church/search.php"))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(church_listing(&["정동교회"], None)),
        )
        .mount(&server)
        .await;

    let service = service(&server, store.clone(), None);
    let reporter = Reporter::silent();
    let cancel = CancellationToken::new();

    let first = service
        .collect("church", &options(&["11"]), &reporter, &cancel)
        .await
        .unwrap();
    assert_eq!(first.status, RunStatus::Done);
    assert_eq!(first.collected, 2);
    let outcome = first
        .logs
        .iter()
        .find(|log| log.details.as_deref() == Some("11"))
        .unwrap();
    assert_eq!(outcome.severity, LogSeverity::Warning);

    let checkpoint = store.get("church", "11").await.unwrap().unwrap();
    assert_eq!(checkpoint.last_page, 2);

    let second = service
        .collect("church", &options(&["11"]), &reporter, &cancel)
        .await
        .unwrap();
    assert_eq!(second.collected, 1);
    assert_eq!(second.organizations[0].name, "정동교회");
    assert!(store.get("church", "11").await.unwrap().is_none());

    let rows = store.organizations();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|row| row.category == "church"));
    assert!(rows.iter().all(|row| row.region == "서울특별시"));
    assert!(rows.iter().all(|row| row.email_status == EmailStatus::Pending));
}

#[tokio::test]
async fn test_kindergarten_collection_dedups_across_districts() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryStore::new());

    // Every district returns the same short page
    Mock::given(method("GET"))
        .and(path("/api/notice/basicInfo2.do"))
        .and(query_param("key", "test-key"))
        .and(query_param("sidoCode", "11"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "SUCCESS",
            "kinderInfo": [
                {"kindername": "해님유치원", "establish": "사립(법인)", "hpaddr": "http://sun.kr"},
            ]
        })))
        .mount(&server)
        .await;

    let (channel, mut events) = ChannelReporter::new();
    let reporter = Reporter::new(Arc::new(channel));
    let options = CollectionOptions {
        filters: FetchFilters { private_only: true },
        ..options(&["11"])
    };

    let summary = service(&server, store.clone(), Some("test-key"))
        .collect("kindergarten", &options, &reporter, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.status, RunStatus::Done);
    assert_eq!(summary.collected, 1);
    assert_eq!(summary.skipped_duplicates, 24);
    assert_eq!(store.organizations().len(), 1);
    assert_eq!(store.organizations()[0].region, "서울특별시 종로구");

    let mut saw_log = false;
    while let Ok(event) = events.try_recv() {
        if matches!(event, ReportEvent::Log(_)) {
            saw_log = true;
        }
    }
    assert!(saw_log);
}

#[tokio::test]
async fn test_missing_api_key_fails_before_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = service(&server, Arc::new(MemoryStore::new()), None)
        .collect(
            "academy",
            &options(&[]),
            &Reporter::silent(),
            &CancellationToken::new(),
        )
        .await;

    assert!(matches!(result, Err(CollectionError::Configuration(_))));
}
