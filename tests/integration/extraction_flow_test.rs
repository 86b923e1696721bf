// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{direct_gateway, html_page};
use regcrawl::domain::models::organization::{CollectedOrganization, EmailStatus};
use regcrawl::domain::models::progress::RunStatus;
use regcrawl::domain::services::email_service::{EmailExtractionService, ExtractionOptions};
use regcrawl::domain::services::persistence_service::PersistenceSink;
use regcrawl::domain::services::reporter::Reporter;
use regcrawl::infrastructure::storage::{LocalStore, MemoryStore};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn organization(name: &str, homepage: &str) -> CollectedOrganization {
    let mut org = CollectedOrganization::new(name, "부산광역시");
    org.homepage = homepage.to_string();
    org
}

fn options() -> ExtractionOptions {
    ExtractionOptions {
        category: None,
        target_delay: Duration::ZERO,
    }
}

async fn mount_site(server: &MockServer, site: &str, email: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/{}", site)))
        .respond_with(ResponseTemplate::new(200).set_body_string(html_page(&format!(
            r#"<p>문의: <a href="mailto:{email}">{email}</a></p>"#
        ))))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_extraction_counts_and_statuses() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryStore::new());

    for i in [1, 2, 4, 5] {
        mount_site(&server, &format!("site{}", i), &format!("office{}@school.kr", i)).await;
    }
    Mock::given(method("GET"))
        .and(path("/site3"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let sink = PersistenceSink::new(store.clone(), store.clone());
    let orgs: Vec<_> = (1..=5)
        .map(|i| organization(&format!("학원{}", i), &format!("{}/site{}", server.uri(), i)))
        .collect();
    sink.append(&orgs, "academy").await.unwrap();

    let reporter = Reporter::silent();
    let summary = EmailExtractionService::new(direct_gateway(), store.clone(), store.clone())
        .extract(&options(), &reporter, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.status, RunStatus::Done);
    assert_eq!(summary.total, 5);
    assert_eq!(summary.success, 4);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.emails.len(), 4);

    let target_logs = reporter
        .logs()
        .into_iter()
        .filter(|log| log.details.is_some())
        .count();
    assert_eq!(target_logs, 5);

    let statuses: Vec<_> = store
        .organizations()
        .iter()
        .map(|row| row.email_status)
        .collect();
    assert_eq!(
        statuses,
        vec![
            EmailStatus::Resolved,
            EmailStatus::Resolved,
            EmailStatus::Failed,
            EmailStatus::Resolved,
            EmailStatus::Resolved,
        ]
    );
    let contacts = store.contacts();
    assert_eq!(contacts.len(), 4);
    assert_eq!(contacts[0].email, "office1@school.kr");
    assert_eq!(contacts[0].category, "academy");

    // Resolved and failed rows are no longer targets
    let rerun = EmailExtractionService::new(direct_gateway(), store.clone(), store)
        .extract(&options(), &Reporter::silent(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(rerun.total, 0);
}

#[tokio::test]
async fn test_extraction_on_file_store() {
    let server = MockServer::start().await;
    mount_site(&server, "church", "pastor@grace.kr").await;

    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(LocalStore::new(dir.path()));
    let sink = PersistenceSink::new(store.clone(), store.clone());
    sink.append(
        &[
            organization("은혜교회", &format!("{}/church", server.uri())),
            organization("소망교회", "-"),
        ],
        "church",
    )
    .await
    .unwrap();

    let summary = EmailExtractionService::new(direct_gateway(), store.clone(), store.clone())
        .extract(&options(), &Reporter::silent(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(summary.total, 1);
    assert_eq!(summary.success, 1);

    // A fresh store over the same directory sees the written statuses
    let reopened = Arc::new(LocalStore::new(dir.path()));
    let rerun = EmailExtractionService::new(direct_gateway(), reopened.clone(), reopened)
        .extract(&options(), &Reporter::silent(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(rerun.total, 0);
}
