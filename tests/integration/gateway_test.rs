// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{direct_gateway, html_page, relay_gateway};
use regcrawl::engines::validators::PayloadKind;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_relay_serves_when_direct_is_blocked() {
    let origin = MockServer::start().await;
    let relay = MockServer::start().await;
    let target = format!("{}/about", origin.uri());

    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&origin)
        .await;
    Mock::given(method("GET"))
        .and(path("/raw"))
        .and(query_param("url", target.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string(html_page("via relay")))
        .expect(1)
        .mount(&relay)
        .await;

    let gateway = relay_gateway(&format!("{}/raw?url={{url}}", relay.uri()));
    let content = gateway
        .fetch(&target, PayloadKind::Html, &CancellationToken::new())
        .await
        .unwrap();

    assert!(content.unwrap().contains("via relay"));
    let stats = gateway.get_engine_stats();
    assert_eq!(stats["direct"].failure_count, 1);
    assert_eq!(stats.values().map(|s| s.success_count).sum::<u64>(), 1);
}

#[tokio::test]
async fn test_relay_error_page_is_rejected() {
    let origin = MockServer::start().await;
    let relay = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&origin)
        .await;
    // Relays answer 200 with a short error text when the upstream fails
    Mock::given(method("GET"))
        .and(path("/raw"))
        .respond_with(ResponseTemplate::new(200).set_body_string("upstream error"))
        .mount(&relay)
        .await;

    let gateway = relay_gateway(&format!("{}/raw?url={{url}}", relay.uri()));
    let content = gateway
        .fetch(
            &format!("{}/page", origin.uri()),
            PayloadKind::Html,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(content.is_none());
}

#[tokio::test]
async fn test_json_payload_must_parse() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":"SUCCESS"}"#))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let gateway = direct_gateway();
    let cancel = CancellationToken::new();

    let ok = gateway
        .fetch(&format!("{}/ok", server.uri()), PayloadKind::Json, &cancel)
        .await
        .unwrap();
    assert_eq!(ok.as_deref(), Some(r#"{"status":"SUCCESS"}"#));

    let broken = gateway
        .fetch(&format!("{}/broken", server.uri()), PayloadKind::Json, &cancel)
        .await
        .unwrap();
    assert!(broken.is_none());
}

#[tokio::test]
async fn test_cancelled_token_skips_all_engines() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html_page("never")))
        .expect(0)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = direct_gateway()
        .fetch(&format!("{}/x", server.uri()), PayloadKind::Html, &cancel)
        .await;
    assert!(result.is_err());
}
