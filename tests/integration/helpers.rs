// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use regcrawl::config::settings::{ApiSourceSettings, ScrapeSourceSettings, SourcesSettings};
use regcrawl::engines::gateway::ProxyGateway;
use regcrawl::engines::reqwest_engine::{build_client, DirectEngine, RelayEngine};
use regcrawl::engines::traits::TransportEngine;
use std::sync::Arc;
use std::time::Duration;

/// 只有直连引擎的网关
pub fn direct_gateway() -> Arc<ProxyGateway> {
    let engine: Arc<dyn TransportEngine> =
        Arc::new(DirectEngine::new(build_client().expect("client should build")));
    Arc::new(ProxyGateway::new(vec![engine], Duration::from_secs(5), 50))
}

/// 直连在前、一个中继在后的网关
pub fn relay_gateway(relay_template: &str) -> Arc<ProxyGateway> {
    let client = build_client().expect("client should build");
    let engines: Vec<Arc<dyn TransportEngine>> = vec![
        Arc::new(DirectEngine::new(client.clone())),
        Arc::new(RelayEngine::new(client, relay_template)),
    ];
    Arc::new(ProxyGateway::new(engines, Duration::from_secs(5), 50))
}

/// 所有数据源都指向同一个模拟服务器
pub fn sources_settings(base: &str, api_key: Option<&str>) -> SourcesSettings {
    SourcesSettings {
        kindergarten: ApiSourceSettings {
            endpoint: format!("{}/api/notice/basicInfo2.do", base),
            api_key: api_key.map(str::to_string),
            page_size: 2,
        },
        academy: ApiSourceSettings {
            endpoint: format!("{}/openapi/tn_pubr_public_acdmy_api", base),
            api_key: api_key.map(str::to_string),
            page_size: 2,
        },
        church: ScrapeSourceSettings {
            endpoint: format!("{}/church/search.php?keyword={{keyword}}&page={{page}}", base),
        },
    }
}

/// 一个教会条目：5个跨行单元格加电话，随后是主页、传真、邮箱三行
pub fn church_block(name: &str, homepage: &str) -> String {
    format!(
        r#"<tr>
  <td rowspan="4">{name}</td>
  <td rowspan="4">서울노회</td>
  <td rowspan="4">김목사</td>
  <td rowspan="4">서울</td>
  <td rowspan="4">서울특별시 중구 세종대로 1</td>
  <td>02-111-2222</td>
</tr>
<tr><td>{homepage}</td></tr>
<tr><td>02-111-3333</td></tr>
<tr><td>-</td></tr>
"#
    )
}

/// 教会名录页，`next` 为下一页页码
pub fn church_listing(names: &[&str], next: Option<u32>) -> String {
    let blocks: String = names
        .iter()
        .map(|name| church_block(name, "http://church.example.kr"))
        .collect();
    let pager = next
        .map(|n| format!(r#"<a href="?keyword=%EC%84%9C%EC%9A%B8&amp;page={n}">{n}</a>"#))
        .unwrap_or_default();
    format!(
        "<html><body><table><tr><th>교회명</th><th>노회</th></tr>{}</table><div class=\"paging\">{}</div></body></html>",
        blocks, pager
    )
}

/// 足够长的HTML页面
pub fn html_page(body: &str) -> String {
    format!(
        "<!doctype html><html><head><title>홈페이지</title></head><body><div>{}</div><footer>주소: 서울특별시</footer></body></html>",
        body
    )
}
