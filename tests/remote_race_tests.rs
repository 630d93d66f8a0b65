//! Remote race behaviour with stub services, plus the two HTTP services
//! against a local mock server.

mod common;

use autoqr::error::RemoteError;
use autoqr::models::FailReason;
use autoqr::remote::{QrApi, RemoteRace, RemoteService, ZxingOrg};
use autoqr::{CacheEntry, ImageTarget, ScanTarget, Size};
use common::{Answer, CountingBitmap, CountingPixel, StubLoader, gray_bitmap, remote, stub_scanner};
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const IMAGE_URL: &str = "https://cdn.example.com/codes/qr.png";

fn url_target(url: &str) -> ScanTarget {
    ScanTarget::image(ImageTarget::new(url, Size::new(300, 300), Size::new(300, 300)))
}

#[tokio::test]
async fn test_slower_success_beats_earlier_failure() {
    let race = RemoteRace::new(
        vec![
            remote("zxing.org", 50, Ok("from service one")),
            remote("2dcode.biz", 10, Err("nothing found")),
        ],
        Duration::from_secs(2),
    );

    let hit = race.race(IMAGE_URL).await.unwrap();
    assert_eq!(hit.text, "from service one");
    assert_eq!(hit.source, "zxing.org");
}

#[tokio::test]
async fn test_faster_success_wins() {
    let race = RemoteRace::new(
        vec![
            remote("zxing.org", 200, Ok("slow")),
            remote("2dcode.biz", 10, Ok("fast")),
        ],
        Duration::from_secs(2),
    );

    let started = Instant::now();
    let hit = race.race(IMAGE_URL).await.unwrap();
    assert_eq!(hit.source, "2dcode.biz");
    assert!(started.elapsed() < Duration::from_millis(200));
}

#[tokio::test]
async fn test_all_failures_are_reported() {
    let race = RemoteRace::new(
        vec![
            remote("zxing.org", 5, Err("no barcode")),
            remote("2dcode.biz", 15, Err("bad image")),
        ],
        Duration::from_secs(2),
    );

    let errors = race.race(IMAGE_URL).await.unwrap_err();
    assert_eq!(errors.len(), 2);
    assert!(
        errors
            .iter()
            .all(|err| matches!(err, RemoteError::Rejected { .. }))
    );
}

#[tokio::test]
async fn test_hung_service_times_out() {
    let race = RemoteRace::new(
        vec![
            remote("zxing.org", 5_000, Ok("too late")),
            remote("2dcode.biz", 5, Err("bad image")),
        ],
        Duration::from_millis(50),
    );

    let started = Instant::now();
    let errors = race.race(IMAGE_URL).await.unwrap_err();
    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(
        errors
            .iter()
            .any(|err| matches!(err, RemoteError::Timeout { service, .. } if service == "zxing.org"))
    );
}

#[tokio::test]
async fn test_remote_scan_records_source_label() {
    let scanner = stub_scanner(
        StubLoader::serving(gray_bitmap(10, 10)),
        CountingPixel::new("JSQR", Answer::Never, ""),
        CountingBitmap::new(Answer::Never, ""),
        RemoteRace::new(
            vec![
                remote("zxing.org", 40, Ok("remote text")),
                remote("2dcode.biz", 5, Err("nope")),
            ],
            Duration::from_secs(2),
        ),
    );
    let target = url_target(IMAGE_URL);

    let entry = scanner.remote_scan(&target).await;
    assert_eq!(entry, CacheEntry::success("remote text", "zxing.org"));
    assert!(target.has_qr());
    assert_eq!(scanner.cached(&target), Some(entry));
}

#[tokio::test]
async fn test_remote_scan_failure_is_cached() {
    let scanner = stub_scanner(
        StubLoader::serving(gray_bitmap(10, 10)),
        CountingPixel::new("JSQR", Answer::Never, ""),
        CountingBitmap::new(Answer::Never, ""),
        RemoteRace::new(
            vec![
                remote("zxing.org", 5, Err("no")),
                remote("2dcode.biz", 5, Err("no")),
            ],
            Duration::from_secs(2),
        ),
    );
    let target = url_target(IMAGE_URL);

    let entry = scanner.remote_scan(&target).await;
    assert_eq!(entry, CacheEntry::failed(FailReason::RemoteAllFailed));
    assert!(!target.has_qr());
}

#[tokio::test]
async fn test_data_url_is_not_raced() {
    let scanner = stub_scanner(
        StubLoader::broken(),
        CountingPixel::new("JSQR", Answer::Never, ""),
        CountingBitmap::new(Answer::Never, ""),
        RemoteRace::new(
            vec![remote("zxing.org", 5, Ok("never asked"))],
            Duration::from_secs(2),
        ),
    );
    let data = url_target("data:image/png;base64,AAAA");

    let entry = scanner.remote_scan(&data).await;
    assert_eq!(entry, CacheEntry::failed(FailReason::RemoteAllFailed));
}

#[tokio::test]
async fn test_zxing_org_parses_result_page() {
    let server = MockServer::start().await;
    let page = r#"<html><body><table>
<tr><td>Parsed Result Type</td><td>TEXT</td></tr>
<tr><td>Parsed Result</td><td><pre>Tom &amp; Jerry</pre></td></tr>
</table></body></html>"#;
    Mock::given(method("GET"))
        .and(path("/w/decode"))
        .and(query_param("u", IMAGE_URL))
        .respond_with(ResponseTemplate::new(200).set_body_string(page))
        .expect(1)
        .mount(&server)
        .await;

    let service = ZxingOrg::new(Client::new(), &format!("{}/w/decode", server.uri()));
    assert_eq!(service.decode_url(IMAGE_URL).await.unwrap(), "Tom & Jerry");
}

#[tokio::test]
async fn test_zxing_org_without_result_is_no_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/w/decode"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html>No barcode was found</html>"),
        )
        .mount(&server)
        .await;

    let service = ZxingOrg::new(Client::new(), &format!("{}/w/decode", server.uri()));
    assert!(matches!(
        service.decode_url(IMAGE_URL).await,
        Err(RemoteError::NoPayload { .. })
    ));
}

#[tokio::test]
async fn test_zxing_org_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let service = ZxingOrg::new(Client::new(), &format!("{}/w/decode", server.uri()));
    assert!(matches!(
        service.decode_url(IMAGE_URL).await,
        Err(RemoteError::Http { .. })
    ));
}

#[tokio::test]
async fn test_qr_api_reads_first_content() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/read-qr-code"))
        .and(query_param("file_url", IMAGE_URL))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "message": "ok",
            "data": { "contents": ["WIFI:S:home;T:WPA;P:secret;;"] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let service = QrApi::new(Client::new(), &format!("{}/v1/read-qr-code", server.uri()));
    assert_eq!(
        service.decode_url(IMAGE_URL).await.unwrap(),
        "WIFI:S:home;T:WPA;P:secret;;"
    );
}

#[tokio::test]
async fn test_qr_api_error_code_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/read-qr-code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 10002,
            "message": "qr code not recognized"
        })))
        .mount(&server)
        .await;

    let service = QrApi::new(Client::new(), &format!("{}/v1/read-qr-code", server.uri()));
    let err = service.decode_url(IMAGE_URL).await.unwrap_err();
    assert!(
        matches!(err, RemoteError::Rejected { ref message, .. } if message == "qr code not recognized")
    );
}

#[tokio::test]
async fn test_mocked_services_race_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/w/decode"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html>No barcode was found</html>")
                .set_delay(Duration::from_millis(10)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/read-qr-code"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "code": 0, "data": { "contents": ["raced"] } }))
                .set_delay(Duration::from_millis(60)),
        )
        .mount(&server)
        .await;

    let client = Client::new();
    let services: Vec<Arc<dyn RemoteService>> = vec![
        Arc::new(ZxingOrg::new(
            client.clone(),
            &format!("{}/w/decode", server.uri()),
        )),
        Arc::new(QrApi::new(
            client,
            &format!("{}/v1/read-qr-code", server.uri()),
        )),
    ];
    let race = RemoteRace::new(services, Duration::from_secs(5));

    let hit = race.race(IMAGE_URL).await.unwrap();
    assert_eq!(hit.text, "raced");
    assert_eq!(hit.source, "2dcode.biz");
}
