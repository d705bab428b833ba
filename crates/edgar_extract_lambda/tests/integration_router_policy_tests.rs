mod support;

use std::sync::Arc;

use edgar_extract_lambda::adapters::extractor::FilingExtractor;
use edgar_extract_lambda::handlers::http::HttpRequest;
use support::fakes::FixedExtractor;
use support::harness::{
    extract_body, RouterHarnessBuilder, APP_ORIGIN, SCENARIO_CIK, SCENARIO_FILING_DATE,
};

fn counted_harness() -> (support::harness::RouterHarness, Arc<FixedExtractor>) {
    let extractor = Arc::new(FixedExtractor::default());
    let harness = RouterHarnessBuilder::default()
        .with_extractor(Arc::clone(&extractor) as Arc<dyn FilingExtractor>)
        .build();
    (harness, extractor)
}

#[tokio::test]
async fn unknown_paths_are_not_found() {
    let (harness, extractor) = counted_harness();

    for (method, path) in [("POST", "/extracts"), ("GET", "/"), ("POST", "/filings/extract")] {
        let response = harness
            .router
            .dispatch(
                HttpRequest::new(method, path)
                    .with_body(extract_body(SCENARIO_CIK, SCENARIO_FILING_DATE)),
            )
            .await;
        assert_eq!(response.status_code, 404, "{method} {path}");
        assert_eq!(response.json_body().expect("json")["error"], "not_found");
    }

    assert_eq!(extractor.calls(), 0);
    assert!(harness.store().is_empty());
}

#[tokio::test]
async fn methods_other_than_post_on_extract_are_not_found() {
    let (harness, extractor) = counted_harness();

    for method in ["GET", "PUT", "DELETE", "PATCH", "HEAD"] {
        let response = harness
            .router
            .dispatch(
                HttpRequest::new(method, "/extract")
                    .with_header("origin", APP_ORIGIN)
                    .with_body(extract_body(SCENARIO_CIK, SCENARIO_FILING_DATE)),
            )
            .await;
        assert_eq!(response.status_code, 404, "{method} /extract");
        assert_eq!(response.json_body().expect("json")["error"], "not_found");
        assert_eq!(response.header("allow"), None);
    }

    assert_eq!(extractor.calls(), 0);
    assert!(harness.store().is_empty());
}

#[tokio::test]
async fn disallowed_origins_never_dispatch() {
    let (harness, extractor) = counted_harness();

    let response = harness
        .router
        .dispatch(
            HttpRequest::new("POST", "/extract")
                .with_header("Origin", "https://evil.example.net")
                .with_body(extract_body(SCENARIO_CIK, SCENARIO_FILING_DATE)),
        )
        .await;

    assert_eq!(response.status_code, 403);
    assert_eq!(response.json_body().expect("json")["error"], "cors_rejected");
    assert_eq!(response.header("access-control-allow-origin"), None);
    assert_eq!(extractor.calls(), 0);
    assert!(harness.store().is_empty());
}

#[tokio::test]
async fn preflight_advertises_policy_for_allowed_origin() {
    let (harness, extractor) = counted_harness();

    let response = harness
        .router
        .dispatch(
            HttpRequest::new("OPTIONS", "/extract")
                .with_header("Origin", APP_ORIGIN)
                .with_header("Access-Control-Request-Method", "POST")
                .with_header("Access-Control-Request-Headers", "content-type"),
        )
        .await;

    assert_eq!(response.status_code, 204);
    assert_eq!(response.header("access-control-allow-origin"), Some(APP_ORIGIN));
    assert_eq!(response.header("access-control-allow-methods"), Some("POST"));
    assert_eq!(
        response.header("access-control-allow-headers"),
        Some("content-type")
    );
    assert_eq!(response.header("access-control-max-age"), Some("600"));
    assert_eq!(response.header("vary"), Some("Origin"));
    assert!(response.body.is_empty());
    assert_eq!(extractor.calls(), 0);
}

#[tokio::test]
async fn preflight_rejects_unrouted_methods_and_unknown_origins() {
    let (harness, _extractor) = counted_harness();

    let wrong_method = harness
        .router
        .dispatch(
            HttpRequest::new("OPTIONS", "/extract")
                .with_header("Origin", APP_ORIGIN)
                .with_header("Access-Control-Request-Method", "GET"),
        )
        .await;
    assert_eq!(wrong_method.status_code, 403);

    let wrong_origin = harness
        .router
        .dispatch(
            HttpRequest::new("OPTIONS", "/extract")
                .with_header("Origin", "https://evil.example.net")
                .with_header("Access-Control-Request-Method", "POST"),
        )
        .await;
    assert_eq!(wrong_origin.status_code, 403);

    let no_origin = harness
        .router
        .dispatch(
            HttpRequest::new("OPTIONS", "/extract")
                .with_header("Access-Control-Request-Method", "POST"),
        )
        .await;
    assert_eq!(no_origin.status_code, 403);
}

#[tokio::test]
async fn apigw_events_route_through_the_same_policy() {
    let (harness, extractor) = counted_harness();

    let event = serde_json::json!({
        "version": "2.0",
        "rawPath": "/extract",
        "requestContext": {"http": {"method": "POST"}},
        "headers": {"origin": APP_ORIGIN, "content-type": "application/json"},
        "body": extract_body(SCENARIO_CIK, SCENARIO_FILING_DATE),
        "isBase64Encoded": false
    });
    let request = HttpRequest::from_apigw_event(event).expect("event should parse");

    let response = harness.router.dispatch(request).await;

    assert_eq!(response.status_code, 201);
    assert_eq!(response.header("access-control-allow-origin"), Some(APP_ORIGIN));
    assert_eq!(extractor.calls(), 1);
    assert_eq!(harness.store().len(), 1);
}
