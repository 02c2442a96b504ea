use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use tower::util::ServiceExt;

use biblenames::handlers::{AppState, router};
use biblenames::rate_limit::RateLimiterLayer;
use biblenames_db::{BibleNames, LoadMode};

fn make_state(disable_cache: bool) -> AppState {
    let data_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data");
    let names = BibleNames::load_with_mode(&data_dir, LoadMode::Owned).unwrap();
    AppState {
        names: Arc::new(names),
        disable_cache,
    }
}

async fn get(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body_bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    let body = serde_json::from_slice(&body_bytes).unwrap_or(serde_json::Value::Null);
    (status, body)
}

#[tokio::test]
async fn healthz_ok() {
    let app = router(make_state(false));
    let response = app
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn locales_endpoint_lists_bundled_locales() {
    let (status, body) = get(router(make_state(false)), "/v1/locales").await;
    assert_eq!(status, StatusCode::OK);
    let locales = body["locales"].as_array().unwrap();
    assert_eq!(locales.len(), 2);
    assert_eq!(locales[0]["id"], "en");
    assert_eq!(locales[0]["books"], 66);
    assert!(locales[0]["evicted"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn resolve_endpoint_returns_books_and_divisions() {
    let state = make_state(false);
    let (status, body) = get(router(state.clone()), "/v1/resolve?locale=en&q=I%20Cor").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kind"], "book");
    assert_eq!(body["target"], "CO1");
    assert_eq!(body["name"], "1 Corinthians");

    let (status, body) = get(router(state), "/v1/resolve?locale=en&q=torah").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kind"], "division");
    assert_eq!(body["target"], "PT");
    assert_eq!(body["members"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn resolve_endpoint_sets_cache_headers_unless_disabled() {
    let uri = "/v1/resolve?locale=en&q=Gen";
    let request = || Request::builder().uri(uri).body(Body::empty()).unwrap();

    let response = router(make_state(false)).oneshot(request()).await.unwrap();
    assert!(response.headers().contains_key(header::CACHE_CONTROL));

    let response = router(make_state(true)).oneshot(request()).await.unwrap();
    assert!(!response.headers().contains_key(header::CACHE_CONTROL));
}

#[tokio::test]
async fn resolve_endpoint_maps_errors() {
    let state = make_state(false);

    let (status, body) = get(router(state.clone()), "/v1/resolve?locale=en&q=%20").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap_or_default().contains("empty"));

    let (status, _) = get(router(state.clone()), "/v1/resolve?q=Gen").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = get(router(state.clone()), "/v1/resolve?locale=fr&q=Gen").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap_or_default().contains("fr"));

    // Shared prefixes are evicted, so "Jo" is a plain miss.
    let (status, _) = get(router(state), "/v1/resolve?locale=en&q=Jo").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn names_endpoint_returns_the_localized_record() {
    let state = make_state(false);
    let (status, body) = get(router(state.clone()), "/v1/names/ru/co1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], "CO1");
    assert_eq!(body["default_name"], "1-е Коринфянам");
    assert_eq!(body["divisions"], serde_json::json!(["NT"]));

    let (status, _) = get(router(state.clone()), "/v1/names/ru/GE").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // The Russian tables do not name Habakkuk.
    let (status, _) = get(router(state), "/v1/names/ru/HAB").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn division_endpoints() {
    let state = make_state(false);
    let (status, body) = get(router(state.clone()), "/v1/divisions/en/GOS").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["members"], serde_json::json!(["MAT", "MRK", "LUK", "JHN"]));

    let (status, _) = get(router(state.clone()), "/v1/divisions/en/XYZ").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = get(router(state.clone()), "/v1/books/en/JER/divisions").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["divisions"], serde_json::json!(["OT", "MJP"]));

    let (status, body) = get(router(state), "/v1/books/en/REV/divisions").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["divisions"], serde_json::json!(["NT"]));
}

#[tokio::test]
async fn order_endpoints() {
    let state = make_state(false);
    let (status, body) = get(router(state.clone()), "/v1/orders").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["orders"][0]["name"], "English Protestant");
    assert_eq!(body["orders"][0]["entries"], 68);

    let (status, body) = get(router(state.clone()), "/v1/orders/Hebrew%20Tanakh").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sequence"][7], "SAM");

    let (status, body) = get(
        router(state.clone()),
        "/v1/orders/Hebrew%20Tanakh/position/KGS",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["position"], 11);

    let (status, body) = get(
        router(state.clone()),
        "/v1/orders/Hebrew%20Tanakh/position/ROM",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap_or_default().contains("ROM"));

    let (status, _) = get(router(state), "/v1/orders/Vulgate").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rate_limiter_rejects_bursts_per_client() {
    let app = router(make_state(true)).layer(RateLimiterLayer::new(1, 2));
    let request = |ip: &str| {
        Request::builder()
            .uri("/healthz")
            .header("Fly-Client-IP", ip)
            .body(Body::empty())
            .unwrap()
    };

    for _ in 0..2 {
        let response = app.clone().oneshot(request("203.0.113.9")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    let response = app.clone().oneshot(request("203.0.113.9")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let response = app.oneshot(request("203.0.113.10")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
