use axum::{Router, http::StatusCode, routing::get};
use sitemap_kit_core::{CATEGORIES, Category, Error};
use sitemap_kit_fetcher::{CategoryCache, ContentSource, HttpContentSource, LookupSource};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Start a throwaway content API on an ephemeral port.
async fn spawn_api(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn category(key: &str) -> &'static Category {
    CATEGORIES.iter().find(|c| c.key == key).unwrap()
}

#[tokio::test]
async fn fetches_and_validates_items() {
    let app = Router::new().route(
        "/api/airdrops",
        get(|| async {
            (
                [("content-type", "application/json")],
                r#"[{"slug":"abc","updatedAt":"2024-01-01T00:00:00Z"},{"title":"no slug"}]"#,
            )
        }),
    );
    let addr = spawn_api(app).await;
    let source = HttpContentSource::new(&format!("http://{}/api", addr), Duration::from_secs(5)).unwrap();

    let fetched = source.fetch_category(category("airdrops")).await.unwrap();

    assert_eq!(fetched.items.len(), 1);
    assert_eq!(fetched.items[0].slug, "abc");
    assert_eq!(fetched.report.dropped(), 1);
}

#[tokio::test]
async fn non_success_status_is_fetch_error() {
    let app = Router::new().route(
        "/api/games",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
    );
    let addr = spawn_api(app).await;
    let source = HttpContentSource::new(&format!("http://{}/api", addr), Duration::from_secs(5)).unwrap();

    let err = source.fetch_category(category("games")).await.unwrap_err();
    assert!(matches!(err, Error::Fetch { status: 503, .. }));
}

#[tokio::test]
async fn invalid_json_is_parse_error() {
    let app = Router::new().route("/api/academy", get(|| async { "<!doctype html>" }));
    let addr = spawn_api(app).await;
    let source = HttpContentSource::new(&format!("http://{}/api", addr), Duration::from_secs(5)).unwrap();

    let err = source.fetch_category(category("academy")).await.unwrap_err();
    assert!(matches!(err, Error::Parse { .. }));
}

#[tokio::test]
async fn slow_endpoint_times_out() {
    let app = Router::new().route(
        "/api/games",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            "[]"
        }),
    );
    let addr = spawn_api(app).await;
    let source =
        HttpContentSource::new(&format!("http://{}/api", addr), Duration::from_millis(100)).unwrap();

    let err = source.fetch_category(category("games")).await.unwrap_err();
    assert!(matches!(err, Error::Timeout { .. }));
}

#[tokio::test]
async fn cache_serves_stale_items_when_api_goes_down() {
    let healthy = Arc::new(AtomicBool::new(true));
    let flag = healthy.clone();
    let app = Router::new().route(
        "/api/games",
        get(move || {
            let flag = flag.clone();
            async move {
                if flag.load(Ordering::SeqCst) {
                    (StatusCode::OK, r#"[{"slug":"g1"},{"slug":"g2"}]"#)
                } else {
                    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
                }
            }
        }),
    );
    let addr = spawn_api(app).await;
    let source = HttpContentSource::new(&format!("http://{}/api", addr), Duration::from_secs(5)).unwrap();
    let cache = CategoryCache::new(Duration::ZERO);
    let games = category("games");

    let first = cache
        .get_or_fetch(games.key, || async {
            source.fetch_category(games).await.map(|f| f.items)
        })
        .await;
    assert_eq!(first.source, LookupSource::Fetched);
    assert_eq!(first.items.len(), 2);

    healthy.store(false, Ordering::SeqCst);

    let second = cache
        .get_or_fetch(games.key, || async {
            source.fetch_category(games).await.map(|f| f.items)
        })
        .await;
    assert_eq!(second.source, LookupSource::Stale);
    assert_eq!(second.items, first.items);
}
