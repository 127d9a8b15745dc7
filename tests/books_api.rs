use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use folio_kernel::settings::{DatabaseSettings, Settings};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn app() -> Router {
    let settings = Settings {
        database: DatabaseSettings::in_memory(),
        ..Settings::default()
    };
    let (registry, _db) = folio_app::app::prepare(&settings).await.unwrap();
    folio_http::build_router(&registry, &settings)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, headers, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn ids(body: &Value) -> Vec<i64> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|book| book["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn find_by_id_returns_book_with_etag() {
    let app = app().await;

    let (status, headers, body) = send(&app, get("/api/books/6")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::ETAG], "\"1\"");
    assert_eq!(body["titel"], "Java und TypeScript");
    assert_eq!(body["art"], "PAPERBACK");
    assert_eq!(body["schlagwoerter"], json!(["TYPESCRIPT"]));
    assert!(body.get("abbildungen").is_none());
}

#[tokio::test]
async fn find_by_id_with_images() {
    let app = app().await;

    let (status, _, body) = send(&app, get("/api/books/6?mitAbbildungen=true")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["abbildungen"],
        json!([
            { "id": 2, "beschriftung": "Cover", "contentType": "image/jpeg" },
            { "id": 3, "beschriftung": "Rückseite", "contentType": "image/jpeg" }
        ])
    );
}

#[tokio::test]
async fn matching_etag_is_not_modified() {
    let app = app().await;
    let request = Request::builder()
        .uri("/api/books/6")
        .header(header::IF_NONE_MATCH, "\"1\"")
        .body(Body::empty())
        .unwrap();

    let (status, headers, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::NOT_MODIFIED);
    assert_eq!(headers[header::ETAG], "\"1\"");
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn stale_etag_returns_the_book() {
    let app = app().await;
    let request = Request::builder()
        .uri("/api/books/6")
        .header(header::IF_NONE_MATCH, "\"0\"")
        .body(Body::empty())
        .unwrap();

    let (status, _, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn weak_or_wildcard_etag_is_not_modified() {
    let app = app().await;

    for tag in ["W/\"1\"", "*", "\"0\", W/\"1\""] {
        let request = Request::builder()
            .uri("/api/books/6")
            .header(header::IF_NONE_MATCH, tag)
            .body(Body::empty())
            .unwrap();

        let (status, _, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::NOT_MODIFIED, "{tag}");
    }
}

#[tokio::test]
async fn missing_book_is_404_with_error_body() {
    let app = app().await;

    for uri in ["/api/books/999", "/api/books/0", "/api/books/-1"] {
        let (status, _, body) = send(&app, get(uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["error"]["code"], "not_found");
        assert!(body["error"]["trace_id"].is_string());
    }
}

#[tokio::test]
async fn non_numeric_id_is_400() {
    let app = app().await;

    let (status, _, body) = send(&app, get("/api/books/eins")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"][0]["field"], "id");
}

#[tokio::test]
async fn search_without_criteria_lists_all_books() {
    let app = app().await;

    let (status, _, body) = send(&app, get("/api/books")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![1, 2, 3, 4, 5, 6]);
}

#[tokio::test]
async fn search_combines_criteria() {
    let app = app().await;

    let cases = [
        ("/api/books?titel=a", vec![1, 2, 3, 4, 6]),
        ("/api/books?titel=JAVA", vec![6]),
        ("/api/books?rating=4", vec![1, 6]),
        ("/api/books?art=HARDCOVER", vec![2, 4]),
        ("/api/books?preis=30", vec![1, 2]),
        ("/api/books?lieferbar=false", vec![5]),
        ("/api/books?javascript=true", vec![1, 3]),
        ("/api/books?javascript=true&typescript=true", vec![3]),
        ("/api/books?typescript=false", vec![1, 4]),
        ("/api/books?isbn=978-0-201-63361-0", vec![3]),
        ("/api/books?datum=2022-02-04", vec![4]),
        ("/api/books?art=EPUB&lieferbar=true", vec![1]),
    ];

    for (uri, expected) in cases {
        let (status, _, body) = send(&app, get(uri)).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(ids(&body), expected, "{uri}");
    }
}

#[tokio::test]
async fn search_without_matches_is_404() {
    let app = app().await;

    let (status, _, body) = send(&app, get("/api/books?titel=Omega")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn unknown_criterion_is_400() {
    let app = app().await;

    let (status, _, body) = send(&app, get("/api/books?titel=Alpha&verlag=Acme")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "invalid search criteria: verlag");
    assert_eq!(body["error"]["details"][0]["field"], "verlag");
}

#[tokio::test]
async fn malformed_value_is_400() {
    let app = app().await;

    let (status, _, body) = send(&app, get("/api/books?rating=viele")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"][0]["field"], "rating");
}

#[tokio::test]
async fn title_wildcards_are_literal() {
    let app = app().await;

    let (status, _, _) = send(&app, get("/api/books?titel=%25")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn graphql_queries() {
    let app = app().await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/books/graphql")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({
                "query": r#"{
                    buch(id: "1") { titel rabatt }
                    buecher(suchkriterien: { rating: 5 }) { id }
                }"#
            })
            .to_string(),
        ))
        .unwrap();

    let (status, _, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "data": {
                "buch": { "titel": "Alpha", "rabatt": "10.00 %" },
                "buecher": [{ "id": "6" }]
            }
        })
    );
}

#[tokio::test]
async fn graphiql_is_served_on_get() {
    let app = app().await;

    let response = app.oneshot(get("/api/books/graphql")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/html"));
}

#[tokio::test]
async fn health_endpoints() {
    let app = app().await;

    let (status, _, body) = send(&app, get("/healthz")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".into()));

    let (status, _, body) = send(&app, get("/api/books/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".into()));
}

#[tokio::test]
async fn openapi_lists_book_routes() {
    let app = app().await;

    let (status, _, body) = send(&app, get("/docs/openapi.json")).await;

    assert_eq!(status, StatusCode::OK);
    for path in ["/api/books", "/api/books/{id}", "/api/books/health", "/api/books/graphql"] {
        assert!(body["paths"].get(path).is_some(), "{path} missing");
    }
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let settings = Settings {
        database: DatabaseSettings::in_memory(),
        ..Settings::default()
    };
    let (registry, db) = folio_app::app::prepare(&settings).await.unwrap();

    let applied = folio_db::run_migrations(&db, &registry.collect_migrations())
        .await
        .unwrap();

    assert!(applied.is_empty());
}
