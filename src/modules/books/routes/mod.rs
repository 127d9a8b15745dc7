use std::collections::BTreeMap;

use async_graphql::http::GraphiQLSource;
use async_graphql_axum::GraphQL;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use folio_http::error::AppError;

use super::criteria::Criteria;
use super::graphql::build_schema;
use super::models::Book;
use super::service::{BookReadService, ReadError};

const GRAPHQL_ENDPOINT: &str = "/api/books/graphql";

/// REST and GraphQL routes of the books module
pub fn router(service: BookReadService) -> Router {
    let schema = build_schema(service.clone());

    Router::new()
        .route("/", get(list_books))
        .route("/health", get(health_check))
        .route("/graphql", get(graphiql).post_service(GraphQL::new(schema)))
        .route("/{id}", get(find_book))
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FindByIdParams {
    #[serde(default)]
    mit_abbildungen: bool,
}

/// `GET /api/books?titel=...&rating=...`
async fn list_books(
    State(service): State<BookReadService>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Result<Json<Vec<Book>>, AppError> {
    let criteria = Criteria::from(params);
    let books = service.find(Some(&criteria)).await?;
    Ok(Json(books))
}

/// `GET /api/books/{id}`, honouring `If-None-Match` against the book version
async fn find_book(
    State(service): State<BookReadService>,
    Path(id): Path<String>,
    Query(params): Query<FindByIdParams>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let id: i64 = id.parse().map_err(|_| {
        AppError::bad_request(
            vec![json!({ "field": "id", "error": "not an integer", "value": id })],
            format!("invalid book id '{id}'"),
        )
    })?;

    let book = service.find_by_id(id, params.mit_abbildungen).await?;
    let etag = format!("\"{}\"", book.version);

    let unchanged = if_none_match(&headers, &etag);
    let etag_header = HeaderValue::from_str(&etag).map_err(anyhow::Error::from)?;

    if unchanged {
        tracing::debug!(id, version = book.version, "book unchanged");
        return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag_header)]).into_response());
    }

    Ok(([(header::ETAG, etag_header)], Json(book)).into_response())
}

/// Weak comparison of `If-None-Match` against `etag`; `*` matches any book.
fn if_none_match(headers: &HeaderMap, etag: &str) -> bool {
    headers
        .get_all(header::IF_NONE_MATCH)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .any(|tag| tag == "*" || tag.strip_prefix("W/").unwrap_or(tag) == etag)
}

async fn health_check(State(service): State<BookReadService>) -> Result<&'static str, AppError> {
    service.ping().await?;
    Ok("ok")
}

async fn graphiql() -> Html<String> {
    Html(GraphiQLSource::build().endpoint(GRAPHQL_ENDPOINT).finish())
}

impl From<ReadError> for AppError {
    fn from(err: ReadError) -> Self {
        let message = err.to_string();
        match err {
            ReadError::InvalidCriteria(keys) => AppError::bad_request(
                keys.into_iter()
                    .map(|key| json!({ "field": key, "error": "unknown search criterion" }))
                    .collect(),
                message,
            ),
            ReadError::InvalidValue { key, value } => AppError::bad_request(
                vec![json!({ "field": key, "error": "invalid value", "value": value })],
                message,
            ),
            ReadError::NotFoundById(_) | ReadError::NotFoundByCriteria(_) => {
                AppError::not_found(message)
            }
            ReadError::Repository(err) => AppError::Internal(err.into()),
        }
    }
}
