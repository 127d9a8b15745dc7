pub mod criteria;
pub mod graphql;
pub mod models;
pub mod query;
pub mod repository;
pub mod routes;
pub mod schema;
pub mod service;

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use axum::Router;
use folio_db::Database;
use folio_kernel::{InitCtx, Migration, Module};

use repository::SqliteBookRepository;
use service::BookReadService;

/// Read-only book catalog over REST and GraphQL
pub struct BooksModule {
    service: BookReadService,
}

impl BooksModule {
    pub fn new(service: BookReadService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.service.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment())
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![
            Migration {
                id: "001_init",
                up: schema::INIT,
            },
            Migration {
                id: "002_seed",
                up: schema::SEED,
            },
        ]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        self.service
            .ping()
            .await
            .context("books store is not reachable")?;
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create the books module on top of a connection pool
pub fn create_module(db: Database) -> Arc<dyn Module> {
    let repository = Arc::new(SqliteBookRepository::new(db));
    Arc::new(BooksModule::new(BookReadService::new(repository)))
}

fn error_response(description: &str) -> serde_json::Value {
    serde_json::json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn openapi_fragment() -> serde_json::Value {
    let criterion = |name: &str, schema: serde_json::Value, description: &str| {
        serde_json::json!({
            "name": name,
            "in": "query",
            "required": false,
            "schema": schema,
            "description": description
        })
    };

    serde_json::json!({
        "paths": {
            "/": {
                "get": {
                    "summary": "Search books",
                    "tags": ["Books"],
                    "parameters": [
                        criterion("titel", serde_json::json!({ "type": "string" }), "Title substring, case-insensitive"),
                        criterion("isbn", serde_json::json!({ "type": "string" }), "Exact ISBN"),
                        criterion("rating", serde_json::json!({ "type": "integer" }), "Minimum rating"),
                        criterion("art", serde_json::json!({ "type": "string", "enum": ["EPUB", "HARDCOVER", "PAPERBACK"] }), "Book type"),
                        criterion("preis", serde_json::json!({ "type": "number" }), "Maximum price"),
                        criterion("rabatt", serde_json::json!({ "type": "number" }), "Exact discount fraction"),
                        criterion("lieferbar", serde_json::json!({ "type": "boolean" }), "Availability"),
                        criterion("datum", serde_json::json!({ "type": "string", "format": "date" }), "Publication date"),
                        criterion("homepage", serde_json::json!({ "type": "string" }), "Exact homepage"),
                        criterion("javascript", serde_json::json!({ "type": "boolean" }), "Has the JAVASCRIPT keyword"),
                        criterion("typescript", serde_json::json!({ "type": "boolean" }), "Has the TYPESCRIPT keyword")
                    ],
                    "responses": {
                        "200": {
                            "description": "Matching books, all books without criteria",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "array",
                                        "items": { "$ref": "#/components/schemas/Buch" }
                                    }
                                }
                            }
                        },
                        "400": error_response("Unknown criterion or malformed value"),
                        "404": error_response("No book matches the criteria"),
                        "500": error_response("Internal server error")
                    }
                }
            },
            "/{id}": {
                "get": {
                    "summary": "Find a book by id",
                    "tags": ["Books"],
                    "parameters": [
                        {
                            "name": "id",
                            "in": "path",
                            "required": true,
                            "schema": { "type": "integer", "format": "int64" }
                        },
                        {
                            "name": "mitAbbildungen",
                            "in": "query",
                            "required": false,
                            "schema": { "type": "boolean", "default": false }
                        },
                        {
                            "name": "If-None-Match",
                            "in": "header",
                            "required": false,
                            "schema": { "type": "string" }
                        }
                    ],
                    "responses": {
                        "200": {
                            "description": "The book; the ETag header carries its version",
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/Buch" }
                                }
                            }
                        },
                        "304": { "description": "Book unchanged since the given ETag" },
                        "400": error_response("Malformed id"),
                        "404": error_response("No book with this id"),
                        "500": error_response("Internal server error")
                    }
                }
            },
            "/health": {
                "get": {
                    "summary": "Books store health check",
                    "tags": ["Books"],
                    "responses": {
                        "200": {
                            "description": "OK",
                            "content": { "text/plain": { "schema": { "type": "string" } } }
                        },
                        "500": error_response("Store unreachable")
                    }
                }
            },
            "/graphql": {
                "post": {
                    "summary": "GraphQL queries buch and buecher",
                    "tags": ["Books"],
                    "responses": {
                        "200": { "description": "GraphQL response" }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Buch": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer", "format": "int64" },
                        "version": { "type": "integer" },
                        "isbn": { "type": "string" },
                        "rating": { "type": "integer", "minimum": 0, "maximum": 5 },
                        "art": { "type": "string", "enum": ["EPUB", "HARDCOVER", "PAPERBACK"] },
                        "preis": { "type": "number" },
                        "rabatt": { "type": "number", "description": "Discount fraction between 0 and 1" },
                        "lieferbar": { "type": "boolean" },
                        "datum": { "type": ["string", "null"], "format": "date" },
                        "homepage": { "type": ["string", "null"] },
                        "titel": { "type": "string" },
                        "schlagwoerter": { "type": "array", "items": { "type": "string" } },
                        "abbildungen": {
                            "type": "array",
                            "items": { "$ref": "#/components/schemas/Abbildung" },
                            "description": "Present only when requested"
                        }
                    },
                    "required": ["id", "version", "isbn", "rating", "art", "preis", "rabatt", "lieferbar", "titel", "schlagwoerter"]
                },
                "Abbildung": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer", "format": "int64" },
                        "beschriftung": { "type": "string" },
                        "contentType": { "type": "string" }
                    },
                    "required": ["id", "beschriftung", "contentType"]
                }
            }
        }
    })
}
