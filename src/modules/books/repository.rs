//! Persistence adapter for book queries.
//!
//! [`SqliteBookRepository`] renders a [`BookQuery`] with sqlx's
//! `QueryBuilder`; every user-supplied value is pushed as a bound parameter.
//! Keywords and images are loaded per chunk of book ids to stay below
//! SQLite's bound-variable limit.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use thiserror::Error;

use super::models::{Abbildung, Book, BuchArt};
use super::query::{BookQuery, Filter};

const SELECT_BOOKS: &str = "SELECT b.id, b.version, b.isbn, b.rating, b.art, b.preis, b.rabatt, \
     b.lieferbar, b.datum, b.homepage, b.titel FROM buch b";

/// Book ids bound per `IN (...)` list
const ID_CHUNK: usize = 500;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Executes book queries against a store.
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// All books matching `query`, ordered by id
    async fn fetch(&self, query: &BookQuery) -> Result<Vec<Book>, RepositoryError>;

    /// Liveness of the underlying store
    async fn ping(&self) -> Result<(), RepositoryError>;
}

#[derive(Debug, sqlx::FromRow)]
struct BookRow {
    id: i64,
    version: i32,
    isbn: String,
    rating: i32,
    art: BuchArt,
    preis: f64,
    rabatt: f64,
    lieferbar: bool,
    datum: Option<NaiveDate>,
    homepage: Option<String>,
    titel: String,
}

impl BookRow {
    fn into_book(self, schlagwoerter: Vec<String>, abbildungen: Option<Vec<Abbildung>>) -> Book {
        Book {
            id: self.id,
            version: self.version,
            isbn: self.isbn,
            rating: self.rating,
            art: self.art,
            preis: self.preis,
            rabatt: self.rabatt,
            lieferbar: self.lieferbar,
            datum: self.datum,
            homepage: self.homepage,
            titel: self.titel,
            schlagwoerter,
            abbildungen,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct KeywordRow {
    buch_id: i64,
    schlagwort: String,
}

#[derive(Debug, sqlx::FromRow)]
struct ImageRow {
    buch_id: i64,
    id: i64,
    beschriftung: String,
    content_type: String,
}

/// SQLite-backed [`BookRepository`]
#[derive(Clone)]
pub struct SqliteBookRepository {
    pool: SqlitePool,
}

impl SqliteBookRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn keywords_for(&self, ids: &[i64]) -> Result<HashMap<i64, Vec<String>>, sqlx::Error> {
        let mut by_book: HashMap<i64, Vec<String>> = HashMap::new();

        for chunk in ids.chunks(ID_CHUNK) {
            let mut builder = QueryBuilder::<Sqlite>::new(
                "SELECT buch_id, schlagwort FROM schlagwort WHERE buch_id IN (",
            );
            push_id_list(&mut builder, chunk);
            builder.push(") ORDER BY buch_id, schlagwort");

            let rows: Vec<KeywordRow> = builder.build_query_as().fetch_all(&self.pool).await?;
            for row in rows {
                by_book.entry(row.buch_id).or_default().push(row.schlagwort);
            }
        }

        Ok(by_book)
    }

    async fn images_for(&self, ids: &[i64]) -> Result<HashMap<i64, Vec<Abbildung>>, sqlx::Error> {
        let mut by_book: HashMap<i64, Vec<Abbildung>> = HashMap::new();

        for chunk in ids.chunks(ID_CHUNK) {
            let mut builder = QueryBuilder::<Sqlite>::new(
                "SELECT buch_id, id, beschriftung, content_type FROM abbildung WHERE buch_id IN (",
            );
            push_id_list(&mut builder, chunk);
            builder.push(") ORDER BY buch_id, id");

            let rows: Vec<ImageRow> = builder.build_query_as().fetch_all(&self.pool).await?;
            for row in rows {
                by_book.entry(row.buch_id).or_default().push(Abbildung {
                    id: row.id,
                    beschriftung: row.beschriftung,
                    content_type: row.content_type,
                });
            }
        }

        Ok(by_book)
    }
}

#[async_trait]
impl BookRepository for SqliteBookRepository {
    async fn fetch(&self, query: &BookQuery) -> Result<Vec<Book>, RepositoryError> {
        let mut builder = select_books(query);
        tracing::debug!(sql = builder.sql(), "executing book query");

        let rows: Vec<BookRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
        let mut keywords = self.keywords_for(&ids).await?;
        let mut images = if query.include_images {
            Some(self.images_for(&ids).await?)
        } else {
            None
        };

        let books = rows
            .into_iter()
            .map(|row| {
                let schlagwoerter = keywords.remove(&row.id).unwrap_or_default();
                let abbildungen = images
                    .as_mut()
                    .map(|by_book| by_book.remove(&row.id).unwrap_or_default());
                row.into_book(schlagwoerter, abbildungen)
            })
            .collect();

        Ok(books)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        folio_db::ping(&self.pool).await?;
        Ok(())
    }
}

/// Render `query` as a parameterized SELECT over `buch b`.
fn select_books(query: &BookQuery) -> QueryBuilder<'static, Sqlite> {
    let mut builder = QueryBuilder::new(SELECT_BOOKS);

    for (i, filter) in query.filters.iter().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        push_filter(&mut builder, filter);
    }

    builder.push(" ORDER BY b.id");

    if let Some(limit) = query.limit {
        builder.push(" LIMIT ");
        builder.push_bind(i64::from(limit));
    }

    builder
}

fn push_filter(builder: &mut QueryBuilder<'static, Sqlite>, filter: &Filter) {
    match filter {
        Filter::IdEquals(id) => {
            builder.push("b.id = ").push_bind(*id);
        }
        Filter::VersionEquals(version) => {
            builder.push("b.version = ").push_bind(*version);
        }
        Filter::IsbnEquals(isbn) => {
            builder.push("b.isbn = ").push_bind(isbn.clone());
        }
        Filter::TitelContains(fragment) => {
            builder.push("b.titel REGEXP ").push_bind(contains_pattern(fragment));
        }
        Filter::ArtEquals(art) => {
            builder.push("b.art = ").push_bind(*art);
        }
        Filter::RatingAtLeast(rating) => {
            builder.push("b.rating >= ").push_bind(*rating);
        }
        Filter::PreisAtMost(preis) => {
            builder.push("b.preis <= ").push_bind(*preis);
        }
        Filter::RabattEquals(rabatt) => {
            builder.push("b.rabatt = ").push_bind(*rabatt);
        }
        Filter::LieferbarEquals(lieferbar) => {
            builder.push("b.lieferbar = ").push_bind(*lieferbar);
        }
        Filter::DatumEquals(datum) => {
            builder.push("b.datum = ").push_bind(*datum);
        }
        Filter::HomepageEquals(homepage) => {
            builder.push("b.homepage = ").push_bind(homepage.clone());
        }
        Filter::Keyword { keyword, present } => {
            builder
                .push(if *present { "EXISTS" } else { "NOT EXISTS" })
                .push(" (SELECT 1 FROM schlagwort s WHERE s.buch_id = b.id AND s.schlagwort = ")
                .push_bind(*keyword)
                .push(")");
        }
    }
}

fn push_id_list(builder: &mut QueryBuilder<'_, Sqlite>, ids: &[i64]) {
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
}

/// Case-insensitive (Unicode) pattern matching `fragment` literally.
fn contains_pattern(fragment: &str) -> String {
    format!("(?i){}", regex::escape(fragment))
}
