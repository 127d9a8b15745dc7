//! Read service for the book catalog.

use std::sync::Arc;

use thiserror::Error;

use super::criteria::{self, Criteria};
use super::models::Book;
use super::query::{BookQuery, QueryError};
use super::repository::{BookRepository, RepositoryError};

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("invalid search criteria: {}", .0.join(", "))]
    InvalidCriteria(Vec<String>),

    #[error("invalid value {value:?} for search criterion '{key}'")]
    InvalidValue { key: String, value: String },

    #[error("no book found with id {0}")]
    NotFoundById(i64),

    #[error("no books found for criteria {0}")]
    NotFoundByCriteria(Criteria),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<QueryError> for ReadError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::UnknownCriterion(key) => ReadError::InvalidCriteria(vec![key]),
            QueryError::InvalidValue { key, value } => ReadError::InvalidValue { key, value },
        }
    }
}

/// Validates requests, builds queries and interprets their results.
#[derive(Clone)]
pub struct BookReadService {
    repository: Arc<dyn BookRepository>,
}

impl BookReadService {
    pub fn new(repository: Arc<dyn BookRepository>) -> Self {
        Self { repository }
    }

    /// The book with `id`, with its images if `include_images` is set.
    #[tracing::instrument(skip(self))]
    pub async fn find_by_id(&self, id: i64, include_images: bool) -> Result<Book, ReadError> {
        if id < 1 {
            return Err(ReadError::NotFoundById(id));
        }

        let query = BookQuery::by_id(id, include_images);
        let book = self
            .repository
            .fetch(&query)
            .await?
            .into_iter()
            .next()
            .ok_or(ReadError::NotFoundById(id))?;

        tracing::debug!(titel = %book.titel, "book found");
        Ok(book)
    }

    /// Books matching `criteria`.
    ///
    /// Absent or empty criteria return every book, possibly none. Non-empty
    /// criteria matching nothing are [`ReadError::NotFoundByCriteria`].
    #[tracing::instrument(skip(self))]
    pub async fn find(&self, criteria: Option<&Criteria>) -> Result<Vec<Book>, ReadError> {
        let criteria = match criteria {
            Some(criteria) if !criteria.is_empty() => criteria,
            _ => {
                let books = self.repository.fetch(&BookQuery::all()).await?;
                tracing::debug!(count = books.len(), "unfiltered search");
                return Ok(books);
            }
        };

        if !criteria::validate_keys(criteria.keys()) {
            let unknown = criteria::unknown_keys(criteria);
            tracing::debug!(?unknown, "rejecting unknown criteria");
            return Err(ReadError::InvalidCriteria(unknown));
        }

        let query = BookQuery::by_criteria(criteria)?;
        let books = self.repository.fetch(&query).await?;

        if books.is_empty() {
            return Err(ReadError::NotFoundByCriteria(criteria.clone()));
        }

        tracing::debug!(count = books.len(), "filtered search");
        Ok(books)
    }

    /// Liveness of the backing store
    pub async fn ping(&self) -> Result<(), ReadError> {
        self.repository.ping().await?;
        Ok(())
    }
}
