//! Read queries over the book catalog.
//!
//! A [`BookQuery`] is a plain value: a conjunction of typed [`Filter`]s, an
//! image-loading flag and an optional row limit. The persistence adapter turns
//! it into SQL with bound parameters.

use chrono::NaiveDate;
use thiserror::Error;

use super::criteria::Criteria;
use super::models::BuchArt;

/// Keyword stored for the `javascript` flag
pub const KEYWORD_JAVASCRIPT: &str = "JAVASCRIPT";
/// Keyword stored for the `typescript` flag
pub const KEYWORD_TYPESCRIPT: &str = "TYPESCRIPT";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("unknown search criterion '{0}'")]
    UnknownCriterion(String),

    #[error("invalid value {value:?} for search criterion '{key}'")]
    InvalidValue { key: String, value: String },
}

/// One predicate on a book row.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    IdEquals(i64),
    VersionEquals(i32),
    IsbnEquals(String),
    /// Case-insensitive substring match on the title
    TitelContains(String),
    ArtEquals(BuchArt),
    RatingAtLeast(i32),
    PreisAtMost(f64),
    RabattEquals(f64),
    LieferbarEquals(bool),
    DatumEquals(NaiveDate),
    HomepageEquals(String),
    /// Book has (`present = true`) or lacks the keyword
    Keyword {
        keyword: &'static str,
        present: bool,
    },
}

/// Composed read query over the book table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookQuery {
    pub filters: Vec<Filter>,
    pub include_images: bool,
    pub limit: Option<u32>,
}

impl BookQuery {
    /// Unfiltered query over all books
    pub fn all() -> Self {
        Self::default()
    }

    /// At most one book with the given id
    pub fn by_id(id: i64, include_images: bool) -> Self {
        Self {
            filters: vec![Filter::IdEquals(id)],
            include_images,
            limit: Some(1),
        }
    }

    /// Conjunction of all criteria; an empty mapping yields [`BookQuery::all`].
    ///
    /// Keys are expected to be validated already; an unknown key still fails
    /// instead of being ignored.
    pub fn by_criteria(criteria: &Criteria) -> Result<Self, QueryError> {
        let filters = criteria
            .iter()
            .map(|(key, value)| filter_for(key, value))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            filters,
            ..Self::default()
        })
    }
}

fn filter_for(key: &str, value: &str) -> Result<Filter, QueryError> {
    let invalid = || QueryError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    };
    let trimmed = value.trim();

    let filter = match key {
        "id" => Filter::IdEquals(trimmed.parse().map_err(|_| invalid())?),
        "version" => Filter::VersionEquals(trimmed.parse().map_err(|_| invalid())?),
        "isbn" => Filter::IsbnEquals(non_empty(trimmed).ok_or_else(invalid)?),
        "titel" => Filter::TitelContains(non_empty(trimmed).ok_or_else(invalid)?),
        "art" => Filter::ArtEquals(trimmed.parse().map_err(|_| invalid())?),
        "rating" => Filter::RatingAtLeast(trimmed.parse().map_err(|_| invalid())?),
        "preis" => Filter::PreisAtMost(parse_finite(trimmed).ok_or_else(invalid)?),
        "rabatt" => Filter::RabattEquals(parse_finite(trimmed).ok_or_else(invalid)?),
        "lieferbar" => Filter::LieferbarEquals(trimmed.parse().map_err(|_| invalid())?),
        "datum" => Filter::DatumEquals(
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|_| invalid())?,
        ),
        "homepage" => Filter::HomepageEquals(non_empty(trimmed).ok_or_else(invalid)?),
        "javascript" => Filter::Keyword {
            keyword: KEYWORD_JAVASCRIPT,
            present: trimmed.parse().map_err(|_| invalid())?,
        },
        "typescript" => Filter::Keyword {
            keyword: KEYWORD_TYPESCRIPT,
            present: trimmed.parse().map_err(|_| invalid())?,
        },
        other => return Err(QueryError::UnknownCriterion(other.to_string())),
    };

    Ok(filter)
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn parse_finite(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}
