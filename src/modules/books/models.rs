use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Publication format of a book.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    sqlx::Type,
    async_graphql::Enum,
)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum BuchArt {
    Epub,
    Hardcover,
    Paperback,
}

impl BuchArt {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuchArt::Epub => "EPUB",
            BuchArt::Hardcover => "HARDCOVER",
            BuchArt::Paperback => "PAPERBACK",
        }
    }
}

impl std::str::FromStr for BuchArt {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_uppercase().as_str() {
            "EPUB" => Ok(BuchArt::Epub),
            "HARDCOVER" => Ok(BuchArt::Hardcover),
            "PAPERBACK" => Ok(BuchArt::Paperback),
            _ => Err(()),
        }
    }
}

/// Read-only projection of a book in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Unique identifier for the book
    pub id: i64,
    /// Optimistic-locking version, exposed as the ETag
    pub version: i32,
    pub isbn: String,
    /// Score from 0 to 5
    pub rating: i32,
    pub art: BuchArt,
    pub preis: f64,
    /// Discount as a fraction in `[0, 1]`
    pub rabatt: f64,
    pub lieferbar: bool,
    pub datum: Option<NaiveDate>,
    pub homepage: Option<String>,
    pub titel: String,
    /// Keywords such as `JAVASCRIPT`, sorted
    pub schlagwoerter: Vec<String>,
    /// `None` unless images were requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abbildungen: Option<Vec<Abbildung>>,
}

/// Image attached to a book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, async_graphql::SimpleObject)]
#[serde(rename_all = "camelCase")]
pub struct Abbildung {
    pub id: i64,
    pub beschriftung: String,
    pub content_type: String,
}
