//! GraphQL schema for the books module: `buch` and `buecher` queries.

use async_graphql::{
    Context, EmptyMutation, EmptySubscription, ErrorExtensions, InputObject, Object, Result,
    Schema, ID,
};
use chrono::NaiveDate;

use super::criteria::Criteria;
use super::models::{Abbildung, Book, BuchArt};
use super::service::{BookReadService, ReadError};
use crate::utils::format_percent;

pub type BooksSchema = Schema<QueryRoot, EmptyMutation, EmptySubscription>;

pub fn build_schema(service: BookReadService) -> BooksSchema {
    Schema::build(QueryRoot, EmptyMutation, EmptySubscription)
        .data(service)
        .finish()
}

/// Search criteria accepted by `buecher`. Unset fields are not filtered on.
#[derive(InputObject, Default, Clone, Debug)]
pub struct SuchkriterienInput {
    /// Substring of the title, case-insensitive
    pub titel: Option<String>,
    pub isbn: Option<String>,
    /// Minimum rating
    pub rating: Option<i32>,
    pub art: Option<BuchArt>,
    /// Maximum price
    pub preis: Option<f64>,
    pub rabatt: Option<f64>,
    pub lieferbar: Option<bool>,
    pub datum: Option<NaiveDate>,
    pub homepage: Option<String>,
    pub javascript: Option<bool>,
    pub typescript: Option<bool>,
}

impl From<SuchkriterienInput> for Criteria {
    fn from(input: SuchkriterienInput) -> Self {
        let mut criteria = Criteria::new();
        if let Some(titel) = input.titel {
            criteria.insert("titel", titel);
        }
        if let Some(isbn) = input.isbn {
            criteria.insert("isbn", isbn);
        }
        if let Some(rating) = input.rating {
            criteria.insert("rating", rating);
        }
        if let Some(art) = input.art {
            criteria.insert("art", art.as_str());
        }
        if let Some(preis) = input.preis {
            criteria.insert("preis", preis);
        }
        if let Some(rabatt) = input.rabatt {
            criteria.insert("rabatt", rabatt);
        }
        if let Some(lieferbar) = input.lieferbar {
            criteria.insert("lieferbar", lieferbar);
        }
        if let Some(datum) = input.datum {
            criteria.insert("datum", datum.format("%Y-%m-%d"));
        }
        if let Some(homepage) = input.homepage {
            criteria.insert("homepage", homepage);
        }
        if let Some(javascript) = input.javascript {
            criteria.insert("javascript", javascript);
        }
        if let Some(typescript) = input.typescript {
            criteria.insert("typescript", typescript);
        }
        criteria
    }
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// A single book by id
    async fn buch(
        &self,
        ctx: &Context<'_>,
        id: ID,
        #[graphql(default = false)] mit_abbildungen: bool,
    ) -> Result<Book> {
        let service = ctx.data::<BookReadService>()?;
        let id: i64 = id.parse().map_err(|_| {
            async_graphql::Error::new(format!("invalid book id '{}'", id.as_str()))
                .extend_with(|_, e| e.set("code", "BAD_USER_INPUT"))
        })?;

        service
            .find_by_id(id, mit_abbildungen)
            .await
            .map_err(to_graphql_error)
    }

    /// Books matching the criteria; all books when none are given
    async fn buecher(
        &self,
        ctx: &Context<'_>,
        suchkriterien: Option<SuchkriterienInput>,
    ) -> Result<Vec<Book>> {
        let service = ctx.data::<BookReadService>()?;
        let criteria = suchkriterien.map(Criteria::from);

        service
            .find(criteria.as_ref())
            .await
            .map_err(to_graphql_error)
    }
}

#[Object(name = "Buch")]
impl Book {
    async fn id(&self) -> ID {
        ID(self.id.to_string())
    }

    async fn version(&self) -> i32 {
        self.version
    }

    async fn isbn(&self) -> &str {
        &self.isbn
    }

    async fn rating(&self) -> i32 {
        self.rating
    }

    async fn art(&self) -> BuchArt {
        self.art
    }

    async fn preis(&self) -> f64 {
        self.preis
    }

    /// Discount as percentage text, e.g. `10.00 %`
    async fn rabatt(&self) -> String {
        format_percent(self.rabatt)
    }

    async fn lieferbar(&self) -> bool {
        self.lieferbar
    }

    async fn datum(&self) -> Option<NaiveDate> {
        self.datum
    }

    async fn homepage(&self) -> Option<&str> {
        self.homepage.as_deref()
    }

    async fn titel(&self) -> &str {
        &self.titel
    }

    async fn schlagwoerter(&self) -> &[String] {
        &self.schlagwoerter
    }

    /// Only populated when requested with `mitAbbildungen: true`
    async fn abbildungen(&self) -> Option<&[Abbildung]> {
        self.abbildungen.as_deref()
    }
}

fn to_graphql_error(err: ReadError) -> async_graphql::Error {
    let code = match &err {
        ReadError::NotFoundById(_) | ReadError::NotFoundByCriteria(_) => "NOT_FOUND",
        ReadError::InvalidCriteria(_) | ReadError::InvalidValue { .. } => "BAD_USER_INPUT",
        ReadError::Repository(_) => {
            tracing::error!(error = %err, "book query failed");
            "INTERNAL_SERVER_ERROR"
        }
    };

    async_graphql::Error::new(err.to_string()).extend_with(|_, e| e.set("code", code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::repository::SqliteBookRepository;
    use crate::modules::books::schema;
    use serde_json::json;
    use std::sync::Arc;

    async fn seeded_schema() -> BooksSchema {
        let pool = folio_db::connect(&folio_kernel::settings::DatabaseSettings::in_memory())
            .await
            .unwrap();
        sqlx::raw_sql(schema::INIT).execute(&pool).await.unwrap();
        sqlx::raw_sql(schema::SEED).execute(&pool).await.unwrap();
        let repository = Arc::new(SqliteBookRepository::new(pool));
        build_schema(BookReadService::new(repository))
    }

    fn error_code(response: &async_graphql::Response) -> serde_json::Value {
        let error = serde_json::to_value(&response.errors[0]).unwrap();
        error["extensions"]["code"].clone()
    }

    #[tokio::test]
    async fn buch_with_images() {
        let schema = seeded_schema().await;

        let response = schema
            .execute(
                r#"{ buch(id: "1", mitAbbildungen: true) {
                    id titel rabatt art schlagwoerter abbildungen { beschriftung contentType }
                } }"#,
            )
            .await;

        assert!(response.errors.is_empty(), "{:?}", response.errors);
        assert_eq!(
            response.data.into_json().unwrap(),
            json!({
                "buch": {
                    "id": "1",
                    "titel": "Alpha",
                    "rabatt": "10.00 %",
                    "art": "EPUB",
                    "schlagwoerter": ["JAVASCRIPT"],
                    "abbildungen": [{ "beschriftung": "Abbildung 1", "contentType": "image/png" }]
                }
            })
        );
    }

    #[tokio::test]
    async fn buch_without_images_by_default() {
        let schema = seeded_schema().await;

        let response = schema.execute(r#"{ buch(id: "1") { abbildungen { id } } }"#).await;

        assert!(response.errors.is_empty());
        assert_eq!(
            response.data.into_json().unwrap(),
            json!({ "buch": { "abbildungen": null } })
        );
    }

    #[tokio::test]
    async fn missing_buch_is_not_found() {
        let schema = seeded_schema().await;

        let response = schema.execute(r#"{ buch(id: "999") { titel } }"#).await;

        assert_eq!(error_code(&response), json!("NOT_FOUND"));
        assert_eq!(response.errors[0].message, "no book found with id 999");
    }

    #[tokio::test]
    async fn malformed_id_is_bad_input() {
        let schema = seeded_schema().await;

        let response = schema.execute(r#"{ buch(id: "eins") { titel } }"#).await;

        assert_eq!(error_code(&response), json!("BAD_USER_INPUT"));
    }

    #[tokio::test]
    async fn buecher_by_criteria() {
        let schema = seeded_schema().await;

        let response = schema
            .execute(r#"{ buecher(suchkriterien: { titel: "java", typescript: true }) { id titel } }"#)
            .await;

        assert!(response.errors.is_empty(), "{:?}", response.errors);
        assert_eq!(
            response.data.into_json().unwrap(),
            json!({ "buecher": [{ "id": "6", "titel": "Java und TypeScript" }] })
        );
    }

    #[tokio::test]
    async fn buecher_without_criteria_lists_all() {
        let schema = seeded_schema().await;

        for query in ["{ buecher { id } }", "{ buecher(suchkriterien: {}) { id } }"] {
            let response = schema.execute(query).await;
            assert!(response.errors.is_empty());
            let data = response.data.into_json().unwrap();
            assert_eq!(data["buecher"].as_array().unwrap().len(), 6);
        }
    }

    #[tokio::test]
    async fn buecher_without_matches_is_not_found() {
        let schema = seeded_schema().await;

        let response = schema
            .execute(r#"{ buecher(suchkriterien: { art: HARDCOVER, rating: 5 }) { id } }"#)
            .await;

        assert_eq!(error_code(&response), json!("NOT_FOUND"));
    }
}
