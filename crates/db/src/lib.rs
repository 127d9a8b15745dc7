//! Database crate: SQLite pool factory and the module migration runner.

use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use folio_kernel::settings::DatabaseSettings;
use folio_kernel::Migration;

/// Connection pool shared by all modules
pub type Database = SqlitePool;

const MIGRATIONS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS _migrations (
        module     TEXT NOT NULL,
        id         TEXT NOT NULL,
        applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        PRIMARY KEY (module, id)
    )
"#;

/// Open a connection pool for the configured database.
///
/// Every connection registers `REGEXP`, backed by the `regex` crate.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<Database> {
    let options = SqliteConnectOptions::from_str(&settings.url)
        .with_context(|| format!("invalid database url '{}'", settings.url))?
        .foreign_keys(true)
        .with_regexp();

    let mut pool_options = SqlitePoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_millis(settings.connect_timeout_ms));

    // An in-memory database lives only as long as its connection.
    if settings.url.contains(":memory:") {
        pool_options = pool_options
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    }

    let pool = pool_options
        .connect_with(options)
        .await
        .with_context(|| format!("failed to connect to '{}'", settings.url))?;

    tracing::info!(
        target: "folio-db",
        max_connections = settings.max_connections,
        "database pool ready"
    );

    Ok(pool)
}

/// Liveness check for health endpoints.
pub async fn ping(pool: &Database) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await.map(|_| ())
}

/// Apply every migration not yet recorded in the `_migrations` ledger.
///
/// Each migration runs in its own transaction together with its ledger row.
/// Returns the `(module, id)` pairs applied by this call.
pub async fn run_migrations(
    pool: &Database,
    migrations: &[(String, Migration)],
) -> anyhow::Result<Vec<(String, String)>> {
    sqlx::query(MIGRATIONS_TABLE)
        .execute(pool)
        .await
        .context("failed to create migrations table")?;

    let mut applied = Vec::new();

    for (module, migration) in migrations {
        let already_applied: Option<(String,)> =
            sqlx::query_as("SELECT id FROM _migrations WHERE module = ? AND id = ?")
                .bind(module)
                .bind(migration.id)
                .fetch_optional(pool)
                .await
                .context("failed to read migrations table")?;

        if already_applied.is_some() {
            tracing::debug!(target: "folio-db", module = %module, id = migration.id, "migration already applied");
            continue;
        }

        let mut tx = pool.begin().await?;

        sqlx::raw_sql(migration.up)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("migration '{}/{}' failed", module, migration.id))?;

        sqlx::query("INSERT INTO _migrations (module, id) VALUES (?, ?)")
            .bind(module)
            .bind(migration.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(target: "folio-db", module = %module, id = migration.id, "migration applied");
        applied.push((module.clone(), migration.id.to_string()));
    }

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn migrations() -> Vec<(String, Migration)> {
        vec![
            (
                "notes".to_string(),
                Migration {
                    id: "001_init",
                    up: "CREATE TABLE note (id INTEGER PRIMARY KEY, body TEXT NOT NULL);",
                },
            ),
            (
                "notes".to_string(),
                Migration {
                    id: "002_seed",
                    up: "INSERT INTO note (body) VALUES ('a'); INSERT INTO note (body) VALUES ('b');",
                },
            ),
        ]
    }

    #[tokio::test]
    async fn migrations_apply_once() {
        let pool = connect(&DatabaseSettings::in_memory()).await.unwrap();

        let first = run_migrations(&pool, &migrations()).await.unwrap();
        let second = run_migrations(&pool, &migrations()).await.unwrap();

        assert_eq!(first.len(), 2);
        assert!(second.is_empty());

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM note")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn failing_migration_is_not_recorded() {
        let pool = connect(&DatabaseSettings::in_memory()).await.unwrap();
        let broken = vec![(
            "notes".to_string(),
            Migration {
                id: "001_init",
                up: "CREATE TABLE note (id INTEGER PRIMARY KEY); INSERT INTO missing VALUES (1);",
            },
        )];

        let err = run_migrations(&pool, &broken).await.unwrap_err();
        assert!(err.to_string().contains("notes/001_init"));

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM _migrations")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn ping_succeeds_on_open_pool() {
        let pool = connect(&DatabaseSettings::in_memory()).await.unwrap();
        assert!(ping(&pool).await.is_ok());
    }

    #[tokio::test]
    async fn regexp_folds_unicode_case() {
        let pool = connect(&DatabaseSettings::in_memory()).await.unwrap();

        let (matched,): (bool,) = sqlx::query_as("SELECT ? REGEXP ?")
            .bind("Über Rust")
            .bind("(?i)über")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert!(matched);
    }

    #[test]
    fn rejects_malformed_url() {
        let settings = DatabaseSettings {
            url: "postgres://localhost/folio".to_string(),
            ..DatabaseSettings::in_memory()
        };

        let runtime = tokio::runtime::Runtime::new().unwrap();
        assert!(runtime.block_on(connect(&settings)).is_err());
    }
}
