//! Application bootstrap: telemetry, database, module lifecycle and HTTP server.

use anyhow::Context;
use folio_db::Database;
use folio_kernel::{settings::Settings, InitCtx, ModuleRegistry};

use crate::modules;

/// Connect the database, register and initialize all modules and, when
/// enabled, apply pending migrations.
pub async fn prepare(settings: &Settings) -> anyhow::Result<(ModuleRegistry, Database)> {
    let db = folio_db::connect(&settings.database).await?;

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, &db);

    let ctx = InitCtx { settings };
    registry.init_all(&ctx).await?;

    if settings.database.run_migrations {
        apply_migrations(&registry, &db).await?;
    }

    Ok((registry, db))
}

/// Run the service until a shutdown signal arrives.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    folio_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        db = %settings.database.url,
        "folio bootstrap starting"
    );

    let (registry, db) = prepare(&settings).await?;
    let ctx = InitCtx {
        settings: &settings,
    };
    registry.start_all(&ctx).await?;

    let served = folio_http::start_server(&registry, &settings, folio_http::shutdown_signal()).await;

    let stopped = registry.stop_all().await;
    db.close().await;
    tracing::info!("folio shut down");

    served?;
    stopped
}

/// Apply pending migrations and exit.
pub async fn migrate(settings: Settings) -> anyhow::Result<()> {
    folio_telemetry::init(&settings.telemetry)?;

    let db = folio_db::connect(&settings.database).await?;
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, &db);

    let applied = apply_migrations(&registry, &db).await?;
    tracing::info!(count = applied.len(), "migrations complete");

    db.close().await;
    Ok(())
}

async fn apply_migrations(
    registry: &ModuleRegistry,
    db: &Database,
) -> anyhow::Result<Vec<(String, String)>> {
    let migrations = registry.collect_migrations();
    folio_db::run_migrations(db, &migrations)
        .await
        .context("failed to apply module migrations")
}
