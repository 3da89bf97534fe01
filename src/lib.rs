//! Shelf application library
//!
//! Wires the books, reviews, and demo modules into the kernel and drives the
//! process lifecycle: connect, init, migrate, start, serve, stop, close.

use std::future::Future;

use anyhow::Context;
use shelf_kernel::{settings::Settings, Database, InitCtx, ModuleRegistry};

pub mod modules;

#[cfg(test)]
mod testing;

pub use modules::register_all;

/// Registry holding every application module
pub fn registry() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    register_all(&mut registry);
    registry
}

/// Open the configured database
pub async fn connect(settings: &Settings) -> anyhow::Result<Database> {
    Database::connect(&settings.database.url, settings.database.max_connections).await
}

/// Apply pending migrations from every module and close the store
pub async fn migrate(settings: &Settings) -> anyhow::Result<usize> {
    let db = connect(settings).await?;
    let applied = db
        .apply_migrations(&registry().collect_migrations())
        .await
        .context("failed to apply migrations");
    db.close().await;
    applied
}

/// Serve until Ctrl-C or SIGTERM
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    run_until(settings, shelf_http::shutdown_signal()).await
}

/// Run the full lifecycle, serving HTTP until `shutdown` resolves
pub async fn run_until(
    settings: Settings,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let db = connect(&settings).await?;
    let registry = registry();
    let ctx = InitCtx {
        settings: &settings,
        db: &db,
    };

    let served = serve(&registry, &ctx, shutdown).await;

    let stopped = registry.stop_modules().await;
    db.close().await;

    served.and(stopped)
}

async fn serve(
    registry: &ModuleRegistry,
    ctx: &InitCtx<'_>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    registry.init_modules(ctx).await?;

    let applied = ctx
        .db
        .apply_migrations(&registry.collect_migrations())
        .await
        .context("failed to apply migrations")?;
    tracing::info!(applied, "database schema up to date");

    registry.start_modules(ctx).await?;
    shelf_http::start_server(registry, ctx, shutdown).await
}
