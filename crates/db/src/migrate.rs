//! Forward-only schema migrations contributed by modules

use time::OffsetDateTime;

use crate::{Database, StoreError, StoreResult};

/// Migration definition for modules
#[derive(Debug, Clone)]
pub struct Migration {
    pub id: &'static str,
    pub up: &'static str,
}

const LEDGER_DDL: &str = r#"
    CREATE TABLE IF NOT EXISTS _migrations (
        module     TEXT NOT NULL,
        id         TEXT NOT NULL,
        applied_at TEXT NOT NULL,
        PRIMARY KEY (module, id)
    );
"#;

impl Database {
    /// Apply every migration not yet recorded in the `_migrations` ledger.
    ///
    /// Each migration runs in its own transaction together with its ledger row.
    /// Returns the number of migrations applied by this call.
    pub async fn apply_migrations(&self, migrations: &[(String, Migration)]) -> StoreResult<usize> {
        sqlx::query(LEDGER_DDL).execute(self.pool()).await?;

        let mut applied = 0;
        for (module, migration) in migrations {
            let already: Option<i64> =
                sqlx::query_scalar("SELECT 1 FROM _migrations WHERE module = ? AND id = ?")
                    .bind(module)
                    .bind(migration.id)
                    .fetch_optional(self.pool())
                    .await?;
            if already.is_some() {
                tracing::debug!(module = %module, migration = migration.id, "migration already applied");
                continue;
            }

            let wrap = |source: sqlx::Error| StoreError::Migration {
                module: module.clone(),
                id: migration.id,
                source,
            };

            let mut tx = self.pool().begin().await?;
            sqlx::raw_sql(migration.up)
                .execute(&mut *tx)
                .await
                .map_err(wrap)?;
            sqlx::query("INSERT INTO _migrations (module, id, applied_at) VALUES (?, ?, ?)")
                .bind(module)
                .bind(migration.id)
                .bind(OffsetDateTime::now_utc())
                .execute(&mut *tx)
                .await
                .map_err(wrap)?;
            tx.commit().await?;

            tracing::info!(module = %module, migration = migration.id, "migration applied");
            applied += 1;
        }

        Ok(applied)
    }
}
