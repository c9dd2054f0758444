//! DDL for the `users` table.
//!
//! Running migrations is the deployment's job. [`bootstrap_schema`] exists for
//! in-memory databases (`--mock`, tests), which start empty on every connect.

use db::{DbEngine, DbHandle};
use tracing::debug;

pub const SQLITE_USERS_DDL: &str = include_str!("../../../migrations/sqlite/0001_create_users.sql");
pub const POSTGRES_USERS_DDL: &str =
    include_str!("../../../migrations/postgres/0001_create_users.sql");

/// DDL for the handle's engine.
pub fn users_ddl(engine: DbEngine) -> &'static str {
    match engine {
        DbEngine::Sqlite => SQLITE_USERS_DDL,
        DbEngine::Postgres => POSTGRES_USERS_DDL,
    }
}

/// Create the `users` table if it does not exist.
pub async fn bootstrap_schema(db: &DbHandle) -> Result<(), sqlx::Error> {
    debug!(engine = ?db.engine(), "Bootstrapping users schema");
    sqlx::raw_sql(users_ddl(db.engine()))
        .execute(db.pool())
        .await?;
    Ok(())
}
