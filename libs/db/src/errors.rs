//! Shared database error helpers (SQLSTATE categorization, etc.)

/// Returns true if the given SQLSTATE code represents a unique constraint violation
/// across supported backends (Postgres 23505, SQLite 2067 and 1555 for primary keys).
pub fn is_unique_violation_code(code: &str) -> bool {
    matches!(code, "23505" | "2067" | "1555")
}

pub fn is_sqlx_unique_violation(db: &dyn sqlx::error::DatabaseError) -> bool {
    db.is_unique_violation()
        || db
            .code()
            .map(|c| is_unique_violation_code(c.as_ref()))
            .unwrap_or(false)
}

/// Convenience over a whole `sqlx::Error`: only database errors can be unique violations.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => is_sqlx_unique_violation(db.as_ref()),
        _ => false,
    }
}
