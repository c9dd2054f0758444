use sqlx::FromRow;

use crate::contract::model::AccountProfile;
use crate::domain::model::Account;

/// A full row of the `users` table.
#[derive(Debug, Clone, FromRow)]
pub struct AccountRow {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub email: String,
}

/// `users` row without the password column, as returned by profile updates.
#[derive(Debug, Clone, FromRow)]
pub struct ProfileRow {
    pub id: i64,
    pub username: String,
    pub email: String,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password,
        }
    }
}

impl From<ProfileRow> for AccountProfile {
    fn from(row: ProfileRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            email: row.email,
        }
    }
}
