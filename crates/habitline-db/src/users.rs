use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row};

use crate::models::UserRow;
use crate::{Database, like_pattern};

const USER_COLUMNS: &str = "id, username, email, password, is_verified, created_at";

impl Database {
    pub fn create_user(&self, id: &str, username: &str, email: &str, password_hash: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, email, password) VALUES (?1, ?2, ?3, ?4)",
                (id, username, email, password_hash),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    /// Mark the user verified and drop every verification code they hold.
    pub fn verify_user(&self, id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute("UPDATE users SET is_verified = 1 WHERE id = ?1", [id])?;
            tx.execute("DELETE FROM otps WHERE user_id = ?1", [id])?;
            tx.commit()?;
            Ok(())
        })
    }

    /// Case-insensitive substring match on username or email, excluding `exclude_id`.
    ///
    /// `LIKE` folds ASCII only. Usernames are ASCII and emails are stored
    /// lower-cased, so the query is lower-cased here to cover the rest.
    pub fn search_users(&self, exclude_id: &str, query: &str, limit: u32) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {USER_COLUMNS} FROM users
                 WHERE id != ?1
                   AND (username LIKE ?2 ESCAPE '\\' OR email LIKE ?2 ESCAPE '\\')
                 ORDER BY username
                 LIMIT ?3"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params![exclude_id, like_pattern(&query.to_lowercase()), limit], map_user)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1");
    let row = conn.query_row(&sql, [value], map_user).optional()?;
    Ok(row)
}

pub(crate) fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        is_verified: row.get(4)?,
        created_at: row.get(5)?,
    })
}
