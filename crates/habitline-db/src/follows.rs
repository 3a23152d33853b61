use anyhow::Result;
use rusqlite::OptionalExtension;

use crate::Database;
use crate::models::UserRow;
use crate::users::map_user;

impl Database {
    pub fn create_follow(&self, id: &str, follower_id: &str, following_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO follows (id, follower_id, following_id) VALUES (?1, ?2, ?3)",
                (id, follower_id, following_id),
            )?;
            Ok(())
        })
    }

    /// Returns false when there was no such edge.
    pub fn delete_follow(&self, follower_id: &str, following_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM follows WHERE follower_id = ?1 AND following_id = ?2",
                [follower_id, following_id],
            )?;
            Ok(removed > 0)
        })
    }

    pub fn is_following(&self, follower_id: &str, following_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let found = conn
                .query_row(
                    "SELECT 1 FROM follows WHERE follower_id = ?1 AND following_id = ?2",
                    [follower_id, following_id],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();
            Ok(found)
        })
    }

    /// Ids of the users `user_id` follows; the friend set the feed is built from.
    pub fn friend_ids(&self, user_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT following_id FROM follows WHERE follower_id = ?1")?;
            let ids = stmt
                .query_map([user_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(ids)
        })
    }

    /// Users `user_id` follows, most recently followed first.
    pub fn list_following(&self, user_id: &str) -> Result<Vec<UserRow>> {
        self.list_edge_users(
            "SELECT u.id, u.username, u.email, u.password, u.is_verified, u.created_at
             FROM follows f JOIN users u ON u.id = f.following_id
             WHERE f.follower_id = ?1
             ORDER BY f.created_at DESC, f.rowid DESC",
            user_id,
        )
    }

    /// Users following `user_id`, most recent first.
    pub fn list_followers(&self, user_id: &str) -> Result<Vec<UserRow>> {
        self.list_edge_users(
            "SELECT u.id, u.username, u.email, u.password, u.is_verified, u.created_at
             FROM follows f JOIN users u ON u.id = f.follower_id
             WHERE f.following_id = ?1
             ORDER BY f.created_at DESC, f.rowid DESC",
            user_id,
        )
    }

    fn list_edge_users(&self, sql: &str, user_id: &str) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt
                .query_map([user_id], map_user)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}
