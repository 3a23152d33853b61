use anyhow::Result;
use rusqlite::OptionalExtension;

use crate::Database;

impl Database {
    /// Store a hashed verification code valid for `ttl_secs` from now.
    pub fn insert_otp(&self, id: &str, user_id: &str, code_hash: &str, ttl_secs: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO otps (id, user_id, code_hash, expires_at)
                 VALUES (?1, ?2, ?3, datetime('now', ?4))",
                rusqlite::params![id, user_id, code_hash, format!("{ttl_secs:+} seconds")],
            )?;
            Ok(())
        })
    }

    pub fn has_valid_otp(&self, user_id: &str, code_hash: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let found = conn
                .query_row(
                    "SELECT 1 FROM otps
                     WHERE user_id = ?1 AND code_hash = ?2 AND expires_at > datetime('now')",
                    [user_id, code_hash],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();
            Ok(found)
        })
    }

    /// Drop codes past their expiry. Returns how many were removed.
    pub fn purge_expired_otps(&self) -> Result<usize> {
        self.with_conn(|conn| {
            Ok(conn.execute("DELETE FROM otps WHERE expires_at <= datetime('now')", [])?)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::{db, id, user};

    #[test]
    fn code_is_valid_until_it_expires() {
        let db = db();
        let ada = user(&db, "ada");

        db.insert_otp(&id(), &ada, "fresh", 300).unwrap();
        db.insert_otp(&id(), &ada, "stale", -1).unwrap();

        assert!(db.has_valid_otp(&ada, "fresh").unwrap());
        assert!(!db.has_valid_otp(&ada, "stale").unwrap());
        assert!(!db.has_valid_otp(&ada, "unknown").unwrap());
    }

    #[test]
    fn codes_belong_to_one_user() {
        let db = db();
        let ada = user(&db, "ada");
        let bob = user(&db, "bob");
        db.insert_otp(&id(), &ada, "code", 300).unwrap();

        assert!(!db.has_valid_otp(&bob, "code").unwrap());
    }

    #[test]
    fn purge_removes_only_expired() {
        let db = db();
        let ada = user(&db, "ada");
        db.insert_otp(&id(), &ada, "fresh", 300).unwrap();
        db.insert_otp(&id(), &ada, "stale", -60).unwrap();

        assert_eq!(db.purge_expired_otps().unwrap(), 1);
        assert!(db.has_valid_otp(&ada, "fresh").unwrap());
    }
}
