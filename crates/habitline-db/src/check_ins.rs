use anyhow::Result;
use habitline_streak::CheckInDay;
use habitline_streak::day::parse_day;
use rusqlite::{OptionalExtension, Row};
use tracing::warn;

use crate::{Database, to_count};
use crate::models::{ActivityRow, CheckInRow, UserCheckInRow};

const CHECK_IN_COLUMNS: &str = "c.id, c.habit_id, c.user_id, c.date, c.completed, c.notes, c.created_at";

impl Database {
    pub fn create_check_in(
        &self,
        id: &str,
        habit_id: &str,
        user_id: &str,
        date: &str,
        completed: bool,
        notes: Option<&str>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO check_ins (id, habit_id, user_id, date, completed, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![id, habit_id, user_id, date, completed, notes],
            )?;
            Ok(())
        })
    }

    pub fn get_check_in(&self, id: &str) -> Result<Option<CheckInRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {CHECK_IN_COLUMNS} FROM check_ins c WHERE c.id = ?1");
            Ok(conn.query_row(&sql, [id], map_check_in).optional()?)
        })
    }

    /// A check-in only if `user_id` owns it.
    pub fn get_owned_check_in(&self, id: &str, user_id: &str) -> Result<Option<CheckInRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {CHECK_IN_COLUMNS} FROM check_ins c WHERE c.id = ?1 AND c.user_id = ?2"
            );
            Ok(conn.query_row(&sql, [id, user_id], map_check_in).optional()?)
        })
    }

    pub fn get_check_in_for_day(&self, habit_id: &str, date: &str) -> Result<Option<CheckInRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {CHECK_IN_COLUMNS} FROM check_ins c WHERE c.habit_id = ?1 AND c.date = ?2"
            );
            Ok(conn.query_row(&sql, [habit_id, date], map_check_in).optional()?)
        })
    }

    pub fn update_check_in(&self, id: &str, completed: bool, notes: Option<&str>) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE check_ins SET completed = ?2, notes = ?3 WHERE id = ?1",
                rusqlite::params![id, completed, notes],
            )?;
            Ok(())
        })
    }

    /// Returns false when `user_id` owns no check-in with that id.
    pub fn delete_check_in(&self, id: &str, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM check_ins WHERE id = ?1 AND user_id = ?2",
                [id, user_id],
            )?;
            Ok(removed > 0)
        })
    }

    /// Check-ins of one habit, newest day first.
    pub fn list_habit_check_ins(&self, habit_id: &str, limit: u32, offset: i64) -> Result<Vec<CheckInRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {CHECK_IN_COLUMNS} FROM check_ins c
                 WHERE c.habit_id = ?1
                 ORDER BY c.date DESC
                 LIMIT ?2 OFFSET ?3"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params![habit_id, limit, offset], map_check_in)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_habit_check_ins(&self, habit_id: &str) -> Result<u64> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM check_ins WHERE habit_id = ?1",
                [habit_id],
                |r| r.get(0),
            )?;
            Ok(to_count(n))
        })
    }

    /// A user's check-ins across habits, newest day first, optionally for one habit.
    pub fn list_user_check_ins(
        &self,
        user_id: &str,
        habit_id: Option<&str>,
        limit: u32,
        offset: i64,
    ) -> Result<Vec<UserCheckInRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {CHECK_IN_COLUMNS}, h.name, h.category, h.frequency
                 FROM check_ins c
                 JOIN habits h ON h.id = c.habit_id
                 WHERE c.user_id = ?1 AND (?2 IS NULL OR c.habit_id = ?2)
                 ORDER BY c.date DESC, c.created_at DESC
                 LIMIT ?3 OFFSET ?4"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params![user_id, habit_id, limit, offset], |row| {
                    Ok(UserCheckInRow {
                        check_in: map_check_in(row)?,
                        habit_name: row.get(7)?,
                        habit_category: row.get(8)?,
                        habit_frequency: row.get(9)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_user_check_ins(&self, user_id: &str, habit_id: Option<&str>) -> Result<u64> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM check_ins WHERE user_id = ?1 AND (?2 IS NULL OR habit_id = ?2)",
                rusqlite::params![user_id, habit_id],
                |r| r.get(0),
            )?;
            Ok(to_count(n))
        })
    }

    pub fn count_completed_check_ins(&self, user_id: &str) -> Result<u64> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM check_ins WHERE user_id = ?1 AND completed = 1",
                [user_id],
                |r| r.get(0),
            )?;
            Ok(to_count(n))
        })
    }

    /// Completed check-in days of a habit, in no particular order. Rows whose
    /// date cannot be parsed are skipped.
    pub fn completed_check_in_days(&self, habit_id: &str) -> Result<Vec<CheckInDay>> {
        let dates: Vec<String> = self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT date FROM check_ins WHERE habit_id = ?1 AND completed = 1")?;
            let rows = stmt
                .query_map([habit_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;

        Ok(dates
            .iter()
            .filter_map(|raw| match parse_day(raw) {
                Some(date) => Some(CheckInDay::completed(date)),
                None => {
                    warn!("Corrupt check-in date '{}' on habit '{}'", raw, habit_id);
                    None
                }
            })
            .collect())
    }

    // -- Activity feed --

    /// Completed check-ins of everyone `follower_id` follows, newest first.
    pub fn list_friend_activity(&self, follower_id: &str, limit: u32, offset: i64) -> Result<Vec<ActivityRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {CHECK_IN_COLUMNS}, u.username, h.name, h.category
                 FROM follows f
                 JOIN check_ins c ON c.user_id = f.following_id
                 JOIN users u ON u.id = c.user_id
                 JOIN habits h ON h.id = c.habit_id
                 WHERE f.follower_id = ?1 AND c.completed = 1
                 ORDER BY c.date DESC, c.created_at DESC
                 LIMIT ?2 OFFSET ?3"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params![follower_id, limit, offset], |row| {
                    Ok(ActivityRow {
                        check_in: map_check_in(row)?,
                        username: row.get(7)?,
                        habit_name: row.get(8)?,
                        habit_category: row.get(9)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_friend_activity(&self, follower_id: &str) -> Result<u64> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*)
                 FROM follows f
                 JOIN check_ins c ON c.user_id = f.following_id
                 WHERE f.follower_id = ?1 AND c.completed = 1",
                [follower_id],
                |r| r.get(0),
            )?;
            Ok(to_count(n))
        })
    }
}

fn map_check_in(row: &Row<'_>) -> rusqlite::Result<CheckInRow> {
    Ok(CheckInRow {
        id: row.get(0)?,
        habit_id: row.get(1)?,
        user_id: row.get(2)?,
        date: row.get(3)?,
        completed: row.get(4)?,
        notes: row.get(5)?,
        created_at: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::is_constraint_violation;
    use crate::test_support::{db, habit, id, user};

    #[test]
    fn one_check_in_per_habit_and_day() {
        let db = db();
        let ada = user(&db, "ada");
        let read = habit(&db, &ada, "Read");

        db.create_check_in(&id(), &read, &ada, "2024-03-10", true, None).unwrap();
        let err = db
            .create_check_in(&id(), &read, &ada, "2024-03-10", false, Some("again"))
            .unwrap_err();
        assert!(is_constraint_violation(&err));

        db.create_check_in(&id(), &read, &ada, "2024-03-11", true, None).unwrap();
        assert_eq!(db.count_habit_check_ins(&read).unwrap(), 2);
    }

    #[test]
    fn completed_days_exclude_missed_check_ins() {
        let db = db();
        let ada = user(&db, "ada");
        let read = habit(&db, &ada, "Read");
        db.create_check_in(&id(), &read, &ada, "2024-03-10", true, None).unwrap();
        db.create_check_in(&id(), &read, &ada, "2024-03-09", false, None).unwrap();
        db.create_check_in(&id(), &read, &ada, "2024-03-08", true, None).unwrap();

        let mut days: Vec<NaiveDate> = db
            .completed_check_in_days(&read)
            .unwrap()
            .into_iter()
            .map(|c| c.date)
            .collect();
        days.sort();
        assert_eq!(
            days,
            vec![
                NaiveDate::from_ymd_opt(2024, 3, 8).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            ]
        );
    }

    #[test]
    fn owner_only_update_and_delete() {
        let db = db();
        let ada = user(&db, "ada");
        let bob = user(&db, "bob");
        let read = habit(&db, &ada, "Read");
        let check_in = id();
        db.create_check_in(&check_in, &read, &ada, "2024-03-10", true, None).unwrap();

        assert!(db.get_owned_check_in(&check_in, &bob).unwrap().is_none());
        assert!(!db.delete_check_in(&check_in, &bob).unwrap());

        db.update_check_in(&check_in, false, Some("rest day")).unwrap();
        let stored = db.get_check_in(&check_in).unwrap().unwrap();
        assert!(!stored.completed);
        assert_eq!(stored.notes.as_deref(), Some("rest day"));
        assert_eq!(stored.date, "2024-03-10");

        assert!(db.delete_check_in(&check_in, &ada).unwrap());
        assert!(db.get_check_in(&check_in).unwrap().is_none());
    }

    #[test]
    fn user_listing_pages_and_filters() {
        let db = db();
        let ada = user(&db, "ada");
        let read = habit(&db, &ada, "Read");
        let run = habit(&db, &ada, "Run");
        for day in 1..=5 {
            let date = format!("2024-03-{day:02}");
            db.create_check_in(&id(), &read, &ada, &date, true, None).unwrap();
        }
        db.create_check_in(&id(), &run, &ada, "2024-03-06", true, None).unwrap();

        let first = db.list_user_check_ins(&ada, None, 2, 0).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].check_in.date, "2024-03-06");
        assert_eq!(first[0].habit_name, "Run");
        assert_eq!(first[1].check_in.date, "2024-03-05");

        let only_read = db.list_user_check_ins(&ada, Some(&read), 10, 3).unwrap();
        assert_eq!(only_read.len(), 2);
        assert_eq!(only_read[1].check_in.date, "2024-03-01");

        assert_eq!(db.count_user_check_ins(&ada, None).unwrap(), 6);
        assert_eq!(db.count_user_check_ins(&ada, Some(&run)).unwrap(), 1);
    }

    #[test]
    fn feed_shows_only_followed_completed_check_ins() {
        let db = db();
        let ada = user(&db, "ada");
        let bob = user(&db, "bob");
        let eve = user(&db, "eve");
        let bob_run = habit(&db, &bob, "Run");
        let eve_read = habit(&db, &eve, "Read");

        db.create_check_in(&id(), &bob_run, &bob, "2024-03-09", true, Some("5k")).unwrap();
        db.create_check_in(&id(), &bob_run, &bob, "2024-03-10", false, None).unwrap();
        db.create_check_in(&id(), &eve_read, &eve, "2024-03-10", true, None).unwrap();

        assert!(db.list_friend_activity(&ada, 10, 0).unwrap().is_empty());

        db.create_follow(&id(), &ada, &bob).unwrap();
        let feed = db.list_friend_activity(&ada, 10, 0).unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].username, "bob");
        assert_eq!(feed[0].habit_name, "Run");
        assert_eq!(feed[0].check_in.notes.as_deref(), Some("5k"));
        assert_eq!(db.count_friend_activity(&ada).unwrap(), 1);
    }
}
