use anyhow::Result;
use rusqlite::{OptionalExtension, Row};

use crate::{Database, to_count};
use crate::models::{HabitRow, ReminderRow};

const HABIT_COLUMNS: &str = "id, user_id, name, category, frequency, description, is_active, \
     reminder_enabled, reminder_time, reminder_sent_on, created_at";

pub struct NewHabit<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub name: &'a str,
    pub category: &'a str,
    pub frequency: &'a str,
    pub description: Option<&'a str>,
    pub reminder_time: Option<&'a str>,
}

impl Database {
    pub fn create_habit(&self, habit: &NewHabit<'_>) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO habits (id, user_id, name, category, frequency, description, reminder_time)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    habit.id,
                    habit.user_id,
                    habit.name,
                    habit.category,
                    habit.frequency,
                    habit.description,
                    habit.reminder_time,
                ],
            )?;
            Ok(())
        })
    }

    /// An active habit owned by `user_id`. Deleted habits and other users' habits are `None`.
    pub fn get_active_habit(&self, id: &str, user_id: &str) -> Result<Option<HabitRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {HABIT_COLUMNS} FROM habits WHERE id = ?1 AND user_id = ?2 AND is_active = 1"
            );
            Ok(conn.query_row(&sql, [id, user_id], map_habit).optional()?)
        })
    }

    /// Active habits of a user, newest first.
    pub fn list_active_habits(&self, user_id: &str) -> Result<Vec<HabitRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {HABIT_COLUMNS} FROM habits
                 WHERE user_id = ?1 AND is_active = 1
                 ORDER BY created_at DESC, rowid DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user_id], map_habit)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_active_habits(&self, user_id: &str) -> Result<u64> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM habits WHERE user_id = ?1 AND is_active = 1",
                [user_id],
                |r| r.get(0),
            )?;
            Ok(to_count(n))
        })
    }

    /// Whether another active habit of the user already uses `name`.
    pub fn active_habit_name_taken(&self, user_id: &str, name: &str, exclude_id: Option<&str>) -> Result<bool> {
        self.with_conn(|conn| {
            let taken = conn
                .query_row(
                    "SELECT 1 FROM habits
                     WHERE user_id = ?1 AND name = ?2 AND is_active = 1
                       AND (?3 IS NULL OR id != ?3)",
                    rusqlite::params![user_id, name, exclude_id],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();
            Ok(taken)
        })
    }

    /// Persist the editable fields of `habit`.
    pub fn update_habit(&self, habit: &HabitRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE habits
                 SET name = ?2, category = ?3, frequency = ?4, description = ?5,
                     reminder_enabled = ?6, reminder_time = ?7
                 WHERE id = ?1 AND is_active = 1",
                rusqlite::params![
                    habit.id,
                    habit.name,
                    habit.category,
                    habit.frequency,
                    habit.description,
                    habit.reminder_enabled,
                    habit.reminder_time,
                ],
            )?;
            Ok(())
        })
    }

    /// Soft delete. Returns false when there was no active habit to delete.
    pub fn deactivate_habit(&self, id: &str, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE habits SET is_active = 0 WHERE id = ?1 AND user_id = ?2 AND is_active = 1",
                [id, user_id],
            )?;
            Ok(changed > 0)
        })
    }

    // -- Reminders --

    /// Habits whose reminder is due at `time` (`HH:MM`) and that have no
    /// completed check-in on `day` (`YYYY-MM-DD`) yet.
    pub fn due_reminders(&self, time: &str, day: &str) -> Result<Vec<ReminderRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT h.id, h.name, u.id, u.username, u.email
                 FROM habits h
                 JOIN users u ON u.id = h.user_id
                 WHERE h.is_active = 1
                   AND h.reminder_enabled = 1
                   AND h.reminder_sent_on IS NOT ?2
                   AND h.reminder_time = ?1
                   AND NOT EXISTS (
                       SELECT 1 FROM check_ins c
                       WHERE c.habit_id = h.id AND c.date = ?2 AND c.completed = 1
                   )",
            )?;
            let rows = stmt
                .query_map([time, day], |row| {
                    Ok(ReminderRow {
                        habit_id: row.get(0)?,
                        habit_name: row.get(1)?,
                        user_id: row.get(2)?,
                        username: row.get(3)?,
                        email: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Record that the reminder for `day` went out.
    pub fn mark_reminder_sent(&self, habit_id: &str, day: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE habits SET reminder_sent_on = ?2 WHERE id = ?1",
                [habit_id, day],
            )?;
            Ok(())
        })
    }

    /// Clear reminder marks left from any day other than `today`. Returns how
    /// many habits were cleared.
    pub fn reset_reminders(&self, today: &str) -> Result<usize> {
        self.with_conn(|conn| {
            Ok(conn.execute(
                "UPDATE habits SET reminder_sent_on = NULL
                 WHERE reminder_sent_on IS NOT NULL AND reminder_sent_on != ?1",
                [today],
            )?)
        })
    }
}

fn map_habit(row: &Row<'_>) -> rusqlite::Result<HabitRow> {
    Ok(HabitRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        category: row.get(3)?,
        frequency: row.get(4)?,
        description: row.get(5)?,
        is_active: row.get(6)?,
        reminder_enabled: row.get(7)?,
        reminder_time: row.get(8)?,
        reminder_sent_on: row.get(9)?,
        created_at: row.get(10)?,
    })
}
