//! The one place handlers turn a habit's stored check-ins into a streak.

use chrono::NaiveDate;
use tracing::warn;

use habitline_db::Database;
use habitline_streak::{completed_on, compute_streak};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HabitProgress {
    pub streak: u32,
    pub completed_today: bool,
}

/// Streak and completed-today flag of one habit as of `today`. A store
/// failure is logged and reported as no progress, so one bad habit cannot
/// fail a listing or feed response.
pub fn habit_progress(db: &Database, habit_id: &str, today: NaiveDate) -> HabitProgress {
    match db.completed_check_in_days(habit_id) {
        Ok(days) => HabitProgress {
            streak: compute_streak(&days, today),
            completed_today: completed_on(&days, today),
        },
        Err(e) => {
            warn!("Streak calculation failed for habit {}: {:#}", habit_id, e);
            HabitProgress::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use habitline_db::habits::NewHabit;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn progress_reads_completed_days_from_the_store() {
        let db = Database::open_in_memory().unwrap();
        db.create_user("u1", "ada", "ada@example.com", "hash").unwrap();
        db.create_habit(&NewHabit {
            id: "h1",
            user_id: "u1",
            name: "Read",
            category: "learning",
            frequency: "daily",
            description: None,
            reminder_time: None,
        })
        .unwrap();
        db.create_check_in("c1", "h1", "u1", "2024-03-10", true, None).unwrap();
        db.create_check_in("c2", "h1", "u1", "2024-03-09", true, None).unwrap();
        db.create_check_in("c3", "h1", "u1", "2024-03-08", true, None).unwrap();
        db.create_check_in("c4", "h1", "u1", "2024-03-05", true, None).unwrap();

        assert_eq!(
            habit_progress(&db, "h1", day(10)),
            HabitProgress { streak: 3, completed_today: true }
        );
        assert_eq!(
            habit_progress(&db, "h1", day(11)),
            HabitProgress { streak: 3, completed_today: false }
        );
        assert_eq!(habit_progress(&db, "h1", day(12)), HabitProgress::default());
    }

    #[test]
    fn unknown_habit_has_no_progress() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(habit_progress(&db, "missing", day(10)), HabitProgress::default());
    }
}
