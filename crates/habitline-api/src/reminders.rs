use std::time::Duration;

use chrono::{Local, NaiveDate, NaiveDateTime};
use tracing::{debug, info, warn};

use habitline_db::Database;
use habitline_streak::day::format_day;

use crate::auth::AppState;
use crate::mailer::Mail;

/// Background task that mails habit reminders.
///
/// Every `interval_secs` it clears reminder marks left from earlier days,
/// then mails every habit whose reminder time is the current minute and
/// which has not been completed today. Sent marks carry their day in the
/// store, so a restart neither repeats nor suppresses a reminder.
pub async fn run_reminder_loop(state: AppState, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        interval.tick().await;
        tick(&state, Local::now().naive_local()).await;
    }
}

/// One scheduler pass as of `now` (server-local wall clock).
pub async fn tick(state: &AppState, now: NaiveDateTime) {
    match reset_day(state, now.date()).await {
        Ok(reset) => {
            if reset > 0 {
                info!("Reminders: day {}, cleared {} earlier reminder marks", now.date(), reset);
            }
        }
        Err(e) => warn!("Reminder reset error: {:#}", e),
    }

    match send_due_reminders(state, now).await {
        Ok(sent) => {
            if sent > 0 {
                info!("Reminders: sent {} at {}", sent, now.format("%H:%M"));
            }
        }
        Err(e) => warn!("Reminder error: {:#}", e),
    }
}

async fn reset_day(state: &AppState, today: NaiveDate) -> anyhow::Result<usize> {
    let today = format_day(today);
    with_db(state, move |db| {
        let reset = db.reset_reminders(&today)?;
        let purged = db.purge_expired_otps()?;
        if purged > 0 {
            debug!("Purged {} expired verification codes", purged);
        }
        Ok(reset)
    })
    .await
}

async fn send_due_reminders(state: &AppState, now: NaiveDateTime) -> anyhow::Result<usize> {
    let time = now.format("%H:%M").to_string();
    let day = format_day(now.date());
    let due = {
        let day = day.clone();
        with_db(state, move |db| db.due_reminders(&time, &day)).await?
    };

    let mut sent = 0;
    for reminder in due {
        let mail = Mail::reminder(&reminder.email, &reminder.username, &reminder.habit_name);
        if let Err(e) = state.mailer.send(&mail).await {
            // Left unmarked; the next tick in this minute retries
            warn!("Reminder for habit {} to {} failed: {:#}", reminder.habit_id, reminder.email, e);
            continue;
        }

        let (habit_id, day) = (reminder.habit_id, day.clone());
        with_db(state, move |db| db.mark_reminder_sent(&habit_id, &day)).await?;
        sent += 1;
    }

    Ok(sent)
}

async fn with_db<F, T>(state: &AppState, f: F) -> anyhow::Result<T>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db)).await?
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::auth::AppStateInner;
    use crate::mailer::Mailer;
    use crate::test_support::TestApp;
    use habitline_db::habits::NewHabit;

    fn at(day: u32, time: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("2024-03-{day:02} {time}"), "%Y-%m-%d %H:%M").unwrap()
    }

    fn seed(db: &Database, reminder_time: &str) {
        db.create_user("u1", "ada", "ada@example.com", "hash").unwrap();
        db.create_habit(&NewHabit {
            id: "h1",
            user_id: "u1",
            name: "Read",
            category: "learning",
            frequency: "daily",
            description: None,
            reminder_time: Some(reminder_time),
        })
        .unwrap();
    }

    #[tokio::test]
    async fn reminder_goes_out_once_per_day() {
        let app = TestApp::new();
        seed(&app.state.db, "21:00");

        tick(&app.state, at(10, "20:59")).await;
        assert!(app.sent_mail().is_empty());

        tick(&app.state, at(10, "21:00")).await;
        tick(&app.state, at(10, "21:00")).await;
        let mails = app.sent_mail();
        assert_eq!(mails.len(), 1);
        assert_eq!(mails[0].to, "ada@example.com");
        assert!(mails[0].subject.contains("Read"));

        // Next day the mark from the 10th is cleared and the reminder fires again
        tick(&app.state, at(11, "00:00")).await;
        let habit = app.state.db.get_active_habit("h1", "u1").unwrap().unwrap();
        assert_eq!(habit.reminder_sent_on, None);
        tick(&app.state, at(11, "21:00")).await;
        assert_eq!(app.sent_mail().len(), 2);
    }

    #[tokio::test]
    async fn restart_across_midnight_still_reminds() {
        let app = TestApp::new();
        seed(&app.state.db, "21:00");

        tick(&app.state, at(10, "21:00")).await;
        assert_eq!(app.sent_mail().len(), 1);

        // Down over midnight: no reset tick ran, the first tick seen is the 11th at 21:00
        tick(&app.state, at(11, "21:00")).await;
        assert_eq!(app.sent_mail().len(), 2);

        let habit = app.state.db.get_active_habit("h1", "u1").unwrap().unwrap();
        assert_eq!(habit.reminder_sent_on.as_deref(), Some("2024-03-11"));
    }

    #[tokio::test]
    async fn completed_habits_are_not_reminded() {
        let app = TestApp::new();
        seed(&app.state.db, "07:30");
        app.state
            .db
            .create_check_in("c1", "h1", "u1", "2024-03-10", true, None)
            .unwrap();
        app.state
            .db
            .create_check_in("c2", "h1", "u1", "2024-03-11", false, None)
            .unwrap();

        tick(&app.state, at(10, "07:30")).await;
        assert!(app.sent_mail().is_empty());

        // A missed check-in does not count as done
        tick(&app.state, at(11, "07:30")).await;
        assert_eq!(app.sent_mail().len(), 1);
    }

    #[tokio::test]
    async fn disabled_and_deleted_habits_are_skipped() {
        let app = TestApp::new();
        seed(&app.state.db, "09:00");
        let mut habit = app.state.db.get_active_habit("h1", "u1").unwrap().unwrap();
        habit.reminder_enabled = false;
        app.state.db.update_habit(&habit).unwrap();

        tick(&app.state, at(10, "09:00")).await;
        assert!(app.sent_mail().is_empty());

        habit.reminder_enabled = true;
        app.state.db.update_habit(&habit).unwrap();
        app.state.db.deactivate_habit("h1", "u1").unwrap();
        tick(&app.state, at(10, "09:00")).await;
        assert!(app.sent_mail().is_empty());
    }

    #[tokio::test]
    async fn failed_delivery_leaves_habit_unmarked() {
        let state = Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            jwt_secret: "test-secret".into(),
            // Nothing listens on the discard port
            mailer: Mailer::relay("http://127.0.0.1:9/send", "noreply@habitline.app"),
        });
        seed(&state.db, "21:00");

        tick(&state, at(10, "21:00")).await;

        let habit = state.db.get_active_habit("h1", "u1").unwrap().unwrap();
        assert_eq!(habit.reminder_sent_on, None);
    }
}
