//! Row → response conversions. Corrupt stored values are logged and replaced
//! with defaults rather than failing the whole response.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::warn;
use uuid::Uuid;

use habitline_db::models::{ActivityRow, CheckInRow, HabitRow, UserCheckInRow, UserRow};
use habitline_streak::day::{format_day, parse_day};
use habitline_types::api::{
    ActivityResponse, CheckInResponse, HabitResponse, HabitSummary, ReminderSettings,
};
use habitline_types::models::{Category, Frequency, User, UserSummary};

use crate::streaks::HabitProgress;

pub(crate) fn parse_id(raw: &str, what: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}': {}", what, raw, e);
        Uuid::default()
    })
}

pub(crate) fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
            // Parse as naive UTC and convert.
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}

fn parse_date(raw: &str) -> NaiveDate {
    parse_day(raw).unwrap_or_else(|| {
        warn!("Corrupt check-in date '{}'", raw);
        NaiveDate::default()
    })
}

fn parse_category(raw: &str) -> Category {
    raw.parse().unwrap_or_else(|e| {
        warn!("{} in store", e);
        Category::default()
    })
}

fn parse_frequency(raw: &str) -> Frequency {
    raw.parse().unwrap_or_else(|e| {
        warn!("{} in store", e);
        Frequency::default()
    })
}

pub(crate) fn user(row: &UserRow) -> User {
    User {
        id: parse_id(&row.id, "user id"),
        username: row.username.clone(),
        email: row.email.clone(),
        is_verified: row.is_verified,
        created_at: parse_timestamp(&row.created_at),
    }
}

pub(crate) fn user_summary(row: &UserRow) -> UserSummary {
    UserSummary {
        id: parse_id(&row.id, "user id"),
        username: row.username.clone(),
        email: row.email.clone(),
    }
}

pub(crate) fn habit(row: HabitRow, progress: HabitProgress) -> HabitResponse {
    let today = format_day(habitline_streak::today());
    HabitResponse {
        id: parse_id(&row.id, "habit id"),
        user_id: parse_id(&row.user_id, "habit user_id"),
        category: parse_category(&row.category),
        frequency: parse_frequency(&row.frequency),
        description: row.description,
        is_active: row.is_active,
        reminder: ReminderSettings {
            enabled: row.reminder_enabled,
            time: row.reminder_time,
            sent_today: row.reminder_sent_on.as_deref() == Some(today.as_str()),
        },
        created_at: parse_timestamp(&row.created_at),
        completed_today: progress.completed_today,
        streak: progress.streak,
        name: row.name,
    }
}

pub(crate) fn check_in(row: CheckInRow, habit: Option<HabitSummary>) -> CheckInResponse {
    CheckInResponse {
        id: parse_id(&row.id, "check-in id"),
        habit_id: parse_id(&row.habit_id, "check-in habit_id"),
        user_id: parse_id(&row.user_id, "check-in user_id"),
        date: parse_date(&row.date),
        completed: row.completed,
        notes: row.notes,
        created_at: parse_timestamp(&row.created_at),
        habit,
    }
}

pub(crate) fn user_check_in(row: UserCheckInRow) -> CheckInResponse {
    let habit = HabitSummary {
        id: parse_id(&row.check_in.habit_id, "check-in habit_id"),
        name: row.habit_name,
        category: parse_category(&row.habit_category),
        frequency: parse_frequency(&row.habit_frequency),
    };
    check_in(row.check_in, Some(habit))
}

pub(crate) fn activity(row: ActivityRow, streak: u32) -> ActivityResponse {
    let c = row.check_in;
    ActivityResponse {
        id: parse_id(&c.id, "check-in id"),
        habit_id: parse_id(&c.habit_id, "check-in habit_id"),
        user_id: parse_id(&c.user_id, "check-in user_id"),
        username: row.username,
        habit_name: row.habit_name,
        category: parse_category(&row.habit_category),
        date: parse_date(&c.date),
        notes: c.notes,
        created_at: parse_timestamp(&c.created_at),
        streak,
    }
}
