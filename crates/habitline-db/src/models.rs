//! Database row types. These map directly to SQLite rows.
//! Distinct from habitline-types API models to keep the DB layer independent.

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub is_verified: bool,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct HabitRow {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub category: String,
    pub frequency: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub reminder_enabled: bool,
    pub reminder_time: Option<String>,
    pub reminder_sent_on: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct CheckInRow {
    pub id: String,
    pub habit_id: String,
    pub user_id: String,
    pub date: String,
    pub completed: bool,
    pub notes: Option<String>,
    pub created_at: String,
}

/// A check-in joined with the habit it belongs to.
#[derive(Debug, Clone)]
pub struct UserCheckInRow {
    pub check_in: CheckInRow,
    pub habit_name: String,
    pub habit_category: String,
    pub habit_frequency: String,
}

/// A followed user's completed check-in, as shown in the activity feed.
#[derive(Debug, Clone)]
pub struct ActivityRow {
    pub check_in: CheckInRow,
    pub username: String,
    pub habit_name: String,
    pub habit_category: String,
}

#[derive(Debug, Clone)]
pub struct ReminderRow {
    pub habit_id: String,
    pub habit_name: String,
    pub user_id: String,
    pub username: String,
    pub email: String,
}
