use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Category, Frequency, UserSummary};

// -- JWT Claims --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Common --

/// Plain `{"message": ...}` body used for acknowledgements and errors.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<u32>,
    pub page: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// 1-based page that was returned.
    pub current: u32,
    /// Number of pages.
    pub total: u64,
    /// Items on this page.
    pub count: usize,
    pub total_count: u64,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, count: usize, total_count: u64) -> Self {
        let limit = u64::from(limit.max(1));
        Self {
            current: page,
            total: total_count.div_ceil(limit),
            count,
            total_count,
        }
    }
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub is_verified: bool,
    pub token: String,
}

// -- Habits --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateHabitRequest {
    pub name: String,
    pub category: Option<String>,
    pub frequency: Option<String>,
    pub description: Option<String>,
    /// `HH:MM`, 24-hour.
    pub reminder_time: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateHabitRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub frequency: Option<String>,
    pub description: Option<String>,
    pub reminder_enabled: Option<bool>,
    /// Empty string clears the reminder time.
    pub reminder_time: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderSettings {
    pub enabled: bool,
    pub time: Option<String>,
    pub sent_today: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub category: Category,
    pub frequency: Frequency,
    pub description: Option<String>,
    pub is_active: bool,
    pub reminder: ReminderSettings,
    pub created_at: DateTime<Utc>,
    pub completed_today: bool,
    pub streak: u32,
}

// -- Check-ins --

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCheckInRequest {
    pub completed: Option<bool>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateCheckInRequest {
    pub completed: Option<bool>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CheckInQuery {
    pub limit: Option<u32>,
    pub page: Option<u32>,
    pub habit_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitSummary {
    pub id: Uuid,
    pub name: String,
    pub category: Category,
    pub frequency: Frequency,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckInResponse {
    pub id: Uuid,
    pub habit_id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub completed: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub habit: Option<HabitSummary>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckInPage {
    pub check_ins: Vec<CheckInResponse>,
    pub pagination: Pagination,
}

// -- Social --

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityResponse {
    pub id: Uuid,
    pub habit_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub habit_name: String,
    pub category: Category,
    pub date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub streak: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActivityPage {
    pub activities: Vec<ActivityResponse>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileStats {
    pub total_habits: u64,
    pub total_check_ins: u64,
    pub longest_streak: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub user: UserSummary,
    pub stats: ProfileStats,
    pub is_following: bool,
}

// -- Verification --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendOtpRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerifyOtpRequest {
    pub user_id: Uuid,
    pub otp: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerificationStatus {
    pub verified: bool,
}
