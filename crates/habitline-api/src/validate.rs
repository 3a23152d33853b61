//! Request field validation. Each helper returns the normalised value or a
//! `BadRequest` carrying a message fit for the client.

use chrono::NaiveTime;

use habitline_types::models::{Category, Frequency};

use crate::error::ApiError;

pub const MAX_HABIT_NAME: usize = 100;
pub const MAX_DESCRIPTION: usize = 500;
pub const MAX_NOTES: usize = 200;
pub const MIN_PASSWORD: usize = 6;

fn bad(message: impl Into<String>) -> ApiError {
    ApiError::BadRequest(message.into())
}

pub fn username(raw: &str) -> Result<String, ApiError> {
    let name = raw.trim();
    let len = name.chars().count();
    if !(3..=32).contains(&len) {
        return Err(bad("Username must be between 3 and 32 characters"));
    }
    // ASCII only: SQLite matches case-insensitively on ASCII letters alone
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.') {
        return Err(bad("Username may only contain ASCII letters, digits, '_', '-' and '.'"));
    }
    Ok(name.to_string())
}

/// Lower-cased `local@domain.tld`.
pub fn email(raw: &str) -> Result<String, ApiError> {
    let email = raw.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
        }
        None => false,
    };

    if valid {
        Ok(email)
    } else {
        Err(bad("Please enter a valid email address"))
    }
}

pub fn password(raw: &str) -> Result<(), ApiError> {
    if raw.chars().count() < MIN_PASSWORD {
        return Err(bad(format!("Password must be at least {MIN_PASSWORD} characters")));
    }
    Ok(())
}

pub fn habit_name(raw: &str) -> Result<String, ApiError> {
    let name = raw.trim();
    let len = name.chars().count();
    if len == 0 || len > MAX_HABIT_NAME {
        return Err(bad(format!(
            "Habit name must be between 1 and {MAX_HABIT_NAME} characters"
        )));
    }
    Ok(name.to_string())
}

pub fn category(raw: &str) -> Result<Category, ApiError> {
    raw.trim().parse().map_err(|e| bad(format!("{e}")))
}

pub fn frequency(raw: &str) -> Result<Frequency, ApiError> {
    raw.trim()
        .parse()
        .map_err(|_| bad("Frequency must be daily or weekly"))
}

/// Trimmed optional text; blank becomes `None`.
fn optional_text(raw: Option<&str>, max: usize, field: &str) -> Result<Option<String>, ApiError> {
    let Some(text) = raw.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    if text.chars().count() > max {
        return Err(bad(format!("{field} must be at most {max} characters")));
    }
    Ok(Some(text.to_string()))
}

pub fn description(raw: Option<&str>) -> Result<Option<String>, ApiError> {
    optional_text(raw, MAX_DESCRIPTION, "Description")
}

pub fn notes(raw: Option<&str>) -> Result<Option<String>, ApiError> {
    optional_text(raw, MAX_NOTES, "Notes")
}

/// 24-hour `HH:MM`, normalised to two-digit fields. Blank clears the time.
pub fn reminder_time(raw: Option<&str>) -> Result<Option<String>, ApiError> {
    let Some(text) = raw.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    let time = NaiveTime::parse_from_str(text, "%H:%M")
        .map_err(|_| bad("Reminder time must be HH:MM (24-hour)"))?;
    Ok(Some(time.format("%H:%M").to_string()))
}

pub fn search_query(raw: Option<&str>) -> Result<String, ApiError> {
    let q = raw.map(str::trim).unwrap_or_default();
    if q.chars().count() < 2 {
        return Err(bad("Search query must be at least 2 characters"));
    }
    Ok(q.to_string())
}
