use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use habitline_db::habits::NewHabit;
use habitline_types::api::{Claims, CreateHabitRequest, MessageResponse, UpdateHabitRequest};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::streaks::{HabitProgress, habit_progress};
use crate::{blocking, validate, views};

const DUPLICATE_NAME: &str = "You already have a habit with this name";
const NOT_FOUND: &str = "Habit not found";

/// GET /api/habits: the caller's active habits with today's progress.
pub async fn list_habits(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let habits = blocking(&state, move |db| {
        let today = habitline_streak::today();
        let rows = db.list_active_habits(&claims.sub.to_string())?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let progress = habit_progress(db, &row.id, today);
                views::habit(row, progress)
            })
            .collect::<Vec<_>>())
    })
    .await?;

    Ok(Json(habits))
}

pub async fn create_habit(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateHabitRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = validate::habit_name(&req.name)?;
    let category = req.category.as_deref().map(validate::category).transpose()?.unwrap_or_default();
    let frequency = req.frequency.as_deref().map(validate::frequency).transpose()?.unwrap_or_default();
    let description = validate::description(req.description.as_deref())?;
    let reminder_time = validate::reminder_time(req.reminder_time.as_deref())?;

    let habit_id = Uuid::new_v4().to_string();
    let user_id = claims.sub.to_string();

    let row = blocking(&state, move |db| {
        if db.active_habit_name_taken(&user_id, &name, None)? {
            return Err(ApiError::Conflict(DUPLICATE_NAME));
        }

        db.create_habit(&NewHabit {
            id: &habit_id,
            user_id: &user_id,
            name: &name,
            category: category.as_str(),
            frequency: frequency.as_str(),
            description: description.as_deref(),
            reminder_time: reminder_time.as_deref(),
        })
        .map_err(|e| ApiError::conflict_or_internal(e, DUPLICATE_NAME))?;

        db.get_active_habit(&habit_id, &user_id)?
            .ok_or_else(|| anyhow::anyhow!("Habit {} vanished after insert", habit_id).into())
    })
    .await?;

    info!("User {} created habit '{}'", claims.username, row.name);
    Ok((StatusCode::CREATED, Json(views::habit(row, HabitProgress::default()))))
}

pub async fn update_habit(
    State(state): State<AppState>,
    Path(habit_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateHabitRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = req.name.as_deref().map(validate::habit_name).transpose()?;
    let category = req.category.as_deref().map(validate::category).transpose()?;
    let frequency = req.frequency.as_deref().map(validate::frequency).transpose()?;
    let description = req
        .description
        .as_deref()
        .map(|d| validate::description(Some(d)))
        .transpose()?;
    let reminder_time = req
        .reminder_time
        .as_deref()
        .map(|t| validate::reminder_time(Some(t)))
        .transpose()?;

    let user_id = claims.sub.to_string();
    let habit = blocking(&state, move |db| {
        let habit_id = habit_id.to_string();
        let mut row = db
            .get_active_habit(&habit_id, &user_id)?
            .ok_or(ApiError::NotFound(NOT_FOUND))?;

        if let Some(name) = name {
            if name != row.name && db.active_habit_name_taken(&user_id, &name, Some(&habit_id))? {
                return Err(ApiError::Conflict(DUPLICATE_NAME));
            }
            row.name = name;
        }
        if let Some(category) = category {
            row.category = category.as_str().to_string();
        }
        if let Some(frequency) = frequency {
            row.frequency = frequency.as_str().to_string();
        }
        if let Some(description) = description {
            row.description = description;
        }
        if let Some(enabled) = req.reminder_enabled {
            row.reminder_enabled = enabled;
        }
        if let Some(time) = reminder_time {
            row.reminder_time = time;
        }

        db.update_habit(&row)
            .map_err(|e| ApiError::conflict_or_internal(e, DUPLICATE_NAME))?;

        let progress = habit_progress(db, &row.id, habitline_streak::today());
        Ok(views::habit(row, progress))
    })
    .await?;

    Ok(Json(habit))
}

/// DELETE /api/habits/{id}: soft delete; check-ins are kept.
pub async fn delete_habit(
    State(state): State<AppState>,
    Path(habit_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = claims.sub.to_string();
    let removed = blocking(&state, move |db| {
        Ok(db.deactivate_habit(&habit_id.to_string(), &user_id)?)
    })
    .await?;

    if !removed {
        return Err(ApiError::NotFound(NOT_FOUND));
    }
    Ok(Json(MessageResponse::new("Habit deleted successfully")))
}
