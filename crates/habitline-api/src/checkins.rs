use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use habitline_streak::day::format_day;
use habitline_types::api::{
    CheckInPage, CheckInQuery, Claims, CreateCheckInRequest, MessageResponse, PageQuery,
    UpdateCheckInRequest,
};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::paging::Paging;
use crate::{blocking, validate, views};

const HABIT_NOT_FOUND: &str = "Habit not found";
const CHECK_IN_NOT_FOUND: &str = "Check-in not found";
const ALREADY_CHECKED_IN: &str = "Already checked in for this habit today";

/// POST /api/checkins/{habit_id}: record today's check-in for one habit.
pub async fn create_check_in(
    State(state): State<AppState>,
    Path(habit_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateCheckInRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let notes = validate::notes(req.notes.as_deref())?;
    let completed = req.completed.unwrap_or(true);
    let today = format_day(habitline_streak::today());

    let check_in_id = Uuid::new_v4().to_string();
    let user_id = claims.sub.to_string();

    let row = blocking(&state, move |db| {
        let habit_id = habit_id.to_string();
        db.get_active_habit(&habit_id, &user_id)?
            .ok_or(ApiError::NotFound(HABIT_NOT_FOUND))?;

        if db.get_check_in_for_day(&habit_id, &today)?.is_some() {
            return Err(ApiError::Conflict(ALREADY_CHECKED_IN));
        }

        // The unique (habit_id, date) index catches a racing second request
        db.create_check_in(&check_in_id, &habit_id, &user_id, &today, completed, notes.as_deref())
            .map_err(|e| ApiError::conflict_or_internal(e, ALREADY_CHECKED_IN))?;

        db.get_check_in(&check_in_id)?
            .ok_or_else(|| anyhow::anyhow!("Check-in {} vanished after insert", check_in_id).into())
    })
    .await?;

    info!("User {} checked in habit {} for {}", claims.username, habit_id, row.date);
    Ok((StatusCode::CREATED, Json(views::check_in(row, None))))
}

/// GET /api/checkins/habit/{habit_id}
pub async fn list_habit_check_ins(
    State(state): State<AppState>,
    Path(habit_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let paging = Paging::new(query.page, query.limit, 30);
    let user_id = claims.sub.to_string();

    let (rows, total) = blocking(&state, move |db| {
        let habit_id = habit_id.to_string();
        db.get_active_habit(&habit_id, &user_id)?
            .ok_or(ApiError::NotFound(HABIT_NOT_FOUND))?;

        let rows = db.list_habit_check_ins(&habit_id, paging.limit, paging.offset())?;
        let total = db.count_habit_check_ins(&habit_id)?;
        Ok((rows, total))
    })
    .await?;

    let check_ins: Vec<_> = rows.into_iter().map(|row| views::check_in(row, None)).collect();
    Ok(Json(CheckInPage {
        pagination: paging.pagination(check_ins.len(), total),
        check_ins,
    }))
}

/// GET /api/checkins: the caller's check-ins across habits, each with its habit.
pub async fn list_check_ins(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<CheckInQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let paging = Paging::new(query.page, query.limit, 50);
    let user_id = claims.sub.to_string();
    let habit_id = query.habit_id.map(|id| id.to_string());

    let (rows, total) = blocking(&state, move |db| {
        let rows = db.list_user_check_ins(&user_id, habit_id.as_deref(), paging.limit, paging.offset())?;
        let total = db.count_user_check_ins(&user_id, habit_id.as_deref())?;
        Ok((rows, total))
    })
    .await?;

    let check_ins: Vec<_> = rows.into_iter().map(views::user_check_in).collect();
    Ok(Json(CheckInPage {
        pagination: paging.pagination(check_ins.len(), total),
        check_ins,
    }))
}

pub async fn update_check_in(
    State(state): State<AppState>,
    Path(check_in_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateCheckInRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Absent notes keep the current text; blank notes clear it
    let notes = req
        .notes
        .as_deref()
        .map(|n| validate::notes(Some(n)))
        .transpose()?;
    let user_id = claims.sub.to_string();

    let row = blocking(&state, move |db| {
        let check_in_id = check_in_id.to_string();
        let current = db
            .get_owned_check_in(&check_in_id, &user_id)?
            .ok_or(ApiError::NotFound(CHECK_IN_NOT_FOUND))?;

        let completed = req.completed.unwrap_or(current.completed);
        let notes = notes.unwrap_or(current.notes);
        db.update_check_in(&check_in_id, completed, notes.as_deref())?;

        db.get_check_in(&check_in_id)?
            .ok_or(ApiError::NotFound(CHECK_IN_NOT_FOUND))
    })
    .await?;

    Ok(Json(views::check_in(row, None)))
}

pub async fn delete_check_in(
    State(state): State<AppState>,
    Path(check_in_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = claims.sub.to_string();
    let removed = blocking(&state, move |db| {
        Ok(db.delete_check_in(&check_in_id.to_string(), &user_id)?)
    })
    .await?;

    if !removed {
        return Err(ApiError::NotFound(CHECK_IN_NOT_FOUND));
    }
    Ok(Json(MessageResponse::new("Check-in deleted successfully")))
}
