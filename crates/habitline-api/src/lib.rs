pub mod auth;
pub mod checkins;
pub mod error;
pub mod habits;
pub mod health;
pub mod mailer;
pub mod middleware;
pub mod paging;
pub mod reminders;
pub mod social;
pub mod streaks;
pub mod validate;
pub mod verify;
mod views;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post, put},
};
use tracing::error;

use habitline_db::Database;

use crate::auth::AppState;
use crate::error::ApiError;

/// All API routes. Verification and auth entry points are public; the rest
/// sit behind `require_auth`.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/health", get(health::health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/verify/sendOtp", post(verify::send_otp))
        .route("/api/verify/otp", post(verify::verify_otp))
        .route("/api/verify/isVerified/{user_id}", get(verify::is_verified));

    let protected_routes = Router::new()
        .route("/api/auth/profile", get(auth::profile))
        .route("/api/habits", get(habits::list_habits).post(habits::create_habit))
        .route("/api/habits/{id}", put(habits::update_habit).delete(habits::delete_habit))
        .route("/api/checkins", get(checkins::list_check_ins))
        .route("/api/checkins/habit/{habit_id}", get(checkins::list_habit_check_ins))
        .route(
            "/api/checkins/{id}",
            post(checkins::create_check_in)
                .put(checkins::update_check_in)
                .delete(checkins::delete_check_in),
        )
        .route("/api/social/search", get(social::search_users))
        .route(
            "/api/social/follow/{user_id}",
            post(social::follow_user).delete(social::unfollow_user),
        )
        .route("/api/social/following", get(social::following))
        .route("/api/social/followers", get(social::followers))
        .route("/api/social/activity", get(social::activity_feed))
        .route("/api/social/profile/{user_id}", get(social::user_profile))
        .route_layer(axum_middleware::from_fn_with_state(state.clone(), middleware::require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(health::not_found)
        .with_state(state)
}

/// Run store work on the blocking pool, off the async runtime.
pub(crate) async fn blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow::anyhow!("blocking task failed: {}", e))
        })?
}
