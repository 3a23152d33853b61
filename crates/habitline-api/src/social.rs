use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use habitline_types::api::{
    ActivityPage, Claims, MessageResponse, PageQuery, ProfileResponse, ProfileStats, SearchQuery,
};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::paging::{MAX_LIMIT, Paging};
use crate::streaks::habit_progress;
use crate::{blocking, validate, views};

const USER_NOT_FOUND: &str = "User not found";
const ALREADY_FOLLOWING: &str = "Already following this user";

pub async fn search_users(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let q = validate::search_query(query.q.as_deref())?;
    let limit = query.limit.unwrap_or(10).clamp(1, MAX_LIMIT);

    let users = blocking(&state, move |db| {
        Ok(db.search_users(&claims.sub.to_string(), &q, limit)?)
    })
    .await?;

    Ok(Json(users.iter().map(views::user_summary).collect::<Vec<_>>()))
}

pub async fn follow_user(
    State(state): State<AppState>,
    Path(target_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    if target_id == claims.sub {
        return Err(ApiError::BadRequest("You cannot follow yourself".into()));
    }

    let follower_id = claims.sub.to_string();
    let target = blocking(&state, move |db| {
        let target_id = target_id.to_string();
        let target = db
            .get_user_by_id(&target_id)?
            .ok_or(ApiError::NotFound(USER_NOT_FOUND))?;

        if db.is_following(&follower_id, &target_id)? {
            return Err(ApiError::Conflict(ALREADY_FOLLOWING));
        }
        db.create_follow(&Uuid::new_v4().to_string(), &follower_id, &target_id)
            .map_err(|e| ApiError::conflict_or_internal(e, ALREADY_FOLLOWING))?;
        Ok(target)
    })
    .await?;

    info!("User {} now follows {}", claims.username, target.username);
    Ok((StatusCode::CREATED, Json(MessageResponse::new("Successfully followed user"))))
}

pub async fn unfollow_user(
    State(state): State<AppState>,
    Path(target_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let removed = blocking(&state, move |db| {
        Ok(db.delete_follow(&claims.sub.to_string(), &target_id.to_string())?)
    })
    .await?;

    if !removed {
        return Err(ApiError::NotFound("Not following this user"));
    }
    Ok(Json(MessageResponse::new("Successfully unfollowed user")))
}

pub async fn following(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let users = blocking(&state, move |db| Ok(db.list_following(&claims.sub.to_string())?)).await?;
    Ok(Json(users.iter().map(views::user_summary).collect::<Vec<_>>()))
}

pub async fn followers(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let users = blocking(&state, move |db| Ok(db.list_followers(&claims.sub.to_string())?)).await?;
    Ok(Json(users.iter().map(views::user_summary).collect::<Vec<_>>()))
}

/// GET /api/social/activity: completed check-ins of followed users, each
/// with the habit's current streak.
pub async fn activity_feed(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let paging = Paging::new(query.page, query.limit, 20);
    let user_id = claims.sub.to_string();

    let page = blocking(&state, move |db| {
        if db.friend_ids(&user_id)?.is_empty() {
            return Ok(ActivityPage {
                activities: Vec::new(),
                pagination: paging.pagination(0, 0),
            });
        }

        let rows = db.list_friend_activity(&user_id, paging.limit, paging.offset())?;
        let total = db.count_friend_activity(&user_id)?;

        let today = habitline_streak::today();
        let mut streaks: HashMap<String, u32> = HashMap::new();
        let activities: Vec<_> = rows
            .into_iter()
            .map(|row| {
                let streak = *streaks
                    .entry(row.check_in.habit_id.clone())
                    .or_insert_with_key(|habit_id| habit_progress(db, habit_id, today).streak);
                views::activity(row, streak)
            })
            .collect();

        Ok(ActivityPage {
            pagination: paging.pagination(activities.len(), total),
            activities,
        })
    })
    .await?;

    Ok(Json(page))
}

pub async fn user_profile(
    State(state): State<AppState>,
    Path(target_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let viewer_id = claims.sub.to_string();

    let profile = blocking(&state, move |db| {
        let target_id = target_id.to_string();
        let user = db
            .get_user_by_id(&target_id)?
            .ok_or(ApiError::NotFound(USER_NOT_FOUND))?;

        let today = habitline_streak::today();
        let habits = db.list_active_habits(&target_id)?;
        let longest_streak = habits
            .iter()
            .map(|h| habit_progress(db, &h.id, today).streak)
            .max()
            .unwrap_or(0);

        Ok(ProfileResponse {
            user: views::user_summary(&user),
            stats: ProfileStats {
                total_habits: db.count_active_habits(&target_id)?,
                total_check_ins: db.count_completed_check_ins(&target_id)?,
                longest_streak,
            },
            is_following: db.is_following(&viewer_id, &target_id)?,
        })
    })
    .await?;

    Ok(Json(profile))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::test_support::TestApp;

    #[tokio::test]
    async fn search_excludes_the_caller() {
        let app = TestApp::new();
        let (_, ada) = app.register("ada").await;
        app.register("adam").await;
        app.register("bob").await;

        let (status, body) = app
            .send(Method::GET, "/api/social/search?q=AD", Some(&ada), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<_> = body.as_array().unwrap().iter().map(|u| u["username"].clone()).collect();
        assert_eq!(names, vec![json!("adam")]);

        // Matches on email as well
        let (_, body) = app
            .send(Method::GET, "/api/social/search?q=bob%40example", Some(&ada), None)
            .await;
        assert_eq!(body[0]["username"], "bob");

        let (status, _) = app
            .send(Method::GET, "/api/social/search?q=a", Some(&ada), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn search_matches_accented_emails_in_any_case() {
        let app = TestApp::new();
        let (_, ada) = app.register("ada").await;

        let (status, _) = app
            .send(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({"username": "Élodie", "email": "elo@example.com", "password": "hunter22"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = app
            .send(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({"username": "elodie", "email": "Élodie@Exemple.fr", "password": "hunter22"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");

        // "ÉLODIE" percent-encoded
        let (status, body) = app
            .send(Method::GET, "/api/social/search?q=%C3%89LODIE", Some(&ada), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["username"], "elodie");
    }

    #[tokio::test]
    async fn follow_rules() {
        let app = TestApp::new();
        let (ada_id, ada) = app.register("ada").await;
        let (bob_id, _) = app.register("bob").await;

        let (status, _) = app
            .send(Method::POST, &format!("/api/social/follow/{ada_id}"), Some(&ada), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app
            .send(Method::POST, &format!("/api/social/follow/{}", uuid::Uuid::new_v4()), Some(&ada), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = app
            .send(Method::POST, &format!("/api/social/follow/{bob_id}"), Some(&ada), None)
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Successfully followed user");

        let (status, _) = app
            .send(Method::POST, &format!("/api/social/follow/{bob_id}"), Some(&ada), None)
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = app
            .send(Method::DELETE, &format!("/api/social/follow/{bob_id}"), Some(&ada), None)
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = app
            .send(Method::DELETE, &format!("/api/social/follow/{bob_id}"), Some(&ada), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Not following this user");
    }

    #[tokio::test]
    async fn following_and_followers_lists() {
        let app = TestApp::new();
        let (ada_id, ada) = app.register("ada").await;
        let (bob_id, bob) = app.register("bob").await;
        let (cy_id, _) = app.register("cyd").await;

        for target in [bob_id, cy_id] {
            app.send(Method::POST, &format!("/api/social/follow/{target}"), Some(&ada), None)
                .await;
        }

        let (_, body) = app.send(Method::GET, "/api/social/following", Some(&ada), None).await;
        let names: Vec<_> = body.as_array().unwrap().iter().map(|u| u["username"].clone()).collect();
        assert_eq!(names, vec![json!("cyd"), json!("bob")]);

        let (_, body) = app.send(Method::GET, "/api/social/followers", Some(&bob), None).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["id"], ada_id.to_string());
        assert_eq!(body[0]["email"], "ada@example.com");
    }

    #[tokio::test]
    async fn activity_feed_shows_friends_completed_check_ins() {
        let app = TestApp::new();
        let (_, ada) = app.register("ada").await;
        let (bob_id, bob) = app.register("bob").await;
        let (_, cyd) = app.register("cyd").await;

        // No friends yet
        let (status, body) = app.send(Method::GET, "/api/social/activity", Some(&ada), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["activities"].as_array().unwrap().is_empty());
        assert_eq!(body["pagination"]["total_count"], 0);

        let read = app.habit(&bob, "Read").await;
        let run = app.habit(&bob, "Run").await;
        let swim = app.habit(&cyd, "Swim").await;
        app.send(Method::POST, &format!("/api/checkins/{read}"), Some(&bob), Some(json!({"notes": "ch. 4"})))
            .await;
        app.send(Method::POST, &format!("/api/checkins/{run}"), Some(&bob), Some(json!({"completed": false})))
            .await;
        app.send(Method::POST, &format!("/api/checkins/{swim}"), Some(&cyd), Some(json!({})))
            .await;

        app.send(Method::POST, &format!("/api/social/follow/{bob_id}"), Some(&ada), None)
            .await;

        let (_, body) = app.send(Method::GET, "/api/social/activity", Some(&ada), None).await;
        let activities = body["activities"].as_array().unwrap();
        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0]["username"], "bob");
        assert_eq!(activities[0]["habit_name"], "Read");
        assert_eq!(activities[0]["notes"], "ch. 4");
        assert_eq!(activities[0]["streak"], 1);
        assert_eq!(body["pagination"], json!({"current": 1, "total": 1, "count": 1, "total_count": 1}));
    }

    #[tokio::test]
    async fn profile_reports_stats_and_follow_state() {
        let app = TestApp::new();
        let (_, ada) = app.register("ada").await;
        let (bob_id, bob) = app.register("bob").await;

        let read = app.habit(&bob, "Read").await;
        app.habit(&bob, "Run").await;
        app.send(Method::POST, &format!("/api/checkins/{read}"), Some(&bob), Some(json!({})))
            .await;

        let (status, body) = app
            .send(Method::GET, &format!("/api/social/profile/{bob_id}"), Some(&ada), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["username"], "bob");
        assert_eq!(body["stats"], json!({"total_habits": 2, "total_check_ins": 1, "longest_streak": 1}));
        assert_eq!(body["is_following"], false);

        app.send(Method::POST, &format!("/api/social/follow/{bob_id}"), Some(&ada), None)
            .await;
        let (_, body) = app
            .send(Method::GET, &format!("/api/social/profile/{bob_id}"), Some(&ada), None)
            .await;
        assert_eq!(body["is_following"], true);

        let (status, _) = app
            .send(Method::GET, &format!("/api/social/profile/{}", uuid::Uuid::new_v4()), Some(&ada), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
