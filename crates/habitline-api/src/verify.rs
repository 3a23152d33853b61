use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use rand::Rng;
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use uuid::Uuid;

use habitline_types::api::{MessageResponse, SendOtpRequest, VerificationStatus, VerifyOtpRequest};

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;
use crate::mailer::Mail;

const OTP_TTL_SECS: i64 = 300;
const USER_NOT_FOUND: &str = "User not found";
const ALREADY_VERIFIED: &str = "Email is already verified";

fn generate_code() -> String {
    format!("{:06}", rand::rng().random_range(0..1_000_000u32))
}

/// Codes are stored as hex SHA-256 digests, never in the clear.
fn hash_code(code: &str) -> String {
    hex::encode(Sha256::digest(code.as_bytes()))
}

/// POST /api/verify/sendOtp
pub async fn send_otp(
    State(state): State<AppState>,
    Json(req): Json<SendOtpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let code = generate_code();
    let code_hash = hash_code(&code);
    let user_id = req.user_id.to_string();

    let user = blocking(&state, move |db| {
        let user = db
            .get_user_by_id(&user_id)?
            .ok_or(ApiError::NotFound(USER_NOT_FOUND))?;
        if user.is_verified {
            return Err(ApiError::BadRequest(ALREADY_VERIFIED.into()));
        }
        db.insert_otp(&Uuid::new_v4().to_string(), &user_id, &code_hash, OTP_TTL_SECS)?;
        Ok(user)
    })
    .await?;

    if let Err(e) = state.mailer.send(&Mail::verification(&user.email, &code)).await {
        warn!("Verification mail to {} failed: {:#}", user.email, e);
    }

    info!("Verification code issued for user {}", user.id);
    Ok(Json(MessageResponse::new("OTP sent successfully")))
}

/// POST /api/verify/otp
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(req): Json<VerifyOtpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let code_hash = hash_code(req.otp.trim());
    let user_id = req.user_id.to_string();

    blocking(&state, move |db| {
        let user = db
            .get_user_by_id(&user_id)?
            .ok_or(ApiError::NotFound(USER_NOT_FOUND))?;
        if user.is_verified {
            return Err(ApiError::BadRequest(ALREADY_VERIFIED.into()));
        }
        if !db.has_valid_otp(&user_id, &code_hash)? {
            return Err(ApiError::BadRequest("Invalid or expired OTP".into()));
        }
        db.verify_user(&user_id)?;
        Ok(())
    })
    .await?;

    info!("User {} verified their email", req.user_id);
    Ok(Json(MessageResponse::new("Email verified successfully")))
}

/// GET /api/verify/isVerified/{user_id}
pub async fn is_verified(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user = blocking(&state, move |db| {
        db.get_user_by_id(&user_id.to_string())?
            .ok_or(ApiError::NotFound(USER_NOT_FOUND))
    })
    .await?;

    Ok(Json(VerificationStatus {
        verified: user.is_verified,
    }))
}
