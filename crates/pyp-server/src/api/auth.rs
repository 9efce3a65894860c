//! Account handlers: password login, direct and OTP-gated signup, password
//! reset and the current-session lookup.

use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::Utc;
use pyp_core::otp::{evaluate, generate_otp};
use pyp_core::users::{admin_login_allowed, validate_email, validate_password};
use pyp_core::{OtpPurpose, OtpRecord, OtpVerdict, Role, User};
use pyp_db::NewUser;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{hash_secret, verify_secret};
use crate::middleware::{RequestId, Session};

use super::{
    internal_error, map_db_error, validation_error, ApiError, ApiResponse, AppState,
    MessageResponse,
};

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SignupInitiateRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct SignupCompleteRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub otp: String,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SendOtpRequest {
    pub email: String,
    pub purpose: OtpPurpose,
}

#[derive(Debug, Deserialize)]
pub(super) struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ResetPasswordRequest {
    pub email: String,
    pub otp: String,
    pub new_password: String,
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(super) struct AuthSession {
    pub token: String,
    pub user: User,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn issue_session(state: &AppState, rid: &str, user: User) -> Result<AuthSession, ApiError> {
    let token = state
        .tokens
        .issue(&user)
        .map_err(|e| internal_error(rid, "issue session token", &e))?;
    Ok(AuthSession { token, user })
}

fn required<'a>(rid: &str, field: &str, value: &'a str) -> Result<&'a str, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::new(
            rid,
            "validation_error",
            format!("{field} is required"),
        ));
    }
    Ok(value)
}

/// Generate, store and email a fresh OTP. Returns whether the email went out.
async fn issue_otp(
    state: &AppState,
    rid: &str,
    email: &str,
    purpose: OtpPurpose,
) -> Result<bool, ApiError> {
    let otp = generate_otp();
    let otp_hash = hash_secret(&otp)
        .await
        .map_err(|e| internal_error(rid, "hash OTP", &e))?;

    pyp_db::replace_otp(&state.pool, email, &otp_hash)
        .await
        .map_err(|e| map_db_error(rid.to_owned(), &e))?;

    Ok(state.mailer.send_otp(email, &otp, purpose).await)
}

fn otp_sent_message(sent: bool) -> &'static str {
    if sent {
        "OTP sent successfully to your email"
    } else {
        "OTP generated. Check server logs (email not configured)."
    }
}

/// Check `code` against the live OTP for `email`.
///
/// Failed checks count against the attempt cap; a record at the cap is
/// deleted. Returns the matched record so the caller can consume it.
async fn check_otp(
    state: &AppState,
    rid: &str,
    email: &str,
    code: &str,
) -> Result<OtpRecord, ApiError> {
    let record: Option<OtpRecord> = pyp_db::find_live_otp(&state.pool, email)
        .await
        .map_err(|e| map_db_error(rid.to_owned(), &e))?
        .map(OtpRecord::from);

    let now = Utc::now();
    let matched = match &record {
        Some(r) if !r.is_expired(now) && r.attempts < pyp_core::otp::MAX_ATTEMPTS => {
            verify_secret(code, &r.otp_hash)
                .await
                .map_err(|e| internal_error(rid, "verify OTP", &e))?
        }
        _ => false,
    };

    let verdict = evaluate(record.as_ref(), now, |_| matched);
    match (verdict, record) {
        (OtpVerdict::Valid, Some(record)) => Ok(record),
        (OtpVerdict::TooManyAttempts, _) => {
            pyp_db::delete_otps_for(&state.pool, email)
                .await
                .map_err(|e| map_db_error(rid.to_owned(), &e))?;
            tracing::info!(email, "OTP discarded after too many attempts");
            Err(ApiError::new(rid, "validation_error", verdict.message()))
        }
        (OtpVerdict::Invalid, Some(record)) => {
            pyp_db::increment_otp_attempts(&state.pool, record.id)
                .await
                .map_err(|e| map_db_error(rid.to_owned(), &e))?;
            Err(ApiError::new(rid, "validation_error", verdict.message()))
        }
        (verdict, _) => Err(ApiError::new(rid, "validation_error", verdict.message())),
    }
}

async fn create_customer(
    state: &AppState,
    rid: &str,
    name: &str,
    email: &str,
    password: &str,
    phone: Option<&str>,
) -> Result<User, ApiError> {
    validate_password(password).map_err(|e| validation_error(rid, &e))?;
    let password_hash = hash_secret(password)
        .await
        .map_err(|e| internal_error(rid, "hash password", &e))?;

    let row = pyp_db::create_user(
        &state.pool,
        NewUser {
            name,
            email,
            password_hash: &password_hash,
            role: Role::Customer,
            phone: phone.map(str::trim).filter(|p| !p.is_empty()),
        },
    )
    .await
    .map_err(|e| map_db_error(rid.to_owned(), &e))?;

    tracing::info!(email, "account created");
    Ok(row.to_user())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/auth/login
pub(super) async fn login(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthSession>>, ApiError> {
    let rid = &req_id.0;
    let email = pyp_core::users::normalize_email(&body.email);
    let invalid = || ApiError::new(rid, "unauthorized", "Invalid email or password");

    let row = pyp_db::find_user_by_email(&state.pool, &email)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(invalid)?;

    if !admin_login_allowed(row.role(), &row.email, &state.config.admin_email) {
        tracing::warn!(email, "admin login refused for unprivileged address");
        return Err(ApiError::new(
            rid,
            "forbidden",
            "Admin access is restricted",
        ));
    }

    let Some(hash) = row.password_hash.as_deref() else {
        return Err(invalid());
    };
    let matches = verify_secret(&body.password, hash)
        .await
        .map_err(|e| internal_error(rid, "verify password", &e))?;
    if !matches {
        return Err(invalid());
    }

    let session = issue_session(&state, rid, row.to_user())?;
    Ok(ApiResponse::new(&req_id, session))
}

/// POST /api/auth/register — signup without email verification.
pub(super) async fn register(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthSession>>), ApiError> {
    let rid = &req_id.0;
    let name = required(rid, "name", &body.name)?;
    let email = validate_email(&body.email).map_err(|e| validation_error(rid, &e))?;

    let user = create_customer(
        &state,
        rid,
        name,
        &email,
        &body.password,
        body.phone.as_deref(),
    )
    .await?;
    let session = issue_session(&state, rid, user)?;
    Ok((StatusCode::CREATED, ApiResponse::new(&req_id, session)))
}

/// POST /api/auth/signup/initiate
pub(super) async fn signup_initiate(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<SignupInitiateRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    send_otp_for(&state, &req_id, &body.email, OtpPurpose::Signup).await
}

/// POST /api/auth/signup/complete
pub(super) async fn signup_complete(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<SignupCompleteRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthSession>>), ApiError> {
    let rid = &req_id.0;
    let name = required(rid, "name", &body.name)?;
    let email = validate_email(&body.email).map_err(|e| validation_error(rid, &e))?;
    let otp = required(rid, "otp", &body.otp)?;
    validate_password(&body.password).map_err(|e| validation_error(rid, &e))?;

    check_otp(&state, rid, &email, otp).await?;
    let user = create_customer(
        &state,
        rid,
        name,
        &email,
        &body.password,
        body.phone.as_deref(),
    )
    .await?;

    pyp_db::delete_otps_for(&state.pool, &email)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    let session = issue_session(&state, rid, user)?;
    Ok((StatusCode::CREATED, ApiResponse::new(&req_id, session)))
}

/// POST /api/auth/send-otp
pub(super) async fn send_otp(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<SendOtpRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    send_otp_for(&state, &req_id, &body.email, body.purpose).await
}

async fn send_otp_for(
    state: &AppState,
    req_id: &RequestId,
    email: &str,
    purpose: OtpPurpose,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let rid = &req_id.0;
    let email = validate_email(email).map_err(|e| validation_error(rid, &e))?;

    let existing = pyp_db::find_user_by_email(&state.pool, &email)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    match (purpose, existing.is_some()) {
        (OtpPurpose::Signup, true) => {
            return Err(ApiError::new(rid, "validation_error", "User already exists"));
        }
        (OtpPurpose::ForgotPassword, false) => {
            return Err(ApiError::new(rid, "not_found", "User not found"));
        }
        _ => {}
    }

    let sent = issue_otp(state, rid, &email, purpose).await?;
    Ok(ApiResponse::new(
        req_id,
        MessageResponse::new(otp_sent_message(sent)),
    ))
}

/// POST /api/auth/verify-otp — checks the code without consuming it.
pub(super) async fn verify_otp(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<VerifyOtpRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let rid = &req_id.0;
    let email = validate_email(&body.email).map_err(|e| validation_error(rid, &e))?;
    let otp = required(rid, "otp", &body.otp)?;

    check_otp(&state, rid, &email, otp).await?;
    Ok(ApiResponse::new(
        &req_id,
        MessageResponse::new(OtpVerdict::Valid.message()),
    ))
}

/// POST /api/auth/reset-password
pub(super) async fn reset_password(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let rid = &req_id.0;
    let email = validate_email(&body.email).map_err(|e| validation_error(rid, &e))?;
    let otp = required(rid, "otp", &body.otp)?;
    validate_password(&body.new_password).map_err(|e| validation_error(rid, &e))?;

    check_otp(&state, rid, &email, otp).await?;

    let password_hash = hash_secret(&body.new_password)
        .await
        .map_err(|e| internal_error(rid, "hash password", &e))?;
    pyp_db::update_password(&state.pool, &email, &password_hash)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    pyp_db::delete_otps_for(&state.pool, &email)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    tracing::info!(email, "password reset");
    Ok(ApiResponse::new(
        &req_id,
        MessageResponse::new("Password reset successfully. Please login."),
    ))
}

/// GET /api/auth/me
pub(super) async fn me(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(Session(claims)): Extension<Session>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let rid = &req_id.0;
    let not_found = || ApiError::new(rid, "not_found", "User not found");

    let id = Uuid::parse_str(&claims.sub).map_err(|_| not_found())?;
    let row = pyp_db::get_user_by_id(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(not_found)?;

    Ok(ApiResponse::new(&req_id, row.to_user()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_request_uses_camel_case() {
        let req: ResetPasswordRequest = serde_json::from_str(
            r#"{"email":"a@b.co","otp":"123456","newPassword":"secret1"}"#,
        )
        .expect("parse");
        assert_eq!(req.new_password, "secret1");
    }

    #[test]
    fn send_otp_request_parses_purpose() {
        let req: SendOtpRequest =
            serde_json::from_str(r#"{"email":"a@b.co","purpose":"forgot-password"}"#)
                .expect("parse");
        assert_eq!(req.purpose, OtpPurpose::ForgotPassword);
    }

    #[test]
    fn otp_message_reflects_delivery() {
        assert_eq!(otp_sent_message(true), "OTP sent successfully to your email");
        assert!(otp_sent_message(false).contains("server logs"));
    }
}
