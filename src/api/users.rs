//! Account endpoints: registration, verification, login, password management.

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use uuid::Uuid;

use super::auth::{self, AuthUser, SESSION_TTL_HOURS};
use super::error::codes;
use super::validation::{validate_email, validate_password, validate_username};
use super::{ApiError, ApiResponse, AppState};
use crate::api::types::{
    ChangePasswordRequest, LoginRequest, MessageResponse, PasswordResetRequest,
    PasswordResetSubmit, RegisterRequest, RequestVerificationRequest, VerificationStatusDto,
    VerifyEmailRequest,
};
use crate::services::user_service::UserError;

fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| ApiError::invalid_body(e.body_text()))
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = parse_body(payload)?;

    let email = validate_email(&payload.email)?;
    let username = validate_username(&payload.username)?;
    let password = validate_password(&payload.password)?;

    state.users.register(email, username, password).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(MessageResponse::new(
            "Account created, check your email for the verification code",
        ))),
    ))
}

pub async fn verify_email(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<VerifyEmailRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = parse_body(payload)?;

    let code = payload.code.trim();
    if code.is_empty() {
        return Err(ApiError::validation("Verification code cannot be empty"));
    }

    state.users.verify_email(code).await.map_err(|e| match e {
        UserError::NotFound => {
            ApiError::not_found_code("Invalid verification code", codes::INVALID_VERIFICATION_CODE)
        }
        other => other.into(),
    })?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Email verified",
    ))))
}

pub async fn request_verification(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RequestVerificationRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = parse_body(payload)?;
    let username = validate_username(&payload.username)?;

    state
        .users
        .request_verification(username)
        .await
        .map_err(|e| match e {
            // Re-requesting a code for a verified account is refused outright.
            UserError::AlreadyVerified => ApiError::forbidden(
                "Email is already verified",
                codes::USER_ALREADY_VERIFIED,
            ),
            other => other.into(),
        })?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Verification code sent",
    ))))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    // A client already holding a live session must log out first. An invalid
    // or expired cookie is ignored and the login proceeds.
    if let Some(existing) = auth::session_cookie(&headers)
        && state.sessions.validate_session(&existing).await.is_ok()
    {
        return Err(ApiError::conflict(
            "User is already logged in",
            codes::USER_ALREADY_LOGGED,
        ));
    }

    let payload = parse_body(payload)?;
    let username = validate_username(&payload.username)?;
    let password = validate_password(&payload.password)?;

    let user = state.users.auth(username, password).await?;

    // No session for unverified accounts.
    if !user.is_verified {
        return Err(ApiError::unauthorized_code(
            "Email is not verified",
            codes::EMAIL_NOT_VERIFIED,
        ));
    }

    let session_id = Uuid::new_v4().to_string();
    let expires_at = chrono::Utc::now() + chrono::Duration::hours(SESSION_TTL_HOURS);
    state
        .sessions
        .create_session(&session_id, user.id, expires_at)
        .await?;

    let cookie = auth::session_cookie_value(&session_id, state.config.server.secure_cookies)?;

    let mut response =
        Json(ApiResponse::success(MessageResponse::new("Logged in"))).into_response();
    response.headers_mut().insert(header::SET_COOKIE, cookie);
    Ok(response)
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Response, ApiError> {
    state.sessions.delete_all_sessions(user_id).await?;

    let cookie = auth::clear_session_cookie(state.config.server.secure_cookies)?;

    let mut response =
        Json(ApiResponse::success(MessageResponse::new("Logged out"))).into_response();
    response.headers_mut().insert(header::SET_COOKIE, cookie);
    Ok(response)
}

pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let payload = parse_body(payload)?;
    let password = validate_password(&payload.password)?;

    // This also revokes the session that authorized this request.
    state.users.change_password(user_id, password).await?;

    let cookie = auth::clear_session_cookie(state.config.server.secure_cookies)?;

    let mut response = Json(ApiResponse::success(MessageResponse::new(
        "Password changed, please log in again",
    )))
    .into_response();
    response.headers_mut().insert(header::SET_COOKIE, cookie);
    Ok(response)
}

pub async fn verification_status(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let status = state.users.verification_status(user_id).await?;

    Ok(Json(ApiResponse::success(VerificationStatusDto { status })))
}

pub async fn request_password_reset(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PasswordResetRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = parse_body(payload)?;
    let email = validate_email(&payload.email)?;

    state.users.request_password_reset(email).await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Password reset link sent",
    ))))
}

pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PasswordResetSubmit>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = parse_body(payload)?;

    let token = payload.token.trim();
    if token.is_empty() {
        return Err(ApiError::validation("Reset token cannot be empty"));
    }
    let password = validate_password(&payload.password)?;

    state.users.reset_password(token, password).await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Password reset, please log in",
    ))))
}
