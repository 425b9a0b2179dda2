use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::IntoResponse,
    Json,
};
use kongre_core::{AppError, SessionResponse, SetSessionRequest, SubmitResponse};
use std::sync::Arc;
use validator::Validate;

fn set_cookie_headers(cookies: &[String]) -> Result<HeaderMap, AppError> {
    let mut headers = HeaderMap::new();
    for cookie in cookies {
        let value = HeaderValue::from_str(cookie)
            .map_err(|e| AppError::Internal(format!("Invalid cookie header: {}", e)))?;
        headers.append(header::SET_COOKIE, value);
    }
    Ok(headers)
}

/// Move the browser's session into HttpOnly cookies
#[utoipa::path(
    post,
    path = "/api/auth/set",
    tag = "auth",
    request_body = SetSessionRequest,
    responses(
        (status = 200, description = "Session cookies set", body = SubmitResponse),
        (status = 400, description = "Tokens missing", body = ErrorResponse),
        (status = 401, description = "Access token invalid or expired", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(operation = "set_session"))]
pub async fn set_session(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<SetSessionRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate().map_err(AppError::from)?;

    let session = state.sessions.verify(&request.access_token)?;
    let cookies = state.sessions.session_cookies(
        &session,
        &request.access_token,
        &request.refresh_token,
    )?;

    tracing::info!(user_id = %session.user.id, "Session established");
    Ok((set_cookie_headers(&cookies)?, Json(SubmitResponse { ok: true })))
}

/// Clear the session cookies
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "auth",
    responses((status = 200, description = "Session cookies cleared", body = SubmitResponse))
)]
pub async fn logout(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, HttpAppError> {
    let cookies = state.sessions.clear_cookies();
    Ok((set_cookie_headers(&cookies)?, Json(SubmitResponse { ok: true })))
}

/// The user behind the request's session cookie, or `null`
#[utoipa::path(
    get,
    path = "/api/auth/session",
    tag = "auth",
    responses((status = 200, description = "Current session", body = SessionResponse))
)]
pub async fn current_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Json<SessionResponse> {
    Json(SessionResponse {
        user: state.sessions.current_user(&headers),
    })
}
