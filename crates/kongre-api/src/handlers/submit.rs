use crate::constants::{RATE_LIMIT_LIMIT_HEADER, RATE_LIMIT_REMAINING_HEADER};
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::ip_extraction::ClientInfo;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use kongre_core::{AppError, SubmissionPayload, SubmitResponse};
use kongre_infra::RateLimitDecision;
use std::sync::Arc;

fn rate_limit_headers(decision: &RateLimitDecision) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(RATE_LIMIT_LIMIT_HEADER, HeaderValue::from(decision.limit));
    headers.insert(
        RATE_LIMIT_REMAINING_HEADER,
        HeaderValue::from(decision.remaining),
    );
    headers
}

/// Register a paper submission
///
/// The file must already be uploaded with a credential from `/api/signed-upload`;
/// `file_path` is the path that credential was issued for.
#[utoipa::path(
    post,
    path = "/api/submit",
    tag = "submissions",
    request_body = SubmissionPayload,
    responses(
        (status = 200, description = "Submission accepted", body = SubmitResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 415, description = "File type not allowed", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = ErrorResponse),
        (status = 500, description = "Persistence failed", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, client, body), fields(operation = "submit"))]
pub async fn submit(
    State(state): State<Arc<AppState>>,
    client: ClientInfo,
    body: Result<Json<SubmissionPayload>, JsonRejection>,
) -> Response {
    // The limit applies before the body is even looked at.
    let decision = state.rate_limiter.check(client.rate_limit_key()).await;
    let headers = rate_limit_headers(&decision);

    if !decision.allowed {
        tracing::warn!(client = client.rate_limit_key(), "Submission rate limit exceeded");
        let error = HttpAppError(AppError::RateLimited {
            limit: decision.limit,
            retry_after_secs: decision.retry_after_secs(),
        });
        return (headers, error).into_response();
    }

    let result = async {
        let Json(payload) = body?;
        state
            .intake
            .submit(payload, client.ip.clone(), client.user_agent.clone())
            .await?;
        Ok::<_, HttpAppError>(Json(SubmitResponse { ok: true }))
    }
    .await;

    match result {
        Ok(ack) => (headers, ack).into_response(),
        Err(error) => (headers, error).into_response(),
    }
}
