//! Endpoints the local storage backend signs its URLs for.
//!
//! With S3 the signed URLs point at S3 itself and these routes answer 404.

use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
};
use bytes::Bytes;
use kongre_core::AppError;
use kongre_storage::Storage;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    token: Option<String>,
}

fn bucket<'a>(state: &'a AppState, name: &str) -> Result<&'a Arc<dyn Storage>, AppError> {
    state
        .buckets
        .by_name(name)
        .ok_or_else(|| AppError::NotFound(format!("Unknown bucket: {}", name)))
}

/// Redeem a signed upload: store the request body at the signed path
#[tracing::instrument(skip(state, query, headers, body), fields(size = body.len()))]
pub async fn upload_object(
    State(state): State<Arc<AppState>>,
    Path((bucket_name, key)): Path<(String, String)>,
    Query(query): Query<TokenQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, HttpAppError> {
    let storage = bucket(&state, &bucket_name)?;
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::InvalidInput("Content-Type header is required".to_string()))?;

    storage
        .redeem_signed_upload(
            &key,
            query.token.as_deref().unwrap_or_default(),
            content_type,
            body,
        )
        .await?;

    Ok(StatusCode::OK)
}

/// Serve an object through a signed link, or without one for public buckets
#[tracing::instrument(skip(state, query))]
pub async fn get_object(
    State(state): State<Arc<AppState>>,
    Path((bucket_name, key)): Path<(String, String)>,
    Query(query): Query<TokenQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let storage = bucket(&state, &bucket_name)?;
    let object = storage.read_signed(&key, query.token.as_deref()).await?;

    Ok((
        [
            (header::CONTENT_TYPE, object.content_type),
            (header::CACHE_CONTROL, "private, max-age=300".to_string()),
        ],
        object.data,
    ))
}
