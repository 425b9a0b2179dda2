//! Route configuration and setup.

use crate::api_doc::ApiDoc;
use crate::constants::{
    BODY_LIMIT_SLACK_BYTES, OPENAPI_JSON_PATH, RATE_LIMIT_LIMIT_HEADER,
    RATE_LIMIT_REMAINING_HEADER,
};
use crate::handlers::{auth_session, health, signed_upload, storage_upload, submit};
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method},
    routing::{get, post, put},
    Json, Router,
};
use kongre_core::Config;
use kongre_infra::{request_id_middleware, security_headers_middleware};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;
    let body_limit =
        usize::try_from(config.submission.max_paper_size_bytes)?.saturating_add(BODY_LIMIT_SLACK_BYTES);

    let api_routes = Router::new()
        .route("/api/signed-upload", post(signed_upload::signed_upload))
        .route(
            "/api/signed-upload-paper",
            post(signed_upload::signed_upload_paper),
        )
        .route(
            "/api/signed-upload-asset",
            post(signed_upload::signed_upload_asset),
        )
        .route("/api/submit", post(submit::submit))
        .route("/api/auth/set", post(auth_session::set_session))
        .route("/api/auth/logout", post(auth_session::logout))
        .route("/api/auth/session", get(auth_session::current_session))
        .route("/health", get(health::health_check));

    let storage_routes = Router::new()
        .route(
            "/storage/upload/{bucket}/{*path}",
            put(storage_upload::upload_object),
        )
        .route(
            "/storage/object/{bucket}/{*path}",
            get(storage_upload::get_object),
        );

    let app = api_routes
        .merge(storage_routes)
        .route(OPENAPI_JSON_PATH, get(|| async { Json(ApiDoc::openapi()) }))
        .merge(utoipa_rapidoc::RapiDoc::new(OPENAPI_JSON_PATH).path("/docs"))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .with_state(state);

    Ok(app)
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [Method::GET, Method::POST, Method::PUT, Method::OPTIONS];
    let exposed = [
        HeaderName::from_static(RATE_LIMIT_LIMIT_HEADER),
        HeaderName::from_static(RATE_LIMIT_REMAINING_HEADER),
        header::RETRY_AFTER,
    ];

    let cors = if config.server.cors_origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
            .expose_headers(exposed)
    } else {
        let origins = config
            .server
            .cors_origins
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()?;
        // Credentialed requests carry the session cookies.
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .allow_credentials(true)
            .expose_headers(exposed)
    };
    Ok(cors)
}
