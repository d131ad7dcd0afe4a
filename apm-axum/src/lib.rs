#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

mod image_routes;
mod listing_routes;
mod user_routes;

use aide::{
    axum::{ApiRouter, routing::get},
    openapi::OpenApi,
};
use apm_core::{
    models::Identity,
    ports::Application,
};
use axum::{Extension, Json, http::StatusCode};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use schemars::JsonSchema;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{Level, event};

mod openapi;
use openapi::{api_docs, docs_routes};

pub mod config;
use config::AxumConfig;

/// Response for the health check endpoint
#[derive(Serialize, JsonSchema)]
#[schemars(inline)]
struct HealthResponse {
    status: String,
}

/// Simple health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// JSON body carried by every non-2xx response.
#[derive(Serialize, JsonSchema)]
#[schemars(inline)]
pub(crate) struct ErrorBody {
    /// Human-readable description of what went wrong
    error: String,
}

/// The error half of every handler: a status code plus a JSON message.
pub(crate) type ApiError = (StatusCode, Json<ErrorBody>);

pub(crate) fn api_error(status: StatusCode, message: impl std::fmt::Display) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
}

/// Log the infrastructure error and hide it behind a 500.
pub(crate) fn internal_error(err: impl std::fmt::Display) -> ApiError {
    event!(Level::ERROR, err = err.to_string());
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
}

/// Resolve the caller's identity, or fail with 401.
///
/// The header is extracted as an `Option` so that a missing `Authorization`
/// header surfaces as 401 rather than the extractor's default 400.
pub(crate) async fn require_identity<T: ApiApplication>(
    app: &T,
    auth: Option<&TypedHeader<Authorization<Bearer>>>,
) -> Result<Identity, ApiError> {
    let auth = auth.ok_or_else(|| {
        api_error(StatusCode::UNAUTHORIZED, "authentication required")
    })?;
    app.authenticate(&auth.0)
        .await
        .ok_or_else(|| api_error(StatusCode::UNAUTHORIZED, "invalid credentials"))
}

/// Construct a full API router with the given state and config
pub fn router<T: ApiApplication>(state: T, config: AxumConfig) -> axum::Router {
    let mut api = OpenApi::default();
    ApiRouter::new()
        .api_route("/health", get(health_check))
        .nest("/listings", listing_routes::router())
        .nest("/images", image_routes::router())
        .nest("/me", user_routes::router())
        .nest_api_service("/docs", docs_routes())
        .finish_api_with(&mut api, api_docs)
        .layer(Extension(Arc::new(api))) // Arc is very important here or you will face massive memory and performance issues
        .layer(Extension(Arc::new(config)))
        .with_state(state)
}

/// Starts the HTTP server with the provided configuration
pub async fn start_server<T: ApiApplication>(
    config: AxumConfig,
    app: T,
) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind(config.bind_address)
        .await
        .expect("Unable to bind to address");

    tracing::info!(
        "Listening for requests on {}",
        listener.local_addr().unwrap()
    );

    // The browser frontend is served from a different origin
    let service = router(app, config).layer(CorsLayer::permissive());
    axum::serve(listener, service).await
}

/// Axum imposes all sorts of constraints on what can pass for state. This
/// trait, coupled with a blanket implementation, specifies it all upfront and
/// in one place. If a function takes a generic `T: ApiApplication`, then
/// everything one might reasonably want to do should work.
pub trait ApiApplication:
    Clone
    + Send
    + Sync
    + 'static
    + Application<
        Context = Authorization<Bearer>,
        Repository: Clone + Send + Sync + 'static,
        Media: Clone + Send + Sync + 'static,
    >
{
}

// this is the blanket implementation
impl<T: Clone + Send + Sync + 'static> ApiApplication for T where
    T: Application<
            Context = Authorization<Bearer>,
            Repository: Clone + Send + Sync + 'static,
            Media: Clone + Send + Sync + 'static,
        >
{
}
