//! REST API endpoints for listing image metadata.
//!
//! Image binaries are uploaded to object storage by the client out of band;
//! these endpoints record and release the metadata. Attachment is registered
//! under `/listings/{listing_id}/images` by the listing router, since its
//! path parameter is a listing id rather than an image id.

use crate::{ApiApplication, ApiError, api_error, internal_error, require_identity};
use aide::axum::{ApiRouter, routing::delete};
use apm_core::{
    models::{ImageData, ImageId, ImageRecord},
    ports::{ImageFailure, ImageRepository as _, MediaStore as _},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use tracing::{Level, event};

/// Creates a router with image-related endpoints.
pub fn router<T: ApiApplication>() -> ApiRouter<T> {
    ApiRouter::new().api_route_with("/{image_id}", delete(delete_image::<T>), |route| {
        route.security_requirement("jwt").tag("image")
    })
}

/// Path parameter for image-specific endpoints.
#[derive(serde::Deserialize, schemars::JsonSchema)]
#[schemars(inline)]
struct Id {
    /// The unique identifier of the image
    image_id: ImageId,
}

fn image_failure(failure: ImageFailure) -> ApiError {
    let status = match failure {
        ImageFailure::DoesNotExist => StatusCode::NOT_FOUND,
        ImageFailure::AccessDenied => StatusCode::FORBIDDEN,
    };
    api_error(status, failure)
}

/// Attach an uploaded image to a listing.
///
/// If the new image is flagged as the default, any previous default loses
/// the flag in the same transaction.
///
/// # Authorization
///
/// The caller must be the listing's seller.
///
/// # Returns
///
/// - `201 Created`: The stored image metadata, with its public URL
/// - `401 Unauthorized`: No valid credentials
/// - `403 Forbidden`: The caller is not the seller
/// - `404 Not Found`: Listing does not exist
/// - `500 Internal Server Error`: Database operation failed
pub(crate) async fn attach_image<T: ApiApplication>(
    State(app): State<T>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Path(crate::listing_routes::Id { listing_id }): Path<crate::listing_routes::Id>,
    Json(body): Json<ImageData>,
) -> Result<(StatusCode, Json<ImageRecord>), ApiError> {
    let caller = require_identity(&app, auth.as_ref()).await?;
    let as_of = app.now();
    let image_id = app.generate_image_id();
    let mut image = app
        .database()
        .attach_image(image_id, listing_id, caller.user_id, body, as_of)
        .await
        .map_err(internal_error)?
        .map_err(image_failure)?;
    image.resolve_url(app.media());
    Ok((StatusCode::CREATED, Json(image)))
}

/// Remove an image from its listing and release the stored binary.
///
/// A failed object-storage release is logged and does not fail the request.
///
/// # Authorization
///
/// The caller must be the owning listing's seller.
///
/// # Returns
///
/// - `204 No Content`: Image removed
/// - `401 Unauthorized`: No valid credentials
/// - `403 Forbidden`: The caller is not the seller
/// - `404 Not Found`: Image does not exist
/// - `500 Internal Server Error`: Database operation failed
async fn delete_image<T: ApiApplication>(
    State(app): State<T>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Path(Id { image_id }): Path<Id>,
) -> Result<StatusCode, ApiError> {
    let caller = require_identity(&app, auth.as_ref()).await?;
    let key = app
        .database()
        .delete_image(image_id, caller.user_id)
        .await
        .map_err(internal_error)?
        .map_err(image_failure)?;

    if let Err(err) = app.media().delete_object(&key).await {
        event!(Level::WARN, key, err = err.to_string());
    }
    Ok(StatusCode::NO_CONTENT)
}
