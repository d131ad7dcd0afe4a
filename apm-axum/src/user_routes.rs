//! REST API endpoints for the authenticated user's own account.
//!
//! Dashboards for the caller's listings and bids, partial settings updates,
//! and full account deletion. Every route here requires authentication.

use crate::{ApiApplication, ApiError, api_error, internal_error, require_identity};
use aide::axum::{
    ApiRouter,
    routing::{delete, get, put},
};
use apm_core::{
    models::{BidWithListing, ListingSummary, UserRecord, UserSettings},
    ports::{BidRepository as _, ListingRepository as _, MediaStore as _, UserRepository as _},
};
use axum::{Json, extract::State, http::StatusCode};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use tracing::{Level, event};

/// Creates a router with account-related endpoints.
pub fn router<T: ApiApplication>() -> ApiRouter<T> {
    ApiRouter::new()
        .api_route_with("/listings", get(my_listings::<T>), |route| {
            route.security_requirement("jwt").tag("account")
        })
        .api_route_with("/bids", get(my_bids::<T>), |route| {
            route.security_requirement("jwt").tag("account")
        })
        .api_route_with("/settings", put(update_settings::<T>), |route| {
            route.security_requirement("jwt").tag("account")
        })
        .api_route_with("/", delete(delete_account::<T>), |route| {
            route.security_requirement("jwt").tag("account")
        })
}

/// The caller's own listings, active and ended, newest first.
///
/// # Returns
///
/// - `200 OK`: The caller's listings
/// - `401 Unauthorized`: No valid credentials
/// - `500 Internal Server Error`: Database query failed
async fn my_listings<T: ApiApplication>(
    State(app): State<T>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
) -> Result<Json<Vec<ListingSummary>>, ApiError> {
    let caller = require_identity(&app, auth.as_ref()).await?;
    let as_of = app.now();
    let mut listings = app
        .database()
        .listings_by_seller(caller.user_id, as_of)
        .await
        .map_err(internal_error)?;
    for listing in &mut listings {
        listing.resolve_urls(app.media());
    }
    Ok(Json(listings))
}

/// The caller's bids, newest first, each with the listing it was placed on.
///
/// # Returns
///
/// - `200 OK`: The caller's bids
/// - `401 Unauthorized`: No valid credentials
/// - `500 Internal Server Error`: Database query failed
async fn my_bids<T: ApiApplication>(
    State(app): State<T>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
) -> Result<Json<Vec<BidWithListing>>, ApiError> {
    let caller = require_identity(&app, auth.as_ref()).await?;
    let as_of = app.now();
    let mut bids = app
        .database()
        .bids_by_bidder(caller.user_id, as_of)
        .await
        .map_err(internal_error)?;
    for entry in &mut bids {
        entry.listing.resolve_urls(app.media());
    }
    Ok(Json(bids))
}

/// Update the caller's profile settings.
///
/// Absent fields are left unchanged. The caller's user row is created from
/// the token's claims if this is their first interaction.
///
/// # Returns
///
/// - `200 OK`: The updated profile
/// - `401 Unauthorized`: No valid credentials
/// - `500 Internal Server Error`: Database operation failed
async fn update_settings<T: ApiApplication>(
    State(app): State<T>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Json(body): Json<UserSettings>,
) -> Result<Json<UserRecord>, ApiError> {
    let caller = require_identity(&app, auth.as_ref()).await?;
    let as_of = app.now();
    let db = app.database();

    db.ensure_user(&caller, as_of).await.map_err(internal_error)?;
    let user = db
        .update_settings(caller.user_id, body, as_of)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| {
            event!(Level::ERROR, err = "user row missing after upsert");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
        })?;
    Ok(Json(user))
}

/// Delete the caller's account.
///
/// Cascades to their listings, the bids and images on those listings, and
/// the bids they placed elsewhere. Stored image binaries are released after
/// the delete commits; failed releases are logged and do not fail the
/// request.
///
/// # Returns
///
/// - `204 No Content`: Account deleted
/// - `401 Unauthorized`: No valid credentials
/// - `404 Not Found`: The caller has no account record
/// - `500 Internal Server Error`: Database operation failed
async fn delete_account<T: ApiApplication>(
    State(app): State<T>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
) -> Result<StatusCode, ApiError> {
    let caller = require_identity(&app, auth.as_ref()).await?;
    let keys = app
        .database()
        .delete_account(caller.user_id)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "account not found"))?;

    for key in keys {
        if let Err(err) = app.media().delete_object(&key).await {
            event!(Level::WARN, key, err = err.to_string());
        }
    }
    Ok(StatusCode::NO_CONTENT)
}
