//! REST API endpoints for listings and bid placement.
//!
//! Browsing and reading listings is public; creating, editing, and deleting
//! a listing requires the caller to be its seller, and placing a bid requires
//! any authenticated caller other than the seller.

use crate::{
    ApiApplication, ApiError, api_error, image_routes, internal_error, require_identity,
    config::AxumConfig,
};
use aide::axum::{ApiRouter, routing::get, routing::post};
use apm_core::{
    bidding,
    models::{BidRecord, ListingData, ListingId, ListingQuery, ListingRecord, ListingSummary},
    ports::{
        BidFailure, BidRepository as _, ListingFailure, ListingRepository as _,
        MediaStore as _, UserRepository as _,
    },
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use std::sync::Arc;
use tracing::{Level, event};

/// Creates a router with listing-related endpoints.
pub fn router<T: ApiApplication>() -> ApiRouter<T> {
    ApiRouter::new()
        .api_route_with(
            "/",
            get(browse_listings::<T>).post(create_listing::<T>),
            |route| route.security_requirement("jwt").tag("listing"),
        )
        .api_route_with(
            "/{listing_id}",
            get(get_listing::<T>)
                .put(update_listing::<T>)
                .delete(delete_listing::<T>),
            |route| route.security_requirement("jwt").tag("listing"),
        )
        .api_route_with(
            "/{listing_id}/bids",
            get(get_bids::<T>).post(place_bid::<T>),
            |route| route.security_requirement("jwt").tag("bid"),
        )
        .api_route_with(
            "/{listing_id}/images",
            post(image_routes::attach_image::<T>),
            |route| route.security_requirement("jwt").tag("image"),
        )
}

/// Path parameter for listing-specific endpoints.
#[derive(serde::Deserialize, schemars::JsonSchema)]
#[schemars(inline)]
pub(crate) struct Id {
    /// The unique identifier of the listing
    pub(crate) listing_id: ListingId,
}

pub(crate) fn listing_failure(failure: ListingFailure) -> ApiError {
    let status = match failure {
        ListingFailure::DoesNotExist => StatusCode::NOT_FOUND,
        ListingFailure::AccessDenied => StatusCode::FORBIDDEN,
        ListingFailure::AuctionEnded => StatusCode::BAD_REQUEST,
    };
    api_error(status, failure)
}

fn bid_failure(failure: BidFailure) -> ApiError {
    let status = match failure {
        BidFailure::DoesNotExist => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_REQUEST,
    };
    api_error(status, failure)
}

/// Browse active listings.
///
/// Supplied filters combine with AND semantics; absent filters impose no
/// constraint. The price range is inclusive on both bounds. Results are
/// ordered most recently created first.
///
/// # Returns
///
/// - `200 OK`: Matching listings, capped at the configured page limit
/// - `500 Internal Server Error`: Database query failed
async fn browse_listings<T: ApiApplication>(
    State(app): State<T>,
    Extension(config): Extension<Arc<AxumConfig>>,
    Query(query): Query<ListingQuery>,
) -> Result<Json<Vec<ListingSummary>>, ApiError> {
    let as_of = app.now();
    let mut listings = app
        .database()
        .query_listings(&query, as_of)
        .await
        .map_err(internal_error)?;
    listings.truncate(config.page_limit);
    for listing in &mut listings {
        listing.resolve_urls(app.media());
    }
    Ok(Json(listings))
}

/// Request body for creating a new listing.
#[derive(serde::Deserialize, schemars::JsonSchema)]
#[schemars(inline)]
struct CreateListingDto {
    /// The seller-supplied description
    #[serde(flatten)]
    data: ListingData,
    /// The asking price
    price: f64,
}

/// Create a new listing.
///
/// The caller becomes the seller; their user row is created or refreshed
/// from the token's claims.
///
/// # Returns
///
/// - `201 Created`: The new listing
/// - `400 Bad Request`: The asking price is not a positive number
/// - `401 Unauthorized`: No valid credentials
/// - `500 Internal Server Error`: Database operation failed
async fn create_listing<T: ApiApplication>(
    State(app): State<T>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Json(body): Json<CreateListingDto>,
) -> Result<(StatusCode, Json<ListingRecord>), ApiError> {
    let seller = require_identity(&app, auth.as_ref()).await?;
    if bidding::validate_amount(body.price).is_err() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "price must be a positive number",
        ));
    }

    let as_of = app.now();
    let db = app.database();
    db.ensure_user(&seller, as_of).await.map_err(internal_error)?;

    let listing_id = app.generate_listing_id();
    let mut listing = db
        .create_listing(listing_id, seller.user_id, body.data, body.price, as_of)
        .await
        .map_err(internal_error)?;
    listing.resolve_urls(app.media());
    Ok((StatusCode::CREATED, Json(listing)))
}

/// Retrieve a listing with its images and its bids, newest first.
///
/// # Returns
///
/// - `200 OK`: The listing
/// - `404 Not Found`: Listing does not exist
/// - `500 Internal Server Error`: Database query failed
async fn get_listing<T: ApiApplication>(
    State(app): State<T>,
    Path(Id { listing_id }): Path<Id>,
) -> Result<Json<ListingRecord>, ApiError> {
    let as_of = app.now();
    let mut listing = app
        .database()
        .get_listing(listing_id, as_of)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "listing not found"))?;
    listing.resolve_urls(app.media());
    Ok(Json(listing))
}

/// Replace a listing's seller-supplied fields.
///
/// The price is not part of the payload: once created, price moves only
/// through accepted bids.
///
/// # Authorization
///
/// The caller must be the listing's seller, and the auction must still be
/// open.
///
/// # Returns
///
/// - `200 OK`: The updated listing
/// - `400 Bad Request`: The auction has ended
/// - `401 Unauthorized`: No valid credentials
/// - `403 Forbidden`: The caller is not the seller
/// - `404 Not Found`: Listing does not exist
/// - `500 Internal Server Error`: Database operation failed
async fn update_listing<T: ApiApplication>(
    State(app): State<T>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Path(Id { listing_id }): Path<Id>,
    Json(body): Json<ListingData>,
) -> Result<Json<ListingRecord>, ApiError> {
    let caller = require_identity(&app, auth.as_ref()).await?;
    let as_of = app.now();
    let mut listing = app
        .database()
        .update_listing(listing_id, caller.user_id, body, as_of)
        .await
        .map_err(internal_error)?
        .map_err(listing_failure)?;
    listing.resolve_urls(app.media());
    Ok(Json(listing))
}

/// Delete a listing, its bids, and its image metadata.
///
/// The stored image binaries are released from object storage after the
/// database delete commits; a failed release is logged and does not fail
/// the request.
///
/// # Authorization
///
/// The caller must be the listing's seller.
///
/// # Returns
///
/// - `204 No Content`: Listing deleted
/// - `401 Unauthorized`: No valid credentials
/// - `403 Forbidden`: The caller is not the seller
/// - `404 Not Found`: Listing does not exist
/// - `500 Internal Server Error`: Database operation failed
async fn delete_listing<T: ApiApplication>(
    State(app): State<T>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Path(Id { listing_id }): Path<Id>,
) -> Result<StatusCode, ApiError> {
    let caller = require_identity(&app, auth.as_ref()).await?;
    let keys = app
        .database()
        .delete_listing(listing_id, caller.user_id)
        .await
        .map_err(internal_error)?
        .map_err(listing_failure)?;

    for key in keys {
        if let Err(err) = app.media().delete_object(&key).await {
            event!(Level::WARN, key, err = err.to_string());
        }
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Request body for placing a bid.
#[derive(serde::Deserialize, schemars::JsonSchema)]
#[schemars(inline)]
struct PlaceBidDto {
    /// The offered amount; must exceed the listing's current price
    amount: f64,
}

/// Place a bid against a listing.
///
/// An accepted bid raises the listing price to the bid amount; the bid and
/// the price update commit in a single transaction, so two simultaneous
/// bids cannot both pass a stale price comparison.
///
/// # Returns
///
/// - `200 OK`: Bid accepted; the listing with its new price
/// - `400 Bad Request`: Malformed amount, self-bid, ended auction, or an
///   amount at or below the current price; the body names the reason
/// - `401 Unauthorized`: No valid credentials
/// - `404 Not Found`: Listing does not exist
/// - `500 Internal Server Error`: Database operation failed
async fn place_bid<T: ApiApplication>(
    State(app): State<T>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Path(Id { listing_id }): Path<Id>,
    Json(body): Json<PlaceBidDto>,
) -> Result<Json<ListingRecord>, ApiError> {
    let bidder = require_identity(&app, auth.as_ref()).await?;

    // amount sanity precedes the listing lookup: a malformed amount is 400
    // even when the listing does not exist
    bidding::validate_amount(body.amount)
        .map_err(|rejection| api_error(StatusCode::BAD_REQUEST, rejection))?;

    let as_of = app.now();
    let bid_id = app.generate_bid_id();
    let mut listing = app
        .database()
        .place_bid(bid_id, listing_id, &bidder, body.amount, as_of)
        .await
        .map_err(internal_error)?
        .map_err(bid_failure)?;
    listing.resolve_urls(app.media());
    Ok(Json(listing))
}

/// Retrieve the bids against a listing, newest first.
///
/// # Returns
///
/// - `200 OK`: The bids
/// - `404 Not Found`: Listing does not exist
/// - `500 Internal Server Error`: Database query failed
async fn get_bids<T: ApiApplication>(
    State(app): State<T>,
    Path(Id { listing_id }): Path<Id>,
) -> Result<Json<Vec<BidRecord>>, ApiError> {
    let bids = app
        .database()
        .bids_for_listing(listing_id)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "listing not found"))?;
    Ok(Json(bids))
}
