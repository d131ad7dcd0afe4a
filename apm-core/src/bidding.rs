//! Bid acceptance and listing lifecycle rules.
//!
//! This module is the heart of the marketplace: given a listing's current
//! state and a proposed bid, decide accept or reject. It is deliberately pure
//! (no clock, no I/O) so the persistence adapter can re-run the exact same
//! checks against a freshly-read row inside its write transaction, closing
//! the window where two concurrent bids both pass a stale comparison.

use crate::models::UserId;
use thiserror::Error;
use time::OffsetDateTime;

/// The ways a proposed bid can be rejected.
///
/// Every variant is terminal and user-correctable: the caller must change
/// its input or wait for state to change. None of them warrant a retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BidRejection {
    /// The amount was not a positive finite number
    #[error("bid amount must be a positive number")]
    InvalidAmount,
    /// The bidder is the listing's seller
    #[error("sellers cannot bid on their own listing")]
    SelfBid,
    /// The listing's end timestamp has passed
    #[error("this auction has ended")]
    AuctionEnded,
    /// The amount does not exceed the current price
    #[error("bid amount must be higher than the current price")]
    BidTooLow,
}

/// The slice of listing state the evaluator needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListingState {
    /// The owning seller
    pub seller_id: UserId,
    /// Current price: highest accepted bid, or the original ask
    pub price: f64,
    /// When the auction closes
    pub end_date: OffsetDateTime,
}

/// Whether a listing is still open for mutation at `now`.
///
/// The single source of truth for the lazy active/ended transition: there is
/// no background job flipping status, so every write path (bid, edit) and
/// every serialized status field consults this comparison.
pub fn is_open(end_date: OffsetDateTime, now: OffsetDateTime) -> bool {
    now < end_date
}

/// A bid amount is acceptable input only if it is a positive finite number.
///
/// Split out from [`evaluate`] because the HTTP layer must reject malformed
/// amounts *before* it looks the listing up: an anonymous caller gets 401, a
/// bad amount gets 400, and only then does a missing listing get 404.
pub fn validate_amount(amount: f64) -> Result<(), BidRejection> {
    if amount.is_finite() && amount > 0.0 {
        Ok(())
    } else {
        Err(BidRejection::InvalidAmount)
    }
}

/// Decide whether `bidder_id` may bid `amount` against `listing` at `now`.
///
/// Checks run in a fixed order and short-circuit on the first failure:
///
/// 1. `amount` must be a positive finite number
/// 2. the bidder must not be the seller
/// 3. `now` must be strictly before the end timestamp
/// 4. `amount` must be strictly greater than the current price
///
/// On `Ok(())` the caller persists the bid and sets the listing price to
/// `amount`; price is therefore monotonically non-decreasing over the
/// listing's lifetime.
pub fn evaluate(
    listing: &ListingState,
    bidder_id: UserId,
    amount: f64,
    now: OffsetDateTime,
) -> Result<(), BidRejection> {
    validate_amount(amount)?;

    if bidder_id == listing.seller_id {
        return Err(BidRejection::SelfBid);
    }

    if !is_open(listing.end_date, now) {
        return Err(BidRejection::AuctionEnded);
    }

    if amount <= listing.price {
        return Err(BidRejection::BidTooLow);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;
    use time::macros::datetime;

    fn listing(price: f64, end_date: OffsetDateTime) -> (ListingState, UserId) {
        let seller = UserId(uuid::Uuid::new_v4());
        (
            ListingState {
                seller_id: seller,
                price,
                end_date,
            },
            seller,
        )
    }

    const NOW: OffsetDateTime = datetime!(2024-06-01 12:00 UTC);

    #[test]
    fn accepts_a_higher_bid_while_open() {
        let (listing, _) = listing(100.0, NOW + Duration::hours(1));
        let bob = UserId(uuid::Uuid::new_v4());
        assert_eq!(evaluate(&listing, bob, 150.0, NOW), Ok(()));
    }

    #[test]
    fn rejects_non_positive_and_non_finite_amounts() {
        let (listing, _) = listing(100.0, NOW + Duration::hours(1));
        let bob = UserId(uuid::Uuid::new_v4());
        for amount in [0.0, -5.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert_eq!(
                evaluate(&listing, bob, amount, NOW),
                Err(BidRejection::InvalidAmount)
            );
        }
    }

    #[test]
    fn rejects_the_seller_regardless_of_amount() {
        let (listing, seller) = listing(100.0, NOW + Duration::hours(1));
        assert_eq!(
            evaluate(&listing, seller, 200.0, NOW),
            Err(BidRejection::SelfBid)
        );
    }

    #[test]
    fn self_bid_takes_precedence_over_ended_and_too_low() {
        let (listing, seller) = listing(100.0, NOW - Duration::hours(1));
        assert_eq!(
            evaluate(&listing, seller, 50.0, NOW),
            Err(BidRejection::SelfBid)
        );
    }

    #[test]
    fn rejects_every_bid_once_ended() {
        let (listing, _) = listing(100.0, NOW - Duration::seconds(1));
        let bob = UserId(uuid::Uuid::new_v4());
        for amount in [50.0, 100.0, 1_000_000.0] {
            assert_eq!(
                evaluate(&listing, bob, amount, NOW),
                Err(BidRejection::AuctionEnded)
            );
        }
    }

    #[test]
    fn end_timestamp_is_exclusive() {
        // now == end_date means the auction is over
        let (listing, _) = listing(100.0, NOW);
        let bob = UserId(uuid::Uuid::new_v4());
        assert_eq!(
            evaluate(&listing, bob, 150.0, NOW),
            Err(BidRejection::AuctionEnded)
        );
        assert!(!is_open(NOW, NOW));
        assert!(is_open(NOW + Duration::nanoseconds(1), NOW));
    }

    #[test]
    fn rejects_amounts_at_or_below_the_current_price() {
        let (listing, _) = listing(100.0, NOW + Duration::hours(1));
        let bob = UserId(uuid::Uuid::new_v4());
        assert_eq!(
            evaluate(&listing, bob, 100.0, NOW),
            Err(BidRejection::BidTooLow)
        );
        assert_eq!(
            evaluate(&listing, bob, 99.99, NOW),
            Err(BidRejection::BidTooLow)
        );
        assert_eq!(evaluate(&listing, bob, 100.01, NOW), Ok(()));
    }
}
