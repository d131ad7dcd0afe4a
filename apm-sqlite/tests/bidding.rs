mod common;

use apm_core::ports::{BidFailure, BidRepository as _, ListingRepository as _};
use common::{bid_id, identity, open_db, part, seed_listing};
use time::{Duration, OffsetDateTime};

/// The concrete scenario from the design notes: alice lists at 100, bob's
/// 150 is accepted, bob's follow-up 120 is now too low, and alice may never
/// bid on her own listing.
#[tokio::test]
async fn bid_scenario() {
    let db = open_db().await;
    let now = OffsetDateTime::now_utc();

    let alice = identity("alice");
    let bob = identity("bob");
    let listing = seed_listing(&db, &alice, part("turbocharger", now + Duration::hours(1)), 100.0, now).await;

    // bob bids 150: accepted, price moves, one bid recorded
    let updated = db
        .place_bid(bid_id(), listing.id, &bob, 150.0, now)
        .await
        .unwrap()
        .expect("150 > 100 should be accepted");
    assert_eq!(updated.price, 150.0);
    assert_eq!(updated.bids.len(), 1);
    assert_eq!(updated.bids[0].amount, 150.0);
    assert_eq!(updated.bids[0].bidder_id, bob.user_id);
    assert_eq!(updated.bids[0].listing_id, listing.id);

    // bob bids 120: now below the current price
    let rejected = db
        .place_bid(bid_id(), listing.id, &bob, 120.0, now)
        .await
        .unwrap();
    assert_eq!(rejected, Err(BidFailure::BidTooLow));

    // alice bids 200 on her own listing
    let rejected = db
        .place_bid(bid_id(), listing.id, &alice, 200.0, now)
        .await
        .unwrap();
    assert_eq!(rejected, Err(BidFailure::SelfBid));

    // rejected bids were never persisted
    let listing = db.get_listing(listing.id, now).await.unwrap().unwrap();
    assert_eq!(listing.bids.len(), 1);
    assert_eq!(listing.price, 150.0);
}

#[tokio::test]
async fn bids_are_ordered_newest_first() {
    let db = open_db().await;
    let now = OffsetDateTime::now_utc();

    let seller = identity("seller");
    let bidder = identity("bidder");
    let listing = seed_listing(&db, &seller, part("gearbox", now + Duration::hours(1)), 10.0, now).await;

    for (offset, amount) in [(0, 20.0), (1, 30.0), (2, 40.0)] {
        db.place_bid(
            bid_id(),
            listing.id,
            &bidder,
            amount,
            now + Duration::seconds(offset),
        )
        .await
        .unwrap()
        .unwrap();
    }

    let listing = db.get_listing(listing.id, now).await.unwrap().unwrap();
    let amounts: Vec<f64> = listing.bids.iter().map(|b| b.amount).collect();
    assert_eq!(amounts, vec![40.0, 30.0, 20.0]);
}

#[tokio::test]
async fn ended_auctions_reject_every_bid() {
    let db = open_db().await;
    let now = OffsetDateTime::now_utc();

    let seller = identity("seller");
    let bidder = identity("bidder");
    let listing = seed_listing(&db, &seller, part("camshaft", now - Duration::seconds(1)), 100.0, now).await;

    for amount in [50.0, 150.0, 1_000_000.0] {
        let rejected = db
            .place_bid(bid_id(), listing.id, &bidder, amount, now)
            .await
            .unwrap();
        assert_eq!(rejected, Err(BidFailure::AuctionEnded));
    }
}

#[tokio::test]
async fn missing_listing_is_reported() {
    let db = open_db().await;
    let now = OffsetDateTime::now_utc();
    let bidder = identity("bidder");

    let rejected = db
        .place_bid(
            bid_id(),
            apm_core::models::ListingId(uuid::Uuid::new_v4()),
            &bidder,
            100.0,
            now,
        )
        .await
        .unwrap();
    assert_eq!(rejected, Err(BidFailure::DoesNotExist));
}

/// Two concurrent bids must serialize: both may be recorded, and the final
/// price is the larger of the two no matter which transaction lands first.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_bids_serialize() {
    let db = open_db().await;
    let now = OffsetDateTime::now_utc();

    let seller = identity("seller");
    let listing = seed_listing(&db, &seller, part("crankshaft", now + Duration::hours(1)), 100.0, now).await;

    let carol = identity("carol");
    let dave = identity("dave");

    let a = {
        let db = db.clone();
        let carol = carol.clone();
        let id = listing.id;
        tokio::spawn(async move { db.place_bid(bid_id(), id, &carol, 200.0, now).await })
    };
    let b = {
        let db = db.clone();
        let dave = dave.clone();
        let id = listing.id;
        tokio::spawn(async move { db.place_bid(bid_id(), id, &dave, 250.0, now).await })
    };

    let a = a.await.unwrap().unwrap();
    let b = b.await.unwrap().unwrap();

    let listing = db.get_listing(listing.id, now).await.unwrap().unwrap();
    assert_eq!(listing.price, 250.0, "price must end at the larger bid");

    match (a, b) {
        // 200 landed first, then 250: both recorded
        (Ok(_), Ok(_)) => {
            assert_eq!(listing.bids.len(), 2);
        }
        // 250 landed first: 200 is now too low and was never persisted
        (Err(BidFailure::BidTooLow), Ok(_)) => {
            assert_eq!(listing.bids.len(), 1);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    // in every acceptable interleaving the price history is monotone
    let mut amounts: Vec<f64> = listing.bids.iter().map(|b| b.amount).collect();
    amounts.reverse();
    assert!(amounts.windows(2).all(|w| w[0] < w[1]));
}

/// Post-condition of every accepted bid: the listing price equals the bid
/// amount and a matching bid record exists.
#[tokio::test]
async fn accepted_bid_postcondition() {
    let db = open_db().await;
    let now = OffsetDateTime::now_utc();

    let seller = identity("seller");
    let bidder = identity("bidder");
    let listing = seed_listing(&db, &seller, part("radiator", now + Duration::hours(1)), 25.0, now).await;

    let updated = db
        .place_bid(bid_id(), listing.id, &bidder, 26.5, now)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.price, 26.5);
    let bid = &updated.bids[0];
    assert_eq!(bid.amount, 26.5);
    assert_eq!(bid.listing_id, listing.id);
    assert_eq!(bid.bidder_id, bidder.user_id);
}

#[tokio::test]
async fn bidder_dashboard_lists_bids_with_listings() {
    let db = open_db().await;
    let now = OffsetDateTime::now_utc();

    let seller = identity("seller");
    let bidder = identity("bidder");
    let first = seed_listing(&db, &seller, part("alternator", now + Duration::hours(1)), 10.0, now).await;
    let second = seed_listing(&db, &seller, part("starter", now + Duration::hours(1)), 10.0, now).await;

    db.place_bid(bid_id(), first.id, &bidder, 20.0, now)
        .await
        .unwrap()
        .unwrap();
    db.place_bid(bid_id(), second.id, &bidder, 30.0, now + Duration::seconds(1))
        .await
        .unwrap()
        .unwrap();

    let bids = db.bids_by_bidder(bidder.user_id, now).await.unwrap();
    assert_eq!(bids.len(), 2);
    assert_eq!(bids[0].bid.amount, 30.0);
    assert_eq!(bids[0].listing.id, second.id);
    assert_eq!(bids[1].bid.amount, 20.0);
    assert_eq!(bids[1].listing.id, first.id);
}
