use crate::r#impl::listing::images_for_listings;
use crate::{
    Db,
    types::{BidRow, ListingSummaryRow, Timestamp},
};
use apm_core::{
    bidding::{self, ListingState},
    models::{BidId, BidRecord, BidWithListing, Identity, ListingId, UserId},
    ports::{BidFailure, BidRepository, ListingRepository as _},
};
use std::collections::HashMap;
use time::OffsetDateTime;
use tracing::{Level, event};

impl BidRepository for Db {
    async fn place_bid(
        &self,
        bid_id: BidId,
        listing_id: ListingId,
        bidder: &Identity,
        amount: f64,
        as_of: OffsetDateTime,
    ) -> Result<Result<apm_core::models::ListingRecord, BidFailure>, sqlx::Error> {
        // The whole check-then-write sequence runs in one transaction on the
        // single-connection writer pool: the evaluation below sees the row as
        // of this transaction, not whatever stale price the caller read.
        let mut tx = self.writer.begin().await?;

        self.upsert_user_tx(&mut tx, bidder, as_of).await?;

        let row: Option<(String, f64, Timestamp)> =
            sqlx::query_as("select seller_id, price, end_date from listings where id = $1")
                .bind(listing_id.to_string())
                .fetch_optional(&mut *tx)
                .await?;

        let Some((seller_id, price, end_date)) = row else {
            return Ok(Err(BidFailure::DoesNotExist));
        };

        let state = ListingState {
            seller_id: seller_id
                .parse::<UserId>()
                .map_err(|err| sqlx::Error::Decode(Box::new(err)))?,
            price,
            end_date: end_date.into(),
        };

        if let Err(rejection) = bidding::evaluate(&state, bidder.user_id, amount, as_of) {
            event!(
                Level::DEBUG,
                listing = %listing_id,
                bidder = %bidder.user_id,
                amount,
                rejection = ?rejection,
            );
            return Ok(Err(rejection.into()));
        }

        sqlx::query(
            r#"
            insert into bids (id, listing_id, bidder_id, amount, created_at)
            values ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(bid_id.to_string())
        .bind(listing_id.to_string())
        .bind(bidder.user_id.to_string())
        .bind(amount)
        .bind(Timestamp::from(as_of))
        .execute(&mut *tx)
        .await?;

        // The evaluator already passed; the predicate is a final guard that
        // keeps price monotone under any interleaving.
        let updated = sqlx::query(
            "update listings set price = $2, updated_at = $3 where id = $1 and price < $2",
        )
        .bind(listing_id.to_string())
        .bind(amount)
        .bind(Timestamp::from(as_of))
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Ok(Err(BidFailure::BidTooLow));
        }

        tx.commit().await?;

        self.get_listing(listing_id, as_of)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
            .map(Ok)
    }

    async fn bids_for_listing(
        &self,
        listing_id: ListingId,
    ) -> Result<Option<Vec<BidRecord>>, sqlx::Error> {
        let exists: Option<i64> = sqlx::query_scalar("select 1 from listings where id = $1")
            .bind(listing_id.to_string())
            .fetch_optional(&self.reader)
            .await?;
        if exists.is_none() {
            return Ok(None);
        }

        let rows: Vec<BidRow> = sqlx::query_as(
            r#"
            select
                b.id, b.listing_id, b.bidder_id, u.name as bidder_name,
                b.amount, b.created_at
            from bids b
            join users u on u.id = b.bidder_id
            where b.listing_id = $1
            order by b.created_at desc, b.rowid desc
            "#,
        )
        .bind(listing_id.to_string())
        .fetch_all(&self.reader)
        .await?;

        Ok(Some(rows.into_iter().map(Into::into).collect()))
    }

    async fn bids_by_bidder(
        &self,
        bidder_id: UserId,
        as_of: OffsetDateTime,
    ) -> Result<Vec<BidWithListing>, sqlx::Error> {
        let bids: Vec<BidRow> = sqlx::query_as(
            r#"
            select
                b.id, b.listing_id, b.bidder_id, u.name as bidder_name,
                b.amount, b.created_at
            from bids b
            join users u on u.id = b.bidder_id
            where b.bidder_id = $1
            order by b.created_at desc, b.rowid desc
            "#,
        )
        .bind(bidder_id.to_string())
        .fetch_all(&self.reader)
        .await?;

        let mut listing_ids: Vec<ListingId> = bids.iter().map(|b| b.listing_id).collect();
        listing_ids.sort();
        listing_ids.dedup();

        if listing_ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            r#"
            select {columns},
                (select count(*) from bids b where b.listing_id = l.id) as bid_count
            from listings l
            join users u on u.id = l.seller_id
            join json_each($1) on l.id = json_each.value
            "#,
            columns = super::listing::LISTING_COLUMNS
        );
        let rows: Vec<ListingSummaryRow> = sqlx::query_as(&sql)
            .bind(sqlx::types::Json(&listing_ids))
            .fetch_all(&self.reader)
            .await?;

        let mut images = images_for_listings(&self.reader, &listing_ids).await?;
        let listings: HashMap<ListingId, apm_core::models::ListingSummary> = rows
            .into_iter()
            .map(|row| {
                let id = row.id;
                let listing_images = images.remove(&id).unwrap_or_default();
                (id, row.into_summary(as_of, listing_images))
            })
            .collect();

        Ok(bids
            .into_iter()
            .filter_map(|bid| {
                let listing = listings.get(&bid.listing_id)?.clone();
                Some(BidWithListing {
                    bid: bid.into(),
                    listing,
                })
            })
            .collect())
    }
}
