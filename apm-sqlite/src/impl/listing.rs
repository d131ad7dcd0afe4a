use crate::{
    Db,
    types::{BidRow, ImageRow, ListingRow, ListingSummaryRow, Timestamp},
};
use apm_core::{
    bidding::is_open,
    models::{
        ImageRecord, ListingData, ListingId, ListingQuery, ListingRecord, ListingSummary, UserId,
    },
    ports::{ListingFailure, ListingRepository},
};
use std::collections::HashMap;
use time::OffsetDateTime;

/// Fetch the images for a set of listings, grouped by listing, default
/// image first.
pub(crate) async fn images_for_listings(
    pool: &sqlx::Pool<sqlx::Sqlite>,
    listing_ids: &[ListingId],
) -> Result<HashMap<ListingId, Vec<ImageRecord>>, sqlx::Error> {
    if listing_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<ImageRow> = sqlx::query_as(
        r#"
        select
            images.id, images.listing_id, images.key, images.is_default
        from
            images
        join
            json_each($1)
        on
            images.listing_id = json_each.value
        order by
            images.is_default desc, images.created_at asc, images.rowid asc
        "#,
    )
    .bind(sqlx::types::Json(listing_ids))
    .fetch_all(pool)
    .await?;

    let mut grouped: HashMap<ListingId, Vec<ImageRecord>> = HashMap::new();
    for row in rows {
        grouped
            .entry(row.listing_id)
            .or_default()
            .push(row.into());
    }
    Ok(grouped)
}

pub(crate) const LISTING_COLUMNS: &str = r#"
    l.id, l.seller_id, u.name as seller_name, l.title, l.description,
    l.category, l.make, l.model, l.year, l.condition, l.location,
    l.price, l.end_date, l.created_at
"#;

impl ListingRepository for Db {
    async fn create_listing(
        &self,
        listing_id: ListingId,
        seller_id: UserId,
        data: ListingData,
        price: f64,
        as_of: OffsetDateTime,
    ) -> Result<ListingRecord, sqlx::Error> {
        sqlx::query(
            r#"
            insert into listings
                (id, seller_id, title, description, category, make, model,
                 year, condition, location, price, end_date, created_at, updated_at)
            values
                ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $13)
            "#,
        )
        .bind(listing_id.to_string())
        .bind(seller_id.to_string())
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.category)
        .bind(&data.make)
        .bind(&data.model)
        .bind(data.year)
        .bind(&data.condition)
        .bind(&data.location)
        .bind(price)
        .bind(Timestamp::from(data.end_date))
        .bind(Timestamp::from(as_of))
        .execute(&self.writer)
        .await?;

        self.get_listing(listing_id, as_of)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    async fn get_listing(
        &self,
        listing_id: ListingId,
        as_of: OffsetDateTime,
    ) -> Result<Option<ListingRecord>, sqlx::Error> {
        let sql = format!(
            r#"
            select {LISTING_COLUMNS}
            from listings l
            join users u on u.id = l.seller_id
            where l.id = $1
            "#
        );
        let Some(row) = sqlx::query_as::<_, ListingRow>(&sql)
            .bind(listing_id.to_string())
            .fetch_optional(&self.reader)
            .await?
        else {
            return Ok(None);
        };

        let bids: Vec<BidRow> = sqlx::query_as(
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

        let mut images = images_for_listings(&self.reader, &[listing_id]).await?;
        let images = images.remove(&listing_id).unwrap_or_default();

        Ok(Some(row.into_record(
            as_of,
            images,
            bids.into_iter().map(Into::into).collect(),
        )))
    }

    async fn query_listings(
        &self,
        query: &ListingQuery,
        as_of: OffsetDateTime,
    ) -> Result<Vec<ListingSummary>, sqlx::Error> {
        let sql = format!(
            r#"
            select {LISTING_COLUMNS},
                (select count(*) from bids b where b.listing_id = l.id) as bid_count
            from listings l
            join users u on u.id = l.seller_id
            where l.end_date > $1
              and ($2 is null or l.category = $2)
              and ($3 is null or l.make = $3)
              and ($4 is null or l.model = $4)
              and ($5 is null or l.condition = $5)
              and ($6 is null or l.price >= $6)
              and ($7 is null or l.price <= $7)
            order by l.created_at desc, l.rowid desc
            "#
        );
        let rows: Vec<ListingSummaryRow> = sqlx::query_as(&sql)
            .bind(Timestamp::from(as_of))
            .bind(query.category.as_deref())
            .bind(query.make.as_deref())
            .bind(query.model.as_deref())
            .bind(query.condition.as_deref())
            .bind(query.min_price)
            .bind(query.max_price)
            .fetch_all(&self.reader)
            .await?;

        self.assemble_summaries(rows, as_of).await
    }

    async fn update_listing(
        &self,
        listing_id: ListingId,
        seller_id: UserId,
        data: ListingData,
        as_of: OffsetDateTime,
    ) -> Result<Result<ListingRecord, ListingFailure>, sqlx::Error> {
        let mut tx = self.writer.begin().await?;

        let row: Option<(String, Timestamp)> =
            sqlx::query_as("select seller_id, end_date from listings where id = $1")
                .bind(listing_id.to_string())
                .fetch_optional(&mut *tx)
                .await?;

        let Some((owner, end_date)) = row else {
            return Ok(Err(ListingFailure::DoesNotExist));
        };
        if owner != seller_id.to_string() {
            return Ok(Err(ListingFailure::AccessDenied));
        }
        if !is_open(end_date.into(), as_of) {
            return Ok(Err(ListingFailure::AuctionEnded));
        }

        sqlx::query(
            r#"
            update listings set
                title = $2, description = $3, category = $4, make = $5,
                model = $6, year = $7, condition = $8, location = $9,
                end_date = $10, updated_at = $11
            where id = $1
            "#,
        )
        .bind(listing_id.to_string())
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.category)
        .bind(&data.make)
        .bind(&data.model)
        .bind(data.year)
        .bind(&data.condition)
        .bind(&data.location)
        .bind(Timestamp::from(data.end_date))
        .bind(Timestamp::from(as_of))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get_listing(listing_id, as_of)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
            .map(Ok)
    }

    async fn delete_listing(
        &self,
        listing_id: ListingId,
        seller_id: UserId,
    ) -> Result<Result<Vec<String>, ListingFailure>, sqlx::Error> {
        let mut tx = self.writer.begin().await?;

        let owner: Option<String> =
            sqlx::query_scalar("select seller_id from listings where id = $1")
                .bind(listing_id.to_string())
                .fetch_optional(&mut *tx)
                .await?;

        let Some(owner) = owner else {
            return Ok(Err(ListingFailure::DoesNotExist));
        };
        if owner != seller_id.to_string() {
            return Ok(Err(ListingFailure::AccessDenied));
        }

        let keys: Vec<String> =
            sqlx::query_scalar("select key from images where listing_id = $1")
                .bind(listing_id.to_string())
                .fetch_all(&mut *tx)
                .await?;

        // cascades to bids and images
        sqlx::query("delete from listings where id = $1")
            .bind(listing_id.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Ok(keys))
    }

    async fn listings_by_seller(
        &self,
        seller_id: UserId,
        as_of: OffsetDateTime,
    ) -> Result<Vec<ListingSummary>, sqlx::Error> {
        let sql = format!(
            r#"
            select {LISTING_COLUMNS},
                (select count(*) from bids b where b.listing_id = l.id) as bid_count
            from listings l
            join users u on u.id = l.seller_id
            where l.seller_id = $1
            order by l.created_at desc, l.rowid desc
            "#
        );
        let rows: Vec<ListingSummaryRow> = sqlx::query_as(&sql)
            .bind(seller_id.to_string())
            .fetch_all(&self.reader)
            .await?;

        self.assemble_summaries(rows, as_of).await
    }
}

impl Db {
    pub(crate) async fn assemble_summaries(
        &self,
        rows: Vec<ListingSummaryRow>,
        as_of: OffsetDateTime,
    ) -> Result<Vec<ListingSummary>, sqlx::Error> {
        let ids: Vec<ListingId> = rows.iter().map(|r| r.id).collect();
        let mut images = images_for_listings(&self.reader, &ids).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let listing_images = images.remove(&row.id).unwrap_or_default();
                row.into_summary(as_of, listing_images)
            })
            .collect())
    }
}
