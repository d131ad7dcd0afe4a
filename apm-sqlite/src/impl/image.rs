use crate::{
    Db,
    types::Timestamp,
};
use apm_core::{
    models::{ImageData, ImageId, ImageRecord, ListingId, UserId},
    ports::{ImageFailure, ImageRepository},
};
use time::OffsetDateTime;

impl ImageRepository for Db {
    async fn attach_image(
        &self,
        image_id: ImageId,
        listing_id: ListingId,
        seller_id: UserId,
        data: ImageData,
        as_of: OffsetDateTime,
    ) -> Result<Result<ImageRecord, ImageFailure>, sqlx::Error> {
        let mut tx = self.writer.begin().await?;

        let owner: Option<String> =
            sqlx::query_scalar("select seller_id from listings where id = $1")
                .bind(listing_id.to_string())
                .fetch_optional(&mut *tx)
                .await?;

        let Some(owner) = owner else {
            return Ok(Err(ImageFailure::DoesNotExist));
        };
        if owner != seller_id.to_string() {
            return Ok(Err(ImageFailure::AccessDenied));
        }

        if data.is_default {
            // the new image takes over the default flag
            sqlx::query("update images set is_default = 0 where listing_id = $1 and is_default = 1")
                .bind(listing_id.to_string())
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(
            r#"
            insert into images (id, listing_id, key, is_default, created_at)
            values ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(image_id.to_string())
        .bind(listing_id.to_string())
        .bind(&data.key)
        .bind(data.is_default)
        .bind(Timestamp::from(as_of))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Ok(ImageRecord {
            id: image_id,
            listing_id,
            key: data.key,
            url: None,
            is_default: data.is_default,
        }))
    }

    async fn delete_image(
        &self,
        image_id: ImageId,
        seller_id: UserId,
    ) -> Result<Result<String, ImageFailure>, sqlx::Error> {
        let mut tx = self.writer.begin().await?;

        let row: Option<(String, String)> = sqlx::query_as(
            r#"
            select images.key, listings.seller_id
            from images
            join listings on listings.id = images.listing_id
            where images.id = $1
            "#,
        )
        .bind(image_id.to_string())
        .fetch_optional(&mut *tx)
        .await?;

        let Some((key, owner)) = row else {
            return Ok(Err(ImageFailure::DoesNotExist));
        };
        if owner != seller_id.to_string() {
            return Ok(Err(ImageFailure::AccessDenied));
        }

        sqlx::query("delete from images where id = $1")
            .bind(image_id.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Ok(key))
    }
}
