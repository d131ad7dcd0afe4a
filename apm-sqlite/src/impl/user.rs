use crate::{
    Db,
    types::{Timestamp, UserRow},
};
use apm_core::{
    models::{Identity, UserId, UserRecord, UserSettings},
    ports::UserRepository,
};
use time::OffsetDateTime;

const UPSERT_USER: &str = r#"
    insert into users (id, name, email, created_at, updated_at)
    values ($1, $2, $3, $4, $4)
    on conflict (id) do update set
        name = excluded.name,
        email = excluded.email,
        updated_at = excluded.updated_at
"#;

impl Db {
    /// Upsert a user row inside an open transaction, so write paths can
    /// guarantee the row exists before inserting anything that references it.
    pub(crate) async fn upsert_user_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        identity: &Identity,
        as_of: OffsetDateTime,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(UPSERT_USER)
            .bind(identity.user_id.to_string())
            .bind(&identity.name)
            .bind(&identity.email)
            .bind(Timestamp::from(as_of))
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}

impl UserRepository for Db {
    async fn ensure_user(
        &self,
        identity: &Identity,
        as_of: OffsetDateTime,
    ) -> Result<UserRecord, sqlx::Error> {
        let row: UserRow = sqlx::query_as(&format!("{UPSERT_USER} returning id, name, email"))
            .bind(identity.user_id.to_string())
            .bind(&identity.name)
            .bind(&identity.email)
            .bind(Timestamp::from(as_of))
            .fetch_one(&self.writer)
            .await?;
        Ok(row.into())
    }

    async fn get_user(&self, user_id: UserId) -> Result<Option<UserRecord>, sqlx::Error> {
        let row: Option<UserRow> =
            sqlx::query_as("select id, name, email from users where id = $1")
                .bind(user_id.to_string())
                .fetch_optional(&self.reader)
                .await?;
        Ok(row.map(Into::into))
    }

    async fn update_settings(
        &self,
        user_id: UserId,
        settings: UserSettings,
        as_of: OffsetDateTime,
    ) -> Result<Option<UserRecord>, sqlx::Error> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            update users set
                name = coalesce($2, name),
                email = coalesce($3, email),
                updated_at = $4
            where id = $1
            returning id, name, email
            "#,
        )
        .bind(user_id.to_string())
        .bind(&settings.name)
        .bind(&settings.email)
        .bind(Timestamp::from(as_of))
        .fetch_optional(&self.writer)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn delete_account(&self, user_id: UserId) -> Result<Option<Vec<String>>, sqlx::Error> {
        let mut tx = self.writer.begin().await?;

        let exists: Option<i64> = sqlx::query_scalar("select 1 from users where id = $1")
            .bind(user_id.to_string())
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Ok(None);
        }

        // the keys of every image on every listing the user owns, so the
        // caller can release the stored binaries after the cascade
        let keys: Vec<String> = sqlx::query_scalar(
            r#"
            select images.key
            from images
            join listings on listings.id = images.listing_id
            where listings.seller_id = $1
            "#,
        )
        .bind(user_id.to_string())
        .fetch_all(&mut *tx)
        .await?;

        // cascades to the user's bids, their listings, and those listings'
        // bids and images
        sqlx::query("delete from users where id = $1")
            .bind(user_id.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(keys))
    }
}
