use crate::Db;
use apm_core::ports::{MarketRepository, Repository};

mod bid;
mod image;
mod listing;
mod user;

impl Repository for Db {
    type Error = sqlx::Error;
}

impl MarketRepository for Db {}
