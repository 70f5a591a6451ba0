use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::db::DbPool;
use crate::domain::catalog::Product;
use crate::domain::errors::DomainError;
use crate::domain::ports::{OfferRepository, ProductRepository};
use crate::schema::{offers, products};

use super::models::ProductRow;

#[derive(Clone)]
pub struct DieselProductRepository {
    pool: DbPool,
}

impl DieselProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl ProductRepository for DieselProductRepository {
    fn find_by_id(&self, id: i64) -> Result<Option<Product>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = products::table
            .filter(products::id.eq(id))
            .select(ProductRow::as_select())
            .first(&mut conn)
            .optional()?;

        Ok(row.map(Product::from))
    }
}

#[derive(Clone)]
pub struct DieselOfferRepository {
    pool: DbPool,
}

impl DieselOfferRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl OfferRepository for DieselOfferRepository {
    fn find_offer_rate(&self, product_id: i64, at: DateTime<Utc>) -> Result<i32, DomainError> {
        let mut conn = self.pool.get()?;

        // Overlapping offers are not merged: the most recently created one wins.
        let rate = offers::table
            .filter(offers::product_id.eq(product_id))
            .filter(offers::expires_at.gt(at))
            .order((offers::created_at.desc(), offers::id.desc()))
            .select(offers::rate)
            .first::<i32>(&mut conn)
            .optional()?;

        Ok(rate.unwrap_or(0))
    }
}
