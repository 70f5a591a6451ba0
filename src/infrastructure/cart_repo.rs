use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::upsert::excluded;

use crate::db::DbPool;
use crate::domain::cart::{CartLine, CartLineView, CartUpdate};
use crate::domain::errors::DomainError;
use crate::domain::ports::CartRepository;
use crate::schema::{cart_items, products};

use super::models::{CartItemRow, NewCartItemRow, ProductRow};

#[derive(Clone)]
pub struct DieselCartRepository {
    pool: DbPool,
}

impl DieselCartRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Store-side `quantity = quantity + delta` on a line owned by `user_id`.
    fn shift_quantity(&self, user_id: i64, cart_id: i64, delta: i32) -> Result<CartLine, DomainError> {
        let mut conn = self.pool.get()?;

        let row = diesel::update(
            cart_items::table
                .filter(cart_items::id.eq(cart_id))
                .filter(cart_items::user_id.eq(user_id)),
        )
        .set((
            cart_items::quantity.eq(cart_items::quantity + delta),
            cart_items::updated_at.eq(Utc::now()),
        ))
        .returning(CartItemRow::as_returning())
        .get_result(&mut conn)
        .optional()?;

        row.map(CartLine::from).ok_or(DomainError::NotFound("Cart line"))
    }
}

/// Deletes a line whose quantity fell to zero or below. Runs inside the
/// caller's transaction so the non-positive row is never committed.
fn collapse(conn: &mut PgConnection, row: CartItemRow) -> Result<CartUpdate, DomainError> {
    if row.quantity > 0 {
        return Ok(CartUpdate::Updated(row.into()));
    }

    diesel::delete(
        cart_items::table
            .filter(cart_items::id.eq(row.id))
            .filter(cart_items::user_id.eq(row.user_id))
            .filter(cart_items::quantity.le(0)),
    )
    .execute(conn)?;

    Ok(CartUpdate::Removed(row.id))
}

impl CartRepository for DieselCartRepository {
    fn check_if_item_is_already_added(
        &self,
        user_id: i64,
        product_id: i64,
    ) -> Result<Option<i64>, DomainError> {
        let mut conn = self.pool.get()?;

        Ok(cart_items::table
            .filter(cart_items::user_id.eq(user_id))
            .filter(cart_items::product_id.eq(product_id))
            .select(cart_items::id)
            .first::<i64>(&mut conn)
            .optional()?)
    }

    fn add_to_cart(
        &self,
        user_id: i64,
        product_id: i64,
        quantity: i32,
    ) -> Result<CartLine, DomainError> {
        let mut conn = self.pool.get()?;

        let row = diesel::insert_into(cart_items::table)
            .values(&NewCartItemRow {
                user_id,
                product_id,
                quantity,
            })
            .on_conflict((cart_items::user_id, cart_items::product_id))
            .do_update()
            .set((
                cart_items::quantity.eq(cart_items::quantity + excluded(cart_items::quantity)),
                cart_items::updated_at.eq(Utc::now()),
            ))
            .returning(CartItemRow::as_returning())
            .get_result(&mut conn)?;

        Ok(row.into())
    }

    fn update_quantity_add(
        &self,
        user_id: i64,
        cart_id: i64,
        delta: i32,
    ) -> Result<CartLine, DomainError> {
        self.shift_quantity(user_id, cart_id, delta)
    }

    fn update_quantity_less(
        &self,
        user_id: i64,
        cart_id: i64,
        delta: i32,
    ) -> Result<CartUpdate, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let row = diesel::update(
                cart_items::table
                    .filter(cart_items::id.eq(cart_id))
                    .filter(cart_items::user_id.eq(user_id)),
            )
            .set((
                cart_items::quantity.eq(cart_items::quantity - delta),
                cart_items::updated_at.eq(Utc::now()),
            ))
            .returning(CartItemRow::as_returning())
            .get_result(conn)
            .optional()?
            .ok_or(DomainError::NotFound("Cart line"))?;

            collapse(conn, row)
        })
    }

    fn update_quantity(
        &self,
        user_id: i64,
        cart_id: i64,
        quantity: i32,
    ) -> Result<CartUpdate, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let row = diesel::update(
                cart_items::table
                    .filter(cart_items::id.eq(cart_id))
                    .filter(cart_items::user_id.eq(user_id)),
            )
            .set((
                cart_items::quantity.eq(quantity),
                cart_items::updated_at.eq(Utc::now()),
            ))
            .returning(CartItemRow::as_returning())
            .get_result(conn)
            .optional()?
            .ok_or(DomainError::NotFound("Cart line"))?;

            collapse(conn, row)
        })
    }

    fn remove_from_cart(&self, user_id: i64, cart_id: i64) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        diesel::delete(
            cart_items::table
                .filter(cart_items::id.eq(cart_id))
                .filter(cart_items::user_id.eq(user_id)),
        )
        .execute(&mut conn)?;

        Ok(())
    }

    fn get_cart(
        &self,
        user_id: i64,
        cart_ids: Option<&[i64]>,
    ) -> Result<Vec<CartLineView>, DomainError> {
        let mut conn = self.pool.get()?;

        let mut query = cart_items::table
            .inner_join(products::table)
            .filter(cart_items::user_id.eq(user_id))
            .filter(cart_items::quantity.gt(0))
            .select((CartItemRow::as_select(), ProductRow::as_select()))
            .into_boxed();

        if let Some(ids) = cart_ids {
            query = query.filter(cart_items::id.eq_any(ids.to_vec()));
        }

        let rows: Vec<(CartItemRow, ProductRow)> =
            query.order(cart_items::id.asc()).load(&mut conn)?;

        Ok(rows.into_iter().map(CartLineView::from).collect())
    }
}
