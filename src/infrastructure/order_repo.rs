use chrono::Utc;
use diesel::prelude::*;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::{
    ListResult, NewOrder, OrderItemInput, OrderStatus, OrderView, PaymentSettlement, PaymentStatus,
};
use crate::domain::ports::OrderRepository;
use crate::schema::{cart_items, order_items, orders};

use super::models::{NewOrderItemRow, NewOrderRow, OrderItemRow, OrderRow};

#[derive(Clone)]
pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl OrderRepository for DieselOrderRepository {
    fn create(
        &self,
        order: NewOrder,
        items: Vec<OrderItemInput>,
        clear_cart_ids: &[i64],
    ) -> Result<OrderView, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            // 1. Insert the order header
            let user_id = order.user_id;
            let header: OrderRow = diesel::insert_into(orders::table)
                .values(&NewOrderRow {
                    user_id,
                    address: order.address,
                    payment_method: order.payment_method,
                    final_price: order.final_price,
                    coupon: order.coupon,
                    order_status: OrderStatus::Pending.as_str().to_string(),
                    payment_status: PaymentStatus::Unpaid.as_str().to_string(),
                })
                .returning(OrderRow::as_returning())
                .get_result(conn)?;

            // 2. Freeze one item per priced cart line
            let new_items: Vec<NewOrderItemRow> = items
                .iter()
                .map(|i| NewOrderItemRow {
                    order_id: header.id,
                    product_id: i.product_id,
                    quantity: i.quantity,
                    item_price: i.item_price,
                    item_discounted_price: i.item_discounted_price,
                })
                .collect();
            let rows: Vec<OrderItemRow> = diesel::insert_into(order_items::table)
                .values(&new_items)
                .returning(OrderItemRow::as_returning())
                .get_results(conn)?;

            // 3. Optionally drop the ordered lines from the cart
            if !clear_cart_ids.is_empty() {
                diesel::delete(
                    cart_items::table
                        .filter(cart_items::user_id.eq(user_id))
                        .filter(cart_items::id.eq_any(clear_cart_ids.to_vec())),
                )
                .execute(conn)?;
            }

            header.into_view(rows)
        })
    }

    fn find_by_id(&self, id: i64) -> Result<Option<OrderView>, DomainError> {
        let mut conn = self.pool.get()?;

        let order = orders::table
            .filter(orders::id.eq(id))
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?;

        let Some(order) = order else {
            return Ok(None);
        };

        let items = OrderItemRow::belonging_to(&order)
            .select(OrderItemRow::as_select())
            .order(order_items::id.asc())
            .load(&mut conn)?;

        order.into_view(items).map(Some)
    }

    fn list_for_user(
        &self,
        user_id: i64,
        page: i64,
        limit: i64,
    ) -> Result<ListResult, DomainError> {
        let mut conn = self.pool.get()?;

        let offset = (page - 1) * limit;
        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = orders::table
                .filter(orders::user_id.eq(user_id))
                .count()
                .get_result(conn)?;

            let rows = orders::table
                .filter(orders::user_id.eq(user_id))
                .select(OrderRow::as_select())
                .order((orders::created_at.desc(), orders::id.desc()))
                .limit(limit)
                .offset(offset)
                .load(conn)?;

            let items = rows
                .into_iter()
                .map(|o| o.into_view(vec![]))
                .collect::<Result<Vec<_>, _>>()?;

            Ok(ListResult { items, total })
        })
    }

    fn update_order_status(&self, id: i64, status: OrderStatus) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        let updated = diesel::update(orders::table.filter(orders::id.eq(id)))
            .set((
                orders::order_status.eq(status.as_str()),
                orders::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        if updated == 0 {
            return Err(DomainError::NotFound("Order"));
        }
        Ok(())
    }

    fn reconcile_payment(&self, id: i64, transferred: i64) -> Result<PaymentSettlement, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            // Row lock serialises concurrent reports for the same order.
            let (final_price, stored): (i64, String) = orders::table
                .filter(orders::id.eq(id))
                .select((orders::final_price, orders::payment_status))
                .for_update()
                .first(conn)
                .optional()?
                .ok_or(DomainError::NotFound("Order"))?;

            let previous: PaymentStatus = stored.parse()?;
            let current = previous.reconcile(final_price, transferred);
            if current != previous {
                diesel::update(orders::table.filter(orders::id.eq(id)))
                    .set((
                        orders::payment_status.eq(current.as_str()),
                        orders::updated_at.eq(Utc::now()),
                    ))
                    .execute(conn)?;
            }

            Ok(PaymentSettlement {
                final_price,
                previous,
                current,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::CartRepository;
    use crate::infrastructure::cart_repo::DieselCartRepository;
    use crate::infrastructure::test_db::{seed_product, setup_db};

    fn new_order(user_id: i64, final_price: i64) -> NewOrder {
        NewOrder {
            user_id,
            address: "A".to_string(),
            payment_method: "CASH".to_string(),
            final_price,
            coupon: None,
        }
    }

    fn item(product_id: i64) -> OrderItemInput {
        OrderItemInput {
            product_id,
            quantity: 2,
            item_price: 200,
            item_discounted_price: 180,
        }
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn create_and_find_by_id_roundtrip() {
        let (_container, pool) = setup_db().await;
        let product = seed_product(&pool, "Mug", 100);
        let repo = DieselOrderRepository::new(pool);

        let created = repo
            .create(new_order(1, 180), vec![item(product)], &[])
            .expect("create failed");

        let order = repo
            .find_by_id(created.id)
            .expect("find failed")
            .expect("order should exist");

        assert_eq!(order.final_price, 180);
        assert_eq!(order.order_status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Unpaid);
        assert_eq!(order.items, created.items);
        assert_eq!(order.items[0].item_discounted_price, 180);
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn failing_item_insert_rolls_back_the_header() {
        let (_container, pool) = setup_db().await;
        let product = seed_product(&pool, "Mug", 100);
        let repo = DieselOrderRepository::new(pool);

        // Unknown product id violates the order_items foreign key.
        let result = repo.create(
            new_order(1, 360),
            vec![item(product), item(product + 1000)],
            &[],
        );
        assert!(result.is_err());

        let listed = repo.list_for_user(1, 1, 20).expect("list failed");
        assert_eq!(listed.total, 0, "no header may survive a failed placement");
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn create_clears_requested_cart_lines_in_same_transaction() {
        let (_container, pool) = setup_db().await;
        let product = seed_product(&pool, "Mug", 100);
        let carts = DieselCartRepository::new(pool.clone());
        let line = carts.add_to_cart(1, product, 2).expect("add failed");
        let repo = DieselOrderRepository::new(pool);

        repo.create(new_order(1, 180), vec![item(product)], &[line.id])
            .expect("create failed");

        assert!(carts.get_cart(1, None).expect("get").is_empty());
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn list_paginates_per_user() {
        let (_container, pool) = setup_db().await;
        let product = seed_product(&pool, "Mug", 100);
        let repo = DieselOrderRepository::new(pool);

        for _ in 0..5 {
            repo.create(new_order(1, 180), vec![item(product)], &[])
                .expect("create failed");
        }
        repo.create(new_order(2, 180), vec![item(product)], &[])
            .expect("create failed");

        let page1 = repo.list_for_user(1, 1, 3).expect("list page 1 failed");
        assert_eq!(page1.total, 5);
        assert_eq!(page1.items.len(), 3);

        let page2 = repo.list_for_user(1, 2, 3).expect("list page 2 failed");
        assert_eq!(page2.items.len(), 2);
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn status_updates_are_independent() {
        let (_container, pool) = setup_db().await;
        let product = seed_product(&pool, "Mug", 100);
        let repo = DieselOrderRepository::new(pool);
        let order = repo
            .create(new_order(1, 180), vec![item(product)], &[])
            .expect("create failed");

        let settled = repo.reconcile_payment(order.id, 180).expect("reconcile failed");
        assert_eq!(settled.previous, PaymentStatus::Unpaid);
        assert_eq!(settled.current, PaymentStatus::Paid);
        repo.update_order_status(order.id, OrderStatus::Shipped)
            .expect("order update failed");

        let order = repo.find_by_id(order.id).expect("find").expect("exists");
        assert_eq!(order.payment_status, PaymentStatus::Paid);
        assert_eq!(order.order_status, OrderStatus::Shipped);

        assert!(matches!(
            repo.reconcile_payment(order.id + 1000, 180),
            Err(DomainError::NotFound(_))
        ));
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn short_report_after_stale_read_keeps_paid() {
        let (_container, pool) = setup_db().await;
        let product = seed_product(&pool, "Mug", 100);
        let repo = DieselOrderRepository::new(pool);
        let order = repo
            .create(new_order(1, 1000), vec![item(product)], &[])
            .expect("create failed");

        // Both deliveries were routed while the order still read UNPAID.
        let stale = repo.find_by_id(order.id).expect("find").expect("exists");
        assert_eq!(stale.payment_status, PaymentStatus::Unpaid);

        repo.reconcile_payment(order.id, 1000).expect("full transfer");
        let late = repo.reconcile_payment(order.id, 500).expect("short transfer");

        assert_eq!(late.previous, PaymentStatus::Paid);
        assert_eq!(late.current, PaymentStatus::Paid);
        let order = repo.find_by_id(order.id).expect("find").expect("exists");
        assert_eq!(order.payment_status, PaymentStatus::Paid);
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn concurrent_reports_never_downgrade_paid() {
        let (_container, pool) = setup_db().await;
        let product = seed_product(&pool, "Mug", 100);
        let repo = DieselOrderRepository::new(pool);
        let order = repo
            .create(new_order(1, 1000), vec![item(product)], &[])
            .expect("create failed");

        let handles: Vec<_> = [1000, 500, 500, 1000, 500]
            .into_iter()
            .map(|amount| {
                let repo = repo.clone();
                std::thread::spawn(move || repo.reconcile_payment(order.id, amount))
            })
            .collect();
        for handle in handles {
            handle.join().expect("thread panicked").expect("reconcile failed");
        }

        let order = repo.find_by_id(order.id).expect("find").expect("exists");
        assert_eq!(order.payment_status, PaymentStatus::Paid);
    }
}
